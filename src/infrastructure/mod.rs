//! Infrastructure layer - External service implementations

pub mod deployment;
pub mod logging;
pub mod metrics;
pub mod platform;
pub mod storage;
