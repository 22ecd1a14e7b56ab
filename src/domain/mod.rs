//! Domain layer - Core business logic and entities

pub mod deployment;
pub mod error;
pub mod event;
pub mod execution;
pub mod storage;

pub use error::DomainError;
pub use storage::{Storage, StorageEntity, StorageKey};
