//! API request and response types

pub mod error;
pub mod execution;
pub mod json;

pub use error::{ApiError, ApiErrorResponse};
pub use execution::{ExecutionResponse, ExecutionsListResponse};
pub use json::Json;
