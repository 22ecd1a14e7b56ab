//! Hosting platform adapters

mod in_memory;
mod sagemaker;

use std::str::FromStr;
use std::sync::Arc;

use crate::domain::deployment::ModelHostingPlatform;
use crate::domain::DomainError;

pub use in_memory::{InMemoryPlatform, PlatformCall, PlatformOperation, ScriptedStatus};
pub use sagemaker::SageMakerPlatform;

/// Which platform adapter to build
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlatformKind {
    SageMaker,
    InMemory,
}

impl FromStr for PlatformKind {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "sagemaker" => Ok(Self::SageMaker),
            "in_memory" | "in-memory" | "memory" => Ok(Self::InMemory),
            other => Err(DomainError::configuration(format!(
                "Unknown platform kind '{}': expected sagemaker or in_memory",
                other
            ))),
        }
    }
}

/// Builds the configured platform adapter
pub async fn create_platform(
    kind: PlatformKind,
    region: Option<&str>,
) -> Arc<dyn ModelHostingPlatform> {
    match kind {
        PlatformKind::SageMaker => Arc::new(SageMakerPlatform::new(region).await),
        PlatformKind::InMemory => Arc::new(InMemoryPlatform::new()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_platform_kind_from_str() {
        assert_eq!("sagemaker".parse::<PlatformKind>().unwrap(), PlatformKind::SageMaker);
        assert_eq!("SageMaker".parse::<PlatformKind>().unwrap(), PlatformKind::SageMaker);
        assert_eq!("in_memory".parse::<PlatformKind>().unwrap(), PlatformKind::InMemory);
        assert!("azure".parse::<PlatformKind>().is_err());
    }
}
