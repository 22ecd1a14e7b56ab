//! Endpoint status probe

use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, warn};

use crate::domain::deployment::{EndpointStatus, ModelHostingPlatform};
use crate::infrastructure::metrics::record_status_poll;

/// Normalized answer of a single status read
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProbeResult {
    pub status: EndpointStatus,
    /// Empty unless the status is `Failed`
    pub failure_reason: String,
}

impl ProbeResult {
    fn failed(reason: impl Into<String>) -> Self {
        Self {
            status: EndpointStatus::Failed,
            failure_reason: reason.into(),
        }
    }
}

/// Reads endpoint status; platform faults become `Failed` results
#[derive(Clone)]
pub struct StatusProber {
    platform: Arc<dyn ModelHostingPlatform>,
}

impl std::fmt::Debug for StatusProber {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StatusProber").finish_non_exhaustive()
    }
}

impl StatusProber {
    pub fn new(platform: Arc<dyn ModelHostingPlatform>) -> Self {
        Self { platform }
    }

    pub async fn probe(&self, endpoint_name: &str) -> ProbeResult {
        let endpoint_name = endpoint_name.trim();
        if endpoint_name.is_empty() {
            return ProbeResult::failed("Endpoint name is required");
        }

        let result = match self.platform.describe_endpoint(endpoint_name).await {
            Ok(endpoint) => {
                let failure_reason = if endpoint.status == EndpointStatus::Failed {
                    endpoint.failure_reason.unwrap_or_default()
                } else {
                    String::new()
                };

                debug!(endpoint = %endpoint_name, status = %endpoint.status, "Endpoint status");
                ProbeResult {
                    status: endpoint.status,
                    failure_reason,
                }
            }
            Err(err) => {
                warn!(endpoint = %endpoint_name, error = %err, "Endpoint status read failed");
                ProbeResult::failed(err.to_string())
            }
        };

        record_status_poll(&result.status);
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::deployment::{Endpoint, MockModelHostingPlatform, PlatformError};

    fn prober(mock: MockModelHostingPlatform) -> StatusProber {
        StatusProber::new(Arc::new(mock))
    }

    #[tokio::test]
    async fn test_probe_in_service() {
        let mut mock = MockModelHostingPlatform::new();
        mock.expect_describe_endpoint()
            .withf(|name| name == "churn-ep")
            .times(1)
            .returning(|name| Ok(Endpoint::new(name, EndpointStatus::InService)));

        let result = prober(mock).probe("churn-ep").await;

        assert_eq!(result.status, EndpointStatus::InService);
        assert_eq!(result.failure_reason, "");
    }

    #[tokio::test]
    async fn test_probe_failed_keeps_platform_reason_verbatim() {
        let mut mock = MockModelHostingPlatform::new();
        mock.expect_describe_endpoint().returning(|name| {
            Ok(Endpoint::new(name, EndpointStatus::Failed).with_failure_reason("CapacityError"))
        });

        let result = prober(mock).probe("churn-ep").await;

        assert_eq!(result, ProbeResult::failed("CapacityError"));
    }

    #[tokio::test]
    async fn test_probe_ignores_reason_on_pending_status() {
        let mut mock = MockModelHostingPlatform::new();
        mock.expect_describe_endpoint().returning(|name| {
            Ok(Endpoint::new(name, EndpointStatus::Updating).with_failure_reason("stale"))
        });

        let result = prober(mock).probe("churn-ep").await;

        assert_eq!(result.status, EndpointStatus::Updating);
        assert!(result.failure_reason.is_empty());
    }

    #[tokio::test]
    async fn test_probe_converts_read_errors_into_failed() {
        let mut mock = MockModelHostingPlatform::new();
        mock.expect_describe_endpoint()
            .returning(|name| Err(PlatformError::endpoint_not_found(name)));

        let result = prober(mock).probe("missing").await;

        assert_eq!(result.status, EndpointStatus::Failed);
        assert_eq!(result.failure_reason, "Could not find endpoint \"missing\"");
    }

    #[tokio::test]
    async fn test_probe_blank_name_never_calls_platform() {
        let mut mock = MockModelHostingPlatform::new();
        mock.expect_describe_endpoint().never();

        let result = prober(mock).probe("  ").await;

        assert_eq!(result.status, EndpointStatus::Failed);
    }
}
