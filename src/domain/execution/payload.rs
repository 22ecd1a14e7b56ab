//! Wire contract exchanged between orchestrator steps

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub const STATUS_CODE_OK: u16 = 200;
pub const STATUS_CODE_ERROR: u16 = 500;

/// Endpoint name reported when a failure happens before one is known
pub const UNKNOWN_ENDPOINT: &str = "unknown";

pub const SKIPPED_STATUS: &str = "Skipped";
pub const SKIPPED_REASON: &str = "No action needed for this status";

/// `{statusCode, endpointName, endpointStatus, failureReason}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StepPayload {
    pub status_code: u16,
    pub endpoint_name: String,
    pub endpoint_status: String,
    pub failure_reason: String,
}

impl StepPayload {
    pub fn in_progress(endpoint_name: impl Into<String>, status: impl Into<String>) -> Self {
        Self {
            status_code: STATUS_CODE_OK,
            endpoint_name: endpoint_name.into(),
            endpoint_status: status.into(),
            failure_reason: String::new(),
        }
    }

    pub fn failed(endpoint_name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::error(endpoint_name, "Failed", reason)
    }

    pub fn error(
        endpoint_name: impl Into<String>,
        status: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self {
            status_code: STATUS_CODE_ERROR,
            endpoint_name: endpoint_name.into(),
            endpoint_status: status.into(),
            failure_reason: reason.into(),
        }
    }

    pub fn skipped() -> Self {
        Self {
            status_code: STATUS_CODE_OK,
            endpoint_name: String::new(),
            endpoint_status: SKIPPED_STATUS.to_string(),
            failure_reason: SKIPPED_REASON.to_string(),
        }
    }

    pub fn is_error(&self) -> bool {
        self.status_code >= STATUS_CODE_ERROR
    }
}

/// `{endpointName?, detail?}` accepted by the stateless step entry point
///
/// Unknown fields are kept so a full approval event (source, detail-type) can
/// be passed through, and so a previous [`StepPayload`] is a valid input.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StepInput {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint_name: Option<String>,
    #[serde(flatten)]
    pub rest: Map<String, Value>,
}

impl StepInput {
    pub fn for_endpoint(endpoint_name: impl Into<String>) -> Self {
        Self {
            endpoint_name: Some(endpoint_name.into()),
            rest: Map::new(),
        }
    }

    pub fn for_event(event: Value) -> Self {
        let rest = match event {
            Value::Object(map) => map,
            other => {
                let mut map = Map::new();
                map.insert("detail".to_string(), other);
                map
            }
        };

        Self {
            endpoint_name: None,
            rest,
        }
    }

    /// Endpoint to poll, ignoring blank names
    pub fn endpoint(&self) -> Option<&str> {
        self.endpoint_name
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty())
    }

    pub fn has_detail(&self) -> bool {
        self.rest.contains_key("detail")
    }

    /// The approval event carried by this input
    pub fn event(&self) -> Value {
        Value::Object(self.rest.clone())
    }
}

impl From<StepPayload> for StepInput {
    fn from(payload: StepPayload) -> Self {
        Self::for_endpoint(payload.endpoint_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_payload_wire_shape() {
        let payload = StepPayload::failed("ep", "CapacityError");
        let json = serde_json::to_value(&payload).unwrap();

        assert_eq!(
            json,
            json!({
                "statusCode": 500,
                "endpointName": "ep",
                "endpointStatus": "Failed",
                "failureReason": "CapacityError"
            })
        );
    }

    #[test]
    fn test_skipped_payload() {
        let payload = StepPayload::skipped();

        assert_eq!(payload.status_code, 200);
        assert_eq!(payload.endpoint_name, "");
        assert_eq!(payload.endpoint_status, "Skipped");
        assert!(!payload.is_error());
    }

    #[test]
    fn test_payload_is_valid_next_input() {
        let payload = StepPayload::in_progress("ep-1", "Creating");
        let json = serde_json::to_value(&payload).unwrap();

        let input: StepInput = serde_json::from_value(json).unwrap();

        assert_eq!(input.endpoint(), Some("ep-1"));
        assert!(!input.has_detail());
        assert_eq!(input.rest["endpointStatus"], "Creating");
    }

    #[test]
    fn test_event_input_keeps_envelope() {
        let input: StepInput = serde_json::from_value(json!({
            "source": "aws.sagemaker",
            "detail": {"ModelPackageArn": "arn:x"}
        }))
        .unwrap();

        assert_eq!(input.endpoint(), None);
        assert!(input.has_detail());
        assert_eq!(input.event()["source"], "aws.sagemaker");
    }

    #[test]
    fn test_blank_endpoint_ignored() {
        let input = StepInput::for_endpoint("  ");
        assert_eq!(input.endpoint(), None);
    }
}
