//! Approval event filter

use serde_json::Value;
use tracing::{debug, info, warn};

use crate::domain::deployment::ModelReference;
use crate::domain::event::{ApprovalEvent, EventRule, TriggerError};
use crate::infrastructure::metrics::record_approval_event;

/// What to do with one inbound event
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TriggerDecision {
    /// Approved and completed: deploy this model
    Deploy(ModelReference),
    /// Not an event this workflow acts on
    Skip { reason: String },
    /// The event could not be read
    Invalid(TriggerError),
}

impl TriggerDecision {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Deploy(_) => "triggered",
            Self::Skip { .. } => "skipped",
            Self::Invalid(_) => "invalid",
        }
    }
}

/// Starts deployments only for matching, approved model packages
#[derive(Debug, Clone, Default)]
pub struct TriggerBinding {
    rule: EventRule,
}

impl TriggerBinding {
    pub fn new(rule: EventRule) -> Self {
        Self { rule }
    }

    pub fn rule(&self) -> &EventRule {
        &self.rule
    }

    pub fn should_trigger(&self, event: &ApprovalEvent) -> bool {
        self.rule.matches(event)
            && event
                .detail
                .as_ref()
                .is_some_and(|detail| detail.is_approved_and_completed())
    }

    pub fn extract_model_reference(
        &self,
        event: &ApprovalEvent,
    ) -> Result<ModelReference, TriggerError> {
        let arn = event
            .detail()?
            .model_package_arn
            .as_deref()
            .map(str::trim)
            .filter(|arn| !arn.is_empty())
            .ok_or(TriggerError::MissingField("ModelPackageArn"))?;

        ModelReference::new(arn).map_err(|e| TriggerError::Malformed(e.to_string()))
    }

    /// Classify a raw event; never fails
    pub fn evaluate(&self, raw: &Value) -> TriggerDecision {
        let decision = self.decide(raw);

        match &decision {
            TriggerDecision::Deploy(reference) => {
                info!(model_reference = %reference, "Approval event accepted")
            }
            TriggerDecision::Skip { reason } => debug!(%reason, "Approval event skipped"),
            TriggerDecision::Invalid(err) => warn!(error = %err, "Approval event rejected"),
        }
        record_approval_event(decision.label());

        decision
    }

    fn decide(&self, raw: &Value) -> TriggerDecision {
        let event = match ApprovalEvent::from_value(raw) {
            Ok(event) => event,
            Err(err) => return TriggerDecision::Invalid(err),
        };

        if !self.rule.matches(&event) {
            return TriggerDecision::Skip {
                reason: "event does not match the configured rule".to_string(),
            };
        }

        let detail = match event.detail() {
            Ok(detail) => detail,
            Err(err) => return TriggerDecision::Invalid(err),
        };

        if !detail.is_approved_and_completed() {
            return TriggerDecision::Skip {
                reason: format!(
                    "package status {:?}, approval status {:?}",
                    detail.model_package_status, detail.model_approval_status
                ),
            };
        }

        match self.extract_model_reference(&event) {
            Ok(reference) => TriggerDecision::Deploy(reference),
            Err(err) => TriggerDecision::Invalid(err),
        }
    }
}
