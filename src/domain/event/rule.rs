//! Event-bus rule that scopes which approval events reach the orchestrator

use serde::Deserialize;

use super::entity::ApprovalEvent;

/// Allow-lists applied to an inbound event before the trigger predicate
///
/// Empty lists and unset values accept anything. A configured filter requires
/// the field to be present in the event.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct EventRule {
    pub sources: Vec<String>,
    pub detail_types: Vec<String>,
    pub model_package_group_name: Option<String>,
}

impl EventRule {
    /// Rule accepting every event
    pub fn accept_all() -> Self {
        Self::default()
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.sources.push(source.into());
        self
    }

    pub fn with_detail_type(mut self, detail_type: impl Into<String>) -> Self {
        self.detail_types.push(detail_type.into());
        self
    }

    pub fn with_model_package_group(mut self, group: impl Into<String>) -> Self {
        self.model_package_group_name = Some(group.into());
        self
    }

    pub fn matches(&self, event: &ApprovalEvent) -> bool {
        allowed(&self.sources, event.source.as_deref())
            && allowed(&self.detail_types, event.detail_type.as_deref())
            && self.matches_group(event)
    }

    fn matches_group(&self, event: &ApprovalEvent) -> bool {
        let Some(expected) = self.model_package_group_name.as_deref() else {
            return true;
        };

        event
            .detail
            .as_ref()
            .and_then(|d| d.model_package_group_name.as_deref())
            == Some(expected)
    }
}

fn allowed(list: &[String], value: Option<&str>) -> bool {
    if list.is_empty() {
        return true;
    }

    value.is_some_and(|v| list.iter().any(|item| item == v))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::event::ModelPackageDetail;

    fn event(source: Option<&str>, group: Option<&str>) -> ApprovalEvent {
        ApprovalEvent {
            source: source.map(String::from),
            detail_type: Some("SageMaker Model Package State Change".to_string()),
            detail: Some(ModelPackageDetail {
                model_package_group_name: group.map(String::from),
                ..Default::default()
            }),
        }
    }

    #[test]
    fn test_accept_all() {
        let rule = EventRule::accept_all();
        assert!(rule.matches(&ApprovalEvent::default()));
        assert!(rule.matches(&event(Some("custom"), None)));
    }

    #[test]
    fn test_source_filter() {
        let rule = EventRule::accept_all().with_source("aws.sagemaker");

        assert!(rule.matches(&event(Some("aws.sagemaker"), None)));
        assert!(!rule.matches(&event(Some("aws.s3"), None)));
        assert!(!rule.matches(&event(None, None)));
    }

    #[test]
    fn test_detail_type_filter() {
        let rule = EventRule::accept_all().with_detail_type("Other Change");
        assert!(!rule.matches(&event(Some("aws.sagemaker"), None)));
    }

    #[test]
    fn test_group_filter() {
        let rule = EventRule::accept_all().with_model_package_group("abalone");

        assert!(rule.matches(&event(None, Some("abalone"))));
        assert!(!rule.matches(&event(None, Some("churn"))));
        assert!(!rule.matches(&event(None, None)));
    }
}
