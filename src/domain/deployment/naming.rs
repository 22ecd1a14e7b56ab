//! Clock abstraction and timestamped resource naming

use std::fmt::Debug;
use std::sync::Arc;
use std::sync::RwLock;

use chrono::{DateTime, Duration, Utc};
use once_cell::sync::Lazy;
use regex::Regex;

use crate::domain::DomainError;

/// Maximum length the platform accepts for model/config/endpoint names
pub const MAX_RESOURCE_NAME_LENGTH: usize = 63;

/// Platform name pattern: alphanumerics separated by single or repeated hyphens
static RESOURCE_NAME_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-zA-Z0-9](-*[a-zA-Z0-9])*$").unwrap());

/// Source of the current time
pub trait Clock: Send + Sync + Debug {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall clock
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Clock that only moves when told to
#[derive(Debug)]
pub struct ManualClock {
    now: RwLock<DateTime<Utc>>,
}

impl ManualClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            now: RwLock::new(start),
        }
    }

    pub fn advance(&self, by: Duration) {
        if let Ok(mut now) = self.now.write() {
            *now += by;
        }
    }

    pub fn set(&self, to: DateTime<Utc>) {
        if let Ok(mut now) = self.now.write() {
            *now = to;
        }
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        self.now.read().map(|now| *now).unwrap_or_else(|e| *e.into_inner())
    }
}

/// Validate a platform resource name
pub fn validate_resource_name(name: &str) -> Result<(), DomainError> {
    if name.is_empty() {
        return Err(DomainError::validation("Resource name cannot be empty"));
    }

    if name.len() > MAX_RESOURCE_NAME_LENGTH {
        return Err(DomainError::validation(format!(
            "Resource name '{}' exceeds maximum length of {} characters",
            name, MAX_RESOURCE_NAME_LENGTH
        )));
    }

    if !RESOURCE_NAME_PATTERN.is_match(name) {
        return Err(DomainError::validation(format!(
            "Invalid resource name '{}': must be alphanumeric with hyphens",
            name
        )));
    }

    Ok(())
}

/// Generates unique, timestamp-derived names for write-once resources
#[derive(Debug, Clone)]
pub struct ResourceNamer {
    clock: Arc<dyn Clock>,
}

impl ResourceNamer {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self { clock }
    }

    /// `<group>-<YYYYMMDDHHMMSS>`
    pub fn model_name(&self, group: &str) -> Result<String, DomainError> {
        let name = format!("{}-{}", group, self.timestamp());
        validate_resource_name(&name)?;
        Ok(name)
    }

    /// `<group>-ec-<YYYYMMDDHHMMSS>`
    pub fn endpoint_config_name(&self, group: &str) -> Result<String, DomainError> {
        let name = format!("{}-ec-{}", group, self.timestamp());
        validate_resource_name(&name)?;
        Ok(name)
    }

    fn timestamp(&self) -> String {
        self.clock.now().format("%Y%m%d%H%M%S").to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn fixed_clock() -> Arc<ManualClock> {
        Arc::new(ManualClock::new(
            Utc.with_ymd_and_hms(2024, 3, 9, 14, 5, 7).unwrap(),
        ))
    }

    #[test]
    fn test_model_and_config_names() {
        let namer = ResourceNamer::new(fixed_clock());

        assert_eq!(
            namer.model_name("abalone").unwrap(),
            "abalone-20240309140507"
        );
        assert_eq!(
            namer.endpoint_config_name("abalone").unwrap(),
            "abalone-ec-20240309140507"
        );
    }

    #[test]
    fn test_names_follow_clock() {
        let clock = fixed_clock();
        let namer = ResourceNamer::new(clock.clone());

        let first = namer.model_name("abalone").unwrap();
        clock.advance(Duration::seconds(1));
        let second = namer.model_name("abalone").unwrap();

        assert_ne!(first, second);
    }

    #[test]
    fn test_name_too_long_rejected() {
        let namer = ResourceNamer::new(fixed_clock());
        let group = "g".repeat(60);

        assert!(namer.model_name(&group).is_err());
    }

    #[test]
    fn test_invalid_characters_rejected() {
        assert!(validate_resource_name("model_with_underscore").is_err());
        assert!(validate_resource_name("-leading").is_err());
        assert!(validate_resource_name("trailing-").is_err());
        assert!(validate_resource_name("ok-name-1").is_ok());
    }

    #[test]
    fn test_manual_clock_set_and_advance() {
        let clock = fixed_clock();
        let start = clock.now();

        clock.advance(Duration::minutes(5));
        assert_eq!(clock.now() - start, Duration::minutes(5));

        clock.set(start);
        assert_eq!(clock.now(), start);
    }
}
