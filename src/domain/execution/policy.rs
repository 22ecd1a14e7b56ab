//! Polling cadence and time budget

use chrono::Duration;

pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 30;
pub const DEFAULT_TIMEOUT_SECS: u64 = 2 * 60 * 60;

/// Upper bound for both the interval and the budget (30 days)
pub const MAX_POLICY_SECS: u64 = 30 * 24 * 60 * 60;

/// How often to poll and how long a whole attempt may take
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollingPolicy {
    pub poll_interval: Duration,
    pub timeout: Duration,
}

impl Default for PollingPolicy {
    fn default() -> Self {
        Self::from_secs(DEFAULT_POLL_INTERVAL_SECS, DEFAULT_TIMEOUT_SECS)
    }
}

impl PollingPolicy {
    /// Values above [`MAX_POLICY_SECS`] are clamped
    pub fn from_secs(poll_interval_secs: u64, timeout_secs: u64) -> Self {
        Self {
            poll_interval: clamped_seconds(poll_interval_secs),
            timeout: clamped_seconds(timeout_secs),
        }
    }

    /// Interval as a std duration for timers
    pub fn poll_interval_std(&self) -> std::time::Duration {
        self.poll_interval.to_std().unwrap_or_default()
    }

    pub fn budget_description(&self) -> String {
        let secs = self.timeout.num_seconds();

        if secs % 3600 == 0 {
            format!("{}h", secs / 3600)
        } else if secs % 60 == 0 {
            format!("{}m", secs / 60)
        } else {
            format!("{}s", secs)
        }
    }
}

fn clamped_seconds(secs: u64) -> Duration {
    // MAX_POLICY_SECS fits in i64
    Duration::seconds(secs.min(MAX_POLICY_SECS) as i64)
}
