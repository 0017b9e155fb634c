//! Sync configuration and window types.

use chrono::{DateTime, Duration, TimeDelta, Utc};
use serde::{Deserialize, Serialize};

/// One source → sheet pairing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Source identity (calendar id); also the checkpoint key.
    pub source: String,

    /// Store identity (sheet name)
    pub store: String,

    /// Optional record filter: only records tagged with this value are synced.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filter: Option<String>,
}

impl SyncConfig {
    #[must_use]
    pub fn new(source: &str, store: &str) -> Self {
        Self {
            source: source.to_string(),
            store: store.to_string(),
            filter: None,
        }
    }
}

/// Tuning for the windowed driver.
///
/// Durations are stored as whole units in the settings file so they stay
/// readable by hand. The defaults cover the epoch to well past today in a
/// single run, so a first sync or a full resync finishes in one invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncOptions {
    /// Size of one reconciliation window, in days.
    pub window_days: i64,

    /// Maximum windows processed per invocation.
    pub max_iterations: u32,

    /// Trailing windows shorter than this are merged into the previous one.
    pub tail_merge_minutes: i64,

    /// A checkpoint at most this old causes a one-window rewind.
    /// `None` means "one window".
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rewind_threshold_days: Option<i64>,
}

impl Default for SyncOptions {
    fn default() -> Self {
        Self {
            window_days: 365,
            max_iterations: 100,
            tail_merge_minutes: 10,
            rewind_threshold_days: None,
        }
    }
}

impl SyncOptions {
    /// Window length; saturates at [`TimeDelta::MAX`] for out-of-range values.
    #[must_use]
    pub fn window(&self) -> Duration {
        TimeDelta::try_days(self.window_days.max(1)).unwrap_or(TimeDelta::MAX)
    }

    #[must_use]
    pub fn tail_merge(&self) -> Duration {
        TimeDelta::try_minutes(self.tail_merge_minutes.max(0)).unwrap_or(TimeDelta::MAX)
    }

    #[must_use]
    pub fn rewind_threshold(&self) -> Duration {
        self.rewind_threshold_days.map_or_else(
            || self.window(),
            |d| TimeDelta::try_days(d.max(0)).unwrap_or(TimeDelta::MAX),
        )
    }

    /// Check that every value is in range.
    ///
    /// # Errors
    ///
    /// Returns a message naming the first offending field.
    pub fn check(&self) -> Result<(), String> {
        if self.window_days < 1 || TimeDelta::try_days(self.window_days).is_none() {
            return Err(format!(
                "options.window_days must be a positive number of days, got {}",
                self.window_days
            ));
        }
        if self.max_iterations < 1 {
            return Err("options.max_iterations must be at least 1".to_string());
        }
        if self.tail_merge_minutes < 0 || TimeDelta::try_minutes(self.tail_merge_minutes).is_none() {
            return Err(format!(
                "options.tail_merge_minutes out of range: {}",
                self.tail_merge_minutes
            ));
        }
        if let Some(days) = self
            .rewind_threshold_days
            .filter(|&d| d < 0 || TimeDelta::try_days(d).is_none())
        {
            return Err(format!("options.rewind_threshold_days out of range: {days}"));
        }
        Ok(())
    }
}

/// A time range for one reconciliation pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl SyncWindow {
    #[must_use]
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self { start, end }
    }

    /// Inclusive containment, used for deletion eligibility.
    #[must_use]
    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        instant >= self.start && instant <= self.end
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_options_defaults() {
        let options = SyncOptions::default();
        assert_eq!(options.window(), Duration::days(365));
        assert_eq!(options.tail_merge(), Duration::minutes(10));
        assert_eq!(options.rewind_threshold(), options.window());
        assert!(options.check().is_ok());
    }

    #[test]
    fn test_default_options_reach_today_in_one_run() {
        let options = SyncOptions::default();
        let reach = DateTime::UNIX_EPOCH
            + options.window() * i32::try_from(options.max_iterations).unwrap();
        let today = Utc.with_ymd_and_hms(2026, 2, 20, 0, 0, 0).unwrap();
        assert!(reach > today + Duration::days(365 * 40));
    }

    #[test]
    fn test_out_of_range_durations_do_not_panic() {
        let options = SyncOptions {
            window_days: 200_000_000_000_000,
            tail_merge_minutes: i64::MAX,
            rewind_threshold_days: Some(i64::MAX),
            ..SyncOptions::default()
        };
        assert_eq!(options.window(), TimeDelta::MAX);
        assert_eq!(options.tail_merge(), TimeDelta::MAX);
        assert_eq!(options.rewind_threshold(), TimeDelta::MAX);
        assert!(options.check().is_err());
    }

    #[test]
    fn test_check_names_the_bad_field() {
        let tail = SyncOptions {
            tail_merge_minutes: i64::MAX,
            ..SyncOptions::default()
        };
        assert!(tail.check().unwrap_err().contains("tail_merge_minutes"));

        let rewind = SyncOptions {
            rewind_threshold_days: Some(-1),
            ..SyncOptions::default()
        };
        assert!(rewind.check().unwrap_err().contains("rewind_threshold_days"));

        let window = SyncOptions {
            window_days: 0,
            ..SyncOptions::default()
        };
        assert!(window.check().unwrap_err().contains("window_days"));
    }

    #[test]
    fn test_options_partial_json() {
        let options: SyncOptions = serde_json::from_str(r#"{"window_days": 7}"#).unwrap();
        assert_eq!(options.window_days, 7);
        assert_eq!(options.max_iterations, 100);
    }

    #[test]
    fn test_window_contains_is_inclusive() {
        let start = Utc.with_ymd_and_hms(2026, 2, 1, 0, 0, 0).unwrap();
        let end = Utc.with_ymd_and_hms(2026, 2, 3, 0, 0, 0).unwrap();
        let window = SyncWindow::new(start, end);

        assert!(window.contains(start));
        assert!(window.contains(end));
        assert!(!window.contains(end + Duration::milliseconds(1)));
    }
}
