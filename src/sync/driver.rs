//! Windowed sync driver.
//!
//! Splits the range between a config's checkpoint and "now" into fixed-size
//! windows and reconciles them one at a time, persisting the checkpoint after
//! every window so an interrupted run resumes where it stopped.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::model::{SyncConfig, SyncOptions, SyncWindow};
use crate::sync::checkpoint::CheckpointStore;
use crate::sync::header::ensure_header;
use crate::sync::reconcile::reconcile;
use crate::sync::store::{Connected, Connector, PropertyStore, SourceProvider, TabularStore};
use crate::sync::types::{
    BatchReport, ReconcileStats, SyncError, SyncFailure, SyncOutcome, SyncReport, SyncResult,
};

/// Source of "now".
pub type Clock = Box<dyn Fn() -> DateTime<Utc>>;

/// Which configs an operation applies to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSelector {
    /// Position in the config list (0-based).
    Index(usize),
    /// First config whose source identity matches.
    Source(String),
    /// Every config.
    All,
}

impl FromStr for ConfigSelector {
    type Err = SyncError;

    /// All-digit input is an index; anything else is a source identity.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err(SyncError::UnknownConfig("empty selector".to_string()));
        }
        if s.bytes().all(|b| b.is_ascii_digit()) {
            let index = s
                .parse()
                .map_err(|_| SyncError::UnknownConfig(s.to_string()))?;
            return Ok(Self::Index(index));
        }
        Ok(Self::Source(s.to_string()))
    }
}

impl fmt::Display for ConfigSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Index(i) => write!(f, "#{i}"),
            Self::Source(s) => f.write_str(s),
            Self::All => f.write_str("all"),
        }
    }
}

/// Resolve a selector against the config list.
///
/// # Errors
///
/// Returns [`SyncError::UnknownConfig`] if nothing matches.
pub fn select_configs<'c>(
    configs: &'c [SyncConfig],
    selector: &ConfigSelector,
) -> SyncResult<Vec<&'c SyncConfig>> {
    match selector {
        ConfigSelector::All => Ok(configs.iter().collect()),
        ConfigSelector::Index(i) => configs
            .get(*i)
            .map(|c| vec![c])
            .ok_or_else(|| SyncError::UnknownConfig(format!("no config at index {i}"))),
        ConfigSelector::Source(source) => configs
            .iter()
            .find(|c| &c.source == source)
            .map(|c| vec![c])
            .ok_or_else(|| SyncError::UnknownConfig(source.clone())),
    }
}

/// Parse an explicit bound: RFC 3339, a naive `YYYY-MM-DDTHH:MM:SS` (UTC),
/// or a bare date (midnight UTC).
///
/// # Errors
///
/// Returns [`SyncError::InvalidTimestamp`] for anything else.
pub fn parse_instant(s: &str) -> SyncResult<DateTime<Utc>> {
    let s = s.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S") {
        return Ok(naive.and_utc());
    }
    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        if let Some(naive) = date.and_hms_opt(0, 0, 0) {
            return Ok(naive.and_utc());
        }
    }
    Err(SyncError::InvalidTimestamp(s.to_string()))
}

/// Drives windowed reconciliation for one or more configs.
pub struct WindowedSyncDriver<'a> {
    checkpoints: CheckpointStore<'a>,
    options: SyncOptions,
    clock: Clock,
}

impl<'a> WindowedSyncDriver<'a> {
    #[must_use]
    pub fn new(properties: &'a mut dyn PropertyStore, options: SyncOptions) -> Self {
        Self {
            checkpoints: CheckpointStore::new(properties),
            options,
            clock: Box::new(Utc::now),
        }
    }

    /// Replace the clock.
    #[must_use]
    pub fn with_clock(mut self, clock: impl Fn() -> DateTime<Utc> + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    #[must_use]
    pub fn options(&self) -> &SyncOptions {
        &self.options
    }

    /// Stored checkpoint for a source, if any.
    ///
    /// # Errors
    ///
    /// Returns an error if the property store fails.
    pub fn checkpoint(&self, source: &str) -> SyncResult<Option<DateTime<Utc>>> {
        self.checkpoints.peek(source)
    }

    /// Compute `[start, end]` for a run.
    ///
    /// The start is the explicit start if given, otherwise the checkpoint.
    /// A start later than the end clears the checkpoint and the run starts
    /// from the epoch. A recent checkpoint is rewound by one window so edits
    /// near the boundary are picked up.
    ///
    /// # Errors
    ///
    /// Returns a property store error.
    pub fn determine_range(
        &mut self,
        source: &str,
        explicit_start: Option<DateTime<Utc>>,
        explicit_end: Option<DateTime<Utc>>,
    ) -> SyncResult<(DateTime<Utc>, DateTime<Utc>)> {
        let now = (self.clock)();
        let end = explicit_end.unwrap_or(now);

        let mut start = match explicit_start {
            Some(start) => start,
            None => self.checkpoints.get(source)?,
        };
        if start > end {
            warn!(
                source,
                start = %start.to_rfc3339(),
                end = %end.to_rfc3339(),
                "Sync start is after the end, resetting checkpoint"
            );
            self.checkpoints.clear(source)?;
            start = self.checkpoints.get(source)?;
        } else if explicit_start.is_none()
            && now.signed_duration_since(start) <= self.options.rewind_threshold()
        {
            let rewound = start
                .checked_sub_signed(self.options.window())
                .map_or(DateTime::UNIX_EPOCH, |t| t.max(DateTime::UNIX_EPOCH));
            debug!(source, from = %start.to_rfc3339(), to = %rewound.to_rfc3339(), "Rewinding recent checkpoint");
            start = rewound;
        }

        Ok((start, end))
    }

    /// Reconcile `[start, end]` window by window.
    ///
    /// # Errors
    ///
    /// Source, store and property errors propagate; windows already
    /// reconciled keep their checkpoint.
    pub fn run_windows(
        &mut self,
        config: &SyncConfig,
        source: &dyn SourceProvider,
        store: &mut dyn TabularStore,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> SyncResult<SyncReport> {
        let window_len = self.options.window();
        let tail_merge = self.options.tail_merge();
        let filter = config.filter.as_deref();

        let mut current = start;
        let mut windows = 0u32;
        let mut stats = ReconcileStats::default();
        let mut checkpoint = self.checkpoints.get(&config.source)?;

        while current < end && windows < self.options.max_iterations {
            let chunk_end = current.checked_add_signed(window_len).unwrap_or(end);
            let mut effective_end = chunk_end.min(end);
            if end.signed_duration_since(chunk_end) < tail_merge {
                effective_end = end;
            }

            let window = SyncWindow::new(current, effective_end);
            let records: Vec<_> = source
                .records(current, effective_end)?
                .into_iter()
                .filter(|r| r.matches_filter(filter))
                .collect();

            debug!(
                source = %config.source,
                start = %current.to_rfc3339(),
                end = %effective_end.to_rfc3339(),
                records = records.len(),
                "Reconciling window"
            );
            let pass = reconcile(&records, store, &window)?;
            stats.merge(&pass);

            checkpoint = self.checkpoints.advance(&config.source, effective_end)?;
            current = effective_end;
            windows += 1;
        }

        let capped = current < end;
        if capped {
            warn!(
                source = %config.source,
                windows,
                reached = %current.to_rfc3339(),
                "Iteration cap reached, remaining windows deferred to the next run"
            );
        }

        info!(
            source = %config.source,
            store = %config.store,
            windows,
            inserted = stats.inserted,
            updated = stats.updated,
            deleted = stats.deleted,
            "Sync complete"
        );

        Ok(SyncReport {
            source: config.source.clone(),
            store: config.store.clone(),
            windows,
            stats,
            checkpoint,
            capped,
        })
    }

    /// Sync a single config.
    ///
    /// # Errors
    ///
    /// Every failure propagates; the caller decides whether to retry.
    pub fn sync_one(
        &mut self,
        connector: &mut dyn Connector,
        config: &SyncConfig,
        explicit_start: Option<DateTime<Utc>>,
        explicit_end: Option<DateTime<Utc>>,
    ) -> SyncResult<SyncOutcome> {
        match connector.connect(config)? {
            Connected::Missing { reason } => {
                info!(source = %config.source, %reason, "Skipping sync");
                Ok(SyncOutcome::Skipped {
                    source: config.source.clone(),
                    reason,
                })
            }
            Connected::Ready { source, mut store } => {
                let (start, end) =
                    self.determine_range(&config.source, explicit_start, explicit_end)?;
                let report = self.run_windows(config, &*source, &mut *store, start, end)?;
                Ok(SyncOutcome::Applied(report))
            }
        }
    }

    /// Sync every config, isolating failures.
    pub fn sync_all(
        &mut self,
        connector: &mut dyn Connector,
        configs: &[SyncConfig],
        explicit_start: Option<DateTime<Utc>>,
        explicit_end: Option<DateTime<Utc>>,
    ) -> BatchReport {
        let run_id = Uuid::new_v4();
        info!(%run_id, configs = configs.len(), "Starting sync run");

        let mut batch = BatchReport::default();
        for config in configs {
            match self.sync_one(connector, config, explicit_start, explicit_end) {
                Ok(outcome) => batch.outcomes.push(outcome),
                Err(e) => {
                    error!(%run_id, source = %config.source, store = %config.store, error = %e, "Sync failed");
                    batch.failures.push(SyncFailure {
                        source: config.source.clone(),
                        store: config.store.clone(),
                        error: e.to_string(),
                    });
                }
            }
        }

        info!(
            %run_id,
            applied = batch.outcomes.iter().filter(|o| o.is_applied()).count(),
            failed = batch.failures.len(),
            "Sync run finished"
        );
        batch
    }

    /// Wipe and rebuild the sheets of the selected configs from the epoch.
    ///
    /// A single target propagates its error; [`ConfigSelector::All`] isolates
    /// failures like [`Self::sync_all`].
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::UnknownConfig`] if the selector matches nothing,
    /// or the failure of a single-target resync.
    pub fn full_resync(
        &mut self,
        connector: &mut dyn Connector,
        configs: &[SyncConfig],
        target: &ConfigSelector,
    ) -> SyncResult<BatchReport> {
        let selected = select_configs(configs, target)?;
        let mut batch = BatchReport::default();

        if *target != ConfigSelector::All {
            for config in selected {
                batch.outcomes.push(self.resync_one(connector, config)?);
            }
            return Ok(batch);
        }

        for config in selected {
            match self.resync_one(connector, config) {
                Ok(outcome) => batch.outcomes.push(outcome),
                Err(e) => {
                    error!(source = %config.source, error = %e, "Resync failed");
                    batch.failures.push(SyncFailure {
                        source: config.source.clone(),
                        store: config.store.clone(),
                        error: e.to_string(),
                    });
                }
            }
        }
        Ok(batch)
    }

    fn resync_one(
        &mut self,
        connector: &mut dyn Connector,
        config: &SyncConfig,
    ) -> SyncResult<SyncOutcome> {
        let (source, mut store) = match connector.connect(config)? {
            Connected::Missing { reason } => {
                info!(source = %config.source, %reason, "Skipping resync");
                return Ok(SyncOutcome::Skipped {
                    source: config.source.clone(),
                    reason,
                });
            }
            Connected::Ready { source, store } => (source, store),
        };

        info!(source = %config.source, store = %config.store, "Full resync: clearing checkpoint and sheet");
        self.checkpoints.clear(&config.source)?;
        ensure_header(&mut *store)?;
        store.clear_below_header()?;

        let end = (self.clock)();
        let report = self.run_windows(config, &*source, &mut *store, DateTime::UNIX_EPOCH, end)?;
        Ok(SyncOutcome::Applied(report))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Cell, Row, SourceRecord, header_row, to_iso};
    use crate::storage::memory::{MemoryConnector, MemoryProperties, MemorySheet, MemorySource};
    use crate::sync::checkpoint::checkpoint_key;
    use chrono::{Duration, TimeZone};

    fn ts(day: u32, hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 2, day, hour, 0, 0).unwrap()
    }

    fn now() -> DateTime<Utc> {
        ts(20, 0)
    }

    fn daily() -> SyncOptions {
        SyncOptions {
            window_days: 1,
            ..SyncOptions::default()
        }
    }

    fn wide() -> SyncOptions {
        SyncOptions {
            window_days: 36_500,
            ..SyncOptions::default()
        }
    }

    fn record(id: &str, day: u32) -> SourceRecord {
        SourceRecord::new(id, &format!("event {id}"), ts(day, 9), ts(day, 10))
    }

    fn stored(id: &str, day: u32) -> Row {
        vec![
            Cell::text(id),
            Cell::text("stale"),
            Cell::text(to_iso(&ts(day, 9))),
            Cell::text(to_iso(&ts(day, 10))),
        ]
    }

    fn connector_with(source: &str, records: Vec<SourceRecord>) -> MemoryConnector {
        let mut connector = MemoryConnector::default();
        connector.add_source(source, MemorySource::new(records));
        connector
    }

    fn ids(sheet: &MemorySheet) -> Vec<String> {
        sheet.rows()[1..].iter().map(|r| r[0].display()).collect()
    }

    #[test]
    fn test_tail_shorter_than_threshold_is_merged() {
        let mut props = MemoryProperties::default();
        let mut connector = connector_with("cal", vec![]);
        let config = SyncConfig::new("cal", "sheet");
        let end = ts(2, 0) + Duration::minutes(5);

        let mut driver = WindowedSyncDriver::new(&mut props, daily()).with_clock(now);
        let outcome = driver
            .sync_one(&mut connector, &config, Some(ts(1, 0)), Some(end))
            .unwrap();

        let report = outcome.report().unwrap();
        assert_eq!(report.windows, 1);
        assert_eq!(connector.source("cal").unwrap().queries(), vec![(ts(1, 0), end)]);
    }

    #[test]
    fn test_tail_longer_than_threshold_gets_own_window() {
        let mut props = MemoryProperties::default();
        let mut connector = connector_with("cal", vec![]);
        let config = SyncConfig::new("cal", "sheet");

        let mut driver = WindowedSyncDriver::new(&mut props, daily()).with_clock(now);
        driver
            .sync_one(&mut connector, &config, Some(ts(1, 0)), Some(ts(2, 1)))
            .unwrap();

        assert_eq!(
            connector.source("cal").unwrap().queries(),
            vec![(ts(1, 0), ts(2, 0)), (ts(2, 0), ts(2, 1))]
        );
    }

    #[test]
    fn test_iteration_cap_preserves_progress() {
        let mut props = MemoryProperties::default();
        let mut connector = connector_with("cal", vec![record("e1", 1), record("e2", 8)]);
        let config = SyncConfig::new("cal", "sheet");
        let options = SyncOptions {
            max_iterations: 3,
            ..daily()
        };
        let clock = || ts(10, 0);

        let mut driver = WindowedSyncDriver::new(&mut props, options).with_clock(clock);
        let first = driver
            .sync_one(&mut connector, &config, Some(ts(1, 0)), None)
            .unwrap();
        let report = first.report().unwrap();
        assert!(report.capped);
        assert_eq!(report.windows, 3);
        assert_eq!(report.checkpoint, ts(4, 0));
        assert_eq!(ids(connector.sheet("sheet").unwrap()), vec!["e1"]);

        // Resumes from the checkpoint; too old to rewind.
        let second = driver.sync_one(&mut connector, &config, None, None).unwrap();
        let report = second.report().unwrap();
        assert_eq!(report.checkpoint, ts(7, 0));
        assert_eq!(connector.source("cal").unwrap().queries()[3].0, ts(4, 0));

        let third = driver.sync_one(&mut connector, &config, None, None).unwrap();
        assert!(!third.report().unwrap().capped);
        assert_eq!(ids(connector.sheet("sheet").unwrap()), vec!["e1", "e2"]);
    }

    #[test]
    fn test_failed_window_leaves_checkpoint_untouched() {
        let mut props = MemoryProperties::default();
        let mut connector = connector_with("cal", vec![]);
        connector.add_sheet("sheet", MemorySheet::failing());
        let config = SyncConfig::new("cal", "sheet");

        let mut driver = WindowedSyncDriver::new(&mut props, daily()).with_clock(now);
        let result = driver.sync_one(&mut connector, &config, Some(ts(1, 0)), Some(ts(3, 0)));

        assert!(matches!(result, Err(SyncError::Store(_))));
        assert_eq!(driver.checkpoint("cal").unwrap(), None);
    }

    #[test]
    fn test_future_checkpoint_self_heals() {
        let mut props = MemoryProperties::default();
        let future = Utc.with_ymd_and_hms(2031, 1, 1, 0, 0, 0).unwrap();
        props
            .set_property(&checkpoint_key("cal"), &future.timestamp_millis().to_string())
            .unwrap();
        let mut connector = connector_with("cal", vec![record("e1", 3)]);
        let config = SyncConfig::new("cal", "sheet");

        let mut driver = WindowedSyncDriver::new(&mut props, wide()).with_clock(now);
        let outcome = driver.sync_one(&mut connector, &config, None, None).unwrap();

        let queries = connector.source("cal").unwrap().queries();
        assert_eq!(queries[0].0, DateTime::UNIX_EPOCH);
        assert_eq!(outcome.report().unwrap().checkpoint, now());
        assert_eq!(driver.checkpoint("cal").unwrap(), Some(now()));
    }

    #[test]
    fn test_invalid_checkpoint_self_heals() {
        let mut props = MemoryProperties::default();
        props.set_property(&checkpoint_key("cal"), "yesterday").unwrap();
        let mut connector = connector_with("cal", vec![]);
        let config = SyncConfig::new("cal", "sheet");

        let mut driver = WindowedSyncDriver::new(&mut props, wide()).with_clock(now);
        driver.sync_one(&mut connector, &config, None, None).unwrap();

        assert_eq!(
            connector.source("cal").unwrap().queries(),
            vec![(DateTime::UNIX_EPOCH, now())]
        );
    }

    #[test]
    fn test_recent_checkpoint_rewinds_one_window() {
        let mut props = MemoryProperties::default();
        let checkpoint = now() - Duration::hours(12);
        props
            .set_property(&checkpoint_key("cal"), &checkpoint.timestamp_millis().to_string())
            .unwrap();

        let mut driver = WindowedSyncDriver::new(&mut props, daily()).with_clock(now);
        let (start, end) = driver.determine_range("cal", None, None).unwrap();

        assert_eq!(start, checkpoint - Duration::days(1));
        assert_eq!(end, now());
    }

    #[test]
    fn test_rewind_threshold_is_configurable() {
        let mut props = MemoryProperties::default();
        let checkpoint = now() - Duration::days(3);
        props
            .set_property(&checkpoint_key("cal"), &checkpoint.timestamp_millis().to_string())
            .unwrap();
        let options = SyncOptions {
            rewind_threshold_days: Some(5),
            ..daily()
        };

        let mut driver = WindowedSyncDriver::new(&mut props, options).with_clock(now);
        let (start, _) = driver.determine_range("cal", None, None).unwrap();
        assert_eq!(start, checkpoint - Duration::days(1));

        let (start, _) = driver.determine_range("cal", Some(ts(1, 0)), None).unwrap();
        assert_eq!(start, ts(1, 0));
    }

    #[test]
    fn test_rewind_does_not_cross_epoch() {
        let mut props = MemoryProperties::default();
        let epoch_clock = || DateTime::UNIX_EPOCH + Duration::hours(1);
        props
            .set_property(&checkpoint_key("cal"), &Duration::minutes(30).num_milliseconds().to_string())
            .unwrap();

        let mut driver = WindowedSyncDriver::new(&mut props, daily()).with_clock(epoch_clock);
        let (start, _) = driver.determine_range("cal", None, None).unwrap();

        assert_eq!(start, DateTime::UNIX_EPOCH);
    }

    #[test]
    fn test_explicit_start_after_end_resets_to_epoch() {
        let mut props = MemoryProperties::default();
        props
            .set_property(&checkpoint_key("cal"), &ts(2, 0).timestamp_millis().to_string())
            .unwrap();
        let mut driver = WindowedSyncDriver::new(&mut props, daily()).with_clock(now);

        let (start, end) = driver
            .determine_range("cal", Some(ts(5, 0)), Some(ts(4, 0)))
            .unwrap();

        assert_eq!(start, DateTime::UNIX_EPOCH);
        assert_eq!(end, ts(4, 0));
        assert_eq!(driver.checkpoint("cal").unwrap(), None);
    }

    #[test]
    fn test_checkpoint_never_moves_backwards() {
        let mut props = MemoryProperties::default();
        let mut connector = connector_with("cal", vec![]);
        let config = SyncConfig::new("cal", "sheet");

        let mut driver = WindowedSyncDriver::new(&mut props, daily()).with_clock(now);
        driver
            .sync_one(&mut connector, &config, Some(ts(10, 0)), Some(ts(12, 0)))
            .unwrap();
        let outcome = driver
            .sync_one(&mut connector, &config, Some(ts(1, 0)), Some(ts(3, 0)))
            .unwrap();

        assert_eq!(outcome.report().unwrap().checkpoint, ts(12, 0));
        assert_eq!(driver.checkpoint("cal").unwrap(), Some(ts(12, 0)));
    }

    #[test]
    fn test_tag_filter_applies_per_config() {
        let mut props = MemoryProperties::default();
        let mut tagged = record("work", 3);
        tagged.tags = vec!["work".to_string()];
        let mut connector = connector_with("cal", vec![tagged, record("home", 3)]);
        let mut config = SyncConfig::new("cal", "sheet");
        config.filter = Some("work".to_string());

        let mut driver = WindowedSyncDriver::new(&mut props, wide()).with_clock(now);
        driver
            .sync_one(&mut connector, &config, Some(ts(1, 0)), None)
            .unwrap();

        assert_eq!(ids(connector.sheet("sheet").unwrap()), vec!["work"]);
    }

    #[test]
    fn test_missing_source_is_skipped() {
        let mut props = MemoryProperties::default();
        let mut connector = MemoryConnector::default();
        let config = SyncConfig::new("gone", "sheet");

        let mut driver = WindowedSyncDriver::new(&mut props, daily()).with_clock(now);
        let outcome = driver.sync_one(&mut connector, &config, None, None).unwrap();

        assert!(matches!(outcome, SyncOutcome::Skipped { ref source, .. } if source == "gone"));
        assert_eq!(driver.checkpoint("gone").unwrap(), None);
    }

    #[test]
    fn test_sync_all_isolates_failures() {
        let mut props = MemoryProperties::default();
        let mut connector = MemoryConnector::default();
        connector.add_source("broken", MemorySource::failing());
        connector.add_source("ok", MemorySource::new(vec![record("e1", 3)]));
        let configs = vec![
            SyncConfig::new("broken", "s1"),
            SyncConfig::new("ok", "s2"),
            SyncConfig::new("absent", "s3"),
        ];

        let mut driver = WindowedSyncDriver::new(&mut props, wide()).with_clock(now);
        let batch = driver.sync_all(&mut connector, &configs, Some(ts(1, 0)), None);

        assert!(!batch.is_success());
        assert_eq!(batch.failures.len(), 1);
        assert_eq!(batch.failures[0].source, "broken");
        assert_eq!(batch.outcomes.len(), 2);
        assert!(batch.outcomes[0].is_applied());
        assert!(!batch.outcomes[1].is_applied());
        assert_eq!(batch.totals().inserted, 1);
        assert_eq!(driver.checkpoint("broken").unwrap(), None);
        assert_eq!(driver.checkpoint("ok").unwrap(), Some(now()));
        assert_eq!(ids(connector.sheet("s2").unwrap()), vec!["e1"]);
    }

    #[test]
    fn test_full_resync_rebuilds_sheet() {
        let mut props = MemoryProperties::default();
        let mut connector = connector_with("cal", vec![record("e1", 3), record("e2", 4)]);
        let mut header = header_row();
        header.push(Cell::text("notes"));
        connector.add_sheet(
            "sheet",
            MemorySheet::with_rows(vec![header.clone(), stored("old", 1), stored("e1", 3)]),
        );
        let configs = vec![SyncConfig::new("cal", "sheet")];

        let mut driver = WindowedSyncDriver::new(&mut props, wide()).with_clock(now);
        driver
            .sync_one(&mut connector, &configs[0], Some(ts(3, 0)), None)
            .unwrap();
        // The out-of-window row survives an ordinary sync.
        assert!(ids(connector.sheet("sheet").unwrap()).contains(&"old".to_string()));

        let batch = driver
            .full_resync(&mut connector, &configs, &ConfigSelector::Index(0))
            .unwrap();

        assert!(batch.is_success());
        let sheet = connector.sheet("sheet").unwrap();
        assert_eq!(sheet.rows()[0], header);
        assert_eq!(ids(sheet), vec!["e1", "e2"]);
        assert_eq!(driver.checkpoint("cal").unwrap(), Some(now()));
    }

    #[test]
    fn test_full_resync_with_default_options_reaches_now() {
        let mut props = MemoryProperties::default();
        let mut connector = connector_with("cal", vec![record("e1", 18)]);
        connector.add_sheet(
            "sheet",
            MemorySheet::with_rows(vec![header_row(), stored("e1", 18)]),
        );
        let configs = vec![SyncConfig::new("cal", "sheet")];

        let mut driver =
            WindowedSyncDriver::new(&mut props, SyncOptions::default()).with_clock(now);
        let batch = driver
            .full_resync(&mut connector, &configs, &ConfigSelector::All)
            .unwrap();

        let report = batch.outcomes[0].report().unwrap();
        assert!(!report.capped);
        assert_eq!(report.checkpoint, now());
        assert_eq!(ids(connector.sheet("sheet").unwrap()), vec!["e1"]);
        assert_eq!(driver.checkpoint("cal").unwrap(), Some(now()));
    }

    #[test]
    fn test_full_resync_single_target_propagates() {
        let mut props = MemoryProperties::default();
        let mut connector = MemoryConnector::default();
        connector.add_source("broken", MemorySource::failing());
        let configs = vec![SyncConfig::new("broken", "sheet")];

        let mut driver = WindowedSyncDriver::new(&mut props, wide()).with_clock(now);

        let single = driver.full_resync(
            &mut connector,
            &configs,
            &ConfigSelector::Source("broken".to_string()),
        );
        assert!(matches!(single, Err(SyncError::Source(_))));

        let all = driver
            .full_resync(&mut connector, &configs, &ConfigSelector::All)
            .unwrap();
        assert_eq!(all.failures.len(), 1);

        let unknown = driver.full_resync(&mut connector, &configs, &ConfigSelector::Index(4));
        assert!(matches!(unknown, Err(SyncError::UnknownConfig(_))));
    }

    #[test]
    fn test_selector_parsing() {
        assert_eq!("2".parse::<ConfigSelector>().unwrap(), ConfigSelector::Index(2));
        assert_eq!(
            "team@example.com".parse::<ConfigSelector>().unwrap(),
            ConfigSelector::Source("team@example.com".to_string())
        );
        assert!("  ".parse::<ConfigSelector>().is_err());
    }

    #[test]
    fn test_parse_instant_formats() {
        assert_eq!(parse_instant("2026-02-03T09:00:00Z").unwrap(), ts(3, 9));
        assert_eq!(parse_instant("2026-02-03T10:00:00+01:00").unwrap(), ts(3, 9));
        assert_eq!(parse_instant("2026-02-03T09:00:00").unwrap(), ts(3, 9));
        assert_eq!(parse_instant("2026-02-03").unwrap(), ts(3, 0));
        assert!(matches!(
            parse_instant("next tuesday"),
            Err(SyncError::InvalidTimestamp(_))
        ));
    }
}
