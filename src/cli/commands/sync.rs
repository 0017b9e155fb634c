//! Sync command implementation.
//!
//! Without a target every config is synced and failures are isolated: one
//! broken source does not stop the others, and the command exits non-zero
//! afterwards. With `--source` or `--index` the single sync's error is
//! returned as-is.

use tracing::info;

use crate::cli::SyncArgs;
use crate::cli::commands::{Paths, check_batch, load_settings, open_storage, print_batch, record_batch};
use crate::error::Result;
use crate::source::LocalConnector;
use crate::storage::EventType;
use crate::sync::{
    BatchReport, ConfigSelector, SyncFailure, WindowedSyncDriver, parse_instant, select_configs,
};

/// Execute the sync command.
///
/// # Errors
///
/// Returns an error if settings or the database cannot be opened, a
/// timestamp does not parse, the targeted sync fails, or any config fails
/// in a full run.
pub fn execute(args: &SyncArgs, paths: &Paths<'_>, json: bool) -> Result<()> {
    let (config_path, settings) = load_settings(paths)?;
    let storage = open_storage(paths)?;

    let start = args.start.as_deref().map(parse_instant).transpose()?;
    let end = args.end.as_deref().map(parse_instant).transpose()?;

    let selector = match (&args.source, args.index) {
        (Some(source), _) => Some(ConfigSelector::Source(source.clone())),
        (None, Some(index)) => Some(ConfigSelector::Index(index)),
        (None, None) => None,
    };

    let source_dir = settings.source_dir(&config_path);
    info!(source_dir = %source_dir.display(), configs = settings.syncs.len(), "Loaded settings");

    let mut properties = storage.properties();
    let mut connector = LocalConnector::new(source_dir, &storage);
    let mut driver = WindowedSyncDriver::new(&mut properties, settings.options.clone());

    let batch = match selector {
        None => driver.sync_all(&mut connector, &settings.syncs, start, end),
        Some(selector) => {
            let mut batch = BatchReport::default();
            for config in select_configs(&settings.syncs, &selector)? {
                match driver.sync_one(&mut connector, config, start, end) {
                    Ok(outcome) => batch.outcomes.push(outcome),
                    Err(e) => {
                        batch.failures.push(SyncFailure {
                            source: config.source.clone(),
                            store: config.store.clone(),
                            error: e.to_string(),
                        });
                        record_batch(&storage, &batch, EventType::SyncApplied)?;
                        return Err(e.into());
                    }
                }
            }
            batch
        }
    };

    record_batch(&storage, &batch, EventType::SyncApplied)?;
    print_batch(&batch, json)?;
    check_batch(&batch)
}
