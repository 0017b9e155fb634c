//! Resync command implementation.

use crate::cli::commands::{Paths, check_batch, load_settings, open_storage, print_batch, record_batch};
use crate::error::{Error, Result};
use crate::source::LocalConnector;
use crate::storage::EventType;
use crate::sync::{ConfigSelector, WindowedSyncDriver};

/// Execute the resync command.
///
/// `target` is a source identity or a config index; `all` resyncs every
/// config with failures isolated.
///
/// # Errors
///
/// Returns an error if no config matches, the single target fails, or any
/// config fails when resyncing all.
pub fn execute(target: Option<&str>, all: bool, paths: &Paths<'_>, json: bool) -> Result<()> {
    let selector = match (all, target) {
        (true, _) => ConfigSelector::All,
        (false, Some(target)) => target.parse()?,
        (false, None) => {
            return Err(Error::InvalidArgument(
                "Pass a source, an index, or --all".to_string(),
            ));
        }
    };

    let (config_path, settings) = load_settings(paths)?;
    let storage = open_storage(paths)?;

    let mut properties = storage.properties();
    let mut connector = LocalConnector::new(settings.source_dir(&config_path), &storage);
    let mut driver = WindowedSyncDriver::new(&mut properties, settings.options.clone());

    let batch = driver.full_resync(&mut connector, &settings.syncs, &selector)?;

    record_batch(&storage, &batch, EventType::ResyncApplied)?;
    print_batch(&batch, json)?;
    check_batch(&batch)
}
