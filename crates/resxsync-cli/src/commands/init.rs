use std::path::PathBuf;

use resxsync_domain::{InitReport, SCHEMA_VERSION};
use resxsync_services::InitStatus;

use crate::Format;

pub fn run_init(
    source: PathBuf,
    target: PathBuf,
    overwrite: bool,
    dry_run: bool,
    format: Format,
) -> color_eyre::Result<()> {
    tracing::debug!(event = "init_args", source = ?source, target = ?target, overwrite = overwrite, dry_run = dry_run);

    let outcome = resxsync_services::init_target(&source, &target, overwrite, dry_run)?;
    if format == Format::Json {
        let report = InitReport {
            schema_version: SCHEMA_VERSION,
            path: target.display().to_string(),
            keys: outcome.keys,
            status: outcome.status.as_str().to_string(),
        };
        serde_json::to_writer_pretty(std::io::stdout().lock(), &report)?;
        println!();
        return Ok(());
    }
    match outcome.status {
        InitStatus::Created | InitStatus::Replaced => {
            crate::ui_ok!("{} with {} key(s): {}", outcome.status.as_str(), outcome.keys, target.display())
        }
        InitStatus::Planned => {
            crate::ui_out!("DRY-RUN: would write {} key(s) to {}", outcome.keys, target.display())
        }
        InitStatus::Skipped => {
            crate::ui_warn!("{} already exists; pass --overwrite to replace it", target.display())
        }
    }
    Ok(())
}
