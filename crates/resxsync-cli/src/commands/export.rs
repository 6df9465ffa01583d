use std::path::PathBuf;

use resxsync_config::ResxSyncConfig;
use resxsync_domain::{ExportReport, SCHEMA_VERSION};

use crate::Format;

pub fn run_export(
    cfg: &ResxSyncConfig,
    source: PathBuf,
    target: PathBuf,
    out: PathBuf,
    sheet: Option<usize>,
    include_missing: bool,
    format: Format,
) -> color_eyre::Result<()> {
    let sheet = sheet.unwrap_or_else(|| cfg.sheet());
    tracing::debug!(event = "export_args", source = ?source, target = ?target, out = ?out, sheet = sheet, include_missing = include_missing);

    let stats = resxsync_services::export_table(&source, &target, &out, sheet, include_missing)?;
    match format {
        Format::Json => {
            let report = ExportReport {
                schema_version: SCHEMA_VERSION,
                path: out.display().to_string(),
                rows: stats.rows,
                untranslated: stats.untranslated,
            };
            serde_json::to_writer_pretty(std::io::stdout().lock(), &report)?;
            println!();
        }
        Format::Text => {
            crate::ui_ok!("exported {} row(s) to {}", stats.rows, out.display());
            if stats.untranslated > 0 {
                crate::ui_info!("{} row(s) still need a translation", stats.untranslated);
            }
        }
    }
    Ok(())
}
