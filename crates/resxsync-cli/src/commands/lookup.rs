use std::path::PathBuf;

use resxsync_domain::{LookupMatch, LookupOutput, SCHEMA_VERSION};

use crate::Format;

pub fn run_lookup(source: PathBuf, value: String, format: Format, use_color: bool) -> color_eyre::Result<()> {
    let matches = resxsync_services::lookup_value(&source, &value)?;
    tracing::debug!(event = "lookup", value = %value, matches = matches.len());

    match format {
        Format::Json => {
            let out = LookupOutput {
                schema_version: SCHEMA_VERSION,
                query: value,
                matches: matches
                    .into_iter()
                    .map(|e| LookupMatch { key: e.key, value: e.value })
                    .collect(),
            };
            serde_json::to_writer_pretty(std::io::stdout().lock(), &out)?;
            println!();
        }
        Format::Text => {
            if matches.is_empty() {
                crate::ui_warn!("no key holds \"{value}\"");
            }
            for m in matches {
                if use_color {
                    use owo_colors::OwoColorize;
                    crate::ui_out!("{}\t{}", m.key.green(), m.value);
                } else {
                    crate::ui_out!("{}\t{}", m.key, m.value);
                }
            }
        }
    }
    Ok(())
}
