use std::collections::HashMap;
use std::path::Path;

use resxsync_core::{Result, TranslationEntry};
use resxsync_resx::{ensure_extension, ResourceDocument};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExportStats {
    pub rows: usize,
    /// Rows whose translation cell is blank.
    pub untranslated: usize,
}

/// Rows pairing every source entry with its target translation, in source
/// order. Keys are matched case-insensitively; with `include_missing`,
/// source keys absent from the target appear with a blank translation.
pub fn export_rows(
    source: &ResourceDocument,
    target: &ResourceDocument,
    include_missing: bool,
) -> Vec<TranslationEntry> {
    let translated: HashMap<String, (String, String)> = target
        .entries()
        .into_iter()
        .map(|e| (e.key.to_lowercase(), (e.key, e.value)))
        .collect();

    source
        .entries()
        .into_iter()
        .filter_map(|src| match translated.get(&src.key.to_lowercase()) {
            Some((key, value)) => Some(TranslationEntry {
                key: Some(key.clone()),
                english_value: src.value,
                translated_value: value.clone(),
            }),
            None if include_missing => Some(TranslationEntry {
                key: Some(src.key),
                english_value: src.value,
                translated_value: String::new(),
            }),
            None => None,
        })
        .collect()
}

/// Write the source/target join to worksheet `sheet` of `out`.
pub fn export_table(
    source: &Path,
    target: &Path,
    out: &Path,
    sheet: usize,
    include_missing: bool,
) -> Result<ExportStats> {
    ensure_extension(source, "resx")?;
    ensure_extension(target, "resx")?;
    ensure_extension(out, "csv")?;
    let src = ResourceDocument::load(source)?;
    let tgt = ResourceDocument::load(target)?;

    let rows = export_rows(&src, &tgt, include_missing);
    resxsync_table::write_rows(&rows, out, sheet)?;

    let stats = ExportStats {
        rows: rows.len(),
        untranslated: rows
            .iter()
            .filter(|r| r.translated_value.trim().is_empty())
            .count(),
    };
    tracing::info!(
        event = "export_done",
        out = %out.display(),
        rows = stats.rows,
        untranslated = stats.untranslated,
    );
    Ok(stats)
}
