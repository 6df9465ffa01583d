//! Orchestration over the resource, table and translation crates. The CLI
//! only talks to this layer.

pub mod decisions;
pub mod engine;
pub mod export;
pub mod init;
pub mod sync;
pub mod validate;
pub mod worker;

use std::path::Path;

pub use decisions::{Assume, AutoAnswer, DecisionPort};
pub use engine::{MergeRun, RunCounters, UnitOutcome};
pub use export::{export_rows, export_table, ExportStats};
pub use init::{init_target, InitOutcome, InitStatus};
pub use resxsync_core::{ItemKind, Result, TranslatedItem, TranslationEntry};
pub use resxsync_resx::ResourceEntry;
pub use sync::{sync_from_table, sync_online, Mode, RunSummary, SyncOptions};
pub use worker::{spawn_run, Answer, ChannelDecisions, JobKind, Prompt, Question, RunHandle, RunJob, WorkerEvent};

/// Source entries whose value matches `value` (case-insensitive, trimmed).
pub fn lookup_value(source: &Path, value: &str) -> Result<Vec<ResourceEntry>> {
    resxsync_resx::ensure_extension(source, "resx")?;
    let doc = resxsync_resx::ResourceDocument::load(source)?;
    Ok(doc.find_by_value(value))
}
