use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use resxsync_core::{Result, TranslatedItem};
use resxsync_resx::{ensure_extension, ResourceStore};
use resxsync_translate::TranslationProvider;

use crate::decisions::DecisionPort;
use crate::engine::MergeRun;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Table,
    Online,
}

impl Mode {
    pub fn as_str(self) -> &'static str {
        match self {
            Mode::Table => "table",
            Mode::Online => "online",
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SyncOptions {
    pub dry_run: bool,
    pub backup: bool,
}

/// Outcome of a whole run. `failure` carries the message of the error that
/// ended it early; writes committed before that point are kept.
#[derive(Debug, Clone, PartialEq)]
pub struct RunSummary {
    pub mode: Mode,
    pub written: usize,
    pub skipped: usize,
    pub warnings: usize,
    pub cancelled: bool,
    pub failure: Option<String>,
    pub elapsed: Duration,
}

impl RunSummary {
    fn new(mode: Mode) -> Self {
        Self {
            mode,
            written: 0,
            skipped: 0,
            warnings: 0,
            cancelled: false,
            failure: None,
            elapsed: Duration::ZERO,
        }
    }

    pub fn is_failure(&self) -> bool {
        self.failure.is_some()
    }
}

/// Where a run's rows come from.
pub enum RunSource<'a> {
    Table { path: PathBuf, sheet: usize },
    Online(&'a dyn TranslationProvider),
}

/// Spreadsheet-driven run over `table` (worksheet `sheet`).
pub fn sync_from_table(
    source: &Path,
    target: &Path,
    table: &Path,
    sheet: usize,
    options: SyncOptions,
    decisions: &mut dyn DecisionPort,
    sink: &mut dyn FnMut(TranslatedItem),
) -> RunSummary {
    let src = RunSource::Table {
        path: table.to_path_buf(),
        sheet,
    };
    run(source, target, src, options, decisions, sink)
}

/// Online-translation-driven run: every source entry goes through `provider`.
pub fn sync_online(
    source: &Path,
    target: &Path,
    provider: &dyn TranslationProvider,
    options: SyncOptions,
    decisions: &mut dyn DecisionPort,
    sink: &mut dyn FnMut(TranslatedItem),
) -> RunSummary {
    run(source, target, RunSource::Online(provider), options, decisions, sink)
}

fn run(
    source: &Path,
    target: &Path,
    src: RunSource<'_>,
    options: SyncOptions,
    decisions: &mut dyn DecisionPort,
    sink: &mut dyn FnMut(TranslatedItem),
) -> RunSummary {
    let started = Instant::now();
    let mode = match src {
        RunSource::Table { .. } => Mode::Table,
        RunSource::Online(_) => Mode::Online,
    };
    tracing::info!(
        event = "run_started",
        mode = mode.as_str(),
        source = %source.display(),
        target = %target.display(),
        dry_run = options.dry_run,
    );

    let mut summary = RunSummary::new(mode);
    let mut store = None;
    let result = execute(source, target, src, options, decisions, sink, &mut store, &mut summary);

    let mut failure = result.err().map(|e| format!("{e:#}"));
    if let Some(mut store) = store {
        if let Err(e) = store.save() {
            failure.get_or_insert_with(|| format!("{e:#}"));
        }
    }
    if let Some(msg) = &failure {
        tracing::error!(event = "run_failed", mode = mode.as_str(), error = %msg);
        sink(TranslatedItem::failure(msg));
    }

    summary.failure = failure;
    summary.elapsed = started.elapsed();
    tracing::info!(
        event = "run_finished",
        mode = mode.as_str(),
        written = summary.written,
        skipped = summary.skipped,
        warnings = summary.warnings,
        cancelled = summary.cancelled,
        failed = summary.is_failure(),
        elapsed_ms = summary.elapsed.as_millis() as u64,
    );
    summary
}

#[allow(clippy::too_many_arguments)]
fn execute(
    source: &Path,
    target: &Path,
    src: RunSource<'_>,
    options: SyncOptions,
    decisions: &mut dyn DecisionPort,
    sink: &mut dyn FnMut(TranslatedItem),
    slot: &mut Option<ResourceStore>,
    summary: &mut RunSummary,
) -> Result<()> {
    ensure_extension(source, "resx")?;
    ensure_extension(target, "resx")?;
    let rows = match &src {
        RunSource::Table { path, sheet } => {
            ensure_extension(path, "csv")?;
            Some(resxsync_table::read_rows(path, *sheet)?)
        }
        RunSource::Online(_) => None,
    };

    let store = slot.insert(
        ResourceStore::open(source, target)?
            .dry_run(options.dry_run)
            .with_backup(options.backup),
    );

    let mut run = MergeRun::new(store, decisions, sink);
    let result = match (&src, rows) {
        (RunSource::Online(provider), _) => run.run_online(*provider),
        (_, Some(rows)) => run.run_table(&rows),
        (_, None) => Ok(()),
    };
    let counters = run.counters();
    summary.written = counters.written;
    summary.skipped = counters.skipped;
    summary.warnings = counters.warnings;
    summary.cancelled = run.is_cancelled();
    if summary.cancelled {
        tracing::info!(event = "run_cancelled", mode = summary.mode.as_str());
    }
    result
}
