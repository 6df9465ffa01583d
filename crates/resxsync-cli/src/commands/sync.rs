use std::io::IsTerminal;
use std::path::PathBuf;
use std::str::FromStr;

use color_eyre::eyre::eyre;
use resxsync_config::ResxSyncConfig;
use resxsync_core::TranslatedItem;
use resxsync_domain::{RunReport, SCHEMA_VERSION};
use resxsync_services::{
    spawn_run, sync_from_table, sync_online, Assume, AutoAnswer, JobKind, RunJob, RunSummary, SyncOptions,
    WorkerEvent,
};
use resxsync_translate::{build_provider, find_language, ProviderKind, ProviderSettings};

use crate::prompt::ConsolePrompt;
use crate::Format;

pub struct CommonArgs {
    pub source: PathBuf,
    pub target: PathBuf,
    pub assume: Option<Assume>,
    pub dry_run: bool,
    pub backup: bool,
    pub format: Format,
}

pub struct TableArgs {
    pub common: CommonArgs,
    pub table: PathBuf,
    pub sheet: Option<usize>,
}

pub struct OnlineArgs {
    pub common: CommonArgs,
    pub from: Option<String>,
    pub to: Option<String>,
    pub provider: Option<ProviderKind>,
}

pub fn run_sync_table(cfg: &ResxSyncConfig, args: TableArgs, use_color: bool) -> color_eyre::Result<()> {
    let kind = JobKind::Table {
        table: args.table,
        sheet: args.sheet.unwrap_or_else(|| cfg.sheet()),
    };
    drive(cfg, args.common, kind, use_color)
}

pub fn run_sync_online(cfg: &ResxSyncConfig, args: OnlineArgs, use_color: bool) -> color_eyre::Result<()> {
    let from = args.from.unwrap_or_else(|| cfg.source_lang().to_string());
    let to = args.to.unwrap_or_else(|| cfg.target_lang().to_string());
    for code in [&from, &to] {
        if find_language(code).is_none() {
            return Err(eyre!(
                "unsupported language code `{code}` (see `resxsync languages`)"
            ));
        }
    }
    let kind = match args.provider {
        Some(k) => k,
        None => ProviderKind::from_str(cfg.provider())?,
    };
    let online = cfg.online.clone().unwrap_or_default();
    let settings = ProviderSettings {
        google_endpoint: online.google_endpoint,
        bing_endpoint: online.bing_endpoint,
        bing_app_id: online.bing_app_id,
        user_agent: online.user_agent,
        timeout_secs: online.timeout_secs,
    };
    tracing::debug!(event = "sync_online_args", provider = %kind, from = %from, to = %to);
    let provider = build_provider(kind, &from, &to, &settings)?;
    drive(cfg, args.common, JobKind::Online { provider }, use_color)
}

/// Run one job and report it. Prompts go to the terminal when stdin is
/// interactive and no `--assume` is set; otherwise every question gets the
/// assumed answer (default: no).
fn drive(cfg: &ResxSyncConfig, args: CommonArgs, kind: JobKind, use_color: bool) -> color_eyre::Result<()> {
    let assume = match args.assume {
        Some(a) => Some(a),
        None => cfg
            .assume()
            .map(Assume::from_str)
            .transpose()
            .map_err(|e| eyre!("resxsync.toml [sync] assume: {e}"))?,
    };
    let options = SyncOptions {
        dry_run: args.dry_run,
        backup: args.backup || cfg.backup(),
    };
    let text = args.format == Format::Text;
    let mode = match kind {
        JobKind::Table { .. } => "table",
        JobKind::Online { .. } => "online",
    };

    if text {
        crate::ui_info!("Translation Started");
    }

    let mut items: Vec<TranslatedItem> = Vec::new();
    let mut on_item = |item: TranslatedItem| {
        if text {
            print_item(&item, use_color);
        }
        items.push(item);
    };

    let interactive = assume.is_none() && std::io::stdin().is_terminal();
    let summary = if interactive {
        interactive_run(
            RunJob {
                source: args.source,
                target: args.target,
                kind,
                options,
            },
            &mut on_item,
        )?
    } else {
        let mut decisions = AutoAnswer::new(assume.unwrap_or_default());
        match &kind {
            JobKind::Table { table, sheet } => sync_from_table(
                &args.source,
                &args.target,
                table,
                *sheet,
                options,
                &mut decisions,
                &mut on_item,
            ),
            JobKind::Online { provider } => sync_online(
                &args.source,
                &args.target,
                provider.as_ref(),
                options,
                &mut decisions,
                &mut on_item,
            ),
        }
    };

    report(mode, &summary, items, options.dry_run, args.format)?;
    match summary.failure {
        Some(msg) => Err(eyre!(msg)),
        None => Ok(()),
    }
}

/// The run goes to the background worker; the main thread answers its questions.
fn interactive_run(job: RunJob, on_item: &mut dyn FnMut(TranslatedItem)) -> color_eyre::Result<RunSummary> {
    let mut console = ConsolePrompt::stdio();
    let mut summary = None;
    for event in spawn_run(job) {
        match event {
            WorkerEvent::Ask(prompt) => match console.answer(&prompt.question) {
                Ok(answer) => prompt.reply(answer),
                Err(e) => {
                    // dropping the prompt fails the run on the worker side
                    tracing::warn!(event = "prompt_failed", error = %e);
                    drop(prompt);
                }
            },
            WorkerEvent::Item(item) => on_item(item),
            WorkerEvent::Finished(s) => summary = Some(s),
        }
    }
    summary.ok_or_else(|| eyre!("background run ended without a result"))
}

fn print_item(item: &TranslatedItem, use_color: bool) {
    if item.is_failure() {
        return;
    }
    let comment = item
        .comment
        .as_deref()
        .map(|c| format!("  ({c})"))
        .unwrap_or_default();
    if use_color {
        use owo_colors::OwoColorize;
        let key = if item.is_warning() {
            item.key.yellow().to_string()
        } else {
            item.key.green().to_string()
        };
        crate::ui_out!("{key}: {} => {}{}", item.english_value, item.translation.cyan(), comment.dimmed());
    } else {
        crate::ui_out!("{}: {} => {}{}", item.key, item.english_value, item.translation, comment);
    }
}

fn report(
    mode: &str,
    summary: &RunSummary,
    items: Vec<TranslatedItem>,
    dry_run: bool,
    format: Format,
) -> color_eyre::Result<()> {
    let secs = summary.elapsed.as_secs_f64();
    match format {
        Format::Json => {
            let report = RunReport {
                schema_version: SCHEMA_VERSION,
                mode: mode.to_string(),
                written: summary.written,
                skipped: summary.skipped,
                warnings: summary.warnings,
                cancelled: summary.cancelled,
                failure: summary.failure.clone(),
                dry_run,
                elapsed_secs: secs,
                items,
            };
            serde_json::to_writer_pretty(std::io::stdout().lock(), &report)?;
            println!();
        }
        Format::Text => {
            // the failure itself is reported once, by the error returned from `drive`
            if summary.failure.is_some() {
                return Ok(());
            }
            if summary.cancelled {
                crate::ui_warn!("The translation operation has been aborted.");
            }
            crate::ui_ok!(
                "written: {}, skipped: {}, warnings: {}{}",
                summary.written,
                summary.skipped,
                summary.warnings,
                if dry_run { " (dry run, nothing saved)" } else { "" }
            );
            if !summary.cancelled {
                crate::ui_info!("Translation Completed. ({} seconds elapsed)", secs.round() as u64);
            }
        }
    }
    Ok(())
}
