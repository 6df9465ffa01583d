use clap::{Parser, Subcommand, ValueEnum};
use color_eyre::eyre::Result;
use std::io::IsTerminal;
use std::path::PathBuf;
use tracing::{debug, error, info};
use tracing_appender::rolling;
use tracing_subscriber::Layer;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod commands;
mod prompt;
mod ui;

#[derive(Parser)]
#[command(
    name = "resxsync",
    version,
    about = "Fill localized ResX resource files from translation tables or online translators"
)]
struct Cli {
    /// Disable coloured output
    #[arg(long, global = true)]
    no_color: bool,

    /// Only print results and errors
    #[arg(long, short, global = true)]
    quiet: bool,

    #[command(subcommand)]
    cmd: Commands,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum Format {
    #[default]
    Text,
    Json,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum AssumeArg {
    Yes,
    YesToAll,
    No,
    Cancel,
}

impl From<AssumeArg> for resxsync_services::Assume {
    fn from(a: AssumeArg) -> Self {
        match a {
            AssumeArg::Yes => Self::Yes,
            AssumeArg::YesToAll => Self::YesToAll,
            AssumeArg::No => Self::No,
            AssumeArg::Cancel => Self::Cancel,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum ProviderArg {
    Google,
    Bing,
}

impl From<ProviderArg> for resxsync_translate::ProviderKind {
    fn from(p: ProviderArg) -> Self {
        match p {
            ProviderArg::Google => Self::Google,
            ProviderArg::Bing => Self::Bing,
        }
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Apply a translation table (CSV: key, English, translation) to a target resource file
    SyncTable {
        /// English resource file (*.resx)
        #[arg(long)]
        source: PathBuf,
        /// Target language resource file (*.resx)
        #[arg(long)]
        target: PathBuf,
        /// Translation table (*.csv)
        #[arg(long)]
        table: PathBuf,
        /// Worksheet index (1-based)
        #[arg(long)]
        sheet: Option<usize>,
        /// Answer every prompt this way instead of asking
        #[arg(long, value_enum)]
        assume: Option<AssumeArg>,
        #[arg(long, default_value_t = false)]
        dry_run: bool,
        /// Copy the target to <target>.bak before the first write
        #[arg(long, default_value_t = false)]
        backup: bool,
        #[arg(long, value_enum, default_value_t = Format::Text)]
        format: Format,
    },

    /// Translate every English entry with an online service and write it to the target
    SyncOnline {
        #[arg(long)]
        source: PathBuf,
        #[arg(long)]
        target: PathBuf,
        /// Source language code
        #[arg(long)]
        from: Option<String>,
        /// Target language code
        #[arg(long)]
        to: Option<String>,
        #[arg(long, value_enum)]
        provider: Option<ProviderArg>,
        #[arg(long, value_enum)]
        assume: Option<AssumeArg>,
        #[arg(long, default_value_t = false)]
        dry_run: bool,
        #[arg(long, default_value_t = false)]
        backup: bool,
        #[arg(long, value_enum, default_value_t = Format::Text)]
        format: Format,
    },

    /// Export source/target pairs to a translation table
    Export {
        #[arg(long)]
        source: PathBuf,
        #[arg(long)]
        target: PathBuf,
        /// Output table (*.csv)
        #[arg(long)]
        out: PathBuf,
        #[arg(long)]
        sheet: Option<usize>,
        /// Also export source keys missing from the target
        #[arg(long, default_value_t = false)]
        include_missing: bool,
        #[arg(long, value_enum, default_value_t = Format::Text)]
        format: Format,
    },

    /// Create a target resource file with every source key and empty values
    Init {
        #[arg(long)]
        source: PathBuf,
        #[arg(long)]
        target: PathBuf,
        #[arg(long, default_value_t = false)]
        overwrite: bool,
        #[arg(long, default_value_t = false)]
        dry_run: bool,
        #[arg(long, value_enum, default_value_t = Format::Text)]
        format: Format,
    },

    /// List the keys whose English value matches a phrase
    Lookup {
        #[arg(long)]
        source: PathBuf,
        #[arg(long)]
        value: String,
        #[arg(long, value_enum, default_value_t = Format::Text)]
        format: Format,
    },

    /// List supported language codes
    Languages {
        #[arg(long, value_enum, default_value_t = Format::Text)]
        format: Format,
    },

    /// Write JSON Schemas of the report formats
    Schema {
        #[arg(long, default_value = "")]
        out_dir: PathBuf,
    },
}

trait Runnable {
    fn run(self, use_color: bool) -> Result<()>;
}

impl Runnable for Commands {
    fn run(self, use_color: bool) -> Result<()> {
        let cmd_name = format!("{:?}", self);
        debug!(event = "command_args", args = %cmd_name);
        let cfg = resxsync_config::load_config().unwrap_or_default();

        let result = match self {
            Commands::SyncTable {
                source,
                target,
                table,
                sheet,
                assume,
                dry_run,
                backup,
                format,
            } => commands::sync::run_sync_table(
                &cfg,
                commands::sync::TableArgs {
                    common: commands::sync::CommonArgs {
                        source,
                        target,
                        assume: assume.map(Into::into),
                        dry_run,
                        backup,
                        format,
                    },
                    table,
                    sheet,
                },
                use_color,
            ),
            Commands::SyncOnline {
                source,
                target,
                from,
                to,
                provider,
                assume,
                dry_run,
                backup,
                format,
            } => commands::sync::run_sync_online(
                &cfg,
                commands::sync::OnlineArgs {
                    common: commands::sync::CommonArgs {
                        source,
                        target,
                        assume: assume.map(Into::into),
                        dry_run,
                        backup,
                        format,
                    },
                    from,
                    to,
                    provider: provider.map(Into::into),
                },
                use_color,
            ),
            Commands::Export {
                source,
                target,
                out,
                sheet,
                include_missing,
                format,
            } => commands::export::run_export(&cfg, source, target, out, sheet, include_missing, format),
            Commands::Init {
                source,
                target,
                overwrite,
                dry_run,
                format,
            } => commands::init::run_init(source, target, overwrite, dry_run, format),
            Commands::Lookup { source, value, format } => {
                commands::lookup::run_lookup(source, value, format, use_color)
            }
            Commands::Languages { format } => commands::languages::run_languages(format),
            Commands::Schema { out_dir } => commands::schema::run_schema(out_dir),
        };

        match &result {
            Ok(_) => info!(event = "command_finished", command = %cmd_name),
            Err(e) => error!(event = "command_failed", command = %cmd_name, error = ?e),
        }

        result
    }
}

fn init_tracing(quiet: bool) -> tracing_appender::non_blocking::WorkerGuard {
    let file_appender = rolling::daily("logs", "resxsync.log");
    let (file_writer, guard) = tracing_appender::non_blocking(file_appender);

    let default_level = if quiet { "warn" } else { "info" };
    let console_layer = fmt::layer()
        .with_target(false)
        .with_writer(std::io::stderr)
        .with_ansi(std::io::stderr().is_terminal())
        .with_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        );

    let file_layer = fmt::layer()
        .with_ansi(false)
        .with_target(true)
        .with_writer(file_writer)
        .with_filter(EnvFilter::new("debug"));

    tracing_subscriber::registry()
        .with(console_layer)
        .with(file_layer)
        .init();
    guard
}

fn main() -> Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();
    ui::set_quiet(cli.quiet);
    let _guard = init_tracing(cli.quiet);

    let use_color = !cli.no_color
        && std::io::stdout().is_terminal()
        && std::env::var_os("NO_COLOR").is_none();

    cli.cmd.run(use_color)
}
