//! CLI command definitions, routing, and tracing setup.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use color_eyre::eyre::Result;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;

use edgepick_core::pipeline::{ProgressReporter, RunSummary, sync_snapshot};
use edgepick_scraper::HttpTableFetcher;
use edgepick_shared::{AppConfig, RunConfig, init_config, load_config, load_config_from};

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// edgepick — keep a carrier-grouped Cloudflare endpoint snapshot fresh.
#[derive(Parser)]
#[command(
    name = "edgepick",
    version,
    about = "Fetch, merge, and snapshot carrier-grouped Cloudflare candidate IPs.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

/// Log output format.
#[derive(Clone, Debug, clap::ValueEnum)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

/// Top-level CLI subcommands.
#[derive(Subcommand)]
pub(crate) enum Command {
    /// Fetch both sources and commit a fresh snapshot.
    Sync {
        /// Snapshot output path (overrides config).
        #[arg(short, long)]
        out: Option<String>,

        /// Keep at most N endpoints per carrier, 0 = unlimited (overrides config).
        #[arg(long)]
        top: Option<usize>,

        /// Minimum merged total required to commit (overrides config).
        #[arg(long)]
        min_total: Option<usize>,

        /// Load config from a specific file instead of ~/.edgepick/edgepick.toml.
        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// Configuration management.
    Config {
        /// Config subcommand.
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Config subcommands.
#[derive(Subcommand)]
pub(crate) enum ConfigAction {
    /// Initialize config file with defaults.
    Init,
    /// Show resolved configuration.
    Show,
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

/// Initialize tracing based on CLI flags.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match cli.verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => {
            fmt()
                .with_env_filter(env_filter)
                .with_target(false)
                .init();
        }
        LogFormat::Json => {
            fmt()
                .json()
                .with_env_filter(env_filter)
                .init();
        }
    }
}

// ---------------------------------------------------------------------------
// Command dispatch
// ---------------------------------------------------------------------------

/// Run the CLI command.
pub(crate) async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Sync {
            out,
            top,
            min_total,
            config,
        } => cmd_sync(out.as_deref(), top, min_total, config.as_deref()).await,
        Command::Config { action } => match action {
            ConfigAction::Init => cmd_config_init().await,
            ConfigAction::Show => cmd_config_show().await,
        },
    }
}

// ---------------------------------------------------------------------------
// sync
// ---------------------------------------------------------------------------

async fn cmd_sync(
    out: Option<&str>,
    top: Option<usize>,
    min_total: Option<usize>,
    config_path: Option<&std::path::Path>,
) -> Result<()> {
    let config = match config_path {
        Some(path) => load_config_from(path)?,
        None => load_config()?,
    };

    // CLI flags override config file values.
    let mut run_config = RunConfig::from(&config);
    if let Some(path) = out {
        run_config.output_path = PathBuf::from(path);
    }
    if let Some(top) = top {
        run_config.top_n_per_carrier = top;
    }
    if let Some(min) = min_total {
        run_config.min_total_ips = min;
    }
    run_config.validate()?;

    info!(
        out = %run_config.output_path.display(),
        top_n = run_config.top_n_per_carrier,
        min_total = run_config.min_total_ips,
        "starting sync"
    );

    let fetcher = HttpTableFetcher::new()?;
    let reporter = CliProgress::new();
    let summary = sync_snapshot(&run_config, &fetcher, &reporter).await?;

    // Print summary
    println!();
    println!("  Snapshot committed!");
    for (carrier, count) in &summary.counts {
        println!("  {:<9}{count}", format!("{carrier}:"));
    }
    println!("  Total:   {}", summary.total);
    println!("  Sources: {} ok, {} failed", summary.sources_ok, summary.sources_failed);
    println!("  Changed: {}", if summary.changed { "yes" } else { "no" });
    println!("  Path:    {}", summary.snapshot_path.display());
    println!("  Time:    {:.1}s", summary.elapsed.as_secs_f64());
    println!();

    Ok(())
}

// ---------------------------------------------------------------------------
// CLI progress reporter
// ---------------------------------------------------------------------------

/// CLI progress reporter using an indicatif spinner.
struct CliProgress {
    spinner: ProgressBar,
}

impl CliProgress {
    fn new() -> Self {
        let spinner = ProgressBar::new_spinner();
        spinner.set_style(
            ProgressStyle::with_template("{spinner:.cyan} {msg}")
                .unwrap()
                .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]),
        );
        spinner.enable_steady_tick(std::time::Duration::from_millis(80));
        Self { spinner }
    }
}

impl ProgressReporter for CliProgress {
    fn phase(&self, name: &str) {
        self.spinner.set_message(name.to_string());
    }

    fn source_succeeded(&self, name: &str, endpoints: usize) {
        self.spinner
            .set_message(format!("{name}: {endpoints} endpoints"));
    }

    fn source_failed(&self, name: &str, error: &str) {
        self.spinner.set_message(format!("{name} failed: {error}"));
    }

    fn done(&self, _summary: &RunSummary) {
        self.spinner.finish_and_clear();
    }
}

// ---------------------------------------------------------------------------
// config
// ---------------------------------------------------------------------------

async fn cmd_config_init() -> Result<()> {
    let path = init_config()?;
    println!("Config initialized at: {}", path.display());
    Ok(())
}

async fn cmd_config_show() -> Result<()> {
    let config: AppConfig = load_config()?;
    let toml_str = toml::to_string_pretty(&config)?;
    println!("{toml_str}");
    Ok(())
}
