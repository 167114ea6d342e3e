//! CLI command definitions, routing, and tracing setup.

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use color_eyre::eyre::{Result, eyre};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{info, warn};

use chatblog_core::index::{build_index, write_index};
use chatblog_core::pipeline::{GenerateConfig, ProgressReporter, RunReport, generate};
use chatblog_core::polish::AzureOpenAiPolisher;
use chatblog_shared::{
    AppConfig, init_config, load_config, load_config_from, resolve_discord_credentials,
    resolve_polish_credentials,
};
use chatblog_source::{DiscordSource, JsonFileSource};

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// chatblog: turn chat conversations into blog posts.
#[derive(Parser)]
#[command(
    name = "chatblog",
    version,
    about = "Group Discord channel messages into conversations and publish them as Markdown blog posts.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Config file (defaults to ~/.chatblog/chatblog.toml).
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

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
    /// Fetch messages and write one post per conversation.
    Generate {
        /// Read messages from a JSON batch file instead of Discord.
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Output directory for posts (defaults to the configured content dir).
        #[arg(short, long)]
        out: Option<PathBuf>,

        /// Skip AI polishing even when credentials are present.
        #[arg(long)]
        no_polish: bool,

        /// Rebuild the post index after the run.
        #[arg(long)]
        index: bool,
    },

    /// Rebuild the post index from the content directory.
    Index {
        /// Content directory (defaults to the configured content dir).
        #[arg(short, long)]
        out: Option<PathBuf>,
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
        0 => "chatblog=info",
        1 => "chatblog=debug",
        _ => "chatblog=trace",
    };

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => {
            fmt().with_env_filter(env_filter).with_target(false).init();
        }
        LogFormat::Json => {
            fmt().json().with_env_filter(env_filter).init();
        }
    }
}

// ---------------------------------------------------------------------------
// Command dispatch
// ---------------------------------------------------------------------------

/// Run the CLI command.
pub(crate) async fn run(cli: Cli) -> Result<()> {
    let config_path = cli.config.as_deref();
    match cli.command {
        Command::Generate {
            input,
            out,
            no_polish,
            index,
        } => cmd_generate(config_path, input.as_deref(), out, no_polish, index).await,
        Command::Index { out } => cmd_index(config_path, out),
        Command::Config { action } => match action {
            ConfigAction::Init => cmd_config_init(),
            ConfigAction::Show => cmd_config_show(config_path),
        },
    }
}

fn resolve_config(path: Option<&Path>) -> Result<AppConfig> {
    let config = match path {
        Some(p) => load_config_from(p)?,
        None => load_config()?,
    };
    Ok(config)
}

fn content_dir(config: &AppConfig, out: Option<PathBuf>) -> PathBuf {
    out.unwrap_or_else(|| PathBuf::from(&config.output.content_dir))
}

// ---------------------------------------------------------------------------
// Command handlers
// ---------------------------------------------------------------------------

async fn cmd_generate(
    config_path: Option<&Path>,
    input: Option<&Path>,
    out: Option<PathBuf>,
    no_polish: bool,
    rebuild_index: bool,
) -> Result<()> {
    let config = resolve_config(config_path)?;
    let generate_config = GenerateConfig {
        content_dir: content_dir(&config, out),
    };

    let polisher = if no_polish {
        None
    } else {
        match resolve_polish_credentials(&config, |key| std::env::var(key).ok()) {
            Some(credentials) => Some(AzureOpenAiPolisher::new(credentials, &config.polish)?),
            None => {
                info!("Azure OpenAI credentials not set, AI polishing disabled");
                None
            }
        }
    };

    let reporter = CliProgress::new();

    let report = match input {
        Some(path) => {
            if !path.is_file() {
                return Err(eyre!("input file '{}' does not exist", path.display()));
            }
            info!(input = %path.display(), "reading messages from file");
            let source = JsonFileSource::new(path);
            generate(&generate_config, &source, &polisher, &reporter).await?
        }
        None => {
            let credentials =
                resolve_discord_credentials(&config, |key| std::env::var(key).ok())?;
            info!(channel = %credentials.channel_id, "fetching messages from Discord");
            let source = DiscordSource::new(
                &config.discord.api_base,
                credentials,
                config.discord.fetch_limit,
            )?;
            generate(&generate_config, &source, &polisher, &reporter).await?
        }
    };

    print_report(&report, &generate_config.content_dir);

    if rebuild_index {
        rebuild(&config, &generate_config.content_dir)?;
    }

    Ok(())
}

fn cmd_index(config_path: Option<&Path>, out: Option<PathBuf>) -> Result<()> {
    let config = resolve_config(config_path)?;
    let dir = content_dir(&config, out);
    rebuild(&config, &dir)
}

fn rebuild(config: &AppConfig, dir: &Path) -> Result<()> {
    let index = build_index(dir, &config.output.path_prefix)?;
    let path = write_index(dir, &config.output.index_file, &index)?;
    println!("  Index:   {} posts -> {}", index.total, path.display());
    Ok(())
}

fn cmd_config_init() -> Result<()> {
    let path = init_config()?;
    println!("Config initialized at: {}", path.display());
    Ok(())
}

fn cmd_config_show(config_path: Option<&Path>) -> Result<()> {
    let config = resolve_config(config_path)?;
    let toml_str = toml::to_string_pretty(&config)?;
    println!("{toml_str}");
    Ok(())
}

fn print_report(report: &RunReport, dir: &Path) {
    println!();
    println!("  Run:           {}", report.run_id);
    println!("  Messages:      {}", report.messages_fetched);
    println!("  Conversations: {}", report.conversations);
    println!("  Created:       {}", report.created);
    println!("  Updated:       {}", report.updated);
    println!("  Skipped:       {}", report.skipped);
    if report.failed > 0 {
        warn!(failed = report.failed, "some conversations could not be written");
        println!("  Failed:        {}", report.failed);
    }
    println!("  Output:        {}", dir.display());
    println!("  Time:          {:.1}s", report.elapsed.as_secs_f64());
    println!();

    if report.conversations == 0 && report.messages_fetched > 0 {
        println!("  No conversation had at least 3 messages within 30 minutes of each other.");
        println!();
    }
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
        let style = ProgressStyle::with_template("{spinner:.cyan} {msg}")
            .map(|s| s.tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]))
            .unwrap_or_else(|_| ProgressStyle::default_spinner());
        spinner.set_style(style);
        spinner.enable_steady_tick(std::time::Duration::from_millis(80));
        Self { spinner }
    }
}

impl Drop for CliProgress {
    fn drop(&mut self) {
        if !self.spinner.is_finished() {
            self.spinner.finish_and_clear();
        }
    }
}

impl ProgressReporter for CliProgress {
    fn phase(&self, name: &str) {
        self.spinner.set_message(name.to_string());
    }

    fn conversation_done(&self, current: usize, total: usize) {
        self.spinner
            .set_message(format!("Writing posts [{current}/{total}]"));
    }

    fn done(&self, _report: &RunReport) {
        self.spinner.finish_and_clear();
    }
}
