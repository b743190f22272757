//! # Commit-Keeper CLI
//!
//! Command-line interface for running the commit signature skill against
//! event files.
//!
//! This binary provides commands for:
//! - Processing a "commit pushed" event end-to-end
//! - Decoding an event to check it is complete
//! - Validating and displaying configuration

use clap::{Parser, Subcommand, ValueEnum};
use commit_keeper_core::{
    CommitEvent, CommitSignatureHandler, EntitySink, EventContext, EventError, HandlerError,
    JsonLinesSink, SinkError,
};
use commit_keeper_github::{ApiError, GitHubClient};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::AsyncReadExt;
use tracing::{info, warn};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

pub mod config;

pub use config::{
    load_configuration, ConfigError, GitHubConfig, KeeperConfig, LogFormat, LoggingConfig,
    SinkConfig, SinkKind,
};

/// Event path that reads the event from standard input
pub const STDIN_PATH: &str = "-";

// ============================================================================
// CLI Definition
// ============================================================================

/// Commit-Keeper command-line interface
#[derive(Parser, Debug)]
#[command(name = "commit-keeper")]
#[command(about = "Record commit signature verification in the knowledge store")]
#[command(version)]
pub struct Cli {
    /// Configuration file path
    #[arg(short, long, env = "COMMIT_KEEPER_CONFIG")]
    pub config: Option<PathBuf>,

    /// Log level override (trace, debug, info, warn, error)
    #[arg(short, long)]
    pub log_level: Option<String>,

    /// Enable JSON log output
    #[arg(long)]
    pub json_logs: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Process one commit event and submit its entities to the sink
    Process {
        /// Event file, or '-' for standard input
        #[arg(short, long)]
        event: PathBuf,

        /// Abandon processing once this many seconds have elapsed
        #[arg(short, long)]
        deadline_seconds: Option<u64>,

        /// Write entity batches to this file instead of the configured sink
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Decode and normalize a commit event without processing it
    Decode {
        /// Event file, or '-' for standard input
        #[arg(short, long)]
        event: PathBuf,

        /// Output format
        #[arg(short, long, value_enum, default_value = "json")]
        format: OutputFormat,
    },

    /// Validate configuration
    Config {
        /// Print the resolved configuration as YAML
        #[arg(short, long)]
        show: bool,
    },
}

/// Output formats for rendered results
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

// ============================================================================
// Error Types
// ============================================================================

/// CLI error types
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigError),

    #[error("Failed to read event from {path}: {source}")]
    EventRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid event: {0}")]
    InvalidEvent(#[from] EventError),

    #[error("Event processing failed: {0}")]
    Handler(#[from] HandlerError),

    #[error("Sink setup failed: {0}")]
    Sink(#[from] SinkError),

    #[error("GitHub client setup failed: {0}")]
    Client(#[from] ApiError),

    #[error("Output error: {message}")]
    Output { message: String },

    #[error("Logging setup failed: {message}")]
    Logging { message: String },
}

impl CliError {
    /// Process exit code for this error
    ///
    /// Transient processing failures exit with 75 (`EX_TEMPFAIL`) so a
    /// wrapping dispatcher can re-deliver the event.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Configuration(_) => 1,
            Self::EventRead { .. } => 2,
            Self::InvalidEvent(_) => 3,
            Self::Handler(e) if e.is_transient() => 75,
            Self::Handler(_) => 4,
            Self::Sink(_) => 5,
            Self::Client(_) => 6,
            Self::Output { .. } => 7,
            Self::Logging { .. } => 8,
        }
    }
}

// ============================================================================
// Entry Points
// ============================================================================

/// Parse arguments and run the CLI
pub async fn run_cli() -> Result<(), CliError> {
    let cli = Cli::parse();
    let config = load_configuration(cli.config.as_deref())?;

    initialize_logging(&cli, &config.logging)?;

    run(cli, config).await
}

/// Run a parsed command against a loaded configuration
pub async fn run(cli: Cli, config: KeeperConfig) -> Result<(), CliError> {
    match cli.command {
        Commands::Process {
            event,
            deadline_seconds,
            output,
        } => process_command(&config, &event, deadline_seconds, output).await,
        Commands::Decode { event, format } => decode_command(&event, format).await,
        Commands::Config { show } => config_command(&config, show),
    }
}

/// Initialize the global tracing subscriber
///
/// `RUST_LOG` takes precedence; otherwise the level comes from `--log-level`
/// or the logging configuration. Logs are written to standard error so the
/// standard-output sink stays machine-readable.
pub fn initialize_logging(cli: &Cli, logging: &LoggingConfig) -> Result<(), CliError> {
    let level = cli.log_level.as_deref().unwrap_or(&logging.level);
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_log_filter(level)));

    let registry = tracing_subscriber::registry().with(filter);
    let result = if cli.json_logs || logging.format == LogFormat::Json {
        registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .try_init()
    } else {
        registry
            .with(fmt::layer().with_writer(std::io::stderr))
            .try_init()
    };

    result.map_err(|e| CliError::Logging {
        message: e.to_string(),
    })
}

/// Filter directive covering every `commit_keeper*` target
pub fn default_log_filter(level: &str) -> String {
    format!("commit_keeper={}", level.to_ascii_lowercase())
}

// ============================================================================
// Commands
// ============================================================================

async fn process_command(
    config: &KeeperConfig,
    event_path: &Path,
    deadline_seconds: Option<u64>,
    output: Option<PathBuf>,
) -> Result<(), CliError> {
    let body = read_event(event_path).await?;

    let sink = open_sink(&config.sink, output).await?;
    let client = GitHubClient::builder()
        .config(config.github.client_config())
        .build()?;

    let handler = CommitSignatureHandler::new(sink, Arc::new(client));

    let mut ctx = EventContext::new();
    if let Some(seconds) = deadline_seconds {
        ctx = ctx.with_timeout(Duration::from_secs(seconds));
    }

    info!(
        correlation_id = %ctx.correlation_id,
        event = %event_path.display(),
        "Processing commit event"
    );

    match handler.handle(&ctx, &body).await {
        Ok(outcome) => {
            info!(
                correlation_id = %outcome.correlation_id,
                repository = %outcome.repository,
                sha = %outcome.sha,
                outcome = ?outcome.outcome,
                entities = outcome.entities_submitted,
                "Commit event processed"
            );
            Ok(())
        }
        Err(e) => {
            warn!(
                correlation_id = %ctx.correlation_id,
                error = %e,
                category = ?e.error_category(),
                transient = e.is_transient(),
                "Commit event processing failed"
            );
            Err(e.into())
        }
    }
}

async fn decode_command(event_path: &Path, format: OutputFormat) -> Result<(), CliError> {
    let body = read_event(event_path).await?;
    let event = CommitEvent::decode(&body)?;

    println!("{}", render_event(&event, format)?);
    Ok(())
}

fn config_command(config: &KeeperConfig, show: bool) -> Result<(), CliError> {
    if show {
        let yaml = serde_yaml::to_string(config).map_err(|e| CliError::Output {
            message: e.to_string(),
        })?;
        print!("{}", yaml);
    } else {
        println!("Configuration is valid");
    }
    Ok(())
}

// ============================================================================
// Helpers
// ============================================================================

/// Render a normalized event; the installation credential is always redacted
pub fn render_event(event: &CommitEvent, format: OutputFormat) -> Result<String, CliError> {
    match format {
        OutputFormat::Json => {
            serde_json::to_string_pretty(event).map_err(|e| CliError::Output {
                message: e.to_string(),
            })
        }
        OutputFormat::Text => {
            let mut lines = vec![
                format!("repository:     {}", event.repo.full_name()),
                format!("provider:       {}", event.repo.provider_url),
                format!("source id:      {}", event.source_id),
                format!("sha:            {}", event.sha),
            ];
            if let Some(branch) = &event.default_branch {
                lines.push(format!("default branch: {}", branch));
            }
            lines.push(format!("credential:     {}", event.credential));
            Ok(lines.join("\n"))
        }
    }
}

async fn read_event(path: &Path) -> Result<Vec<u8>, CliError> {
    let to_error = |source| CliError::EventRead {
        path: path.to_path_buf(),
        source,
    };

    if path.as_os_str() == STDIN_PATH {
        let mut body = Vec::new();
        tokio::io::stdin()
            .read_to_end(&mut body)
            .await
            .map_err(to_error)?;
        Ok(body)
    } else {
        tokio::fs::read(path).await.map_err(to_error)
    }
}

/// Open the entity sink; an explicit output path overrides configuration
pub async fn open_sink(
    sink: &SinkConfig,
    output: Option<PathBuf>,
) -> Result<Arc<dyn EntitySink>, CliError> {
    let path = output.or_else(|| match sink.kind {
        SinkKind::File => sink.path.clone(),
        SinkKind::Stdout => None,
    });

    let sink: Arc<dyn EntitySink> = match path {
        Some(path) => Arc::new(JsonLinesSink::open(path).await?),
        None => Arc::new(JsonLinesSink::stdout()),
    };
    Ok(sink)
}

#[cfg(test)]
#[path = "lib_tests.rs"]
mod tests;
