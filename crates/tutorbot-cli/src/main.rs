use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use tutorbot_bot::{BotRunner, CommandHandler, RequestDefaults, TelegramApi};
use tutorbot_core::config::Config;
use tutorbot_provider::{
    build_request, extract_reply_text, CompletionClient, CompletionProvider,
    MockCompletionProvider,
};
use tutorbot_telemetry::{LogFormat, LogLevel, TelemetryConfig, TelemetrySystem};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
#[command(
    after_help = "ENVIRONMENT:\n  GROQ_API_KEY      Completion API credential (required unless --offline)\n  TELEGRAM_TOKEN    Bot token (required for `run`)\n\nA .env file in the working directory is loaded automatically."
)]
struct Cli {
    /// Configuration file path
    #[arg(long, global = true, help = "Path to configuration file")]
    config: Option<PathBuf>,

    /// Shorthand for --log-level debug
    #[arg(short, long, global = true, help = "Enable verbose logging")]
    verbose: bool,

    #[arg(long, global = true, help = "Set log level (trace, debug, info, warn, error)")]
    log_level: Option<String>,

    #[arg(long, global = true, help = "Set log output format (json, pretty, compact)")]
    log_format: Option<String>,

    #[arg(long, global = true, help = "Enable logging to files")]
    file_logging: bool,

    #[arg(
        long,
        global = true,
        conflicts_with = "file_logging",
        help = "Disable logging to files"
    )]
    no_file_logging: bool,

    #[arg(long, global = true, help = "Directory for log files")]
    log_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug, PartialEq)]
enum Command {
    /// Poll Telegram and answer commands (default)
    Run {
        /// Answer from the built-in offline provider instead of the completion API
        #[arg(long)]
        offline: bool,
    },
    /// Send one question to the completion API and print the reply
    Ask {
        #[arg(long)]
        offline: bool,

        #[arg(required = true, trailing_var_arg = true)]
        question: Vec<String>,
    },
}

fn create_telemetry_config(cli: &Cli) -> TelemetryConfig {
    let mut config = TelemetryConfig::default();
    config.load_env_overrides();

    if let Some(level) = &cli.log_level {
        match level.parse::<LogLevel>() {
            Ok(level) => config.logging.level = level,
            Err(e) => eprintln!("{}, using default", e),
        }
    } else if cli.verbose {
        config.logging.level = LogLevel::Debug;
    }

    if let Some(format) = &cli.log_format {
        match format.parse::<LogFormat>() {
            Ok(format) => config.logging.format = format,
            Err(e) => eprintln!("{}, using default", e),
        }
    }

    if cli.no_file_logging {
        config.logging.file_enabled = false;
    } else if cli.file_logging {
        config.logging.file_enabled = true;
    }

    if let Some(log_dir) = &cli.log_dir {
        config.logging.log_dir = log_dir.clone();
    }

    config
}

/// Resolve the completion provider once; a missing credential is fatal here.
fn create_provider(config: &Config, offline: bool) -> Result<Arc<dyn CompletionProvider>> {
    if offline {
        warn!("Running with the offline provider; replies are not generated by a model");
        return Ok(Arc::new(MockCompletionProvider::default()));
    }

    config.require_api_key()?;
    let client = CompletionClient::from_provider_config(&config.provider)
        .map_err(tutorbot_core::TutorbotError::from)?;
    info!(endpoint = client.endpoint(), "Completion client ready");
    Ok(Arc::new(client))
}

async fn run_bot(config: &Config, offline: bool) -> Result<()> {
    config.require_telegram_token()?;
    let provider = create_provider(config, offline)?;

    let api = TelegramApi::from_config(&config.bot).map_err(tutorbot_core::TutorbotError::from)?;
    let me = api
        .get_me()
        .await
        .context("Failed to verify TELEGRAM_TOKEN with the Bot API")?;
    info!(bot_id = me.id, username = ?me.username, "Authenticated with Telegram");

    let mut handler = CommandHandler::new(provider, RequestDefaults::from(&config.provider));
    if let Some(username) = me.username {
        handler = handler.with_bot_username(username);
    }

    let shutdown = CancellationToken::new();
    let signal_token = shutdown.clone();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => info!("Bot stopped by user"),
            Err(e) => error!("Failed to listen for Ctrl-C: {}", e),
        }
        signal_token.cancel();
    });

    BotRunner::new(Arc::new(api), handler, config.bot.poll_timeout_seconds)
        .run(shutdown)
        .await?;
    Ok(())
}

async fn ask(config: &Config, offline: bool, question: &str) -> Result<()> {
    let provider = create_provider(config, offline)?;
    let defaults = RequestDefaults::from(&config.provider);
    let request = build_request(question)
        .with_model(defaults.model)
        .with_temperature(defaults.temperature)
        .with_max_tokens(defaults.max_tokens);

    let response = provider.complete(&request).await?;
    println!("{}", extract_reply_text(&response));
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let _telemetry_guard = TelemetrySystem::init(create_telemetry_config(&cli)).map_err(|e| {
        eprintln!("Failed to initialize telemetry system: {}", e);
        anyhow::anyhow!("Telemetry initialization failed: {}", e)
    })?;

    let config = Config::load(cli.config.as_deref()).await.map_err(|e| {
        error!("Failed to load configuration: {}", e);
        anyhow::anyhow!("Failed to load configuration: {}", e)
    })?;

    let outcome = match cli.command.unwrap_or(Command::Run { offline: false }) {
        Command::Run { offline } => run_bot(&config, offline).await,
        Command::Ask { offline, question } => ask(&config, offline, &question.join(" ")).await,
    };

    if let Err(e) = &outcome {
        error!("Error running bot: {:#}", e);
    }
    outcome
}
