//! voice-gateway: HTTP gateway that keeps provider credentials off the client
//!
//! Fetches the OpenAI and LiveKit credentials from Google Cloud Secret
//! Manager at startup and serves:
//! - LiveKit access tokens
//! - OpenAI chat, transcription and speech synthesis

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LogLevel::Trace => write!(f, "trace"),
            LogLevel::Debug => write!(f, "debug"),
            LogLevel::Info => write!(f, "info"),
            LogLevel::Warn => write!(f, "warn"),
            LogLevel::Error => write!(f, "error"),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, ValueEnum)]
enum LogFormat {
    #[default]
    Pretty,
    Json,
}

use voice_gateway::{
    config::AppConfig,
    gateway::{build_http_client, run_server, GatewayState},
    provider::OpenAiClient,
    secrets::{load_credentials, try_load_credentials, GcpSecretManager},
};

#[derive(Parser)]
#[command(name = "voice-gateway")]
#[command(version = "0.1.0")]
#[command(about = "HTTP gateway for LiveKit tokens and OpenAI speech/chat")]
#[command(long_about = "
voice-gateway sits between a voice chat client and its providers:
  - Issues LiveKit access tokens
  - Forwards chat, transcription and speech synthesis to OpenAI
  - Loads every credential from Google Cloud Secret Manager at startup

Example usage:
  voice-gateway run --port 8080
  voice-gateway check-secrets
")]
struct Cli {
    /// Path to config file (defaults to config.yaml when present)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Set logging level (trace, debug, info, warn, error)
    #[arg(long, global = true, value_name = "LEVEL")]
    log_level: Option<LogLevel>,

    /// Log output format
    #[arg(long, global = true, value_enum, default_value_t = LogFormat::Pretty)]
    log_format: LogFormat,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the gateway server (default)
    Run {
        /// Override listen port (takes precedence over PORT)
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Validate configuration and print the effective values
    CheckConfig,

    /// Fetch the secrets and report which ones resolve
    CheckSecrets,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let level_filter = if let Some(level) = cli.log_level {
        level.to_string()
    } else {
        tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"))
            .to_string()
    };

    let subscriber = tracing_subscriber::fmt().with_env_filter(tracing_subscriber::EnvFilter::new(&level_filter));
    match cli.log_format {
        LogFormat::Pretty => subscriber.init(),
        LogFormat::Json => subscriber.json().init(),
    }

    match cli.command.unwrap_or(Commands::Run { port: None }) {
        Commands::Run { port } => {
            run_gateway(cli.config, port).await?;
        }
        Commands::CheckConfig => {
            check_config(cli.config)?;
        }
        Commands::CheckSecrets => {
            check_secrets(cli.config).await?;
        }
    }

    Ok(())
}

/// Load the config file (if any), apply `PORT` and validate
fn load_config(config_path: Option<PathBuf>) -> anyhow::Result<AppConfig> {
    let mut config = AppConfig::load_or_default(config_path.as_deref()).context("Error loading configuration")?;
    config.apply_env_overrides()?;
    config.validate()?;
    Ok(config)
}

/// Run the gateway server
async fn run_gateway(config_path: Option<PathBuf>, port_override: Option<u16>) -> anyhow::Result<()> {
    let mut config = load_config(config_path)?;

    if let Some(port) = port_override {
        config.server.port = port;
    }

    let http_client = build_http_client()?;

    let secret_store = GcpSecretManager::from_config(http_client.clone(), &config.secrets);
    let credentials = load_credentials(&secret_store, &config.secrets).await;

    let provider = Arc::new(OpenAiClient::new(http_client, config.openai.base_url()));

    tracing::info!(
        room = %config.livekit.room,
        chat_model = %config.openai.chat_model,
        upstream = %provider.base_url(),
        "Gateway configured"
    );

    let state = GatewayState::new(config, credentials, provider);
    run_server(state).await.map_err(|e| anyhow::anyhow!("{}", e))?;

    Ok(())
}

/// Validate configuration
fn check_config(config_path: Option<PathBuf>) -> anyhow::Result<()> {
    match load_config(config_path) {
        Ok(config) => {
            println!("✓ Configuration is valid\n");
            println!("Server:");
            println!("  Listen: {}:{}", config.server.host, config.server.port);
            println!("  Max body: {} bytes", config.server.max_body_bytes);
            println!("\nSecrets:");
            println!("  Project: {}", config.secrets.project_id);
            println!("  Version: {}", config.secrets.version);
            println!("  Endpoint: {}", config.secrets.base_url());
            println!(
                "  Names: {}, {}, {}",
                config.secrets.openai_api_key_secret,
                config.secrets.livekit_api_key_secret,
                config.secrets.livekit_api_secret_secret
            );
            println!("\nLiveKit:");
            println!("  Room: {}", config.livekit.room);
            println!("\nOpenAI:");
            println!("  URL: {}", config.openai.base_url());
            println!("  Chat model: {}", config.openai.chat_model);
            println!("  Transcription model: {}", config.openai.transcription_model);
            println!("  Speech model: {} (voice {})", config.openai.speech_model, config.openai.voice);
            println!("  System prompt: {:?}", config.openai.system_prompt);
            Ok(())
        }
        Err(e) => {
            eprintln!("✗ Configuration error: {:#}", e);
            std::process::exit(1);
        }
    }
}

/// Fetch each secret and report whether it resolves; values are never printed
async fn check_secrets(config_path: Option<PathBuf>) -> anyhow::Result<()> {
    let config = load_config(config_path)?;
    let http_client = build_http_client()?;
    let store = GcpSecretManager::from_config(http_client, &config.secrets);

    println!(
        "Checking secrets in project {} (version {})\n",
        config.secrets.project_id, config.secrets.version
    );

    match try_load_credentials(&store, &config.secrets).await {
        Ok(credentials) => {
            println!("✓ All secrets resolved: {:?}", credentials);
            Ok(())
        }
        Err(e) => {
            println!("✗ Failed to load secrets: {}", e);
            std::process::exit(1);
        }
    }
}
