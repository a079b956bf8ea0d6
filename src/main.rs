use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing::{error, info};

use feedwatch::{Config, RelayServer, WatchError, Watcher};

/// Watch an RSS feed and post new statuses to a receiver.
#[derive(Debug, Parser)]
#[command(name = "feedwatch", version, about)]
struct Cli {
    /// Path to the TOML configuration file.
    #[arg(short, long, env = "FEEDWATCH_CONFIG", default_value = "feedwatch.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Poll the feed until interrupted (default).
    Watch,
    /// Run a single cycle and print what happened.
    Check,
    /// Serve the receiver that forwards posts to the chat webhook.
    Relay,
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for Ctrl+C: {}", e);
        std::future::pending::<()>().await;
    }
}

fn load_config(path: &Path) -> Result<Config, WatchError> {
    match Config::load_with_env(path) {
        Ok(config) => Ok(config),
        Err(WatchError::Io(e)) => {
            eprintln!("Failed to load {}: {e}", path.display());
            eprintln!("Using default configuration.");
            let mut config = Config::default();
            config.apply_env_overrides();
            Ok(config)
        }
        Err(e) => Err(e),
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match load_config(&cli.config) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{e}");
            return ExitCode::FAILURE;
        }
    };

    // Initialize logging
    if let Err(e) = feedwatch::logging::init(&config.logging) {
        eprintln!("Failed to initialize logging: {e}");
        // Fall back to console-only logging
        feedwatch::logging::init_console_only(&config.logging.level);
    }

    let result = match cli.command.unwrap_or(Command::Watch) {
        Command::Watch => watch(&config).await,
        Command::Check => check(&config).await,
        Command::Relay => relay(&config).await,
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

async fn watch(config: &Config) -> feedwatch::Result<()> {
    config.validate()?;
    let watcher = Watcher::from_config(config)?;

    info!("Watching {} (Ctrl+C to stop)", config.feed.url);
    watcher.run(shutdown_signal()).await;
    info!("Watcher stopped");
    Ok(())
}

async fn check(config: &Config) -> feedwatch::Result<()> {
    config.validate()?;
    let watcher = Watcher::from_config(config)?;

    let outcome = watcher.run_cycle().await?;
    println!("{outcome:?}");
    Ok(())
}

async fn relay(config: &Config) -> feedwatch::Result<()> {
    config.validate_relay()?;
    RelayServer::new(&config.relay)?
        .run(shutdown_signal())
        .await
}
