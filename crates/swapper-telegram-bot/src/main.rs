mod cli;
mod logging;

use anyhow::Result;
use clap::Parser;
use cli::Cli;
use dotenvy::dotenv;
use logging::{init_logging, RedactionPatterns};
use std::path::Path;
use std::process::ExitCode;
use std::sync::Arc;
use swapper_core::config::{SwapperConfig, DEFAULT_CONFIG};
use swapper_core::{SetupError, SqliteStore};
use swapper_runtime::Swapper;
use swapper_transport_telegram::TelegramTransport;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

#[tokio::main]
async fn main() -> ExitCode {
    // Load .env file
    dotenv().ok();

    let cli = Cli::parse();
    if cli.dump {
        print!("{DEFAULT_CONFIG}");
        return ExitCode::SUCCESS;
    }
    let Some(path) = cli.file else {
        return ExitCode::from(2);
    };

    let config = match load_config(&path) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load configuration: {e}");
            return ExitCode::FAILURE;
        }
    };

    let patterns = match RedactionPatterns::new() {
        Ok(patterns) => Arc::new(patterns),
        Err(e) => {
            eprintln!("Failed to compile regex patterns: {e}");
            return ExitCode::FAILURE;
        }
    };
    if let Err(e) = init_logging(&patterns, &config.log) {
        eprintln!("Failed to open log file: {e}");
        return ExitCode::FAILURE;
    }

    info!("Starting Sticker Swapper...");
    match run(config, cli.clear_all).await {
        Ok(()) => {
            info!("Sticker Swapper stopped");
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("Sticker Swapper failed: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn load_config(path: &Path) -> Result<SwapperConfig, SetupError> {
    let config = SwapperConfig::load(path)?;
    config.check()?;
    Ok(config)
}

async fn run(config: SwapperConfig, clear: bool) -> Result<()> {
    let store = SqliteStore::open(
        Path::new(&config.database.path),
        config.database.busy_timeout(),
        clear,
    )
    .map_err(SetupError::from)?;

    let mut swapper = Swapper::new(Arc::new(store));
    for (index, token) in config.telegram_key.tokens().into_iter().enumerate() {
        let transport =
            TelegramTransport::login(index, token)
                .await
                .map_err(|e| SetupError::Login {
                    index,
                    reason: e.to_string(),
                })?;
        swapper.add_account(Arc::new(transport));
    }
    info!(accounts = swapper.accounts(), "Configuration loaded successfully.");

    let cancel = CancellationToken::new();
    tokio::spawn(cancel_on_signal(cancel.clone()));
    swapper.run(cancel).await
}

/// Cancel `token` on Ctrl+C or SIGTERM.
async fn cancel_on_signal(token: CancellationToken) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("Ctrl+C handler unavailable: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                warn!("SIGTERM handler unavailable: {e}");
                std::future::pending::<()>().await;
            }
        }
    };
    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => info!("Received Ctrl+C, shutting down"),
        () = terminate => info!("Received SIGTERM, shutting down"),
    }
    token.cancel();
}
