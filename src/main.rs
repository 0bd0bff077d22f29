// Resource Exporter - rate-limited REST API to JSON file exporter
// Copyright (c) 2025 Resource Exporter Contributors
// Licensed under the MIT License

use clap::Parser;
use resource_exporter::cli::commands::export::ExportArgs;
use resource_exporter::cli::{Cli, Commands};
use resource_exporter::config::resolve_config;
use resource_exporter::logging::init_logging;
use std::process;
use tokio::sync::watch;

#[tokio::main]
async fn main() {
    // Load environment variables from .env file if present
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    let exit_code = match &cli.command {
        Commands::Export(args) => run_export(&cli, args).await,
        Commands::ValidateConfig(args) => {
            args.execute(cli.config.as_deref(), &cli.settings.overrides())
        }
    };

    process::exit(exit_code);
}

/// Resolves configuration, starts logging and runs the export
async fn run_export(cli: &Cli, args: &ExportArgs) -> i32 {
    let config = match resolve_config(cli.config.as_deref(), &cli.settings.overrides()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {e}");
            return 2; // Configuration error exit code
        }
    };

    let guard = match init_logging(&config.logging) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("Failed to initialize logging: {e}");
            return 5;
        }
    };

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        "Resource Exporter"
    );

    // Create shutdown signal channel for graceful shutdown
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        wait_for_signal().await;
        let _ = shutdown_tx.send(true);
    });

    let exit_code = match args.execute(config, shutdown_rx).await {
        Ok(code) => code,
        Err(e) => {
            tracing::error!(error = %e, "Command execution failed");
            eprintln!("Error: {e}");
            5 // Fatal error exit code
        }
    };

    // Flush buffered log lines before the process exits
    drop(guard);
    exit_code
}

/// Resolves on the first SIGINT or SIGTERM
async fn wait_for_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {
                        tracing::info!("Received SIGINT (Ctrl+C), initiating graceful shutdown...");
                    }
                    _ = sigterm.recv() => {
                        tracing::info!("Received SIGTERM, initiating graceful shutdown...");
                    }
                }
                return;
            }
            Err(e) => {
                tracing::warn!(error = %e, "Failed to install SIGTERM handler, listening for Ctrl+C only");
            }
        }
    }

    match tokio::signal::ctrl_c().await {
        Ok(()) => tracing::info!("Received SIGINT (Ctrl+C), initiating graceful shutdown..."),
        Err(e) => {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    }
}
