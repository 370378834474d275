mod config;
mod telemetry;

use clap::{Args, Parser};
use config::{Config, ConfigError};
use keyword_lookup::api::{self, ApiError, KeywordListResponse};
use keyword_lookup::config::Config as LookupConfig;
use keyword_lookup::{KeywordLookup, LookupError};
use shared::admin_service::AdminService;
use shared::http::run_http_service;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::signal;

#[derive(Parser)]
#[command(version, about = "Keyword volume lookups with upstream fallbacks")]
enum CliCommand {
    /// Serve the keyword API and the admin endpoints
    Serve(ConfigArgs),
    /// Look up one keyword and print the JSON response
    Lookup {
        #[command(flatten)]
        config: ConfigArgs,
        keyword: String,
    },
}

#[derive(Args)]
struct ConfigArgs {
    /// YAML config file. Built-in defaults are used when omitted.
    #[arg(long, short)]
    config_file: Option<PathBuf>,
}

#[derive(thiserror::Error, Debug)]
enum CliError {
    #[error("could not build upstream clients: {0}")]
    Client(String),
    #[error("keyword API error: {0}")]
    Api(#[from] ApiError),
    #[error("admin listener error: {0}")]
    Admin(#[from] std::io::Error),
    #[error("lookup failed: {0}")]
    Lookup(#[from] LookupError),
    #[error("could not encode response: {0}")]
    Encode(#[from] serde_json::Error),
}

fn main() -> ExitCode {
    let cli = CliCommand::parse();

    let config_file = match &cli {
        CliCommand::Serve(args) => args.config_file.as_deref(),
        CliCommand::Lookup { config, .. } => config.config_file.as_deref(),
    };

    let config = match Config::load(config_file) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load config: {e}");
            return ExitCode::FAILURE;
        }
    };

    let _sentry = telemetry::init_logging(config.common.logging.as_ref());

    if let Some(metrics_config) = &config.common.metrics {
        if let Err(e) = telemetry::init_metrics(metrics_config) {
            tracing::error!(error = %e, "metrics disabled");
        }
    }

    let runtime = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            tracing::error!(error = %e, "could not start the tokio runtime");
            return ExitCode::FAILURE;
        }
    };

    let result = match cli {
        CliCommand::Serve(_) => runtime.block_on(serve(config.keyword_lookup)),
        CliCommand::Lookup { keyword, .. } => {
            runtime.block_on(lookup_once(config.keyword_lookup, &keyword))
        }
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "exiting");
            ExitCode::FAILURE
        }
    }
}

fn build_lookup(config: &LookupConfig) -> Result<KeywordLookup, CliError> {
    let lookup = KeywordLookup::from_config(config)
        .map_err(|e| CliError::Client(e.to_string()))?;
    tracing::info!(tiers = ?lookup.sources(), "keyword lookup chain ready");
    Ok(lookup)
}

async fn serve(config: LookupConfig) -> Result<(), CliError> {
    let lookup = build_lookup(&config)?;

    let ready = Arc::new(AtomicBool::new(false));
    let ready_check = ready.clone();
    let admin_service: AdminService<_, std::io::Error> =
        AdminService::new(move || ready_check.load(Ordering::Relaxed));

    let admin_task = run_http_service(
        &config.admin_listener.host,
        config.admin_listener.port,
        admin_service,
    );
    let api_task = api::serve(&config.listener, lookup, ready, shutdown_signal());

    // The admin listener only stops on error, the API stops on shutdown.
    tokio::select! {
        result = api_task => result?,
        result = admin_task => result?,
    }

    tracing::info!("keyword proxy stopped");
    Ok(())
}

async fn lookup_once(config: LookupConfig, keyword: &str) -> Result<(), CliError> {
    let lookup = build_lookup(&config)?;
    let result = lookup.lookup(keyword).await?;

    let response = KeywordListResponse::from(result);
    println!("{}", serde_json::to_string_pretty(&response)?);
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        match signal::ctrl_c().await {
            Ok(()) => tracing::info!("Received Ctrl+C, shutting down"),
            Err(e) => {
                tracing::error!(error = %e, "failed to install Ctrl+C handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
                tracing::info!("Received terminate signal, shutting down");
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to install signal handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
