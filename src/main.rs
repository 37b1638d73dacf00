use clap::Parser;
use mpox::api::{create_router, AppState};
use mpox::cli::{self, Cli, Commands};
use mpox::config::{AppConfig, LoggingConfig};
use mpox::error::{MpoxError, Result};
use mpox::services::{HealthState, Predictor};
use std::sync::Arc;
use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = AppConfig::load_from(&cli.config)?;

    match cli.command.clone().unwrap_or_default() {
        Commands::Serve { port } => {
            init_logging(&config.logging);
            run_server(config, port).await?;
        }
        Commands::Check => {
            init_logging_simple();
            let predictor = Predictor::load(&config.artifacts)?;
            println!("{}", cli::describe_artifacts(&predictor)?);
        }
        Commands::Predict { symptoms } => {
            init_logging_simple();
            let predictor = Predictor::load(&config.artifacts)?;
            let body = cli::read_request_arg(&symptoms)?;
            let (status, response) =
                cli::predict_once(&predictor, &body, config.server.expose_error_details);
            println!("{}", serde_json::to_string_pretty(&response)?);
            if status != 200 {
                std::process::exit(1);
            }
        }
    }

    Ok(())
}

async fn run_server(config: AppConfig, port_override: Option<u16>) -> Result<()> {
    let mut server = config.server.clone();
    if let Some(port) = port_override {
        server.port = port;
    }
    let addr = server.socket_addr()?;

    // Artifact load failures abort startup before the listener binds.
    let predictor = Arc::new(Predictor::load(&config.artifacts)?);
    let state = AppState::new(predictor, server.expose_error_details);
    let health = Arc::clone(&state.health);
    let app = create_router(state);

    info!("Starting inference server on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(health))
        .await
        .map_err(|e| MpoxError::Internal(format!("Server error: {}", e)))?;

    info!("Server stopped");
    Ok(())
}

fn init_logging(cfg: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("{},tower_http=warn", cfg.level)));

    if cfg.json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_target(true)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .with_thread_ids(false)
            .with_file(false)
            .with_line_number(false)
            .init();
    }
}

fn init_logging_simple() {
    // Minimal logging for one-shot commands
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::WARN)
        .with_writer(std::io::stderr)
        .try_init();
}

async fn shutdown_signal(health: Arc<HealthState>) {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => error!("Failed to install SIGTERM handler: {}", e),
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    health.begin_shutdown();
    info!("Shutdown signal received, draining connections");
}
