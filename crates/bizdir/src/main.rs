//! bizdir - local business directory API server

use anyhow::{Context, Result};
use chrono::Duration;
use clap::Parser;
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

mod config;

use bizdir_api::{AppState, create_router};
use bizdir_auth::TokenCodec;
use bizdir_db::{Database, NewUser, UserRole};

use crate::config::{BootstrapAdminConfig, Config};

/// bizdir - local business directory API server
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Configuration file path
    #[arg(short, long, default_value = "config/default.toml")]
    config: String,

    /// Bind address
    #[arg(long, env = "BIZDIR_BIND")]
    bind: Option<String>,

    /// Port
    #[arg(short, long, env = "BIZDIR_PORT")]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Missing secrets and other bad settings stop the process here
    let config = Config::load(&args.config)?;
    config.validate()?;

    init_logging(&config.logging.level, &config.logging.format);

    info!("Starting bizdir v{}", env!("CARGO_PKG_VERSION"));

    let tokens = Arc::new(
        TokenCodec::new(
            &config.auth.jwt_secret,
            Duration::hours(config.auth.token_validity_hours),
        )
        .context("Invalid token settings")?,
    );

    if let Some(dir) = config.database.data_dir() {
        tokio::fs::create_dir_all(&dir)
            .await
            .with_context(|| format!("Failed to create data directory {}", dir.display()))?;
    }
    let db = Database::new(&config.database.url).await?;

    if let Some(admin) = &config.auth.bootstrap_admin {
        bootstrap_admin(&db, admin).await?;
    }

    let metrics_handle = if config.metrics.enabled {
        Some(Arc::new(
            PrometheusBuilder::new()
                .install_recorder()
                .context("Failed to install metrics recorder")?,
        ))
    } else {
        None
    };

    let state = AppState::new(db, tokens);

    let app = create_router(state, metrics_handle).layer(TraceLayer::new_for_http());

    let bind_addr = args.bind.unwrap_or(config.server.bind_address);
    let port = args.port.unwrap_or(config.server.port);
    let addr: SocketAddr = format!("{}:{}", bind_addr, port).parse()?;

    info!("Listening on {}", addr);
    info!(
        "Tokens are valid for {} hours",
        config.auth.token_validity_hours
    );

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

/// Create the configured admin account if no users exist yet
async fn bootstrap_admin(db: &Database, admin: &BootstrapAdminConfig) -> Result<()> {
    if db.has_users().await? {
        return Ok(());
    }

    info!("Creating bootstrap admin user {}", admin.email);
    let password_hash = bizdir_auth::hash_password(&admin.password)?;
    db.insert_user(NewUser {
        email: admin.email.clone(),
        name: admin.name.clone(),
        password_hash,
        role: UserRole::Admin,
    })
    .await?;

    Ok(())
}

/// Initialize logging
fn init_logging(level: &str, format: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let registry = tracing_subscriber::registry().with(filter);

    if format == "json" {
        registry.with(fmt::layer().json()).init();
    } else {
        registry.with(fmt::layer()).init();
    }
}

/// Wait for shutdown signal
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {}", e);
        return;
    }
    info!("Shutdown signal received");
}
