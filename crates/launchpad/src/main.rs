mod app;
mod handlers;
mod state;

use anyhow::{Context, Result};
use clap::Parser;
use launchpad_auth::{AuthConfig, AuthState};
use listenfd::ListenFd;
use tokio::{net::TcpListener, signal};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::{app::create_app, state::AppState};

/// Launchpad - starter web app with a hosted auth provider
#[derive(Parser, Debug)]
#[command(name = "launchpad")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Host address to bind the server to
    #[arg(long, short = 'H', default_value = "0.0.0.0", env = "HOST")]
    host: String,

    /// Port to listen on
    #[arg(long, short, default_value = "3000", env = "PORT")]
    port: u16,

    /// Use an in-memory identity provider seeded with a demo account
    #[cfg(feature = "mock-provider")]
    #[arg(long)]
    mock_provider: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = load_config(&cli)?;
    init_tracing(&config);

    tracing::info!(
        env = ?config.env,
        provider = %config.provider_url,
        app_url = %config.app_url,
        "Starting launchpad"
    );

    let auth = build_auth_state(&cli, config).await?;
    let app = create_app(AppState::new(auth));

    // Auto-reload support via listenfd
    let mut listenfd = ListenFd::from_env();
    let listener = match listenfd.take_tcp_listener(0)? {
        // If we are given a tcp listener on listen fd 0, use that one
        Some(listener) => {
            listener.set_nonblocking(true)?;
            TcpListener::from_std(listener)?
        }
        // Otherwise fall back to CLI-specified host:port
        None => {
            let addr = format!("{}:{}", cli.host, cli.port);
            TcpListener::bind(&addr).await?
        }
    };

    tracing::info!("listening on {}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

/// Reads the auth configuration. Missing settings are fatal.
#[cfg_attr(not(feature = "mock-provider"), allow(unused_variables))]
fn load_config(cli: &Cli) -> Result<AuthConfig> {
    #[cfg(feature = "mock-provider")]
    if cli.mock_provider {
        // The mock never calls out, so placeholders stand in for unset values.
        return AuthConfig::from_lookup(|key| {
            std::env::var(key).ok().or_else(|| match key {
                "LAUNCHPAD_AUTH_URL" => Some("http://localhost:54321".to_string()),
                "LAUNCHPAD_AUTH_ANON_KEY" => Some("mock-anon-key".to_string()),
                _ => None,
            })
        })
        .context("Invalid configuration");
    }

    AuthConfig::from_env().context(
        "Invalid configuration: set LAUNCHPAD_AUTH_URL and LAUNCHPAD_AUTH_ANON_KEY",
    )
}

/// JSON logs in production, human-readable output otherwise.
fn init_tracing(config: &AuthConfig) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        "launchpad=debug,launchpad_auth=debug,tower_http=debug".into()
    });

    let registry = tracing_subscriber::registry().with(filter);
    if config.env.is_production() {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

#[cfg_attr(not(feature = "mock-provider"), allow(unused_variables))]
async fn build_auth_state(cli: &Cli, config: AuthConfig) -> Result<AuthState> {
    #[cfg(feature = "mock-provider")]
    if cli.mock_provider {
        use std::sync::Arc;

        use launchpad_auth::MockProvider;
        use launchpad_core::auth::UserMetadata;

        let provider = MockProvider::new();
        provider
            .add_user(
                "demo@example.com",
                "Demo1234",
                UserMetadata::default().with_full_name("Demo User"),
            )
            .await;
        tracing::warn!("Using in-memory identity provider (demo@example.com / Demo1234)");
        return Ok(AuthState::new(config, Arc::new(provider)));
    }

    AuthState::from_config(config).context("Failed to create auth provider client")
}

/// Wait for shutdown signals (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, shutting down...");
        }
        _ = terminate => {
            tracing::info!("Received SIGTERM, shutting down...");
        }
    }
}
