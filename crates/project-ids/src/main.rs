//! Login and consent service for the project identity provider

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tokio::signal;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use project_ids::config::Config;
use project_ids::events::TracingEventSink;
use project_ids::interaction::DefaultInteractionService;
use project_ids::resources::InMemoryResourceStore;
use project_ids::users::TestUserStore;
use project_ids::{router, AppState};

/// How often expired sessions are purged
const SESSION_CLEANUP_INTERVAL: Duration = Duration::from_secs(300);

#[derive(Parser, Debug)]
#[command(name = "project-ids")]
#[command(about = "Login and consent service for the project identity provider")]
struct Cli {
    /// Port to listen on
    #[arg(long, default_value_t = 5000, env = "IDS_PORT")]
    port: u16,

    /// Address to bind to
    #[arg(long, default_value = "0.0.0.0", env = "IDS_BIND")]
    bind: String,

    /// Path to config directory
    #[arg(long, default_value = "./config", env = "IDS_CONFIG_PATH")]
    config_path: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "project_ids=info,events=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    // Load configuration
    let config = Config::load(&cli.config_path)?;
    let catalog = config.catalog.clone();

    let users = TestUserStore::new(catalog.users);
    let interaction = Arc::new(DefaultInteractionService::new(
        catalog.clients,
        config.interaction.authorize_callback_path.clone(),
    ));
    let resources = Arc::new(InMemoryResourceStore::new(
        catalog.identity_resources,
        catalog.api_resources,
    ));
    let events = Arc::new(TracingEventSink::new(config.events.clone()));

    tracing::info!("Loaded {} test users", users.len());
    tracing::info!("Serving scopes: {}", config.catalog.scope_names().join(" "));

    let state = AppState::new(config, users, interaction, resources, events)?;

    // Periodically drop expired sessions
    let sessions = state.sessions.clone();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(SESSION_CLEANUP_INTERVAL);
        loop {
            interval.tick().await;
            sessions.cleanup_expired();
        }
    });

    let app = router(state);

    // Parse bind address
    let addr: SocketAddr = format!("{}:{}", cli.bind, cli.port).parse()?;

    tracing::info!("Starting project-ids on {}", addr);

    // Start server
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Identity service shut down");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
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

    tracing::info!("Shutdown signal received");
}
