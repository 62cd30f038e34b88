//! Warden authentication server binary.
//!
//! Serves the auth API over HTTP until interrupted with Ctrl-C.

use std::net::SocketAddr;
use std::sync::Arc;

use clap::{Parser, ValueEnum};
use tracing::{info, warn};
use warden_api::config::ApiConfig;
use warden_core::auth::session::SessionService;
use warden_core::clock::SystemClock;
use warden_core::store::{IdentityStore, MemoryIdentityStore, PgIdentityStore};

/// Identity store backends.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum StoreKind {
    Postgres,
    /// Process-local store. Identities are lost on exit.
    Memory,
}

/// CLI arguments for the auth server.
#[derive(Parser, Debug)]
#[command(name = "warden_server", about = "Warden authentication server")]
struct Args {
    /// Port to listen on. Overrides the port in `BIND_ADDR`.
    #[arg(long)]
    port: Option<u16>,

    /// PostgreSQL connection URL.
    #[arg(long, env = "DATABASE_URL")]
    database_url: Option<String>,

    /// Maximum number of database connections in the pool.
    #[arg(long, default_value_t = 5)]
    max_connections: u32,

    /// Identity store backend.
    #[arg(long, value_enum, default_value_t = StoreKind::Postgres)]
    store: StoreKind,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,warden_api=debug,warden_core=debug".into()),
        )
        .init();

    let args = Args::parse();
    let mut config = ApiConfig::from_env();
    if let Some(url) = args.database_url {
        config.database_url = url;
    }
    if let Some(port) = args.port {
        config.bind_addr = with_port(&config.bind_addr, port);
    }

    info!(bind_addr = %config.bind_addr, store = ?args.store, "starting warden_server");

    let store: Arc<dyn IdentityStore> = match args.store {
        StoreKind::Postgres => {
            info!(max_connections = args.max_connections, "connecting to identity store");
            let store = PgIdentityStore::connect(&config.database_url, args.max_connections).await?;
            store.migrate().await?;
            Arc::new(store)
        }
        StoreKind::Memory => {
            warn!("using in-memory identity store; identities are lost on exit");
            Arc::new(MemoryIdentityStore::new())
        }
    };

    let sessions = SessionService::new(&config.auth, store, Arc::new(SystemClock));
    let state = warden_api::AppState::with_rate_limit(sessions, config.rate_limit);
    let app = warden_api::router(state);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    info!(addr = %listener.local_addr()?, "REST API listening");

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    info!("shut down");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "failed to listen for ctrl-c");
        std::future::pending::<()>().await;
    }
    info!("ctrl-c received, shutting down");
}

/// Replaces the port of a `host:port` address.
fn with_port(bind_addr: &str, port: u16) -> String {
    let host = bind_addr
        .rsplit_once(':')
        .map(|(host, _)| host)
        .unwrap_or(bind_addr);
    format!("{host}:{port}")
}
