use std::net::SocketAddr;
use std::sync::Arc;

use tracing::{info, warn};

use taskd_core::db;
use taskd_core::repository::SqliteRepository;
use taskd_server::app::{self, AppState};
use taskd_server::config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "taskd_core=info,taskd_server=info,tower_http=info".into()),
        )
        .init();

    let config = Config::load().unwrap_or_else(|err| {
        warn!("config load failed ({err}), using defaults");
        Config::default()
    });

    if config.password.is_none() {
        warn!("no password configured, authentication is disabled");
    }

    info!(path = %config.db_file, "opening SQLite database");
    let pool = db::establish_connection(&config.db_file).await?;
    let repo = SqliteRepository::new(pool);

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    let state = Arc::new(AppState { config, repo });
    let router = app::build_router(state);

    info!("taskd listening on http://{addr}");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router).await?;

    Ok(())
}
