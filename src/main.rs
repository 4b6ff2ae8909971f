use std::net::SocketAddr;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use paddock::config::{Cli, Config};
use paddock::db;
use paddock::routes;
use paddock::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // Parse CLI args and load config
    let cli = Cli::parse();
    let data_dir = Config::data_dir(&cli);
    std::fs::create_dir_all(&data_dir)?;
    tracing::info!("Data directory: {}", data_dir.display());

    let config = Config::load(&cli)?;
    if let Some(founder) = &config.community.founder_member_id {
        tracing::info!("New members will follow founder {}", founder);
    }

    // Initialize database
    let pool = db::create_pool(&config.db_path(), &config.database)?;
    db::run_migrations(&pool)?;

    let state = AppState::new(pool, config.clone())?;

    // Test-only seed endpoint: issues a session cookie for any member id
    let test_seed = std::env::var("PADDOCK_TEST_SEED").is_ok();
    if test_seed {
        tracing::warn!("PADDOCK_TEST_SEED is set, /test/seed is mounted");
    }

    let app = routes::app(state, test_seed);

    // Start server
    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;
    tracing::info!("Listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
