use anyhow::Context;
use backend::config::AppConfig;
use backend::db;
use backend::web_server::{run_server, AppState};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // --- Setup ---
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(tracing_subscriber::filter::LevelFilter::INFO)
        .init();

    let app_config = AppConfig::from_env().context("failed to load configuration")?;

    let db_pool = db::connect(&app_config.database)
        .await
        .context("failed to connect to the database")?;

    tracing::info!("Running database migrations...");
    db::migrate(&db_pool)
        .await
        .context("failed to run migrations")?;
    tracing::info!("Migrations complete.");

    // --- Run Server ---
    tracing::info!("Initializing server...");
    run_server(AppState {
        db_pool,
        app_config,
    })
    .await
}
