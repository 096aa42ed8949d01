use anyhow::{Context, Result};
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;

use camp_manager_backend::config::AppConfig;
use camp_manager_backend::{create_router, initialize_backend};

#[tokio::main]
async fn main() -> Result<()> {
    let config = AppConfig::load()?;

    // RUST_LOG wins over the configured level
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    info!("Data directory: {:?}", config.data_directory);
    let app_state = initialize_backend(&config).await?;
    let app = create_router(app_state, &config.allowed_origin);

    info!("Starting server on {}", config.bind_address);
    let listener = TcpListener::bind(config.bind_address.as_str())
        .await
        .with_context(|| format!("Failed to bind {}", config.bind_address))?;
    info!("Listening on {}", config.bind_address);

    axum::serve(listener, app).await?;

    Ok(())
}
