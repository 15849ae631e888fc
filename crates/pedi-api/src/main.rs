use tracing_subscriber::EnvFilter;

mod config;
mod error;
mod middleware;
mod router;
mod routes;
mod state;

use config::{LogFormat, ServiceConfig};
use state::AppState;

#[tokio::main]
async fn main() -> eyre::Result<()> {
    let config = ServiceConfig::from_env()?;

    let subscriber = tracing_subscriber::fmt().with_env_filter(EnvFilter::from_default_env());
    match config.log_format {
        LogFormat::Json => subscriber.json().init(),
        LogFormat::Pretty => subscriber.pretty().init(),
    }

    // Every definition is checked here, before the first request is served.
    let registry = config.load_registry()?;
    tracing::info!(
        protocols = registry.len(),
        catalog = ?config.catalog_path,
        "protocol catalog ready"
    );

    let app = router::build(AppState::new(registry), config.cors_layer()?);

    lambda_http::run(app).await.map_err(|e| eyre::eyre!(e))
}
