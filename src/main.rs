use log::{error, info};

use progresso::main_module::{initialize, run_axum_server};
use progresso::AppConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    info!("Starting Progresso {}", env!("CARGO_PKG_VERSION"));

    let config = AppConfig::from_env()?;
    if config.is_production() && config.database.url.is_none() {
        error!("Running in production without DATABASE_URL: all data will be lost on restart");
    }

    let state = initialize(config).await?;
    run_axum_server(state).await?;
    Ok(())
}
