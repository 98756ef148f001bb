use anyhow::{Context, Result};
use fluidgas_backend::{
    build_pipeline,
    config::{create_sample_config, load_config, CliArgs},
    server::ApiServer,
};
use log::{info, warn};
use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<()> {
    // Pick up a local .env before reading the environment
    if let Err(e) = dotenvy::dotenv() {
        if !e.not_found() {
            eprintln!("Failed to read .env: {}", e);
        }
    }

    let cli_args = CliArgs::parse();

    if cli_args.sample_config {
        print!("{}", create_sample_config());
        return Ok(());
    }

    // Log level comes from the merged configuration
    let config = match load_config(&cli_args) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    // Initialize logging
    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(config.server.log_level.as_str()),
    )
    .init();

    info!("FluidGas Backend v{}", env!("CARGO_PKG_VERSION"));

    if config.bridge.quote.relayer_fee.is_none() {
        warn!("No relayer fee configured; responses will not include fee estimates");
    }

    let pipeline = build_pipeline(&config).context("Failed to build the bridge pipeline")?;

    let server = ApiServer::new(config.server.clone(), Arc::new(pipeline));
    server.start().await.context("Server error")?;

    Ok(())
}
