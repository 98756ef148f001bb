//! FluidGas backend
//!
//! Turns a free-text bridging prompt into the parameters a wallet needs to
//! move tokens from Sepolia to Solana over the Wormhole token bridge.
//!
//! ```no_run
//! use fluidgas_backend::{build_pipeline, config::{load_config, CliArgs}};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = load_config(&CliArgs::default())?;
//!     let pipeline = build_pipeline(&config)?;
//!
//!     let outcome = pipeline
//!         .prepare(
//!             "Send 50 TestUSDC to 9WzDXwBbmkg8ZTbNMqUxvQRAyrZzDsGYdLVL9zYtAWWM",
//!             "0x1111111111111111111111111111111111111111",
//!         )
//!         .await?;
//!     println!("{:?}", outcome);
//!     Ok(())
//! }
//! ```

pub mod amount;
pub mod assembler;
pub mod chains;
pub mod config;
pub mod extractor;
pub mod pipeline;
pub mod registry;
pub mod server;
pub mod types;
pub mod wormhole;

pub use assembler::BridgeAssembler;
pub use extractor::{IntentExtractor, LlmClient, OpenAiClient};
pub use pipeline::{BridgePipeline, DomainFailure, FailureKind, PipelineFault, PipelineOutcome};
pub use registry::TokenRegistry;
pub use types::{AppConfig, BridgeParameters, TokenDetails};
pub use wormhole::{BridgeHandle, BridgeSdk};

use std::sync::Arc;

/// Wire the pipeline from configuration. The bridging SDK is not touched
/// until the first request needs it.
pub fn build_pipeline(config: &AppConfig) -> Result<BridgePipeline, extractor::LlmError> {
    let extractor = IntentExtractor::from_config(&config.openai)?;
    let registry = Arc::new(TokenRegistry::from_config(&config.registry));
    let handle = Arc::new(BridgeHandle::wormhole(config.bridge.clone()));

    Ok(BridgePipeline::new(
        extractor,
        registry,
        BridgeAssembler::new(handle),
    ))
}
