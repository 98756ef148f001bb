#![allow(dead_code)]

use async_trait::async_trait;
use fluidgas_backend::{
    assembler::BridgeAssembler,
    extractor::{IntentExtractor, LlmClient, LlmError},
    pipeline::BridgePipeline,
    registry::TokenRegistry,
    types::{
        BridgeConfig, ChainEndpointConfig, QuoteConfig, RegistryConfig, TokenEntry,
        UnregisteredTokenPolicy,
    },
    wormhole::{BridgeConnector, BridgeHandle, BridgeSdk, SdkError, WormholeConnector},
};
use rust_decimal::Decimal;
use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    },
    time::Duration,
};

pub const TEST_USDC: &str = "0x07865c6E87B9F70255377e024ace6630C1Eaa37F";
pub const USDC: &str = "0x1c7D4B196Cb0C7B01d743Fbc6116a902379C7238";
pub const SEPOLIA_TOKEN_BRIDGE: &str = "0x4a8bc80Ed5a4067f1CCf107057b8270E0cC11A78";
pub const SOLANA_TOKEN_BRIDGE: &str = "3u8hJUVTA4jH1wYAyUur7FFZVQ8H635K3tSHHF4ssjQ5";
pub const SENDER: &str = "0x1111111111111111111111111111111111111111";
pub const RECIPIENT: &str = "9WzDXwBbmkg8ZTbNMqUxvQRAyrZzDsGYdLVL9zYtAWWM";

/// What the fake model does when asked.
#[derive(Debug, Clone)]
pub enum Script {
    Reply(String),
    Empty,
    Down,
    Slow(Duration, String),
}

pub struct ScriptedLlm {
    script: Script,
    pub calls: AtomicUsize,
}

impl ScriptedLlm {
    pub fn new(script: Script) -> Arc<Self> {
        Arc::new(Self {
            script,
            calls: AtomicUsize::new(0),
        })
    }

    pub fn reply(value: serde_json::Value) -> Arc<Self> {
        Self::new(Script::Reply(value.to_string()))
    }
}

#[async_trait]
impl LlmClient for ScriptedLlm {
    async fn chat_json(&self, _system: &str, _user: &str) -> Result<Option<String>, LlmError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.script {
            Script::Reply(content) => Ok(Some(content.clone())),
            Script::Empty => Ok(None),
            Script::Down => Err(LlmError::Status {
                status: 503,
                body: "upstream connect error".to_string(),
            }),
            Script::Slow(delay, content) => {
                tokio::time::sleep(*delay).await;
                Ok(Some(content.clone()))
            }
        }
    }

    fn model_name(&self) -> &str {
        "scripted"
    }
}

/// Counts SDK initializations and can fail the first few.
pub struct CountingConnector {
    inner: WormholeConnector,
    failures: usize,
    pub connects: AtomicUsize,
}

impl CountingConnector {
    pub fn new(config: BridgeConfig, failures: usize) -> Arc<Self> {
        Arc::new(Self {
            inner: WormholeConnector::new(config),
            failures,
            connects: AtomicUsize::new(0),
        })
    }

    pub fn connects(&self) -> usize {
        self.connects.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl BridgeConnector for CountingConnector {
    async fn connect(&self) -> Result<Arc<dyn BridgeSdk>, SdkError> {
        let attempt = self.connects.fetch_add(1, Ordering::SeqCst);
        if attempt < self.failures {
            return Err(SdkError::Initialization("rpc unavailable".to_string()));
        }
        self.inner.connect().await
    }
}

pub fn bridge_config(relayer_fee: Option<Decimal>) -> BridgeConfig {
    BridgeConfig {
        network: "Testnet".to_string(),
        sepolia: ChainEndpointConfig {
            rpc_url: "https://rpc.sepolia.org".to_string(),
            core_bridge: String::new(),
            token_bridge: SEPOLIA_TOKEN_BRIDGE.to_string(),
        },
        solana: ChainEndpointConfig {
            rpc_url: "https://api.devnet.solana.com".to_string(),
            core_bridge: String::new(),
            token_bridge: SOLANA_TOKEN_BRIDGE.to_string(),
        },
        quote: QuoteConfig { relayer_fee },
    }
}

pub fn registry() -> TokenRegistry {
    let mut tokens = HashMap::new();
    tokens.insert(
        "sepolia".to_string(),
        vec![
            TokenEntry {
                symbol: "TestUSDC".to_string(),
                address: TEST_USDC.to_string(),
                decimals: 6,
            },
            TokenEntry {
                symbol: "USDC".to_string(),
                address: USDC.to_string(),
                decimals: 6,
            },
        ],
    );

    TokenRegistry::from_config(&RegistryConfig {
        fallback_decimals: 6,
        unregistered_addresses: UnregisteredTokenPolicy::Assume,
        tokens,
    })
}

pub struct Harness {
    pub pipeline: Arc<BridgePipeline>,
    pub llm: Arc<ScriptedLlm>,
    pub connector: Arc<CountingConnector>,
}

pub fn harness_with(llm: Arc<ScriptedLlm>, connector: Arc<CountingConnector>) -> Harness {
    let handle = Arc::new(BridgeHandle::new(connector.clone()));
    let pipeline = BridgePipeline::new(
        IntentExtractor::new(llm.clone()),
        Arc::new(registry()),
        BridgeAssembler::new(handle),
    );

    Harness {
        pipeline: Arc::new(pipeline),
        llm,
        connector,
    }
}

pub fn harness(llm: Arc<ScriptedLlm>) -> Harness {
    harness_with(llm, CountingConnector::new(bridge_config(Some(Decimal::new(1, 2))), 0))
}
