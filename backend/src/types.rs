//! Core data types and configuration for the FluidGas bridge planner

use chrono::{DateTime, Utc};
use fluidgas_intent::Chain;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Resolved on-chain identity of a token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenDetails {
    pub address: String,
    pub decimals: u8,
}

/// Everything a wallet needs to execute the prepared bridge transfer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BridgeParameters {
    pub source_chain: Chain,
    pub destination_chain: Chain,
    pub token_address: String,
    /// Integer base units, kept as a string so JSON consumers never round it.
    pub normalized_amount: String,
    pub recipient_address: String,
    pub needs_approval: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub approve_to_address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub estimated_fees: Option<serde_json::Value>,
    #[serde(
        default,
        with = "rust_decimal::serde::float_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub native_gas_amount_for_display: Option<Decimal>,
}

/// Service configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub openai: OpenAiConfig,
    pub bridge: BridgeConfig,
    pub registry: RegistryConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub request_timeout_secs: u64,
    pub log_level: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenAiConfig {
    pub api_key: String,
    pub model: String,
    pub base_url: String,
    pub timeout_secs: u64,
    pub temperature: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BridgeConfig {
    pub network: String,
    pub sepolia: ChainEndpointConfig,
    pub solana: ChainEndpointConfig,
    #[serde(default)]
    pub quote: QuoteConfig,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChainEndpointConfig {
    #[serde(default)]
    pub rpc_url: String,
    #[serde(default)]
    pub core_bridge: String,
    pub token_bridge: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct QuoteConfig {
    /// Flat relayer fee in token units for automatic transfers.
    #[serde(default)]
    pub relayer_fee: Option<Decimal>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistryConfig {
    pub fallback_decimals: u8,
    pub unregistered_addresses: UnregisteredTokenPolicy,
    /// Registered tokens keyed by chain name.
    #[serde(default)]
    pub tokens: HashMap<String, Vec<TokenEntry>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenEntry {
    pub symbol: String,
    pub address: String,
    pub decimals: u8,
}

/// What the registry does with a contract address it has no entry for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnregisteredTokenPolicy {
    /// Pair the address with `fallback_decimals` and log a warning.
    Assume,
    Reject,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Configuration error: {0}")]
    Invalid(String),

    #[error("Configuration source error: {0}")]
    Source(#[from] config::ConfigError),
}

/// Health check status
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthStatus {
    pub service: String,
    pub status: ServiceStatus,
    pub bridge_initialized: bool,
    pub last_check: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum ServiceStatus {
    Healthy,
    Degraded,
}
