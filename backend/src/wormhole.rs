//! Bridging SDK surface: chain contexts, transfer preparation and quoting,
//! plus the lazily initialized process-wide handle.

use crate::{
    amount::{denormalize, normalize, AmountError, BaseUnits, SOLANA_NATIVE_DECIMALS},
    chains::{AddressError, NativeAddress, Platform},
    types::{BridgeConfig, ChainEndpointConfig},
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use fluidgas_intent::Chain;
use rust_decimal::Decimal;
use serde::Serialize;
use std::{collections::HashMap, sync::Arc};
use tokio::sync::OnceCell;
use tracing::{debug, error, info};
use url::Url;
use uuid::Uuid;

/// The token bridge carries at most this many decimals across chains.
pub const TOKEN_BRIDGE_MAX_DECIMALS: u8 = 8;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SdkError {
    #[error("Unsupported Wormhole network: {0}")]
    UnsupportedNetwork(String),

    #[error("Chain {0} is not configured for bridging")]
    UnknownChain(Chain),

    #[error("Invalid RPC URL for {chain}: {reason}")]
    InvalidRpcUrl { chain: Chain, reason: String },

    #[error("Invalid {contract} contract on {chain}: {source}")]
    InvalidContract {
        chain: Chain,
        contract: &'static str,
        source: AddressError,
    },

    #[error("Invalid address on {chain}: {source}")]
    InvalidAddress { chain: Chain, source: AddressError },

    #[error("Invalid transfer: {0}")]
    InvalidTransfer(String),

    #[error("Transfer quote unavailable: {0}")]
    QuoteUnavailable(String),

    #[error("Bridging SDK initialization failed: {0}")]
    Initialization(String),
}

/// Contracts deployed on one chain.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChainContracts {
    pub core_bridge: Option<String>,
    pub token_bridge: Option<String>,
}

/// Per-chain view the SDK works against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChainContext {
    pub chain: Chain,
    pub platform: Platform,
    pub rpc: Option<Url>,
    pub contracts: ChainContracts,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenId {
    pub platform: Platform,
    pub address: NativeAddress,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChainAddress {
    pub chain: Chain,
    pub address: NativeAddress,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferRequest {
    pub token: TokenId,
    pub amount: BaseUnits,
    pub decimals: u8,
    pub from: ChainAddress,
    pub to: ChainAddress,
    /// Relayed delivery on the destination.
    pub automatic: bool,
    /// Native gas dropped off to the recipient, in lamports.
    pub native_gas: Option<BaseUnits>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreparedTransfer {
    pub id: Uuid,
    pub request: TransferRequest,
    pub created_at: DateTime<Utc>,
}

/// Fee estimate for a prepared transfer, in human units.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferQuote {
    pub source_amount: Decimal,
    pub relayer_fee: Decimal,
    pub destination_amount: Decimal,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub destination_native_gas: Option<Decimal>,
}

/// Operations the assembler needs from a bridging SDK.
#[async_trait]
pub trait BridgeSdk: Send + Sync {
    fn chain(&self, chain: &Chain) -> Result<&ChainContext, SdkError>;

    fn token_id(&self, chain: &Chain, address: &str) -> Result<TokenId, SdkError>;

    fn chain_address(&self, chain: &Chain, address: &str) -> Result<ChainAddress, SdkError>;

    async fn token_transfer(&self, request: TransferRequest) -> Result<PreparedTransfer, SdkError>;

    async fn quote_transfer(&self, transfer: &PreparedTransfer) -> Result<TransferQuote, SdkError>;
}

/// Wormhole token bridge on Testnet (Sepolia and Solana devnet).
#[derive(Debug, Clone)]
pub struct WormholeSdk {
    network: String,
    contexts: HashMap<Chain, ChainContext>,
    relayer_fee: Option<Decimal>,
}

impl WormholeSdk {
    pub fn new(config: &BridgeConfig) -> Result<Self, SdkError> {
        if !config.network.eq_ignore_ascii_case("testnet") {
            return Err(SdkError::UnsupportedNetwork(config.network.clone()));
        }

        let mut contexts = HashMap::new();
        for (chain, endpoint) in [
            (Chain::Sepolia, &config.sepolia),
            (Chain::Solana, &config.solana),
        ] {
            let context = build_context(chain.clone(), endpoint)?;
            contexts.insert(chain, context);
        }

        Ok(Self {
            network: "Testnet".to_string(),
            contexts,
            relayer_fee: config.quote.relayer_fee,
        })
    }

    pub fn network(&self) -> &str {
        &self.network
    }

    fn parse(&self, chain: &Chain, address: &str) -> Result<NativeAddress, SdkError> {
        let context = self.chain(chain)?;
        context
            .platform
            .parse_address(address.trim())
            .map_err(|source| SdkError::InvalidAddress {
                chain: chain.clone(),
                source,
            })
    }
}

fn build_context(chain: Chain, endpoint: &ChainEndpointConfig) -> Result<ChainContext, SdkError> {
    let platform = Platform::of(&chain).ok_or_else(|| SdkError::UnknownChain(chain.clone()))?;

    let rpc = match endpoint.rpc_url.trim() {
        "" => None,
        url => Some(Url::parse(url).map_err(|e| SdkError::InvalidRpcUrl {
            chain: chain.clone(),
            reason: e.to_string(),
        })?),
    };

    let contract = |name: &'static str, value: &str| -> Result<Option<String>, SdkError> {
        let value = value.trim();
        if value.is_empty() {
            return Ok(None);
        }
        platform
            .parse_address(value)
            .map_err(|source| SdkError::InvalidContract {
                chain: chain.clone(),
                contract: name,
                source,
            })?;
        Ok(Some(value.to_string()))
    };

    let contracts = ChainContracts {
        core_bridge: contract("core bridge", &endpoint.core_bridge)?,
        token_bridge: contract("token bridge", &endpoint.token_bridge)?,
    };

    Ok(ChainContext {
        chain,
        platform,
        rpc,
        contracts,
    })
}

/// Drop the digits the token bridge cannot carry.
fn truncate_to_bridge_precision(amount: BaseUnits, decimals: u8) -> BaseUnits {
    if decimals <= TOKEN_BRIDGE_MAX_DECIMALS {
        return amount;
    }
    match 10u128.checked_pow(u32::from(decimals - TOKEN_BRIDGE_MAX_DECIMALS)) {
        Some(factor) => BaseUnits(amount.0 / factor * factor),
        None => BaseUnits(0),
    }
}

fn quote_amount(result: Result<Decimal, AmountError>) -> Result<Decimal, SdkError> {
    result.map_err(|e| SdkError::QuoteUnavailable(e.to_string()))
}

#[async_trait]
impl BridgeSdk for WormholeSdk {
    fn chain(&self, chain: &Chain) -> Result<&ChainContext, SdkError> {
        self.contexts
            .get(chain)
            .ok_or_else(|| SdkError::UnknownChain(chain.clone()))
    }

    fn token_id(&self, chain: &Chain, address: &str) -> Result<TokenId, SdkError> {
        let platform = self.chain(chain)?.platform;
        Ok(TokenId {
            platform,
            address: self.parse(chain, address)?,
        })
    }

    fn chain_address(&self, chain: &Chain, address: &str) -> Result<ChainAddress, SdkError> {
        Ok(ChainAddress {
            chain: chain.clone(),
            address: self.parse(chain, address)?,
        })
    }

    async fn token_transfer(&self, request: TransferRequest) -> Result<PreparedTransfer, SdkError> {
        if request.amount.is_zero() {
            return Err(SdkError::InvalidTransfer("amount must be positive".to_string()));
        }
        if request.from.chain == request.to.chain {
            return Err(SdkError::InvalidTransfer(format!(
                "source and destination are both {}",
                request.from.chain
            )));
        }

        let source = self.chain(&request.from.chain)?;
        self.chain(&request.to.chain)?;
        if request.token.platform != source.platform {
            return Err(SdkError::InvalidTransfer(format!(
                "token is not native to {}",
                request.from.chain
            )));
        }
        if source.contracts.token_bridge.is_none() {
            return Err(SdkError::InvalidTransfer(format!(
                "no token bridge on {}",
                request.from.chain
            )));
        }
        if request.native_gas.is_some() && !request.automatic {
            return Err(SdkError::InvalidTransfer(
                "native gas drop-off requires an automatic transfer".to_string(),
            ));
        }

        let transfer = PreparedTransfer {
            id: Uuid::new_v4(),
            request,
            created_at: Utc::now(),
        };
        debug!(
            "Prepared transfer {} of {} base units {} -> {}",
            transfer.id, transfer.request.amount, transfer.request.from.chain, transfer.request.to.chain
        );
        Ok(transfer)
    }

    async fn quote_transfer(&self, transfer: &PreparedTransfer) -> Result<TransferQuote, SdkError> {
        let request = &transfer.request;
        let fee = match (request.automatic, self.relayer_fee) {
            (false, _) => Decimal::ZERO,
            (true, Some(fee)) => fee,
            (true, None) => {
                return Err(SdkError::QuoteUnavailable(
                    "no relayer fee configured".to_string(),
                ))
            }
        };

        let fee_units = normalize(fee, request.decimals)
            .map_err(|e| SdkError::QuoteUnavailable(e.to_string()))?;
        let bridged = truncate_to_bridge_precision(request.amount, request.decimals);
        let delivered = bridged.0.checked_sub(fee_units.0).ok_or_else(|| {
            SdkError::QuoteUnavailable("amount does not cover the relayer fee".to_string())
        })?;

        let destination_native_gas = request
            .native_gas
            .map(|gas| quote_amount(denormalize(gas, SOLANA_NATIVE_DECIMALS)))
            .transpose()?;

        Ok(TransferQuote {
            source_amount: quote_amount(denormalize(request.amount, request.decimals))?,
            relayer_fee: fee,
            destination_amount: quote_amount(denormalize(BaseUnits(delivered), request.decimals))?,
            destination_native_gas,
        })
    }
}

/// Builds the SDK on first use.
#[async_trait]
pub trait BridgeConnector: Send + Sync {
    async fn connect(&self) -> Result<Arc<dyn BridgeSdk>, SdkError>;
}

/// Connects a `WormholeSdk` from configuration.
pub struct WormholeConnector {
    config: BridgeConfig,
}

impl WormholeConnector {
    pub fn new(config: BridgeConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl BridgeConnector for WormholeConnector {
    async fn connect(&self) -> Result<Arc<dyn BridgeSdk>, SdkError> {
        let sdk = WormholeSdk::new(&self.config)?;
        info!("Wormhole SDK initialized for {}", sdk.network());

        for chain in [Chain::Sepolia, Chain::Solana] {
            let context = sdk.chain(&chain)?;
            info!(
                "{} token bridge: {}",
                chain,
                context.contracts.token_bridge.as_deref().unwrap_or("<none>")
            );
        }

        Ok(Arc::new(sdk))
    }
}

/// Process-wide SDK handle, created once on first use.
///
/// Concurrent first callers wait on the single initializer. A failed
/// initialization leaves the handle empty so a later call retries.
pub struct BridgeHandle {
    cell: OnceCell<Arc<dyn BridgeSdk>>,
    connector: Arc<dyn BridgeConnector>,
}

impl BridgeHandle {
    pub fn new(connector: Arc<dyn BridgeConnector>) -> Self {
        Self {
            cell: OnceCell::new(),
            connector,
        }
    }

    pub fn wormhole(config: BridgeConfig) -> Self {
        Self::new(Arc::new(WormholeConnector::new(config)))
    }

    pub async fn get(&self) -> Result<Arc<dyn BridgeSdk>, SdkError> {
        let sdk = self
            .cell
            .get_or_try_init(|| async {
                info!("Initializing bridging SDK");
                self.connector.connect().await.map_err(|e| {
                    error!("Failed to initialize bridging SDK: {}", e);
                    e
                })
            })
            .await?;
        Ok(Arc::clone(sdk))
    }

    pub fn is_initialized(&self) -> bool {
        self.cell.initialized()
    }
}
