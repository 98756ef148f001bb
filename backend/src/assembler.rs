use crate::{
    amount::BaseUnits,
    types::{BridgeParameters, TokenDetails},
    wormhole::{BridgeHandle, SdkError, TransferRequest},
};
use fluidgas_intent::Intent;
use rust_decimal::Decimal;
use std::sync::Arc;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AssemblyError {
    #[error("Bridging service is unavailable: {0}")]
    BridgeInit(SdkError),

    #[error("Token bridge address for {0} not found in configuration.")]
    MissingTokenBridge(String),

    #[error("Invalid {role} address: {reason}")]
    InvalidAddress { role: &'static str, reason: String },

    #[error("Could not prepare the transfer: {0}")]
    Transfer(SdkError),
}

/// Destination gas top-up in both human and lamport units.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GasTopUp {
    pub amount: Decimal,
    pub lamports: BaseUnits,
}

/// Turns a validated intent into wallet-ready bridge parameters.
#[derive(Clone)]
pub struct BridgeAssembler {
    handle: Arc<BridgeHandle>,
}

impl BridgeAssembler {
    pub fn new(handle: Arc<BridgeHandle>) -> Self {
        Self { handle }
    }

    pub fn handle(&self) -> &Arc<BridgeHandle> {
        &self.handle
    }

    /// `intent` must be complete; `amount` is already in token base units.
    pub async fn assemble(
        &self,
        intent: &Intent,
        token: &TokenDetails,
        amount: BaseUnits,
        gas: Option<GasTopUp>,
        sender: &str,
    ) -> Result<BridgeParameters, AssemblyError> {
        let sdk = self.handle.get().await.map_err(AssemblyError::BridgeInit)?;

        let source = sdk
            .chain(&intent.source_chain)
            .map_err(|_| AssemblyError::MissingTokenBridge(intent.source_chain.to_string()))?;
        let token_bridge = source
            .contracts
            .token_bridge
            .clone()
            .ok_or_else(|| AssemblyError::MissingTokenBridge(intent.source_chain.to_string()))?;
        debug!("Using {} token bridge {} for approval", intent.source_chain, token_bridge);

        let recipient = intent.destination_address.as_deref().unwrap_or_default();

        let token_id = sdk
            .token_id(&intent.source_chain, &token.address)
            .map_err(|e| invalid_address("token", e))?;
        let from = sdk
            .chain_address(&intent.source_chain, sender)
            .map_err(|e| invalid_address("sender", e))?;
        let to = sdk
            .chain_address(&intent.destination_chain, recipient)
            .map_err(|e| invalid_address("recipient", e))?;

        let request = TransferRequest {
            token: token_id,
            amount,
            decimals: token.decimals,
            from,
            to,
            automatic: true,
            native_gas: gas.map(|gas| gas.lamports),
        };

        let transfer = sdk
            .token_transfer(request)
            .await
            .map_err(AssemblyError::Transfer)?;

        let estimated_fees = match sdk.quote_transfer(&transfer).await {
            Ok(quote) => serde_json::to_value(&quote).ok(),
            Err(e) => {
                warn!("Could not get fee quote for transfer {}: {}", transfer.id, e);
                None
            }
        };

        info!(
            "Prepared bridge parameters {} -> {} for {} base units of {}",
            intent.source_chain, intent.destination_chain, amount, token.address
        );

        Ok(BridgeParameters {
            source_chain: intent.source_chain.clone(),
            destination_chain: intent.destination_chain.clone(),
            token_address: token.address.clone(),
            normalized_amount: amount.to_string(),
            recipient_address: recipient.trim().to_string(),
            needs_approval: true,
            approve_to_address: Some(token_bridge),
            estimated_fees,
            native_gas_amount_for_display: gas.map(|gas| gas.amount),
        })
    }
}

fn invalid_address(role: &'static str, error: SdkError) -> AssemblyError {
    let reason = match error {
        SdkError::InvalidAddress { source, .. } => source.to_string(),
        other => other.to_string(),
    };
    AssemblyError::InvalidAddress { role, reason }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wormhole::tests::{bridge_config, SEPOLIA_TOKEN_BRIDGE};
    use fluidgas_intent::Chain;

    const TEST_USDC: &str = "0x07865c6E87B9F70255377e024ace6630C1Eaa37F";
    const SENDER: &str = "0x1111111111111111111111111111111111111111";
    const RECIPIENT: &str = "9WzDXwBbmkg8ZTbNMqUxvQRAyrZzDsGYdLVL9zYtAWWM";

    fn intent(recipient: &str) -> Intent {
        Intent {
            token_symbol_or_address: Some("TestUSDC".to_string()),
            amount: Some(Decimal::from(50)),
            destination_address: Some(recipient.to_string()),
            request_destination_gas: false,
            destination_gas_amount: None,
            source_chain: Chain::Sepolia,
            destination_chain: Chain::Solana,
            error: None,
        }
    }

    fn token() -> TokenDetails {
        TokenDetails {
            address: TEST_USDC.to_string(),
            decimals: 6,
        }
    }

    fn assembler(relayer_fee: Option<Decimal>) -> BridgeAssembler {
        BridgeAssembler::new(Arc::new(BridgeHandle::wormhole(bridge_config(relayer_fee))))
    }

    #[tokio::test]
    async fn test_assembles_parameters() {
        let params = assembler(None)
            .assemble(&intent(RECIPIENT), &token(), BaseUnits(50_000_000), None, SENDER)
            .await
            .unwrap();

        assert_eq!(params.normalized_amount, "50000000");
        assert_eq!(params.token_address, TEST_USDC);
        assert_eq!(params.recipient_address, RECIPIENT);
        assert!(params.needs_approval);
        assert_eq!(params.approve_to_address.as_deref(), Some(SEPOLIA_TOKEN_BRIDGE));
        // No relayer fee configured, so no quote.
        assert!(params.estimated_fees.is_none());
        assert!(params.native_gas_amount_for_display.is_none());
    }

    #[tokio::test]
    async fn test_gas_and_quote_included() {
        let gas = GasTopUp {
            amount: Decimal::new(1, 2),
            lamports: BaseUnits(10_000_000),
        };
        let params = assembler(Some(Decimal::new(1, 1)))
            .assemble(&intent(RECIPIENT), &token(), BaseUnits(100_000), Some(gas), SENDER)
            .await
            .unwrap();

        assert_eq!(params.native_gas_amount_for_display, Some(Decimal::new(1, 2)));
        let fees = params.estimated_fees.unwrap();
        assert_eq!(fees["relayerFee"], "0.1");
        assert_eq!(fees["destinationNativeGas"], "0.01");
    }

    #[tokio::test]
    async fn test_invalid_recipient() {
        let err = assembler(None)
            .assemble(&intent("not-a-solana-key!"), &token(), BaseUnits(1), None, SENDER)
            .await
            .unwrap_err();
        assert!(matches!(err, AssemblyError::InvalidAddress { role: "recipient", .. }));
    }

    #[tokio::test]
    async fn test_missing_token_bridge() {
        let mut config = bridge_config(None);
        config.sepolia.token_bridge = String::new();
        let assembler = BridgeAssembler::new(Arc::new(BridgeHandle::wormhole(config)));

        let err = assembler
            .assemble(&intent(RECIPIENT), &token(), BaseUnits(1), None, SENDER)
            .await
            .unwrap_err();
        assert_eq!(err, AssemblyError::MissingTokenBridge("Sepolia".to_string()));
    }

    #[tokio::test]
    async fn test_init_failure_surfaces() {
        let mut config = bridge_config(None);
        config.network = "Mainnet".to_string();
        let assembler = BridgeAssembler::new(Arc::new(BridgeHandle::wormhole(config)));

        let err = assembler
            .assemble(&intent(RECIPIENT), &token(), BaseUnits(1), None, SENDER)
            .await
            .unwrap_err();
        assert!(matches!(err, AssemblyError::BridgeInit(SdkError::UnsupportedNetwork(_))));
        assert!(!assembler.handle().is_initialized());
    }
}
