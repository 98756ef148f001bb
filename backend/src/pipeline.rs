use crate::{
    amount::{normalize, AmountError, SOLANA_NATIVE_DECIMALS},
    assembler::{AssemblyError, BridgeAssembler, GasTopUp},
    extractor::{ExtractionError, IntentExtractor},
    registry::TokenRegistry,
    types::BridgeParameters,
};
use fluidgas_intent::{Chain, Intent, IntentError};
use serde::Serialize;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{error, info, warn};

pub const UNINTELLIGIBLE_MESSAGE: &str = "Could not understand your request. Please try again.";
pub const MISSING_INFORMATION_MESSAGE: &str =
    "Missing critical information in your request (token, amount, or destination address).";
pub const UNSUPPORTED_ROUTE_MESSAGE: &str =
    "Bridging is currently only supported from Sepolia to Solana via this prompt.";
pub const BRIDGE_UNAVAILABLE_MESSAGE: &str =
    "Bridging service is currently unavailable. Please try again later.";

/// Why a request was turned down.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum FailureKind {
    MissingInformation,
    Unintelligible,
    UnsupportedRoute,
    UnknownToken,
    InvalidAmount,
    InvalidGasAmount,
    InvalidAddress,
    BridgeInitFailure,
}

/// A request the pipeline understood well enough to refuse.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DomainFailure {
    #[serde(skip)]
    pub kind: FailureKind,
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
}

impl DomainFailure {
    pub fn new(kind: FailureKind, error: impl Into<String>) -> Self {
        Self {
            kind,
            error: error.into(),
            details: None,
        }
    }

    pub fn with_details(mut self, details: Value) -> Self {
        self.details = Some(details);
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum PipelineOutcome {
    Prepared(BridgeParameters),
    Rejected(DomainFailure),
}

/// Unexpected failures. The boundary logs these and answers generically.
#[derive(Debug, thiserror::Error)]
pub enum PipelineFault {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Intent extraction failed: {0}")]
    Extraction(#[source] ExtractionError),
}

/// Prompt -> bridge parameters, one request at a time.
#[derive(Clone)]
pub struct BridgePipeline {
    extractor: IntentExtractor,
    registry: Arc<TokenRegistry>,
    assembler: BridgeAssembler,
}

impl BridgePipeline {
    pub fn new(
        extractor: IntentExtractor,
        registry: Arc<TokenRegistry>,
        assembler: BridgeAssembler,
    ) -> Self {
        Self {
            extractor,
            registry,
            assembler,
        }
    }

    pub fn extractor(&self) -> &IntentExtractor {
        &self.extractor
    }

    pub fn assembler(&self) -> &BridgeAssembler {
        &self.assembler
    }

    /// Run a prompt through extraction, validation and assembly.
    pub async fn prepare(
        &self,
        prompt: &str,
        sender: &str,
    ) -> Result<PipelineOutcome, PipelineFault> {
        match self.run(prompt, sender).await? {
            Ok(params) => Ok(PipelineOutcome::Prepared(params)),
            Err(failure) => {
                info!("Request rejected ({:?}): {}", failure.kind, failure.error);
                Ok(PipelineOutcome::Rejected(failure))
            }
        }
    }

    async fn run(
        &self,
        prompt: &str,
        sender: &str,
    ) -> Result<Result<BridgeParameters, DomainFailure>, PipelineFault> {
        // Extract intent
        let intent = match self.extractor.extract(prompt).await {
            Ok(intent) => intent,
            Err(e) => return extraction_failure(e).map(Err),
        };
        info!("Parsed intent: {:?}", intent);

        // Critical fields
        if !intent.is_complete() {
            warn!("Intent is missing {:?}", intent.missing_fields());
            let details = serde_json::to_value(&intent).unwrap_or(Value::Null);
            return Ok(Err(DomainFailure::new(
                FailureKind::MissingInformation,
                MISSING_INFORMATION_MESSAGE,
            )
            .with_details(details)));
        }
        if let Some(diagnostic) = &intent.error {
            warn!("Model reported a problem but all fields are present: {}", diagnostic);
        }

        // Route
        if intent.source_chain != Chain::Sepolia || intent.destination_chain != Chain::Solana {
            return Ok(Err(DomainFailure::new(
                FailureKind::UnsupportedRoute,
                UNSUPPORTED_ROUTE_MESSAGE,
            )));
        }

        Ok(self.plan(&intent, sender).await)
    }

    async fn plan(&self, intent: &Intent, sender: &str) -> Result<BridgeParameters, DomainFailure> {
        let (Some(reference), Some(amount)) = (&intent.token_symbol_or_address, intent.amount) else {
            return Err(DomainFailure::new(
                FailureKind::MissingInformation,
                MISSING_INFORMATION_MESSAGE,
            ));
        };

        // Token
        let token = self
            .registry
            .resolve(&intent.source_chain, reference)
            .map_err(|e| DomainFailure::new(FailureKind::UnknownToken, format!("Token error: {}", e)))?;

        // Token amount
        if amount.is_zero() {
            return Err(DomainFailure::new(
                FailureKind::InvalidAmount,
                "Invalid amount: must be greater than zero.",
            ));
        }
        let units = normalize(amount, token.decimals).map_err(|e| amount_failure(&e))?;

        // Destination gas
        let gas = match intent.destination_gas_amount {
            Some(gas) if intent.request_destination_gas => {
                let lamports = normalize(gas, SOLANA_NATIVE_DECIMALS).map_err(|e| {
                    DomainFailure::new(
                        FailureKind::InvalidGasAmount,
                        format!("Invalid destination gas amount: {}", e),
                    )
                    .with_details(json!({ "destinationGasAmount": gas.to_string() }))
                })?;
                Some(GasTopUp {
                    amount: gas,
                    lamports,
                })
            }
            _ => None,
        };

        self.assembler
            .assemble(intent, &token, units, gas, sender)
            .await
            .map_err(assembly_failure)
    }
}

fn extraction_failure(error: ExtractionError) -> Result<DomainFailure, PipelineFault> {
    match error {
        ExtractionError::EmptyResponse | ExtractionError::Malformed(_) => {
            warn!("Could not parse model reply: {}", error);
            Ok(DomainFailure::new(
                FailureKind::Unintelligible,
                UNINTELLIGIBLE_MESSAGE,
            ))
        }
        ExtractionError::InvalidIntent(IntentError::InvalidAmount { value }) => Ok(
            DomainFailure::new(FailureKind::InvalidAmount, format!("Invalid amount: {}", value))
                .with_details(json!({ "amount": value })),
        ),
        ExtractionError::InvalidIntent(IntentError::InvalidGasAmount { value }) => Ok(
            DomainFailure::new(
                FailureKind::InvalidGasAmount,
                format!("Invalid destination gas amount: {}", value),
            )
            .with_details(json!({ "destinationGasAmount": value })),
        ),
        ExtractionError::Configuration(message) => {
            error!("Extractor is not configured: {}", message);
            Err(PipelineFault::Configuration(message))
        }
        e @ ExtractionError::Unreachable(_) => Err(PipelineFault::Extraction(e)),
    }
}

fn amount_failure(error: &AmountError) -> DomainFailure {
    DomainFailure::new(FailureKind::InvalidAmount, format!("Invalid amount: {}", error))
}

fn assembly_failure(error: AssemblyError) -> DomainFailure {
    match error {
        AssemblyError::BridgeInit(e) => {
            error!("Bridging SDK unavailable: {}", e);
            DomainFailure::new(FailureKind::BridgeInitFailure, BRIDGE_UNAVAILABLE_MESSAGE)
        }
        AssemblyError::MissingTokenBridge(_) => {
            DomainFailure::new(FailureKind::BridgeInitFailure, error.to_string())
        }
        AssemblyError::InvalidAddress { .. } | AssemblyError::Transfer(_) => {
            DomainFailure::new(FailureKind::InvalidAddress, error.to_string())
        }
    }
}
