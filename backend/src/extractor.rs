//! Prompt -> `Intent` extraction through a chat-completions language model.

use crate::types::OpenAiConfig;
use async_trait::async_trait;
use fluidgas_intent::{Intent, IntentError, RawIntent};
use serde::Deserialize;
use std::{sync::Arc, time::Duration};
use tracing::{debug, error, info};

/// Fixed instruction sent with every prompt. The reply contract is the
/// `RawIntent` field set.
pub const SYSTEM_INSTRUCTION: &str = r#"You are an intelligent assistant for a blockchain bridging application.
User wants to bridge tokens from Sepolia (EVM) to Solana.
Extract the following details:
- tokenSymbolOrAddress: The symbol (e.g., "USDC") or contract address (e.g., "0xabc123...") of the token.
- amount: The numerical amount of tokens to bridge.
- destinationAddress: The recipient's Solana address.
- requestDestinationGas: A boolean (true/false). Set to true if the user mentions wanting gas, SOL, or fees on the destination. Otherwise, set to false.
- destinationGasAmount: If requestDestinationGas is true and a specific SOL amount is mentioned (e.g., "0.01 SOL"), extract that number. If requestDestinationGas is true but no specific amount is mentioned, default destinationGasAmount to 0.01. If requestDestinationGas is false, destinationGasAmount should be null or not present.
- sourceChain and destinationChain: the chains the user names. If none are named assume "Sepolia" and "Solana".
Respond ONLY with a JSON object.
If crucial information like token, amount, or destination address is missing, set their values to null and include an "error" field explaining what's missing.
Example successful response (with gas requested, default amount):
{ "tokenSymbolOrAddress": "TestUSDC", "amount": 50, "destinationAddress": "SoLAnAaddRESShERE", "requestDestinationGas": true, "destinationGasAmount": 0.01, "sourceChain": "Sepolia", "destinationChain": "Solana" }
Example if missing info:
{ "tokenSymbolOrAddress": null, "amount": 10, "destinationAddress": null, "requestDestinationGas": false, "sourceChain": "Sepolia", "destinationChain": "Solana", "error": "Missing token or destination address." }"#;

#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("language model API key is not configured")]
    MissingApiKey,

    #[error("language model request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("language model API error {status}: {body}")]
    Status { status: u16, body: String },
}

#[derive(Debug, thiserror::Error)]
pub enum ExtractionError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Failed to reach the language model")]
    Unreachable(#[source] LlmError),

    #[error("Language model returned no content")]
    EmptyResponse,

    #[error("Language model reply is not a JSON object")]
    Malformed(#[source] serde_json::Error),

    #[error(transparent)]
    InvalidIntent(#[from] IntentError),
}

/// A chat model that can be asked for a single JSON object.
#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Returns the reply content, or `None` when the model sent none.
    async fn chat_json(&self, system: &str, user: &str) -> Result<Option<String>, LlmError>;

    fn model_name(&self) -> &str;
}

/// OpenAI chat-completions client.
#[derive(Clone)]
pub struct OpenAiClient {
    api_key: String,
    model: String,
    base_url: String,
    temperature: f32,
    client: reqwest::Client,
}

impl OpenAiClient {
    pub fn new(config: &OpenAiConfig) -> Result<Self, LlmError> {
        if config.api_key.trim().is_empty() {
            return Err(LlmError::MissingApiKey);
        }

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            api_key: config.api_key.clone(),
            model: config.model.clone(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            temperature: config.temperature,
            client,
        })
    }
}

#[async_trait]
impl LlmClient for OpenAiClient {
    async fn chat_json(&self, system: &str, user: &str) -> Result<Option<String>, LlmError> {
        #[derive(Deserialize)]
        struct Message {
            content: Option<String>,
        }
        #[derive(Deserialize)]
        struct Choice {
            message: Message,
        }
        #[derive(Deserialize)]
        struct ChatResponse {
            #[serde(default)]
            choices: Vec<Choice>,
        }

        let body = serde_json::json!({
            "model": &self.model,
            "messages": [
                {"role": "system", "content": system},
                {"role": "user", "content": user}
            ],
            "response_format": {"type": "json_object"},
            "temperature": self.temperature
        });

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(LlmError::Status { status, body });
        }

        let reply: ChatResponse = response.json().await?;
        Ok(reply
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .filter(|content| !content.trim().is_empty()))
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

/// Turns prompts into validated intents.
#[derive(Clone)]
pub struct IntentExtractor {
    client: Option<Arc<dyn LlmClient>>,
}

impl IntentExtractor {
    pub fn new(client: Arc<dyn LlmClient>) -> Self {
        Self {
            client: Some(client),
        }
    }

    /// Build from configuration. A missing API key is not fatal here; every
    /// extraction then fails with a configuration error before calling out.
    pub fn from_config(config: &OpenAiConfig) -> Result<Self, LlmError> {
        match OpenAiClient::new(config) {
            Ok(client) => {
                info!("Intent extractor using model {}", client.model_name());
                Ok(Self::new(Arc::new(client)))
            }
            Err(LlmError::MissingApiKey) => {
                error!("OpenAI API key is not configured; prompts cannot be parsed");
                Ok(Self { client: None })
            }
            Err(e) => Err(e),
        }
    }

    pub fn is_configured(&self) -> bool {
        self.client.is_some()
    }

    /// The caller guarantees `prompt` is non-empty.
    pub async fn extract(&self, prompt: &str) -> Result<Intent, ExtractionError> {
        let client = self.client.as_ref().ok_or_else(|| {
            ExtractionError::Configuration("OpenAI API key not configured.".to_string())
        })?;

        let content = client
            .chat_json(SYSTEM_INSTRUCTION, prompt)
            .await
            .map_err(|e| {
                error!("Error calling language model API: {}", e);
                ExtractionError::Unreachable(e)
            })?
            .ok_or(ExtractionError::EmptyResponse)?;

        debug!(
            "Model reply: {}",
            content.chars().take(1000).collect::<String>()
        );

        let raw: RawIntent = serde_json::from_str(&content).map_err(|e| {
            error!("Model reply is not a JSON object: {}", e);
            ExtractionError::Malformed(e)
        })?;

        Ok(Intent::from_raw(raw)?)
    }
}
