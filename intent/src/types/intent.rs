use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Chain identifier as reported by the language model.
///
/// Only the Sepolia -> Solana route is bridged; any other name the model
/// produces is kept verbatim in `Other` so callers can reject the route
/// instead of silently rewriting it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Chain {
    Sepolia,
    Solana,
    Other(String),
}

impl Chain {
    pub fn name(&self) -> &str {
        match self {
            Chain::Sepolia => "Sepolia",
            Chain::Solana => "Solana",
            Chain::Other(name) => name,
        }
    }

    pub fn from_name(name: &str) -> Self {
        let trimmed = name.trim();
        if trimmed.eq_ignore_ascii_case("sepolia") {
            Chain::Sepolia
        } else if trimmed.eq_ignore_ascii_case("solana") {
            Chain::Solana
        } else {
            Chain::Other(trimmed.to_string())
        }
    }
}

impl fmt::Display for Chain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl From<String> for Chain {
    fn from(name: String) -> Self {
        Chain::from_name(&name)
    }
}

impl From<Chain> for String {
    fn from(chain: Chain) -> Self {
        chain.name().to_string()
    }
}

/// Structured bridging request extracted from a free-text prompt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Intent {
    #[serde(default)]
    pub token_symbol_or_address: Option<String>,
    #[serde(default, with = "rust_decimal::serde::float_option")]
    pub amount: Option<Decimal>,
    #[serde(default)]
    pub destination_address: Option<String>,
    #[serde(default)]
    pub request_destination_gas: bool,
    #[serde(
        default,
        with = "rust_decimal::serde::float_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub destination_gas_amount: Option<Decimal>,
    pub source_chain: Chain,
    pub destination_chain: Chain,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Intent {
    /// True when token, amount and destination are all present.
    pub fn is_complete(&self) -> bool {
        self.missing_fields().is_empty()
    }

    pub fn missing_fields(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.token_symbol_or_address.is_none() {
            missing.push("tokenSymbolOrAddress");
        }
        if self.amount.is_none() {
            missing.push("amount");
        }
        if self.destination_address.is_none() {
            missing.push("destinationAddress");
        }
        missing
    }
}

/// The model's reply before any field is trusted.
///
/// Every field is an untyped JSON value so that a wrong type from the model
/// reaches the coercion step instead of failing deserialization outright.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawIntent {
    pub token_symbol_or_address: Option<Value>,
    pub amount: Option<Value>,
    pub destination_address: Option<Value>,
    pub request_destination_gas: Option<Value>,
    pub destination_gas_amount: Option<Value>,
    pub source_chain: Option<Value>,
    pub destination_chain: Option<Value>,
    pub error: Option<Value>,
}
