use crate::types::intent::{Chain, Intent, RawIntent};
use rust_decimal::Decimal;
use serde_json::Value;
use std::str::FromStr;
use tracing::{error, warn};

/// Diagnostic attached when the model could not supply every critical field.
pub const MISSING_CRITICAL_INFORMATION: &str =
    "Missing critical information (token, amount, or destination address).";

/// Destination gas (in SOL) assumed when gas is requested without an amount.
pub fn default_destination_gas() -> Decimal {
    Decimal::new(1, 2)
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum IntentError {
    #[error("Invalid amount: {value}")]
    InvalidAmount { value: String },

    #[error("Invalid destination gas amount: {value}")]
    InvalidGasAmount { value: String },
}

impl Intent {
    /// Coerce the model's loosely-typed reply into an `Intent`.
    pub fn from_raw(raw: RawIntent) -> Result<Self, IntentError> {
        let error = raw.error.as_ref().and_then(non_empty_string);
        if let Some(reason) = &error {
            warn!("Model reported a parsing issue: {}", reason);
        }

        let request_destination_gas = raw
            .request_destination_gas
            .as_ref()
            .map(is_truthy)
            .unwrap_or(false);

        let destination_gas_amount = if request_destination_gas {
            Some(coerce_gas_amount(raw.destination_gas_amount.as_ref())?)
        } else {
            None
        };

        let mut intent = Intent {
            token_symbol_or_address: raw.token_symbol_or_address.as_ref().and_then(non_empty_string),
            amount: coerce_amount(raw.amount.as_ref())?,
            destination_address: raw.destination_address.as_ref().and_then(non_empty_string),
            request_destination_gas,
            destination_gas_amount,
            source_chain: coerce_chain(raw.source_chain.as_ref(), Chain::Sepolia),
            destination_chain: coerce_chain(raw.destination_chain.as_ref(), Chain::Solana),
            error,
        };

        if !intent.is_complete() {
            error!(
                "Missing critical information after structuring: {:?}",
                intent.missing_fields()
            );
            if intent.error.is_none() {
                intent.error = Some(MISSING_CRITICAL_INFORMATION.to_string());
            }
        }

        Ok(intent)
    }
}

/// Parse a JSON number or numeric string without going through `f64`.
pub fn parse_decimal(value: &Value) -> Option<Decimal> {
    let text = match value {
        Value::Number(number) => number.to_string(),
        Value::String(text) => text.trim().to_string(),
        _ => return None,
    };
    if text.is_empty() {
        return None;
    }
    Decimal::from_str(&text)
        .or_else(|_| Decimal::from_scientific(&text))
        .ok()
}

/// True for JSON numbers and strings holding a finite number, in or out of `Decimal` range.
fn is_numeric(value: &Value) -> bool {
    match value {
        Value::Number(_) => true,
        Value::String(text) => text.trim().parse::<f64>().is_ok_and(f64::is_finite),
        _ => false,
    }
}

fn raw_text(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        _ => value.to_string(),
    }
}

/// Absent or non-numeric amounts are missing; numbers `Decimal` cannot hold are invalid.
fn coerce_amount(value: Option<&Value>) -> Result<Option<Decimal>, IntentError> {
    let Some(value) = value else {
        return Ok(None);
    };
    match parse_decimal(value) {
        Some(amount) => Ok(Some(amount)),
        None if is_numeric(value) => Err(IntentError::InvalidAmount {
            value: raw_text(value),
        }),
        None => Ok(None),
    }
}

fn non_empty_string(value: &Value) -> Option<String> {
    match value {
        Value::String(text) if !text.trim().is_empty() => Some(text.trim().to_string()),
        _ => None,
    }
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Bool(flag) => *flag,
        Value::Number(number) => number.as_f64().is_some_and(|n| n != 0.0),
        Value::String(text) => {
            let text = text.trim();
            text.eq_ignore_ascii_case("true") || text.eq_ignore_ascii_case("yes")
        }
        _ => false,
    }
}

fn coerce_gas_amount(value: Option<&Value>) -> Result<Decimal, IntentError> {
    let parsed = match value {
        None | Some(Value::Null) | Some(Value::Bool(false)) => None,
        Some(Value::String(text)) if text.trim().is_empty() => None,
        Some(other) => match parse_decimal(other) {
            Some(amount) => Some(amount),
            None => {
                return Err(IntentError::InvalidGasAmount {
                    value: raw_text(other),
                });
            }
        },
    };

    match parsed {
        Some(amount) if !amount.is_zero() => Ok(amount),
        _ => {
            let fallback = default_destination_gas();
            warn!(
                "Destination gas requested without an amount, assuming {} SOL",
                fallback
            );
            Ok(fallback)
        }
    }
}

fn coerce_chain(value: Option<&Value>, fallback: Chain) -> Chain {
    match value {
        Some(Value::String(name)) if !name.trim().is_empty() => Chain::from_name(name),
        _ => fallback,
    }
}
