//! FluidGas intent model.
//!
//! The language model replies with a loosely-typed JSON object; this crate
//! owns the strongly-typed [`Intent`] and the coercion that produces it.

pub mod types {
    pub mod intent;
}

pub mod coerce;

pub use coerce::{IntentError, MISSING_CRITICAL_INFORMATION, default_destination_gas, parse_decimal};
pub use types::intent::{Chain, Intent, RawIntent};
