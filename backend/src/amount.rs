//! Fixed-point conversion between human decimal amounts and integer base units.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Precision of native SOL (lamports).
pub const SOLANA_NATIVE_DECIMALS: u8 = 9;

/// Largest scale `rust_decimal` can represent when converting back.
const MAX_DECIMAL_SCALE: u8 = 28;

/// An amount in a token's smallest indivisible unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct BaseUnits(pub u128);

impl BaseUnits {
    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }
}

impl fmt::Display for BaseUnits {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AmountError {
    #[error("amount {0} is negative")]
    Negative(Decimal),

    #[error("amount {amount} has more than {decimals} fractional digits")]
    ExcessPrecision { amount: Decimal, decimals: u8 },

    #[error("amount {amount} does not fit in base units with {decimals} decimals")]
    Overflow { amount: Decimal, decimals: u8 },
}

/// Scale `amount` by `10^decimals` exactly.
///
/// Fails instead of truncating when `amount` carries more fractional digits
/// than the token supports.
pub fn normalize(amount: Decimal, decimals: u8) -> Result<BaseUnits, AmountError> {
    if amount.is_sign_negative() && !amount.is_zero() {
        return Err(AmountError::Negative(amount));
    }

    let trimmed = amount.normalize();
    let scale = trimmed.scale();
    if scale > u32::from(decimals) {
        return Err(AmountError::ExcessPrecision { amount, decimals });
    }

    let overflow = || AmountError::Overflow { amount, decimals };
    let mantissa = trimmed.mantissa().unsigned_abs();
    let factor = 10u128
        .checked_pow(u32::from(decimals) - scale)
        .ok_or_else(overflow)?;

    mantissa
        .checked_mul(factor)
        .map(BaseUnits)
        .ok_or_else(overflow)
}

/// Convert base units back into a human decimal amount.
pub fn denormalize(units: BaseUnits, decimals: u8) -> Result<Decimal, AmountError> {
    let overflow = || AmountError::Overflow {
        amount: Decimal::MAX,
        decimals,
    };
    if decimals > MAX_DECIMAL_SCALE {
        return Err(overflow());
    }
    let mantissa = i128::try_from(units.0).map_err(|_| overflow())?;
    Decimal::try_from_i128_with_scale(mantissa, u32::from(decimals))
        .map(|value| value.normalize())
        .map_err(|_| overflow())
}
