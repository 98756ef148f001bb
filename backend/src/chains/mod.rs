//! Address formats of the chains the bridge touches.

pub mod evm;
pub mod solana;

use fluidgas_intent::Chain;
use solana_sdk::pubkey::Pubkey;
use std::fmt;

/// Execution environment family a chain belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Platform {
    Evm,
    Solana,
}

impl Platform {
    pub fn of(chain: &Chain) -> Option<Platform> {
        match chain {
            Chain::Sepolia => Some(Platform::Evm),
            Chain::Solana => Some(Platform::Solana),
            Chain::Other(_) => None,
        }
    }

    pub fn parse_address(&self, text: &str) -> Result<NativeAddress, AddressError> {
        match self {
            Platform::Evm => evm::parse_evm_address(text).map(NativeAddress::Evm),
            Platform::Solana => solana::parse_solana_address(text).map(NativeAddress::Solana),
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Platform::Evm => write!(f, "Evm"),
            Platform::Solana => write!(f, "Solana"),
        }
    }
}

/// A parsed, platform-native account or contract address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NativeAddress {
    Evm([u8; 20]),
    Solana(Pubkey),
}

impl fmt::Display for NativeAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NativeAddress::Evm(bytes) => write!(f, "0x{}", hex::encode(bytes)),
            NativeAddress::Solana(pubkey) => write!(f, "{}", pubkey),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AddressError {
    #[error("address is empty")]
    Empty,

    #[error("address must start with {0}")]
    MissingPrefix(&'static str),

    #[error("expected {expected} hex digits, got {actual}")]
    InvalidLength { expected: usize, actual: usize },

    #[error("invalid hex: {0}")]
    InvalidHex(String),

    #[error("invalid base58 public key: {0}")]
    InvalidPublicKey(String),
}
