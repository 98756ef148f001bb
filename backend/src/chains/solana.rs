use super::AddressError;
use solana_sdk::pubkey::Pubkey;
use std::str::FromStr;

/// Parse a base58 Solana public key (wallet or program id).
pub fn parse_solana_address(text: &str) -> Result<Pubkey, AddressError> {
    let text = text.trim();
    if text.is_empty() {
        return Err(AddressError::Empty);
    }
    Pubkey::from_str(text).map_err(|e| AddressError::InvalidPublicKey(e.to_string()))
}
