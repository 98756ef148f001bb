use super::AddressError;

pub const ADDRESS_PREFIX: &str = "0x";

const ADDRESS_HEX_LEN: usize = 40;

/// True when `text` follows the `0x` convention, without checking the digits.
pub fn has_address_prefix(text: &str) -> bool {
    text.get(..ADDRESS_PREFIX.len())
        .is_some_and(|prefix| prefix.eq_ignore_ascii_case(ADDRESS_PREFIX))
}

/// Parse a 20-byte `0x`-prefixed hex address. Checksum casing is not enforced.
pub fn parse_evm_address(text: &str) -> Result<[u8; 20], AddressError> {
    let text = text.trim();
    if text.is_empty() {
        return Err(AddressError::Empty);
    }
    if !has_address_prefix(text) {
        return Err(AddressError::MissingPrefix(ADDRESS_PREFIX));
    }

    let digits = &text[ADDRESS_PREFIX.len()..];
    if digits.len() != ADDRESS_HEX_LEN {
        return Err(AddressError::InvalidLength {
            expected: ADDRESS_HEX_LEN,
            actual: digits.len(),
        });
    }

    let mut bytes = [0u8; 20];
    hex::decode_to_slice(digits, &mut bytes).map_err(|e| AddressError::InvalidHex(e.to_string()))?;
    Ok(bytes)
}
