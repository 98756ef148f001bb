use crate::{
    chains::{evm, Platform},
    types::{RegistryConfig, TokenDetails, TokenEntry, UnregisteredTokenPolicy},
};
use fluidgas_intent::Chain;
use std::collections::HashMap;
use tracing::{debug, warn};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    #[error("Unsupported or unknown token symbol: {symbol} on {chain}")]
    UnknownToken { symbol: String, chain: Chain },

    #[error("Token address {address} is not registered on {chain}")]
    UnregisteredAddress { address: String, chain: Chain },

    #[error("Token lookup is not supported on {0}")]
    UnsupportedChain(Chain),
}

/// Static per-chain token table. Never written after construction.
#[derive(Debug, Clone)]
pub struct TokenRegistry {
    tokens: HashMap<Chain, HashMap<String, TokenDetails>>,
    fallback_decimals: u8,
    policy: UnregisteredTokenPolicy,
}

impl TokenRegistry {
    pub fn new(
        entries: HashMap<Chain, Vec<TokenEntry>>,
        fallback_decimals: u8,
        policy: UnregisteredTokenPolicy,
    ) -> Self {
        let tokens = entries
            .into_iter()
            .map(|(chain, entries)| {
                let by_symbol = entries
                    .into_iter()
                    .map(|entry| {
                        (
                            entry.symbol.to_uppercase(),
                            TokenDetails {
                                address: entry.address,
                                decimals: entry.decimals,
                            },
                        )
                    })
                    .collect();
                (chain, by_symbol)
            })
            .collect();

        Self {
            tokens,
            fallback_decimals,
            policy,
        }
    }

    pub fn from_config(config: &RegistryConfig) -> Self {
        let entries = config
            .tokens
            .iter()
            .map(|(chain, entries)| (Chain::from_name(chain), entries.clone()))
            .collect();
        Self::new(entries, config.fallback_decimals, config.unregistered_addresses)
    }

    /// Resolve a symbol or contract address on `chain`.
    pub fn resolve(&self, chain: &Chain, reference: &str) -> Result<TokenDetails, RegistryError> {
        let table = self
            .tokens
            .get(chain)
            .ok_or_else(|| RegistryError::UnsupportedChain(chain.clone()))?;
        let reference = reference.trim();

        if looks_like_address(chain, reference) {
            if let Some(details) = table
                .values()
                .find(|details| details.address.eq_ignore_ascii_case(reference))
            {
                debug!("Resolved {} on {} from registry", reference, chain);
                return Ok(details.clone());
            }

            return match self.policy {
                UnregisteredTokenPolicy::Assume => {
                    warn!(
                        "Decimals for address {} on {} are not pre-configured. Assuming {}.",
                        reference, chain, self.fallback_decimals
                    );
                    Ok(TokenDetails {
                        address: reference.to_string(),
                        decimals: self.fallback_decimals,
                    })
                }
                UnregisteredTokenPolicy::Reject => Err(RegistryError::UnregisteredAddress {
                    address: reference.to_string(),
                    chain: chain.clone(),
                }),
            };
        }

        table
            .get(&reference.to_uppercase())
            .cloned()
            .ok_or_else(|| RegistryError::UnknownToken {
                symbol: reference.to_string(),
                chain: chain.clone(),
            })
    }
}

fn looks_like_address(chain: &Chain, reference: &str) -> bool {
    match Platform::of(chain) {
        Some(Platform::Evm) => evm::has_address_prefix(reference),
        _ => false,
    }
}
