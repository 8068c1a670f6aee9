//! Wrapped token minted on the child side of the bridge
//!
//! A mint-only fungible ledger: supply grows exclusively through
//! quorum-authorized mints.

use crate::core::Address;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

/// Maximum mint events kept in history
const MAX_HISTORY: usize = 100;

/// Bridge-related errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BridgeError {
    #[error("Invalid amount: amount must be greater than 0")]
    InvalidAmount,
    #[error("Supply overflow minting {amount} on top of {supply}")]
    SupplyOverflow { supply: u128, amount: u128 },
    #[error("Invalid recipient: zero address")]
    ZeroAddress,
}

/// Mint event (emitted when wrapped tokens are created)
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct MintEvent {
    pub to: Address,
    pub amount: u128,
    pub timestamp: DateTime<Utc>,
}

/// Wrapped representation of value locked on the parent side
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct WrappedToken {
    pub name: String,
    pub symbol: String,
    pub decimals: u8,
    total_supply: u128,
    /// Balances: address -> amount
    balances: HashMap<Address, u128>,
    /// Mint history (last 100)
    pub mint_history: Vec<MintEvent>,
}

impl WrappedToken {
    pub fn new(name: impl Into<String>, symbol: impl Into<String>, decimals: u8) -> Self {
        Self {
            name: name.into(),
            symbol: symbol.into(),
            decimals,
            total_supply: 0,
            balances: HashMap::new(),
            mint_history: Vec::new(),
        }
    }

    /// Create `amount` new tokens for `to`
    pub fn mint(&mut self, to: Address, amount: u128) -> Result<MintEvent, BridgeError> {
        if amount == 0 {
            return Err(BridgeError::InvalidAmount);
        }
        if to == Address::default() {
            return Err(BridgeError::ZeroAddress);
        }
        let supply = self
            .total_supply
            .checked_add(amount)
            .ok_or(BridgeError::SupplyOverflow {
                supply: self.total_supply,
                amount,
            })?;

        self.total_supply = supply;
        *self.balances.entry(to).or_insert(0) += amount;

        let event = MintEvent {
            to,
            amount,
            timestamp: Utc::now(),
        };
        self.mint_history.push(event.clone());
        if self.mint_history.len() > MAX_HISTORY {
            self.mint_history.remove(0);
        }

        log::info!("Minted {} {} to {}", amount, self.symbol, to);
        Ok(event)
    }

    pub fn balance_of(&self, holder: &Address) -> u128 {
        self.balances.get(holder).copied().unwrap_or(0)
    }

    pub fn total_supply(&self) -> u128 {
        self.total_supply
    }

    /// Number of addresses holding a balance
    pub fn holder_count(&self) -> usize {
        self.balances.len()
    }
}
