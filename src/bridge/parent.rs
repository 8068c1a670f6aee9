//! Parent side of the bridge: value is locked here
//!
//! Every lock produces a [`LockEvent`] carrying a fresh transaction id.
//! Relayers turn the event into a mint payload and collect signatures for
//! it under that id.

use crate::bridge::child::mint_payload;
use crate::bridge::token::BridgeError;
use crate::core::{Address, TxId};
use crate::crypto::keccak256_concat;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Emitted when a user deposits value
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct LockEvent {
    /// Identifier relayers use as the multisig txid
    pub txid: TxId,
    pub from: Address,
    pub value: u128,
    pub timestamp: DateTime<Utc>,
}

impl LockEvent {
    /// The `mint(from, value)` payload that releases the wrapped value
    pub fn mint_payload(&self) -> Vec<u8> {
        mint_payload(self.from, self.value)
    }
}

/// Custody of locked value
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct LockVault {
    locked: HashMap<Address, u128>,
    total_locked: u128,
    nonce: u64,
    events: Vec<LockEvent>,
}

impl LockVault {
    pub fn new() -> Self {
        Self::default()
    }

    /// Lock `value` from `from` and emit the event
    pub fn lock(&mut self, from: Address, value: u128) -> Result<LockEvent, BridgeError> {
        if value == 0 {
            return Err(BridgeError::InvalidAmount);
        }
        let total = self
            .total_locked
            .checked_add(value)
            .ok_or(BridgeError::SupplyOverflow {
                supply: self.total_locked,
                amount: value,
            })?;

        let txid = TxId(keccak256_concat(&[
            &self.nonce.to_be_bytes(),
            from.as_bytes(),
            &value.to_be_bytes(),
        ]));
        self.nonce += 1;
        self.total_locked = total;
        *self.locked.entry(from).or_insert(0) += value;

        let event = LockEvent {
            txid,
            from,
            value,
            timestamp: Utc::now(),
        };
        self.events.push(event.clone());

        log::info!("Locked {} from {} (txid {})", value, from, txid);
        Ok(event)
    }

    pub fn locked_by(&self, address: &Address) -> u128 {
        self.locked.get(address).copied().unwrap_or(0)
    }

    pub fn total_locked(&self) -> u128 {
        self.total_locked
    }

    /// Lock events in emission order
    pub fn events(&self) -> &[LockEvent] {
        &self.events
    }
}
