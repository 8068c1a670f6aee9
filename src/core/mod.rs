//! Core identity types
//!
//! Fixed-width signer addresses and transaction ids, plus the epoch
//! counter type, shared by every other module.

pub mod types;

pub use types::{hex_bytes, Address, Epoch, ParseIdError, TxId};
