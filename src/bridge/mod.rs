//! Lock-and-mint bridge built on the multisig
//!
//! The parent vault locks value and emits events; the child mints the
//! wrapped equivalent once a signer quorum approves the matching payload.

pub mod child;
pub mod parent;
pub mod token;

pub use child::{mint_payload, new_child, BridgeChild, Mint, MintGateway, MINT_SIGNATURE};
pub use parent::{LockEvent, LockVault};
pub use token::{BridgeError, MintEvent, WrappedToken};
