//! Offchain-Multisig: off-chain signature multisig authorization in Rust
//!
//! This crate provides:
//! - Canonical `(epoch, txid, payload)` message hashing (Keccak-256)
//! - Recoverable ECDSA signatures (secp256k1) and signer recovery
//! - Epoch-versioned signer sets with majority quorum
//! - Partial (one signature per call) and full (bundle) execution paths
//! - Exactly-once dispatch of signer rotation and consumer actions
//! - A lock-and-mint bridge consumer
//! - JSON persistence with backups
//!
//! # Example
//!
//! ```rust
//! use offchain_multisig::bridge::{new_child, LockVault, WrappedToken};
//! use offchain_multisig::crypto::KeyPair;
//! use offchain_multisig::multisig::sign_message;
//!
//! let poa: Vec<KeyPair> = (0..3).map(|_| KeyPair::generate()).collect();
//! let mut child = new_child(
//!     poa.iter().map(|k| k.address()).collect(),
//!     WrappedToken::new("Wrapped Ether", "WETH", 18),
//! )
//! .unwrap();
//!
//! // Lock on the parent side
//! let mut parent = LockVault::new();
//! let user = KeyPair::generate().address();
//! let lock = parent.lock(user, 1_000).unwrap();
//!
//! // Two of three signers approve the mint
//! let payload = lock.mint_payload();
//! let sigs: Vec<_> = poa[..2]
//!     .iter()
//!     .map(|k| sign_message(k, child.epoch(), &lock.txid, &payload).unwrap())
//!     .collect();
//! child.full_execute(child.epoch(), lock.txid, &payload, &sigs).unwrap();
//!
//! assert_eq!(child.handler().token().balance_of(&user), 1_000);
//! ```

pub mod bridge;
pub mod cli;
pub mod core;
pub mod crypto;
pub mod multisig;
pub mod storage;

// Re-export commonly used types
pub use bridge::{BridgeChild, LockEvent, LockVault, MintGateway, WrappedToken};
pub use crate::core::{Address, Epoch, TxId};
pub use crypto::{KeyPair, Signature};
pub use multisig::{
    ActionHandler, MultisigError, OfflineMultisig, SignatureBundle, SignerSet, SubmitOutcome,
};
pub use storage::{Storage, StorageConfig};
