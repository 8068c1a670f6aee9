//! Off-chain signature multisig authorization
//!
//! Signers approve an operation by signing `(epoch, txid, payload)`
//! off-chain. Anyone can then submit the signatures, one at a time or as
//! a bundle, and the operation runs once a majority of the current
//! signer set has approved it.
//!
//! # Example
//!
//! ```rust
//! use offchain_multisig::crypto::KeyPair;
//! use offchain_multisig::core::TxId;
//! use offchain_multisig::multisig::{change_signers_payload, sign_message, OfflineMultisig};
//!
//! let keys: Vec<KeyPair> = (0..3).map(|_| KeyPair::generate()).collect();
//! let mut multisig = OfflineMultisig::new(keys.iter().map(|k| k.address()).collect()).unwrap();
//!
//! let newcomer = KeyPair::generate();
//! let mut signers: Vec<_> = keys.iter().map(|k| k.address()).collect();
//! signers.push(newcomer.address());
//! let payload = change_signers_payload(multisig.epoch() + 1, &signers);
//! let txid = TxId::from_label("add newcomer");
//!
//! for key in &keys[..2] {
//!     let sig = sign_message(key, multisig.epoch(), &txid, &payload).unwrap();
//!     multisig.partial_execute(txid, &payload, sig).unwrap();
//! }
//! assert!(multisig.is_signer(&newcomer.address()));
//! ```

pub mod abi;
pub mod accumulator;
pub mod dispatcher;
pub mod engine;
pub mod error;
pub mod message;
pub mod registry;
pub mod signer_set;
pub mod verifier;

pub use abi::{AbiError, Selector, Word};
pub use accumulator::{
    CollectedSignature, PartialAccumulator, RecordStatus, SubmitOutcome, TransactionRecord,
};
pub use dispatcher::{
    change_signers_payload, Action, ActionHandler, ChangeSigners, Dispatcher,
    CHANGE_SIGNERS_SIGNATURE,
};
pub use engine::{OfflineMultisig, SignatureBundle};
pub use error::MultisigError;
pub use message::{epoch_word, message_digest, preimage, sign_message};
pub use registry::SignerRegistry;
pub use signer_set::SignerSet;
pub use verifier::{execute_full, verify_quorum};
