//! Rejection reasons for multisig submissions
//!
//! Every variant is a hard rejection of the whole call: no partial state
//! is written when one of these is returned.

use crate::core::{Address, Epoch, TxId};
use crate::crypto::SignatureFormatError;
use thiserror::Error;

/// Errors related to multisig operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MultisigError {
    #[error("Invalid signature format: {0}")]
    InvalidSignatureFormat(#[from] SignatureFormatError),
    #[error("Signer not authorized: {0}")]
    UnauthorizedSigner(Address),
    #[error("Duplicate signature from {0}")]
    DuplicateSignature(Address),
    #[error("Payload or epoch mismatch for transaction {0}")]
    PayloadMismatch(TxId),
    #[error("Insufficient signatures: have {have}, need {need}")]
    InsufficientSignatures { have: usize, need: usize },
    #[error("Transaction already executed: {0}")]
    AlreadyExecuted(TxId),
    #[error("Unknown action: {0}")]
    UnknownAction(String),
    #[error("Stale epoch: expected {expected}, got {got}")]
    StaleEpoch { expected: Epoch, got: Epoch },
    #[error("Invalid signer set: {0}")]
    InvalidSignerSet(String),
    #[error("Action failed: {0}")]
    ActionFailed(String),
}
