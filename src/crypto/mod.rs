//! Cryptographic utilities
//!
//! This module provides:
//! - Keccak-256 hashing
//! - ECDSA key management (secp256k1)
//! - Recoverable signatures and signer recovery

pub mod hash;
pub mod keys;
pub mod signature;

pub use hash::{keccak256, keccak256_concat, keccak256_hex};
pub use keys::{public_key_from_hex, public_key_to_address, sign_digest, KeyError, KeyPair};
pub use signature::{
    recover_signer, signatures_from_words, signatures_to_words, Signature, SignatureFormatError,
};
