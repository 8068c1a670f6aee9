//! Cryptographic hashing utilities
//!
//! Keccak-256 is the only digest used: message preimages, action
//! selectors, and address derivation all go through it.

use sha3::{Digest, Keccak256};

/// Computes Keccak-256 hash of the input data
pub fn keccak256(data: &[u8]) -> [u8; 32] {
    let mut hasher = Keccak256::new();
    hasher.update(data);
    let result = hasher.finalize();
    let mut hash = [0u8; 32];
    hash.copy_from_slice(&result);
    hash
}

/// Computes Keccak-256 over several byte slices as one concatenated input
pub fn keccak256_concat(parts: &[&[u8]]) -> [u8; 32] {
    let mut hasher = Keccak256::new();
    for part in parts {
        hasher.update(part);
    }
    let result = hasher.finalize();
    let mut hash = [0u8; 32];
    hash.copy_from_slice(&result);
    hash
}

/// Computes Keccak-256 hash and returns it as a hex string
pub fn keccak256_hex(data: &[u8]) -> String {
    hex::encode(keccak256(data))
}
