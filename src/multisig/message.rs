//! Canonical signed message
//!
//! Preimage layout, bit-exact with what signers hash off-chain:
//!
//! ```text
//! be256(epoch) || txid (32 bytes) || payload (raw ABI bytes)
//! ```
//!
//! The digest is a single Keccak-256 over that preimage.

use crate::core::{Epoch, TxId};
use crate::crypto::{keccak256_concat, KeyError, KeyPair, Signature};

/// Epoch as a 32-byte big-endian word
pub fn epoch_word(epoch: Epoch) -> [u8; 32] {
    let mut word = [0u8; 32];
    word[24..].copy_from_slice(&epoch.to_be_bytes());
    word
}

/// Build the raw preimage for `(epoch, txid, payload)`
pub fn preimage(epoch: Epoch, txid: &TxId, payload: &[u8]) -> Vec<u8> {
    let mut data = Vec::with_capacity(64 + payload.len());
    data.extend_from_slice(&epoch_word(epoch));
    data.extend_from_slice(txid.as_bytes());
    data.extend_from_slice(payload);
    data
}

/// Digest every signer signs for `(epoch, txid, payload)`
pub fn message_digest(epoch: Epoch, txid: &TxId, payload: &[u8]) -> [u8; 32] {
    keccak256_concat(&[&epoch_word(epoch), txid.as_bytes(), payload])
}

/// Signer-side helper: hash and sign in one step
pub fn sign_message(
    key_pair: &KeyPair,
    epoch: Epoch,
    txid: &TxId,
    payload: &[u8],
) -> Result<Signature, KeyError> {
    key_pair.sign_digest(&message_digest(epoch, txid, payload))
}
