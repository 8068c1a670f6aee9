//! ECDSA key management
//!
//! Key pair generation and recoverable signing on the secp256k1 curve.
//! Signer identities are Ethereum-style addresses derived from the
//! uncompressed public key.

use crate::core::Address;
use crate::crypto::signature::Signature;
use rand::rngs::OsRng;
use secp256k1::{Message, PublicKey, Secp256k1, SecretKey};
use thiserror::Error;

/// Errors that can occur during key operations
#[derive(Error, Debug)]
pub enum KeyError {
    #[error("Invalid private key")]
    InvalidPrivateKey,
    #[error("Invalid public key")]
    InvalidPublicKey,
    #[error("Secp256k1 error: {0}")]
    Secp256k1Error(#[from] secp256k1::Error),
}

/// A key pair consisting of a private key and its corresponding public key
#[derive(Clone)]
pub struct KeyPair {
    pub secret_key: SecretKey,
    pub public_key: PublicKey,
}

impl KeyPair {
    /// Generate a new random key pair
    pub fn generate() -> Self {
        let secp = Secp256k1::new();
        let (secret_key, public_key) = secp.generate_keypair(&mut OsRng);
        Self {
            secret_key,
            public_key,
        }
    }

    /// Create a key pair from an existing secret key
    pub fn from_secret_key(secret_key: SecretKey) -> Self {
        let secp = Secp256k1::new();
        let public_key = PublicKey::from_secret_key(&secp, &secret_key);
        Self {
            secret_key,
            public_key,
        }
    }

    /// Create a key pair from a hex-encoded private key (`0x` prefix optional)
    pub fn from_private_key_hex(hex_key: &str) -> Result<Self, KeyError> {
        let trimmed = hex_key.strip_prefix("0x").unwrap_or(hex_key);
        let bytes = hex::decode(trimmed).map_err(|_| KeyError::InvalidPrivateKey)?;
        let secret_key =
            SecretKey::from_slice(&bytes).map_err(|_| KeyError::InvalidPrivateKey)?;
        Ok(Self::from_secret_key(secret_key))
    }

    /// Get the private key as a hex string
    pub fn private_key_hex(&self) -> String {
        hex::encode(self.secret_key.secret_bytes())
    }

    /// Get the public key as a hex string (compressed format)
    pub fn public_key_hex(&self) -> String {
        hex::encode(self.public_key.serialize())
    }

    /// The signer identity for this key
    pub fn address(&self) -> Address {
        public_key_to_address(&self.public_key)
    }

    /// Sign a 32-byte digest, producing a recoverable (v, r, s) signature
    pub fn sign_digest(&self, digest: &[u8; 32]) -> Result<Signature, KeyError> {
        sign_digest(&self.secret_key, digest)
    }
}

impl std::fmt::Debug for KeyPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyPair")
            .field("address", &self.address())
            .finish_non_exhaustive()
    }
}

/// Convert a public key to a signer address
pub fn public_key_to_address(public_key: &PublicKey) -> Address {
    Address::from_uncompressed_pubkey(&public_key.serialize_uncompressed())
}

/// Parse a public key from hex string
pub fn public_key_from_hex(hex_key: &str) -> Result<PublicKey, KeyError> {
    let trimmed = hex_key.strip_prefix("0x").unwrap_or(hex_key);
    let bytes = hex::decode(trimmed).map_err(|_| KeyError::InvalidPublicKey)?;
    PublicKey::from_slice(&bytes).map_err(|_| KeyError::InvalidPublicKey)
}

/// Sign a digest with a secret key
///
/// The digest is signed as-is; callers hash the preimage first.
pub fn sign_digest(secret_key: &SecretKey, digest: &[u8; 32]) -> Result<Signature, KeyError> {
    let secp = Secp256k1::new();
    let message = Message::from_digest_slice(digest)?;
    let recoverable = secp.sign_ecdsa_recoverable(&message, secret_key);
    let (recovery_id, compact) = recoverable.serialize_compact();

    let mut r = [0u8; 32];
    let mut s = [0u8; 32];
    r.copy_from_slice(&compact[..32]);
    s.copy_from_slice(&compact[32..]);

    Ok(Signature {
        v: 27 + recovery_id.to_i32() as u8,
        r,
        s,
    })
}
