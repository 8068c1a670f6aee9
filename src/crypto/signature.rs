//! Recoverable ECDSA signatures and signer recovery
//!
//! Domain of [`recover_signer`]:
//! - `v` in {0, 1, 27, 28}, normalized to {27, 28}
//! - `r` and `s` in `[1, n-1]` for the secp256k1 group order `n`
//!
//! Anything outside that domain is rejected instead of recovered.

use crate::core::Address;
use secp256k1::ecdsa::{RecoverableSignature, RecoveryId};
use secp256k1::{Message, Secp256k1};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// secp256k1 group order n
const SECP256K1_ORDER: [u8; 32] = [
    0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFE,
    0xBA, 0xAE, 0xDC, 0xE6, 0xAF, 0x48, 0xA0, 0x3B, 0xBF, 0xD2, 0x5E, 0x8C, 0xD0, 0x36, 0x41, 0x41,
];

/// Why a signature fell outside the recoverable domain
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SignatureFormatError {
    #[error("recovery id {0} not in {{0, 1, 27, 28}}")]
    InvalidRecoveryId(u8),
    #[error("r is zero or not below the curve order")]
    InvalidR,
    #[error("s is zero or not below the curve order")]
    InvalidS,
    #[error("expected {expected} bytes, got {actual}")]
    InvalidLength { expected: usize, actual: usize },
    #[error("malformed signature word: {0}")]
    MalformedWord(String),
    #[error("public key recovery failed")]
    RecoveryFailed,
}

/// A recoverable signature over one message digest
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Signature {
    pub v: u8,
    #[serde(with = "hex_word")]
    pub r: [u8; 32],
    #[serde(with = "hex_word")]
    pub s: [u8; 32],
}

impl Signature {
    /// Parse the 65-byte `r || s || v` form
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, SignatureFormatError> {
        if bytes.len() != 65 {
            return Err(SignatureFormatError::InvalidLength {
                expected: 65,
                actual: bytes.len(),
            });
        }
        let mut r = [0u8; 32];
        let mut s = [0u8; 32];
        r.copy_from_slice(&bytes[..32]);
        s.copy_from_slice(&bytes[32..64]);
        Ok(Self { v: bytes[64], r, s })
    }

    /// Parse the 65-byte form from hex (`0x` prefix optional)
    pub fn from_hex(text: &str) -> Result<Self, SignatureFormatError> {
        let trimmed = text.strip_prefix("0x").unwrap_or(text);
        let bytes = hex::decode(trimmed)
            .map_err(|e| SignatureFormatError::MalformedWord(e.to_string()))?;
        Self::from_bytes(&bytes)
    }

    /// Serialize as `r || s || v`
    pub fn to_bytes(&self) -> [u8; 65] {
        let mut out = [0u8; 65];
        out[..32].copy_from_slice(&self.r);
        out[32..64].copy_from_slice(&self.s);
        out[64] = self.v;
        out
    }

    pub fn to_hex(&self) -> String {
        format!("0x{}", hex::encode(self.to_bytes()))
    }

    /// The three-word `[v, r, s]` form, v left-padded to 32 bytes
    pub fn to_words(&self) -> [[u8; 32]; 3] {
        let mut v = [0u8; 32];
        v[31] = self.v;
        [v, self.r, self.s]
    }

    /// Recovery id normalized to {27, 28}
    pub fn normalized_v(&self) -> Result<u8, SignatureFormatError> {
        match self.v {
            0 | 1 => Ok(self.v + 27),
            27 | 28 => Ok(self.v),
            other => Err(SignatureFormatError::InvalidRecoveryId(other)),
        }
    }

    /// Check the signature lies inside the recoverable domain
    pub fn validate(&self) -> Result<(), SignatureFormatError> {
        self.normalized_v()?;
        if !is_valid_scalar(&self.r) {
            return Err(SignatureFormatError::InvalidR);
        }
        if !is_valid_scalar(&self.s) {
            return Err(SignatureFormatError::InvalidS);
        }
        Ok(())
    }
}

/// Flatten signatures into consecutive `[v, r, s]` words
pub fn signatures_to_words(signatures: &[Signature]) -> Vec<[u8; 32]> {
    signatures.iter().flat_map(|sig| sig.to_words()).collect()
}

/// Rebuild signatures from consecutive `[v, r, s]` words
pub fn signatures_from_words(words: &[[u8; 32]]) -> Result<Vec<Signature>, SignatureFormatError> {
    if words.len() % 3 != 0 {
        return Err(SignatureFormatError::MalformedWord(format!(
            "{} words is not a multiple of 3",
            words.len()
        )));
    }

    words
        .chunks_exact(3)
        .map(|chunk| {
            let v_word = &chunk[0];
            if v_word[..31].iter().any(|&b| b != 0) {
                return Err(SignatureFormatError::MalformedWord(
                    "v word has high bytes set".to_string(),
                ));
            }
            Ok(Signature {
                v: v_word[31],
                r: chunk[1],
                s: chunk[2],
            })
        })
        .collect()
}

/// Recover the signer identity that produced `signature` over `digest`
pub fn recover_signer(
    digest: &[u8; 32],
    signature: &Signature,
) -> Result<Address, SignatureFormatError> {
    signature.validate()?;
    let v = signature.normalized_v()?;

    let recovery_id = RecoveryId::from_i32(i32::from(v - 27))
        .map_err(|_| SignatureFormatError::InvalidRecoveryId(signature.v))?;

    let mut compact = [0u8; 64];
    compact[..32].copy_from_slice(&signature.r);
    compact[32..].copy_from_slice(&signature.s);

    let recoverable = RecoverableSignature::from_compact(&compact, recovery_id)
        .map_err(|_| SignatureFormatError::RecoveryFailed)?;
    let message =
        Message::from_digest_slice(digest).map_err(|_| SignatureFormatError::RecoveryFailed)?;

    let secp = Secp256k1::verification_only();
    let public_key = secp
        .recover_ecdsa(&message, &recoverable)
        .map_err(|_| SignatureFormatError::RecoveryFailed)?;

    Ok(Address::from_uncompressed_pubkey(
        &public_key.serialize_uncompressed(),
    ))
}

/// Scalar must be non-zero and strictly below the group order.
/// Big-endian arrays compare lexicographically in numeric order.
fn is_valid_scalar(scalar: &[u8; 32]) -> bool {
    scalar.iter().any(|&b| b != 0) && scalar < &SECP256K1_ORDER
}

mod hex_word {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(word: &[u8; 32], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&format!("0x{}", hex::encode(word)))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<[u8; 32], D::Error> {
        let text = String::deserialize(deserializer)?;
        let trimmed = text.strip_prefix("0x").unwrap_or(&text);
        let bytes = hex::decode(trimmed).map_err(serde::de::Error::custom)?;
        <[u8; 32]>::try_from(bytes.as_slice())
            .map_err(|_| serde::de::Error::invalid_length(bytes.len(), &"32 bytes"))
    }
}
