//! Minimal ABI word codec for action payloads
//!
//! A payload is a 4-byte selector followed by 32-byte argument words.
//! Only the static shapes the built-in and bridge actions need are
//! supported: `uint256`, `address`, and a single trailing `address[]`.

use crate::core::Address;
use crate::crypto::keccak256;
use std::fmt;
use thiserror::Error;

/// Payload decoding failures
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AbiError {
    #[error("payload shorter than a selector ({0} bytes)")]
    MissingSelector(usize),
    #[error("argument data is {0} bytes, not a whole number of words")]
    Unaligned(usize),
    #[error("expected {expected} argument words, got {actual}")]
    WordCount { expected: usize, actual: usize },
    #[error("word {index} overflows {ty}")]
    Overflow { index: usize, ty: &'static str },
    #[error("word {index} is not a clean address")]
    DirtyAddress { index: usize },
    #[error("dynamic array offset {0} is not canonical")]
    BadOffset(u64),
}

/// Function selector: first four bytes of keccak256 of the signature text
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Selector(pub [u8; 4]);

impl Selector {
    pub fn from_signature(signature: &str) -> Self {
        let hash = keccak256(signature.as_bytes());
        Selector([hash[0], hash[1], hash[2], hash[3]])
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl fmt::Debug for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Selector({})", self)
    }
}

pub type Word = [u8; 32];

pub fn encode_u64(value: u64) -> Word {
    let mut word = [0u8; 32];
    word[24..].copy_from_slice(&value.to_be_bytes());
    word
}

pub fn encode_u128(value: u128) -> Word {
    let mut word = [0u8; 32];
    word[16..].copy_from_slice(&value.to_be_bytes());
    word
}

pub fn encode_address(address: &Address) -> Word {
    let mut word = [0u8; 32];
    word[12..].copy_from_slice(address.as_bytes());
    word
}

pub fn decode_u64(word: &Word, index: usize) -> Result<u64, AbiError> {
    if word[..24].iter().any(|&b| b != 0) {
        return Err(AbiError::Overflow { index, ty: "u64" });
    }
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&word[24..]);
    Ok(u64::from_be_bytes(bytes))
}

pub fn decode_u128(word: &Word, index: usize) -> Result<u128, AbiError> {
    if word[..16].iter().any(|&b| b != 0) {
        return Err(AbiError::Overflow { index, ty: "u128" });
    }
    let mut bytes = [0u8; 16];
    bytes.copy_from_slice(&word[16..]);
    Ok(u128::from_be_bytes(bytes))
}

pub fn decode_address(word: &Word, index: usize) -> Result<Address, AbiError> {
    if word[..12].iter().any(|&b| b != 0) {
        return Err(AbiError::DirtyAddress { index });
    }
    let mut bytes = [0u8; 20];
    bytes.copy_from_slice(&word[12..]);
    Ok(Address(bytes))
}

/// Assemble `selector || words`
pub fn encode_call(selector: Selector, words: &[Word]) -> Vec<u8> {
    let mut payload = Vec::with_capacity(4 + words.len() * 32);
    payload.extend_from_slice(&selector.0);
    for word in words {
        payload.extend_from_slice(word);
    }
    payload
}

/// Split a payload into its selector and argument words
pub fn decode_call(payload: &[u8]) -> Result<(Selector, Vec<Word>), AbiError> {
    if payload.len() < 4 {
        return Err(AbiError::MissingSelector(payload.len()));
    }
    let selector = Selector([payload[0], payload[1], payload[2], payload[3]]);
    let args = &payload[4..];
    if args.len() % 32 != 0 {
        return Err(AbiError::Unaligned(args.len()));
    }
    let words = args
        .chunks_exact(32)
        .map(|chunk| {
            let mut word = [0u8; 32];
            word.copy_from_slice(chunk);
            word
        })
        .collect();
    Ok((selector, words))
}

/// Encode `(head..., address[])` where the array is the last parameter
pub fn encode_with_address_array(head: &[Word], addresses: &[Address]) -> Vec<Word> {
    let offset = ((head.len() + 1) * 32) as u64;
    let mut words = Vec::with_capacity(head.len() + 2 + addresses.len());
    words.extend_from_slice(head);
    words.push(encode_u64(offset));
    words.push(encode_u64(addresses.len() as u64));
    words.extend(addresses.iter().map(encode_address));
    words
}

/// Inverse of [`encode_with_address_array`] for `head_len` static head words
pub fn decode_with_address_array(
    words: &[Word],
    head_len: usize,
) -> Result<(Vec<Word>, Vec<Address>), AbiError> {
    if words.len() < head_len + 2 {
        return Err(AbiError::WordCount {
            expected: head_len + 2,
            actual: words.len(),
        });
    }

    let offset = decode_u64(&words[head_len], head_len)?;
    if offset != ((head_len + 1) * 32) as u64 {
        return Err(AbiError::BadOffset(offset));
    }

    // Compare the untrusted length with what is present; never add it to an index
    let len = decode_u64(&words[head_len + 1], head_len + 1)?;
    let available = words.len() - head_len - 2;
    if len != available as u64 {
        return Err(AbiError::WordCount {
            expected: usize::try_from(len)
                .ok()
                .and_then(|len| len.checked_add(head_len + 2))
                .unwrap_or(usize::MAX),
            actual: words.len(),
        });
    }

    let addresses = words[head_len + 2..]
        .iter()
        .enumerate()
        .map(|(i, word)| decode_address(word, head_len + 2 + i))
        .collect::<Result<Vec<_>, _>>()?;

    Ok((words[..head_len].to_vec(), addresses))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_selector_known_value() {
        // transfer(address,uint256) is the canonical ERC-20 selector
        assert_eq!(
            Selector::from_signature("transfer(address,uint256)").0,
            [0xa9, 0x05, 0x9c, 0xbb]
        );
    }

    #[test]
    fn test_decode_call_rejects_short_and_unaligned() {
        assert_eq!(decode_call(&[1, 2]), Err(AbiError::MissingSelector(2)));
        assert_eq!(decode_call(&[1, 2, 3, 4, 5]), Err(AbiError::Unaligned(1)));

        let (selector, words) = decode_call(&[9, 9, 9, 9]).unwrap();
        assert_eq!(selector.0, [9, 9, 9, 9]);
        assert!(words.is_empty());
    }

    #[test]
    fn test_address_array_layout() {
        let addresses = vec![Address([1; 20]), Address([2; 20])];
        let words = encode_with_address_array(&[encode_u64(7)], &addresses);

        // head, offset, length, two elements
        assert_eq!(words.len(), 5);
        assert_eq!(decode_u64(&words[1], 1).unwrap(), 0x40);
        assert_eq!(decode_u64(&words[2], 2).unwrap(), 2);

        let (head, decoded) = decode_with_address_array(&words, 1).unwrap();
        assert_eq!(decode_u64(&head[0], 0).unwrap(), 7);
        assert_eq!(decoded, addresses);
    }

    #[test]
    fn test_address_array_rejects_malformed() {
        let addresses = vec![Address([1; 20])];
        let words = encode_with_address_array(&[encode_u64(1)], &addresses);

        let mut bad_offset = words.clone();
        bad_offset[1] = encode_u64(0x20);
        assert_eq!(
            decode_with_address_array(&bad_offset, 1),
            Err(AbiError::BadOffset(0x20))
        );

        let mut truncated = words.clone();
        truncated.pop();
        assert!(matches!(
            decode_with_address_array(&truncated, 1),
            Err(AbiError::WordCount { .. })
        ));

        let mut dirty = words;
        dirty[3][0] = 0xff;
        assert_eq!(
            decode_with_address_array(&dirty, 1),
            Err(AbiError::DirtyAddress { index: 3 })
        );
    }

    #[test]
    fn test_address_array_rejects_oversized_length() {
        let words = vec![encode_u64(1), encode_u64(0x40), encode_u64(u64::MAX)];
        assert_eq!(
            decode_with_address_array(&words, 1),
            Err(AbiError::WordCount {
                expected: usize::MAX,
                actual: 3,
            })
        );
    }

    #[test]
    fn test_integer_overflow_detection() {
        let mut word = encode_u128(u128::MAX);
        assert_eq!(decode_u128(&word, 0).unwrap(), u128::MAX);
        assert!(decode_u64(&word, 0).is_err());
        word[0] = 1;
        assert!(decode_u128(&word, 0).is_err());
    }
}
