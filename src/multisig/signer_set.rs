//! Canonical signer sets
//!
//! A signer set is non-empty, duplicate-free, and stored in ascending
//! byte order, so two sets built from the same members compare equal
//! and encode identically regardless of input order.

use crate::core::Address;
use crate::multisig::error::MultisigError;
use serde::{Deserialize, Serialize};

/// An ordered, unique set of authorized signers
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Address>", into = "Vec<Address>")]
pub struct SignerSet {
    signers: Vec<Address>,
}

impl SignerSet {
    /// Build a signer set, sorting members canonically
    ///
    /// # Errors
    /// Returns `InvalidSignerSet` if the list is empty or holds a duplicate
    pub fn new(mut signers: Vec<Address>) -> Result<Self, MultisigError> {
        if signers.is_empty() {
            return Err(MultisigError::InvalidSignerSet(
                "signer set must not be empty".to_string(),
            ));
        }

        signers.sort();
        if let Some(pair) = signers.windows(2).find(|pair| pair[0] == pair[1]) {
            return Err(MultisigError::InvalidSignerSet(format!(
                "duplicate signer {}",
                pair[0]
            )));
        }

        Ok(Self { signers })
    }

    pub fn contains(&self, address: &Address) -> bool {
        self.signers.binary_search(address).is_ok()
    }

    pub fn len(&self) -> usize {
        self.signers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.signers.is_empty()
    }

    /// Majority quorum: floor(n/2) + 1
    pub fn quorum(&self) -> usize {
        self.signers.len() / 2 + 1
    }

    pub fn as_slice(&self) -> &[Address] {
        &self.signers
    }

    pub fn iter(&self) -> impl Iterator<Item = &Address> {
        self.signers.iter()
    }

    /// Get description like "2-of-3"
    pub fn description(&self) -> String {
        format!("{}-of-{}", self.quorum(), self.signers.len())
    }
}

impl TryFrom<Vec<Address>> for SignerSet {
    type Error = MultisigError;

    fn try_from(signers: Vec<Address>) -> Result<Self, Self::Error> {
        Self::new(signers)
    }
}

impl From<SignerSet> for Vec<Address> {
    fn from(set: SignerSet) -> Self {
        set.signers
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(byte: u8) -> Address {
        Address([byte; 20])
    }

    #[test]
    fn test_set_is_sorted() {
        let set = SignerSet::new(vec![addr(3), addr(1), addr(2)]).unwrap();
        assert_eq!(set.as_slice(), &[addr(1), addr(2), addr(3)]);
        assert_eq!(set, SignerSet::new(vec![addr(2), addr(3), addr(1)]).unwrap());
    }

    #[test]
    fn test_set_validation() {
        assert!(matches!(
            SignerSet::new(vec![]),
            Err(MultisigError::InvalidSignerSet(_))
        ));
        assert!(matches!(
            SignerSet::new(vec![addr(1), addr(2), addr(1)]),
            Err(MultisigError::InvalidSignerSet(_))
        ));
    }

    #[test]
    fn test_quorum_is_majority() {
        let quorum = |n: u8| SignerSet::new((1..=n).map(addr).collect()).unwrap().quorum();
        assert_eq!(quorum(1), 1);
        assert_eq!(quorum(2), 2);
        assert_eq!(quorum(3), 2);
        assert_eq!(quorum(4), 3);
        assert_eq!(quorum(5), 3);
        assert_eq!(quorum(10), 6);
    }

    #[test]
    fn test_membership_and_description() {
        let set = SignerSet::new(vec![addr(1), addr(2), addr(3)]).unwrap();
        assert!(set.contains(&addr(2)));
        assert!(!set.contains(&addr(4)));
        assert_eq!(set.description(), "2-of-3");
    }

    #[test]
    fn test_deserialize_enforces_invariants() {
        let json = serde_json::to_string(&vec![addr(1), addr(1)]).unwrap();
        assert!(serde_json::from_str::<SignerSet>(&json).is_err());

        let json = serde_json::to_string(&vec![addr(2), addr(1)]).unwrap();
        let set: SignerSet = serde_json::from_str(&json).unwrap();
        assert_eq!(set.as_slice(), &[addr(1), addr(2)]);
    }
}
