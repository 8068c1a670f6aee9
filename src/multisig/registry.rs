//! Epoch/signer registry
//!
//! Holds one signer set per epoch. The last entry is the active set; the
//! earlier ones stay readable so signatures collected under an older
//! epoch can still be attributed.

use crate::core::{Address, Epoch};
use crate::multisig::error::MultisigError;
use crate::multisig::signer_set::SignerSet;
use serde::{Deserialize, Serialize};

/// Signer sets indexed by epoch
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<SignerSet>", into = "Vec<SignerSet>")]
pub struct SignerRegistry {
    epochs: Vec<SignerSet>,
}

impl SignerRegistry {
    /// Create a registry at epoch 0 with the given signers
    pub fn new(signers: Vec<Address>) -> Result<Self, MultisigError> {
        Ok(Self {
            epochs: vec![SignerSet::new(signers)?],
        })
    }

    /// Current epoch counter
    pub fn epoch(&self) -> Epoch {
        (self.epochs.len() - 1) as Epoch
    }

    /// Number of epochs so far (current epoch + 1)
    pub fn epoch_count(&self) -> usize {
        self.epochs.len()
    }

    /// The active signer set
    pub fn current(&self) -> &SignerSet {
        &self.epochs[self.epochs.len() - 1]
    }

    /// Signer set that was active at `epoch`
    pub fn signers_at(&self, epoch: Epoch) -> Option<&SignerSet> {
        usize::try_from(epoch)
            .ok()
            .and_then(|index| self.epochs.get(index))
    }

    pub fn is_signer(&self, address: &Address) -> bool {
        self.current().contains(address)
    }

    pub fn quorum(&self) -> usize {
        self.current().quorum()
    }

    /// Check that `epoch` is the active one
    pub fn ensure_current(&self, epoch: Epoch) -> Result<(), MultisigError> {
        let current = self.epoch();
        if epoch != current {
            return Err(MultisigError::StaleEpoch {
                expected: current,
                got: epoch,
            });
        }
        Ok(())
    }

    /// Validate a rotation without applying it
    pub(crate) fn prepare_change(
        &self,
        new_epoch: Epoch,
        signers: &[Address],
    ) -> Result<SignerSet, MultisigError> {
        let expected = self.epoch() + 1;
        if new_epoch != expected {
            return Err(MultisigError::StaleEpoch {
                expected,
                got: new_epoch,
            });
        }
        SignerSet::new(signers.to_vec())
    }

    /// Replace the signer set and advance the epoch by one
    ///
    /// Only reachable through a quorum-authorized rotation payload.
    pub(crate) fn change_signers(
        &mut self,
        new_epoch: Epoch,
        signers: &[Address],
    ) -> Result<(), MultisigError> {
        let set = self.prepare_change(new_epoch, signers)?;
        log::info!(
            "Signer set rotated to epoch {} ({})",
            new_epoch,
            set.description()
        );
        self.epochs.push(set);
        Ok(())
    }
}

impl TryFrom<Vec<SignerSet>> for SignerRegistry {
    type Error = MultisigError;

    fn try_from(epochs: Vec<SignerSet>) -> Result<Self, Self::Error> {
        if epochs.is_empty() {
            return Err(MultisigError::InvalidSignerSet(
                "registry needs at least one epoch".to_string(),
            ));
        }
        Ok(Self { epochs })
    }
}

impl From<SignerRegistry> for Vec<SignerSet> {
    fn from(registry: SignerRegistry) -> Self {
        registry.epochs
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(byte: u8) -> Address {
        Address([byte; 20])
    }

    fn registry() -> SignerRegistry {
        SignerRegistry::new(vec![addr(1), addr(2), addr(3)]).unwrap()
    }

    #[test]
    fn test_initial_state() {
        let registry = registry();
        assert_eq!(registry.epoch(), 0);
        assert_eq!(registry.epoch_count(), 1);
        assert_eq!(registry.quorum(), 2);
        assert!(registry.is_signer(&addr(1)));
        assert!(!registry.is_signer(&addr(4)));
    }

    #[test]
    fn test_change_signers_advances_epoch() {
        let mut registry = registry();
        registry
            .change_signers(1, &[addr(4), addr(1), addr(2), addr(3)])
            .unwrap();

        assert_eq!(registry.epoch(), 1);
        assert!(registry.is_signer(&addr(4)));
        assert_eq!(registry.quorum(), 3);
        // History is retained
        assert!(!registry.signers_at(0).unwrap().contains(&addr(4)));
        assert!(registry.signers_at(1).unwrap().contains(&addr(4)));
        assert!(registry.signers_at(2).is_none());
    }

    #[test]
    fn test_change_signers_requires_next_epoch() {
        let mut registry = registry();
        assert_eq!(
            registry.change_signers(0, &[addr(4)]),
            Err(MultisigError::StaleEpoch { expected: 1, got: 0 })
        );
        assert_eq!(
            registry.change_signers(2, &[addr(4)]),
            Err(MultisigError::StaleEpoch { expected: 1, got: 2 })
        );
        assert_eq!(registry.epoch(), 0);
    }

    #[test]
    fn test_change_signers_rejects_bad_sets() {
        let mut registry = registry();
        assert!(matches!(
            registry.change_signers(1, &[]),
            Err(MultisigError::InvalidSignerSet(_))
        ));
        assert!(matches!(
            registry.change_signers(1, &[addr(5), addr(5)]),
            Err(MultisigError::InvalidSignerSet(_))
        ));
        assert_eq!(registry.epoch(), 0);
        assert!(registry.is_signer(&addr(1)));
    }

    #[test]
    fn test_ensure_current() {
        let registry = registry();
        assert!(registry.ensure_current(0).is_ok());
        assert_eq!(
            registry.ensure_current(3),
            Err(MultisigError::StaleEpoch { expected: 0, got: 3 })
        );
    }

    #[test]
    fn test_serde_roundtrip_keeps_history() {
        let mut registry = registry();
        registry.change_signers(1, &[addr(9)]).unwrap();

        let json = serde_json::to_string(&registry).unwrap();
        let back: SignerRegistry = serde_json::from_str(&json).unwrap();
        assert_eq!(back, registry);
        assert!(serde_json::from_str::<SignerRegistry>("[]").is_err());
    }
}
