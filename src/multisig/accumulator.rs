//! Partial-execution accumulator
//!
//! Collects one signature per call for a transaction id until the signer
//! set recorded for that transaction reaches quorum, then dispatches the
//! payload. A submission either lands completely or not at all.

use crate::core::{hex_bytes, Address, Epoch, TxId};
use crate::crypto::{recover_signer, Signature};
use crate::multisig::dispatcher::{ActionHandler, Dispatcher};
use crate::multisig::error::MultisigError;
use crate::multisig::message::message_digest;
use crate::multisig::registry::SignerRegistry;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A single signature from an authorized signer
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectedSignature {
    /// Recovered signer identity
    pub signer: Address,
    pub signature: Signature,
    /// When the signature was accepted
    pub signed_at: DateTime<Utc>,
}

/// Status of a transaction record
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum RecordStatus {
    /// Waiting for more signatures
    Collecting,
    /// Quorum reached and the action applied
    Executed,
}

/// Signatures collected so far for one transaction id
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionRecord {
    pub txid: TxId,
    /// Epoch fixed at first submission
    pub epoch: Epoch,
    #[serde(with = "hex_bytes")]
    pub payload: Vec<u8>,
    pub signatures: Vec<CollectedSignature>,
    /// Quorum of the signer set at `epoch`
    pub quorum: usize,
    pub status: RecordStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TransactionRecord {
    fn new(txid: TxId, epoch: Epoch, payload: Vec<u8>, quorum: usize) -> Self {
        let now = Utc::now();
        Self {
            txid,
            epoch,
            payload,
            signatures: Vec::new(),
            quorum,
            status: RecordStatus::Collecting,
            created_at: now,
            updated_at: now,
        }
    }

    /// Get number of signatures collected
    pub fn signature_count(&self) -> usize {
        self.signatures.len()
    }

    pub fn is_executed(&self) -> bool {
        self.status == RecordStatus::Executed
    }

    pub fn has_signed(&self, signer: &Address) -> bool {
        self.signatures.iter().any(|s| &s.signer == signer)
    }

    /// Get signers who have already signed, in submission order
    pub fn signed_by(&self) -> Vec<Address> {
        self.signatures.iter().map(|s| s.signer).collect()
    }

    /// Raw signatures in submission order
    pub fn raw_signatures(&self) -> Vec<Signature> {
        self.signatures.iter().map(|s| s.signature).collect()
    }

    fn push(&mut self, signer: Address, signature: Signature) {
        let now = Utc::now();
        self.signatures.push(CollectedSignature {
            signer,
            signature,
            signed_at: now,
        });
        self.updated_at = now;
    }

    fn mark_executed(&mut self) {
        self.status = RecordStatus::Executed;
        self.updated_at = Utc::now();
    }
}

/// Result of an accepted partial submission
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// Signature stored; quorum not reached yet
    Collected { count: usize, quorum: usize },
    /// This signature completed quorum and the action ran
    Executed { count: usize },
}

/// Per-transaction signature store
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartialAccumulator {
    records: BTreeMap<TxId, TransactionRecord>,
}

impl PartialAccumulator {
    pub fn new() -> Self {
        Self {
            records: BTreeMap::new(),
        }
    }

    /// Add one signature for `txid`, executing on quorum
    ///
    /// `pinned_epoch` lets the caller assert which epoch it signed for.
    pub fn submit<H: ActionHandler>(
        &mut self,
        registry: &mut SignerRegistry,
        dispatcher: &mut Dispatcher<H>,
        pinned_epoch: Option<Epoch>,
        txid: TxId,
        payload: &[u8],
        signature: Signature,
    ) -> Result<SubmitOutcome, MultisigError> {
        let existing = self.records.get(&txid);

        let epoch = match existing {
            Some(record) => record.epoch,
            None => {
                let current = registry.epoch();
                if let Some(pinned) = pinned_epoch {
                    if pinned != current {
                        return Err(MultisigError::StaleEpoch {
                            expected: current,
                            got: pinned,
                        });
                    }
                }
                current
            }
        };

        let digest = message_digest(epoch, &txid, payload);
        let signer = recover_signer(&digest, &signature)?;

        let set = registry
            .signers_at(epoch)
            .ok_or(MultisigError::StaleEpoch {
                expected: registry.epoch(),
                got: epoch,
            })?;
        if !set.contains(&signer) {
            return Err(MultisigError::UnauthorizedSigner(signer));
        }
        let quorum = set.quorum();

        if let Some(record) = existing {
            if record.has_signed(&signer) {
                return Err(MultisigError::DuplicateSignature(signer));
            }
            if record.payload != payload || pinned_epoch.is_some_and(|e| e != record.epoch) {
                return Err(MultisigError::PayloadMismatch(txid));
            }
            if record.is_executed() {
                return Err(MultisigError::AlreadyExecuted(txid));
            }
        }
        dispatcher.ensure_not_executed(&txid)?;
        registry.ensure_current(epoch)?;

        let action = dispatcher.decode(payload)?;
        dispatcher.check(registry, &action)?;

        let count = existing.map_or(0, |record| record.signature_count()) + 1;
        let reaches_quorum = count >= quorum;
        if reaches_quorum {
            dispatcher.dispatch(registry, txid, action)?;
        }

        let record = self
            .records
            .entry(txid)
            .or_insert_with(|| TransactionRecord::new(txid, epoch, payload.to_vec(), quorum));
        record.push(signer, signature);

        if reaches_quorum {
            record.mark_executed();
            Ok(SubmitOutcome::Executed { count })
        } else {
            log::debug!(
                "Collected signature {}/{} from {} for {}",
                count,
                quorum,
                signer,
                txid
            );
            Ok(SubmitOutcome::Collected { count, quorum })
        }
    }

    /// Get a record by transaction id
    pub fn get(&self, txid: &TxId) -> Option<&TransactionRecord> {
        self.records.get(txid)
    }

    /// Records still collecting signatures
    pub fn pending(&self) -> Vec<&TransactionRecord> {
        self.records.values().filter(|r| !r.is_executed()).collect()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Record a bundle that executed through the full path
    ///
    /// Signers missing from an existing record are appended so the record
    /// exports a quorum bundle and later resubmissions see duplicates. A
    /// record opened for a different payload or epoch is replaced.
    pub(crate) fn record_full_execution(
        &mut self,
        txid: TxId,
        epoch: Epoch,
        payload: &[u8],
        quorum: usize,
        signers: &[Address],
        signatures: &[Signature],
    ) {
        let record = self
            .records
            .entry(txid)
            .or_insert_with(|| TransactionRecord::new(txid, epoch, payload.to_vec(), quorum));
        if record.payload != payload || record.epoch != epoch {
            *record = TransactionRecord::new(txid, epoch, payload.to_vec(), quorum);
        }
        for (signer, signature) in signers.iter().zip(signatures) {
            if !record.has_signed(signer) {
                record.push(*signer, *signature);
            }
        }
        record.mark_executed();
    }

    /// Drop unexecuted records opened under an epoch that is no longer current
    pub fn prune_stale(&mut self, current_epoch: Epoch) -> usize {
        let before = self.records.len();
        self.records
            .retain(|_, record| record.is_executed() || record.epoch == current_epoch);
        let removed = before - self.records.len();
        if removed > 0 {
            log::warn!("Pruned {} stale transaction record(s)", removed);
        }
        removed
    }
}
