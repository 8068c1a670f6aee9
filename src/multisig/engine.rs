//! Multisig engine
//!
//! [`OfflineMultisig`] bundles the registry, the partial-signature
//! accumulator, and the dispatcher behind the submission entry points.
//! Each instance owns its state; nothing is shared between instances.

use crate::core::{hex_bytes, Address, Epoch, TxId};
use crate::crypto::{signatures_from_words, signatures_to_words, Signature};
use crate::multisig::accumulator::{PartialAccumulator, SubmitOutcome, TransactionRecord};
use crate::multisig::dispatcher::{ActionHandler, Dispatcher};
use crate::multisig::error::MultisigError;
use crate::multisig::registry::SignerRegistry;
use crate::multisig::signer_set::SignerSet;
use crate::multisig::verifier;
use serde::{Deserialize, Serialize};

/// Everything needed to execute a transaction on another instance
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignatureBundle {
    pub epoch: Epoch,
    pub txid: TxId,
    #[serde(with = "hex_bytes")]
    pub payload: Vec<u8>,
    pub signatures: Vec<Signature>,
}

impl SignatureBundle {
    /// Signatures as flat `[v, r, s]` words
    pub fn signature_words(&self) -> Vec<[u8; 32]> {
        signatures_to_words(&self.signatures)
    }

    /// Build a bundle from flat `[v, r, s]` words
    pub fn from_words(
        epoch: Epoch,
        txid: TxId,
        payload: Vec<u8>,
        words: &[[u8; 32]],
    ) -> Result<Self, MultisigError> {
        Ok(Self {
            epoch,
            txid,
            payload,
            signatures: signatures_from_words(words)?,
        })
    }
}

/// Off-chain signature multisig
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct OfflineMultisig<H = ()> {
    registry: SignerRegistry,
    accumulator: PartialAccumulator,
    dispatcher: Dispatcher<H>,
}

impl OfflineMultisig<()> {
    /// Standalone instance that only authorizes signer rotation
    pub fn new(signers: Vec<Address>) -> Result<Self, MultisigError> {
        Self::with_handler(signers, ())
    }
}

impl<H: ActionHandler> OfflineMultisig<H> {
    /// Instance whose extra actions are served by `handler`
    pub fn with_handler(signers: Vec<Address>, handler: H) -> Result<Self, MultisigError> {
        let registry = SignerRegistry::new(signers)?;
        log::info!(
            "Multisig created at epoch 0 ({})",
            registry.current().description()
        );
        Ok(Self {
            registry,
            accumulator: PartialAccumulator::new(),
            dispatcher: Dispatcher::new(handler),
        })
    }

    /// Submit one signature; the epoch comes from the existing record or the registry
    pub fn partial_execute(
        &mut self,
        txid: TxId,
        payload: &[u8],
        signature: Signature,
    ) -> Result<SubmitOutcome, MultisigError> {
        self.accumulator.submit(
            &mut self.registry,
            &mut self.dispatcher,
            None,
            txid,
            payload,
            signature,
        )
    }

    /// Submit one signature for an explicit epoch
    pub fn partial_execute_at(
        &mut self,
        epoch: Epoch,
        txid: TxId,
        payload: &[u8],
        signature: Signature,
    ) -> Result<SubmitOutcome, MultisigError> {
        self.accumulator.submit(
            &mut self.registry,
            &mut self.dispatcher,
            Some(epoch),
            txid,
            payload,
            signature,
        )
    }

    /// Verify a complete bundle and execute it in one call
    pub fn full_execute(
        &mut self,
        epoch: Epoch,
        txid: TxId,
        payload: &[u8],
        signatures: &[Signature],
    ) -> Result<Vec<Address>, MultisigError> {
        let signers = verifier::execute_full(
            &mut self.registry,
            &mut self.dispatcher,
            epoch,
            txid,
            payload,
            signatures,
        )?;
        let quorum = self
            .registry
            .signers_at(epoch)
            .map_or(signers.len(), SignerSet::quorum);
        self.accumulator
            .record_full_execution(txid, epoch, payload, quorum, &signers, signatures);
        Ok(signers)
    }

    /// Execute an exported bundle
    pub fn execute_bundle(
        &mut self,
        bundle: &SignatureBundle,
    ) -> Result<Vec<Address>, MultisigError> {
        self.full_execute(
            bundle.epoch,
            bundle.txid,
            &bundle.payload,
            &bundle.signatures,
        )
    }

    /// Export what has been collected for `txid`
    pub fn get_signatures(&self, txid: &TxId) -> Option<SignatureBundle> {
        self.accumulator.get(txid).map(|record| SignatureBundle {
            epoch: record.epoch,
            txid: record.txid,
            payload: record.payload.clone(),
            signatures: record.raw_signatures(),
        })
    }

    pub fn epoch(&self) -> Epoch {
        self.registry.epoch()
    }

    /// Number of epochs so far (current epoch + 1)
    pub fn epoch_count(&self) -> usize {
        self.registry.epoch_count()
    }

    pub fn is_signer(&self, address: &Address) -> bool {
        self.registry.is_signer(address)
    }

    pub fn signers(&self) -> &SignerSet {
        self.registry.current()
    }

    pub fn signers_at(&self, epoch: Epoch) -> Option<&SignerSet> {
        self.registry.signers_at(epoch)
    }

    pub fn quorum(&self) -> usize {
        self.registry.quorum()
    }

    pub fn record(&self, txid: &TxId) -> Option<&TransactionRecord> {
        self.accumulator.get(txid)
    }

    pub fn pending(&self) -> Vec<&TransactionRecord> {
        self.accumulator.pending()
    }

    pub fn is_executed(&self, txid: &TxId) -> bool {
        self.dispatcher.is_executed(txid)
    }

    pub fn executed_count(&self) -> usize {
        self.dispatcher.executed_count()
    }

    /// Drop partial records stranded by a signer rotation
    pub fn prune_stale(&mut self) -> usize {
        self.accumulator.prune_stale(self.registry.epoch())
    }

    pub fn handler(&self) -> &H {
        self.dispatcher.handler()
    }

    pub fn handler_mut(&mut self) -> &mut H {
        self.dispatcher.handler_mut()
    }
}
