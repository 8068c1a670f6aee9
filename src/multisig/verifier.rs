//! Full-execution verifier
//!
//! Checks a complete signature bundle in one pass and dispatches it. No
//! intermediate state is stored: either the bundle reaches quorum and the
//! action runs, or nothing changes.

use crate::core::{Address, Epoch, TxId};
use crate::crypto::{recover_signer, Signature};
use crate::multisig::dispatcher::{ActionHandler, Dispatcher};
use crate::multisig::error::MultisigError;
use crate::multisig::message::message_digest;
use crate::multisig::registry::SignerRegistry;
use crate::multisig::signer_set::SignerSet;
use std::collections::BTreeSet;

/// Recover and vet every signer in a bundle against `set`
///
/// Returns the recovered signers in bundle order.
pub fn verify_quorum(
    set: &SignerSet,
    digest: &[u8; 32],
    signatures: &[Signature],
) -> Result<Vec<Address>, MultisigError> {
    let mut seen = BTreeSet::new();
    let mut signers = Vec::with_capacity(signatures.len());

    for signature in signatures {
        let signer = recover_signer(digest, signature)?;
        if !set.contains(&signer) {
            return Err(MultisigError::UnauthorizedSigner(signer));
        }
        if !seen.insert(signer) {
            return Err(MultisigError::DuplicateSignature(signer));
        }
        signers.push(signer);
    }

    let need = set.quorum();
    if signers.len() < need {
        return Err(MultisigError::InsufficientSignatures {
            have: signers.len(),
            need,
        });
    }

    Ok(signers)
}

/// Verify a bundle for `(epoch, txid, payload)` and apply it
///
/// The epoch is checked against this registry's own state, so a bundle
/// from another instance only applies when both share epoch and signers.
pub fn execute_full<H: ActionHandler>(
    registry: &mut SignerRegistry,
    dispatcher: &mut Dispatcher<H>,
    epoch: Epoch,
    txid: TxId,
    payload: &[u8],
    signatures: &[Signature],
) -> Result<Vec<Address>, MultisigError> {
    dispatcher.ensure_not_executed(&txid)?;
    registry.ensure_current(epoch)?;

    let digest = message_digest(epoch, &txid, payload);
    let signers = verify_quorum(registry.current(), &digest, signatures)?;

    let action = dispatcher.decode(payload)?;
    dispatcher.dispatch(registry, txid, action)?;

    Ok(signers)
}
