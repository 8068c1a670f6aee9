//! Action dispatch
//!
//! Maps an authorized payload to the privileged operation it encodes and
//! applies it at most once per transaction id. Signer rotation is built
//! in; every other action belongs to a consumer-supplied [`ActionHandler`].

use crate::core::{Address, Epoch, TxId};
use crate::multisig::abi::{self, AbiError, Selector, Word};
use crate::multisig::error::MultisigError;
use crate::multisig::registry::SignerRegistry;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::convert::Infallible;
use std::fmt;

/// ABI signature of the built-in rotation action
pub const CHANGE_SIGNERS_SIGNATURE: &str = "changeSigners(uint256,address[])";

/// Replace the signer set, moving to `epoch`
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChangeSigners {
    pub epoch: Epoch,
    pub signers: Vec<Address>,
}

impl ChangeSigners {
    pub fn selector() -> Selector {
        Selector::from_signature(CHANGE_SIGNERS_SIGNATURE)
    }

    /// Encode as a payload; signers are sorted canonically first
    pub fn encode(&self) -> Vec<u8> {
        let mut signers = self.signers.clone();
        signers.sort();
        let words = abi::encode_with_address_array(&[abi::encode_u64(self.epoch)], &signers);
        abi::encode_call(Self::selector(), &words)
    }

    fn decode_args(words: &[Word]) -> Result<Self, AbiError> {
        let (head, signers) = abi::decode_with_address_array(words, 1)?;
        Ok(Self {
            epoch: abi::decode_u64(&head[0], 0)?,
            signers,
        })
    }
}

/// Build a rotation payload
pub fn change_signers_payload(epoch: Epoch, signers: &[Address]) -> Vec<u8> {
    ChangeSigners {
        epoch,
        signers: signers.to_vec(),
    }
    .encode()
}

/// A decoded, not yet applied action
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Action<A> {
    ChangeSigners(ChangeSigners),
    External(A),
}

/// Consumer-defined privileged operations
///
/// `apply` must either succeed completely or leave the handler untouched.
pub trait ActionHandler {
    type Action: fmt::Debug;

    /// Decode a call addressed to this handler; `Ok(None)` when the
    /// selector is not one it serves
    fn decode(&self, selector: Selector, args: &[Word])
        -> Result<Option<Self::Action>, AbiError>;

    fn apply(&mut self, action: Self::Action) -> Result<(), MultisigError>;
}

/// A standalone registry only knows signer rotation
impl ActionHandler for () {
    type Action = Infallible;

    fn decode(&self, _: Selector, _: &[Word]) -> Result<Option<Self::Action>, AbiError> {
        Ok(None)
    }

    fn apply(&mut self, action: Self::Action) -> Result<(), MultisigError> {
        match action {}
    }
}

/// Routes actions and remembers which transactions have executed
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Dispatcher<H> {
    handler: H,
    executed: BTreeSet<TxId>,
}

impl<H: ActionHandler> Dispatcher<H> {
    pub fn new(handler: H) -> Self {
        Self {
            handler,
            executed: BTreeSet::new(),
        }
    }

    /// Decode a payload into an action without applying it
    pub fn decode(&self, payload: &[u8]) -> Result<Action<H::Action>, MultisigError> {
        let unknown = |e: AbiError| MultisigError::UnknownAction(e.to_string());
        let (selector, args) = abi::decode_call(payload).map_err(unknown)?;

        if selector == ChangeSigners::selector() {
            return ChangeSigners::decode_args(&args)
                .map(Action::ChangeSigners)
                .map_err(unknown);
        }

        match self.handler.decode(selector, &args).map_err(unknown)? {
            Some(action) => Ok(Action::External(action)),
            None => Err(MultisigError::UnknownAction(format!(
                "no action for selector {}",
                selector
            ))),
        }
    }

    pub fn is_executed(&self, txid: &TxId) -> bool {
        self.executed.contains(txid)
    }

    pub fn ensure_not_executed(&self, txid: &TxId) -> Result<(), MultisigError> {
        if self.is_executed(txid) {
            return Err(MultisigError::AlreadyExecuted(*txid));
        }
        Ok(())
    }

    /// Check an action can be applied against the current registry
    pub fn check(
        &self,
        registry: &SignerRegistry,
        action: &Action<H::Action>,
    ) -> Result<(), MultisigError> {
        if let Action::ChangeSigners(change) = action {
            registry.prepare_change(change.epoch, &change.signers)?;
        }
        Ok(())
    }

    /// Apply an authorized action exactly once for `txid`
    pub(crate) fn dispatch(
        &mut self,
        registry: &mut SignerRegistry,
        txid: TxId,
        action: Action<H::Action>,
    ) -> Result<(), MultisigError> {
        self.ensure_not_executed(&txid)?;

        match action {
            Action::ChangeSigners(change) => {
                registry.change_signers(change.epoch, &change.signers)?
            }
            Action::External(action) => {
                log::debug!("Applying external action {:?}", action);
                self.handler.apply(action)?
            }
        }

        self.executed.insert(txid);
        log::info!("Executed transaction {}", txid);
        Ok(())
    }

    pub fn executed_count(&self) -> usize {
        self.executed.len()
    }

    pub fn handler(&self) -> &H {
        &self.handler
    }

    pub fn handler_mut(&mut self) -> &mut H {
        &mut self.handler
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(byte: u8) -> Address {
        Address([byte; 20])
    }

    #[test]
    fn test_change_signers_payload_roundtrip() {
        let payload = change_signers_payload(1, &[addr(3), addr(1), addr(2)]);
        let dispatcher = Dispatcher::new(());

        let action = dispatcher.decode(&payload).unwrap();
        assert_eq!(
            action,
            Action::ChangeSigners(ChangeSigners {
                epoch: 1,
                signers: vec![addr(1), addr(2), addr(3)],
            })
        );
    }

    #[test]
    fn test_payload_layout() {
        let payload = change_signers_payload(1, &[addr(1), addr(2)]);
        // selector + epoch + offset + length + 2 addresses
        assert_eq!(payload.len(), 4 + 5 * 32);
        assert_eq!(&payload[..4], &ChangeSigners::selector().0);
        assert_eq!(payload[4 + 31], 1);
        assert_eq!(payload[4 + 32 + 31], 0x40);
    }

    #[test]
    fn test_unknown_selector_rejected() {
        let dispatcher = Dispatcher::new(());
        let payload = abi::encode_call(Selector::from_signature("drain()"), &[]);
        assert!(matches!(
            dispatcher.decode(&payload),
            Err(MultisigError::UnknownAction(_))
        ));
        assert!(matches!(
            dispatcher.decode(&[0xde, 0xad]),
            Err(MultisigError::UnknownAction(_))
        ));
    }

    #[test]
    fn test_malformed_rotation_rejected() {
        let dispatcher = Dispatcher::new(());
        let mut payload = change_signers_payload(1, &[addr(1)]);
        payload.truncate(payload.len() - 1);
        assert!(matches!(
            dispatcher.decode(&payload),
            Err(MultisigError::UnknownAction(_))
        ));
    }

    #[test]
    fn test_dispatch_is_exactly_once() {
        let mut registry = SignerRegistry::new(vec![addr(1), addr(2), addr(3)]).unwrap();
        let mut dispatcher = Dispatcher::new(());
        let txid = TxId::from_label("rotate");

        let action = dispatcher
            .decode(&change_signers_payload(1, &[addr(4)]))
            .unwrap();
        dispatcher
            .dispatch(&mut registry, txid, action.clone())
            .unwrap();

        assert!(dispatcher.is_executed(&txid));
        assert_eq!(registry.epoch(), 1);
        assert_eq!(
            dispatcher.dispatch(&mut registry, txid, action),
            Err(MultisigError::AlreadyExecuted(txid))
        );
        assert_eq!(registry.epoch(), 1);
    }

    #[test]
    fn test_failed_dispatch_does_not_consume_txid() {
        let mut registry = SignerRegistry::new(vec![addr(1)]).unwrap();
        let mut dispatcher = Dispatcher::new(());
        let txid = TxId::from_label("skip");

        let action = dispatcher
            .decode(&change_signers_payload(5, &[addr(2)]))
            .unwrap();
        assert!(dispatcher.check(&registry, &action).is_err());
        assert_eq!(
            dispatcher.dispatch(&mut registry, txid, action),
            Err(MultisigError::StaleEpoch { expected: 1, got: 5 })
        );
        assert!(!dispatcher.is_executed(&txid));
    }
}
