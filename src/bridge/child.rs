//! Child side of the bridge: wrapped value is minted here
//!
//! Minting is only reachable through a quorum-authorized `mint` payload
//! dispatched by the multisig.

use crate::bridge::token::WrappedToken;
use crate::core::Address;
use crate::multisig::abi::{self, AbiError, Selector, Word};
use crate::multisig::{ActionHandler, MultisigError, OfflineMultisig};
use serde::{Deserialize, Serialize};

/// ABI signature of the mint action
pub const MINT_SIGNATURE: &str = "mint(address,uint256)";

/// Mint `amount` wrapped tokens to `to`
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Mint {
    pub to: Address,
    pub amount: u128,
}

impl Mint {
    pub fn selector() -> Selector {
        Selector::from_signature(MINT_SIGNATURE)
    }

    pub fn encode(&self) -> Vec<u8> {
        abi::encode_call(
            Self::selector(),
            &[abi::encode_address(&self.to), abi::encode_u128(self.amount)],
        )
    }

    fn decode_args(args: &[Word]) -> Result<Self, AbiError> {
        if args.len() != 2 {
            return Err(AbiError::WordCount {
                expected: 2,
                actual: args.len(),
            });
        }
        Ok(Self {
            to: abi::decode_address(&args[0], 0)?,
            amount: abi::decode_u128(&args[1], 1)?,
        })
    }
}

/// Build a mint payload
pub fn mint_payload(to: Address, amount: u128) -> Vec<u8> {
    Mint { to, amount }.encode()
}

/// Action handler that owns the wrapped token
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MintGateway {
    token: WrappedToken,
}

impl MintGateway {
    pub fn new(token: WrappedToken) -> Self {
        Self { token }
    }

    pub fn token(&self) -> &WrappedToken {
        &self.token
    }
}

impl ActionHandler for MintGateway {
    type Action = Mint;

    fn decode(&self, selector: Selector, args: &[Word]) -> Result<Option<Mint>, AbiError> {
        if selector != Mint::selector() {
            return Ok(None);
        }
        Mint::decode_args(args).map(Some)
    }

    fn apply(&mut self, action: Mint) -> Result<(), MultisigError> {
        self.token
            .mint(action.to, action.amount)
            .map(|_| ())
            .map_err(|e| MultisigError::ActionFailed(e.to_string()))
    }
}

/// Multisig instance guarding a wrapped token
pub type BridgeChild = OfflineMultisig<MintGateway>;

/// Create a child bridge with a fresh wrapped token
pub fn new_child(
    signers: Vec<Address>,
    token: WrappedToken,
) -> Result<BridgeChild, MultisigError> {
    OfflineMultisig::with_handler(signers, MintGateway::new(token))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bridge::parent::LockVault;
    use crate::core::TxId;
    use crate::crypto::KeyPair;
    use crate::multisig::{change_signers_payload, sign_message, SubmitOutcome};

    fn setup() -> (Vec<KeyPair>, BridgeChild) {
        let poa: Vec<KeyPair> = (0..3).map(|_| KeyPair::generate()).collect();
        let child = new_child(
            poa.iter().map(|k| k.address()).collect(),
            WrappedToken::new("Wrapped Ether", "WETH", 18),
        )
        .unwrap();
        (poa, child)
    }

    #[test]
    fn test_mint_payload_layout() {
        let to = Address([0x11; 20]);
        let payload = mint_payload(to, 42);
        assert_eq!(payload.len(), 4 + 64);
        assert_eq!(&payload[..4], &Mint::selector().0);
        assert_eq!(&payload[4 + 12..4 + 32], to.as_bytes());
        assert_eq!(payload[4 + 63], 42);
    }

    #[test]
    fn test_lock_then_mint_through_partial_execute() {
        let (poa, mut child) = setup();
        let mut parent = LockVault::new();
        let user = KeyPair::generate().address();
        let amount: u128 = 1_000_000_000_000_000_000;

        assert_eq!(child.handler().token().balance_of(&user), 0);

        let lock = parent.lock(user, amount).unwrap();
        let payload = lock.mint_payload();
        let epoch = child.epoch_count() as u64 - 1;

        let first = sign_message(&poa[0], epoch, &lock.txid, &payload).unwrap();
        assert_eq!(
            child
                .partial_execute_at(epoch, lock.txid, &payload, first)
                .unwrap(),
            SubmitOutcome::Collected { count: 1, quorum: 2 }
        );
        let second = sign_message(&poa[1], epoch, &lock.txid, &payload).unwrap();
        child
            .partial_execute_at(epoch, lock.txid, &payload, second)
            .unwrap();

        assert_eq!(child.handler().token().balance_of(&user), amount);
        assert_eq!(child.handler().token().total_supply(), amount);
        // Minting does not touch the signer set
        assert_eq!(child.epoch(), 0);
    }

    #[test]
    fn test_mint_replay_rejected() {
        let (poa, mut child) = setup();
        let user = Address([9; 20]);
        let txid = TxId::from_label("lock-1");
        let payload = mint_payload(user, 10);

        let sigs: Vec<_> = poa[..2]
            .iter()
            .map(|k| sign_message(k, 0, &txid, &payload).unwrap())
            .collect();
        child.full_execute(0, txid, &payload, &sigs).unwrap();
        assert_eq!(
            child.full_execute(0, txid, &payload, &sigs),
            Err(MultisigError::AlreadyExecuted(txid))
        );
        assert_eq!(child.handler().token().balance_of(&user), 10);
    }

    #[test]
    fn test_failed_mint_does_not_consume_quorum() {
        let (poa, mut child) = setup();
        let txid = TxId::from_label("zero");
        let payload = mint_payload(Address([9; 20]), 0);

        let sigs: Vec<_> = poa[..2]
            .iter()
            .map(|k| sign_message(k, 0, &txid, &payload).unwrap())
            .collect();
        assert!(matches!(
            child.full_execute(0, txid, &payload, &sigs),
            Err(MultisigError::ActionFailed(_))
        ));
        assert!(!child.is_executed(&txid));
    }

    #[test]
    fn test_child_still_rotates_signers() {
        let (poa, mut child) = setup();
        let newcomer = KeyPair::generate();
        let mut signers: Vec<Address> = poa.iter().map(|k| k.address()).collect();
        signers.push(newcomer.address());
        let payload = change_signers_payload(1, &signers);
        let txid = TxId::from_label("rotate");

        for key in &poa[..2] {
            child
                .partial_execute(txid, &payload, sign_message(key, 0, &txid, &payload).unwrap())
                .unwrap();
        }
        assert!(child.is_signer(&newcomer.address()));
    }

    #[test]
    fn test_malformed_mint_is_unknown_action() {
        let (poa, mut child) = setup();
        let txid = TxId::from_label("short-mint");
        let mut payload = mint_payload(Address([9; 20]), 5);
        payload.truncate(4 + 32);

        let sig = sign_message(&poa[0], 0, &txid, &payload).unwrap();
        assert!(matches!(
            child.partial_execute(txid, &payload, sig),
            Err(MultisigError::UnknownAction(_))
        ));
    }
}
