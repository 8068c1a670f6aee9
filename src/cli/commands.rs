//! CLI commands for the multisig
//!
//! Implements all command handlers for the CLI interface.

use crate::core::{Address, Epoch, TxId};
use crate::crypto::{
    keccak256_hex, public_key_from_hex, public_key_to_address, KeyPair, Signature,
};
use crate::multisig::{
    change_signers_payload, preimage, sign_message, OfflineMultisig, SignatureBundle,
    SubmitOutcome,
};
use crate::storage::{load_from_file, save_to_file, Storage, StorageConfig};
use std::path::{Path, PathBuf};

/// Result type for CLI operations
pub type CliResult<T> = Result<T, Box<dyn std::error::Error>>;

/// Application state
pub struct AppState {
    pub multisig: OfflineMultisig,
    pub storage: Storage,
    pub data_dir: PathBuf,
}

impl AppState {
    /// Load application state from an initialized data directory
    pub fn new(data_dir: PathBuf) -> CliResult<Self> {
        let storage = open_storage(&data_dir)?;

        if !storage.exists() {
            return Err(format!(
                "no multisig state in {:?}; run `multisig init --signers ...` first",
                data_dir
            )
            .into());
        }

        log::info!("Loading multisig state from {:?}", data_dir);
        let multisig = storage.load()?;

        Ok(Self {
            multisig,
            storage,
            data_dir,
        })
    }

    /// Save the current state
    pub fn save(&self) -> CliResult<()> {
        self.storage.save(&self.multisig)?;
        Ok(())
    }
}

fn open_storage(data_dir: &Path) -> CliResult<Storage> {
    let storage_config = StorageConfig {
        data_dir: data_dir.to_path_buf(),
        ..Default::default()
    };
    Ok(Storage::new(storage_config)?)
}

/// Parse a txid: 32-byte hex is taken as-is, anything else is hashed as a label
pub fn parse_txid(text: &str) -> TxId {
    text.parse().unwrap_or_else(|_| TxId::from_label(text))
}

/// Parse a comma-separated address list
pub fn parse_addresses(text: &str) -> CliResult<Vec<Address>> {
    text.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| s.parse::<Address>().map_err(Into::into))
        .collect()
}

/// Parse `0x`-prefixed or bare hex bytes
pub fn parse_hex(text: &str) -> CliResult<Vec<u8>> {
    let trimmed = text.strip_prefix("0x").unwrap_or(text);
    Ok(hex::decode(trimmed)?)
}

/// Parse a comma-separated list of 65-byte signatures
pub fn parse_signatures(text: &str) -> CliResult<Vec<Signature>> {
    text.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| Signature::from_hex(s).map_err(Into::into))
        .collect()
}

/// Initialize a new multisig
pub fn cmd_init(data_dir: &Path, signers: &str, force: bool) -> CliResult<()> {
    let storage = open_storage(data_dir)?;

    if storage.exists() && !force {
        println!("⚠️  Multisig already exists at {:?}", data_dir);
        println!("   Use --force to reinitialize (this will delete existing data)");
        return Ok(());
    }

    let multisig = OfflineMultisig::new(parse_addresses(signers)?)?;
    storage.save(&multisig)?;

    println!("✅ Multisig initialized!");
    println!("   📁 Data directory: {:?}", data_dir);
    println!("   🔢 Epoch: {}", multisig.epoch());
    println!("   👥 Policy: {}", multisig.signers().description());
    for signer in multisig.signers().iter() {
        println!("   └─ {}", signer);
    }

    Ok(())
}

/// Display current epoch, signers and pending records
pub fn cmd_status(state: &AppState) -> CliResult<()> {
    let multisig = &state.multisig;

    println!("📊 Multisig status");
    println!("   Epoch: {}", multisig.epoch());
    println!("   Policy: {}", multisig.signers().description());
    println!("   Executed transactions: {}", multisig.executed_count());
    println!("\n   Signers:");
    for signer in multisig.signers().iter() {
        println!("   └─ {}", signer);
    }

    let pending = multisig.pending();
    if pending.is_empty() {
        println!("\n   📭 No pending transactions");
    } else {
        println!("\n   Pending:");
        for record in pending {
            let stale = if record.epoch == multisig.epoch() {
                ""
            } else {
                " (stale)"
            };
            println!(
                "   └─ {} epoch {} - {}/{} signatures{}",
                record.txid,
                record.epoch,
                record.signature_count(),
                record.quorum,
                stale
            );
        }
    }

    Ok(())
}

/// Generate a signer key
pub fn cmd_keygen() -> CliResult<()> {
    let key_pair = KeyPair::generate();

    println!("🔐 New signer key generated!");
    println!("   📍 Address: {}", key_pair.address());
    println!("   🔓 Public Key: 0x{}", key_pair.public_key_hex());
    println!("   🔑 Private Key: 0x{}", key_pair.private_key_hex());
    println!("\n   ⚠️  IMPORTANT: Keep the private key offline; it is not stored anywhere.");

    Ok(())
}

/// Signer address for a hex public key
pub fn address_from_pubkey(pubkey: &str) -> CliResult<Address> {
    let public_key = public_key_from_hex(pubkey.trim())?;
    Ok(public_key_to_address(&public_key))
}

/// Print the signer address of a public key
pub fn cmd_address(pubkey: &str) -> CliResult<()> {
    let address = address_from_pubkey(pubkey)?;
    println!("📍 Address: {}", address);
    Ok(())
}

/// Print the payload that rotates to `signers` at the next epoch
pub fn cmd_propose_rotation(state: &AppState, signers: &str) -> CliResult<()> {
    let signers = parse_addresses(signers)?;
    let next_epoch = state.multisig.epoch() + 1;
    let payload = change_signers_payload(next_epoch, &signers);

    println!("📝 Rotation to epoch {}", next_epoch);
    println!("   Sign at epoch: {}", state.multisig.epoch());
    println!("   Payload: 0x{}", hex::encode(payload));

    Ok(())
}

/// Sign `(epoch, txid, payload)` with a private key
pub fn cmd_sign(key: &str, epoch: Epoch, txid: &str, payload: &str) -> CliResult<()> {
    let key_pair = KeyPair::from_private_key_hex(key)?;
    let txid = parse_txid(txid);
    let payload = parse_hex(payload)?;
    let signature = sign_message(&key_pair, epoch, &txid, &payload)?;

    println!("✍️  Signed by {}", key_pair.address());
    println!("   Txid: {}", txid);
    println!(
        "   Digest: 0x{}",
        keccak256_hex(&preimage(epoch, &txid, &payload))
    );
    println!("   Signature: {}", signature.to_hex());

    Ok(())
}

/// Submit one signature
pub fn cmd_partial(state: &mut AppState, txid: &str, payload: &str, signature: &str) -> CliResult<()> {
    let txid = parse_txid(txid);
    let payload = parse_hex(payload)?;
    let signature = Signature::from_hex(signature)?;

    let outcome = state
        .multisig
        .partial_execute(txid, &payload, signature)
        .map_err(|e| {
            log::warn!("Rejected signature for {}: {}", txid, e);
            e
        })?;
    state.save()?;

    match outcome {
        SubmitOutcome::Collected { count, quorum } => {
            println!("📥 Signature accepted for {} ({}/{})", txid, count, quorum);
        }
        SubmitOutcome::Executed { count } => {
            println!("✅ Quorum reached with {} signatures; {} executed", count, txid);
            println!("   Epoch now {}", state.multisig.epoch());
        }
    }

    Ok(())
}

/// Submit a full signature bundle
pub fn cmd_full(
    state: &mut AppState,
    epoch: Epoch,
    txid: &str,
    payload: &str,
    signatures: &str,
) -> CliResult<()> {
    let txid = parse_txid(txid);
    let payload = parse_hex(payload)?;
    let signatures = parse_signatures(signatures)?;

    let signers = state
        .multisig
        .full_execute(epoch, txid, &payload, &signatures)
        .map_err(|e| {
            log::warn!("Rejected bundle for {}: {}", txid, e);
            e
        })?;
    state.save()?;

    println!("✅ {} executed with {} signatures", txid, signers.len());
    for signer in signers {
        println!("   └─ {}", signer);
    }

    Ok(())
}

/// Export collected signatures for a txid
pub fn cmd_export(state: &AppState, txid: &str, output: &Path) -> CliResult<()> {
    let txid = parse_txid(txid);
    let bundle = state
        .multisig
        .get_signatures(&txid)
        .ok_or_else(|| format!("no signatures recorded for {}", txid))?;

    save_to_file(&bundle, output)?;

    println!(
        "📤 Exported {} signature(s) for {} to {:?}",
        bundle.signatures.len(),
        txid,
        output
    );

    Ok(())
}

/// Execute a bundle exported from another instance
pub fn cmd_import(state: &mut AppState, input: &Path) -> CliResult<()> {
    let bundle: SignatureBundle = load_from_file(input)?;
    let signers = state.multisig.execute_bundle(&bundle).map_err(|e| {
        log::warn!("Rejected imported bundle for {}: {}", bundle.txid, e);
        e
    })?;
    state.save()?;

    println!(
        "📥 Imported bundle executed: {} ({} signatures)",
        bundle.txid,
        signers.len()
    );

    Ok(())
}

/// Remove partial records stranded by a rotation
pub fn cmd_prune(state: &mut AppState) -> CliResult<()> {
    let removed = state.multisig.prune_stale();
    state.save()?;

    println!("🧹 Removed {} stale record(s)", removed);

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_txid() {
        let hashed = parse_txid("txid");
        assert_eq!(hashed, TxId::from_label("txid"));

        let raw = hashed.to_string();
        assert_eq!(parse_txid(&raw), hashed);
    }

    #[test]
    fn test_parse_addresses() {
        let a = Address([1; 20]);
        let b = Address([2; 20]);
        let parsed = parse_addresses(&format!("{}, {},", a, b)).unwrap();
        assert_eq!(parsed, vec![a, b]);
        assert!(parse_addresses("0x12").is_err());
    }

    #[test]
    fn test_address_from_pubkey() {
        let kp = KeyPair::generate();
        let hex_key = format!("0x{}", kp.public_key_hex());
        assert_eq!(address_from_pubkey(&hex_key).unwrap(), kp.address());
        assert!(address_from_pubkey("0x02ff").is_err());
    }

    #[test]
    fn test_parse_signatures() {
        let kp = KeyPair::generate();
        let s1 = kp.sign_digest(&[1; 32]).unwrap();
        let s2 = kp.sign_digest(&[2; 32]).unwrap();
        let parsed = parse_signatures(&format!("{},{}", s1.to_hex(), s2.to_hex())).unwrap();
        assert_eq!(parsed, vec![s1, s2]);
    }

    #[test]
    fn test_init_then_partial_flow() {
        let temp_dir = tempfile::tempdir().unwrap();
        let data_dir = temp_dir.path().to_path_buf();
        let keys: Vec<KeyPair> = (0..3).map(|_| KeyPair::generate()).collect();
        let list = keys
            .iter()
            .map(|k| k.address().to_string())
            .collect::<Vec<_>>()
            .join(",");

        cmd_init(&data_dir, &list, false).unwrap();
        let mut state = AppState::new(data_dir.clone()).unwrap();

        let newcomer = KeyPair::generate();
        let payload = change_signers_payload(1, &[keys[0].address(), newcomer.address()]);
        let payload_hex = hex::encode(&payload);
        let txid = TxId::from_label("cli");

        for key in &keys[..2] {
            let sig = sign_message(key, 0, &txid, &payload).unwrap();
            cmd_partial(&mut state, "cli", &payload_hex, &sig.to_hex()).unwrap();
        }

        let reloaded = AppState::new(data_dir).unwrap();
        assert_eq!(reloaded.multisig.epoch(), 1);
        assert!(reloaded.multisig.is_signer(&newcomer.address()));
    }

    #[test]
    fn test_state_requires_init() {
        let temp_dir = tempfile::tempdir().unwrap();
        assert!(AppState::new(temp_dir.path().to_path_buf()).is_err());
    }
}
