//! Offline multisig CLI application
//!
//! A command-line interface for collecting signatures and executing
//! quorum-authorized operations against a locally persisted multisig.

use clap::{Parser, Subcommand};
use offchain_multisig::cli::{self, AppState};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "multisig")]
#[command(author = "Darshan")]
#[command(version = "0.1.0")]
#[command(about = "Off-chain signature multisig authorization", long_about = None)]
struct Cli {
    /// Data directory for multisig state
    #[arg(short, long, default_value = ".multisig_data")]
    data_dir: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize a new multisig at epoch 0
    Init {
        /// Initial signer addresses (comma-separated)
        #[arg(short, long)]
        signers: String,

        /// Overwrite existing state
        #[arg(long)]
        force: bool,
    },

    /// Show epoch, signers and pending transactions
    Status,

    /// Generate a new signer key
    Keygen,

    /// Derive a signer address from a public key
    Address {
        /// Public key (hex, compressed or uncompressed)
        #[arg(long)]
        pubkey: String,
    },

    /// Print a signer-rotation payload for the next epoch
    ProposeRotation {
        /// New signer addresses (comma-separated)
        #[arg(short, long)]
        signers: String,
    },

    /// Sign (epoch, txid, payload) with a private key
    Sign {
        /// Hex-encoded private key
        #[arg(short, long)]
        key: String,

        /// Epoch the signature is bound to
        #[arg(short, long)]
        epoch: u64,

        /// Transaction id (32-byte hex, or a label to hash)
        #[arg(short, long)]
        txid: String,

        /// Hex-encoded payload
        #[arg(short, long)]
        payload: String,
    },

    /// Submit a single signature
    Partial {
        /// Transaction id (32-byte hex, or a label to hash)
        #[arg(short, long)]
        txid: String,

        /// Hex-encoded payload
        #[arg(short, long)]
        payload: String,

        /// 65-byte hex signature (r || s || v)
        #[arg(short, long)]
        signature: String,
    },

    /// Submit a complete signature bundle
    Full {
        /// Epoch the signatures are bound to
        #[arg(short, long)]
        epoch: u64,

        /// Transaction id (32-byte hex, or a label to hash)
        #[arg(short, long)]
        txid: String,

        /// Hex-encoded payload
        #[arg(short, long)]
        payload: String,

        /// Signatures (comma-separated 65-byte hex)
        #[arg(short, long)]
        signatures: String,
    },

    /// Export collected signatures for a transaction
    Export {
        /// Transaction id (32-byte hex, or a label to hash)
        #[arg(short, long)]
        txid: String,

        /// Output file path
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Execute a signature bundle exported from another instance
    Import {
        /// Input file path
        #[arg(short, long)]
        input: PathBuf,
    },

    /// Drop pending records stranded by a signer rotation
    Prune,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logger
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    // Commands that don't need persisted state
    match &cli.command {
        Commands::Init { signers, force } => {
            return cli::cmd_init(&cli.data_dir, signers, *force);
        }
        Commands::Keygen => return cli::cmd_keygen(),
        Commands::Address { pubkey } => return cli::cmd_address(pubkey),
        Commands::Sign {
            key,
            epoch,
            txid,
            payload,
        } => return cli::cmd_sign(key, *epoch, txid, payload),
        _ => {}
    }

    // Initialize application state
    let mut state = AppState::new(cli.data_dir.clone())?;

    // Process commands
    match cli.command {
        Commands::Init { .. }
        | Commands::Keygen
        | Commands::Address { .. }
        | Commands::Sign { .. } => unreachable!(),

        Commands::Status => {
            cli::cmd_status(&state)?;
        }

        Commands::ProposeRotation { signers } => {
            cli::cmd_propose_rotation(&state, &signers)?;
        }

        Commands::Partial {
            txid,
            payload,
            signature,
        } => {
            cli::cmd_partial(&mut state, &txid, &payload, &signature)?;
        }

        Commands::Full {
            epoch,
            txid,
            payload,
            signatures,
        } => {
            cli::cmd_full(&mut state, epoch, &txid, &payload, &signatures)?;
        }

        Commands::Export { txid, output } => {
            cli::cmd_export(&state, &txid, &output)?;
        }

        Commands::Import { input } => {
            cli::cmd_import(&mut state, &input)?;
        }

        Commands::Prune => {
            cli::cmd_prune(&mut state)?;
        }
    }

    Ok(())
}
