//! Command-line interface for the multisig

pub mod commands;

pub use commands::*;
