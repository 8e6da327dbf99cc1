/// Transaction builder and transaction-level errors
pub mod builder;
/// Proving collaborator and remote proof server client
pub mod prover;
/// Submission collaborator
pub mod submitter;
/// Ledger transaction model
pub mod types;

pub use builder::{TransactionBuilder, TransactionError};
pub use prover::{Prover, RemoteProofServer};
pub use submitter::Submitter;
pub use types::*;

/// Number of decimal places of Midnight tokens.
pub const MIDNIGHT_TOKEN_DECIMALS: u32 = 6;
