//!
//! Submission collaborator.
//!
//! The wallet hands proven transactions to a [`Submitter`], which owns the
//! node connection and any retry policy. The wallet only distinguishes success
//! from failure; a failure reverts the transaction's wallet bookkeeping.

use crate::transaction::builder::TransactionError;
use crate::transaction::types::{ProvenTransaction, WaitUntil};

use async_trait::async_trait;

/// Submits proven transactions to the network.
#[async_trait]
pub trait Submitter<C>: Send + Sync {
	/// Submits `transaction` and waits until `wait_until` is reached.
	///
	/// Returns the network identifier of the transaction.
	async fn submit(
		&self,
		transaction: &ProvenTransaction<C>,
		wait_until: WaitUntil,
	) -> Result<String, TransactionError>;
}
