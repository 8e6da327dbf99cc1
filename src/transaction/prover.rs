//!
//! Proving collaborator.
//!
//! Defines the [`Prover`] interface the wallet uses to turn an unproven
//! transaction into a proven one, and a client for a remote proof server
//! reached over HTTP with exponential backoff.

use crate::transaction::builder::TransactionError;
use crate::transaction::types::{ProvenTransaction, UnprovenTransaction};

use async_trait::async_trait;
use backoff::{ExponentialBackoff, future::retry};
use serde::Serialize;
use std::time::Duration;
use tracing::{debug, warn};

/// Produces proofs for unproven transactions.
///
/// Any error makes the caller revert the wallet bookkeeping of the transaction.
#[async_trait]
pub trait Prover<C>: Send + Sync {
	async fn prove(
		&self,
		transaction: UnprovenTransaction<C>,
	) -> Result<ProvenTransaction<C>, TransactionError>;
}

/// Remote proof server client for generating zero-knowledge proofs
pub struct RemoteProofServer {
	url: String,
	client: reqwest::Client,
	max_elapsed_time: Duration,
}

impl RemoteProofServer {
	/// Creates a new remote proof server client. Retries stop after
	/// `max_elapsed_time`.
	pub fn new(url: String, max_elapsed_time: Duration) -> Result<Self, TransactionError> {
		let client = reqwest::ClientBuilder::new()
			.pool_idle_timeout(None)
			.build()
			.map_err(|e| {
				TransactionError::UnexpectedError(format!("Failed to create HTTP client: {}", e))
			})?;

		Ok(Self {
			url,
			client,
			max_elapsed_time,
		})
	}

	fn endpoint(&self) -> Result<reqwest::Url, TransactionError> {
		reqwest::Url::parse(&self.url)
			.and_then(|url| url.join("prove-tx"))
			.map_err(|e| {
				TransactionError::ProvingError(format!("Invalid proof server URL {}: {}", self.url, e))
			})
	}

	/// Serializes a transaction for the proof server
	pub fn serialize_request_body<C: Serialize>(
		&self,
		transaction: &UnprovenTransaction<C>,
	) -> Result<Vec<u8>, TransactionError> {
		bincode::serialize(transaction).map_err(|e| {
			TransactionError::ProvingError(format!("Failed to serialize transaction: {}", e))
		})
	}
}

#[async_trait]
impl<C> Prover<C> for RemoteProofServer
where
	C: Serialize + Send + Sync + 'static,
{
	async fn prove(
		&self,
		transaction: UnprovenTransaction<C>,
	) -> Result<ProvenTransaction<C>, TransactionError> {
		let url = self.endpoint()?;
		let body = self.serialize_request_body(&transaction)?;
		debug!(
			"Requesting proof for transaction {} ({} bytes)",
			transaction.id,
			body.len()
		);

		let backoff = ExponentialBackoff {
			max_elapsed_time: Some(self.max_elapsed_time),
			..ExponentialBackoff::default()
		};
		let proof = retry(backoff, || async {
			let resp = self
				.client
				.post(url.clone())
				.body(body.clone())
				.send()
				.await
				.map_err(|e| {
					warn!("Proof server send error: {:?}", e);
					backoff::Error::transient(e)
				})?;

			let resp_err = resp.error_for_status_ref().err();
			let resp_bytes = resp.bytes().await.map_err(|e| {
				warn!("Proof server to bytes error: {:?}", e);
				backoff::Error::transient(e)
			})?;

			if let Some(e) = resp_err {
				warn!(
					"Proof server response error: {:?}. Bytes: {:?}",
					e, resp_bytes
				);
				return Err(backoff::Error::transient(e));
			}

			Ok::<Vec<u8>, backoff::Error<reqwest::Error>>(resp_bytes.to_vec())
		})
		.await
		.map_err(|e| TransactionError::ProvingError(format!("Proof server request failed: {}", e)))?;

		if proof.is_empty() {
			return Err(TransactionError::ProvingError(
				"Proof server returned empty response".to_string(),
			));
		}

		Ok(ProvenTransaction { transaction, proof })
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::balancing::CoinRecipe;
	use crate::transaction::types::{Offer, TransactionId};
	use chrono::Utc;

	fn transaction() -> UnprovenTransaction<CoinRecipe> {
		UnprovenTransaction {
			id: TransactionId::new("01"),
			guaranteed: Offer {
				inputs: vec![CoinRecipe::new("NIGHT", 5)],
				outputs: vec![],
			},
			fallible: Offer::default(),
			ttl: Utc::now(),
		}
	}

	#[test]
	fn request_body_round_trips_through_bincode() {
		let server = RemoteProofServer::new(
			"http://localhost:6300".to_string(),
			Duration::from_secs(1),
		)
		.unwrap();
		let tx = transaction();

		let body = server.serialize_request_body(&tx).unwrap();
		let decoded: UnprovenTransaction<CoinRecipe> = bincode::deserialize(&body).unwrap();
		assert_eq!(decoded, tx);
	}

	#[tokio::test]
	async fn invalid_url_fails_without_retrying() {
		let server = RemoteProofServer::new("not a url".to_string(), Duration::from_secs(1)).unwrap();

		let result = server.prove(transaction()).await;
		assert!(matches!(result, Err(TransactionError::ProvingError(_))));
	}
}
