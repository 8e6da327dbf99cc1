//! Transaction builder
//!
//! Assembles the guaranteed and fallible offers produced by the transacting
//! capability into an [`UnprovenTransaction`], validating it on the way.

use crate::balancing::Coin;
use crate::transaction::types::{Offer, TransactionId, UnprovenTransaction};

use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, error};

#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize)]
pub enum TransactionError {
	#[error("Transaction validation error: {0}")]
	ValidationError(String),

	#[error("Proving error: {0}")]
	ProvingError(String),

	#[error("Submission error: {0}")]
	SubmissionError(String),

	#[error("Unexpected error: {0}")]
	UnexpectedError(String),
}

/// Builder for unproven transactions
pub struct TransactionBuilder<C> {
	/// Identifier; a random one is generated when unset
	id: Option<TransactionId>,
	/// Time after which the network drops the transaction
	ttl: Option<DateTime<Utc>>,
	/// The always-applied section
	guaranteed_offer: Option<Offer<C>>,
	/// The section that may fail independently
	fallible_offer: Option<Offer<C>>,
}

impl<C: Coin> TransactionBuilder<C> {
	pub fn new() -> Self {
		Self {
			id: None,
			ttl: None,
			guaranteed_offer: None,
			fallible_offer: None,
		}
	}

	pub fn with_id(mut self, id: TransactionId) -> Self {
		self.id = Some(id);
		self
	}

	pub fn with_ttl(mut self, ttl: DateTime<Utc>) -> Self {
		self.ttl = Some(ttl);
		self
	}

	pub fn with_guaranteed_offer(mut self, offer: Offer<C>) -> Self {
		self.guaranteed_offer = Some(offer);
		self
	}

	pub fn with_fallible_offer(mut self, offer: Offer<C>) -> Self {
		self.fallible_offer = Some(offer);
		self
	}

	/// Builds the transaction.
	///
	/// Fails when no TTL was set or when a coin is spent more than once
	/// across both sections.
	pub fn build(self) -> Result<UnprovenTransaction<C>, TransactionError> {
		let ttl = self.ttl.ok_or_else(|| {
			TransactionError::ValidationError("Transaction TTL is not set".to_string())
		})?;

		let transaction = UnprovenTransaction {
			id: self.id.unwrap_or_else(TransactionId::random),
			guaranteed: self.guaranteed_offer.unwrap_or_default(),
			fallible: self.fallible_offer.unwrap_or_default(),
			ttl,
		};

		if let Some(input) = first_duplicate_input(&transaction) {
			error!(
				"Transaction {} spends a {} coin twice",
				transaction.id,
				input.token_type()
			);
			return Err(TransactionError::ValidationError(format!(
				"Coin of token type {} is used as an input more than once",
				input.token_type()
			)));
		}

		debug!(
			"Built transaction {}: guaranteed {} in / {} out, fallible {} in / {} out",
			transaction.id,
			transaction.guaranteed.inputs.len(),
			transaction.guaranteed.outputs.len(),
			transaction.fallible.inputs.len(),
			transaction.fallible.outputs.len()
		);
		Ok(transaction)
	}
}

fn first_duplicate_input<C: Coin>(transaction: &UnprovenTransaction<C>) -> Option<&C> {
	let inputs: Vec<&C> = transaction.inputs().collect();
	inputs
		.iter()
		.enumerate()
		.find(|(i, input)| inputs[i + 1..].iter().any(|other| input.is_same_coin(other)))
		.map(|(_, input)| *input)
}

impl<C: Coin> Default for TransactionBuilder<C> {
	fn default() -> Self {
		Self::new()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::balancing::CoinRecipe;

	fn ttl() -> DateTime<Utc> {
		Utc::now() + chrono::Duration::hours(1)
	}

	#[test]
	fn missing_ttl_is_a_validation_error() {
		let result = TransactionBuilder::<CoinRecipe>::new().build();
		assert!(matches!(result, Err(TransactionError::ValidationError(_))));
	}

	#[test]
	fn empty_sections_default_to_empty_offers() {
		let id = TransactionId::new("abc");
		let transaction = TransactionBuilder::<CoinRecipe>::new()
			.with_id(id.clone())
			.with_ttl(ttl())
			.build()
			.unwrap();

		assert_eq!(transaction.id, id);
		assert!(transaction.guaranteed.is_empty());
		assert!(transaction.fallible.is_empty());
	}

	#[test]
	fn coin_spent_in_both_sections_is_rejected() {
		let coin = CoinRecipe::new("NIGHT", 10);
		let result = TransactionBuilder::new()
			.with_ttl(ttl())
			.with_guaranteed_offer(Offer {
				inputs: vec![coin.clone()],
				outputs: vec![],
			})
			.with_fallible_offer(Offer {
				inputs: vec![coin],
				outputs: vec![],
			})
			.build();

		assert!(matches!(result, Err(TransactionError::ValidationError(_))));
	}
}
