//! Ledger transaction model handed to the proving and submission collaborators.

use crate::balancing::types::to_imbalance;
use crate::balancing::{BalancingError, Coin, Imbalances};
use crate::wallet::address::Address;

use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of a transaction built by this wallet (hex encoded).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TransactionId(String);

impl TransactionId {
	pub fn new(id: impl Into<String>) -> Self {
		Self(id.into())
	}

	/// Fresh random identifier.
	pub fn random() -> Self {
		let mut bytes = [0u8; 32];
		rand::rng().fill(&mut bytes);
		Self(hex::encode(bytes))
	}

	pub fn as_str(&self) -> &str {
		&self.0
	}
}

impl fmt::Display for TransactionId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.0)
	}
}

/// A newly created coin together with the address that will own it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Output<C> {
	pub recipient: Address,
	pub coin: C,
}

/// One settlement section of a transaction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Offer<C> {
	pub inputs: Vec<C>,
	pub outputs: Vec<Output<C>>,
}

impl<C> Default for Offer<C> {
	fn default() -> Self {
		Self {
			inputs: Vec::new(),
			outputs: Vec::new(),
		}
	}
}

impl<C: Coin> Offer<C> {
	pub fn is_empty(&self) -> bool {
		self.inputs.is_empty() && self.outputs.is_empty()
	}

	/// Net value the offer leaves on the table per token type: inputs count
	/// positive, outputs negative.
	pub fn imbalances(&self) -> Result<Imbalances, BalancingError> {
		let mut entries = Vec::with_capacity(self.inputs.len() + self.outputs.len());
		for coin in &self.inputs {
			let value = to_imbalance(coin.token_type(), coin.value())?;
			entries.push((coin.token_type().clone(), value));
		}
		for output in &self.outputs {
			let coin = &output.coin;
			let value = to_imbalance(coin.token_type(), coin.value())?;
			entries.push((coin.token_type().clone(), -value));
		}
		Imbalances::from_entries(entries)
	}
}

/// Transaction ready to be proven.
///
/// The guaranteed section is always applied; the fallible section may be
/// dropped by the network without invalidating the guaranteed one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnprovenTransaction<C> {
	pub id: TransactionId,
	pub guaranteed: Offer<C>,
	pub fallible: Offer<C>,
	pub ttl: DateTime<Utc>,
}

impl<C> UnprovenTransaction<C> {
	/// All inputs, guaranteed section first.
	pub fn inputs(&self) -> impl Iterator<Item = &C> {
		self.guaranteed.inputs.iter().chain(self.fallible.inputs.iter())
	}

	/// All outputs, guaranteed section first.
	pub fn outputs(&self) -> impl Iterator<Item = &Output<C>> {
		self.guaranteed.outputs.iter().chain(self.fallible.outputs.iter())
	}
}

/// A transaction with its proof attached.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProvenTransaction<C> {
	pub transaction: UnprovenTransaction<C>,
	pub proof: Vec<u8>,
}

impl<C> ProvenTransaction<C> {
	pub fn id(&self) -> &TransactionId {
		&self.transaction.id
	}
}

/// How far submission waits before reporting success.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum WaitUntil {
	/// Accepted into the node's pool
	Submitted,
	/// Included in a best block
	#[default]
	InBestBlock,
	/// Included in a finalized block
	Finalized,
}

impl std::str::FromStr for WaitUntil {
	type Err = String;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s.to_ascii_lowercase().as_str() {
			"submitted" => Ok(WaitUntil::Submitted),
			"in_best_block" | "best_block" => Ok(WaitUntil::InBestBlock),
			"finalized" => Ok(WaitUntil::Finalized),
			other => Err(other.to_string()),
		}
	}
}
