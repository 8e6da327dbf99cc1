//! Value types shared by the balancing engine and every wallet flavor.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque identifier of a token type.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TokenType(String);

impl TokenType {
	pub fn new(id: impl Into<String>) -> Self {
		Self(id.into())
	}

	pub fn as_str(&self) -> &str {
		&self.0
	}
}

impl fmt::Display for TokenType {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.0)
	}
}

impl From<&str> for TokenType {
	fn from(value: &str) -> Self {
		Self::new(value)
	}
}

/// The minimal shape of a coin: a token type and a value.
///
/// Used both for candidate inputs and for synthesized change outputs.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CoinRecipe {
	pub token_type: TokenType,
	pub value: u128,
}

impl CoinRecipe {
	pub fn new(token_type: impl Into<TokenType>, value: u128) -> Self {
		Self {
			token_type: token_type.into(),
			value,
		}
	}
}

/// Projection of a wallet-specific coin onto what the balancer needs to know.
///
/// The balancer never looks past these three methods, so shielded coins, UTXOs
/// and dust all go through the same engine.
pub trait Coin {
	fn token_type(&self) -> &TokenType;

	fn value(&self) -> u128;

	/// Whether `other` denotes the same spendable coin.
	fn is_same_coin(&self, other: &Self) -> bool;
}

impl Coin for CoinRecipe {
	fn token_type(&self) -> &TokenType {
		&self.token_type
	}

	fn value(&self) -> u128 {
		self.value
	}

	fn is_same_coin(&self, other: &Self) -> bool {
		self == other
	}
}

/// Fixed fee cost of every input and output, always charged to the fee token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TransactionCostModel {
	pub input_fee_overhead: u128,
	pub output_fee_overhead: u128,
}

impl TransactionCostModel {
	/// A cost model that charges nothing.
	pub const ZERO: Self = Self {
		input_fee_overhead: 0,
		output_fee_overhead: 0,
	};

	pub fn new(input_fee_overhead: u128, output_fee_overhead: u128) -> Self {
		Self {
			input_fee_overhead,
			output_fee_overhead,
		}
	}

	/// Total overhead of `inputs` inputs and `outputs` outputs.
	pub fn overhead_of(&self, inputs: usize, outputs: usize) -> Option<u128> {
		let inputs = self.input_fee_overhead.checked_mul(inputs as u128)?;
		let outputs = self.output_fee_overhead.checked_mul(outputs as u128)?;
		inputs.checked_add(outputs)
	}
}

/// Failures of a single balancing call.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BalancingError {
	#[error("Insufficient funds: cannot cover imbalance of token type {token_type}")]
	InsufficientFunds { token_type: TokenType },

	#[error("Balancing error: {0}")]
	Other(String),
}

/// Converts a coin value into the signed imbalance domain.
pub(crate) fn to_imbalance(token_type: &TokenType, value: u128) -> Result<i128, BalancingError> {
	i128::try_from(value).map_err(|_| {
		BalancingError::Other(format!(
			"Value {} of token type {} exceeds the imbalance range",
			value, token_type
		))
	})
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn overhead_counts_inputs_and_outputs() {
		let model = TransactionCostModel::new(2, 3);
		assert_eq!(model.overhead_of(2, 1), Some(7));
		assert_eq!(TransactionCostModel::ZERO.overhead_of(10, 10), Some(0));
		assert_eq!(TransactionCostModel::new(u128::MAX, 0).overhead_of(2, 0), None);
	}

	#[test]
	fn huge_values_do_not_fit_the_imbalance_range() {
		let token = TokenType::new("NIGHT");
		assert_eq!(to_imbalance(&token, 42), Ok(42));
		assert!(matches!(
			to_imbalance(&token, u128::MAX),
			Err(BalancingError::Other(_))
		));
	}
}
