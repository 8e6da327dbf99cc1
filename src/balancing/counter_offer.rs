//! Counter-offer accumulator.
//!
//! Owns the inputs and outputs chosen during one balancing call together with
//! the live imbalance ledger, and applies the fee-overhead model as each input
//! or output is added. A counter-offer is consumed by value at the end of a
//! successful call; on error it is simply dropped.

use crate::balancing::imbalances::Imbalances;
use crate::balancing::types::{
	BalancingError, Coin, CoinRecipe, TokenType, TransactionCostModel, to_imbalance,
};

#[derive(Debug, Clone)]
pub struct CounterOffer<C> {
	inputs: Vec<C>,
	outputs: Vec<CoinRecipe>,
	imbalances: Imbalances,
	targets: Imbalances,
	cost_model: TransactionCostModel,
	fee_token: Option<TokenType>,
}

impl<C: Coin> CounterOffer<C> {
	/// Starts a counter-offer. Every token type with a target gets a working
	/// entry, so iteration covers it even when its initial imbalance is zero.
	pub fn new(
		imbalances: &Imbalances,
		targets: &Imbalances,
		cost_model: TransactionCostModel,
		fee_token: Option<TokenType>,
	) -> Self {
		Self {
			inputs: Vec::new(),
			outputs: Vec::new(),
			imbalances: imbalances.ensure_zeros_for(targets.token_types()),
			targets: targets.clone(),
			cost_model,
			fee_token,
		}
	}

	pub fn target_imbalance(&self, token_type: &TokenType) -> i128 {
		self.targets.get(token_type)
	}

	fn is_fee_token(&self, token_type: &TokenType) -> bool {
		self.fee_token.as_ref() == Some(token_type)
	}

	/// First non-fee entry, in ledger order, that differs from its target.
	pub fn find_non_native_imbalance(&self) -> Option<(TokenType, i128)> {
		self.imbalances
			.iter()
			.find(|(token_type, value)| {
				!self.is_fee_token(token_type) && *value != self.target_imbalance(token_type)
			})
			.map(|(token_type, value)| (token_type.clone(), value))
	}

	/// The fee-token entry if it differs from its target.
	pub fn find_native_imbalance(&self) -> Option<(TokenType, i128)> {
		let fee_token = self.fee_token.as_ref()?;
		if !self.imbalances.contains(fee_token) {
			return None;
		}
		let value = self.imbalances.get(fee_token);
		(value != self.target_imbalance(fee_token)).then(|| (fee_token.clone(), value))
	}

	/// Adds `coin` as an input. Every input costs the input overhead once,
	/// fee-token coins included.
	pub fn add_input(&mut self, coin: C) -> Result<(), BalancingError> {
		let value = to_imbalance(coin.token_type(), coin.value())?;
		self.imbalances.adjust(coin.token_type(), value)?;
		if let Some(fee_token) = self.fee_token.clone() {
			let overhead = to_imbalance(&fee_token, self.cost_model.input_fee_overhead)?;
			self.imbalances.adjust(&fee_token, -overhead)?;
		}
		self.inputs.push(coin);
		Ok(())
	}

	/// Adds an output of `coin.value` to the recipe.
	///
	/// A fee-token output pays its overhead out of its own value. Any other
	/// output bills the overhead separately against the fee-token imbalance.
	/// In both cases the output's own imbalance drops by the full value.
	pub fn add_output(&mut self, coin: CoinRecipe) -> Result<(), BalancingError> {
		let value = to_imbalance(&coin.token_type, coin.value)?;
		let overhead = self.cost_model.output_fee_overhead;

		if self.is_fee_token(&coin.token_type) {
			let net_value = coin.value.checked_sub(overhead).ok_or_else(|| {
				BalancingError::Other(format!(
					"Output of {} {} cannot pay its own overhead of {}",
					coin.value, coin.token_type, overhead
				))
			})?;
			self.imbalances.adjust(&coin.token_type, -value)?;
			self.outputs.push(CoinRecipe::new(coin.token_type, net_value));
		} else {
			self.imbalances.adjust(&coin.token_type, -value)?;
			if let Some(fee_token) = self.fee_token.clone() {
				let overhead = to_imbalance(&fee_token, overhead)?;
				self.imbalances.adjust(&fee_token, -overhead)?;
			}
			self.outputs.push(coin);
		}
		Ok(())
	}

	pub fn imbalances(&self) -> &Imbalances {
		&self.imbalances
	}

	pub fn inputs(&self) -> &[C] {
		&self.inputs
	}

	pub fn outputs(&self) -> &[CoinRecipe] {
		&self.outputs
	}

	pub fn into_parts(self) -> (Vec<C>, Vec<CoinRecipe>) {
		(self.inputs, self.outputs)
	}
}
