//! Multi-token balancing algorithm.
//!
//! Drives a [`CounterOffer`] until every token type sits at its target. All
//! non-fee token types are resolved before the fee token, because each input
//! or output added for them moves the fee-token imbalance.

use crate::balancing::coin_selection::CoinSelection;
use crate::balancing::counter_offer::CounterOffer;
use crate::balancing::imbalances::Imbalances;
use crate::balancing::types::{BalancingError, Coin, CoinRecipe, TokenType, TransactionCostModel};
use tracing::debug;

/// Resolved inputs and outputs of a successful balancing call.
#[derive(Debug, Clone, PartialEq)]
pub struct BalanceRecipe<C> {
	pub inputs: Vec<C>,
	pub outputs: Vec<CoinRecipe>,
}

impl<C> BalanceRecipe<C> {
	pub fn is_empty(&self) -> bool {
		self.inputs.is_empty() && self.outputs.is_empty()
	}
}

/// Balancer configured with a cost model, an optional fee token and a coin
/// selection strategy.
pub struct Balancer<'a, S: ?Sized> {
	cost_model: TransactionCostModel,
	fee_token: Option<TokenType>,
	selection: &'a S,
}

impl<'a, S: ?Sized> Balancer<'a, S> {
	pub fn new(cost_model: TransactionCostModel, fee_token: Option<TokenType>, selection: &'a S) -> Self {
		Self {
			cost_model,
			fee_token,
			selection,
		}
	}

	/// Selects inputs from `coins` and synthesizes change outputs until every
	/// imbalance equals its target.
	///
	/// `coins` is not modified; the caller removes the recipe's inputs from its
	/// own pool once the whole operation succeeds. On error nothing is returned.
	pub fn balance<C>(
		&self,
		coins: &[C],
		initial_imbalances: &Imbalances,
		target_imbalances: &Imbalances,
	) -> Result<BalanceRecipe<C>, BalancingError>
	where
		C: Coin + Clone,
		S: CoinSelection<C>,
	{
		let mut counter_offer = CounterOffer::new(
			initial_imbalances,
			target_imbalances,
			self.cost_model,
			self.fee_token.clone(),
		);
		let mut coins = coins.to_vec();

		while let Some((token_type, amount)) = counter_offer.find_non_native_imbalance() {
			self.resolve(&mut counter_offer, &mut coins, token_type, amount)?;
		}
		while let Some((token_type, amount)) = counter_offer.find_native_imbalance() {
			self.resolve(&mut counter_offer, &mut coins, token_type, amount)?;
		}

		let (inputs, outputs) = counter_offer.into_parts();
		debug!(
			"Balanced with {} inputs and {} outputs",
			inputs.len(),
			outputs.len()
		);
		Ok(BalanceRecipe { inputs, outputs })
	}

	fn resolve<C>(
		&self,
		counter_offer: &mut CounterOffer<C>,
		coins: &mut Vec<C>,
		token_type: TokenType,
		amount: i128,
	) -> Result<(), BalancingError>
	where
		C: Coin + Clone,
		S: CoinSelection<C>,
	{
		let target = counter_offer.target_imbalance(&token_type);

		if self.should_emit_output(&token_type, amount, target)? {
			let value = amount
				.checked_sub(target)
				.and_then(|change| u128::try_from(change).ok())
				.ok_or_else(|| {
					BalancingError::Other(format!("Invalid change output for token type {}", token_type))
				})?;
			debug!("Emitting change output of {} {}", value, token_type);
			return counter_offer.add_output(CoinRecipe::new(token_type, value));
		}

		let coin = self
			.selection
			.choose_coin(coins, &token_type, amount, &self.cost_model)
			.ok_or_else(|| BalancingError::InsufficientFunds {
				token_type: token_type.clone(),
			})?;

		if coin.token_type() != &token_type {
			return Err(BalancingError::Other(format!(
				"Coin selection returned a {} coin while resolving {}",
				coin.token_type(),
				token_type
			)));
		}
		let position = coins
			.iter()
			.position(|candidate| candidate.is_same_coin(&coin))
			.ok_or_else(|| {
				BalancingError::Other(format!(
					"Coin selection returned a {} coin that is not among the candidates",
					token_type
				))
			})?;

		debug!(
			"Selected {} {} input to cover imbalance {}",
			coin.value(),
			token_type,
			amount
		);
		counter_offer.add_input(coin)?;
		coins.remove(position);
		Ok(())
	}

	fn should_emit_output(&self, token_type: &TokenType, amount: i128, target: i128) -> Result<bool, BalancingError> {
		if self.fee_token.as_ref() == Some(token_type) {
			let overhead = i128::try_from(self.cost_model.output_fee_overhead).map_err(|_| {
				BalancingError::Other("Output fee overhead exceeds the imbalance range".to_string())
			})?;
			let threshold = target.checked_add(overhead).ok_or_else(|| {
				BalancingError::Other(format!("Imbalance overflow for token type {}", token_type))
			})?;
			Ok(amount >= threshold)
		} else {
			Ok(amount > target)
		}
	}
}
