//! Pluggable coin selection strategies.
//!
//! A strategy picks one coin of the requested token type from the candidates,
//! or returns `None` when nothing suitable is left. Strategies must be pure and
//! must return one of the coins they were given.

use crate::balancing::types::{Coin, TokenType, TransactionCostModel};

/// Chooses the next input for a token type that is still short of its target.
pub trait CoinSelection<C: Coin> {
	/// `amount_needed` is the current signed imbalance of `token_type`;
	/// negative values mean the wallet still owes that much.
	fn choose_coin(
		&self,
		coins: &[C],
		token_type: &TokenType,
		amount_needed: i128,
		cost_model: &TransactionCostModel,
	) -> Option<C>;
}

impl<C, F> CoinSelection<C> for F
where
	C: Coin,
	F: Fn(&[C], &TokenType, i128, &TransactionCostModel) -> Option<C>,
{
	fn choose_coin(
		&self,
		coins: &[C],
		token_type: &TokenType,
		amount_needed: i128,
		cost_model: &TransactionCostModel,
	) -> Option<C> {
		self(coins, token_type, amount_needed, cost_model)
	}
}

/// Default strategy: the smallest coin of the requested type.
///
/// The amount needed is ignored, so several small coins may be gathered over
/// successive iterations before the imbalance is covered.
#[derive(Debug, Clone, Copy, Default)]
pub struct SmallestFirst;

impl<C: Coin + Clone> CoinSelection<C> for SmallestFirst {
	fn choose_coin(
		&self,
		coins: &[C],
		token_type: &TokenType,
		amount_needed: i128,
		cost_model: &TransactionCostModel,
	) -> Option<C> {
		choose_coin(coins, token_type, amount_needed, cost_model)
	}
}

/// Smallest coin of `token_type`; ties go to the earliest candidate.
pub fn choose_coin<C: Coin + Clone>(
	coins: &[C],
	token_type: &TokenType,
	_amount_needed: i128,
	_cost_model: &TransactionCostModel,
) -> Option<C> {
	coins
		.iter()
		.filter(|coin| coin.token_type() == token_type)
		.min_by_key(|coin| coin.value())
		.cloned()
}

/// Picks the largest coin of the requested type, keeping input count low.
#[derive(Debug, Clone, Copy, Default)]
pub struct LargestFirst;

impl<C: Coin + Clone> CoinSelection<C> for LargestFirst {
	fn choose_coin(
		&self,
		coins: &[C],
		token_type: &TokenType,
		_amount_needed: i128,
		_cost_model: &TransactionCostModel,
	) -> Option<C> {
		coins
			.iter()
			.filter(|coin| coin.token_type() == token_type)
			.fold(None, |best: Option<&C>, coin| match best {
				Some(best) if best.value() >= coin.value() => Some(best),
				_ => Some(coin),
			})
			.cloned()
	}
}
