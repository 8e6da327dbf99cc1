//! Wallet state store.
//!
//! Tracks which coins are available, which are spent by a transaction still in
//! flight, and which outputs of in-flight transactions the wallet expects to
//! receive. Every operation returns a new state; the wallet service swaps it in
//! atomically.

use crate::balancing::{Coin, TokenType};
use crate::transaction::TransactionId;
use crate::wallet::address::Address;
use crate::wallet::flavors::WalletFlavor;
use crate::wallet::types::WalletError;

use std::collections::BTreeMap;
use std::fmt;

/// A coin tied to the transaction that spends or creates it.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingCoin<C> {
	pub coin: C,
	pub transaction: TransactionId,
}

pub struct WalletState<F: WalletFlavor> {
	address: Address,
	available: BTreeMap<F::CoinId, F::Coin>,
	pending_spends: BTreeMap<F::CoinId, PendingCoin<F::Coin>>,
	pending_incoming: BTreeMap<F::CoinId, PendingCoin<F::Coin>>,
}

impl<F: WalletFlavor> WalletState<F> {
	pub fn new(address: Address) -> Self {
		Self {
			address,
			available: BTreeMap::new(),
			pending_spends: BTreeMap::new(),
			pending_incoming: BTreeMap::new(),
		}
	}

	/// Adds confirmed coins to the available set.
	pub fn with_coins(mut self, coins: impl IntoIterator<Item = F::Coin>) -> Self {
		for coin in coins {
			self.available.insert(F::coin_id(&coin), coin);
		}
		self
	}

	pub fn address(&self) -> &Address {
		&self.address
	}

	/// Spendable coins, ordered by coin identity.
	pub fn available_coins(&self) -> Vec<F::Coin> {
		self.available.values().cloned().collect()
	}

	pub fn pending_spends(&self) -> impl Iterator<Item = &PendingCoin<F::Coin>> {
		self.pending_spends.values()
	}

	pub fn pending_incoming(&self) -> impl Iterator<Item = &PendingCoin<F::Coin>> {
		self.pending_incoming.values()
	}

	/// Available balance of `token_type`.
	pub fn balance(&self, token_type: &TokenType) -> u128 {
		self.available
			.values()
			.filter(|coin| coin.token_type() == token_type)
			.fold(0u128, |total, coin| total.saturating_add(coin.value()))
	}

	/// Available balance of every token type the wallet holds.
	pub fn balances(&self) -> BTreeMap<TokenType, u128> {
		let mut balances = BTreeMap::new();
		for coin in self.available.values() {
			let total: &mut u128 = balances.entry(coin.token_type().clone()).or_default();
			*total = total.saturating_add(coin.value());
		}
		balances
	}

	/// Moves `coins` from available to pending spend under `transaction`.
	///
	/// Fails without any change if one of the coins is not available.
	pub fn spend_coins(
		&self,
		transaction: &TransactionId,
		coins: &[F::Coin],
	) -> Result<Self, WalletError> {
		let mut next = self.clone();
		for coin in coins {
			let id = F::coin_id(coin);
			let coin = next.available.remove(&id).ok_or_else(|| {
				WalletError::Other(format!("Coin {:?} is not available for spending", id))
			})?;
			next.pending_spends.insert(
				id,
				PendingCoin {
					coin,
					transaction: transaction.clone(),
				},
			);
		}
		Ok(next)
	}

	/// Records outputs of `transaction` the wallet will own once it is applied.
	pub fn watch_coins(&self, transaction: &TransactionId, coins: &[F::Coin]) -> Self {
		let mut next = self.clone();
		for coin in coins {
			next.pending_incoming.insert(
				F::coin_id(coin),
				PendingCoin {
					coin: coin.clone(),
					transaction: transaction.clone(),
				},
			);
		}
		next
	}

	/// Undoes the spends and watches of `transaction` only.
	pub fn revert(&self, transaction: &TransactionId) -> Self {
		let mut next = self.clone();
		let (reverted, kept): (BTreeMap<_, _>, BTreeMap<_, _>) =
			std::mem::take(&mut next.pending_spends)
				.into_iter()
				.partition(|(_, pending)| &pending.transaction == transaction);
		next.pending_spends = kept;
		for (id, pending) in reverted {
			next.available.insert(id, pending.coin);
		}
		next.pending_incoming
			.retain(|_, pending| &pending.transaction != transaction);
		next
	}

	/// Applies `transaction` as observed on chain: its spends are final and its
	/// watched outputs become available.
	pub fn confirm(&self, transaction: &TransactionId) -> Self {
		let mut next = self.clone();
		next.pending_spends
			.retain(|_, pending| &pending.transaction != transaction);
		let (received, kept): (BTreeMap<_, _>, BTreeMap<_, _>) =
			std::mem::take(&mut next.pending_incoming)
				.into_iter()
				.partition(|(_, pending)| &pending.transaction == transaction);
		next.pending_incoming = kept;
		for (id, pending) in received {
			next.available.insert(id, pending.coin);
		}
		next
	}
}

impl<F: WalletFlavor> Clone for WalletState<F> {
	fn clone(&self) -> Self {
		Self {
			address: self.address.clone(),
			available: self.available.clone(),
			pending_spends: self.pending_spends.clone(),
			pending_incoming: self.pending_incoming.clone(),
		}
	}
}

impl<F: WalletFlavor> PartialEq for WalletState<F> {
	fn eq(&self, other: &Self) -> bool {
		self.address == other.address
			&& self.available == other.available
			&& self.pending_spends == other.pending_spends
			&& self.pending_incoming == other.pending_incoming
	}
}

impl<F: WalletFlavor> fmt::Debug for WalletState<F> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("WalletState")
			.field("address", &self.address)
			.field("available", &self.available)
			.field("pending_spends", &self.pending_spends)
			.field("pending_incoming", &self.pending_incoming)
			.finish()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::wallet::address::{NetworkId, UNSHIELDED_ADDRESS_TYPE};
	use crate::wallet::flavors::{UnshieldedFlavor, Utxo};

	fn address() -> Address {
		Address::new(UNSHIELDED_ADDRESS_TYPE, NetworkId::TestNet, vec![1; 32])
	}

	fn utxo(token_type: &str, value: u128, output_no: u32) -> Utxo {
		Utxo {
			owner: address(),
			token_type: TokenType::new(token_type),
			value,
			intent_hash: TransactionId::new("genesis"),
			output_no,
		}
	}

	fn state() -> WalletState<UnshieldedFlavor> {
		WalletState::new(address()).with_coins(vec![
			utxo("NIGHT", 30, 0),
			utxo("NIGHT", 40, 1),
			utxo("GOLD", 5, 2),
		])
	}

	#[test]
	fn balances_sum_available_coins() {
		let state = state();
		assert_eq!(state.balance(&TokenType::new("NIGHT")), 70);
		assert_eq!(state.balance(&TokenType::new("SILVER")), 0);

		let balances = state.balances();
		assert_eq!(balances.len(), 2);
		assert_eq!(balances[&TokenType::new("GOLD")], 5);
	}

	#[test]
	fn spending_an_unavailable_coin_fails() {
		let state = state();
		let tx = TransactionId::new("t1");
		let spent = state.spend_coins(&tx, &[utxo("NIGHT", 30, 0)]).unwrap();

		assert_eq!(spent.balance(&TokenType::new("NIGHT")), 40);
		assert_eq!(spent.pending_spends().count(), 1);
		assert!(matches!(
			spent.spend_coins(&TransactionId::new("t2"), &[utxo("NIGHT", 30, 0)]),
			Err(WalletError::Other(_))
		));
		// the original state is untouched
		assert_eq!(state.balance(&TokenType::new("NIGHT")), 70);
	}

	#[test]
	fn revert_only_touches_its_own_transaction() {
		let original = state();
		let t1 = TransactionId::new("t1");
		let t2 = TransactionId::new("t2");
		let change = Utxo {
			intent_hash: t1.clone(),
			output_no: 0,
			..utxo("NIGHT", 12, 0)
		};

		let state = original
			.spend_coins(&t1, &[utxo("NIGHT", 30, 0)])
			.unwrap()
			.watch_coins(&t1, &[change])
			.spend_coins(&t2, &[utxo("GOLD", 5, 2)])
			.unwrap();

		let reverted = state.revert(&t1);
		assert_eq!(reverted.balance(&TokenType::new("NIGHT")), 70);
		assert_eq!(reverted.pending_incoming().count(), 0);
		assert_eq!(reverted.pending_spends().count(), 1);
		assert_eq!(reverted.balance(&TokenType::new("GOLD")), 0);

		assert_eq!(reverted.revert(&t2), original);
	}

	#[test]
	fn confirm_makes_watched_outputs_spendable() {
		let t1 = TransactionId::new("t1");
		let change = Utxo {
			intent_hash: t1.clone(),
			output_no: 0,
			..utxo("NIGHT", 12, 0)
		};

		let state = state()
			.spend_coins(&t1, &[utxo("NIGHT", 30, 0)])
			.unwrap()
			.watch_coins(&t1, &[change])
			.confirm(&t1);

		assert_eq!(state.balance(&TokenType::new("NIGHT")), 52);
		assert_eq!(state.pending_spends().count(), 0);
		assert_eq!(state.pending_incoming().count(), 0);
	}
}
