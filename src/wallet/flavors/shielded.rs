use crate::balancing::{Coin, CoinRecipe, TokenType};
use crate::transaction::TransactionId;
use crate::wallet::address::{Address, SHIELDED_ADDRESS_TYPE};
use crate::wallet::flavors::WalletFlavor;

use rand::Rng;
use serde::{Deserialize, Serialize};

/// Shielded coin. Its nonce is the identity the wallet tracks it under; the
/// commitment and nullifier are derived from it outside this crate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShieldedCoin {
	pub token_type: TokenType,
	pub value: u128,
	pub nonce: [u8; 32],
}

impl ShieldedCoin {
	pub fn new(token_type: TokenType, value: u128) -> Self {
		let mut nonce = [0u8; 32];
		rand::rng().fill(&mut nonce);
		Self {
			token_type,
			value,
			nonce,
		}
	}
}

impl Coin for ShieldedCoin {
	fn token_type(&self) -> &TokenType {
		&self.token_type
	}

	fn value(&self) -> u128 {
		self.value
	}

	fn is_same_coin(&self, other: &Self) -> bool {
		self.nonce == other.nonce
	}
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ShieldedFlavor;

impl WalletFlavor for ShieldedFlavor {
	type Coin = ShieldedCoin;
	type CoinId = [u8; 32];

	const NAME: &'static str = "shielded";
	const ADDRESS_TYPE: &'static str = SHIELDED_ADDRESS_TYPE;

	fn coin_id(coin: &ShieldedCoin) -> [u8; 32] {
		coin.nonce
	}

	fn create_output(
		&self,
		recipe: &CoinRecipe,
		_recipient: &Address,
		_transaction: &TransactionId,
		_output_no: u32,
	) -> ShieldedCoin {
		ShieldedCoin::new(recipe.token_type.clone(), recipe.value)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::wallet::address::NetworkId;

	#[test]
	fn every_output_gets_a_fresh_nonce() {
		let owner = Address::new(SHIELDED_ADDRESS_TYPE, NetworkId::TestNet, vec![1; 64]);
		let tx = TransactionId::new("bb");
		let recipe = CoinRecipe::new("GOLD", 3);

		let a = ShieldedFlavor.create_output(&recipe, &owner, &tx, 0);
		let b = ShieldedFlavor.create_output(&recipe, &owner, &tx, 0);

		assert_eq!(a.token_type, TokenType::new("GOLD"));
		assert!(!a.is_same_coin(&b));
		assert!(a.is_same_coin(&a.clone()));
	}
}
