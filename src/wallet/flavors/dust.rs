use crate::balancing::{Coin, CoinRecipe, TokenType};
use crate::transaction::TransactionId;
use crate::wallet::address::{Address, DUST_ADDRESS_TYPE};
use crate::wallet::flavors::WalletFlavor;

use serde::{Deserialize, Serialize};

/// Dust coin. Dust only pays fees, so a dust wallet settles everything in the
/// guaranteed section and handles a single token type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DustCoin {
	pub token_type: TokenType,
	pub value: u128,
	pub origin: TransactionId,
	pub seq: u32,
}

impl Coin for DustCoin {
	fn token_type(&self) -> &TokenType {
		&self.token_type
	}

	fn value(&self) -> u128 {
		self.value
	}

	fn is_same_coin(&self, other: &Self) -> bool {
		self.origin == other.origin && self.seq == other.seq
	}
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DustFlavor {
	token_type: TokenType,
}

impl DustFlavor {
	pub fn new(token_type: TokenType) -> Self {
		Self { token_type }
	}

	pub fn token_type(&self) -> &TokenType {
		&self.token_type
	}
}

impl WalletFlavor for DustFlavor {
	type Coin = DustCoin;
	type CoinId = (TransactionId, u32);

	const NAME: &'static str = "dust";
	const ADDRESS_TYPE: &'static str = DUST_ADDRESS_TYPE;
	const SPLITS_SECTIONS: bool = false;

	fn coin_id(coin: &DustCoin) -> Self::CoinId {
		(coin.origin.clone(), coin.seq)
	}

	fn create_output(
		&self,
		recipe: &CoinRecipe,
		_recipient: &Address,
		transaction: &TransactionId,
		output_no: u32,
	) -> DustCoin {
		DustCoin {
			token_type: recipe.token_type.clone(),
			value: recipe.value,
			origin: transaction.clone(),
			seq: output_no,
		}
	}

	fn supports_token(&self, token_type: &TokenType) -> bool {
		&self.token_type == token_type
	}
}
