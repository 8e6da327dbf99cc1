use crate::balancing::{Coin, CoinRecipe, TokenType};
use crate::transaction::TransactionId;
use crate::wallet::address::{Address, UNSHIELDED_ADDRESS_TYPE};
use crate::wallet::flavors::WalletFlavor;

use serde::{Deserialize, Serialize};

/// Unshielded coin, located by the transaction that created it and its
/// output number.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Utxo {
	pub owner: Address,
	pub token_type: TokenType,
	pub value: u128,
	pub intent_hash: TransactionId,
	pub output_no: u32,
}

impl Coin for Utxo {
	fn token_type(&self) -> &TokenType {
		&self.token_type
	}

	fn value(&self) -> u128 {
		self.value
	}

	fn is_same_coin(&self, other: &Self) -> bool {
		self.intent_hash == other.intent_hash && self.output_no == other.output_no
	}
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UnshieldedFlavor;

impl WalletFlavor for UnshieldedFlavor {
	type Coin = Utxo;
	type CoinId = (TransactionId, u32);

	const NAME: &'static str = "unshielded";
	const ADDRESS_TYPE: &'static str = UNSHIELDED_ADDRESS_TYPE;

	fn coin_id(coin: &Utxo) -> Self::CoinId {
		(coin.intent_hash.clone(), coin.output_no)
	}

	fn create_output(
		&self,
		recipe: &CoinRecipe,
		recipient: &Address,
		transaction: &TransactionId,
		output_no: u32,
	) -> Utxo {
		Utxo {
			owner: recipient.clone(),
			token_type: recipe.token_type.clone(),
			value: recipe.value,
			intent_hash: transaction.clone(),
			output_no,
		}
	}
}
