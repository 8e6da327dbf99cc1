//! Wallet flavors.
//!
//! A flavor tells the transacting capability what its coins look like, how a
//! coin is identified in wallet state, how a new output coin is created for a
//! recipient, and whether the flavor settles in two sections or only in the
//! guaranteed one. The balancing engine itself is shared by all of them.

/// Dust: fee-only token, guaranteed section only
pub mod dust;
/// Shielded coins identified by their nonce
pub mod shielded;
/// Unshielded UTXOs identified by transaction and output number
pub mod unshielded;

pub use dust::{DustCoin, DustFlavor};
pub use shielded::{ShieldedCoin, ShieldedFlavor};
pub use unshielded::{UnshieldedFlavor, Utxo};

use crate::balancing::{Coin, CoinRecipe, TokenType};
use crate::transaction::TransactionId;
use crate::wallet::address::Address;

use serde::Serialize;
use std::fmt;

pub trait WalletFlavor: Send + Sync + 'static {
	/// Spendable coin owned by this kind of wallet
	type Coin: Coin + Clone + fmt::Debug + PartialEq + Serialize + Send + Sync + 'static;
	/// Identity under which wallet state tracks a coin
	type CoinId: Clone + Ord + fmt::Debug + Send + Sync + 'static;

	/// Name used in logs
	const NAME: &'static str;
	/// Address type accepted as a recipient
	const ADDRESS_TYPE: &'static str;
	/// Whether non-fee movements settle in the fallible section
	const SPLITS_SECTIONS: bool = true;

	fn coin_id(coin: &Self::Coin) -> Self::CoinId;

	/// Creates the coin `recipient` will own for output `output_no` of
	/// `transaction`.
	fn create_output(
		&self,
		recipe: &CoinRecipe,
		recipient: &Address,
		transaction: &TransactionId,
		output_no: u32,
	) -> Self::Coin;

	fn supports_token(&self, _token_type: &TokenType) -> bool {
		true
	}
}
