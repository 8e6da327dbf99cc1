//! Transacting capability.
//!
//! Turns a transfer, a swap or a partially built transaction into a balanced
//! [`UnprovenTransaction`]. Balancing runs twice: first over the fallible
//! section with no fee bookkeeping, then over the guaranteed section with the
//! real fee token, which also pays the overhead of everything the fallible
//! section contains. The resulting spends and watched outputs are returned as a
//! new [`WalletState`] alongside the transaction; nothing is mutated in place.

use crate::balancing::types::to_imbalance;
use crate::balancing::{
	BalanceRecipe, Balancer, Coin, CoinRecipe, CoinSelection, Imbalances, SmallestFirst, TokenType,
	TransactionCostModel,
};
use crate::transaction::{Offer, Output, TransactionBuilder, TransactionId, UnprovenTransaction};
use crate::wallet::address::Address;
use crate::wallet::flavors::WalletFlavor;
use crate::wallet::state::WalletState;
use crate::wallet::types::WalletError;

use chrono::{DateTime, Utc};
use tracing::{debug, info};

/// One payment requested by the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferOutput {
	/// Bech32m encoded recipient address
	pub recipient: String,
	pub token_type: TokenType,
	pub amount: u128,
}

impl TransferOutput {
	pub fn new(recipient: impl Into<String>, token_type: impl Into<TokenType>, amount: u128) -> Self {
		Self {
			recipient: recipient.into(),
			token_type: token_type.into(),
			amount,
		}
	}
}

/// A balanced transaction and the wallet state that results from committing it.
pub struct TransactionResult<F: WalletFlavor> {
	pub transaction: UnprovenTransaction<F::Coin>,
	pub new_state: WalletState<F>,
}

pub struct TransactingCapability<F, S = SmallestFirst> {
	flavor: F,
	cost_model: TransactionCostModel,
	fee_token: TokenType,
	selection: S,
}

impl<F: WalletFlavor> TransactingCapability<F, SmallestFirst> {
	pub fn new(flavor: F, cost_model: TransactionCostModel, fee_token: TokenType) -> Self {
		Self {
			flavor,
			cost_model,
			fee_token,
			selection: SmallestFirst,
		}
	}
}

impl<F, S> TransactingCapability<F, S>
where
	F: WalletFlavor,
	S: CoinSelection<F::Coin>,
{
	/// Replaces the coin selection strategy.
	pub fn with_selection<T: CoinSelection<F::Coin>>(self, selection: T) -> TransactingCapability<F, T> {
		TransactingCapability {
			flavor: self.flavor,
			cost_model: self.cost_model,
			fee_token: self.fee_token,
			selection,
		}
	}

	/// Builds a transaction paying every output in `outputs`.
	pub fn make_transfer(
		&self,
		state: &WalletState<F>,
		outputs: &[TransferOutput],
		ttl: DateTime<Utc>,
	) -> Result<TransactionResult<F>, WalletError> {
		if outputs.is_empty() {
			return Err(WalletError::InvalidAmount(
				"Transfer must have at least one output".to_string(),
			));
		}
		let id = TransactionId::random();
		let mut guaranteed = Offer::default();
		let mut fallible = Offer::default();
		let mut output_no = 0u32;

		for output in outputs {
			let output = self.create_output(state, &id, output, output_no)?;
			output_no += 1;
			if self.settles_in_guaranteed(output.coin.token_type()) {
				guaranteed.outputs.push(output);
			} else {
				fallible.outputs.push(output);
			}
		}

		info!(
			"Building {} transfer {} with {} outputs",
			F::NAME,
			id,
			outputs.len()
		);
		self.complete(
			state,
			id,
			ttl,
			guaranteed,
			fallible,
			&Imbalances::empty(),
			&Imbalances::empty(),
			output_no,
		)
	}

	/// Builds one side of a swap.
	///
	/// The wallet contributes `desired_inputs` without receiving anything for
	/// them and creates `desired_outputs` without paying for them; the
	/// counterparty is expected to balance both sides.
	pub fn init_swap(
		&self,
		state: &WalletState<F>,
		desired_inputs: &[(TokenType, u128)],
		desired_outputs: &[TransferOutput],
		ttl: DateTime<Utc>,
	) -> Result<TransactionResult<F>, WalletError> {
		if desired_inputs.is_empty() && desired_outputs.is_empty() {
			return Err(WalletError::InvalidAmount(
				"Swap must offer or request at least one token".to_string(),
			));
		}
		let id = TransactionId::random();
		let mut guaranteed = Offer::default();
		let mut fallible = Offer::default();
		let mut guaranteed_targets = Vec::new();
		let mut fallible_targets = Vec::new();

		for (token_type, amount) in desired_inputs {
			self.validate_token(token_type)?;
			validate_amount(*amount)?;
			let target = (token_type.clone(), to_imbalance(token_type, *amount)?);
			if self.settles_in_guaranteed(token_type) {
				guaranteed_targets.push(target);
			} else {
				fallible_targets.push(target);
			}
		}

		let mut output_no = 0u32;
		for output in desired_outputs {
			let output = self.create_output(state, &id, output, output_no)?;
			output_no += 1;
			let token_type = output.coin.token_type().clone();
			let target = (token_type.clone(), -to_imbalance(&token_type, output.coin.value())?);
			if self.settles_in_guaranteed(&token_type) {
				guaranteed_targets.push(target);
				guaranteed.outputs.push(output);
			} else {
				fallible_targets.push(target);
				fallible.outputs.push(output);
			}
		}

		info!(
			"Building {} swap {} offering {} and requesting {} token amounts",
			F::NAME,
			id,
			desired_inputs.len(),
			desired_outputs.len()
		);
		self.complete(
			state,
			id,
			ttl,
			guaranteed,
			fallible,
			&Imbalances::from_entries(guaranteed_targets)?,
			&Imbalances::from_entries(fallible_targets)?,
			output_no,
		)
	}

	/// Funds a transaction built elsewhere, e.g. the counterparty's side of a
	/// swap, and pays its fees.
	pub fn balance_transaction(
		&self,
		state: &WalletState<F>,
		transaction: UnprovenTransaction<F::Coin>,
	) -> Result<TransactionResult<F>, WalletError> {
		for coin in transaction
			.inputs()
			.chain(transaction.outputs().map(|output| &output.coin))
		{
			self.validate_token(coin.token_type())?;
		}
		let output_no = u32::try_from(transaction.outputs().count())
			.map_err(|_| WalletError::Other("Transaction has too many outputs".to_string()))?;

		info!("Balancing {} transaction {}", F::NAME, transaction.id);
		self.complete(
			state,
			transaction.id,
			transaction.ttl,
			transaction.guaranteed,
			transaction.fallible,
			&Imbalances::empty(),
			&Imbalances::empty(),
			output_no,
		)
	}

	#[allow(clippy::too_many_arguments)]
	fn complete(
		&self,
		state: &WalletState<F>,
		id: TransactionId,
		ttl: DateTime<Utc>,
		guaranteed: Offer<F::Coin>,
		fallible: Offer<F::Coin>,
		guaranteed_targets: &Imbalances,
		fallible_targets: &Imbalances,
		output_no: u32,
	) -> Result<TransactionResult<F>, WalletError> {
		let available = state.available_coins();

		let fallible_recipe = Balancer::new(TransactionCostModel::ZERO, None, &self.selection)
			.balance(&available, &fallible.imbalances()?, fallible_targets)?;
		info!(
			"Fallible section of {}: {} inputs, {} change outputs",
			id,
			fallible_recipe.inputs.len(),
			fallible_recipe.outputs.len()
		);

		let remaining: Vec<F::Coin> = available
			.into_iter()
			.filter(|coin| !fallible_recipe.inputs.iter().any(|input| input.is_same_coin(coin)))
			.collect();

		let fee_charge = self
			.cost_model
			.overhead_of(
				guaranteed.inputs.len() + fallible.inputs.len() + fallible_recipe.inputs.len(),
				guaranteed.outputs.len() + fallible.outputs.len() + fallible_recipe.outputs.len(),
			)
			.ok_or_else(|| WalletError::Other("Fee overhead overflows".to_string()))?;
		debug!("Charging {} {} for pre-existing inputs and outputs", fee_charge, self.fee_token);
		let guaranteed_imbalances = guaranteed.imbalances()?.merge(&Imbalances::from_entry(
			self.fee_token.clone(),
			-to_imbalance(&self.fee_token, fee_charge)?,
		))?;

		let guaranteed_recipe = Balancer::new(self.cost_model, Some(self.fee_token.clone()), &self.selection)
			.balance(&remaining, &guaranteed_imbalances, guaranteed_targets)?;
		info!(
			"Guaranteed section of {}: {} inputs, {} change outputs",
			id,
			guaranteed_recipe.inputs.len(),
			guaranteed_recipe.outputs.len()
		);

		let spent: Vec<F::Coin> = guaranteed_recipe
			.inputs
			.iter()
			.chain(fallible_recipe.inputs.iter())
			.cloned()
			.collect();

		let mut output_no = output_no;
		let guaranteed = self.attach(state, &id, guaranteed, guaranteed_recipe, &mut output_no);
		let fallible = self.attach(state, &id, fallible, fallible_recipe, &mut output_no);

		let transaction = TransactionBuilder::new()
			.with_id(id)
			.with_ttl(ttl)
			.with_guaranteed_offer(guaranteed)
			.with_fallible_offer(fallible)
			.build()?;

		let incoming: Vec<F::Coin> = transaction
			.outputs()
			.filter(|output| &output.recipient == state.address())
			.map(|output| output.coin.clone())
			.collect();
		let new_state = state
			.spend_coins(&transaction.id, &spent)?
			.watch_coins(&transaction.id, &incoming);

		Ok(TransactionResult {
			transaction,
			new_state,
		})
	}

	/// Appends a recipe's inputs to `offer` and turns its change into outputs
	/// owned by the wallet itself.
	fn attach(
		&self,
		state: &WalletState<F>,
		id: &TransactionId,
		mut offer: Offer<F::Coin>,
		recipe: BalanceRecipe<F::Coin>,
		output_no: &mut u32,
	) -> Offer<F::Coin> {
		offer.inputs.extend(recipe.inputs);
		for change in &recipe.outputs {
			let coin = self
				.flavor
				.create_output(change, state.address(), id, *output_no);
			*output_no += 1;
			offer.outputs.push(Output {
				recipient: state.address().clone(),
				coin,
			});
		}
		offer
	}

	fn create_output(
		&self,
		state: &WalletState<F>,
		id: &TransactionId,
		output: &TransferOutput,
		output_no: u32,
	) -> Result<Output<F::Coin>, WalletError> {
		self.validate_token(&output.token_type)?;
		validate_amount(output.amount)?;
		let recipient = self.parse_recipient(state, &output.recipient)?;
		let coin = self.flavor.create_output(
			&CoinRecipe::new(output.token_type.clone(), output.amount),
			&recipient,
			id,
			output_no,
		);
		Ok(Output { recipient, coin })
	}

	fn settles_in_guaranteed(&self, token_type: &TokenType) -> bool {
		!F::SPLITS_SECTIONS || token_type == &self.fee_token
	}

	fn validate_token(&self, token_type: &TokenType) -> Result<(), WalletError> {
		if self.flavor.supports_token(token_type) {
			Ok(())
		} else {
			Err(WalletError::UnsupportedToken(token_type.clone()))
		}
	}

	fn parse_recipient(&self, state: &WalletState<F>, recipient: &str) -> Result<Address, WalletError> {
		let address = Address::decode(recipient)
			.map_err(|e| WalletError::InvalidRecipient(format!("{}: {}", recipient, e)))?;
		if address.type_ != F::ADDRESS_TYPE {
			return Err(WalletError::InvalidRecipient(format!(
				"{} is a {} address, expected {}",
				recipient,
				address.type_,
				F::ADDRESS_TYPE
			)));
		}
		if address.network != state.address().network {
			return Err(WalletError::InvalidRecipient(format!(
				"{} belongs to another network",
				recipient
			)));
		}
		Ok(address)
	}
}

fn validate_amount(amount: u128) -> Result<(), WalletError> {
	if amount == 0 {
		return Err(WalletError::InvalidAmount(
			"Amount must be strictly positive".to_string(),
		));
	}
	Ok(())
}
