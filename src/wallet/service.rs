//! Wallet service.
//!
//! Owns the wallet state behind a single-writer lock and drives a transaction
//! from balancing through proving and submission. Building a transaction and
//! committing its spends happen in one critical section, so two concurrent
//! calls never select the same coin. Proving and submission run outside the
//! lock; if either fails, or the call is dropped before it finishes, the
//! transaction's spends and watched outputs are reverted.

use crate::balancing::{CoinSelection, SmallestFirst, TokenType};
use crate::transaction::{
	ProvenTransaction, Prover, Submitter, TransactionId, UnprovenTransaction, WaitUntil,
};
use crate::wallet::flavors::WalletFlavor;
use crate::wallet::state::WalletState;
use crate::wallet::transacting::{TransactingCapability, TransactionResult, TransferOutput};
use crate::wallet::types::WalletError;

use chrono::Utc;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::Duration;
use tracing::{error, info, warn};

pub struct WalletService<F: WalletFlavor, S = SmallestFirst> {
	state: RwLock<WalletState<F>>,
	capability: TransactingCapability<F, S>,
	prover: Arc<dyn Prover<F::Coin>>,
	submitter: Arc<dyn Submitter<F::Coin>>,
	wait_until: WaitUntil,
	ttl: Duration,
}

impl<F, S> WalletService<F, S>
where
	F: WalletFlavor,
	S: CoinSelection<F::Coin>,
{
	pub fn new(
		state: WalletState<F>,
		capability: TransactingCapability<F, S>,
		prover: Arc<dyn Prover<F::Coin>>,
		submitter: Arc<dyn Submitter<F::Coin>>,
	) -> Self {
		Self {
			state: RwLock::new(state),
			capability,
			prover,
			submitter,
			wait_until: WaitUntil::default(),
			ttl: Duration::from_secs(3600),
		}
	}

	pub fn with_wait_until(mut self, wait_until: WaitUntil) -> Self {
		self.wait_until = wait_until;
		self
	}

	/// Lifetime of the transactions this service builds.
	pub fn with_ttl(mut self, ttl: Duration) -> Self {
		self.ttl = ttl;
		self
	}

	/// Snapshot of the current wallet state.
	pub fn state(&self) -> WalletState<F> {
		read(&self.state).clone()
	}

	pub fn balance(&self, token_type: &TokenType) -> u128 {
		read(&self.state).balance(token_type)
	}

	/// Marks `transaction` as applied on chain.
	pub fn confirm(&self, transaction: &TransactionId) {
		let mut state = write(&self.state);
		*state = state.confirm(transaction);
		info!("Confirmed transaction {}", transaction);
	}

	/// Releases the coins of a transaction that will never be applied, e.g. a
	/// swap the counterparty abandoned.
	pub fn revert(&self, transaction: &TransactionId) {
		let mut state = write(&self.state);
		*state = state.revert(transaction);
		warn!("Reverted transaction {}", transaction);
	}

	/// Pays `outputs`, then proves and submits the transaction. Returns the
	/// submission identifier.
	pub async fn transfer_transaction(&self, outputs: &[TransferOutput]) -> Result<String, WalletError> {
		let ttl = self.ttl_from_now()?;
		let transaction = self.commit(|capability, state| capability.make_transfer(state, outputs, ttl))?;
		self.prove_and_submit(transaction).await
	}

	/// Builds and proves one side of a swap. The proven transaction is handed to
	/// the counterparty; its coins stay pending until [`Self::confirm`] or
	/// [`Self::revert`].
	pub async fn swap_transaction(
		&self,
		desired_inputs: &[(TokenType, u128)],
		desired_outputs: &[TransferOutput],
	) -> Result<ProvenTransaction<F::Coin>, WalletError> {
		let ttl = self.ttl_from_now()?;
		let transaction = self.commit(|capability, state| {
			capability.init_swap(state, desired_inputs, desired_outputs, ttl)
		})?;

		let pending = PendingRevert::new(&self.state, transaction.id.clone());
		let proven = self.prove(transaction).await?;
		pending.disarm();
		Ok(proven)
	}

	/// Funds and pays the fees of `transaction`, then proves and submits it.
	pub async fn balance_and_submit(
		&self,
		transaction: UnprovenTransaction<F::Coin>,
	) -> Result<String, WalletError> {
		let transaction =
			self.commit(|capability, state| capability.balance_transaction(state, transaction))?;
		self.prove_and_submit(transaction).await
	}

	fn ttl_from_now(&self) -> Result<chrono::DateTime<Utc>, WalletError> {
		let ttl = chrono::Duration::from_std(self.ttl)
			.map_err(|e| WalletError::Other(format!("Invalid transaction TTL: {}", e)))?;
		Ok(Utc::now() + ttl)
	}

	/// Builds against the current state and commits the result under a single
	/// write lock.
	fn commit(
		&self,
		build: impl FnOnce(
			&TransactingCapability<F, S>,
			&WalletState<F>,
		) -> Result<TransactionResult<F>, WalletError>,
	) -> Result<UnprovenTransaction<F::Coin>, WalletError> {
		let mut state = write(&self.state);
		let TransactionResult {
			transaction,
			new_state,
		} = build(&self.capability, &state)?;
		*state = new_state;
		Ok(transaction)
	}

	async fn prove_and_submit(
		&self,
		transaction: UnprovenTransaction<F::Coin>,
	) -> Result<String, WalletError> {
		let pending = PendingRevert::new(&self.state, transaction.id.clone());
		let proven = self.prove(transaction).await?;

		let submission = self
			.submitter
			.submit(&proven, self.wait_until)
			.await
			.map_err(|e| {
				error!("Failed to submit transaction {}: {}", proven.id(), e);
				e
			})?;
		pending.disarm();

		info!("Submitted transaction {} as {}", proven.id(), submission);
		Ok(submission)
	}

	async fn prove(
		&self,
		transaction: UnprovenTransaction<F::Coin>,
	) -> Result<ProvenTransaction<F::Coin>, WalletError> {
		let id = transaction.id.clone();
		let proven = self.prover.prove(transaction).await.map_err(|e| {
			error!("Failed to prove transaction {}: {}", id, e);
			e
		})?;
		info!("Proved transaction {}", id);
		Ok(proven)
	}
}

/// Reverts a committed transaction when dropped while still armed.
struct PendingRevert<'a, F: WalletFlavor> {
	state: &'a RwLock<WalletState<F>>,
	transaction: Option<TransactionId>,
}

impl<'a, F: WalletFlavor> PendingRevert<'a, F> {
	fn new(state: &'a RwLock<WalletState<F>>, transaction: TransactionId) -> Self {
		Self {
			state,
			transaction: Some(transaction),
		}
	}

	fn disarm(mut self) {
		self.transaction = None;
	}
}

impl<F: WalletFlavor> Drop for PendingRevert<'_, F> {
	fn drop(&mut self) {
		if let Some(transaction) = self.transaction.take() {
			warn!("Reverting transaction {}", transaction);
			let mut state = write(self.state);
			*state = state.revert(&transaction);
		}
	}
}

// A panic while holding the lock cannot leave a half-applied state: every
// writer replaces the whole state with one assignment.
fn read<F: WalletFlavor>(lock: &RwLock<WalletState<F>>) -> RwLockReadGuard<'_, WalletState<F>> {
	lock.read().unwrap_or_else(|poisoned| {
		warn!("Wallet state lock was poisoned, recovering");
		poisoned.into_inner()
	})
}

fn write<F: WalletFlavor>(lock: &RwLock<WalletState<F>>) -> RwLockWriteGuard<'_, WalletState<F>> {
	lock.write().unwrap_or_else(|poisoned| {
		warn!("Wallet state lock was poisoned, recovering");
		poisoned.into_inner()
	})
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::balancing::TransactionCostModel;
	use crate::transaction::TransactionError;
	use crate::wallet::address::{Address, NetworkId, UNSHIELDED_ADDRESS_TYPE};
	use crate::wallet::flavors::{UnshieldedFlavor, Utxo};
	use async_trait::async_trait;
	use std::sync::Mutex;

	struct MockProver {
		fail: bool,
	}

	#[async_trait]
	impl Prover<Utxo> for MockProver {
		async fn prove(
			&self,
			transaction: UnprovenTransaction<Utxo>,
		) -> Result<ProvenTransaction<Utxo>, TransactionError> {
			if self.fail {
				return Err(TransactionError::ProvingError("prover offline".to_string()));
			}
			Ok(ProvenTransaction {
				transaction,
				proof: vec![1, 2, 3],
			})
		}
	}

	enum Behaviour {
		Accept,
		Reject,
		Hang,
	}

	struct MockSubmitter {
		behaviour: Behaviour,
		submitted: Mutex<Vec<ProvenTransaction<Utxo>>>,
	}

	impl MockSubmitter {
		fn new(behaviour: Behaviour) -> Arc<Self> {
			Arc::new(Self {
				behaviour,
				submitted: Mutex::new(Vec::new()),
			})
		}
	}

	#[async_trait]
	impl Submitter<Utxo> for MockSubmitter {
		async fn submit(
			&self,
			transaction: &ProvenTransaction<Utxo>,
			_wait_until: WaitUntil,
		) -> Result<String, TransactionError> {
			match self.behaviour {
				Behaviour::Accept => {
					self.submitted.lock().unwrap().push(transaction.clone());
					Ok(transaction.id().to_string())
				}
				Behaviour::Reject => Err(TransactionError::SubmissionError("node rejected".to_string())),
				Behaviour::Hang => std::future::pending().await,
			}
		}
	}

	fn own_address() -> Address {
		Address::new(UNSHIELDED_ADDRESS_TYPE, NetworkId::TestNet, vec![1; 32])
	}

	fn recipient() -> String {
		Address::new(UNSHIELDED_ADDRESS_TYPE, NetworkId::TestNet, vec![2; 32])
			.encode()
			.unwrap()
	}

	fn utxo(token_type: &str, value: u128, output_no: u32) -> Utxo {
		Utxo {
			owner: own_address(),
			token_type: TokenType::new(token_type),
			value,
			intent_hash: TransactionId::new("genesis"),
			output_no,
		}
	}

	fn service(fail_proving: bool, submitter: Arc<MockSubmitter>) -> WalletService<UnshieldedFlavor> {
		let state = WalletState::new(own_address()).with_coins(vec![
			utxo("NIGHT", 30, 0),
			utxo("NIGHT", 40, 1),
			utxo("GOLD", 5, 2),
		]);
		let capability = TransactingCapability::new(
			UnshieldedFlavor,
			TransactionCostModel::new(2, 3),
			TokenType::new("NIGHT"),
		);
		WalletService::new(
			state,
			capability,
			Arc::new(MockProver { fail: fail_proving }),
			submitter,
		)
	}

	fn transfer(amount: u128) -> Vec<TransferOutput> {
		vec![TransferOutput::new(recipient(), "NIGHT", amount)]
	}

	#[tokio::test]
	async fn successful_transfer_keeps_spends_pending_until_confirmed() {
		let submitter = MockSubmitter::new(Behaviour::Accept);
		let service = service(false, submitter.clone());

		let submission = service.transfer_transaction(&transfer(10)).await.unwrap();
		assert_eq!(service.balance(&TokenType::new("NIGHT")), 40);

		let id = TransactionId::new(submission);
		service.confirm(&id);
		// 40 untouched plus the 12 change
		assert_eq!(service.balance(&TokenType::new("NIGHT")), 52);
		assert_eq!(submitter.submitted.lock().unwrap().len(), 1);
	}

	#[tokio::test]
	async fn concurrent_transfers_never_share_a_coin() {
		let submitter = MockSubmitter::new(Behaviour::Accept);
		let service = service(false, submitter.clone());

		let (first_outputs, second_outputs) = (transfer(10), transfer(10));
		let (first, second) = tokio::join!(
			service.transfer_transaction(&first_outputs),
			service.transfer_transaction(&second_outputs)
		);
		first.unwrap();
		second.unwrap();

		let submitted = submitter.submitted.lock().unwrap();
		let first_inputs = &submitted[0].transaction.guaranteed.inputs;
		let second_inputs = &submitted[1].transaction.guaranteed.inputs;
		assert!(first_inputs.iter().all(|coin| !second_inputs.contains(coin)));
		assert_eq!(service.balance(&TokenType::new("NIGHT")), 0);
	}

	#[tokio::test]
	async fn proving_failure_restores_the_prior_state() {
		let service = service(true, MockSubmitter::new(Behaviour::Accept));
		let before = service.state();

		let result = service.transfer_transaction(&transfer(10)).await;
		assert!(matches!(
			result,
			Err(WalletError::Transaction(TransactionError::ProvingError(_)))
		));
		assert_eq!(service.state(), before);
	}

	#[tokio::test]
	async fn submission_failure_restores_the_prior_state() {
		let service = service(false, MockSubmitter::new(Behaviour::Reject));
		let before = service.state();

		let result = service.transfer_transaction(&transfer(10)).await;
		assert!(matches!(
			result,
			Err(WalletError::Transaction(TransactionError::SubmissionError(_)))
		));
		assert_eq!(service.state(), before);
	}

	#[tokio::test]
	async fn cancelled_submission_restores_the_prior_state() {
		let service = service(false, MockSubmitter::new(Behaviour::Hang));
		let before = service.state();

		let result = tokio::time::timeout(
			Duration::from_millis(50),
			service.transfer_transaction(&transfer(10)),
		)
		.await;
		assert!(result.is_err());
		assert_eq!(service.state(), before);
	}

	#[tokio::test]
	async fn insufficient_funds_leaves_every_coin_available() {
		let service = service(false, MockSubmitter::new(Behaviour::Accept));

		let result = service
			.transfer_transaction(&[TransferOutput::new(recipient(), "GOLD", 50)])
			.await;
		assert_eq!(
			result,
			Err(WalletError::InsufficientFunds {
				token_type: TokenType::new("GOLD")
			})
		);
		assert_eq!(service.state().available_coins().len(), 3);
		assert_eq!(service.balance(&TokenType::new("GOLD")), 5);
	}

	#[tokio::test]
	async fn abandoned_swap_can_be_released() {
		let service = service(false, MockSubmitter::new(Behaviour::Accept));
		let before = service.state();

		let own = own_address().encode().unwrap();
		let proven = service
			.swap_transaction(
				&[(TokenType::new("GOLD"), 5)],
				&[TransferOutput::new(own, "SILVER", 7)],
			)
			.await
			.unwrap();
		assert_eq!(service.balance(&TokenType::new("GOLD")), 0);

		service.revert(proven.id());
		assert_eq!(service.state(), before);
	}

	#[tokio::test]
	async fn poisoned_state_lock_is_recovered() {
		let service = service(false, MockSubmitter::new(Behaviour::Accept));
		let before = service.state();

		let _ = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
			let _guard = service.state.write().unwrap();
			panic!("writer died while holding the lock");
		}));
		assert!(service.state.is_poisoned());

		assert_eq!(service.state(), before);
		service.transfer_transaction(&transfer(10)).await.unwrap();
		assert_eq!(service.balance(&TokenType::new("NIGHT")), 40);
	}
}
