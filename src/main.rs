use async_trait::async_trait;
use midnight_wallet_balancer::balancing::TokenType;
use midnight_wallet_balancer::config::WalletConfig;
use midnight_wallet_balancer::transaction::{
	MIDNIGHT_TOKEN_DECIMALS, ProvenTransaction, RemoteProofServer, Submitter, TransactionError,
	TransactionId, WaitUntil,
};
use midnight_wallet_balancer::utils::format_token_amount;
use midnight_wallet_balancer::wallet::flavors::Utxo;
use midnight_wallet_balancer::wallet::{
	Address, TransactingCapability, TransferOutput, UnshieldedFlavor, WalletService, WalletState,
	address::UNSHIELDED_ADDRESS_TYPE,
};
use rand::Rng;
use std::sync::Arc;
use tracing::{error, info};

/// Logs the transaction instead of sending it to a node.
struct DryRunSubmitter;

#[async_trait]
impl Submitter<Utxo> for DryRunSubmitter {
	async fn submit(
		&self,
		transaction: &ProvenTransaction<Utxo>,
		wait_until: WaitUntil,
	) -> Result<String, TransactionError> {
		let json = serde_json::to_string_pretty(&transaction.transaction).map_err(|e| {
			TransactionError::SubmissionError(format!("Failed to serialize transaction: {}", e))
		})?;
		info!("Dry run submission ({:?}):\n{}", wait_until, json);
		Ok(transaction.id().to_string())
	}
}

/// Wallet seeded with one genesis coin of `fee_token` per value.
fn demo_state(own_address: Address, fee_token: &TokenType, values: &[u128]) -> WalletState<UnshieldedFlavor> {
	let genesis = TransactionId::new("genesis");
	let coins: Vec<Utxo> = values
		.iter()
		.enumerate()
		.map(|(output_no, value)| Utxo {
			owner: own_address.clone(),
			token_type: fee_token.clone(),
			value: *value,
			intent_hash: genesis.clone(),
			output_no: output_no as u32,
		})
		.collect();
	WalletState::new(own_address).with_coins(coins)
}

fn random_bytes() -> Vec<u8> {
	let mut bytes = [0u8; 32];
	rand::rng().fill(&mut bytes);
	bytes.to_vec()
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
	tracing_subscriber::fmt()
		.with_env_filter(
			tracing_subscriber::EnvFilter::from_default_env()
				.add_directive(tracing::Level::INFO.into()),
		)
		.with_target(false)
		.with_thread_ids(false)
		.with_thread_names(false)
		.with_file(false)
		.with_line_number(false)
		.with_timer(tracing_subscriber::fmt::time::time())
		.init();

	let config = match WalletConfig::from_env() {
		Ok(config) => config,
		Err(e) => {
			error!("Invalid configuration: {}", e);
			return;
		}
	};
	info!("Starting wallet on {:?}", config.network);

	let own_address = Address::new(UNSHIELDED_ADDRESS_TYPE, config.network, random_bytes());
	let destination = Address::new(UNSHIELDED_ADDRESS_TYPE, config.network, random_bytes());
	let destination = match destination.encode() {
		Ok(encoded) => encoded,
		Err(e) => {
			error!("Failed to encode destination address: {}", e);
			return;
		}
	};

	let unit = 10u128.pow(MIDNIGHT_TOKEN_DECIMALS);
	let state = demo_state(own_address, &config.fee_token, &[5 * unit, 20 * unit, 50 * unit]);

	let prover = match RemoteProofServer::new(config.proof_server_url.clone(), config.proving_timeout) {
		Ok(prover) => prover,
		Err(e) => {
			error!("Failed to create proof server client: {}", e);
			return;
		}
	};
	info!("Using proof server at {}", config.proof_server_url);

	let capability = TransactingCapability::new(UnshieldedFlavor, config.cost_model, config.fee_token.clone());
	let service = WalletService::new(state, capability, Arc::new(prover), Arc::new(DryRunSubmitter))
		.with_wait_until(config.wait_until)
		.with_ttl(config.transaction_ttl);

	let fee_token: &TokenType = &config.fee_token;
	info!(
		"Wallet balance: {} {}",
		format_token_amount(service.balance(fee_token), MIDNIGHT_TOKEN_DECIMALS),
		fee_token
	);

	let amount = 12 * unit;
	info!(
		"Sending {} {} to {}",
		format_token_amount(amount, MIDNIGHT_TOKEN_DECIMALS),
		fee_token,
		destination
	);
	match service
		.transfer_transaction(&[TransferOutput::new(destination, fee_token.clone(), amount)])
		.await
	{
		Ok(id) => info!("Transaction {} submitted", id),
		Err(e) => error!("Transfer failed: {}", e),
	}

	info!(
		"Wallet balance: {} {}",
		format_token_amount(service.balance(fee_token), MIDNIGHT_TOKEN_DECIMALS),
		fee_token
	);
}
