use crate::balancing::{BalancingError, TokenType};
use crate::transaction::TransactionError;

/// Errors surfaced by the transacting capability and the wallet service
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WalletError {
	#[error("Insufficient funds for token type {token_type}")]
	InsufficientFunds { token_type: TokenType },

	#[error("Invalid amount: {0}")]
	InvalidAmount(String),

	#[error("Invalid recipient: {0}")]
	InvalidRecipient(String),

	#[error("Token type {0} is not supported by this wallet")]
	UnsupportedToken(TokenType),

	#[error("Transaction error: {0}")]
	Transaction(#[from] TransactionError),

	#[error("Wallet error: {0}")]
	Other(String),
}

impl From<BalancingError> for WalletError {
	fn from(error: BalancingError) -> Self {
		match error {
			BalancingError::InsufficientFunds { token_type } => {
				WalletError::InsufficientFunds { token_type }
			}
			BalancingError::Other(cause) => WalletError::Other(cause),
		}
	}
}
