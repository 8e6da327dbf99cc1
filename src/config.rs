//!
//! Runtime configuration.
//!
//! Every setting has a default suited to a local development node; each can be
//! overridden through a `MIDNIGHT_*` environment variable.

use crate::balancing::{TokenType, TransactionCostModel};
use crate::transaction::WaitUntil;
use crate::wallet::address::NetworkId;

use std::env;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

const DEFAULT_PROOF_SERVER_URL: &str = "http://localhost:6300";
const DEFAULT_FEE_TOKEN: &str = "NIGHT";
const DEFAULT_TX_TTL_SECS: u64 = 3600;
const DEFAULT_PROVING_TIMEOUT_SECS: u64 = 300;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
	#[error("{key} has an invalid value '{value}': {reason}")]
	InvalidValue {
		key: String,
		value: String,
		reason: String,
	},
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WalletConfig {
	pub network: NetworkId,
	pub fee_token: TokenType,
	pub cost_model: TransactionCostModel,
	/// How long a built transaction stays valid
	pub transaction_ttl: Duration,
	pub proof_server_url: String,
	/// Upper bound on proof server retries
	pub proving_timeout: Duration,
	pub wait_until: WaitUntil,
}

impl Default for WalletConfig {
	fn default() -> Self {
		Self {
			network: NetworkId::TestNet,
			fee_token: TokenType::new(DEFAULT_FEE_TOKEN),
			cost_model: TransactionCostModel::ZERO,
			transaction_ttl: Duration::from_secs(DEFAULT_TX_TTL_SECS),
			proof_server_url: DEFAULT_PROOF_SERVER_URL.to_string(),
			proving_timeout: Duration::from_secs(DEFAULT_PROVING_TIMEOUT_SECS),
			wait_until: WaitUntil::default(),
		}
	}
}

impl WalletConfig {
	pub fn from_env() -> Result<Self, ConfigError> {
		Self::from_lookup(|key| env::var(key).ok())
	}

	/// Builds a configuration from `lookup`, falling back to the default for
	/// every key that is missing or blank.
	pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
		let lookup = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());
		let defaults = Self::default();

		let network = parse_or("MIDNIGHT_NETWORK", lookup("MIDNIGHT_NETWORK"), defaults.network)?;
		let fee_token = lookup("MIDNIGHT_FEE_TOKEN")
			.map(TokenType::new)
			.unwrap_or(defaults.fee_token);
		let input_fee_overhead = parse_or(
			"MIDNIGHT_INPUT_FEE_OVERHEAD",
			lookup("MIDNIGHT_INPUT_FEE_OVERHEAD"),
			defaults.cost_model.input_fee_overhead,
		)?;
		let output_fee_overhead = parse_or(
			"MIDNIGHT_OUTPUT_FEE_OVERHEAD",
			lookup("MIDNIGHT_OUTPUT_FEE_OVERHEAD"),
			defaults.cost_model.output_fee_overhead,
		)?;
		let ttl_secs = parse_or(
			"MIDNIGHT_TX_TTL_SECS",
			lookup("MIDNIGHT_TX_TTL_SECS"),
			defaults.transaction_ttl.as_secs(),
		)?;
		let proof_server_url = lookup("MIDNIGHT_PROOF_SERVER_URL").unwrap_or(defaults.proof_server_url);
		let wait_until = parse_or(
			"MIDNIGHT_WAIT_UNTIL",
			lookup("MIDNIGHT_WAIT_UNTIL"),
			defaults.wait_until,
		)?;
		let proving_timeout_secs = parse_or(
			"MIDNIGHT_PROVING_TIMEOUT_SECS",
			lookup("MIDNIGHT_PROVING_TIMEOUT_SECS"),
			defaults.proving_timeout.as_secs(),
		)?;

		let config = Self {
			network,
			fee_token,
			cost_model: TransactionCostModel::new(input_fee_overhead, output_fee_overhead),
			transaction_ttl: Duration::from_secs(ttl_secs),
			proof_server_url,
			proving_timeout: Duration::from_secs(proving_timeout_secs),
			wait_until,
		};
		config.validate()?;
		Ok(config)
	}

	pub fn validate(&self) -> Result<(), ConfigError> {
		if self.transaction_ttl.is_zero() {
			return Err(invalid("MIDNIGHT_TX_TTL_SECS", "0", "must be greater than zero"));
		}
		if let Err(e) = reqwest::Url::parse(&self.proof_server_url) {
			return Err(invalid(
				"MIDNIGHT_PROOF_SERVER_URL",
				&self.proof_server_url,
				&e.to_string(),
			));
		}
		Ok(())
	}
}

fn parse_or<T>(key: &str, raw: Option<String>, default: T) -> Result<T, ConfigError>
where
	T: FromStr,
	T::Err: std::fmt::Display,
{
	match raw {
		Some(value) => value
			.trim()
			.parse()
			.map_err(|e: T::Err| invalid(key, &value, &e.to_string())),
		None => Ok(default),
	}
}

fn invalid(key: &str, value: &str, reason: &str) -> ConfigError {
	ConfigError::InvalidValue {
		key: key.to_string(),
		value: value.to_string(),
		reason: reason.to_string(),
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::collections::HashMap;

	fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
		let vars: HashMap<String, String> = vars
			.iter()
			.map(|(key, value)| (key.to_string(), value.to_string()))
			.collect();
		move |key| vars.get(key).cloned()
	}

	#[test]
	fn missing_and_blank_values_use_defaults() {
		let config = WalletConfig::from_lookup(lookup(&[("MIDNIGHT_FEE_TOKEN", "  ")])).unwrap();
		assert_eq!(config, WalletConfig::default());
	}

	#[test]
	fn reads_every_setting() {
		let config = WalletConfig::from_lookup(lookup(&[
			("MIDNIGHT_NETWORK", "undeployed"),
			("MIDNIGHT_FEE_TOKEN", "DUST"),
			("MIDNIGHT_INPUT_FEE_OVERHEAD", "2"),
			("MIDNIGHT_OUTPUT_FEE_OVERHEAD", "3"),
			("MIDNIGHT_TX_TTL_SECS", "60"),
			("MIDNIGHT_PROOF_SERVER_URL", "http://prover:6300"),
			("MIDNIGHT_WAIT_UNTIL", "finalized"),
			("MIDNIGHT_PROVING_TIMEOUT_SECS", "30"),
		]))
		.unwrap();

		assert_eq!(config.network, NetworkId::Undeployed);
		assert_eq!(config.fee_token, TokenType::new("DUST"));
		assert_eq!(config.cost_model, TransactionCostModel::new(2, 3));
		assert_eq!(config.transaction_ttl, Duration::from_secs(60));
		assert_eq!(config.proof_server_url, "http://prover:6300");
		assert_eq!(config.wait_until, WaitUntil::Finalized);
		assert_eq!(config.proving_timeout, Duration::from_secs(30));
	}

	#[test]
	fn invalid_values_name_the_variable() {
		let err = WalletConfig::from_lookup(lookup(&[("MIDNIGHT_INPUT_FEE_OVERHEAD", "-1")])).unwrap_err();
		assert!(matches!(
			err,
			ConfigError::InvalidValue { ref key, .. } if key == "MIDNIGHT_INPUT_FEE_OVERHEAD"
		));

		assert!(WalletConfig::from_lookup(lookup(&[("MIDNIGHT_TX_TTL_SECS", "0")])).is_err());
		assert!(WalletConfig::from_lookup(lookup(&[("MIDNIGHT_PROOF_SERVER_URL", "nope")])).is_err());
		assert!(WalletConfig::from_lookup(lookup(&[("MIDNIGHT_NETWORK", "moon")])).is_err());
	}
}
