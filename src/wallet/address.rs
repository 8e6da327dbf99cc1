use bech32::{Bech32m, Hrp};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Address type of unshielded wallets.
pub const UNSHIELDED_ADDRESS_TYPE: &str = "addr";
/// Address type of shielded wallets.
pub const SHIELDED_ADDRESS_TYPE: &str = "shield-addr";
/// Address type of dust wallets.
pub const DUST_ADDRESS_TYPE: &str = "dust-addr";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AddressError {
	#[error("bech32 decoding failed: {0}")]
	Decode(String),
	#[error("bech32 encoding failed: {0}")]
	Encode(String),
	#[error("prefix first part != 'mn'")]
	PrefixInvalidConstant,
	#[error("prefix missing type")]
	PrefixMissingType,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NetworkId {
	MainNet,
	DevNet,
	TestNet,
	Undeployed,
}

impl NetworkId {
	/// Network part of the address prefix; mainnet has none.
	pub fn address_suffix(&self) -> Option<&'static str> {
		match self {
			NetworkId::MainNet => None,
			NetworkId::DevNet => Some("dev"),
			NetworkId::TestNet => Some("test"),
			NetworkId::Undeployed => Some("undeployed"),
		}
	}
}

impl std::str::FromStr for NetworkId {
	type Err = String;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s.to_ascii_lowercase().as_str() {
			"mainnet" | "main" => Ok(NetworkId::MainNet),
			"devnet" | "dev" => Ok(NetworkId::DevNet),
			"testnet" | "test" => Ok(NetworkId::TestNet),
			"undeployed" => Ok(NetworkId::Undeployed),
			other => Err(other.to_string()),
		}
	}
}

/// A wallet address: `mn_<type>[_<network>]` human readable part plus payload.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Address {
	pub type_: String,
	pub network: Option<String>,
	pub data: Vec<u8>,
}

impl Address {
	pub fn new(type_: &str, network: NetworkId, data: Vec<u8>) -> Self {
		Self {
			type_: type_.to_string(),
			network: network.address_suffix().map(str::to_string),
			data,
		}
	}

	pub fn decode(encoded_data: &str) -> Result<Self, AddressError> {
		let (hrp, data) =
			bech32::decode(encoded_data).map_err(|e| AddressError::Decode(e.to_string()))?;
		let prefix_parts = hrp.as_str().split('_').collect::<Vec<&str>>();
		prefix_parts
			.first()
			.filter(|c| *c == &"mn")
			.ok_or(AddressError::PrefixInvalidConstant)?;
		let type_ = prefix_parts
			.get(1)
			.ok_or(AddressError::PrefixMissingType)?
			.to_string();
		let network = prefix_parts.get(2).map(|s| s.to_string());

		Ok(Self {
			type_,
			network,
			data,
		})
	}

	pub fn encode(&self) -> Result<String, AddressError> {
		let network_str = match &self.network {
			Some(network) => format!("_{}", network),
			None => "".to_string(),
		};

		let hrp = Hrp::parse(&format!("mn_{}{}", self.type_, network_str))
			.map_err(|e| AddressError::Encode(e.to_string()))?;
		bech32::encode::<Bech32m>(hrp, &self.data).map_err(|e| AddressError::Encode(e.to_string()))
	}
}

impl fmt::Display for Address {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self.encode() {
			Ok(encoded) => f.write_str(&encoded),
			Err(_) => write!(f, "mn_{}:{}", self.type_, hex::encode(&self.data)),
		}
	}
}

impl TryFrom<&Address> for NetworkId {
	type Error = String;

	fn try_from(value: &Address) -> Result<Self, Self::Error> {
		match value.network {
			Some(ref network) => match network.as_str() {
				"dev" => Ok(NetworkId::DevNet),
				"test" => Ok(NetworkId::TestNet),
				"undeployed" => Ok(NetworkId::Undeployed),
				_ => Err(network.to_string()),
			},
			None => Ok(NetworkId::MainNet),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_parse() {
		let encoded_str = bech32::encode::<Bech32m>(
			Hrp::parse("mn_shield-addr_test").expect("Failed while bech32 parsing"),
			&[1, 2, 3],
		)
		.expect("Failed while bech32 encoding");
		let address = Address::decode(&encoded_str).expect("Failed while decoding `Address`");
		assert_eq!(address.type_, "shield-addr".to_string());
		assert_eq!(address.network, Some("test".to_string()));
		assert_eq!(address.data, vec![1u8, 2u8, 3u8]);
		assert_eq!(NetworkId::try_from(&address), Ok(NetworkId::TestNet));
	}

	#[test]
	fn encode_then_decode_keeps_type_and_network() {
		let address = Address::new(UNSHIELDED_ADDRESS_TYPE, NetworkId::MainNet, vec![9; 32]);
		let decoded = Address::decode(&address.encode().unwrap()).unwrap();
		assert_eq!(decoded, address);
		assert_eq!(decoded.network, None);
	}

	#[test]
	fn rejects_foreign_prefix() {
		let encoded_str =
			bech32::encode::<Bech32m>(Hrp::parse("bc_addr").unwrap(), &[1, 2, 3]).unwrap();
		assert_eq!(
			Address::decode(&encoded_str),
			Err(AddressError::PrefixInvalidConstant)
		);
		assert!(matches!(
			Address::decode("not an address"),
			Err(AddressError::Decode(_))
		));
	}
}
