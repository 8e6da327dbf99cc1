//!
//! Wallet layer: recipient addresses, wallet flavors, the wallet state store,
//! the transacting capability that drives the balancing engine, and the
//! service that proves and submits what it builds.

pub mod address;
pub mod flavors;
pub mod service;
pub mod state;
pub mod transacting;
pub mod types;

pub use address::{Address, AddressError, NetworkId};
pub use flavors::{WalletFlavor, dust::DustFlavor, shielded::ShieldedFlavor, unshielded::UnshieldedFlavor};
pub use service::WalletService;
pub use state::{PendingCoin, WalletState};
pub use transacting::{TransactingCapability, TransactionResult, TransferOutput};
pub use types::*;
