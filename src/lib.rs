//! Multi-token transaction balancing for Midnight wallets.
//!
//! The [`balancing`] engine selects inputs and synthesizes change outputs for
//! any set of token imbalances. The [`wallet`] layer drives it for each wallet
//! flavor, and hands the result to the collaborators in [`transaction`] for
//! proving and submission.

pub mod balancing;
pub mod config;
pub mod transaction;
pub mod utils;
pub mod wallet;
