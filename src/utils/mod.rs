//!
//! Utility module for the wallet.
//!
//! Formatting helpers used when logging amounts.
/// Token amount formatting
pub mod format;

pub use format::format_token_amount;
