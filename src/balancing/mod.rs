//! Multi-token transaction balancing engine.
//!
//! Given spendable coins and per-token imbalances, the engine selects inputs
//! and synthesizes change outputs until every token type reaches its target,
//! charging a fixed per-input and per-output overhead to the fee token.
//!
//! - `imbalances`: the insertion-ordered imbalance ledger.
//! - `coin_selection`: pluggable strategies for picking the next input.
//! - `counter_offer`: the accumulator that applies the fee-overhead model.
//! - `balancer`: the resolution loop that produces a [`BalanceRecipe`].
//!
//! The engine is synchronous and owns no shared state; every wallet flavor
//! reuses it unchanged.

/// Resolution loop
pub mod balancer;
/// Coin selection strategies
pub mod coin_selection;
/// Per-call accumulator of inputs, outputs and imbalances
pub mod counter_offer;
/// Imbalance ledger
pub mod imbalances;
/// Token types, coin projections and the cost model
pub mod types;

pub use balancer::{BalanceRecipe, Balancer};
pub use coin_selection::{CoinSelection, LargestFirst, SmallestFirst, choose_coin};
pub use counter_offer::CounterOffer;
pub use imbalances::{Imbalances, TargetImbalances};
pub use types::*;
