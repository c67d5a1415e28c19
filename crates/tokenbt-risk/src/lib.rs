//! Universe selection, trading costs and exit rules.
//!
//! Provides the point-in-time universe filter, the slippage and
//! transaction cost model, and the early-exit rules applied to held
//! positions.

mod costs;
mod exit_rules;
mod universe;

pub use costs::{slippage, transaction_cost, CostModel, SlippageModel, SlippageTier};
pub use exit_rules::ExitRules;
pub use universe::{Rejection, ReturnWindow, UniverseFilter, UniversePolicy, ARBITRUM_STABLECOINS};
