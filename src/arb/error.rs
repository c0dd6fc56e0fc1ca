use thiserror::Error;

use super::asset::AssetId;
use super::pool::PoolId;

/// Errors raised while configuring a market or simulating swaps on it.
///
/// All of them are synchronous and local: nothing here is worth retrying.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ArbitrageError {
    /// The pools, pairs, rates or initial assets handed to the arbitrator are inconsistent
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// A swap would drain a reserve of the pool
    #[error("insufficient liquidity in pool {pool}: requested {requested} {asset}, available {available}")]
    InsufficientLiquidity {
        /// Pool that could not honour the swap
        pool: PoolId,
        /// Asset whose reserve is exhausted
        asset: AssetId,
        /// Amount the swap tried to take out
        requested: f64,
        /// Reserve available before the swap
        available: f64,
    },

    /// The amount fed into a swap is negative, NaN or infinite
    #[error("invalid swap amount: {0}")]
    InvalidAmount(f64),

    /// A sequence of swaps does not form a closed walk
    #[error("invalid cycle: {0}")]
    InvalidCycle(String),
}

impl ArbitrageError {
    /// Shorthand for an [`ArbitrageError::InvalidConfiguration`] built from anything printable
    pub fn config(message: impl Into<String>) -> Self {
        Self::InvalidConfiguration(message.into())
    }

    /// Whether the error reports an exhausted reserve
    #[must_use]
    pub const fn is_insufficient_liquidity(&self) -> bool {
        matches!(self, Self::InsufficientLiquidity { .. })
    }
}
