//! # Arbitrage Module
//!
//! This module contains the arbitrage loop simulator. It discovers closed swap sequences
//! through fixed rates and AMM pools, simulates them against shared pool state and searches
//! for the investment maximizing profit under slippage.

/// Top level entry point owning pools and finding loops
pub mod arbitrator;
/// Asset identifiers
pub mod asset;
/// Core cycle detection and analysis
pub mod cycle;
/// Depth-first cycle enumeration
pub mod cycle_finder;
/// Quote generation for cycles
pub mod cycle_quote;
/// Library error type
pub mod error;
/// Exchange formulas
pub mod formula;
/// Multigraph of swappable assets
pub mod graph;
/// Declarative market description
pub mod market;
/// Profit maximization
pub mod optimizer;
/// Pool data structures and operations
pub mod pool;
/// Pool state snapshots
mod snapshot;
/// Swap execution and modeling
pub mod swap;
/// Test helpers and utilities
#[cfg(test)]
mod test_helpers;

pub use arbitrator::Arbitrator;
pub use asset::AssetId;
pub use cycle::Cycle;
pub use error::ArbitrageError;
pub use optimizer::{Optimizer, ProfitOptimum};
pub use pool::{ExchangePrimitive, Pool, PoolId, PoolRef};
