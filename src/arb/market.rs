//! # Market description
//!
//! Declarative, serde-deserializable description of the assets, rates and pools an
//! [`Arbitrator`] works on.
//!
//! ```json
//! {
//!   "pairs": [["A", "B"]],
//!   "rates": [1.2],
//!   "pools": [
//!     { "name": "pool1", "assets": ["A", "B", "C"], "amounts": [500, 400, 200],
//!       "formula": "constant_product", "fee_percent": 5 },
//!     { "name": "pool3", "assets": ["A", "B"], "rate": 1.5 }
//!   ],
//!   "initial_assets": ["A"]
//! }
//! ```

use std::fs;
use std::path::Path;

use eyre::{Result, WrapErr};
use log::info;
use serde::{Deserialize, Serialize};

use super::arbitrator::Arbitrator;
use super::asset::AssetId;
use super::error::ArbitrageError;
use super::pool::{ExchangePrimitive, Pool};

/// Built-in reserve formulas selectable from a market file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FormulaKind {
    /// `x * y = k` across the two reserves involved
    #[default]
    ConstantProduct,
    /// One for one, less the fee
    ConstantSum,
}

/// One pool of a market file. A pool has either `amounts` (stateful, priced by `formula`) or a
/// `rate` (fixed, between exactly two assets).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PoolConfig {
    /// Pool label
    pub name: String,
    /// Assets held, in reserve order
    pub assets: Vec<AssetId>,
    /// Initial reserves, one per asset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amounts: Option<Vec<f64>>,
    /// Fixed conversion rate from `assets[0]` to `assets[1]`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rate: Option<f64>,
    /// Formula used with `amounts`
    #[serde(default)]
    pub formula: FormulaKind,
    /// Fee charged on every swap, in percent
    #[serde(default)]
    pub fee_percent: f64,
}

impl PoolConfig {
    /// Build the configured pool
    ///
    /// # Errors
    ///
    /// Returns [`ArbitrageError::InvalidConfiguration`] unless exactly one of `amounts` and
    /// `rate` is given, and for anything [`Pool::new`] or [`Pool::fixed_rate`] rejects.
    pub fn build(&self) -> Result<Pool, ArbitrageError> {
        match (&self.amounts, self.rate) {
            (Some(amounts), None) => {
                let primitive = match self.formula {
                    FormulaKind::ConstantProduct => {
                        ExchangePrimitive::constant_product(&self.name, self.fee_percent)?
                    }
                    FormulaKind::ConstantSum => {
                        ExchangePrimitive::constant_sum(&self.name, self.fee_percent)?
                    }
                };
                Pool::new(
                    self.name.as_str(),
                    self.assets.clone(),
                    amounts.clone(),
                    primitive,
                )
            }
            (None, Some(rate)) => {
                let [asset0, asset1] = self.assets.as_slice() else {
                    return Err(ArbitrageError::config(format!(
                        "pool {}: a fixed rate needs exactly two assets",
                        self.name
                    )));
                };
                Pool::fixed_rate(self.name.as_str(), asset0.clone(), asset1.clone(), rate)
            }
            (Some(_), Some(_)) => Err(ArbitrageError::config(format!(
                "pool {}: give either amounts or a rate, not both",
                self.name
            ))),
            (None, None) => Err(ArbitrageError::config(format!(
                "pool {}: amounts or a rate is required",
                self.name
            ))),
        }
    }
}

/// A whole market: bare fixed-rate pairs, pools and the assets loops start from
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MarketConfig {
    /// Fixed-rate pairs, `pairs[k][0]` to `pairs[k][1]` at `rates[k]`
    #[serde(default)]
    pub pairs: Vec<Vec<AssetId>>,
    /// Rates of `pairs`
    #[serde(default)]
    pub rates: Vec<f64>,
    /// Configured pools
    #[serde(default)]
    pub pools: Vec<PoolConfig>,
    /// Assets a loop may start from
    pub initial_assets: Vec<AssetId>,
}

impl MarketConfig {
    /// Parse a market from JSON text
    ///
    /// # Errors
    ///
    /// Fails on malformed JSON or a document not shaped like a market.
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).wrap_err("Failed to parse market description")
    }

    /// Read and parse a market file
    ///
    /// # Errors
    ///
    /// Fails if the file cannot be read or parsed.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = fs::read_to_string(path)
            .wrap_err_with(|| format!("Failed to read market file {}", path.display()))?;
        let market = Self::from_json(&json)
            .wrap_err_with(|| format!("Invalid market file {}", path.display()))?;
        info!(
            "Loaded market from {}: {} pairs, {} pools",
            path.display(),
            market.pairs.len(),
            market.pools.len()
        );
        Ok(market)
    }

    /// Build the pools and the arbitrator over them
    ///
    /// # Errors
    ///
    /// See [`PoolConfig::build`] and [`Arbitrator::new`].
    pub fn into_arbitrator(self) -> Result<Arbitrator, ArbitrageError> {
        let pools = self
            .pools
            .iter()
            .map(PoolConfig::build)
            .collect::<Result<Vec<_>, _>>()?;
        Arbitrator::new(&self.pairs, &self.rates, pools, self.initial_assets)
    }
}
