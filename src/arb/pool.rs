use std::cell::RefCell;
use std::collections::HashSet;
use std::fmt;
use std::rc::Rc;

use derive_more::Display;
use itertools::Itertools;
use serde::{Deserialize, Serialize};

use super::asset::AssetId;
use super::error::ArbitrageError;
use super::formula::{check_indices, Formula, SwapFailure};

/// Name of a pool. Names are labels only and need not be unique.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Debug, Display, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PoolId(String);

impl From<&str> for PoolId {
    fn from(name: &str) -> Self {
        Self(name.to_string())
    }
}

impl From<String> for PoolId {
    fn from(name: String) -> Self {
        Self(name)
    }
}

/// Shared handle to a pool. Cycles and graph edges hold these; the pool owns its reserves.
pub type PoolRef = Rc<Pool>;

/// A named formula together with the fee it charges.
#[derive(Clone, Debug)]
pub struct ExchangePrimitive {
    /// Label, e.g. `uniswap`
    name: String,
    /// How amounts are converted
    formula: Formula,
    /// Fee in percent, in `[0, 100)`
    fee_percent: f64,
}

impl ExchangePrimitive {
    /// Creates a primitive charging `fee_percent` percent on every swap.
    ///
    /// # Errors
    ///
    /// Returns [`ArbitrageError::InvalidConfiguration`] if the fee is outside `[0, 100)`.
    pub fn new(
        name: impl Into<String>,
        formula: Formula,
        fee_percent: f64,
    ) -> Result<Self, ArbitrageError> {
        let name = name.into();
        if !(0.0..100.0).contains(&fee_percent) {
            return Err(ArbitrageError::config(format!(
                "fee of primitive {name} must be in [0, 100), got {fee_percent}"
            )));
        }
        Ok(Self {
            name,
            formula,
            fee_percent,
        })
    }

    /// Constant product primitive
    ///
    /// # Errors
    ///
    /// See [`ExchangePrimitive::new`].
    pub fn constant_product(
        name: impl Into<String>,
        fee_percent: f64,
    ) -> Result<Self, ArbitrageError> {
        Self::new(name, Formula::ConstantProduct, fee_percent)
    }

    /// Constant sum primitive
    ///
    /// # Errors
    ///
    /// See [`ExchangePrimitive::new`].
    pub fn constant_sum(name: impl Into<String>, fee_percent: f64) -> Result<Self, ArbitrageError> {
        Self::new(name, Formula::ConstantSum, fee_percent)
    }

    /// Label of the primitive
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The underlying formula
    #[must_use]
    pub const fn formula(&self) -> &Formula {
        &self.formula
    }

    /// Fee in percent
    #[must_use]
    pub const fn fee_percent(&self) -> f64 {
        self.fee_percent
    }

    /// Fee as a fraction, `0.05` for 5%
    #[must_use]
    pub fn fee(&self) -> f64 {
        self.fee_percent / 100.0
    }
}

/// A reservoir of N assets bound to one exchange primitive.
///
/// Fixed-rate pools hold two assets and no reserves. Stateful pools own their reserve vector;
/// it is the only thing mutated while simulating swaps, which is why it sits behind a
/// [`RefCell`] and pools are shared through [`PoolRef`].
#[derive(Debug)]
pub struct Pool {
    /// Label of the pool
    id: PoolId,
    /// Assets held, in reserve order
    assets: Vec<AssetId>,
    /// Formula and fee
    primitive: ExchangePrimitive,
    /// Reserves as configured, used by [`Pool::reset`]
    initial_reserves: Vec<f64>,
    /// Current reserves; empty for fixed-rate pools
    reserves: RefCell<Vec<f64>>,
}

impl Pool {
    /// Creates a stateful pool.
    ///
    /// # Errors
    ///
    /// Returns [`ArbitrageError::InvalidConfiguration`] if there are fewer than two assets, an
    /// asset repeats, the number of amounts differs from the number of assets, an amount is
    /// negative or not finite, or the primitive is a fixed rate (use [`Pool::fixed_rate`]).
    pub fn new(
        id: impl Into<PoolId>,
        assets: Vec<AssetId>,
        amounts: Vec<f64>,
        primitive: ExchangePrimitive,
    ) -> Result<Self, ArbitrageError> {
        let id = id.into();
        Self::validate_assets(&id, &assets)?;
        if let Formula::FixedRate(_) = primitive.formula() {
            return Err(ArbitrageError::config(format!(
                "pool {id}: fixed rates have no reserves, use Pool::fixed_rate"
            )));
        }
        if amounts.len() != assets.len() {
            return Err(ArbitrageError::config(format!(
                "pool {id}: {} assets but {} amounts",
                assets.len(),
                amounts.len()
            )));
        }
        if let Some(amount) = amounts.iter().find(|a| !a.is_finite() || **a < 0.0) {
            return Err(ArbitrageError::config(format!(
                "pool {id}: invalid reserve amount {amount}"
            )));
        }

        Ok(Self {
            id,
            assets,
            primitive,
            initial_reserves: amounts.clone(),
            reserves: RefCell::new(amounts),
        })
    }

    /// Creates a stateless pool converting `asset0` into `asset1` at `rate` (and back at
    /// `1 / rate`). Fixed-rate pools never charge fees.
    ///
    /// # Errors
    ///
    /// Returns [`ArbitrageError::InvalidConfiguration`] if the assets are equal or the rate is
    /// not a positive finite number.
    pub fn fixed_rate(
        id: impl Into<PoolId>,
        asset0: AssetId,
        asset1: AssetId,
        rate: f64,
    ) -> Result<Self, ArbitrageError> {
        let id = id.into();
        let assets = vec![asset0, asset1];
        Self::validate_assets(&id, &assets)?;
        if !rate.is_finite() || rate <= 0.0 {
            return Err(ArbitrageError::config(format!(
                "pool {id}: rate must be positive, got {rate}"
            )));
        }
        let primitive = ExchangePrimitive::new("GENERIC", Formula::FixedRate(rate), 0.0)?;

        Ok(Self {
            id,
            assets,
            primitive,
            initial_reserves: Vec::new(),
            reserves: RefCell::new(Vec::new()),
        })
    }

    fn validate_assets(id: &PoolId, assets: &[AssetId]) -> Result<(), ArbitrageError> {
        if assets.len() < 2 {
            return Err(ArbitrageError::config(format!(
                "pool {id} needs at least two assets"
            )));
        }
        let mut seen = HashSet::with_capacity(assets.len());
        if let Some(duplicate) = assets.iter().find(|asset| !seen.insert(*asset)) {
            return Err(ArbitrageError::config(format!(
                "pool {id} lists asset {duplicate} twice"
            )));
        }
        Ok(())
    }

    /// Label of the pool
    #[must_use]
    pub const fn id(&self) -> &PoolId {
        &self.id
    }

    /// Assets in reserve order
    #[must_use]
    pub fn assets(&self) -> &[AssetId] {
        &self.assets
    }

    /// The primitive this pool swaps with
    #[must_use]
    pub const fn primitive(&self) -> &ExchangePrimitive {
        &self.primitive
    }

    /// Whether swaps read and write reserves
    #[must_use]
    pub const fn is_stateful(&self) -> bool {
        self.primitive.formula.is_stateful()
    }

    /// Position of `asset` in the pool
    #[must_use]
    pub fn index_of(&self, asset: &AssetId) -> Option<usize> {
        self.assets.iter().position(|a| a == asset)
    }

    /// Copy of the current reserves (empty for fixed-rate pools)
    #[must_use]
    pub fn reserves(&self) -> Vec<f64> {
        self.reserves.borrow().clone()
    }

    /// Reserves as configured
    #[must_use]
    pub fn initial_reserves(&self) -> &[f64] {
        &self.initial_reserves
    }

    /// Overwrite the current reserves, e.g. with a snapshot taken earlier
    pub(crate) fn restore(&self, reserves: Vec<f64>) {
        *self.reserves.borrow_mut() = reserves;
    }

    /// Go back to the reserves the pool was configured with
    pub fn reset(&self) {
        self.restore(self.initial_reserves.clone());
    }

    /// Every unordered pair of asset indices, each one a swap the formula can execute
    #[must_use]
    pub fn pairs(&self) -> Vec<(usize, usize)> {
        (0..self.assets.len()).tuple_combinations().collect()
    }

    /// Swap `amount_in` of the asset at `index_in` for the asset at `index_out`.
    /// The pool fee is charged only if `with_fees` is set.
    ///
    /// # Errors
    ///
    /// [`ArbitrageError::InsufficientLiquidity`] when a reserve cannot cover the swap,
    /// [`ArbitrageError::InvalidAmount`] for negative or non-finite amounts and
    /// [`ArbitrageError::InvalidConfiguration`] for indices outside the pool.
    /// Reserves are untouched on error.
    pub fn swap(
        &self,
        index_in: usize,
        index_out: usize,
        amount_in: f64,
        with_fees: bool,
    ) -> Result<f64, ArbitrageError> {
        check_indices(index_in, index_out, self.assets.len())
            .map_err(|failure| ArbitrageError::config(format!("pool {}: {failure}", self.id)))?;
        let fee = if with_fees { self.primitive.fee() } else { 0.0 };
        let mut reserves = self.reserves.borrow_mut();
        self.primitive
            .formula
            .apply(index_in, index_out, amount_in, fee, &mut reserves)
            .map_err(|failure| self.swap_error(&reserves, index_out, failure))
    }

    /// Swap `amount` of `asset` for `target`, looking the indices up by symbol.
    ///
    /// # Errors
    ///
    /// Same as [`Pool::swap`], plus [`ArbitrageError::InvalidConfiguration`] if either asset is
    /// not held by the pool or both are the same.
    pub fn convert(
        &self,
        asset: &AssetId,
        amount: f64,
        target: &AssetId,
        with_fees: bool,
    ) -> Result<f64, ArbitrageError> {
        match (self.index_of(asset), self.index_of(target)) {
            (Some(index_in), Some(index_out)) if index_in != index_out => {
                self.swap(index_in, index_out, amount, with_fees)
            }
            _ => Err(ArbitrageError::config(format!(
                "pool {} cannot convert {asset} into {target}",
                self.id
            ))),
        }
    }

    fn swap_error(&self, reserves: &[f64], index_out: usize, failure: SwapFailure) -> ArbitrageError {
        match failure {
            SwapFailure::Depleted {
                requested,
                available,
            } => ArbitrageError::InsufficientLiquidity {
                pool: self.id.clone(),
                asset: self.assets[index_out].clone(),
                requested,
                available,
            },
            SwapFailure::EmptyReserve(index) => match (self.assets.get(index), reserves.get(index)) {
                (Some(asset), Some(available)) => ArbitrageError::InsufficientLiquidity {
                    pool: self.id.clone(),
                    asset: asset.clone(),
                    requested: 0.0,
                    available: *available,
                },
                // custom formulas may report reserves the pool does not have
                _ => ArbitrageError::config(format!("pool {}: {failure}", self.id)),
            },
            SwapFailure::InvalidAmount(amount) => ArbitrageError::InvalidAmount(amount),
            SwapFailure::InvalidIndices { .. } => {
                ArbitrageError::config(format!("pool {}: {failure}", self.id))
            }
        }
    }
}

impl fmt::Display for Pool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}({} {}",
            self.id,
            self.assets.iter().join("-"),
            self.primitive.formula
        )?;
        if self.primitive.fee_percent > 0.0 {
            write!(f, " {}%", self.primitive.fee_percent)?;
        }
        write!(f, ")")
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::arb::formula::ExchangeFormula;
    use crate::arb::test_helpers::*;

    #[test]
    fn test_rejects_single_asset() {
        let pool = Pool::new(
            "test",
            assets(&["A"]),
            vec![100.0],
            ExchangePrimitive::constant_product("cp", 0.0).unwrap(),
        );
        assert_eq!(
            pool.err().unwrap().to_string(),
            "invalid configuration: pool test needs at least two assets"
        );
    }

    #[test]
    fn test_rejects_mismatched_amounts() {
        let pool = Pool::new(
            "test",
            assets(&["A", "B", "C"]),
            vec![100.0, 200.0, 300.0, 400.0],
            ExchangePrimitive::constant_product("cp", 0.0).unwrap(),
        );
        assert_eq!(
            pool.err().unwrap().to_string(),
            "invalid configuration: pool test: 3 assets but 4 amounts"
        );
    }

    #[test]
    fn test_rejects_bad_fee_and_rate() {
        assert!(ExchangePrimitive::constant_sum("cs", 100.0).is_err());
        assert!(ExchangePrimitive::constant_sum("cs", -1.0).is_err());
        assert!(Pool::fixed_rate("f", "A".into(), "B".into(), 0.0).is_err());
        assert!(Pool::fixed_rate("f", "A".into(), "A".into(), 1.0).is_err());
    }

    #[test]
    fn test_fixed_rate_pool() {
        let pool = Pool::fixed_rate("test", "A".into(), "B".into(), 1.2).unwrap();
        assert!(!pool.is_stateful());
        assert!(pool.reserves().is_empty());
        assert!((pool.swap(0, 1, 1.0, true).unwrap() - 1.2).abs() < 1e-12);
        assert!((pool.swap(1, 0, 1.0, true).unwrap() - 1.0 / 1.2).abs() < 1e-12);
        assert_eq!(pool.primitive().fee_percent(), 0.0);
    }

    #[test]
    fn test_pairs() {
        let pool = constant_product_pool("test", &["A", "B", "C"], &[100.0, 200.0, 300.0], 0.0);
        assert_eq!(pool.pairs(), vec![(0, 1), (0, 2), (1, 2)]);
    }

    #[test]
    fn test_convert_and_reset() {
        let pool = constant_product_pool("test", &["A", "B", "C"], &[100.0, 200.0, 300.0], 0.0);
        pool.convert(&"A".into(), 100.0, &"B".into(), false).unwrap();
        assert_ne!(pool.reserves(), vec![100.0, 200.0, 300.0]);

        pool.reset();
        assert_eq!(pool.reserves(), vec![100.0, 200.0, 300.0]);
    }

    #[test]
    fn test_convert_same_asset() {
        let pool = constant_product_pool("test", &["A", "B", "C"], &[100.0, 200.0, 300.0], 0.0);
        let result = pool.convert(&"A".into(), 1.0, &"A".into(), false);
        assert_eq!(
            result.err().unwrap().to_string(),
            "invalid configuration: pool test cannot convert A into A"
        );
    }

    #[test]
    fn test_constant_sum_fee() {
        let pool = constant_sum_pool("test", &["A", "B", "C"], &[100.0, 200.0, 300.0], 10.0);
        let result = pool.convert(&"A".into(), 10.0, &"B".into(), true).unwrap();
        assert!((result - 9.0).abs() < 1e-12);
    }

    #[test]
    fn test_insufficient_liquidity() {
        let pool = constant_sum_pool("stable", &["USDC", "DAI"], &[100.0, 50.0], 0.0);
        let error = pool.swap(0, 1, 60.0, false).err().unwrap();

        assert!(error.is_insufficient_liquidity());
        assert_eq!(
            error.to_string(),
            "insufficient liquidity in pool stable: requested 60 DAI, available 50"
        );
        assert_eq!(pool.reserves(), vec![100.0, 50.0]);
    }

    #[derive(Debug)]
    struct ReportsMissingReserve;

    impl ExchangeFormula for ReportsMissingReserve {
        fn apply(
            &self,
            _index_in: usize,
            _index_out: usize,
            _amount_in: f64,
            _fee: f64,
            _reserves: &mut [f64],
        ) -> Result<f64, SwapFailure> {
            Err(SwapFailure::EmptyReserve(7))
        }
    }

    #[test]
    fn test_custom_formula_reporting_unknown_reserve() {
        let primitive =
            ExchangePrimitive::new("odd", Formula::Custom(Rc::new(ReportsMissingReserve)), 0.0)
                .unwrap();
        let pool = Pool::new("odd", assets(&["A", "B"]), vec![10.0, 10.0], primitive).unwrap();

        let error = pool.swap(0, 1, 1.0, false).err().unwrap();
        assert_eq!(
            error.to_string(),
            "invalid configuration: pool odd: reserve 7 is empty"
        );
        assert_eq!(pool.reserves(), vec![10.0, 10.0]);
    }

    #[test]
    fn test_swap_rejects_indices_outside_pool() {
        let pool = constant_sum_pool("stable", &["USDC", "DAI"], &[100.0, 50.0], 0.0);
        let error = pool.swap(0, 5, 1.0, false).err().unwrap();

        assert_eq!(
            error.to_string(),
            "invalid configuration: pool stable: cannot swap index 0 for index 5 in a pool of 2 assets"
        );
        assert!(pool.swap(1, 1, 1.0, false).is_err());
        assert_eq!(pool.reserves(), vec![100.0, 50.0]);
    }

    #[test]
    fn test_display() {
        let pool = constant_product_pool("uni", &["A", "B"], &[1.0, 2.0], 5.0);
        assert_eq!(pool.to_string(), "uni(A-B constant_product 5%)");
    }
}
