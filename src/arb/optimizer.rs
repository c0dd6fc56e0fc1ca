//! # Profit optimizer
//!
//! Finds the investment `x` maximizing `profit(x) = convert(x) - x` for a cycle.
//!
//! Slippage makes the profit curve of a cycle through AMM pools concave: it rises while the
//! price edge beats the slippage and falls afterwards. The search assumes that shape (a single
//! maximum on the searched interval) and runs a golden-section search. Cycles made of fixed
//! rates only have a straight profit line and no maximum, so they are reported as
//! [`ProfitOptimum::Linear`] without searching.

use log::{debug, error};

use super::cycle::Cycle;
use super::error::ArbitrageError;

/// `(sqrt(5) - 1) / 2`
const INV_PHI: f64 = 0.618_033_988_749_894_9;

/// Outcome of a profit search
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ProfitOptimum {
    /// Best point of the searched interval. It may sit at a bound: a loop that never profits
    /// reports `amount_in == 0` with zero profit.
    Interior {
        /// Investment in the initial asset
        amount_in: f64,
        /// `convert(amount_in) - amount_in`
        profit: f64,
    },
    /// The cycle has no stateful pool: profit is `profit_per_unit * x` and has no interior
    /// maximum. Positive means unbounded, otherwise investing nothing is best.
    Linear {
        /// Profit of a unit investment
        profit_per_unit: f64,
    },
}

impl ProfitOptimum {
    /// `(amount_in, profit)` for an interior maximum
    #[must_use]
    pub const fn as_pair(&self) -> Option<(f64, f64)> {
        match self {
            Self::Interior { amount_in, profit } => Some((*amount_in, *profit)),
            Self::Linear { .. } => None,
        }
    }
}

/// Bounded golden-section search over a cycle's profit curve.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Optimizer {
    /// Search stops once the interval is narrower than `tolerance * max(1, upper)`
    pub tolerance: f64,
    /// Cap on golden-section iterations
    pub max_iterations: usize,
    /// First upper bound tried when bracketing
    pub initial_upper_bound: f64,
    /// Cap on bound doublings when bracketing
    pub max_expansions: usize,
}

impl Default for Optimizer {
    fn default() -> Self {
        Self {
            tolerance: 1e-10,
            max_iterations: 200,
            initial_upper_bound: 1.0,
            max_expansions: 64,
        }
    }
}

impl Optimizer {
    /// Find the most profitable investment for `cycle`. The upper end of the search interval is
    /// found by doubling [`Optimizer::initial_upper_bound`] while profit keeps growing.
    ///
    /// # Errors
    ///
    /// Only fails on a linear cycle whose unit conversion fails.
    pub fn optimize(&self, cycle: &Cycle) -> Result<ProfitOptimum, ArbitrageError> {
        if cycle.is_linear() {
            return Self::linear(cycle);
        }
        let mut objective = Self::objective(cycle);
        let upper_bound = self.bracket(&mut objective);
        Ok(self.search(&mut objective, upper_bound))
    }

    /// Find the most profitable investment for `cycle` in `[0, upper_bound]`.
    ///
    /// # Errors
    ///
    /// [`ArbitrageError::InvalidAmount`] if `upper_bound` is negative or not finite, and the
    /// errors of [`Optimizer::optimize`].
    pub fn optimize_within(
        &self,
        cycle: &Cycle,
        upper_bound: f64,
    ) -> Result<ProfitOptimum, ArbitrageError> {
        if !upper_bound.is_finite() || upper_bound < 0.0 {
            return Err(ArbitrageError::InvalidAmount(upper_bound));
        }
        if cycle.is_linear() {
            return Self::linear(cycle);
        }
        let mut objective = Self::objective(cycle);
        Ok(self.search(&mut objective, upper_bound))
    }

    fn linear(cycle: &Cycle) -> Result<ProfitOptimum, ArbitrageError> {
        let profit_per_unit = cycle.unit_return(true)? - 1.0;
        debug!("Cycle {cycle} is linear, profit per unit {profit_per_unit}");
        Ok(ProfitOptimum::Linear { profit_per_unit })
    }

    /// Profit of the cycle; infeasible amounts score `-inf`
    fn objective(cycle: &Cycle) -> impl FnMut(f64) -> f64 + '_ {
        move |amount| match cycle.profit(amount) {
            Ok(profit) => profit,
            Err(e) => {
                debug!("Cycle {cycle} infeasible at {amount}: {e}");
                f64::NEG_INFINITY
            }
        }
    }

    /// Upper end of an interval containing the maximum
    fn bracket<F: FnMut(f64) -> f64>(&self, objective: &mut F) -> f64 {
        let mut upper = self.initial_upper_bound;
        let mut best = objective(upper);
        for _ in 0..self.max_expansions {
            let next = objective(upper * 2.0);
            if next <= best {
                break;
            }
            upper *= 2.0;
            best = next;
        }
        upper * 2.0
    }

    /// Golden-section search on `[0, upper_bound]`, keeping the best point seen
    fn search<F: FnMut(f64) -> f64>(&self, objective: &mut F, upper_bound: f64) -> ProfitOptimum {
        let mut lower = 0.0;
        let mut upper = upper_bound;
        let mut best_amount_in = 0.0;
        let mut best_profit = objective(0.0);

        let mut left = upper - INV_PHI * (upper - lower);
        let mut right = lower + INV_PHI * (upper - lower);
        let mut profit_left = objective(left);
        let mut profit_right = objective(right);

        let mut count = 0;
        while upper - lower > self.tolerance * upper.max(1.0) {
            count += 1;
            if count > self.max_iterations {
                error!(
                    "Cycle optimization failed to converge after {} iterations",
                    self.max_iterations
                );
                break;
            }

            if profit_left > best_profit {
                best_profit = profit_left;
                best_amount_in = left;
            }
            if profit_right > best_profit {
                best_profit = profit_right;
                best_amount_in = right;
            }

            if profit_left >= profit_right {
                // Falling profit curve past `right`
                upper = right;
                right = left;
                profit_right = profit_left;
                left = upper - INV_PHI * (upper - lower);
                profit_left = objective(left);
            } else {
                // Rising profit curve before `left`
                lower = left;
                left = right;
                profit_left = profit_right;
                right = lower + INV_PHI * (upper - lower);
                profit_right = objective(right);
            }
        }

        let middle = (lower + upper) / 2.0;
        let profit_middle = objective(middle);
        if profit_middle >= best_profit {
            best_profit = profit_middle;
            best_amount_in = middle;
        }

        debug!("Best amount in {best_amount_in} for profit {best_profit} after {count} iterations");
        ProfitOptimum::Interior {
            amount_in: best_amount_in,
            profit: best_profit,
        }
    }
}
