//! A cycle is a sequence of swaps forming a closed walk (first and last asset are the same).
//! It is primarily used to simulate the walk against pool state and to find its most
//! profitable investment.
use std::collections::HashSet;
use std::fmt::{self, Debug, Display};
use std::hash::{Hash, Hasher};

use super::asset::AssetId;
use super::error::ArbitrageError;
use super::optimizer::{Optimizer, ProfitOptimum};
use super::snapshot::ReserveSnapshot;
use super::swap::Swap;

/// A closed walk of swaps that starts and ends at the same asset
#[derive(Clone)]
pub struct Cycle {
    /// Sequence of swaps forming the cycle
    swaps: Vec<Swap>,
}

impl Debug for Cycle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Cycle({})",
            self.swaps
                .iter()
                .map(|s| format!("{s:?}"))
                .collect::<Vec<_>>()
                .join(", ")
        )
    }
}

/// `A -[pool1]-> B -[pool2]-> C -[pool3]-> A`
impl Display for Cycle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.initial_asset())?;
        for swap in &self.swaps {
            write!(f, " -[{}]-> {}", swap.pool().id(), swap.token_out())?;
        }
        Ok(())
    }
}

impl PartialEq for Cycle {
    fn eq(&self, other: &Self) -> bool {
        self.swaps == other.swaps
    }
}

impl Eq for Cycle {}

impl Hash for Cycle {
    fn hash<H: Hasher>(&self, state: &mut H) {
        for swap in &self.swaps {
            swap.hash(state);
        }
    }
}

impl Cycle {
    /// Creates a cycle from its swaps.
    ///
    /// # Errors
    ///
    /// Returns [`ArbitrageError::InvalidCycle`] if there are fewer than two swaps, consecutive
    /// swaps do not chain, the walk does not close, an asset is visited twice or an edge is used
    /// twice.
    pub fn new(swaps: Vec<Swap>) -> Result<Self, ArbitrageError> {
        let cycle = Self { swaps };
        cycle.validate_swaps()?;
        Ok(cycle)
    }

    fn validate_swaps(&self) -> Result<(), ArbitrageError> {
        if self.swaps.len() < 2 {
            return Err(ArbitrageError::InvalidCycle(
                "Cycle must have at least 2 swaps".to_string(),
            ));
        }

        let mut visited = HashSet::with_capacity(self.swaps.len());
        let mut edges = HashSet::with_capacity(self.swaps.len());
        for i in 0..self.swaps.len() {
            let next = (i + 1) % self.swaps.len();
            if self.swaps[i].token_out() != self.swaps[next].token_in() {
                return Err(ArbitrageError::InvalidCycle(format!(
                    "Swap {} token_out ({}) does not match swap {} token_in ({})",
                    i,
                    self.swaps[i].token_out(),
                    next,
                    self.swaps[next].token_in()
                )));
            }
            if !visited.insert(self.swaps[i].token_in()) {
                return Err(ArbitrageError::InvalidCycle(format!(
                    "Cycle visits {} twice",
                    self.swaps[i].token_in()
                )));
            }
            if !edges.insert(self.swaps[i].id().edge) {
                return Err(ArbitrageError::InvalidCycle(
                    "Cycle contains duplicate swaps".to_string(),
                ));
            }
        }
        Ok(())
    }

    /// The asset the cycle starts and ends with
    #[must_use]
    pub fn initial_asset(&self) -> &AssetId {
        self.swaps[0].token_in()
    }

    /// Number of swaps
    #[must_use]
    pub fn size(&self) -> usize {
        self.swaps.len()
    }

    /// The swaps, in execution order
    #[must_use]
    pub fn swaps(&self) -> &[Swap] {
        &self.swaps
    }

    /// Assets visited, starting and ending with the initial asset
    #[must_use]
    pub fn assets(&self) -> Vec<&AssetId> {
        std::iter::once(self.initial_asset())
            .chain(self.swaps.iter().map(Swap::token_out))
            .collect()
    }

    /// Whether no swap touches pool reserves. The output of such a cycle is linear in its input.
    #[must_use]
    pub fn is_linear(&self) -> bool {
        !self.swaps.iter().any(Swap::is_stateful)
    }

    /// Run the cycle with fees and leave every pool as it was.
    ///
    /// # Errors
    ///
    /// See [`Cycle::convert_with`].
    pub fn convert(&self, amount: f64) -> Result<f64, ArbitrageError> {
        self.convert_with(amount, true, true)
    }

    /// Feed `amount` of the initial asset through every swap in order and return what comes
    /// back. Pool fees apply only when `with_fees` is set.
    ///
    /// With `reset` the reserves of every pool touched are restored before returning, so
    /// repeated calls do not interfere. Without it the trades persist, as a real execution
    /// would.
    ///
    /// # Errors
    ///
    /// Fails if any swap fails, typically with [`ArbitrageError::InsufficientLiquidity`]. Pools
    /// are restored in that case whatever `reset` says.
    pub fn convert_with(
        &self,
        amount: f64,
        with_fees: bool,
        reset: bool,
    ) -> Result<f64, ArbitrageError> {
        self.simulate(amount, with_fees, reset, |_, _, _| {})
    }

    /// Walk the swaps, reporting each leg as `(swap, amount_in, amount_out)`.
    pub(crate) fn simulate<F>(
        &self,
        amount: f64,
        with_fees: bool,
        reset: bool,
        mut on_leg: F,
    ) -> Result<f64, ArbitrageError>
    where
        F: FnMut(&Swap, f64, f64),
    {
        let mut snapshot = ReserveSnapshot::default();
        let mut amount_in = amount;
        for swap in &self.swaps {
            snapshot.capture(swap.pool());
            let amount_out = swap.amount_out(amount_in, with_fees)?;
            on_leg(swap, amount_in, amount_out);
            amount_in = amount_out;
        }

        if !reset {
            snapshot.commit();
        }
        Ok(amount_in)
    }

    /// What one unit of the initial asset turns into, pools left untouched
    ///
    /// # Errors
    ///
    /// See [`Cycle::convert_with`].
    pub fn unit_return(&self, with_fees: bool) -> Result<f64, ArbitrageError> {
        self.convert_with(1.0, with_fees, true)
    }

    /// `convert(amount) - amount`, with fees and pools left untouched
    ///
    /// # Errors
    ///
    /// See [`Cycle::convert_with`].
    pub fn profit(&self, amount: f64) -> Result<f64, ArbitrageError> {
        Ok(self.convert(amount)? - amount)
    }

    /// Whether a unit trade returns more than it costs. Slippage is not considered.
    #[must_use]
    pub fn is_profitable(&self) -> bool {
        self.unit_return(true).is_ok_and(|rate| rate > 1.0)
    }

    /// The investment maximizing absolute profit, searched with the default [`Optimizer`].
    ///
    /// # Errors
    ///
    /// See [`Optimizer::optimize`].
    pub fn get_max_absolute_profit(&self) -> Result<ProfitOptimum, ArbitrageError> {
        Optimizer::default().optimize(self)
    }

    /// Same as [`Cycle::get_max_absolute_profit`] on `[0, upper_bound]`.
    ///
    /// # Errors
    ///
    /// See [`Optimizer::optimize_within`].
    pub fn get_max_absolute_profit_within(
        &self,
        upper_bound: f64,
    ) -> Result<ProfitOptimum, ArbitrageError> {
        Optimizer::default().optimize_within(self, upper_bound)
    }
}
