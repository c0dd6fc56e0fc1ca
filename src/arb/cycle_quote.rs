use crate::arb::cycle::Cycle;
use crate::arb::error::ArbitrageError;
use crate::arb::swap::Swap;

/// Amounts flowing through a single swap of a simulated cycle
#[derive(Debug, Clone)]
pub struct SwapQuote {
    /// The swap executed
    swap: Swap,
    /// Amount paid into the swap
    amount_in: f64,
    /// Amount received from the swap
    amount_out: f64,
}

impl SwapQuote {
    /// The swap executed
    #[must_use]
    pub const fn swap(&self) -> &Swap {
        &self.swap
    }

    /// Amount paid into the swap
    #[must_use]
    pub const fn amount_in(&self) -> f64 {
        self.amount_in
    }

    /// Amount received from the swap
    #[must_use]
    pub const fn amount_out(&self) -> f64 {
        self.amount_out
    }
}

/// Represents a quote for a complete trading cycle, containing quotes for each swap in the cycle.
///
/// A `CycleQuote` records the outcome of executing a sequence of swaps that form a cycle,
/// starting and ending with the same asset. Pools are left as they were.
#[derive(Debug, Clone)]
pub struct CycleQuote {
    /// The quotes for each swap in the cycle
    swap_quotes: Vec<SwapQuote>,
}

impl CycleQuote {
    /// Creates a new cycle quote by simulating the execution of each swap in the cycle
    /// with the given initial amount.
    ///
    /// # Arguments
    ///
    /// * `cycle` - The trading cycle to quote
    /// * `amount_in` - The initial amount to input into the first swap
    /// * `with_fees` - Whether pool fees are charged
    ///
    /// # Errors
    ///
    /// Fails if the cycle cannot be converted, see [`Cycle::convert_with`].
    pub fn new(cycle: &Cycle, amount_in: f64, with_fees: bool) -> Result<Self, ArbitrageError> {
        let mut swap_quotes = Vec::with_capacity(cycle.size());
        cycle.simulate(amount_in, with_fees, true, |swap, amount_in, amount_out| {
            swap_quotes.push(SwapQuote {
                swap: swap.clone(),
                amount_in,
                amount_out,
            });
        })?;
        Ok(Self { swap_quotes })
    }

    /// Returns all swap quotes in this cycle quote, in execution order.
    #[must_use]
    pub fn swap_quotes(&self) -> &[SwapQuote] {
        &self.swap_quotes
    }

    /// Calculates the profit for this cycle quote.
    ///
    /// # Returns
    ///
    /// The profit in the initial asset (negative if the cycle is not profitable)
    #[must_use]
    pub fn profit(&self) -> f64 {
        self.amount_out() - self.amount_in()
    }

    /// Calculates the profit margin for this cycle quote in basis points (10,000 = 100%).
    ///
    /// # Returns
    ///
    /// The profit margin as an i32 value in basis points, 0 for an empty investment
    #[allow(clippy::cast_possible_truncation)]
    #[must_use]
    pub fn profit_margin(&self) -> i32 {
        let amount_in = self.amount_in();
        if amount_in == 0.0 {
            0
        } else {
            // `as` saturates at the i32 bounds
            (self.profit() * 10_000.0 / amount_in).round() as i32
        }
    }

    /// Determines whether this cycle quote is profitable (has a positive profit).
    #[must_use]
    pub fn is_profitable(&self) -> bool {
        self.profit() > 0.0
    }

    /// Returns the initial amount input into the first swap of the cycle.
    #[must_use]
    pub fn amount_in(&self) -> f64 {
        self.swap_quotes.first().map_or(0.0, SwapQuote::amount_in)
    }

    /// Returns the final amount output from the last swap of the cycle.
    #[must_use]
    pub fn amount_out(&self) -> f64 {
        self.swap_quotes.last().map_or(0.0, SwapQuote::amount_out)
    }
}
