//! # Exchange formulas
//!
//! A formula turns an amount of the asset at index `i` of a pool into an amount of the asset at
//! index `j`, updating the pool reserves in place. Every formula follows the same contract:
//!
//! ```text
//! apply(i, j, amount_in, fee, reserves) -> amount_out
//! ```
//!
//! where `fee` is a fraction in `[0, 1)`. The fee is charged on the output leg and the withheld
//! part stays in reserve `j`, so it accrues to the pool. A formula that fails must leave the
//! reserves untouched.
//!
//! New formulas plug in through [`ExchangeFormula`] and [`Formula::Custom`] without touching the
//! graph or the cycle code.

use std::fmt::{self, Debug, Display};
use std::rc::Rc;

use thiserror::Error;

/// Why a formula refused a swap. The pool turns this into an
/// [`ArbitrageError`](super::error::ArbitrageError) carrying its own identity.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SwapFailure {
    /// The output would exceed what the target reserve holds
    #[error("requested {requested} but only {available} available")]
    Depleted {
        /// Amount the swap tried to take out
        requested: f64,
        /// Reserve before the swap
        available: f64,
    },
    /// A reserve is zero or negative, so no price can be quoted
    #[error("reserve {0} is empty")]
    EmptyReserve(usize),
    /// Negative, NaN or infinite input
    #[error("invalid amount {0}")]
    InvalidAmount(f64),
    /// The indices do not address two different assets of the pool
    #[error("cannot swap index {index_in} for index {index_out} in a pool of {size} assets")]
    InvalidIndices {
        /// Index of the asset paid in
        index_in: usize,
        /// Index of the asset taken out
        index_out: usize,
        /// Number of assets the formula was given
        size: usize,
    },
}

/// Extension point for user supplied formulas.
pub trait ExchangeFormula: Debug {
    /// Swap `amount_in` of asset `index_in` for asset `index_out`, charging `fee` (a fraction)
    /// and updating `reserves`.
    ///
    /// # Errors
    ///
    /// Implementations must return an error, and leave `reserves` untouched, when the swap cannot
    /// be honoured.
    fn apply(
        &self,
        index_in: usize,
        index_out: usize,
        amount_in: f64,
        fee: f64,
        reserves: &mut [f64],
    ) -> Result<f64, SwapFailure>;
}

/// The formula bound to a pool.
#[derive(Clone)]
pub enum Formula {
    /// Stateless conversion at a fixed rate between exactly two assets: `x * rate` from asset 0
    /// to asset 1, `x / rate` the other way. Never charges fees.
    FixedRate(f64),
    /// `prod(reserves) = C`
    ConstantProduct,
    /// `sum(reserves) = C`, i.e. 1:1 swaps for stable assets
    ConstantSum,
    /// Anything else implementing [`ExchangeFormula`]
    Custom(Rc<dyn ExchangeFormula>),
}

impl Formula {
    /// Whether the formula reads or writes pool reserves
    #[must_use]
    pub const fn is_stateful(&self) -> bool {
        !matches!(self, Self::FixedRate(_))
    }

    /// Run the formula. See the module documentation for the contract.
    ///
    /// # Errors
    ///
    /// Returns a [`SwapFailure`] if the swap cannot be honoured; `reserves` are not modified then.
    pub fn apply(
        &self,
        index_in: usize,
        index_out: usize,
        amount_in: f64,
        fee: f64,
        reserves: &mut [f64],
    ) -> Result<f64, SwapFailure> {
        match self {
            Self::FixedRate(rate) => fixed_rate(*rate, index_in, index_out, amount_in),
            Self::ConstantProduct => constant_product(index_in, index_out, amount_in, fee, reserves),
            Self::ConstantSum => constant_sum(index_in, index_out, amount_in, fee, reserves),
            Self::Custom(formula) => formula.apply(index_in, index_out, amount_in, fee, reserves),
        }
    }
}

impl Debug for Formula {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::FixedRate(rate) => write!(f, "FixedRate({rate})"),
            Self::ConstantProduct => write!(f, "ConstantProduct"),
            Self::ConstantSum => write!(f, "ConstantSum"),
            Self::Custom(formula) => write!(f, "Custom({formula:?})"),
        }
    }
}

impl Display for Formula {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::FixedRate(rate) => write!(f, "fixed@{rate}"),
            Self::ConstantProduct => write!(f, "constant_product"),
            Self::ConstantSum => write!(f, "constant_sum"),
            Self::Custom(_) => write!(f, "custom"),
        }
    }
}

fn check_amount(amount_in: f64) -> Result<(), SwapFailure> {
    if amount_in.is_finite() && amount_in >= 0.0 {
        Ok(())
    } else {
        Err(SwapFailure::InvalidAmount(amount_in))
    }
}

pub(crate) fn check_indices(
    index_in: usize,
    index_out: usize,
    size: usize,
) -> Result<(), SwapFailure> {
    if index_in == index_out || index_in >= size || index_out >= size {
        return Err(SwapFailure::InvalidIndices {
            index_in,
            index_out,
            size,
        });
    }
    Ok(())
}

/// Stateless fixed rate conversion between the two assets of a pair.
///
/// # Errors
///
/// Fails on an invalid amount or on indices other than `(0, 1)` / `(1, 0)`.
pub fn fixed_rate(
    rate: f64,
    index_in: usize,
    index_out: usize,
    amount_in: f64,
) -> Result<f64, SwapFailure> {
    check_amount(amount_in)?;
    match (index_in, index_out) {
        (0, 1) => Ok(amount_in * rate),
        (1, 0) => Ok(amount_in / rate),
        _ => Err(SwapFailure::InvalidIndices {
            index_in,
            index_out,
            size: 2,
        }),
    }
}

/// Constant product market maker over any number of assets.
///
/// Reserve `i` receives the full `amount_in`; reserve `j` is brought back to the value that keeps
/// `prod(reserves)` constant. The difference is the gross output, from which `fee` is withheld
/// and left in reserve `j`.
///
/// # Errors
///
/// Fails on an invalid amount or indices, or if any reserve is not strictly positive.
pub fn constant_product(
    index_in: usize,
    index_out: usize,
    amount_in: f64,
    fee: f64,
    reserves: &mut [f64],
) -> Result<f64, SwapFailure> {
    check_indices(index_in, index_out, reserves.len())?;
    check_amount(amount_in)?;
    if let Some(empty) = reserves.iter().position(|reserve| *reserve <= 0.0) {
        return Err(SwapFailure::EmptyReserve(empty));
    }

    let reserve_in = reserves[index_in];
    let reserve_out = reserves[index_out];
    // C / prod(reserves without j) only changes through reserve i
    let final_out = reserve_out * reserve_in / (reserve_in + amount_in);
    let amount_out = (reserve_out - final_out) * (1.0 - fee);

    reserves[index_in] = reserve_in + amount_in;
    reserves[index_out] = reserve_out - amount_out;
    Ok(amount_out)
}

/// Constant sum market maker: 1:1 swaps minus `fee`.
///
/// # Errors
///
/// Fails with [`SwapFailure::Depleted`] when the output exceeds reserve `j`, and on invalid
/// amounts or indices.
pub fn constant_sum(
    index_in: usize,
    index_out: usize,
    amount_in: f64,
    fee: f64,
    reserves: &mut [f64],
) -> Result<f64, SwapFailure> {
    check_indices(index_in, index_out, reserves.len())?;
    check_amount(amount_in)?;

    let amount_out = amount_in * (1.0 - fee);
    if amount_out > reserves[index_out] {
        return Err(SwapFailure::Depleted {
            requested: amount_out,
            available: reserves[index_out],
        });
    }

    reserves[index_in] += amount_in;
    reserves[index_out] -= amount_out;
    Ok(amount_out)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn product(reserves: &[f64]) -> f64 {
        reserves.iter().product()
    }

    #[test]
    fn test_fixed_rate_both_directions() {
        assert!((fixed_rate(1.2, 0, 1, 1.0).unwrap() - 1.2).abs() < 1e-12);
        assert!((fixed_rate(1.2, 1, 0, 1.0).unwrap() - 1.0 / 1.2).abs() < 1e-12);
        assert_eq!(
            fixed_rate(1.2, 0, 2, 1.0),
            Err(SwapFailure::InvalidIndices {
                index_in: 0,
                index_out: 2,
                size: 2
            })
        );
    }

    #[test]
    fn test_constant_product_preserves_invariant_without_fee() {
        let mut reserves = vec![100.0, 200.0, 300.0];
        let before = product(&reserves);
        let out = constant_product(0, 1, 100.0, 0.0, &mut reserves).unwrap();

        assert!((out - 100.0).abs() < 1e-9);
        assert!((product(&reserves) - before).abs() / before < 1e-12);
        assert_eq!(reserves[2], 300.0);
    }

    #[test]
    fn test_constant_product_fee_grows_invariant() {
        let mut with_fee = vec![500.0, 400.0];
        let mut without_fee = with_fee.clone();
        let before = product(&with_fee);

        let net = constant_product(0, 1, 50.0, 0.05, &mut with_fee).unwrap();
        let gross = constant_product(0, 1, 50.0, 0.0, &mut without_fee).unwrap();

        assert!((net - gross * 0.95).abs() < 1e-9);
        assert!(product(&with_fee) > before);
        // the withheld fee sits in the output reserve
        assert!((with_fee[1] - without_fee[1] - gross * 0.05).abs() < 1e-9);
    }

    #[test]
    fn test_constant_product_empty_reserve() {
        let mut reserves = vec![100.0, 0.0];
        assert_eq!(
            constant_product(0, 1, 10.0, 0.0, &mut reserves),
            Err(SwapFailure::EmptyReserve(1))
        );
        assert_eq!(reserves, vec![100.0, 0.0]);
    }

    #[test]
    fn test_constant_sum_with_fee() {
        let mut reserves = vec![100.0, 200.0, 300.0];
        let before: f64 = reserves.iter().sum();
        let out = constant_sum(0, 1, 10.0, 0.1, &mut reserves).unwrap();

        assert!((out - 9.0).abs() < 1e-12);
        let after: f64 = reserves.iter().sum();
        assert!((after - (before + 1.0)).abs() < 1e-12);
    }

    #[test]
    fn test_constant_sum_depleted_leaves_reserves() {
        let mut reserves = vec![100.0, 5.0];
        let result = constant_sum(0, 1, 10.0, 0.0, &mut reserves);

        assert_eq!(
            result,
            Err(SwapFailure::Depleted {
                requested: 10.0,
                available: 5.0
            })
        );
        assert_eq!(reserves, vec![100.0, 5.0]);

        // exactly draining the reserve is allowed
        assert!((constant_sum(0, 1, 5.0, 0.0, &mut reserves).unwrap() - 5.0).abs() < 1e-12);
        assert_eq!(reserves, vec![105.0, 0.0]);
    }

    #[test]
    fn test_rejects_bad_amounts_and_indices() {
        let mut reserves = vec![100.0, 200.0];
        assert_eq!(
            constant_sum(0, 1, -1.0, 0.0, &mut reserves),
            Err(SwapFailure::InvalidAmount(-1.0))
        );
        assert!(constant_product(1, 1, 1.0, 0.0, &mut reserves).is_err());
        assert!(constant_product(0, 2, 1.0, 0.0, &mut reserves).is_err());
    }

    #[derive(Debug)]
    struct Halving;

    impl ExchangeFormula for Halving {
        fn apply(
            &self,
            _index_in: usize,
            index_out: usize,
            amount_in: f64,
            _fee: f64,
            reserves: &mut [f64],
        ) -> Result<f64, SwapFailure> {
            reserves[index_out] -= amount_in / 2.0;
            Ok(amount_in / 2.0)
        }
    }

    #[test]
    fn test_custom_formula() {
        let formula = Formula::Custom(Rc::new(Halving));
        let mut reserves = vec![10.0, 10.0];

        assert!(formula.is_stateful());
        assert!((formula.apply(0, 1, 4.0, 0.0, &mut reserves).unwrap() - 2.0).abs() < 1e-12);
        assert_eq!(reserves, vec![10.0, 8.0]);
        assert!(!Formula::FixedRate(2.0).is_stateful());
    }
}
