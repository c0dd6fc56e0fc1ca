//! Runtime configuration read from the environment (and a `.env` file when present).

use std::collections::BTreeSet;
use std::env;
use std::path::PathBuf;

use eyre::{bail, Result, WrapErr};

use crate::arb::Optimizer;

/// Loop sizes searched when nothing is configured
const DEFAULT_LOOP_SIZES: &str = "3";

/// Settings of the simulator binary
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// JSON market description, `ARB_MARKET_FILE`
    pub market_file: Option<PathBuf>,
    /// Loop sizes to enumerate, `ARB_LOOP_SIZES`
    pub loop_sizes: Vec<usize>,
    /// Whether pool fees are charged, `ARB_WITH_FEES`
    pub with_fees: bool,
    /// Profit search settings, `ARB_OPTIMIZER_TOLERANCE` and `ARB_OPTIMIZER_MAX_ITERATIONS`
    pub optimizer: Optimizer,
}

impl Config {
    /// Load configuration from environment variables and .env file
    ///
    /// # Errors
    ///
    /// Fails if a variable is set to something that does not parse.
    pub fn from_env() -> Result<Self> {
        dotenv::dotenv().ok();
        Self::from_vars(|key| env::var(key).ok())
    }

    /// Build the configuration from a variable lookup
    ///
    /// # Errors
    ///
    /// Fails if a variable is set to something that does not parse.
    pub fn from_vars(var: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let defaults = Optimizer::default();

        let loop_sizes = parse_sizes(
            &var("ARB_LOOP_SIZES").unwrap_or_else(|| DEFAULT_LOOP_SIZES.to_string()),
        )?;
        let with_fees = match var("ARB_WITH_FEES") {
            Some(value) => parse_bool(&value).wrap_err("ARB_WITH_FEES")?,
            None => true,
        };
        let tolerance = match var("ARB_OPTIMIZER_TOLERANCE") {
            Some(value) => value
                .trim()
                .parse()
                .wrap_err_with(|| format!("ARB_OPTIMIZER_TOLERANCE is not a number: {value}"))?,
            None => defaults.tolerance,
        };
        if tolerance.is_nan() || tolerance <= 0.0 {
            bail!("ARB_OPTIMIZER_TOLERANCE must be positive, got {tolerance}");
        }
        let max_iterations = match var("ARB_OPTIMIZER_MAX_ITERATIONS") {
            Some(value) => value.trim().parse().wrap_err_with(|| {
                format!("ARB_OPTIMIZER_MAX_ITERATIONS is not an integer: {value}")
            })?,
            None => defaults.max_iterations,
        };

        Ok(Self {
            market_file: var("ARB_MARKET_FILE").map(PathBuf::from),
            loop_sizes,
            with_fees,
            optimizer: Optimizer {
                tolerance,
                max_iterations,
                ..defaults
            },
        })
    }
}

/// Parse a comma separated list of loop sizes, sorted and deduplicated
///
/// # Errors
///
/// Fails on an empty list, a non-integer entry or a size below 2.
pub fn parse_sizes(list: &str) -> Result<Vec<usize>> {
    let mut sizes = BTreeSet::new();
    for item in list.split(',').map(str::trim).filter(|item| !item.is_empty()) {
        let size: usize = item
            .parse()
            .wrap_err_with(|| format!("Invalid loop size: {item}"))?;
        if size < 2 {
            bail!("Loop size must be at least 2, got {size}");
        }
        sizes.insert(size);
    }
    if sizes.is_empty() {
        bail!("No loop size given");
    }
    Ok(sizes.into_iter().collect())
}

fn parse_bool(value: &str) -> Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => bail!("Not a boolean: {other}"),
    }
}
