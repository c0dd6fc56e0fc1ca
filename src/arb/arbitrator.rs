use std::collections::{BTreeSet, HashSet};
use std::rc::Rc;

use log::{debug, info};

use super::asset::AssetId;
use super::cycle::Cycle;
use super::cycle_finder::CycleFinder;
use super::error::ArbitrageError;
use super::graph::AssetGraph;
use super::pool::{Pool, PoolRef};

/// Prefix of the name given to pools created from bare pairs and rates, `GENERIC(A/B)`
const GENERIC_POOL: &str = "GENERIC";

/// Owns the configured pools and finds the arbitrage loops between them.
///
/// Pools come either from fixed-rate pairs or from fully configured [`Pool`]s, or both. The
/// asset graph is derived from them once; the loops returned by [`Arbitrator::get_loops`] share
/// the pools with the arbitrator.
#[derive(Debug)]
pub struct Arbitrator {
    /// Every configured pool, fixed-rate pairs first
    pools: Vec<PoolRef>,
    /// Swaps available between assets
    graph: AssetGraph,
    /// Assets a loop may start from, deduplicated, in declaration order
    initial_assets: Vec<AssetId>,
}

impl Arbitrator {
    /// Creates an arbitrator from fixed-rate pairs, pools and the assets loops may start from.
    ///
    /// `pairs[k]` converts `pairs[k][0]` into `pairs[k][1]` at `rates[k]`.
    ///
    /// # Errors
    ///
    /// Returns [`ArbitrageError::InvalidConfiguration`] if `pairs` and `rates` differ in length,
    /// a pair does not hold exactly two distinct assets, a rate is not positive, nothing is
    /// configured, no initial asset is given, or an initial asset is not traded anywhere.
    pub fn new(
        pairs: &[Vec<AssetId>],
        rates: &[f64],
        pools: Vec<Pool>,
        initial_assets: Vec<AssetId>,
    ) -> Result<Self, ArbitrageError> {
        if pairs.len() != rates.len() {
            return Err(ArbitrageError::config(format!(
                "{} pairs but {} rates",
                pairs.len(),
                rates.len()
            )));
        }

        let mut all_pools = Vec::with_capacity(pairs.len() + pools.len());
        for (pair, rate) in pairs.iter().zip(rates) {
            let [asset0, asset1] = pair.as_slice() else {
                return Err(ArbitrageError::config(format!(
                    "pair {pair:?} must hold exactly two assets"
                )));
            };
            all_pools.push(Rc::new(Pool::fixed_rate(
                format!("{GENERIC_POOL}({asset0}/{asset1})"),
                asset0.clone(),
                asset1.clone(),
                *rate,
            )?));
        }
        all_pools.extend(pools.into_iter().map(Rc::new));

        let graph = AssetGraph::new(&all_pools)?;

        if initial_assets.is_empty() {
            return Err(ArbitrageError::config("at least one initial asset is required"));
        }
        let mut seen = HashSet::new();
        let mut starts = Vec::with_capacity(initial_assets.len());
        for asset in initial_assets {
            if !graph.contains(&asset) {
                return Err(ArbitrageError::config(format!(
                    "initial asset {asset} is not traded by any pool"
                )));
            }
            if seen.insert(asset.clone()) {
                starts.push(asset);
            }
        }

        info!(
            "Arbitrator configured with {} pools over {} assets, starting from {:?}",
            all_pools.len(),
            graph.assets().len(),
            starts
        );
        Ok(Self {
            pools: all_pools,
            graph,
            initial_assets: starts,
        })
    }

    /// Arbitrator over fixed-rate pairs only
    ///
    /// # Errors
    ///
    /// See [`Arbitrator::new`].
    pub fn from_rates(
        pairs: &[Vec<AssetId>],
        rates: &[f64],
        initial_assets: Vec<AssetId>,
    ) -> Result<Self, ArbitrageError> {
        Self::new(pairs, rates, Vec::new(), initial_assets)
    }

    /// Arbitrator over pools only
    ///
    /// # Errors
    ///
    /// See [`Arbitrator::new`].
    pub fn from_pools(
        pools: Vec<Pool>,
        initial_assets: Vec<AssetId>,
    ) -> Result<Self, ArbitrageError> {
        Self::new(&[], &[], pools, initial_assets)
    }

    /// The configured pools
    #[must_use]
    pub fn pools(&self) -> &[PoolRef] {
        &self.pools
    }

    /// The asset graph
    #[must_use]
    pub const fn graph(&self) -> &AssetGraph {
        &self.graph
    }

    /// Assets loops may start from
    #[must_use]
    pub fn initial_assets(&self) -> &[AssetId] {
        &self.initial_assets
    }

    /// Put every pool back to its configured reserves
    pub fn reset_pools(&self) {
        for pool in &self.pools {
            pool.reset();
        }
    }

    /// Loops of the requested sizes, most profitable unit trade first. Fees are applied.
    #[must_use]
    pub fn get_loops(&self, sizes: &[usize]) -> Vec<Cycle> {
        self.get_loops_with(sizes, true)
    }

    /// Loops of the requested sizes from every initial asset, sorted by what one unit of the
    /// initial asset returns (descending). The sort is stable, so equal returns keep discovery
    /// order: sizes ascending, then initial assets in declaration order. Loops that cannot
    /// convert a unit sort last. Sizes below 2 are ignored. Pools are left untouched.
    #[must_use]
    pub fn get_loops_with(&self, sizes: &[usize], with_fees: bool) -> Vec<Cycle> {
        let sizes: BTreeSet<usize> = sizes.iter().copied().filter(|size| *size >= 2).collect();
        let cycles = CycleFinder::new(&self.graph).find_all(&self.initial_assets, &sizes);

        let mut ranked: Vec<(f64, Cycle)> = cycles
            .into_iter()
            .map(|cycle| {
                let unit_return = cycle.unit_return(with_fees).unwrap_or_else(|e| {
                    debug!("Cycle {cycle} cannot convert a unit: {e}");
                    f64::NEG_INFINITY
                });
                (unit_return, cycle)
            })
            .collect();
        ranked.sort_by(|(a, _), (b, _)| b.total_cmp(a));

        info!("Found {} loops of sizes {:?}", ranked.len(), sizes);
        ranked.into_iter().map(|(_, cycle)| cycle).collect()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::arb::optimizer::ProfitOptimum;
    use crate::arb::pool::ExchangePrimitive;
    use crate::arb::test_helpers::*;

    fn simple_pairs() -> Vec<Vec<AssetId>> {
        vec![assets(&["A", "B"]), assets(&["A", "C"]), assets(&["B", "C"])]
    }

    #[test]
    fn test_simple_rates() {
        let arb = Arbitrator::from_rates(&simple_pairs(), &[1.2, 1.11, 0.57], assets(&["A"])).unwrap();
        let loops = arb.get_loops(&[3]);

        assert_eq!(loops.len(), 2);
        let returns: Vec<f64> = loops.iter().map(|l| l.convert(1.0).unwrap()).collect();
        assert!((returns[0] - 1.62).abs() < 0.01);
        assert!((returns[1] - 0.62).abs() < 0.01);
        for cycle in &loops {
            assert_eq!(cycle.size(), 3);
            assert_eq!(cycle.initial_asset(), &AssetId::from("A"));
            assert!(matches!(
                cycle.get_max_absolute_profit().unwrap(),
                ProfitOptimum::Linear { .. }
            ));
        }
    }

    #[test]
    fn test_rotations_are_distinct() {
        let arb =
            Arbitrator::from_rates(&simple_pairs(), &[1.2, 1.11, 0.57], assets(&["A", "B", "A"]))
                .unwrap();
        assert_eq!(arb.initial_assets(), assets(&["A", "B"]).as_slice());

        let loops = arb.get_loops(&[3]);
        assert_eq!(loops.len(), 4);
        assert!(loops[0].convert(1.0).unwrap() >= loops[3].convert(1.0).unwrap());
    }

    #[test]
    fn test_sizes_below_two_are_ignored() {
        let arb = Arbitrator::from_rates(&simple_pairs(), &[1.2, 1.11, 0.57], assets(&["A"])).unwrap();
        assert!(arb.get_loops(&[0, 1]).is_empty());
        assert!(arb.get_loops(&[2]).is_empty());
        assert_eq!(arb.get_loops(&[1, 3, 3]).len(), 2);
    }

    #[test]
    fn test_complex_pools() {
        let p1 = Pool::new(
            "test1",
            assets(&["A", "B", "C"]),
            vec![100.0, 200.0, 300.0],
            ExchangePrimitive::constant_sum("testC", 0.0).unwrap(),
        )
        .unwrap();
        let p2 = Pool::new(
            "test2",
            assets(&["A", "B", "C", "D"]),
            vec![100.0, 200.0, 300.0, 400.0],
            ExchangePrimitive::constant_sum("testC", 0.0).unwrap(),
        )
        .unwrap();
        let arb = Arbitrator::from_pools(vec![p1, p2], assets(&["A", "B"])).unwrap();
        let loops = arb.get_loops(&[3, 4]);

        assert!(!loops.is_empty());
        for cycle in &loops {
            assert!(cycle.size() > 2 && cycle.size() < 5);
            assert!(["A", "B"].contains(&cycle.initial_asset().as_str()));
        }
    }

    #[test]
    fn test_mixed_pairs_and_pools() {
        let market = three_pool_market();
        let pools: Vec<Pool> = market.into_iter().take(2).collect();
        let arb = Arbitrator::new(&[assets(&["A", "B"])], &[1.5], pools, assets(&["A"])).unwrap();

        assert_eq!(arb.pools().len(), 3);
        assert_eq!(arb.pools()[0].id().to_string(), "GENERIC(A/B)");
        // pool1 and pool2 both quote A/B, next to the fixed rate
        assert_eq!(
            arb.graph().edges_between(&"A".into(), &"B".into()).len(),
            3
        );
    }

    #[test]
    fn test_three_pool_market_best_loop() {
        let arb = Arbitrator::from_pools(three_pool_market(), assets(&["A"])).unwrap();
        let loops = arb.get_loops(&[3]);
        let best = &loops[0];
        assert_eq!(
            best.to_string(),
            "A -[pool3]-> B -[pool2]-> C -[pool1]-> A"
        );

        let before: Vec<_> = arb.pools().iter().map(|p| p.reserves()).collect();
        let (amount_in, profit) = best.get_max_absolute_profit().unwrap().as_pair().unwrap();
        assert!((amount_in - 65.23).abs() < 0.01, "amount in {amount_in}");
        assert!((profit - 38.70).abs() < 0.01, "profit {profit}");

        let after: Vec<_> = arb.pools().iter().map(|p| p.reserves()).collect();
        assert_eq!(before, after);
    }

    #[test]
    fn test_sorted_by_unit_return() {
        let arb = Arbitrator::from_pools(three_pool_market(), assets(&["A", "B"])).unwrap();
        let loops = arb.get_loops(&[2, 3, 4]);
        let returns: Vec<f64> = loops.iter().map(|l| l.unit_return(true).unwrap()).collect();

        assert!(returns.windows(2).all(|w| w[0] >= w[1]));
        arb.reset_pools();
    }

    #[test]
    fn test_ties_keep_discovery_order_and_failures_sort_last() {
        // B reserve of S cannot cover a unit, so loops entering S from A fail
        let stable = Pool::new(
            "S",
            assets(&["A", "B"]),
            vec![100.0, 0.5],
            ExchangePrimitive::constant_sum("cs", 0.0).unwrap(),
        )
        .unwrap();
        let pairs = vec![assets(&["A", "B"]), assets(&["A", "B"])];
        let arb = Arbitrator::new(&pairs, &[1.0, 1.0], vec![stable], assets(&["A"])).unwrap();
        let loops = arb.get_loops(&[2]);

        let edges: Vec<Vec<usize>> = loops
            .iter()
            .map(|cycle| cycle.swaps().iter().map(|swap| swap.id().edge).collect())
            .collect();
        assert_eq!(
            edges,
            vec![
                vec![0, 1],
                vec![0, 2],
                vec![1, 0],
                vec![1, 2],
                vec![2, 0],
                vec![2, 1]
            ]
        );
        for cycle in &loops[..4] {
            assert_eq!(cycle.unit_return(true), Ok(1.0));
        }
        for cycle in &loops[4..] {
            assert!(cycle.unit_return(true).unwrap_err().is_insufficient_liquidity());
        }
        assert_eq!(
            loops[0].to_string(),
            "A -[GENERIC(A/B)]-> B -[GENERIC(A/B)]-> A"
        );
        assert_eq!(loops[4].to_string(), "A -[S]-> B -[GENERIC(A/B)]-> A");
    }

    #[test]
    fn test_executing_best_loop_and_reset() {
        let arb = Arbitrator::from_pools(three_pool_market(), assets(&["A"])).unwrap();
        let best = arb.get_loops(&[3]).remove(0);

        let first = best.convert_with(10.0, true, false).unwrap();
        let second = best.convert_with(10.0, true, false).unwrap();
        assert!(second < first);

        arb.reset_pools();
        assert_eq!(arb.pools()[0].reserves(), vec![500.0, 400.0, 200.0]);
        assert!((best.convert(10.0).unwrap() - first).abs() < 1e-9);
    }

    #[test]
    fn test_invalid_configuration() {
        let mismatched = Arbitrator::from_rates(&simple_pairs(), &[1.2], assets(&["A"]));
        assert_eq!(
            mismatched.err().unwrap().to_string(),
            "invalid configuration: 3 pairs but 1 rates"
        );

        let bad_pair = Arbitrator::from_rates(&[assets(&["A", "B", "C"])], &[1.2], assets(&["A"]));
        assert!(bad_pair.is_err());

        let unknown_start = Arbitrator::from_rates(&simple_pairs(), &[1.2, 1.11, 0.57], assets(&["Z"]));
        assert_eq!(
            unknown_start.err().unwrap().to_string(),
            "invalid configuration: initial asset Z is not traded by any pool"
        );

        let no_start = Arbitrator::from_rates(&simple_pairs(), &[1.2, 1.11, 0.57], Vec::new());
        assert!(no_start.is_err());

        let nothing = Arbitrator::from_rates(&[], &[], assets(&["A"]));
        assert_eq!(
            nothing.err().unwrap().to_string(),
            "invalid configuration: no pools or rates configured"
        );
    }
}
