//! # Asset graph
//!
//! Multigraph of assets. Every pool contributes one edge per unordered pair of the assets it
//! holds, so a pool of N assets is a complete sub-graph on its own asset set. Parallel edges
//! (several pools quoting the same pair, or a pool next to a fixed rate) are all kept.

use std::collections::HashMap;

use log::debug;

use super::asset::AssetId;
use super::error::ArbitrageError;
use super::pool::PoolRef;
use super::swap::Swap;

/// An undirected swap capability between two assets of a pool.
#[derive(Clone, Debug)]
pub struct Edge {
    /// Position of the edge in the graph
    id: usize,
    /// Pool executing swaps along the edge
    pool: PoolRef,
    /// Index of the first asset in the pool (always lower than `index1`)
    index0: usize,
    /// Index of the second asset in the pool
    index1: usize,
}

impl Edge {
    /// Position of the edge in the graph
    #[must_use]
    pub const fn id(&self) -> usize {
        self.id
    }

    /// Pool executing swaps along the edge
    #[must_use]
    pub const fn pool(&self) -> &PoolRef {
        &self.pool
    }

    /// First asset of the edge
    #[must_use]
    pub fn asset0(&self) -> &AssetId {
        &self.pool.assets()[self.index0]
    }

    /// Second asset of the edge
    #[must_use]
    pub fn asset1(&self) -> &AssetId {
        &self.pool.assets()[self.index1]
    }

    /// The swap from the first asset to the second
    ///
    /// # Errors
    ///
    /// Only fails if the edge was built inconsistently with its pool.
    pub fn forward(&self) -> Result<Swap, ArbitrageError> {
        Swap::new(self.id, PoolRef::clone(&self.pool), self.asset0(), self.asset1())
    }

    /// The swap from the second asset to the first
    ///
    /// # Errors
    ///
    /// Only fails if the edge was built inconsistently with its pool.
    pub fn reverse(&self) -> Result<Swap, ArbitrageError> {
        Swap::new(self.id, PoolRef::clone(&self.pool), self.asset1(), self.asset0())
    }
}

/// Key of an unordered asset pair
fn pair_key(a: &AssetId, b: &AssetId) -> (AssetId, AssetId) {
    if a <= b {
        (a.clone(), b.clone())
    } else {
        (b.clone(), a.clone())
    }
}

/// Index of every swap available between the configured assets.
#[derive(Debug, Default)]
pub struct AssetGraph {
    /// Assets in order of first appearance
    assets: Vec<AssetId>,
    /// All edges in declaration order
    edges: Vec<Edge>,
    /// Unordered pair to the edges able to swap it
    pairs: HashMap<(AssetId, AssetId), Vec<usize>>,
    /// Outgoing swaps per asset, in edge order
    adjacency: HashMap<AssetId, Vec<Swap>>,
}

impl AssetGraph {
    /// Builds the graph from the given pools.
    ///
    /// # Errors
    ///
    /// Returns [`ArbitrageError::InvalidConfiguration`] if there are no pools.
    pub fn new(pools: &[PoolRef]) -> Result<Self, ArbitrageError> {
        if pools.is_empty() {
            return Err(ArbitrageError::config("no pools or rates configured"));
        }

        let mut graph = Self::default();
        for pool in pools {
            for (index0, index1) in pool.pairs() {
                graph.add_edge(Edge {
                    id: graph.edges.len(),
                    pool: PoolRef::clone(pool),
                    index0,
                    index1,
                })?;
            }
        }

        debug!(
            "Asset graph built: {} assets, {} edges, {} pairs",
            graph.assets.len(),
            graph.edges.len(),
            graph.pairs.len()
        );
        Ok(graph)
    }

    fn add_edge(&mut self, edge: Edge) -> Result<(), ArbitrageError> {
        let forward = edge.forward()?;
        let reverse = edge.reverse()?;

        for asset in [edge.asset0(), edge.asset1()] {
            if !self.adjacency.contains_key(asset) {
                self.assets.push(asset.clone());
                self.adjacency.insert(asset.clone(), Vec::new());
            }
        }
        self.adjacency
            .entry(edge.asset0().clone())
            .or_default()
            .push(forward);
        self.adjacency
            .entry(edge.asset1().clone())
            .or_default()
            .push(reverse);
        self.pairs
            .entry(pair_key(edge.asset0(), edge.asset1()))
            .or_default()
            .push(edge.id);
        self.edges.push(edge);
        Ok(())
    }

    /// Assets in order of first appearance
    #[must_use]
    pub fn assets(&self) -> &[AssetId] {
        &self.assets
    }

    /// All edges
    #[must_use]
    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    /// Whether any edge touches `asset`
    #[must_use]
    pub fn contains(&self, asset: &AssetId) -> bool {
        self.adjacency.contains_key(asset)
    }

    /// Edges able to swap `a` for `b` (either way round)
    #[must_use]
    pub fn edges_between(&self, a: &AssetId, b: &AssetId) -> Vec<&Edge> {
        self.pairs
            .get(&pair_key(a, b))
            .map(|ids| ids.iter().map(|id| &self.edges[*id]).collect())
            .unwrap_or_default()
    }

    /// Number of distinct unordered pairs that can be swapped
    #[must_use]
    pub fn pair_count(&self) -> usize {
        self.pairs.len()
    }

    /// Swaps leaving `asset`
    #[must_use]
    pub fn outgoing(&self, asset: &AssetId) -> &[Swap] {
        self.adjacency
            .get(asset)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::arb::test_helpers::*;

    #[test]
    fn test_empty() {
        assert_eq!(
            AssetGraph::new(&[]).err().unwrap().to_string(),
            "invalid configuration: no pools or rates configured"
        );
    }

    #[test]
    fn test_multi_asset_pool_is_complete_subgraph() {
        let pool = constant_product_pool("P", &["A", "B", "C", "D"], &[1.0, 2.0, 3.0, 4.0], 0.0);
        let graph = AssetGraph::new(&[pool]).unwrap();

        assert_eq!(graph.edges().len(), 6);
        assert_eq!(graph.pair_count(), 6);
        assert_eq!(graph.assets(), assets(&["A", "B", "C", "D"]).as_slice());
        for asset in graph.assets() {
            assert_eq!(graph.outgoing(asset).len(), 3);
        }
    }

    #[test]
    fn test_parallel_edges_are_kept() {
        let pools = vec![
            fixed_pool("F", "A", "B", 1.5),
            constant_product_pool("P", &["A", "B"], &[10.0, 10.0], 0.0),
        ];
        let graph = AssetGraph::new(&pools).unwrap();

        let edges = graph.edges_between(&"B".into(), &"A".into());
        assert_eq!(edges.len(), 2);
        assert_eq!(edges[0].pool().id().to_string(), "F");
        assert_eq!(edges[1].pool().id().to_string(), "P");
        assert!(graph.edges_between(&"A".into(), &"C".into()).is_empty());
    }

    #[test]
    fn test_outgoing_directions() {
        let graph = AssetGraph::new(&[fixed_pool("F", "A", "B", 2.0)]).unwrap();

        let from_a = graph.outgoing(&"A".into());
        let from_b = graph.outgoing(&"B".into());
        assert_eq!(from_a.len(), 1);
        assert_eq!(from_a[0].token_out(), &AssetId::from("B"));
        assert_eq!(from_b[0].token_out(), &AssetId::from("A"));
        assert!(from_a[0].is_reciprocal(&from_b[0]));
        assert!(graph.outgoing(&"Z".into()).is_empty());
        assert!(!graph.contains(&"Z".into()));
    }
}
