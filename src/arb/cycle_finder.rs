//! # Cycle finder
//!
//! Enumerates the simple closed walks of a given length through the [`AssetGraph`] starting at
//! a given asset. Simple means no asset is revisited before the walk returns to its start. Walks
//! using different parallel edges, or the same edges in the other direction, are distinct
//! cycles. No edge is used twice in a cycle.
//!
//! The search is a depth-first walk driven by an explicit stack, so deep searches do not grow
//! the call stack.

use std::collections::{BTreeSet, HashSet};
use std::iter;

use log::{debug, error};

use super::asset::AssetId;
use super::cycle::Cycle;
use super::graph::AssetGraph;
use super::swap::Swap;

/// One level of the depth-first search
struct Frame<'a> {
    /// Swaps leaving the asset this frame explores
    outgoing: &'a [Swap],
    /// Next swap of `outgoing` to try
    next: usize,
}

/// Depth-first cycle enumeration over an [`AssetGraph`].
#[derive(Debug, Clone, Copy)]
pub struct CycleFinder<'a> {
    /// Graph to search
    graph: &'a AssetGraph,
}

impl<'a> CycleFinder<'a> {
    /// Creates a finder over `graph`
    #[must_use]
    pub const fn new(graph: &'a AssetGraph) -> Self {
        Self { graph }
    }

    /// All cycles of exactly `size` swaps starting and ending at `start`, in discovery order.
    /// Sizes below 2 have no cycles.
    #[must_use]
    pub fn find(&self, start: &AssetId, size: usize) -> Vec<Cycle> {
        let mut cycles = Vec::new();
        if size < 2 {
            return cycles;
        }

        let mut path: Vec<&Swap> = Vec::with_capacity(size);
        let mut visited: HashSet<&AssetId> = HashSet::from([start]);
        let mut stack = vec![Frame {
            outgoing: self.graph.outgoing(start),
            next: 0,
        }];

        while let Some(frame) = stack.last_mut() {
            let outgoing = frame.outgoing;
            let Some(swap) = outgoing.get(frame.next) else {
                // Dead end, backtrack
                stack.pop();
                if let Some(swap) = path.pop() {
                    visited.remove(swap.token_out());
                }
                continue;
            };
            frame.next += 1;

            // A simple walk can only reuse an edge by running it backwards
            if path.iter().any(|taken| taken.is_reciprocal(swap)) {
                continue;
            }

            if path.len() + 1 == size {
                if swap.token_out() == start {
                    let swaps = path.iter().copied().chain(iter::once(swap)).cloned().collect();
                    match Cycle::new(swaps) {
                        Ok(cycle) => cycles.push(cycle),
                        Err(e) => error!("Discarding malformed cycle from {start}: {e}"),
                    }
                }
                continue;
            }

            if !visited.insert(swap.token_out()) {
                continue;
            }
            path.push(swap);
            stack.push(Frame {
                outgoing: self.graph.outgoing(swap.token_out()),
                next: 0,
            });
        }

        debug!("Found {} cycles of size {size} from {start}", cycles.len());
        cycles
    }

    /// Cycles of every requested size from every start asset: sizes ascending, then starts in
    /// the order given, each in discovery order.
    #[must_use]
    pub fn find_all(&self, starts: &[AssetId], sizes: &BTreeSet<usize>) -> Vec<Cycle> {
        sizes
            .iter()
            .flat_map(|size| starts.iter().map(move |start| (start, *size)))
            .flat_map(|(start, size)| self.find(start, size))
            .collect()
    }
}
