//! A swap is one edge of the asset graph traversed in one direction: it knows which pool executes
//! it and which reserve indices go in and out.
use std::fmt::{self, Debug, Display};
use std::hash::{Hash, Hasher};

use super::asset::AssetId;
use super::error::ArbitrageError;
use super::pool::PoolRef;

/// The direction of a swap along an edge.
///
/// Edges connect two assets of a pool, ordered by their position in the pool. A swap goes
/// either from the lower index to the higher one or the other way round.
#[derive(Clone, Copy, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub enum Direction {
    /// From the edge's first asset to its second
    ZeroForOne,
    /// From the edge's second asset to its first
    OneForZero,
}

impl Direction {
    /// Checks if this direction is the opposite of another direction.
    #[must_use]
    pub fn is_opposite(&self, other: &Self) -> bool {
        self != other
    }
}

impl Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self:?}")
    }
}

impl Debug for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ZeroForOne => write!(f, "0>1"),
            Self::OneForZero => write!(f, "1>0"),
        }
    }
}

/// A unique identifier for a swap: the edge it runs along and the direction.
/// Parallel edges between the same assets have different edge numbers.
#[derive(Clone, Copy, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub struct SwapId {
    /// Position of the edge in the asset graph
    pub edge: usize,
    /// The direction of the swap along the edge
    pub direction: Direction,
}

impl Debug for SwapId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{} {:?}", self.edge, self.direction)
    }
}

impl Display for SwapId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{} {}", self.edge, self.direction)
    }
}

/// A directed swap between two assets of a pool.
/// Amounts are not part of the swap; they flow through [`Swap::amount_out`].
#[derive(Clone)]
pub struct Swap {
    /// Edge and direction
    id: SwapId,
    /// Pool executing the swap
    pool: PoolRef,
    /// Index of `token_in` in the pool
    index_in: usize,
    /// Index of `token_out` in the pool
    index_out: usize,
    /// The asset paid in
    token_in: AssetId,
    /// The asset taken out
    token_out: AssetId,
}

/// Swaps compare by edge, direction and assets. Two handles to the same pool state are the
/// same swap regardless of the reserves at the time.
impl PartialEq for Swap {
    fn eq(&self, other: &Self) -> bool {
        self.token_in == other.token_in && self.token_out == other.token_out && self.id == other.id
    }
}

impl Eq for Swap {}

impl Hash for Swap {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
        self.token_in.hash(state);
        self.token_out.hash(state);
    }
}

impl Debug for Swap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            // Swap(#2 0>1, pool1, A -> B)
            "Swap({:?}, {}, {} -> {})",
            self.id,
            self.pool.id(),
            self.token_in,
            self.token_out
        )
    }
}

impl Display for Swap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -[{}]-> {}", self.token_in, self.pool.id(), self.token_out)
    }
}

impl Swap {
    /// Creates a swap of `token_in` for `token_out` in `pool`, running along edge `edge`.
    ///
    /// # Errors
    ///
    /// Returns an error if the tokens are the same or if the pool does not hold both of them.
    pub fn new(
        edge: usize,
        pool: PoolRef,
        token_in: &AssetId,
        token_out: &AssetId,
    ) -> Result<Self, ArbitrageError> {
        if token_in == token_out {
            return Err(ArbitrageError::config(
                "Swap token_in and token_out must be different",
            ));
        }
        let (Some(index_in), Some(index_out)) = (pool.index_of(token_in), pool.index_of(token_out))
        else {
            return Err(ArbitrageError::config(format!(
                "pool {} does not hold both {token_in} and {token_out}",
                pool.id()
            )));
        };
        let direction = if index_in < index_out {
            Direction::ZeroForOne
        } else {
            Direction::OneForZero
        };

        Ok(Self {
            id: SwapId { edge, direction },
            pool,
            index_in,
            index_out,
            token_in: token_in.clone(),
            token_out: token_out.clone(),
        })
    }

    /// Returns the unique identifier for this swap.
    #[must_use]
    pub const fn id(&self) -> SwapId {
        self.id
    }

    /// The pool executing the swap
    #[must_use]
    pub const fn pool(&self) -> &PoolRef {
        &self.pool
    }

    /// Returns the token being swapped in.
    #[must_use]
    pub const fn token_in(&self) -> &AssetId {
        &self.token_in
    }

    /// Returns the token being swapped out.
    #[must_use]
    pub const fn token_out(&self) -> &AssetId {
        &self.token_out
    }

    /// Whether executing the swap touches pool reserves
    #[must_use]
    pub fn is_stateful(&self) -> bool {
        self.pool.is_stateful()
    }

    /// Returns true if the swap is the reciprocal of the other swap, i.e. it runs along the same
    /// edge in the opposite direction.
    #[must_use]
    pub fn is_reciprocal(&self, other: &Self) -> bool {
        self.id.edge == other.id.edge && self.id.direction.is_opposite(&other.id.direction)
    }

    /// Execute the swap against the pool's current reserves, mutating them.
    ///
    /// # Errors
    ///
    /// Propagates the pool's error; reserves are untouched in that case.
    pub fn amount_out(&self, amount_in: f64, with_fees: bool) -> Result<f64, ArbitrageError> {
        self.pool
            .swap(self.index_in, self.index_out, amount_in, with_fees)
    }
}
