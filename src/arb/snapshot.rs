use std::rc::Rc;

use super::pool::PoolRef;

/// Scoped copy of the reserves of every pool a simulation touches.
///
/// Reserves are captured the first time a pool is seen and written back when the snapshot is
/// dropped, whatever the exit path: early return, `?` or unwinding. Calling
/// [`ReserveSnapshot::commit`] keeps the mutations instead.
#[derive(Default)]
pub struct ReserveSnapshot {
    /// Pools and their reserves at capture time, in capture order
    saved: Vec<(PoolRef, Vec<f64>)>,
}

impl ReserveSnapshot {
    /// Record the reserves of `pool` unless it is stateless or already captured.
    pub fn capture(&mut self, pool: &PoolRef) {
        if !pool.is_stateful() || self.saved.iter().any(|(seen, _)| Rc::ptr_eq(seen, pool)) {
            return;
        }
        self.saved.push((Rc::clone(pool), pool.reserves()));
    }

    /// Number of distinct pools captured
    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.saved.len()
    }

    /// Whether no pool was captured
    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.saved.is_empty()
    }

    /// Forget the captured reserves so the mutations stay visible.
    pub fn commit(mut self) {
        self.saved.clear();
    }
}

impl Drop for ReserveSnapshot {
    fn drop(&mut self) {
        for (pool, reserves) in self.saved.drain(..).rev() {
            pool.restore(reserves);
        }
    }
}
