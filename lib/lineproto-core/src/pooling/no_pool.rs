use std::sync::Arc;

use super::{discard, BuilderPool, PointSource, PoolError, ReclaimStrategy};
use crate::data_model::{Builder, BuilderState, Point, PointData};

/// A builder pool that does no pooling.
///
/// Every borrow allocates a fresh builder, every build allocates a fresh point, and both are simply dropped when
/// released. Borrowing never blocks and never fails.
#[derive(Clone)]
pub struct NoPool {
    builders: Arc<dyn ReclaimStrategy<BuilderState>>,
    points: Arc<dyn PointSource>,
}

impl NoPool {
    /// Creates a new `NoPool`.
    pub fn new() -> Self {
        Self {
            builders: discard(),
            points: Arc::new(Allocate),
        }
    }
}

impl Default for NoPool {
    fn default() -> Self {
        Self::new()
    }
}

impl BuilderPool for NoPool {
    fn name(&self) -> &str {
        "default"
    }

    fn borrow(&self) -> Result<Builder, PoolError> {
        Ok(Builder::from_state(
            Arc::clone(&self.builders),
            Arc::clone(&self.points),
            BuilderState::default(),
        ))
    }
}

impl std::fmt::Debug for NoPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("NoPool")
    }
}

struct Allocate;

impl PointSource for Allocate {
    fn acquire(&self) -> Result<Point, PoolError> {
        Ok(Point::from_data(discard(), PointData::default()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn borrows_are_independent() {
        let pool = NoPool::new();
        let a = pool.create_builder("cpu").unwrap().tag("host", "a");
        let b = pool.borrow().unwrap();

        assert_eq!(a.measurement(), "cpu");
        assert!(b.measurement().is_empty());
        assert!(b.tags().is_empty());
        assert_eq!(pool.name(), "default");
    }

    #[test]
    fn shutdown_is_a_no_op() {
        let pool = NoPool::new();
        pool.shutdown();
        assert!(pool.create_builder("cpu").is_ok());
    }
}
