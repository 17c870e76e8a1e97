use std::{
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    },
    time::Duration,
};

use super::{BuilderPool, PointSource, PoolConfiguration, PoolError, SlotPool, SlotPoolSettings};
use crate::data_model::{Builder, BuilderState, PointData};

/// Default number of builders, and of points, held by a [`BoundedBlockingPool`].
pub const DEFAULT_CAPACITY: usize = 1024;

/// Default time a [`BoundedBlockingPool`] claim waits before failing.
pub const DEFAULT_CLAIM_TIMEOUT: Duration = Duration::from_secs(3600);

const BUILDER_POOL_NAME: &str = "point_builders";
const POINT_POOL_NAME: &str = "points";

// Pools are numbered so that each one reports its metrics under its own `pool_name`.
static NEXT_POOL_ID: AtomicUsize = AtomicUsize::new(0);

/// A bounded, blocking builder pool.
///
/// Builders come from a fixed set created up front, and the points they build come from a second, nested fixed set.
/// Borrowing a builder when none are free blocks until one is released, up to the builder claim timeout; building a
/// point when none are free likewise blocks up to the point claim timeout. Both are released by dropping them.
///
/// Shutting the pool down refuses further borrows. The nested point pool stays usable, so builders that are already out
/// can still build.
///
/// Each pool gets a process-unique id, and its builder and point slots are named `point_builders_<id>` and
/// `points_<id>`. Those names label the pool's metrics and appear in its errors.
#[derive(Clone)]
pub struct BoundedBlockingPool {
    builders: SlotPool<BuilderState>,
    points: SlotPool<PointData>,
    point_source: Arc<dyn PointSource>,
}

impl BoundedBlockingPool {
    /// Creates a new `BoundedBlockingPool` with the default capacity and claim timeout.
    pub fn new() -> Self {
        let settings = SlotPoolSettings::new(DEFAULT_CAPACITY, DEFAULT_CLAIM_TIMEOUT);
        Self::with_settings(settings, settings)
    }

    /// Creates a new `BoundedBlockingPool` with separate settings for builders and points.
    pub fn with_settings(builders: SlotPoolSettings, points: SlotPoolSettings) -> Self {
        let id = NEXT_POOL_ID.fetch_add(1, Ordering::Relaxed);
        let builders = SlotPool::new(format!("{}_{}", BUILDER_POOL_NAME, id), builders);
        let points = SlotPool::new(format!("{}_{}", POINT_POOL_NAME, id), points);
        let point_source = Arc::new(points.clone());

        Self {
            builders,
            points,
            point_source,
        }
    }

    /// Creates a new `BoundedBlockingPool` from the given configuration.
    pub fn from_configuration(config: &PoolConfiguration) -> Self {
        Self::with_settings(config.builder_settings(), config.point_settings())
    }

    /// Returns the name of the builder slots.
    pub fn builder_pool_name(&self) -> &str {
        self.builders.name()
    }

    /// Returns the name of the point slots.
    pub fn point_pool_name(&self) -> &str {
        self.points.name()
    }

    /// Returns the number of builders available to borrow.
    pub fn available_builders(&self) -> usize {
        self.builders.available()
    }

    /// Returns the number of points available to build into.
    pub fn available_points(&self) -> usize {
        self.points.available()
    }
}

impl Default for BoundedBlockingPool {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for BoundedBlockingPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BoundedBlockingPool")
            .field("builders", &self.builders)
            .field("points", &self.points)
            .finish()
    }
}

impl BuilderPool for BoundedBlockingPool {
    fn name(&self) -> &str {
        "bounded"
    }

    fn borrow(&self) -> Result<Builder, PoolError> {
        let state = self.builders.claim()?;
        Ok(Builder::from_state(
            self.builders.reclaimer(),
            Arc::clone(&self.point_source),
            state,
        ))
    }

    fn shutdown(&self) {
        self.builders.shutdown();
    }
}
