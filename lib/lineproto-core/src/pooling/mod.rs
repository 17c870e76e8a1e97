//! Object pooling for builders and points.
//!
//! Pooled values are split in two: the _data_ (the part worth reusing, such as a builder's maps) and a thin handle that
//! owns the data while it is borrowed. When the handle is dropped, the data is handed to a [`ReclaimStrategy`], which
//! either returns it to a pool or simply drops it. This keeps "give it back" out of the caller's hands entirely: a
//! [`Builder`] goes home when `build` consumes it or when it falls out of scope.
use std::{sync::Arc, time::Duration};

use lineproto_error::GenericError;
use snafu::Snafu;

use crate::data_model::{Builder, Point};

mod active;
pub use self::active::{ActivePool, SharedBuilderPool};

mod bounded;
pub use self::bounded::{BoundedBlockingPool, DEFAULT_CAPACITY, DEFAULT_CLAIM_TIMEOUT};

mod config;
pub use self::config::PoolConfiguration;

mod metrics;

mod no_pool;
pub use self::no_pool::NoPool;

mod registry;
pub use self::registry::{PoolConstructor, PoolRegistry, BOUNDED_STRATEGY, DEFAULT_STRATEGY, STORM_STRATEGY};

mod slot;
pub use self::slot::{SlotPool, SlotPoolSettings};

/// An item that can be cleared for reuse.
pub trait Clearable {
    /// Clears the item, keeping any allocations it holds.
    fn clear(&mut self);
}

/// Where pooled data goes when its handle is dropped.
pub trait ReclaimStrategy<T>: Send + Sync {
    /// Takes back `data` from a dropped handle.
    fn reclaim(&self, data: T);
}

/// A source of [`Point`]s for builders to fill in.
///
/// Each pool hands its builders the point source they should build into, so a pooled builder produces pooled points
/// without needing a different builder type.
pub trait PointSource: Send + Sync {
    /// Acquires an empty point.
    ///
    /// # Errors
    ///
    /// If the source is bounded and no point becomes available in time, or the source has been shut down, an error is
    /// returned.
    fn acquire(&self) -> Result<Point, PoolError>;
}

/// A pool of point builders.
pub trait BuilderPool: Send + Sync {
    /// Returns the name of the pool, for diagnostics.
    fn name(&self) -> &str;

    /// Borrows an empty builder.
    ///
    /// The builder returns to the pool when it is built or dropped.
    ///
    /// # Errors
    ///
    /// If the pool is bounded and no builder becomes available within its claim timeout, or the pool has been shut
    /// down, an error is returned.
    fn borrow(&self) -> Result<Builder, PoolError>;

    /// Borrows an empty builder for the given measurement.
    ///
    /// # Errors
    ///
    /// See [`borrow`][Self::borrow].
    fn create_builder(&self, measurement: &str) -> Result<Builder, PoolError> {
        let mut builder = self.borrow()?;
        builder.set_measurement(measurement);
        Ok(builder)
    }

    /// Shuts down the pool.
    ///
    /// After shutdown, the pool refuses further borrows. Builders that are still out are not reclaimed. Calling this
    /// more than once has no further effect.
    fn shutdown(&self) {}
}

/// A pool error.
#[derive(Debug, Snafu)]
#[snafu(context(suffix(false)), visibility(pub(crate)))]
pub enum PoolError {
    /// No item became available within the claim timeout.
    #[snafu(display("Object pool '{}' exhausted: no item became available within {:?}.", pool_name, timeout))]
    Exhausted {
        /// Name of the pool.
        pool_name: String,

        /// How long the claim waited.
        timeout: Duration,
    },

    /// The pool has been shut down.
    #[snafu(display("Object pool '{}' has been shut down.", pool_name))]
    Shutdown {
        /// Name of the pool.
        pool_name: String,
    },

    /// No pool strategy is registered under the requested identifier.
    #[snafu(display("Unknown point builder pool strategy '{}'. Known strategies: {}.", strategy, known))]
    UnknownStrategy {
        /// Requested strategy identifier.
        strategy: String,

        /// Comma-separated list of registered identifiers.
        known: String,
    },

    /// The constructor registered for a strategy failed.
    #[snafu(display("Failed to construct point builder pool for strategy '{}'.", strategy))]
    Construction {
        /// Strategy identifier.
        strategy: String,

        /// Error source.
        source: GenericError,
    },
}

/// A reclaim strategy that drops whatever it is given.
struct Discard;

impl<T> ReclaimStrategy<T> for Discard {
    fn reclaim(&self, _: T) {}
}

fn discard<T: 'static>() -> Arc<dyn ReclaimStrategy<T>> {
    Arc::new(Discard)
}
