use std::{fmt, sync::Arc};

use arc_swap::ArcSwap;
use tracing::debug;

use super::{BuilderPool, PoolConfiguration, PoolError, PoolRegistry};
use crate::data_model::Builder;

/// A shared, type-erased builder pool.
pub type SharedBuilderPool = Arc<dyn BuilderPool>;

/// The builder pool currently in use.
///
/// `ActivePool` is a cheaply cloneable handle to a swappable pool reference. Every clone sees the same pool, and
/// replacing it through one clone replaces it for all of them. Readers always see either the previous pool or the new
/// one, never anything in between.
///
/// A caller that grabbed the previous pool just before a swap may have its borrow refused, since the previous pool is
/// shut down once replaced.
#[derive(Clone)]
pub struct ActivePool {
    current: Arc<ArcSwap<SharedBuilderPool>>,
}

impl ActivePool {
    /// Creates a new `ActivePool` starting with the given pool.
    pub fn new(pool: SharedBuilderPool) -> Self {
        debug!(pool = pool.name(), "Activated point builder pool.");

        Self {
            current: Arc::new(ArcSwap::from_pointee(pool)),
        }
    }

    /// Creates a new `ActivePool` starting with the pool selected by `config`.
    ///
    /// # Errors
    ///
    /// If the configured strategy is not registered, or its constructor fails, an error is returned.
    pub fn from_configuration(config: &PoolConfiguration, registry: &PoolRegistry) -> Result<Self, PoolError> {
        registry.resolve(config).map(Self::new)
    }

    /// Borrows a builder for the given measurement from the current pool.
    ///
    /// # Errors
    ///
    /// See [`BuilderPool::borrow`].
    pub fn create_builder(&self, measurement: &str) -> Result<Builder, PoolError> {
        // Borrowing may block, so take our own reference rather than holding a guard.
        let pool = self.current.load_full();
        pool.create_builder(measurement)
    }

    /// Returns the current pool.
    pub fn current(&self) -> SharedBuilderPool {
        SharedBuilderPool::clone(&self.current.load())
    }

    /// Replaces the current pool, shutting down the previous one.
    ///
    /// The previous pool is returned so callers can inspect it. Builders still borrowed from it keep working and are
    /// released to it as usual.
    pub fn set(&self, pool: SharedBuilderPool) -> SharedBuilderPool {
        let next = pool.name().to_string();
        let previous = SharedBuilderPool::clone(&self.current.swap(Arc::new(pool)));
        previous.shutdown();

        debug!(previous = previous.name(), next = %next, "Replaced point builder pool.");
        previous
    }

    /// Shuts down the current pool.
    pub fn shutdown(&self) {
        let pool = self.current.load_full();
        pool.shutdown();
        debug!(pool = pool.name(), "Shut down point builder pool.");
    }
}

impl fmt::Debug for ActivePool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActivePool")
            .field("pool", &self.current.load().name())
            .finish()
    }
}
