use std::{collections::BTreeMap, fmt, sync::Arc};

use lineproto_error::GenericError;
use snafu::ResultExt as _;
use tracing::debug;

use super::{BoundedBlockingPool, BuilderPool, Construction, NoPool, PoolConfiguration, PoolError, UnknownStrategy};

/// Strategy identifier for [`NoPool`].
pub const DEFAULT_STRATEGY: &str = "default";

/// Strategy identifier for [`BoundedBlockingPool`].
pub const BOUNDED_STRATEGY: &str = "bounded";

/// Alternate strategy identifier for [`BoundedBlockingPool`].
pub const STORM_STRATEGY: &str = "storm";

/// Constructs a builder pool from configuration.
pub type PoolConstructor =
    Box<dyn Fn(&PoolConfiguration) -> Result<Arc<dyn BuilderPool>, GenericError> + Send + Sync>;

/// A mapping from strategy identifiers to pool constructors.
///
/// The default registry knows the built-in strategies: `default`, `bounded` and `storm`. Custom strategies are added
/// with [`register`][Self::register] before the pool is resolved.
pub struct PoolRegistry {
    constructors: BTreeMap<String, PoolConstructor>,
}

impl PoolRegistry {
    /// Creates a new, empty `PoolRegistry`.
    pub fn empty() -> Self {
        Self {
            constructors: BTreeMap::new(),
        }
    }

    /// Registers a constructor under the given strategy identifier.
    ///
    /// A constructor already registered under the same identifier is replaced.
    pub fn register<F>(&mut self, strategy: impl Into<String>, constructor: F) -> &mut Self
    where
        F: Fn(&PoolConfiguration) -> Result<Arc<dyn BuilderPool>, GenericError> + Send + Sync + 'static,
    {
        self.constructors.insert(strategy.into(), Box::new(constructor));
        self
    }

    /// Returns `true` if a constructor is registered under the given strategy identifier.
    pub fn contains(&self, strategy: &str) -> bool {
        self.constructors.contains_key(strategy)
    }

    /// Returns the registered strategy identifiers, in order.
    pub fn strategies(&self) -> impl Iterator<Item = &str> {
        self.constructors.keys().map(String::as_str)
    }

    /// Constructs the pool selected by `config`.
    ///
    /// # Errors
    ///
    /// If no constructor is registered for the configured strategy, [`PoolError::UnknownStrategy`] is returned. There is
    /// no fallback to another strategy. If the constructor fails, [`PoolError::Construction`] is returned.
    pub fn resolve(&self, config: &PoolConfiguration) -> Result<Arc<dyn BuilderPool>, PoolError> {
        let strategy = config.strategy();
        let Some(constructor) = self.constructors.get(strategy) else {
            return UnknownStrategy {
                strategy,
                known: self.strategies().collect::<Vec<_>>().join(", "),
            }
            .fail();
        };

        let pool = constructor(config).context(Construction { strategy })?;
        debug!(strategy, pool = pool.name(), "Constructed point builder pool.");

        Ok(pool)
    }
}

impl Default for PoolRegistry {
    fn default() -> Self {
        let mut registry = Self::empty();
        registry
            .register(DEFAULT_STRATEGY, |_| Ok(Arc::new(NoPool::new())))
            .register(BOUNDED_STRATEGY, bounded)
            .register(STORM_STRATEGY, bounded);
        registry
    }
}

impl fmt::Debug for PoolRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PoolRegistry")
            .field("strategies", &self.constructors.keys().collect::<Vec<_>>())
            .finish()
    }
}

fn bounded(config: &PoolConfiguration) -> Result<Arc<dyn BuilderPool>, GenericError> {
    Ok(Arc::new(BoundedBlockingPool::from_configuration(config)))
}
