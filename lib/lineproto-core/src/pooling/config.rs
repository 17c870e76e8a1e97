use std::time::Duration;

use lineproto_config::GenericConfiguration;
use lineproto_error::{generic_error, GenericError};
use serde::Deserialize;

use super::{SlotPoolSettings, DEFAULT_CAPACITY, DEFAULT_CLAIM_TIMEOUT, DEFAULT_STRATEGY};

fn default_strategy() -> String {
    DEFAULT_STRATEGY.to_string()
}

const fn default_builder_capacity() -> usize {
    DEFAULT_CAPACITY
}

const fn default_claim_timeout_secs() -> u64 {
    DEFAULT_CLAIM_TIMEOUT.as_secs()
}

/// Point builder pool configuration.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq)]
pub struct PoolConfiguration {
    /// Pool strategy to use.
    ///
    /// `default` does no pooling, `bounded` (or its alias `storm`) uses a [`BoundedBlockingPool`][super::BoundedBlockingPool],
    /// and any other value must have been registered with the [`PoolRegistry`][super::PoolRegistry].
    ///
    /// Defaults to `default`.
    #[serde(rename = "point_builder_pool", default = "default_strategy")]
    strategy: String,

    /// Number of builders held by a bounded pool.
    ///
    /// Defaults to 1024.
    #[serde(rename = "point_builder_pool_capacity", default = "default_builder_capacity")]
    builder_capacity: usize,

    /// Number of points held by a bounded pool.
    ///
    /// Defaults to the builder capacity.
    #[serde(rename = "point_pool_capacity", default)]
    point_capacity: Option<usize>,

    /// How long, in seconds, a claim against a bounded pool waits before failing.
    ///
    /// Defaults to 3600 seconds.
    #[serde(
        rename = "point_builder_pool_claim_timeout_secs",
        default = "default_claim_timeout_secs"
    )]
    claim_timeout_secs: u64,
}

impl PoolConfiguration {
    /// Creates a new `PoolConfiguration` from the given configuration.
    ///
    /// # Errors
    ///
    /// If the configuration cannot be deserialized, or a capacity is zero, an error is returned.
    pub fn from_configuration(config: &GenericConfiguration) -> Result<Self, GenericError> {
        let config: Self = config.as_typed()?;
        config.validate()?;
        Ok(config)
    }

    /// Sets the pool strategy.
    pub fn with_strategy(mut self, strategy: impl Into<String>) -> Self {
        self.strategy = strategy.into();
        self
    }

    /// Sets the builder capacity, and the point capacity unless it has been set separately.
    pub fn with_builder_capacity(mut self, capacity: usize) -> Self {
        self.builder_capacity = capacity;
        self
    }

    /// Sets the point capacity.
    pub fn with_point_capacity(mut self, capacity: usize) -> Self {
        self.point_capacity = Some(capacity);
        self
    }

    /// Sets the claim timeout, rounded down to whole seconds.
    pub fn with_claim_timeout(mut self, timeout: Duration) -> Self {
        self.claim_timeout_secs = timeout.as_secs();
        self
    }

    /// Returns the pool strategy.
    pub fn strategy(&self) -> &str {
        &self.strategy
    }

    /// Returns the settings for the builder slots of a bounded pool.
    pub fn builder_settings(&self) -> SlotPoolSettings {
        SlotPoolSettings::new(self.builder_capacity, self.claim_timeout())
    }

    /// Returns the settings for the point slots of a bounded pool.
    pub fn point_settings(&self) -> SlotPoolSettings {
        SlotPoolSettings::new(
            self.point_capacity.unwrap_or(self.builder_capacity),
            self.claim_timeout(),
        )
    }

    fn claim_timeout(&self) -> Duration {
        Duration::from_secs(self.claim_timeout_secs)
    }

    fn validate(&self) -> Result<(), GenericError> {
        if self.builder_capacity == 0 {
            return Err(generic_error!("point_builder_pool_capacity must be greater than zero."));
        }
        if self.point_capacity == Some(0) {
            return Err(generic_error!("point_pool_capacity must be greater than zero."));
        }
        Ok(())
    }
}

impl Default for PoolConfiguration {
    fn default() -> Self {
        Self {
            strategy: default_strategy(),
            builder_capacity: default_builder_capacity(),
            point_capacity: None,
            claim_timeout_secs: default_claim_timeout_secs(),
        }
    }
}

#[cfg(test)]
mod tests {
    use lineproto_config::ConfigurationLoader;
    use serde_json::json;

    use super::*;

    fn load(value: serde_json::Value) -> Result<PoolConfiguration, GenericError> {
        let config = ConfigurationLoader::default().from_serialized(value).into_generic();
        PoolConfiguration::from_configuration(&config)
    }

    #[test]
    fn defaults_when_unset() {
        let config = load(json!({})).unwrap();
        assert_eq!(config, PoolConfiguration::default());
        assert_eq!(config.strategy(), "default");
        assert_eq!(config.builder_settings(), SlotPoolSettings::new(1024, Duration::from_secs(3600)));
        assert_eq!(config.point_settings(), config.builder_settings());
    }

    #[test]
    fn explicit_values() {
        let config = load(json!({
            "point_builder_pool": "storm",
            "point_builder_pool_capacity": 8,
            "point_pool_capacity": 16,
            "point_builder_pool_claim_timeout_secs": 2,
        }))
        .unwrap();

        assert_eq!(config.strategy(), "storm");
        assert_eq!(config.builder_settings(), SlotPoolSettings::new(8, Duration::from_secs(2)));
        assert_eq!(config.point_settings(), SlotPoolSettings::new(16, Duration::from_secs(2)));
    }

    #[test]
    fn point_capacity_follows_builder_capacity() {
        let config = load(json!({ "point_builder_pool_capacity": 4 })).unwrap();
        assert_eq!(config.point_settings().capacity(), 4);
    }

    #[test]
    fn zero_capacity_rejected() {
        assert!(load(json!({ "point_builder_pool_capacity": 0 })).is_err());
        assert!(load(json!({ "point_pool_capacity": 0 })).is_err());
    }

    #[test]
    fn wrong_type_rejected() {
        assert!(load(json!({ "point_builder_pool_capacity": "lots" })).is_err());
    }

    #[test]
    fn builder_helpers() {
        let config = PoolConfiguration::default()
            .with_strategy("bounded")
            .with_builder_capacity(3)
            .with_claim_timeout(Duration::from_millis(2500));

        assert_eq!(config.strategy(), "bounded");
        assert_eq!(config.point_settings(), SlotPoolSettings::new(3, Duration::from_secs(2)));

        let config = config.with_point_capacity(5);
        assert_eq!(config.point_settings().capacity(), 5);
    }
}
