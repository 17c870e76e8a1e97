//! Bootstrap utilities.

use std::path::Path;

use lineproto_config::{ConfigurationLoader, GenericConfiguration};
use lineproto_core::pooling::{ActivePool, PoolConfiguration, PoolRegistry};
use lineproto_error::{ErrorContext as _, GenericError};
use tracing::info;

/// Loads the application configuration.
///
/// Sources are layered in order, each overriding the previous one: the YAML file at `config_path` if given, then
/// environment variables starting with `env_prefix`.
///
/// # Errors
///
/// If the configuration file cannot be read or parsed, or the environment prefix is empty, an error is returned.
pub fn load_configuration(config_path: Option<&Path>, env_prefix: &str) -> Result<GenericConfiguration, GenericError> {
    let mut loader = ConfigurationLoader::default();
    if let Some(path) = config_path {
        loader = loader
            .from_yaml(path)
            .with_error_context(|| format!("Failed to load configuration file '{}'.", path.display()))?;
    }

    let loader = loader
        .from_environment(env_prefix)
        .error_context("Failed to load configuration from the environment.")?;

    Ok(loader.into_generic())
}

/// Creates the point builder pool selected by the configuration.
///
/// The configured strategy is looked up in `registry`. An unknown strategy is an error: there is no fallback to the
/// default pool.
///
/// # Errors
///
/// If the pool configuration is invalid, or the selected pool cannot be constructed, an error is returned.
pub fn initialize_point_pool(
    config: &GenericConfiguration, registry: &PoolRegistry,
) -> Result<ActivePool, GenericError> {
    let pool_config = PoolConfiguration::from_configuration(config)?;
    let active = ActivePool::from_configuration(&pool_config, registry)
        .with_error_context(|| format!("Failed to initialize point builder pool '{}'.", pool_config.strategy()))?;

    let pool = active.current();
    info!(
        strategy = pool_config.strategy(),
        pool = pool.name(),
        "Point builder pool initialized."
    );

    Ok(active)
}
