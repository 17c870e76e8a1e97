//! Logging.

use lineproto_config::GenericConfiguration;
use lineproto_error::{ErrorContext as _, GenericError};
use serde::Deserialize;
use tracing::{level_filters::LevelFilter, Subscriber};
use tracing_subscriber::{
    layer::SubscriberExt as _, registry::LookupSpan, util::SubscriberInitExt as _, EnvFilter, Layer,
};

fn default_log_level() -> String {
    "info".to_string()
}

/// Logging configuration.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq)]
pub struct LoggingConfiguration {
    /// Log filtering directives.
    ///
    /// Either a bare level (`debug`) or a comma-separated list of `EnvFilter` directives
    /// (`info,lineproto_core::pooling=trace`).
    ///
    /// Defaults to `info`.
    #[serde(default = "default_log_level")]
    log_level: String,

    /// Whether to write logs as JSON.
    ///
    /// Defaults to `false`, which writes human-readable logs.
    #[serde(default)]
    log_format_json: bool,
}

impl LoggingConfiguration {
    /// Creates a new `LoggingConfiguration` from the given configuration.
    ///
    /// # Errors
    ///
    /// If the configuration cannot be deserialized, an error is returned.
    pub fn from_configuration(config: &GenericConfiguration) -> Result<Self, GenericError> {
        Ok(config.as_typed()?)
    }

    /// Returns the log filtering directives.
    pub fn log_level(&self) -> &str {
        &self.log_level
    }

    /// Returns `true` if logs should be written as JSON.
    pub fn log_format_json(&self) -> bool {
        self.log_format_json
    }

    /// Builds the filter described by the log level directives.
    ///
    /// # Errors
    ///
    /// If the directives are invalid, an error is returned.
    pub fn build_filter(&self) -> Result<EnvFilter, GenericError> {
        EnvFilter::builder()
            .with_default_directive(LevelFilter::INFO.into())
            .parse(&self.log_level)
            .with_error_context(|| format!("Invalid log level directives '{}'.", self.log_level))
    }
}

impl Default for LoggingConfiguration {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            log_format_json: false,
        }
    }
}

/// Logs a message to standard error and exits the process with a non-zero exit code.
pub fn fatal_and_exit(message: String) {
    eprintln!("FATAL: {}", message);
    std::process::exit(1);
}

/// Initializes the logging subsystem for `tracing`.
///
/// Logs are written to standard output, filtered by the configured log level, in either JSON or a human-readable format.
///
/// # Errors
///
/// If the log level directives are invalid, or the logging subsystem was already initialized, an error is returned.
pub fn initialize_logging(config: &LoggingConfiguration) -> Result<(), GenericError> {
    let filter = config.build_filter()?;

    if config.log_format_json {
        tracing_subscriber::registry()
            .with(json_layer().with_filter(filter))
            .try_init()
            .error_context("Failed to initialize logging.")?;
    } else {
        tracing_subscriber::registry()
            .with(pretty_layer().with_filter(filter))
            .try_init()
            .error_context("Failed to initialize logging.")?;
    }

    Ok(())
}

fn json_layer<S>() -> impl Layer<S>
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    tracing_subscriber::fmt::Layer::new()
        .json()
        .flatten_event(true)
        .with_target(true)
        .with_file(true)
        .with_line_number(true)
}

fn pretty_layer<S>() -> impl Layer<S>
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    tracing_subscriber::fmt::Layer::new().with_target(true)
}

#[cfg(test)]
mod tests {
    use lineproto_config::ConfigurationLoader;
    use serde_json::json;

    use super::*;

    #[test]
    fn defaults() {
        let config = ConfigurationLoader::default().from_serialized(json!({})).into_generic();
        let logging = LoggingConfiguration::from_configuration(&config).unwrap();

        assert_eq!(logging, LoggingConfiguration::default());
        assert_eq!(logging.log_level(), "info");
        assert!(!logging.log_format_json());
    }

    #[test]
    fn directives() {
        let config = ConfigurationLoader::default()
            .from_serialized(json!({
                "log_level": "warn,lineproto_core::pooling=trace",
                "log_format_json": true,
            }))
            .into_generic();
        let logging = LoggingConfiguration::from_configuration(&config).unwrap();

        assert!(logging.log_format_json());
        assert!(logging.build_filter().is_ok());
    }

    #[test]
    fn invalid_directives() {
        let logging = LoggingConfiguration {
            log_level: "lineproto_core=loud".to_string(),
            log_format_json: false,
        };
        assert!(logging.build_filter().is_err());
    }
}
