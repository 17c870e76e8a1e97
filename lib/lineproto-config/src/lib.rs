//! Layered configuration loading.
//!
//! Configuration is read once at startup from any combination of YAML files, JSON files, and prefixed environment
//! variables, then either deserialized straight into a typed struct or kept around as a [`GenericConfiguration`] that
//! components query for the keys they care about.
#![deny(warnings)]
#![deny(missing_docs)]

use std::{borrow::Cow, collections::HashSet, path::Path, sync::Arc};

use figment::{
    error::Kind,
    providers::{Env, Serialized},
    Figment, Provider,
};
use lineproto_error::GenericError;
use serde::{Deserialize, Serialize};
use snafu::{ResultExt as _, Snafu};
use tracing::debug;

mod provider;

use self::provider::FileProvider;

/// A configuration error.
#[derive(Debug, Snafu)]
#[snafu(context(suffix(false)))]
pub enum ConfigurationError {
    /// Environment variable prefix was empty.
    #[snafu(display("Environment variable prefix must not be empty."))]
    EmptyPrefix,

    /// A configuration file could not be read or parsed.
    #[snafu(display("Failed to load configuration file '{}'.", path))]
    File {
        /// Path of the file.
        path: String,

        /// Error source.
        source: GenericError,
    },

    /// Requested key was not present in any configuration source.
    #[snafu(display("Missing field '{}' in configuration. {}", field, help_text))]
    MissingField {
        /// Hint listing the spellings the key can be provided under, including environment variables when those were
        /// loaded.
        help_text: String,

        /// Name of the missing field.
        field: Cow<'static, str>,
    },

    /// Value for a key had a different type than requested.
    #[snafu(display(
        "Expected value for field '{}' to be '{}', got '{}' instead.",
        field,
        expected_ty,
        actual_ty
    ))]
    InvalidFieldType {
        /// Period-separated path to the field.
        field: String,

        /// Expected data type.
        expected_ty: String,

        /// Actual data type.
        actual_ty: String,
    },

    /// Any other extraction failure.
    #[snafu(display("Failed to query configuration."))]
    Generic {
        /// Error source.
        source: GenericError,
    },
}

impl From<figment::Error> for ConfigurationError {
    fn from(e: figment::Error) -> Self {
        translate_error(&HashSet::new(), e)
    }
}

/// Where a key may have come from, used to build help text for missing keys.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
enum LookupSource {
    Environment { prefix: String },
}

impl LookupSource {
    fn spelling_for(&self, key: &str) -> String {
        match self {
            // `prefix` already carries its trailing underscore.
            Self::Environment { prefix } => format!("{}{}", prefix, key.replace('.', "_")).to_uppercase(),
        }
    }
}

struct BoxedProvider(Box<dyn Provider + Send + Sync>);

impl Provider for BoxedProvider {
    fn metadata(&self) -> figment::Metadata {
        self.0.metadata()
    }

    fn data(&self) -> Result<figment::value::Map<figment::Profile, figment::value::Dict>, figment::Error> {
        self.0.data()
    }
}

/// Loads configuration from a stack of sources.
///
/// Sources added later override sources added earlier, key by key.
#[derive(Default)]
pub struct ConfigurationLoader {
    lookup_sources: HashSet<LookupSource>,
    providers: Vec<BoxedProvider>,
}

impl ConfigurationLoader {
    /// Adds a serializable value as a source.
    ///
    /// Mostly useful for seeding defaults, or for building a configuration in tests without touching the filesystem or
    /// the environment.
    pub fn from_serialized<T>(mut self, value: T) -> Self
    where
        T: Serialize + Send + Sync + 'static,
    {
        self.providers
            .push(BoxedProvider(Box::new(Serialized::defaults(value))));
        self
    }

    /// Adds the given YAML file as a source.
    ///
    /// # Errors
    ///
    /// If the file cannot be read or is not valid YAML, an error is returned.
    pub fn from_yaml<P>(self, path: P) -> Result<Self, ConfigurationError>
    where
        P: AsRef<Path>,
    {
        self.push_file(path.as_ref(), FileProvider::from_yaml(path.as_ref()))
    }

    /// Adds the given YAML file as a source, skipping it if it cannot be loaded.
    pub fn try_from_yaml<P>(self, path: P) -> Self
    where
        P: AsRef<Path>,
    {
        self.try_push_file(path.as_ref(), FileProvider::from_yaml(path.as_ref()))
    }

    /// Adds the given JSON file as a source.
    ///
    /// # Errors
    ///
    /// If the file cannot be read or is not valid JSON, an error is returned.
    pub fn from_json<P>(self, path: P) -> Result<Self, ConfigurationError>
    where
        P: AsRef<Path>,
    {
        self.push_file(path.as_ref(), FileProvider::from_json(path.as_ref()))
    }

    /// Adds the given JSON file as a source, skipping it if it cannot be loaded.
    pub fn try_from_json<P>(self, path: P) -> Self
    where
        P: AsRef<Path>,
    {
        self.try_push_file(path.as_ref(), FileProvider::from_json(path.as_ref()))
    }

    /// Adds environment variables starting with `prefix` as a source.
    ///
    /// An underscore is appended to the prefix when missing, so `LINEPROTO` matches `LINEPROTO_POINT_BUILDER_POOL` and
    /// exposes it as `point_builder_pool`. Matching is case-insensitive.
    ///
    /// # Errors
    ///
    /// If the prefix is empty, an error is returned.
    pub fn from_environment(mut self, prefix: &str) -> Result<Self, ConfigurationError> {
        if prefix.is_empty() {
            return Err(ConfigurationError::EmptyPrefix);
        }

        let prefix = if prefix.ends_with('_') {
            prefix.to_uppercase()
        } else {
            format!("{}_", prefix.to_uppercase())
        };

        // `Env` reads lazily and isn't `Sync`, so snapshot it now.
        let snapshot = Env::prefixed(&prefix).data()?;
        if let Some(values) = snapshot.get(&figment::Profile::Default) {
            self.providers
                .push(BoxedProvider(Box::new(Serialized::defaults(values.clone()))));
        }
        self.lookup_sources.insert(LookupSource::Environment { prefix });

        Ok(self)
    }

    /// Consumes the loader, deserializing the merged configuration as `T`.
    ///
    /// # Errors
    ///
    /// If the configuration cannot be deserialized into `T`, an error is returned.
    pub fn into_typed<'a, T>(self) -> Result<T, ConfigurationError>
    where
        T: Deserialize<'a>,
    {
        let figment = merge(&self.providers);
        figment.extract().map_err(|e| translate_error(&self.lookup_sources, e))
    }

    /// Consumes the loader, producing a queryable [`GenericConfiguration`].
    pub fn into_generic(self) -> GenericConfiguration {
        GenericConfiguration {
            inner: Arc::new(Inner {
                figment: merge(&self.providers),
                lookup_sources: self.lookup_sources,
            }),
        }
    }

    fn push_file(
        mut self, path: &Path, provider: Result<FileProvider, figment::Error>,
    ) -> Result<Self, ConfigurationError> {
        let provider = provider
            .map_err(GenericError::from)
            .context(File {
                path: path.to_string_lossy().into_owned(),
            })?;
        self.providers.push(BoxedProvider(Box::new(provider)));
        Ok(self)
    }

    fn try_push_file(mut self, path: &Path, provider: Result<FileProvider, figment::Error>) -> Self {
        match provider {
            Ok(provider) => self.providers.push(BoxedProvider(Box::new(provider))),
            Err(e) => {
                debug!(error = %e, file_path = %path.to_string_lossy(), "Unable to load configuration file. Ignoring.")
            }
        }
        self
    }
}

fn merge(providers: &[BoxedProvider]) -> Figment {
    providers
        .iter()
        .fold(Figment::new(), |figment, provider| figment.admerge(provider))
}

#[derive(Debug)]
struct Inner {
    figment: Figment,
    lookup_sources: HashSet<LookupSource>,
}

/// Merged configuration in its raw form.
///
/// Keys use periods to address nested values: with `{"pool": {"capacity": 8}}`, the key `pool.capacity` yields `8`.
/// Environment variables cannot express nesting, so a nested key that isn't found is retried with periods replaced by
/// underscores (`pool_capacity`).
#[derive(Clone, Debug)]
pub struct GenericConfiguration {
    inner: Arc<Inner>,
}

impl GenericConfiguration {
    fn get<'a, T>(&self, key: &str) -> Result<T, ConfigurationError>
    where
        T: Deserialize<'a>,
    {
        let figment = &self.inner.figment;
        match figment.extract_inner(key) {
            Ok(value) => Ok(value),
            Err(e) if matches!(e.kind, Kind::MissingField(_)) && key.contains('.') => figment
                .extract_inner(&key.replace('.', "_"))
                .map_err(|e| translate_error(&self.inner.lookup_sources, e)),
            Err(e) => Err(translate_error(&self.inner.lookup_sources, e)),
        }
    }

    /// Gets the value at `key`.
    ///
    /// # Errors
    ///
    /// If the key is missing, or its value cannot be deserialized into `T`, an error is returned.
    pub fn get_typed<'a, T>(&self, key: &str) -> Result<T, ConfigurationError>
    where
        T: Deserialize<'a>,
    {
        self.get(key)
    }

    /// Gets the value at `key`, falling back to `T::default()` on any error.
    ///
    /// Deserialization errors are swallowed as well, so prefer [`try_get_typed`][Self::try_get_typed] when a malformed
    /// value should be reported.
    pub fn get_typed_or_default<'a, T>(&self, key: &str) -> T
    where
        T: Default + Deserialize<'a>,
    {
        self.get(key).unwrap_or_default()
    }

    /// Gets the value at `key` if present.
    ///
    /// # Errors
    ///
    /// If the key is present but its value cannot be deserialized into `T`, an error is returned.
    pub fn try_get_typed<'a, T>(&self, key: &str) -> Result<Option<T>, ConfigurationError>
    where
        T: Deserialize<'a>,
    {
        match self.get(key) {
            Ok(value) => Ok(Some(value)),
            Err(ConfigurationError::MissingField { .. }) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Deserializes the entire configuration as `T`.
    ///
    /// # Errors
    ///
    /// If the configuration cannot be deserialized into `T`, an error is returned.
    pub fn as_typed<'a, T>(&self) -> Result<T, ConfigurationError>
    where
        T: Deserialize<'a>,
    {
        self.inner
            .figment
            .extract()
            .map_err(|e| translate_error(&self.inner.lookup_sources, e))
    }
}

fn translate_error(lookup_sources: &HashSet<LookupSource>, e: figment::Error) -> ConfigurationError {
    match e.kind {
        Kind::MissingField(field) => {
            let mut spellings = vec![field.to_string()];
            spellings.extend(lookup_sources.iter().map(|source| source.spelling_for(&field)));

            ConfigurationError::MissingField {
                help_text: format!("Try setting `{}`.", spellings.join("` or `")),
                field,
            }
        }
        Kind::InvalidType(actual_ty, expected_ty) => ConfigurationError::InvalidFieldType {
            field: e.path.join("."),
            expected_ty,
            actual_ty: actual_ty.to_string(),
        },
        _ => ConfigurationError::Generic { source: e.into() },
    }
}

#[cfg(test)]
mod tests {
    use figment::Jail;

    use super::*;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Settings {
        strategy: String,
        capacity: usize,
    }

    #[test]
    fn later_sources_override_earlier_ones() {
        Jail::expect_with(|jail| {
            jail.create_file("base.yaml", "strategy: default\ncapacity: 16\n")?;
            jail.create_file("override.json", r#"{ "capacity": 64 }"#)?;

            let settings: Settings = ConfigurationLoader::default()
                .from_yaml("base.yaml")
                .expect("yaml loads")
                .from_json("override.json")
                .expect("json loads")
                .into_typed()
                .expect("settings deserialize");

            assert_eq!(
                settings,
                Settings {
                    strategy: "default".to_string(),
                    capacity: 64
                }
            );
            Ok(())
        });
    }

    #[test]
    fn environment_overrides_files() {
        Jail::expect_with(|jail| {
            jail.create_file("base.yaml", "strategy: default\ncapacity: 16\n")?;
            jail.set_env("LINEPROTO_STRATEGY", "bounded");

            let config = ConfigurationLoader::default()
                .from_yaml("base.yaml")
                .expect("yaml loads")
                .from_environment("lineproto")
                .expect("prefix is not empty")
                .into_generic();

            assert_eq!(config.get_typed::<String>("strategy").unwrap(), "bounded");
            assert_eq!(config.get_typed::<usize>("capacity").unwrap(), 16);
            Ok(())
        });
    }

    #[test]
    fn missing_file_is_an_error_unless_optional() {
        Jail::expect_with(|_| {
            let result = ConfigurationLoader::default().from_yaml("nope.yaml");
            assert!(matches!(result, Err(ConfigurationError::File { .. })));

            let config = ConfigurationLoader::default().try_from_yaml("nope.yaml").into_generic();
            assert_eq!(config.try_get_typed::<String>("strategy").unwrap(), None);
            Ok(())
        });
    }

    #[test]
    fn empty_prefix_rejected() {
        let result = ConfigurationLoader::default().from_environment("");
        assert!(matches!(result, Err(ConfigurationError::EmptyPrefix)));
    }

    #[test]
    fn missing_field_help_mentions_environment() {
        Jail::expect_with(|_| {
            let config = ConfigurationLoader::default()
                .from_environment("LINEPROTO_")
                .expect("prefix is not empty")
                .into_generic();

            match config.get_typed::<String>("strategy") {
                Err(ConfigurationError::MissingField { help_text, field }) => {
                    assert_eq!(field, "strategy");
                    assert!(help_text.contains("LINEPROTO_STRATEGY"), "help text: {}", help_text);
                }
                other => panic!("unexpected result: {:?}", other),
            }
            Ok(())
        });
    }

    #[test]
    fn nested_keys_fall_back_to_flattened_spelling() {
        let config = ConfigurationLoader::default()
            .from_serialized(figment::util::map! { "pool_capacity" => 8 })
            .into_generic();

        assert_eq!(config.get_typed::<u32>("pool.capacity").unwrap(), 8);
    }

    #[test]
    fn wrong_type_reported() {
        let config = ConfigurationLoader::default()
            .from_serialized(figment::util::map! { "capacity" => "lots" })
            .into_generic();

        assert!(matches!(
            config.get_typed::<usize>("capacity"),
            Err(ConfigurationError::InvalidFieldType { .. })
        ));
        assert_eq!(config.get_typed_or_default::<usize>("capacity"), 0);
    }
}
