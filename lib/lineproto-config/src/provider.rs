use std::path::Path;

use figment::{
    providers::{Data, Format, Json, Yaml},
    value::{Dict, Map},
    Error, Metadata, Profile, Provider,
};

/// A configuration file, read and parsed when it is added to the loader.
///
/// `figment`'s own file providers defer reading until extraction, which turns a missing file into a silent empty
/// source. Reading up front lets the loader report unreadable files at the point they are added.
///
/// Read and parse errors name the file they came from. A file that is empty, or holds only whitespace, is an empty
/// source rather than a parse error, so a placeholder configuration file can be shipped without any settings in it.
pub struct FileProvider {
    data: Map<Profile, Dict>,
    metadata: Metadata,
}

impl FileProvider {
    pub fn from_yaml<P>(path: P) -> Result<Self, Error>
    where
        P: AsRef<Path>,
    {
        Self::load::<Yaml>(path.as_ref(), "YAML file")
    }

    pub fn from_json<P>(path: P) -> Result<Self, Error>
    where
        P: AsRef<Path>,
    {
        Self::load::<Json>(path.as_ref(), "JSON file")
    }

    fn load<F: Format>(path: &Path, kind: &'static str) -> Result<Self, Error> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| Error::from(format!("Failed to read {} '{}': {}", kind, path.display(), e)))?;

        let data = if contents.trim().is_empty() {
            Map::from([(Profile::Default, Dict::new())])
        } else {
            Data::<F>::string(&contents)
                .data()
                .map_err(|e| Error::from(format!("Failed to parse {} '{}': {}", kind, path.display(), e)))?
        };

        Ok(Self {
            data,
            metadata: Metadata::from(kind, path),
        })
    }
}

impl Provider for FileProvider {
    fn metadata(&self) -> Metadata {
        self.metadata.clone()
    }

    fn data(&self) -> Result<Map<Profile, Dict>, Error> {
        Ok(self.data.clone())
    }
}
