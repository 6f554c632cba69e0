//! Registry configuration management for `dataregistry.toml`.
//!
//! # Sections
//!
//! | Section        | Purpose                                           |
//! |----------------|---------------------------------------------------|
//! | `[registry]`   | Memo staleness policy, verbose logging            |
//! | `[stream]`     | Cached value error policy                         |
//! | `[resolve]`    | Step limit, file extension to mimetype table      |
//! | `[[datasets]]` | In-memory datasets registered at startup          |
//!
//! # Example
//!
//! ```toml
//! [registry]
//! stale = "invalidate"
//!
//! [stream]
//! error = "retry"
//!
//! [resolve]
//! max_steps = 500
//!
//! [[resolve.extensions]]
//! extension = ".csv"
//! mime_type = "text/csv"
//!
//! [[datasets]]
//! url = "mem://greeting"
//! mime_type = "text/plain; mimeType=text/markdown"
//! value = "# Hello"
//! ```

mod datasets;
pub mod defaults;
mod error;
mod registry;
mod resolve;
mod stream;

pub use datasets::DatasetEntry;
pub use error::ConfigError;
pub use registry::RegistrySection;
pub use resolve::{ExtensionEntry, ResolveSection};
pub use stream::StreamSection;

use crate::{
    builtin::{resolve_extension_converter, text_mime_converter},
    convert::Converter,
    data::{DataValue, Dataset, Datasets, IntoData},
    registry::RegistryOptions,
    stream::ValueStream,
};
use educe::Educe;
use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};

/// Top-level `dataregistry.toml`.
#[derive(Debug, Clone, Educe, Serialize, Deserialize)]
#[educe(Default)]
#[serde(deny_unknown_fields)]
pub struct RegistryConfig {
    /// Path the config was loaded from (unset for defaults)
    #[serde(skip)]
    pub config_path: PathBuf,

    #[serde(default)]
    pub registry: RegistrySection,

    #[serde(default)]
    pub stream: StreamSection,

    #[serde(default)]
    pub resolve: ResolveSection,

    #[serde(default)]
    pub datasets: Vec<DatasetEntry>,
}

impl RegistryConfig {
    /// Parse configuration from TOML string
    pub fn from_str(content: &str) -> Result<Self, ConfigError> {
        let config: RegistryConfig = toml::from_str(content)?;
        Ok(config)
    }

    /// Load configuration from file path
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let content =
            fs::read_to_string(path).map_err(|err| ConfigError::Io(path.to_path_buf(), err))?;
        let mut config = Self::from_str(&content)?;
        config.config_path = path.to_path_buf();
        Ok(config)
    }

    /// Load from `path` if it exists, otherwise fall back to defaults.
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        if path.exists() {
            Self::from_path(path)
        } else {
            Ok(Self::default())
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut seen = FxHashSet::default();
        for entry in &self.resolve.extensions {
            if entry.extension.is_empty() {
                return Err(ConfigError::invalid(
                    "[[resolve.extensions]] extension",
                    "must not be empty",
                ));
            }
            if entry.mime_type.is_empty() {
                return Err(ConfigError::invalid(
                    "[[resolve.extensions]] mime_type",
                    format!("is empty for `{}`", entry.extension),
                ));
            }
            if !seen.insert(entry.extension.as_str()) {
                return Err(ConfigError::invalid(
                    "[[resolve.extensions]] extension",
                    format!("`{}` is listed twice", entry.extension),
                ));
            }
        }

        for entry in &self.datasets {
            if entry.url.is_empty() {
                return Err(ConfigError::invalid("[[datasets]] url", "must not be empty"));
            }
            if entry.mime_type.is_empty() {
                return Err(ConfigError::invalid(
                    "[[datasets]] mime_type",
                    format!("is empty for `{}`", entry.url),
                ));
            }
        }

        Ok(())
    }

    pub fn registry_options(&self) -> RegistryOptions {
        RegistryOptions {
            stale: self.registry.stale,
            max_steps: (self.resolve.max_steps > 0).then_some(self.resolve.max_steps),
            verbose: self.registry.verbose,
        }
    }

    /// `[[datasets]]` as registrable datasets, each value a cost-0 text stream.
    ///
    /// Entries sharing a URL merge into one dataset; a repeated mimetype keeps
    /// the entry listed first.
    pub fn datasets(&self) -> Datasets {
        let mut datasets = Datasets::new();
        for entry in &self.datasets {
            let data = ValueStream::just(entry.value.clone()).into_data_with(self.stream.error);
            let dataset: Dataset = [(entry.mime_type.clone(), DataValue::new(0, data))]
                .into_iter()
                .collect();
            let mut one = Datasets::new();
            one.insert(entry.url.clone(), dataset);
            datasets.merge_from(&one);
        }
        datasets
    }

    /// One extension resolver and one text-to-mimetype converter per
    /// `[[resolve.extensions]]` entry.
    pub fn converters(&self) -> Vec<Converter> {
        let mut mime_types = FxHashSet::default();
        let mut converters = Vec::with_capacity(self.resolve.extensions.len() * 2);
        for entry in &self.resolve.extensions {
            converters.push(resolve_extension_converter(
                entry.extension.clone(),
                entry.mime_type.clone(),
            ));
            if mime_types.insert(entry.mime_type.as_str()) {
                converters.push(text_mime_converter(entry.mime_type.clone()));
            }
        }
        converters
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_from_str() {
        let config = RegistryConfig::from_str(
            r#"
            [registry]
            verbose = true

            [resolve]
            max_steps = 42
        "#,
        )
        .unwrap();

        assert!(config.registry.verbose);
        let options = config.registry_options();
        assert_eq!(options.max_steps, Some(42));
        assert!(options.verbose);
    }

    #[test]
    fn test_zero_max_steps_is_unlimited() {
        let config = RegistryConfig::from_str("[resolve]\nmax_steps = 0").unwrap();
        assert!(config.validate().is_ok());
        assert_eq!(config.registry_options().max_steps, None);

        let options = RegistryConfig::default().registry_options();
        assert_eq!(options.max_steps, Some(10_000));
    }

    #[test]
    fn test_from_str_invalid_toml() {
        let result = RegistryConfig::from_str("[registry");
        assert!(matches!(result, Err(ConfigError::Toml(_))));
    }

    #[test]
    fn test_unknown_section_rejected() {
        assert!(RegistryConfig::from_str("[build]\noutput = \"public\"").is_err());
    }

    #[test]
    fn test_from_path() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[stream]\nerror = \"retry\"").unwrap();

        let config = RegistryConfig::from_path(file.path()).unwrap();
        assert_eq!(config.config_path, file.path());
        assert_eq!(config.stream.error, crate::stream::ErrorPolicy::Retry);
    }

    #[test]
    fn test_from_path_missing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dataregistry.toml");

        assert!(matches!(
            RegistryConfig::from_path(&path),
            Err(ConfigError::Io(..))
        ));

        let config = RegistryConfig::load_or_default(&path).unwrap();
        assert_eq!(config.resolve.max_steps, 10_000);
        assert!(config.datasets.is_empty());
    }

    #[test]
    fn test_validate() {
        assert!(RegistryConfig::default().validate().is_ok());

        let config = RegistryConfig::from_str(
            r#"
            [[resolve.extensions]]
            extension = ".csv"
            mime_type = ""
        "#,
        )
        .unwrap();
        assert!(config.validate().is_err());

        let config = RegistryConfig::from_str(
            r#"
            [[resolve.extensions]]
            extension = ".csv"
            mime_type = "text/csv"

            [[resolve.extensions]]
            extension = ".csv"
            mime_type = "text/x-csv"
        "#,
        )
        .unwrap();
        assert!(config.validate().is_err());

        let config = RegistryConfig::from_str(
            "[[datasets]]\nurl = \"\"\nmime_type = \"text/plain\"\nvalue = \"x\"",
        )
        .unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_datasets() {
        let config = RegistryConfig::from_str(
            r#"
            [[datasets]]
            url = "mem://a"
            mime_type = "text/csv"
            value = "x,y"

            [[datasets]]
            url = "mem://a"
            mime_type = "text/plain"
            value = "hello"
        "#,
        )
        .unwrap();

        let datasets = config.datasets();
        assert_eq!(datasets.len(), 1);
        assert_eq!(datasets.mime_types("mem://a"), vec!["text/csv", "text/plain"]);

        let csv = datasets
            .data("mem://a", "text/csv")
            .and_then(|d| d.get::<ValueStream<String>>())
            .unwrap();
        assert!(csv.is_cached());
        assert_eq!(csv.current(), Some(Ok("x,y".to_string())));
        assert_eq!(datasets.get("mem://a").and_then(|d| d.get("text/csv")).map(|v| v.cost), Some(0));
    }

    #[test]
    fn test_converters() {
        let config = RegistryConfig::from_str(
            r#"
            [[resolve.extensions]]
            extension = ".csv"
            mime_type = "text/csv"

            [[resolve.extensions]]
            extension = ".tsv"
            mime_type = "text/csv"
        "#,
        )
        .unwrap();

        // two resolvers, one shared text converter
        assert_eq!(config.converters().len(), 3);
        assert_eq!(RegistryConfig::default().converters().len(), 8);
    }
}
