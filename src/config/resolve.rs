//! `[resolve]` section configuration.
//!
//! Controls the resolution engine and which file extensions are recognised.

use super::defaults;
use educe::Educe;
use serde::{Deserialize, Serialize};

/// `[resolve]` section in dataregistry.toml.
///
/// # Example
/// ```toml
/// [resolve]
/// max_steps = 500
///
/// [[resolve.extensions]]
/// extension = ".tsv"
/// mime_type = "text/tab-separated-values"
/// ```
///
/// Listing extensions replaces the built-in list.
#[derive(Debug, Clone, Educe, Serialize, Deserialize)]
#[educe(Default)]
#[serde(deny_unknown_fields)]
pub struct ResolveSection {
    /// Converter calls allowed while resolving one URL, `0` for no limit.
    #[serde(default = "defaults::resolve::max_steps")]
    #[educe(Default = defaults::resolve::max_steps())]
    pub max_steps: usize,

    /// File extensions mapped to the mimetype of their content.
    #[serde(default = "defaults::resolve::extensions")]
    #[educe(Default = defaults::resolve::extensions())]
    pub extensions: Vec<ExtensionEntry>,
}

/// One `[[resolve.extensions]]` entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ExtensionEntry {
    /// Path suffix, including the dot (e.g. `".csv"`).
    pub extension: String,
    pub mime_type: String,
}
