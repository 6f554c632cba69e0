//! `[[datasets]]` entries: in-memory fixtures registered at startup.

use serde::{Deserialize, Serialize};

/// One `[[datasets]]` entry.
///
/// # Example
/// ```toml
/// [[datasets]]
/// url = "mem://greeting"
/// mime_type = "text/plain; mimeType=text/markdown"
/// value = "# Hello"
/// ```
///
/// The value is registered as a text stream at cost 0.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DatasetEntry {
    pub url: String,
    pub mime_type: String,
    pub value: String,
}
