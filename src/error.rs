//! Error types for resolution, registry queries and value streams.
//!
//! - [`RegistryError`]: a resolution pass or a registry query failed
//! - [`StreamError`]: the error signal carried by a value stream
//!
//! `StreamError` is cloneable because a cached stream retains its error and
//! replays it to every observer that attaches afterwards.

use crate::data::{MimeType, Url};
use std::{fmt, sync::Arc};
use thiserror::Error;

/// Resolution and registry errors
#[derive(Debug, Error)]
pub enum RegistryError {
    /// A converter failed; the whole resolution of `url` is aborted.
    #[error("converter failed on `{url}` while expanding `{mime_type}`")]
    Converter {
        url: Url,
        mime_type: MimeType,
        #[source]
        source: anyhow::Error,
    },

    #[error("resolving `{url}` exceeded the limit of {limit} expansion steps")]
    StepLimit { url: Url, limit: usize },

    #[error("no viewer labelled `{label}` for `{url}`")]
    NoViewer { url: Url, label: String },

    #[error("viewer `{label}` failed on `{url}`")]
    View {
        url: Url,
        label: String,
        #[source]
        source: anyhow::Error,
    },
}

/// Error signal of a value stream.
///
/// Only the rendered message is kept, so the error can be shared by any
/// number of observers.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct StreamError {
    message: Arc<str>,
}

impl StreamError {
    pub fn msg(message: impl fmt::Display) -> Self {
        Self {
            message: message.to_string().into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl From<anyhow::Error> for StreamError {
    fn from(err: anyhow::Error) -> Self {
        // Alternate form keeps the whole context chain on one line
        Self::msg(format!("{err:#}"))
    }
}

impl From<std::io::Error> for StreamError {
    fn from(err: std::io::Error) -> Self {
        Self::msg(err)
    }
}
