//! `[stream]` section configuration.

use crate::stream::ErrorPolicy;
use educe::Educe;
use serde::{Deserialize, Serialize};

/// `[stream]` section in dataregistry.toml - cached value behaviour.
///
/// # Example
/// ```toml
/// [stream]
/// error = "retry"   # re-run a failed producer for the next observer
/// ```
#[derive(Debug, Clone, Educe, Serialize, Deserialize)]
#[educe(Default)]
#[serde(deny_unknown_fields)]
pub struct StreamSection {
    /// `terminal` (default) keeps a producer error for every later observer;
    /// `retry` restarts the producer on the next subscription.
    #[serde(default)]
    pub error: ErrorPolicy,
}

#[cfg(test)]
mod tests {
    use super::super::RegistryConfig;
    use crate::stream::ErrorPolicy;

    #[test]
    fn test_stream_section() {
        let config: RegistryConfig = toml::from_str("[stream]\nerror = \"retry\"").unwrap();
        assert_eq!(config.stream.error, ErrorPolicy::Retry);

        let config: RegistryConfig = toml::from_str("[stream]").unwrap();
        assert_eq!(config.stream.error, ErrorPolicy::Terminal);
    }

    #[test]
    fn test_unknown_field_rejection() {
        let result: Result<RegistryConfig, _> = toml::from_str("[stream]\nretries = 3");
        assert!(result.is_err());
    }
}
