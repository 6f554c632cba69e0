//! `[registry]` section configuration.

use super::defaults;
use crate::registry::StalePolicy;
use educe::Educe;
use serde::{Deserialize, Serialize};

/// `[registry]` section in dataregistry.toml - memoization behaviour.
///
/// # Example
/// ```toml
/// [registry]
/// stale = "invalidate"   # drop resolved datasets when converters change
/// verbose = true         # log every resolution
/// ```
#[derive(Debug, Clone, Educe, Serialize, Deserialize)]
#[educe(Default)]
#[serde(deny_unknown_fields)]
pub struct RegistrySection {
    /// What happens to resolved datasets when the converter set changes.
    /// - `keep` (default): resolved URLs keep their dataset
    /// - `invalidate`: every resolved dataset is dropped
    #[serde(default)]
    pub stale: StalePolicy,

    /// Log every resolution and opened view.
    #[serde(default = "defaults::r#false")]
    #[educe(Default = defaults::r#false())]
    pub verbose: bool,
}

#[cfg(test)]
mod tests {
    use super::super::RegistryConfig;
    use crate::registry::StalePolicy;

    #[test]
    fn test_registry_section() {
        let config: RegistryConfig = toml::from_str(
            r#"
            [registry]
            stale = "invalidate"
            verbose = true
        "#,
        )
        .unwrap();
        assert_eq!(config.registry.stale, StalePolicy::Invalidate);
        assert!(config.registry.verbose);
    }

    #[test]
    fn test_registry_section_defaults() {
        let config: RegistryConfig = toml::from_str("").unwrap();
        assert_eq!(config.registry.stale, StalePolicy::Keep);
        assert!(!config.registry.verbose);
    }

    #[test]
    fn test_unknown_stale_policy_rejected() {
        let result: Result<RegistryConfig, _> = toml::from_str("[registry]\nstale = \"sometimes\"");
        assert!(result.is_err());
    }
}
