//! Default values for configuration fields.
//!
//! These functions are used by serde for default deserialization.

// ============================================================================
// Common Defaults
// ============================================================================

pub fn r#false() -> bool {
    false
}

// ============================================================================
// [resolve] Section Defaults
// ============================================================================

pub mod resolve {
    use super::super::ExtensionEntry;

    pub fn max_steps() -> usize {
        10_000
    }

    pub fn extensions() -> Vec<ExtensionEntry> {
        [
            (".csv", "text/csv"),
            (".json", "application/json"),
            (".md", "text/markdown"),
            (".txt", "text/plain"),
        ]
        .into_iter()
        .map(|(extension, mime_type)| ExtensionEntry {
            extension: extension.into(),
            mime_type: mime_type.into(),
        })
        .collect()
    }
}
