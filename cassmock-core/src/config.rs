use crate::{Error, Result};

/// Default marker identifying driver liveness probes (`SELECT ... FROM system.local`)
pub const DEFAULT_LIVENESS_PROBE_MARKER: &str = "system.local";

/// Default upper bound on statement length, in characters
pub const DEFAULT_MAX_STATEMENT_LENGTH: usize = 8192;

/// Session configuration for statement translation and validation
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Statements containing this text (case-insensitive) are answered
    /// without touching the engine
    pub liveness_probe_marker: String,

    /// Maximum statement length in characters
    pub max_statement_length: usize,

    /// Let `ALLOW FILTERING` relax the key-predicate rules for SELECT
    pub honor_allow_filtering: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            liveness_probe_marker: DEFAULT_LIVENESS_PROBE_MARKER.to_string(),
            max_statement_length: DEFAULT_MAX_STATEMENT_LENGTH,
            honor_allow_filtering: true,
        }
    }
}

impl SessionConfig {
    /// Create a new configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the liveness probe marker
    pub fn with_liveness_probe_marker(mut self, marker: impl Into<String>) -> Self {
        self.liveness_probe_marker = marker.into();
        self
    }

    /// Set maximum statement length
    pub fn with_max_statement_length(mut self, len: usize) -> Self {
        self.max_statement_length = len;
        self
    }

    /// Treat `ALLOW FILTERING` as a plain no-op instead of relaxing validation
    pub fn ignore_allow_filtering(mut self) -> Self {
        self.honor_allow_filtering = false;
        self
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        if self.max_statement_length == 0 {
            return Err(Error::InvalidArgument(
                "max_statement_length must be greater than 0".into(),
            ));
        }

        if self.liveness_probe_marker.trim().is_empty() {
            return Err(Error::InvalidArgument(
                "liveness_probe_marker must not be empty".into(),
            ));
        }

        Ok(())
    }

    /// Check whether a raw statement is a liveness probe
    pub fn is_liveness_probe(&self, statement: &str) -> bool {
        statement
            .to_ascii_lowercase()
            .contains(&self.liveness_probe_marker.to_ascii_lowercase())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = SessionConfig::default();
        assert_eq!(config.liveness_probe_marker, "system.local");
        assert_eq!(config.max_statement_length, 8192);
        assert!(config.honor_allow_filtering);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_builder_pattern() {
        let config = SessionConfig::new()
            .with_liveness_probe_marker("system.peers")
            .with_max_statement_length(100)
            .ignore_allow_filtering();

        assert_eq!(config.liveness_probe_marker, "system.peers");
        assert_eq!(config.max_statement_length, 100);
        assert!(!config.honor_allow_filtering);
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        assert!(SessionConfig::new().with_max_statement_length(0).validate().is_err());
        assert!(SessionConfig::new().with_liveness_probe_marker("  ").validate().is_err());
    }

    #[test]
    fn test_liveness_probe_is_case_insensitive() {
        let config = SessionConfig::default();
        assert!(config.is_liveness_probe("SELECT release_version FROM system.local"));
        assert!(config.is_liveness_probe("select * from SYSTEM.LOCAL"));
        assert!(!config.is_liveness_probe("SELECT * FROM users"));
    }
}
