//! Configuration validation with range checks.

use crate::error::ConfigError;

use super::Config;

impl Config {
    /// Validate configuration values are within acceptable ranges.
    pub(crate) fn validate(&self) -> Result<(), ConfigError> {
        if self.hierarchy.max_depth == 0 {
            return Err(ConfigError::ValidationError(
                "hierarchy.max_depth must be > 0".into(),
            ));
        }
        if self.hierarchy.wikidata_max_depth == 0 {
            return Err(ConfigError::ValidationError(
                "hierarchy.wikidata_max_depth must be > 0".into(),
            ));
        }
        if self.hierarchy.request_timeout_ms == 0 {
            return Err(ConfigError::ValidationError(
                "hierarchy.request_timeout_ms must be > 0".into(),
            ));
        }
        if self.eval.max_tokens == 0 {
            return Err(ConfigError::ValidationError(
                "eval.max_tokens must be > 0".into(),
            ));
        }
        if self.eval.temperature < 0.0 || self.eval.temperature > 2.0 {
            return Err(ConfigError::ValidationError(
                "eval.temperature must be between 0.0 and 2.0".into(),
            ));
        }
        if self.eval.llm_timeout_ms == 0 {
            return Err(ConfigError::ValidationError(
                "eval.llm_timeout_ms must be > 0".into(),
            ));
        }
        if self.output.format != "json" && self.output.format != "jsonl" {
            return Err(ConfigError::ValidationError(
                "output.format must be \"json\" or \"jsonl\"".into(),
            ));
        }
        Ok(())
    }
}
