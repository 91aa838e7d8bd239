//! dynaql configuration.

use std::env;

use serde::{Deserialize, Serialize};

/// How decoding treats descriptor attributes the schema does not declare.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DecodeMode {
    /// Undeclared attributes are a `PathNotFound` error.
    #[default]
    Strict,
    /// Undeclared attributes are skipped with a warning.
    Lenient,
}

/// Table-level configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DynaqlConfig {
    /// Name of the physical table operations target.
    pub table_name: String,
    /// Decoding strictness for responses.
    pub decode_mode: DecodeMode,
}

impl DynaqlConfig {
    /// Create configuration from environment variables.
    #[must_use]
    pub fn from_env() -> Self {
        let strict = env_bool("DYNAQL_STRICT_DECODE", true);
        Self {
            table_name: env::var("DYNAQL_TABLE_NAME").unwrap_or_else(|_| "main".to_owned()),
            decode_mode: if strict {
                DecodeMode::Strict
            } else {
                DecodeMode::Lenient
            },
        }
    }
}

impl Default for DynaqlConfig {
    fn default() -> Self {
        Self {
            table_name: "main".to_owned(),
            decode_mode: DecodeMode::Strict,
        }
    }
}

fn env_bool(key: &str, default: bool) -> bool {
    env::var(key).map_or(default, |v| {
        matches!(v.as_str(), "1" | "true" | "yes" | "TRUE" | "YES")
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_should_default_to_strict_main_table() {
        let config = DynaqlConfig::default();
        assert_eq!(config.table_name, "main");
        assert_eq!(config.decode_mode, DecodeMode::Strict);
    }

    #[test]
    fn test_should_treat_missing_env_as_default() {
        assert!(env_bool("DYNAQL_TEST_SURELY_UNSET_VARIABLE", true));
        assert!(!env_bool("DYNAQL_TEST_SURELY_UNSET_VARIABLE", false));
    }

    #[test]
    fn test_should_deserialize_decode_mode() {
        let mode: DecodeMode = serde_json::from_str(r#""lenient""#).unwrap();
        assert_eq!(mode, DecodeMode::Lenient);
    }
}
