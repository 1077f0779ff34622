//! Translation settings.

use std::path::Path;

use serde::{Deserialize, Serialize};

/// Knobs for the translator and the batch session.
///
/// Missing keys in a config file fall back to [`Default`]; unknown keys are
/// rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TranslateConfig {
    /// Fold operators over literal operands (and `x == x`) at translation
    /// time.
    pub fold_constants: bool,
    /// Record a divide-by-zero exception condition for `/` and `%` unless the
    /// divisor is a nonzero literal.
    pub track_arithmetic_exceptions: bool,
    /// Run the SIMPLE validator before translating each method.
    pub validate: bool,
    /// Clear the node store between input files so ids restart at 0.
    pub reset_store_per_file: bool,
}

impl Default for TranslateConfig {
    fn default() -> Self {
        TranslateConfig {
            fold_constants: true,
            track_arithmetic_exceptions: true,
            validate: true,
            reset_store_per_file: true,
        }
    }
}

/// Failure to load a config file.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config '{path}': {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

impl TranslateConfig {
    /// Reads a JSON config file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        serde_json::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.display().to_string(),
            source,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_keys_use_defaults() {
        let cfg: TranslateConfig = serde_json::from_str(r#"{"validate": false}"#).unwrap();
        assert!(!cfg.validate);
        assert!(cfg.fold_constants);
        assert!(cfg.track_arithmetic_exceptions);
        assert!(cfg.reset_store_per_file);
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let err = serde_json::from_str::<TranslateConfig>(r#"{"fold": true}"#).unwrap_err();
        assert!(err.to_string().contains("unknown field"));
    }

    #[test]
    fn load_reports_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cfg.json");
        std::fs::write(&path, "{ not json").unwrap();
        let err = TranslateConfig::load(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
        assert!(err.to_string().contains("cfg.json"));

        std::fs::write(&path, r#"{"fold_constants": false}"#).unwrap();
        let cfg = TranslateConfig::load(&path).unwrap();
        assert!(!cfg.fold_constants);
    }
}
