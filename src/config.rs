//! # Configuration
//!
//! Settings resolve in a fixed override order: built-in defaults → config
//! file → CLI flags. Config lives at `~/.parley/config.toml`; a missing file
//! just means defaults.

use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::PathBuf;

// ============================================================================
// Config structs (all fields Option<T> for sparse TOML)
// ============================================================================

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct ParleyConfig {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub models: Vec<ModelEntry>,
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct GeneralConfig {
    pub default_model: Option<String>,
}

/// One selectable model. The catalog is an externally defined enumeration;
/// this UI only carries identifiers around.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ModelEntry {
    pub name: String,
    pub description: Option<String>,
}

// ============================================================================
// Defaults
// ============================================================================

/// Built-in catalog used when the config file defines no `[[models]]`.
/// The first entry is the designated default.
pub fn builtin_models() -> Vec<ModelEntry> {
    let entry = |name: &str, description: &str| ModelEntry {
        name: name.to_string(),
        description: Some(description.to_string()),
    };
    vec![
        entry("gpt-4o-mini", "fast, inexpensive"),
        entry("gpt-4o", "general purpose"),
        entry("o4-mini", "reasoning"),
        entry("claude-sonnet-4", "long context"),
    ]
}

// ============================================================================
// Resolved config (concrete values, no Options)
// ============================================================================

#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub default_model: String,
    pub models: Vec<ModelEntry>,
}

// ============================================================================
// Error type
// ============================================================================

#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(toml::de::Error),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "config I/O error: {e}"),
            ConfigError::Parse(e) => write!(f, "config parse error: {e}"),
        }
    }
}

impl std::error::Error for ConfigError {}

// ============================================================================
// Loading
// ============================================================================

fn config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".parley").join("config.toml"))
}

/// Loads the config file, falling back to defaults when absent.
pub fn load() -> Result<ParleyConfig, ConfigError> {
    let Some(path) = config_path() else {
        debug!("no home directory; using default config");
        return Ok(ParleyConfig::default());
    };
    if !path.exists() {
        debug!("no config file at {}; using defaults", path.display());
        return Ok(ParleyConfig::default());
    }
    let raw = fs::read_to_string(&path).map_err(ConfigError::Io)?;
    toml::from_str(&raw).map_err(ConfigError::Parse)
}

/// Applies the override order and produces concrete values.
///
/// An unknown `--model` or `default_model` is kept as-is (the transport is
/// the authority on valid identifiers) but logged, and appended to the
/// catalog so the picker can show it.
pub fn resolve(config: ParleyConfig, cli_model: Option<String>) -> ResolvedConfig {
    let mut models = if config.models.is_empty() {
        builtin_models()
    } else {
        config.models
    };

    let default_model = cli_model
        .or(config.general.default_model)
        .unwrap_or_else(|| models[0].name.clone());

    if !models.iter().any(|m| m.name == default_model) {
        warn!("model {default_model:?} not in catalog; adding it");
        models.push(ModelEntry {
            name: default_model.clone(),
            description: None,
        });
    }

    ResolvedConfig {
        default_model,
        models,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_pick_first_builtin_model() {
        let resolved = resolve(ParleyConfig::default(), None);
        assert_eq!(resolved.default_model, builtin_models()[0].name);
        assert_eq!(resolved.models, builtin_models());
    }

    #[test]
    fn cli_flag_overrides_config_file() {
        let config = ParleyConfig {
            general: GeneralConfig {
                default_model: Some("gpt-4o".into()),
            },
            models: Vec::new(),
        };
        let resolved = resolve(config, Some("o4-mini".into()));
        assert_eq!(resolved.default_model, "o4-mini");
    }

    #[test]
    fn config_file_default_used_when_no_flag() {
        let config = ParleyConfig {
            general: GeneralConfig {
                default_model: Some("gpt-4o".into()),
            },
            models: Vec::new(),
        };
        let resolved = resolve(config, None);
        assert_eq!(resolved.default_model, "gpt-4o");
    }

    #[test]
    fn unknown_model_appended_to_catalog() {
        let resolved = resolve(ParleyConfig::default(), Some("my-local-model".into()));
        assert!(
            resolved
                .models
                .iter()
                .any(|m| m.name == "my-local-model" && m.description.is_none())
        );
    }

    #[test]
    fn file_models_replace_builtin_catalog() {
        let config = ParleyConfig {
            general: GeneralConfig::default(),
            models: vec![ModelEntry {
                name: "llama-3.3-70b".into(),
                description: None,
            }],
        };
        let resolved = resolve(config, None);
        assert_eq!(resolved.models.len(), 1);
        assert_eq!(resolved.default_model, "llama-3.3-70b");
    }

    #[test]
    fn sparse_toml_parses() {
        let config: ParleyConfig = toml::from_str(
            r#"
            [general]
            default_model = "gpt-4o"

            [[models]]
            name = "gpt-4o"
            description = "general purpose"
            "#,
        )
        .unwrap();
        assert_eq!(config.general.default_model.as_deref(), Some("gpt-4o"));
        assert_eq!(config.models.len(), 1);
    }
}
