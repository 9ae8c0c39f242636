//! Configuration loading from disk and environment.

use std::fs;
use std::path::Path;

use crate::config::schema::PanelConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Environment variable overriding the control-plane base URL.
pub const CONTROL_PLANE_URL_ENV: &str = "PROXY_PANEL_CONTROL_PLANE_URL";

/// Error type for configuration loading.
#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(toml::de::Error),
    Validation(Vec<ValidationError>),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "IO error: {}", e),
            ConfigError::Parse(e) => write!(f, "Parse error: {}", e),
            ConfigError::Validation(errors) => {
                write!(f, "Validation failed: ")?;
                for (i, err) in errors.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", err)?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for ConfigError {}

/// Load and validate configuration from a TOML file.
///
/// The control-plane base URL may be overridden via the
/// `PROXY_PANEL_CONTROL_PLANE_URL` environment variable, after file parsing
/// and before validation.
pub fn load_config(path: &Path) -> Result<PanelConfig, ConfigError> {
    let content = fs::read_to_string(path).map_err(ConfigError::Io)?;
    let config: PanelConfig = toml::from_str(&content).map_err(ConfigError::Parse)?;
    let config = apply_env_overrides(config);

    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

/// Load from a file when one is given, otherwise start from defaults. Env
/// overrides and validation apply either way.
pub fn load_or_default(path: Option<&Path>) -> Result<PanelConfig, ConfigError> {
    match path {
        Some(p) => load_config(p),
        None => {
            let config = apply_env_overrides(PanelConfig::default());
            validate_config(&config).map_err(ConfigError::Validation)?;
            Ok(config)
        }
    }
}

fn apply_env_overrides(mut config: PanelConfig) -> PanelConfig {
    if let Ok(url) = std::env::var(CONTROL_PLANE_URL_ENV) {
        if !url.trim().is_empty() {
            config.control_plane.base_url = url;
        }
    }
    config
}
