//! Configuration loading from disk.

use std::fs;
use std::path::Path;

use crate::config::schema::VaultConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Environment variable naming the config file when no path is given.
pub const CONFIG_PATH_ENV_VAR: &str = "TIMELOCK_VAULT_CONFIG";

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

/// Parse and validate configuration from TOML text.
pub fn parse_config(content: &str) -> Result<VaultConfig, ConfigError> {
    let config: VaultConfig = toml::from_str(content).map_err(ConfigError::Parse)?;
    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

/// Load and validate configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<VaultConfig, ConfigError> {
    let content = fs::read_to_string(path).map_err(ConfigError::Io)?;
    parse_config(&content)
}

/// Load from `path`, else from `TIMELOCK_VAULT_CONFIG`, else validated defaults.
pub fn load_or_default(path: Option<&Path>) -> Result<VaultConfig, ConfigError> {
    if let Some(path) = path {
        return load_config(path);
    }
    match std::env::var(CONFIG_PATH_ENV_VAR) {
        Ok(env_path) if !env_path.is_empty() => load_config(Path::new(&env_path)),
        _ => {
            let config = VaultConfig::default();
            validate_config(&config).map_err(ConfigError::Validation)?;
            Ok(config)
        }
    }
}
