//! User configuration
//!
//! Read from `<config_home>/notas/config.toml` when present. Every key is
//! optional; a missing file means defaults.
//!
//! ```toml
//! extractors = ["futures", "direct", "basic"]
//! extra_futures = ["ETH", "BIT"]
//! fix_unscaled_prices = false
//! unscaled_price_threshold = "10000"
//! output_dir = "/home/me/planilhas"
//! ```

use anyhow::{Context, Result};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::error::NoteError;
use crate::extractors::DEFAULT_ORDER;

const CONFIG_DIR: &str = "notas";
const CONFIG_FILENAME: &str = "config.toml";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Extractor cascade order, by name
    pub extractors: Vec<String>,
    /// Futures product prefixes added to the built-in list
    pub extra_futures: Vec<String>,
    /// Divide prices above `unscaled_price_threshold` by 100
    pub fix_unscaled_prices: bool,
    pub unscaled_price_threshold: Decimal,
    /// Directory for generated workbooks instead of the input's directory
    pub output_dir: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            extractors: DEFAULT_ORDER.iter().map(|s| s.to_string()).collect(),
            extra_futures: Vec::new(),
            fix_unscaled_prices: false,
            unscaled_price_threshold: Decimal::from(10_000),
            output_dir: None,
        }
    }
}

/// Default location of the config file, if the platform has a config dir
pub fn default_config_path() -> Option<PathBuf> {
    dir_spec::config_home().map(|dir| dir.join(CONFIG_DIR).join(CONFIG_FILENAME))
}

impl Config {
    /// Load configuration.
    ///
    /// An explicit path must exist; the default path is optional.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        match explicit {
            Some(path) => Self::from_file(path),
            None => match default_config_path() {
                Some(path) if path.exists() => Self::from_file(&path),
                _ => {
                    debug!("No config file found, using defaults");
                    Ok(Self::default())
                }
            },
        }
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config = Self::from_toml(&raw)
            .with_context(|| format!("Invalid config file {}", path.display()))?;
        info!("Loaded config from {}", path.display());
        Ok(config)
    }

    pub fn from_toml(raw: &str) -> Result<Self> {
        let config: Config =
            toml::from_str(raw).map_err(|e| NoteError::Config(e.message().to_string()))?;
        if config.extractors.is_empty() {
            return Err(NoteError::Config("extractor list cannot be empty".to_string()).into());
        }
        Ok(config)
    }

    /// Extra futures prefixes, upper-cased and trimmed
    pub fn futures_products(&self) -> Vec<String> {
        self.extra_futures
            .iter()
            .map(|p| p.trim().to_uppercase())
            .filter(|p| !p.is_empty())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use std::io::Write;

    #[test]
    fn test_empty_toml_gives_defaults() {
        let config = Config::from_toml("").unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.extractors, vec!["futures", "direct", "basic"]);
        assert!(!config.fix_unscaled_prices);
    }

    #[test]
    fn test_partial_toml_overrides() {
        let config = Config::from_toml(
            r#"
            extractors = ["direct", "futures"]
            extra_futures = [" eth ", ""]
            fix_unscaled_prices = true
            unscaled_price_threshold = "50000"
            "#,
        )
        .unwrap();
        assert_eq!(config.extractors, vec!["direct", "futures"]);
        assert_eq!(config.futures_products(), vec!["ETH"]);
        assert!(config.fix_unscaled_prices);
        assert_eq!(config.unscaled_price_threshold, dec!(50000));
    }

    #[test]
    fn test_unknown_key_is_rejected() {
        let err = Config::from_toml("extractor = [\"direct\"]").unwrap_err();
        assert!(err.to_string().contains("config error"));
    }

    #[test]
    fn test_empty_extractor_list_is_rejected() {
        assert!(Config::from_toml("extractors = []").is_err());
    }

    #[test]
    fn test_load_explicit_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "output_dir = \"/tmp/planilhas\"").unwrap();
        let config = Config::load(Some(file.path())).unwrap();
        assert_eq!(config.output_dir, Some(PathBuf::from("/tmp/planilhas")));
    }

    #[test]
    fn test_load_missing_explicit_file_fails() {
        assert!(Config::load(Some(Path::new("/nonexistent/notas.toml"))).is_err());
    }
}
