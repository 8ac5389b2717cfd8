//! Runtime configuration for the command-line front-end.
//!
//! Sources, highest precedence first: environment overrides, an explicit
//! config file, `$RSASIG_CONFIG`, `./rsasig.toml`, built-in defaults.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::hasher::DEFAULT_CHUNK_SIZE;
use crate::keys::KeySize;

pub const CONFIG_ENV: &str = "RSASIG_CONFIG";
pub const DEFAULT_CONFIG_FILE: &str = "rsasig.toml";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Key size used by `keygen` when none is given
    pub key_size: KeySize,
    /// Read size when hashing files
    pub hash_chunk_size: usize,
    pub keys_dir: PathBuf,
    pub signatures_dir: PathBuf,
    pub temp_dir: PathBuf,
    /// Creator label written into signature records
    pub creator: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            key_size: KeySize::default(),
            hash_chunk_size: DEFAULT_CHUNK_SIZE,
            keys_dir: PathBuf::from("keys"),
            signatures_dir: PathBuf::from("signatures"),
            temp_dir: PathBuf::from("temp"),
            creator: String::new(),
        }
    }
}

impl Config {
    /// Parse a TOML document; missing fields keep their defaults.
    pub fn from_toml_str(s: &str) -> Result<Self> {
        let config: Config = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    /// Read a TOML config file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        Self::from_toml_str(&text)
    }

    /// Resolve the effective configuration.
    ///
    /// `explicit` must exist if given; the other file locations are optional.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let mut config = match explicit {
            Some(path) => Self::from_file(path)?,
            None => Self::discover()?,
        };
        config.apply_env(|name| std::env::var(name).ok())?;
        config.validate()?;
        Ok(config)
    }

    fn discover() -> Result<Self> {
        let mut candidates = Vec::new();
        if let Ok(p) = std::env::var(CONFIG_ENV) {
            candidates.push(PathBuf::from(p));
        }
        candidates.push(PathBuf::from(DEFAULT_CONFIG_FILE));

        for path in candidates {
            if path.is_file() {
                log::debug!("loading config from {}", path.display());
                return Self::from_file(&path);
            }
        }
        Ok(Self::default())
    }

    /// Apply `RSASIG_*` overrides looked up through `lookup`.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(bits) = lookup("RSASIG_KEY_SIZE") {
            let bits: u32 = bits
                .trim()
                .parse()
                .map_err(|_| Error::Config(format!("RSASIG_KEY_SIZE is not a number: {}", bits)))?;
            self.key_size =
                KeySize::try_from(bits).map_err(|e| Error::Config(e.to_string()))?;
        }
        if let Some(dir) = lookup("RSASIG_KEYS_DIR") {
            self.keys_dir = PathBuf::from(dir);
        }
        if let Some(dir) = lookup("RSASIG_SIGNATURES_DIR") {
            self.signatures_dir = PathBuf::from(dir);
        }
        if let Some(creator) = lookup("RSASIG_CREATOR") {
            self.creator = creator;
        }
        Ok(())
    }

    fn validate(&self) -> Result<()> {
        if self.hash_chunk_size == 0 {
            return Err(Error::Config("hash_chunk_size must be greater than zero".to_string()));
        }
        Ok(())
    }
}
