//! Configuration layer (§10.3): built-in defaults, optionally overridden by a JSON config file,
//! in turn overridden by explicit CLI flags. This module only covers the first two layers; CLI
//! overrides are applied by `main.rs`.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::cache::DEFAULT_PAGE_SIZE;
use crate::error::DiacError;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub dictionary_path: PathBuf,
    pub offset_index_path: PathBuf,
    pub model_path: PathBuf,
    pub page_size: usize,
    pub silent: bool,
    pub conflict: bool,
    pub memory: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            dictionary_path: PathBuf::from("dict.txt"),
            offset_index_path: PathBuf::from("model.offsets"),
            model_path: PathBuf::from("model.bin"),
            page_size: DEFAULT_PAGE_SIZE,
            silent: false,
            conflict: false,
            memory: false,
        }
    }
}

impl Config {
    /// Loads a config file, falling back to built-in defaults for any field the file omits.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, DiacError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|source| DiacError::InvalidOption(format!(
            "cannot read config file {}: {source}",
            path.display()
        )))?;
        serde_json::from_str(&contents).map_err(|source| {
            DiacError::InvalidOption(format!("malformed config file {}: {source}", path.display()))
        })
    }
}
