//! Configuration file support
//!
//! Settings are read from TOML:
//!
//! ```toml
//! [recognizer]
//! language = "eng+deu"
//! tesseract_path = "/usr/local/bin/tesseract"
//! tessdata_dir = "/usr/share/tessdata"
//!
//! [processing]
//! threads = 4
//! max_pages = 200
//! ```
//!
//! Search order: `./page-orient.toml`, then
//! `<config dir>/page-orient/config.toml`, then built-in defaults.
//! Command-line values always win over file values.

use crate::error::{OrientError, Result};
use crate::pipeline::PipelineConfig;
use crate::recognizer::DEFAULT_LANGUAGE;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

/// File name looked up in the working directory
pub const LOCAL_CONFIG_FILE: &str = "page-orient.toml";

/// Application directory under the user config dir
pub const APP_CONFIG_DIR: &str = "page-orient";

/// Recognizer section
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecognizerSection {
    /// Tesseract language selector, e.g. `eng` or `eng+fra`
    pub language: Option<String>,
    pub tesseract_path: Option<PathBuf>,
    pub tessdata_dir: Option<PathBuf>,
}

/// Processing section
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProcessingSection {
    /// Worker threads; CPU count when unset
    pub threads: Option<usize>,
    /// Only classify the first N pages
    pub max_pages: Option<usize>,
}

/// Contents of a configuration file
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub recognizer: RecognizerSection,
    pub processing: ProcessingSection,
}

impl Config {
    /// Load from the default locations, falling back to defaults
    pub fn load() -> Result<Self> {
        for path in Self::search_paths() {
            if path.is_file() {
                debug!(path = %path.display(), "loading config");
                return Self::load_from_path(&path);
            }
        }
        Ok(Self::default())
    }

    /// Locations checked by [`Config::load`], in order
    pub fn search_paths() -> Vec<PathBuf> {
        let mut paths = vec![PathBuf::from(LOCAL_CONFIG_FILE)];
        if let Some(dir) = dirs::config_dir() {
            paths.push(dir.join(APP_CONFIG_DIR).join("config.toml"));
        }
        paths
    }

    /// Load from an explicit file
    pub fn load_from_path(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            OrientError::Config(format!("cannot read {}: {}", path.display(), e))
        })?;
        Self::from_toml(&content).map_err(|e| match e {
            OrientError::Config(msg) => OrientError::Config(format!("{}: {}", path.display(), msg)),
            other => other,
        })
    }

    /// Parse TOML text
    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Config =
            toml::from_str(content).map_err(|e| OrientError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize to TOML text
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| OrientError::Config(e.to_string()))
    }

    fn validate(&self) -> Result<()> {
        if self.processing.threads == Some(0) {
            return Err(OrientError::Config(
                "processing.threads must be at least 1".to_string(),
            ));
        }
        if let Some(lang) = &self.recognizer.language {
            if lang.trim().is_empty() {
                return Err(OrientError::Config(
                    "recognizer.language must not be empty".to_string(),
                ));
            }
        }
        Ok(())
    }

    /// Resolve into pipeline settings; CLI values take precedence
    pub fn merge_with_cli(&self, cli: &CliOverrides) -> PipelineConfig {
        PipelineConfig {
            language: cli
                .language
                .clone()
                .or_else(|| self.recognizer.language.clone())
                .unwrap_or_else(|| DEFAULT_LANGUAGE.to_string()),
            tesseract_path: cli
                .tesseract_path
                .clone()
                .or_else(|| self.recognizer.tesseract_path.clone()),
            tessdata_dir: cli
                .tessdata_dir
                .clone()
                .or_else(|| self.recognizer.tessdata_dir.clone()),
            threads: cli.threads.or(self.processing.threads),
            max_pages: cli.max_pages.or(self.processing.max_pages),
        }
    }
}

/// Values given explicitly on the command line
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CliOverrides {
    pub language: Option<String>,
    pub tesseract_path: Option<PathBuf>,
    pub tessdata_dir: Option<PathBuf>,
    pub threads: Option<usize>,
    pub max_pages: Option<usize>,
}

impl CliOverrides {
    pub fn new() -> Self {
        Self::default()
    }
}
