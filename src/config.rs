use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::document::{ReconstructOptions, ValidationOptions};
use crate::error::{Error, Result};

/// Codec configuration for docx-blocks
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CodecConfig {
    /// DEFLATE level used when writing the rebuilt package
    pub compression_level: i64,

    /// Total width (twips) of tables synthesized without a template
    pub default_table_width: u32,

    /// Pretty-print JSON written by the CLI
    pub pretty_json: bool,

    /// Reject existing tables whose cells moved to another row/column
    pub reject_reordered_cells: bool,
}

impl Default for CodecConfig {
    fn default() -> Self {
        CodecConfig {
            compression_level: 6,
            default_table_width: 9000,
            pretty_json: true,
            reject_reordered_cells: true,
        }
    }
}

impl CodecConfig {
    /// Load configuration from the config directory
    pub fn load() -> Result<Self> {
        if let Some(config_path) = Self::get_config_path() {
            if config_path.exists() {
                return Self::load_from(&config_path);
            }
        }

        // Return defaults if no config found
        Ok(CodecConfig::default())
    }

    /// Load configuration from an explicit file
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| Error::Config(format!("{}: {e}", path.display())))
    }

    /// Save configuration to the config directory
    pub fn save(&self) -> Result<()> {
        if let Some(config_path) = Self::get_config_path() {
            self.save_to(&config_path)?;
        }

        Ok(())
    }

    /// Save configuration to an explicit file
    pub fn save_to(&self, path: &Path) -> Result<()> {
        // Create config directory if it doesn't exist
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self).map_err(|e| Error::Config(e.to_string()))?;
        fs::write(path, content)?;
        Ok(())
    }

    /// Get the path to the config file
    pub fn get_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("docx-blocks").join("config.toml"))
    }

    /// Initialize default config file
    pub fn init_default() -> Result<()> {
        let config = CodecConfig::default();
        config.save()?;
        Ok(())
    }

    pub fn reconstruct_options(&self) -> ReconstructOptions {
        ReconstructOptions {
            compression_level: self.compression_level,
            default_table_width: self.default_table_width,
        }
    }

    pub fn validation_options(&self) -> ValidationOptions {
        ValidationOptions {
            reject_reordered_cells: self.reject_reordered_cells,
        }
    }
}
