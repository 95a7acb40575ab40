//! Desk configuration, read from `config.toml`.
//!
//! ```toml
//! database = ".revdesk/reviews.db"
//! log_level = "info"
//! log_json = false
//!
//! [[sections]]
//! name = "SECURITY"
//! role = "actionable"
//! headings = ["Security", "Security Check"]
//! ```
//!
//! Every key is optional. `[[sections]]` rows are layered over the built-in
//! vocabulary: a listed name takes the configured role (and headings, when given),
//! unlisted names keep their built-in row. CODE_QUALITY, PERFORMANCE,
//! BEST_PRACTICES, EXPLANATION and ORIGINAL_CODE cannot be made actionable.

use std::path::{Path, PathBuf};

use revdesk_core::{SectionSpec, SectionVocabulary};
use serde::Deserialize;

use crate::error::{DeskError, DeskResult};

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct DeskConfig {
    /// SQLite file holding reviews and feedback.
    pub database: PathBuf,
    pub log_level: String,
    pub log_json: bool,
    /// Rows layered over the built-in section vocabulary.
    pub sections: Option<Vec<SectionSpec>>,
}

impl Default for DeskConfig {
    fn default() -> Self {
        Self {
            database: PathBuf::from(".revdesk").join("reviews.db"),
            log_level: "info".to_owned(),
            log_json: false,
            sections: None,
        }
    }
}

impl DeskConfig {
    /// Returns the path to the revdesk config file.
    ///
    /// Prefers `$XDG_CONFIG_HOME/revdesk/config.toml`; falls back to
    /// `~/.config/revdesk/config.toml` when the env var is absent.
    pub fn config_path() -> PathBuf {
        let base = std::env::var("XDG_CONFIG_HOME")
            .ok()
            .map(PathBuf::from)
            .or_else(|| {
                std::env::var("HOME")
                    .ok()
                    .map(|h| PathBuf::from(h).join(".config"))
            })
            .unwrap_or_else(|| PathBuf::from(".config"));
        base.join("revdesk").join("config.toml")
    }

    /// Loads the config from [`Self::config_path`].
    ///
    /// # Errors
    ///
    /// A missing file is not an error (defaults are returned). Returns
    /// `DeskError::Config` if the file exists but cannot be read or parsed.
    pub fn load() -> DeskResult<Self> {
        Self::load_from(&Self::config_path())
    }

    /// Loads the config from `path`; see [`Self::load`].
    ///
    /// # Errors
    ///
    /// Returns `DeskError::Config` if the file exists but cannot be read or parsed.
    pub fn load_from(path: &Path) -> DeskResult<Self> {
        let raw = match std::fs::read_to_string(path) {
            Ok(s) => s,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(e) => {
                return Err(DeskError::Config {
                    path: path.display().to_string(),
                    message: e.to_string(),
                })
            }
        };
        toml::from_str(&raw).map_err(|e| DeskError::Config {
            path: path.display().to_string(),
            message: e.to_string(),
        })
    }

    /// The section vocabulary this config selects.
    ///
    /// # Errors
    ///
    /// Returns `DeskError::Review` if a configured row is invalid or tries to make a
    /// fixed informational section actionable.
    pub fn vocabulary(&self) -> DeskResult<SectionVocabulary> {
        let standard = SectionVocabulary::standard();
        match &self.sections {
            Some(rows) => Ok(standard.with_overrides(rows.clone())?),
            None => Ok(standard),
        }
    }
}
