//! Desired-state file access.
//!
//! # Storage layout
//!
//! ```text
//! <data_dir>/vdkeeper/
//!   virtual-displays.json   (JSON array of DisplaySpec, written by the controller)
//!   daemon.pid              (owned by vdkeeper-daemon)
//! ```
//!
//! The daemon only ever calls [`ConfigStore::load`], which folds every failure
//! into [`LoadOutcome::Unchanged`]. Tools that want the reason call
//! [`ConfigStore::read`].

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use crate::error::ConfigError;
use crate::types::{DesiredState, DisplaySpec};

pub const APP_DIR: &str = "vdkeeper";
pub const CONFIG_FILE: &str = "virtual-displays.json";

/// `<data_dir>/vdkeeper/`, using `dirs::data_dir()`.
pub fn default_data_dir() -> Result<PathBuf, ConfigError> {
    dirs::data_dir()
        .map(|dir| dir.join(APP_DIR))
        .ok_or(ConfigError::DataDirNotFound)
}

/// `<data_dir>/virtual-displays.json`. Pure, no I/O.
pub fn config_path(data_dir: &Path) -> PathBuf {
    data_dir.join(CONFIG_FILE)
}

/// Result of a tolerant load.
#[derive(Debug, Clone, PartialEq)]
pub enum LoadOutcome {
    Desired(DesiredState),
    /// File absent or unreadable; callers keep their current state.
    Unchanged,
}

/// Reads and writes the desired-state file at a fixed path.
#[derive(Debug, Clone)]
pub struct ConfigStore {
    path: PathBuf,
}

impl ConfigStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the desired state, treating any failure as "no actionable update".
    pub fn load(&self) -> LoadOutcome {
        match self.read() {
            Ok(specs) => LoadOutcome::Desired(DesiredState::from_specs(specs)),
            Err(ConfigError::NotFound { path }) => {
                tracing::debug!(path = %path.display(), "config file absent, keeping current state");
                LoadOutcome::Unchanged
            }
            Err(err) => {
                tracing::warn!(error = %err, "config unreadable, keeping current state");
                LoadOutcome::Unchanged
            }
        }
    }

    /// Strict read of every entry, including those not connected on startup.
    ///
    /// One bad entry fails the whole document.
    pub fn read(&self) -> Result<Vec<DisplaySpec>, ConfigError> {
        let contents = match std::fs::read(&self.path) {
            Ok(contents) => contents,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                return Err(ConfigError::NotFound {
                    path: self.path.clone(),
                })
            }
            Err(source) => {
                return Err(ConfigError::Io {
                    path: self.path.clone(),
                    source,
                })
            }
        };
        let specs: Vec<DisplaySpec> =
            serde_json::from_slice(&contents).map_err(|source| ConfigError::Parse {
                path: self.path.clone(),
                source,
            })?;
        validate(&specs).map_err(|reason| ConfigError::Invalid {
            path: self.path.clone(),
            reason,
        })?;
        Ok(specs)
    }

    /// Atomically replace the file: `.tmp` sibling, then `rename`.
    pub fn save(&self, specs: &[DisplaySpec]) -> Result<(), ConfigError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|source| ConfigError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        let tmp = self.path.with_extension("json.tmp");
        let json = serde_json::to_vec_pretty(specs)?;
        std::fs::write(&tmp, json).map_err(|source| ConfigError::Io {
            path: tmp.clone(),
            source,
        })?;
        if let Err(source) = std::fs::rename(&tmp, &self.path) {
            let _ = std::fs::remove_file(&tmp);
            return Err(ConfigError::Io {
                path: self.path.clone(),
                source,
            });
        }
        Ok(())
    }
}

fn validate(specs: &[DisplaySpec]) -> Result<(), String> {
    let mut seen = HashSet::new();
    for spec in specs {
        if spec.name.0.trim().is_empty() {
            return Err("display name must not be empty".to_string());
        }
        if spec.width == 0 || spec.height == 0 {
            return Err(format!(
                "display '{}' has zero size {}x{}",
                spec.name, spec.width, spec.height
            ));
        }
        if !spec.refresh_rate.is_finite() || spec.refresh_rate <= 0.0 {
            return Err(format!(
                "display '{}' has invalid refresh rate {}",
                spec.name, spec.refresh_rate
            ));
        }
        if !seen.insert(&spec.name) {
            return Err(format!("display name '{}' appears more than once", spec.name));
        }
    }
    Ok(())
}
