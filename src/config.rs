//! Model-layer configuration.
//!
//! Precedence: environment > config file > defaults.

use crate::errors::DbError;
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const DEFAULT_COLLECTION_PREFIX: &str = "rocketchat_";
pub const DEFAULT_TRASH_COLLECTION: &str = "rocketchat__trash";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ModelsConfig {
    /// Prepended to every logical model name to form the collection name.
    pub collection_prefix: String,
    /// Collection receiving copies of removed records.
    pub trash_collection: String,
    /// Copy removed records into `trash_collection`.
    pub track_trash: bool,
}

impl Default for ModelsConfig {
    fn default() -> Self {
        Self {
            collection_prefix: DEFAULT_COLLECTION_PREFIX.to_string(),
            trash_collection: DEFAULT_TRASH_COLLECTION.to_string(),
            track_trash: true,
        }
    }
}

impl ModelsConfig {
    /// # Errors
    /// Returns `Config` if the TOML is malformed or has unknown keys.
    pub fn from_toml_str(s: &str) -> Result<Self, DbError> {
        Ok(toml::from_str(s)?)
    }

    /// Loads `path` when given and present, then applies environment overrides:
    /// `CHATMODELS_COLLECTION_PREFIX`, `CHATMODELS_TRASH_COLLECTION`,
    /// `CHATMODELS_TRACK_TRASH`.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or parsed, or an override
    /// is not a valid boolean.
    pub fn load(path: Option<&Path>) -> Result<Self, DbError> {
        let mut cfg = match path {
            Some(p) if p.exists() => {
                let cfg = Self::from_toml_str(&std::fs::read_to_string(p)?)?;
                log::debug!("loaded models config from {}", p.display());
                cfg
            }
            _ => Self::default(),
        };
        cfg.apply_overrides(|k| std::env::var(k).ok())?;
        Ok(cfg)
    }

    /// Applies overrides from `lookup` (the environment, in production).
    ///
    /// # Errors
    /// Returns `Config` if `CHATMODELS_TRACK_TRASH` is not a boolean.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<(), DbError> {
        if let Some(p) = lookup("CHATMODELS_COLLECTION_PREFIX") {
            self.collection_prefix = p;
        }
        if let Some(t) = lookup("CHATMODELS_TRASH_COLLECTION") {
            self.trash_collection = t;
        }
        if let Some(v) = lookup("CHATMODELS_TRACK_TRASH") {
            self.track_trash = match v.to_ascii_lowercase().as_str() {
                "1" | "true" | "yes" => true,
                "0" | "false" | "no" => false,
                other => return Err(DbError::Config(format!("CHATMODELS_TRACK_TRASH: not a boolean: {other}"))),
            };
        }
        Ok(())
    }

    /// Physical collection name for a logical model name.
    #[must_use]
    pub fn collection_name(&self, name: &str) -> String {
        format!("{}{name}", self.collection_prefix)
    }
}
