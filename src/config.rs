//! Settings for a live synchronization session, loaded from JSON.

use std::{fs, path::Path};

use serde::{Deserialize, Serialize};

use crate::{error::ConfigError, scene::TreeOptions};

pub const DEFAULT_UPDATE_LIMIT: usize = 100;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields, rename_all = "camelCase")]
pub struct SyncSettings {
    /// URL of the full document the viewer loaded. Every update document
    /// addresses it.
    pub target_href: String,

    /// Maximum number of instructions emitted per cycle. `None` removes the
    /// limit.
    pub update_limit: Option<usize>,

    /// Whether emitted markup is indented.
    pub pretty: bool,

    pub control: ControlSettings,

    pub tree: TreeOptions,
}

impl Default for SyncSettings {
    fn default() -> Self {
        SyncSettings {
            target_href: String::new(),
            update_limit: Some(DEFAULT_UPDATE_LIMIT),
            pretty: true,
            control: ControlSettings::default(),
            tree: TreeOptions::default(),
        }
    }
}

impl SyncSettings {
    pub fn new(target_href: impl Into<String>) -> Self {
        SyncSettings {
            target_href: target_href.into(),
            ..Default::default()
        }
    }

    pub fn from_slice(contents: &[u8], path: &Path) -> Result<Self, ConfigError> {
        serde_json::from_slice(contents).map_err(|source| ConfigError::Json {
            source,
            path: path.to_owned(),
        })
    }

    /// Loads settings from exactly the given file.
    pub fn load_exact(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read(path).map_err(|source| ConfigError::Io {
            source,
            path: path.to_owned(),
        })?;

        let settings = SyncSettings::from_slice(&contents, path)?;
        log::debug!("Loaded sync settings from {}", path.display());

        Ok(settings)
    }
}

/// Values sent to the viewer with every update to steer its polling.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields, rename_all = "camelCase")]
pub struct ControlSettings {
    /// Minimum seconds between fetches.
    pub min_refresh_period: Option<f64>,

    /// Seconds after which the viewer stops refreshing.
    pub max_session_length: Option<f64>,

    pub cookie: Option<String>,
    pub message: Option<String>,
    pub link_name: Option<String>,
    pub link_description: Option<String>,
    pub link_snippet: Option<String>,
    pub link_snippet_max_lines: Option<u32>,
    pub expires: Option<String>,
}
