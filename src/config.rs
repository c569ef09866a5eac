//! Engine-access configuration with TOML file support.
//!
//! The globe engine authenticates tile and terrain fetches with an access
//! token. The token is deliberately an explicit value threaded into
//! provisioning rather than process-wide state assigned at load time, so a
//! controller can only ever use the credential it was handed.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::GlobeViewError;

/// Environment variable consulted by [`EngineConfig::from_env`].
pub const ACCESS_TOKEN_ENV: &str = "GLOBEVIEW_ACCESS_TOKEN";

/// Engine access credential and asset selection. Uses `#[serde(default)]`
/// so a partial TOML file (e.g. only the token) works correctly.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct EngineConfig {
    /// Access token for the engine's asset service.
    pub access_token: String,
    /// Asset id of the world terrain set.
    pub terrain_asset: u32,
    /// Asset id of the buildings overlay tileset.
    pub buildings_asset: u32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            access_token: String::new(),
            terrain_asset: 1,
            buildings_asset: 96188,
        }
    }
}

impl EngineConfig {
    /// Load config from a TOML file. Missing fields use defaults.
    pub fn load(path: &Path) -> Result<Self, GlobeViewError> {
        let content =
            std::fs::read_to_string(path).map_err(GlobeViewError::Io)?;
        toml::from_str(&content)
            .map_err(|e| GlobeViewError::ConfigParse(e.to_string()))
    }

    /// Save config to a TOML file (pretty-printed).
    pub fn save(&self, path: &Path) -> Result<(), GlobeViewError> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| GlobeViewError::ConfigParse(e.to_string()))?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(GlobeViewError::Io)?;
        }
        std::fs::write(path, content).map_err(GlobeViewError::Io)
    }

    /// Build a config from the environment, defaults for everything else.
    ///
    /// # Errors
    ///
    /// [`GlobeViewError::MissingAccessToken`] when the variable is unset or
    /// empty.
    pub fn from_env() -> Result<Self, GlobeViewError> {
        let token = std::env::var(ACCESS_TOKEN_ENV)
            .ok()
            .filter(|t| !t.is_empty())
            .ok_or(GlobeViewError::MissingAccessToken)?;
        Ok(Self {
            access_token: token,
            ..Self::default()
        })
    }

    /// Reject configs without a credential before provisioning starts.
    pub fn validate(&self) -> Result<(), GlobeViewError> {
        if self.access_token.is_empty() {
            return Err(GlobeViewError::MissingAccessToken);
        }
        Ok(())
    }
}
