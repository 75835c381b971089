//! Controller configuration: scope, generation name, and precache manifest.

use serde::{Deserialize, Serialize};
use url::Url;

use scout_common::{Result, ScoutError};

/// Deploy-time configuration for the cache controller.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SwConfig {
    /// Scope all relative paths resolve against.
    pub scope: Url,

    /// Versioned generation name for this deployment.
    pub cache_name: String,

    /// Scope-relative paths guaranteed available offline.
    pub precache: Vec<String>,

    /// Scope-relative path of the offline fallback document. Must be listed
    /// in the precache manifest.
    pub offline_path: String,
}

impl Default for SwConfig {
    fn default() -> Self {
        Self {
            scope: Url::parse("https://scout-tools.example/").expect("static scope URL"),
            cache_name: "scout-tools-v1".to_string(),
            precache: vec![
                "./".to_string(),
                "index.html".to_string(),
                "offline.html".to_string(),
                "assets/css/base.css".to_string(),
                "assets/css/theme-pack.css".to_string(),
                "assets/css/theme-troop.css".to_string(),
                "assets/js/theme.js".to_string(),
                "tools/uniform-inspection-checklist/".to_string(),
                "tools/uniform-inspection-checklist/index.html".to_string(),
                "tools/activity-timer/".to_string(),
                "tools/activity-timer/index.html".to_string(),
            ],
            offline_path: "offline.html".to_string(),
        }
    }
}

impl SwConfig {
    /// Parse a configuration from a JSON document.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| ScoutError::Config {
                message: "invalid controller config".to_string(),
                source: Some(Box::new(e)),
            })?;
        config.validate()?;
        Ok(config)
    }

    /// Check internal consistency.
    pub fn validate(&self) -> Result<()> {
        if self.cache_name.is_empty() {
            return Err(ScoutError::config("cache_name must not be empty"));
        }
        if self.precache.is_empty() {
            return Err(ScoutError::config("precache manifest must not be empty"));
        }
        if !self.precache.contains(&self.offline_path) {
            return Err(ScoutError::config(format!(
                "offline fallback '{}' is not in the precache manifest",
                self.offline_path
            )));
        }
        Ok(())
    }

    /// Resolve a manifest path against the scope.
    pub fn resource_url(&self, path: &str) -> Result<Url> {
        self.scope.join(path).map_err(|e| ScoutError::Config {
            message: format!("invalid precache path '{}'", path),
            source: Some(Box::new(e)),
        })
    }

    /// Absolute URL of the offline fallback document.
    pub fn offline_url(&self) -> Result<Url> {
        self.resource_url(&self.offline_path)
    }
}
