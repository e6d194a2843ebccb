//! Embedded app configuration.

use serde::{Deserialize, Serialize};
use stayframe_proto::OriginAllowList;

use crate::error::EmbedError;

/// App id carried in `resize` reports.
pub const DEFAULT_APP_ID: &str = "stayframe-booking";

/// Configuration of the embedded booking app.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EmbedConfig {
    /// Identifier sent as the `source` of `resize` reports.
    pub app_id: String,

    /// Host page origins whose messages are accepted.
    ///
    /// Empty by default: a deployment lists the sites it is embedded on.
    pub allowed_parent_origins: Vec<String>,
}

impl Default for EmbedConfig {
    fn default() -> Self {
        Self { app_id: DEFAULT_APP_ID.to_string(), allowed_parent_origins: Vec::new() }
    }
}

impl EmbedConfig {
    /// Parse from JSON. Missing fields take their defaults.
    pub fn from_json(raw: &str) -> Result<Self, EmbedError> {
        Ok(serde_json::from_str(raw)?)
    }

    /// Normalised allow-list of host page origins.
    pub fn allow_list(&self) -> Result<OriginAllowList, EmbedError> {
        let allowed = OriginAllowList::new(&self.allowed_parent_origins)?;
        if allowed.is_empty() {
            tracing::warn!("No parent origins allowed: host messages will be dropped");
        }
        Ok(allowed)
    }
}
