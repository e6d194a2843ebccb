//! Host page configuration.
//!
//! Passed as JSON from the embed snippet. Height policy is fixed and has no
//! configuration knobs here.

use serde::{Deserialize, Serialize};
use stayframe_proto::OriginAllowList;

use crate::{
    error::BindingError,
    resize::DEFAULT_LOAD_ERROR_MESSAGE,
    target::{FrameTarget, Selector, fallback_selectors},
};

/// Production origins the booking app is served from.
pub const DEFAULT_ALLOWED_ORIGINS: [&str; 2] =
    ["https://book.stayframe.io", "https://widget.stayframe.io"];

/// Hosting domains used for the `src` fallback selectors.
pub const DEFAULT_HOSTING_DOMAINS: [&str; 2] = ["book.stayframe.io", "widget.stayframe.io"];

/// Configuration of one host binding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct HostConfig {
    /// Origins inbound messages are accepted from.
    pub allowed_origins: Vec<String>,

    /// Explicitly registered iframe element id.
    pub frame_id: Option<String>,

    /// Domains the booking app is hosted on.
    pub hosting_domains: Vec<String>,

    /// Overrides the default fallback selector list.
    pub fallback_selectors: Option<Vec<Selector>>,

    /// Start with the debug overlay on.
    pub debug: bool,

    /// Message shown when the iframe fails to load.
    pub load_error_message: String,
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            allowed_origins: DEFAULT_ALLOWED_ORIGINS.iter().map(ToString::to_string).collect(),
            frame_id: None,
            hosting_domains: DEFAULT_HOSTING_DOMAINS.iter().map(ToString::to_string).collect(),
            fallback_selectors: None,
            debug: false,
            load_error_message: DEFAULT_LOAD_ERROR_MESSAGE.to_string(),
        }
    }
}

impl HostConfig {
    /// Parse from JSON. Missing fields take their defaults.
    pub fn from_json(raw: &str) -> Result<Self, BindingError> {
        Ok(serde_json::from_str(raw)?)
    }

    /// Normalised origin allow-list.
    ///
    /// An empty list is accepted but rejects every message.
    pub fn allow_list(&self) -> Result<OriginAllowList, BindingError> {
        let allowed = OriginAllowList::new(&self.allowed_origins)?;
        if allowed.is_empty() {
            tracing::warn!("Empty origin allow-list: every inbound message will be dropped");
        }
        Ok(allowed)
    }

    /// How the binding locates its iframe.
    pub fn target(&self) -> FrameTarget {
        if let Some(id) = self.frame_id.as_ref().filter(|id| !id.is_empty()) {
            return FrameTarget::Registered(id.clone());
        }

        match &self.fallback_selectors {
            Some(selectors) => FrameTarget::Fallback(selectors.clone()),
            None => FrameTarget::Fallback(fallback_selectors(&self.hosting_domains)),
        }
    }
}
