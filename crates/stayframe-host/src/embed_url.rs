//! The iframe `src` a host page embeds.

use std::fmt;

use stayframe_proto::EmbedParams;
use url::Url;

use crate::error::BindingError;

/// Booking app URL with pre-seeded search parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmbedUrl {
    base: Url,
    params: EmbedParams,
}

impl EmbedUrl {
    /// Parse the booking app base URL. Only `http` and `https` are accepted.
    ///
    /// Search parameters already present in `base` are kept as defaults.
    pub fn parse(base: &str) -> Result<Self, BindingError> {
        let url = Url::parse(base)
            .map_err(|e| BindingError::EmbedUrl { url: base.to_string(), reason: e.to_string() })?;

        if !matches!(url.scheme(), "http" | "https") {
            return Err(BindingError::EmbedUrl {
                url: base.to_string(),
                reason: format!("unsupported scheme {}", url.scheme()),
            });
        }

        let params = EmbedParams::from_url(&url);
        Ok(Self { base: url, params })
    }

    /// Pre-select a studio.
    #[must_use]
    pub fn with_studio(mut self, studio: impl Into<String>) -> Self {
        self.params.studio = Some(studio.into());
        self
    }

    /// Pre-select stay dates. Dates are passed through as given.
    #[must_use]
    pub fn with_dates(mut self, check_in: impl Into<String>, check_out: impl Into<String>) -> Self {
        self.params.check_in = Some(check_in.into());
        self.params.check_out = Some(check_out.into());
        self
    }

    /// Parameters that will be carried.
    pub fn params(&self) -> &EmbedParams {
        &self.params
    }

    /// Origin of the booking app, for the host's allow-list.
    pub fn origin(&self) -> String {
        self.base.origin().ascii_serialization()
    }

    /// Host of the booking app, for the fallback `src` selector.
    pub fn host(&self) -> Option<&str> {
        self.base.host_str()
    }

    /// Final URL.
    pub fn to_url(&self) -> Url {
        let mut url = self.base.clone();
        self.params.apply_to(&mut url);
        url
    }
}

impl fmt::Display for EmbedUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.to_url().as_str())
    }
}
