//! Query parameters the embedded app reads at load.
//!
//! The host builds the iframe `src` with these; the embedded app parses them
//! back to pre-seed its search form. Dates stay opaque strings.

use serde::{Deserialize, Serialize};
use url::Url;

const STUDIO: &str = "studio";
const CHECK_IN: &str = "checkIn";
const CHECK_OUT: &str = "checkOut";

/// Pre-seeded search parameters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EmbedParams {
    /// Inventory identifier of the studio.
    pub studio: Option<String>,
    /// Check-in date.
    pub check_in: Option<String>,
    /// Check-out date.
    pub check_out: Option<String>,
}

impl EmbedParams {
    /// Read the parameters from a URL's query string.
    ///
    /// Empty values count as absent. When a name repeats, the first wins.
    pub fn from_url(url: &Url) -> Self {
        let mut params = Self::default();
        for (name, value) in url.query_pairs() {
            if value.is_empty() {
                continue;
            }
            let slot = match &*name {
                STUDIO => &mut params.studio,
                CHECK_IN => &mut params.check_in,
                CHECK_OUT => &mut params.check_out,
                _ => continue,
            };
            if slot.is_none() {
                *slot = Some(value.into_owned());
            }
        }
        params
    }

    /// Write the parameters into `url`, replacing any previous values.
    pub fn apply_to(&self, url: &mut Url) {
        let kept: Vec<(String, String)> = url
            .query_pairs()
            .filter(|(name, _)| ![STUDIO, CHECK_IN, CHECK_OUT].contains(&&**name))
            .map(|(name, value)| (name.into_owned(), value.into_owned()))
            .collect();

        let fields =
            [(STUDIO, &self.studio), (CHECK_IN, &self.check_in), (CHECK_OUT, &self.check_out)];

        if kept.is_empty() && fields.iter().all(|(_, value)| value.is_none()) {
            url.set_query(None);
            return;
        }

        let mut query = url.query_pairs_mut();
        query.clear();
        for (name, value) in &kept {
            query.append_pair(name, value);
        }
        for (name, value) in fields {
            if let Some(value) = value {
                query.append_pair(name, value);
            }
        }
    }

    /// Returns true if no parameter is set.
    pub fn is_empty(&self) -> bool {
        self.studio.is_none() && self.check_in.is_none() && self.check_out.is_none()
    }
}
