//! Locating the iframe a binding talks to.
//!
//! Host pages should register the iframe explicitly by element id. Pages
//! that predate registration are served by a fallback scan over an ordered
//! selector list; the first match wins.

use serde::{Deserialize, Serialize};

/// Element ids the fallback scan tries after the hosting domains.
pub const DEFAULT_FRAME_IDS: [&str; 2] = ["stayframe-booking", "booking-widget"];

/// Class names the fallback scan tries after the ids.
pub const DEFAULT_FRAME_CLASSES: [&str; 2] = ["stayframe-iframe", "booking-iframe"];

/// One way of finding the iframe element.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "by", content = "value", rename_all = "camelCase")]
pub enum Selector {
    /// Element tag name.
    Tag(String),
    /// An `iframe` whose `src` contains this substring.
    SrcContains(String),
    /// Element id.
    Id(String),
    /// Class name.
    Class(String),
}

impl Selector {
    /// Equivalent CSS selector.
    pub fn css(&self) -> String {
        match self {
            Self::Tag(tag) => tag.clone(),
            Self::SrcContains(needle) => format!("iframe[src*=\"{}\"]", css_string(needle)),
            Self::Id(id) => format!("#{}", css_ident(id)),
            Self::Class(class) => format!(".{}", css_ident(class)),
        }
    }
}

fn css_string(raw: &str) -> String {
    raw.replace('\\', "\\\\").replace('"', "\\\"")
}

fn css_ident(raw: &str) -> String {
    raw.chars()
        .flat_map(|c| {
            let escaped = !(c.is_ascii_alphanumeric() || c == '-' || c == '_');
            escaped.then_some('\\').into_iter().chain(std::iter::once(c))
        })
        .collect()
}

/// Default fallback list for the given hosting domains.
///
/// Order: `src` substring per hosting domain, then known ids, then known
/// classes.
pub fn fallback_selectors<S: AsRef<str>>(hosting_domains: &[S]) -> Vec<Selector> {
    hosting_domains
        .iter()
        .map(|d| Selector::SrcContains(d.as_ref().to_string()))
        .chain(DEFAULT_FRAME_IDS.iter().map(|id| Selector::Id((*id).to_string())))
        .chain(DEFAULT_FRAME_CLASSES.iter().map(|c| Selector::Class((*c).to_string())))
        .collect()
}

/// Something that can find elements on the host page.
pub trait FrameLookup {
    /// Handle to a found element.
    type Handle;

    /// First element matching `selector`.
    fn query(&self, selector: &Selector) -> Option<Self::Handle>;
}

/// How a binding finds its iframe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FrameTarget {
    /// Explicitly registered element id.
    Registered(String),
    /// Ordered fallback scan.
    Fallback(Vec<Selector>),
}

impl FrameTarget {
    /// Selectors tried in order.
    pub fn selectors(&self) -> Vec<Selector> {
        match self {
            Self::Registered(id) => vec![Selector::Id(id.clone())],
            Self::Fallback(selectors) => selectors.clone(),
        }
    }

    /// Find the iframe. A miss is logged and returns `None`.
    pub fn resolve<L: FrameLookup>(&self, lookup: &L) -> Option<L::Handle> {
        let found = match self {
            Self::Registered(id) => lookup.query(&Selector::Id(id.clone())),
            Self::Fallback(selectors) => selectors.iter().find_map(|s| lookup.query(s)),
        };

        if found.is_none() {
            tracing::warn!("Booking frame not found ({:?})", self);
        }
        found
    }
}
