//! Origin allow-lists.
//!
//! Every receiver carries one. An empty list allows nothing.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::TransportError;

/// Set of origins a receiver accepts messages from.
///
/// Entries are stored in their normalised ASCII serialisation
/// (`scheme://host[:port]`, default ports elided), so an entry written as
/// `https://Studios.Example:443/book` allows `https://studios.example`.
/// Candidates are browser-reported origins and must match an entry exactly:
/// no path, no padding, no explicit default port. Opaque origins (`null`,
/// `file:` and friends) never match.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<String>", into = "Vec<String>")]
pub struct OriginAllowList {
    origins: BTreeSet<String>,
}

impl OriginAllowList {
    /// Build an allow-list, rejecting entries that are not tuple origins.
    pub fn new<I, S>(origins: I) -> Result<Self, TransportError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let origins = origins
            .into_iter()
            .map(|origin| {
                let origin = origin.as_ref();
                normalize(origin)
                    .ok_or_else(|| TransportError::InvalidOrigin { origin: origin.to_string() })
            })
            .collect::<Result<BTreeSet<_>, _>>()?;

        Ok(Self { origins })
    }

    /// Returns true if messages from `origin` may be processed.
    pub fn allows(&self, origin: &str) -> bool {
        self.origins.contains(origin)
    }

    /// Returns true if nothing is allowed.
    pub fn is_empty(&self) -> bool {
        self.origins.is_empty()
    }

    /// Number of allowed origins.
    pub fn len(&self) -> usize {
        self.origins.len()
    }

    /// Allowed origins in normalised form.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.origins.iter().map(String::as_str)
    }
}

impl TryFrom<Vec<String>> for OriginAllowList {
    type Error = TransportError;

    fn try_from(origins: Vec<String>) -> Result<Self, Self::Error> {
        Self::new(origins)
    }
}

impl From<OriginAllowList> for Vec<String> {
    fn from(list: OriginAllowList) -> Self {
        list.origins.into_iter().collect()
    }
}

fn normalize(origin: &str) -> Option<String> {
    let url = Url::parse(origin.trim()).ok()?;
    let origin = url.origin();
    origin.is_tuple().then(|| origin.ascii_serialization())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    #[test]
    fn empty_list_allows_nothing() {
        let list = OriginAllowList::default();
        assert!(list.is_empty());
        assert!(!list.allows("https://studios.example"));
    }

    #[test]
    fn normalises_case_port_and_path() {
        let list = OriginAllowList::new(["https://Studios.Example:443/book?x=1"]).unwrap();

        assert!(list.allows("https://studios.example"));
        assert!(!list.allows("http://studios.example"));
        assert!(!list.allows("https://studios.example:8443"));
    }

    #[test]
    fn candidates_must_be_exact_origins() {
        let list = OriginAllowList::new(["https://book.stayframe.io"]).unwrap();

        assert!(list.allows("https://book.stayframe.io"));
        assert!(!list.allows("https://book.stayframe.io/anything"));
        assert!(!list.allows("https://book.stayframe.io/"));
        assert!(!list.allows(" https://book.stayframe.io "));
        assert!(!list.allows("https://BOOK.stayframe.io"));
        assert!(!list.allows("https://book.stayframe.io:443"));
    }

    #[test]
    fn opaque_origins_never_match() {
        let list = OriginAllowList::new(["https://studios.example"]).unwrap();
        assert!(!list.allows("null"));
        assert!(!list.allows("file:///tmp/page.html"));
    }

    #[test]
    fn rejects_invalid_entries() {
        let err = OriginAllowList::new(["not a url"]).unwrap_err();
        assert_eq!(err, TransportError::InvalidOrigin { origin: "not a url".to_string() });
    }

    #[test]
    fn deserializes_from_string_list() {
        let list: OriginAllowList =
            serde_json::from_str(r#"["https://a.example", "https://b.example"]"#).unwrap();
        assert_eq!(list.len(), 2);
        assert_eq!(list.iter().collect::<Vec<_>>(), vec!["https://a.example", "https://b.example"]);
    }

    proptest! {
        #[test]
        fn prop_allows_never_panics(origin in ".{0,64}") {
            let list = OriginAllowList::new(["https://studios.example"]).unwrap();
            let _ = list.allows(&origin);
        }

        #[test]
        fn prop_subdomains_do_not_match(label in "[a-z]{1,12}") {
            let list = OriginAllowList::new(["https://studios.example"]).unwrap();
            let candidate = format!("https://{label}.studios.example");
            prop_assert!(!list.allows(&candidate));
        }
    }
}
