//! Embedded-side modal delegation.
//!
//! Inside an iframe the booking app cannot show a full-screen dialog
//! reliably, so modal steps are handed to the host page. At top level the
//! app renders them itself; that is a capability fallback, not an error.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use stayframe_proto::{Message, ModalKind};

/// Whether the booking document runs inside a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Embedding {
    /// `window.self === window.top`.
    TopLevel,
    /// Inside some frame.
    Framed,
}

impl Embedding {
    /// Detect embedding from a `self === top` probe.
    ///
    /// A probe that fails (cross-origin access to `window.top` throws) means
    /// the document is framed.
    pub fn detect<F, Err>(self_is_top: F) -> Self
    where
        F: FnOnce() -> Result<bool, Err>,
    {
        match self_is_top() {
            Ok(true) => Self::TopLevel,
            Ok(false) | Err(_) => Self::Framed,
        }
    }

    /// Returns true inside a frame.
    pub const fn is_framed(self) -> bool {
        matches!(self, Self::Framed)
    }
}

/// How a modal step is shown.
#[derive(Debug, Clone, PartialEq)]
pub enum Presentation {
    /// Post this to the host and do not render locally.
    Delegated(Message),
    /// Render locally; nothing is posted.
    Local,
}

/// Decides where modal steps are rendered.
#[derive(Debug, Clone, Copy)]
pub struct ModalDelegate {
    embedding: Embedding,
}

impl ModalDelegate {
    /// Create a delegate for the detected embedding.
    pub const fn new(embedding: Embedding) -> Self {
        Self { embedding }
    }

    /// Detected embedding.
    pub const fn embedding(&self) -> Embedding {
        self.embedding
    }

    /// Present the modal step `kind` with its display payload.
    pub fn present(&self, kind: ModalKind, payload: Value) -> Presentation {
        if self.embedding.is_framed() {
            Presentation::Delegated(Message::OpenModal { kind, payload })
        } else {
            tracing::debug!("Not embedded, rendering {:?} step locally", kind);
            Presentation::Local
        }
    }

    /// Ask the host to close its modal, if modals are delegated at all.
    pub fn dismiss(&self) -> Option<Message> {
        self.embedding.is_framed().then_some(Message::CloseModal)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn cross_origin_probe_failure_means_framed() {
        assert_eq!(Embedding::detect(|| Err::<bool, _>("SecurityError")), Embedding::Framed);
        assert_eq!(Embedding::detect(|| Ok::<_, ()>(false)), Embedding::Framed);
        assert_eq!(Embedding::detect(|| Ok::<_, ()>(true)), Embedding::TopLevel);
    }

    #[test]
    fn framed_delegates() {
        let delegate = ModalDelegate::new(Embedding::Framed);
        let payload = json!({"studioName": "Loft 3"});
        assert_eq!(
            delegate.present(ModalKind::Guest, payload.clone()),
            Presentation::Delegated(Message::OpenModal { kind: ModalKind::Guest, payload })
        );
        assert_eq!(delegate.dismiss(), Some(Message::CloseModal));
    }

    #[test]
    fn top_level_renders_locally() {
        let delegate = ModalDelegate::new(Embedding::TopLevel);
        assert_eq!(delegate.present(ModalKind::Guest, json!({})), Presentation::Local);
        assert_eq!(delegate.dismiss(), None);
    }
}
