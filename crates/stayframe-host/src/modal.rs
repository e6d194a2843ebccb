//! Host-side modal delegation.
//!
//! The embedded app cannot draw outside its iframe, so it asks the host to
//! render booking steps as page-level modals. While a modal is open the
//! host owns its visibility; the embedded app only learns how it ended.
//!
//! At most one modal is open. Opening another replaces the current one
//! without notifying the embedded app. User dismissal (backdrop, Escape or
//! the close button) sends `MODAL_CLOSED` exactly once; completing a step
//! sends that step's message instead.

use serde_json::Value;
use stayframe_proto::{BookingSummary, Message, ModalKind};

use crate::{
    action::{HostAction, ModalUiEvent},
    view::ModalView,
};

/// Key value that dismisses the modal.
pub const ESCAPE_KEY: &str = "Escape";

/// Modal state for one embedded iframe.
#[derive(Debug, Default)]
pub struct ModalHost {
    open: Option<ModalKind>,
}

impl ModalHost {
    /// Create a host with no modal open.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true if a modal is open.
    pub fn is_open(&self) -> bool {
        self.open.is_some()
    }

    /// Step of the open modal.
    pub fn current(&self) -> Option<ModalKind> {
        self.open
    }

    /// Open the modal for `kind`, replacing any open one.
    pub fn open(&mut self, kind: ModalKind, payload: &Value) -> Vec<HostAction> {
        let mut actions = Vec::new();
        if let Some(previous) = self.open.take() {
            tracing::debug!("Replacing open {:?} modal with {:?}", previous, kind);
            actions.push(HostAction::RemoveModal);
        }

        let summary = BookingSummary::from_payload(payload);
        let view = ModalView::build(kind, &summary);
        self.open = Some(kind);

        actions.push(HostAction::ShowModal { kind, view });
        actions
    }

    /// The embedded app asked for the modal to close.
    ///
    /// Not a user dismissal, so `MODAL_CLOSED` is not echoed back.
    pub fn close_requested(&mut self) -> Vec<HostAction> {
        match self.open.take() {
            Some(_) => vec![HostAction::RemoveModal],
            None => Vec::new(),
        }
    }

    /// A key was pressed while the host page had focus.
    pub fn key_down(&mut self, key: &str) -> Vec<HostAction> {
        if key == ESCAPE_KEY { self.handle(ModalUiEvent::Escape) } else { Vec::new() }
    }

    /// User interaction with the open modal.
    pub fn handle(&mut self, event: ModalUiEvent) -> Vec<HostAction> {
        let Some(kind) = self.open else {
            tracing::debug!("Modal event {:?} with no modal open", event);
            return Vec::new();
        };

        let message = match (kind, event) {
            (ModalKind::Guest, ModalUiEvent::SubmitGuest(details)) => {
                Message::GuestDetailsSubmitted(details)
            },
            (ModalKind::Payment, ModalUiEvent::Back) => Message::GoBackToGuestDetails,
            (ModalKind::Confirmation, ModalUiEvent::MakeAnotherBooking) => {
                Message::MakeAnotherBooking
            },
            (_, event) if event.is_dismissal() => Message::ModalClosed,
            (kind, event) => {
                tracing::debug!("Modal event {:?} does not apply to {:?} modal", event, kind);
                return Vec::new();
            },
        };

        self.open = None;
        vec![HostAction::RemoveModal, HostAction::PostToFrame { message }]
    }
}
