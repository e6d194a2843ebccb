//! Recorded host page traces.
//!
//! A trace is the input side of one host page session: the binding
//! configuration, the viewport width at attach time and every event the
//! page delivered, stamped with milliseconds since attach.
//!
//! ```json
//! {
//!   "viewportWidth": 1280,
//!   "events": [
//!     {"atMs": 0, "event": "frame-loaded"},
//!     {"atMs": 40, "event": "message", "origin": "https://book.stayframe.io",
//!      "data": {"type": "iframe-height", "height": 900, "source": "iframe-message"}}
//!   ]
//! }
//! ```
//!
//! Timer ticks are not recorded. The replay derives them from the binding's
//! own deadlines.

use std::path::Path;

use serde::Deserialize;
use serde_json::Value;
use stayframe_host::{HostConfig, HostEvent, ModalAction, ModalUiEvent};
use stayframe_proto::GuestDetails;

use crate::CliError;

/// Viewport width assumed when a trace does not record one.
pub const DEFAULT_VIEWPORT_WIDTH: u32 = 1280;

/// One recorded host page session.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Trace {
    /// Binding configuration. Missing fields take their defaults.
    #[serde(default)]
    pub config: HostConfig,

    /// Viewport width when the binding attached.
    #[serde(default = "default_viewport_width")]
    pub viewport_width: u32,

    /// Events in time order.
    #[serde(default)]
    pub events: Vec<TraceEntry>,
}

const fn default_viewport_width() -> u32 {
    DEFAULT_VIEWPORT_WIDTH
}

/// A recorded event and when it happened.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TraceEntry {
    /// Milliseconds since the binding attached.
    pub at_ms: u64,

    /// What happened.
    #[serde(flatten)]
    pub event: RecordedEvent,
}

/// Host page inputs a trace can record.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "event", rename_all = "kebab-case")]
pub enum RecordedEvent {
    /// Iframe `load`.
    FrameLoaded,
    /// Iframe `error`.
    FrameError {
        /// Browser-provided description.
        #[serde(default)]
        reason: String,
    },
    /// `message` event on the host window.
    Message {
        /// `event.origin`.
        origin: String,
        /// `event.data`.
        #[serde(default)]
        data: Value,
    },
    /// Host window `resize`.
    Viewport {
        /// New width in CSS pixels.
        width: u32,
    },
    /// Click or submit on a modal element.
    Modal {
        /// The element's `data-action`.
        action: String,
        /// Guest form values for `submit-guest`.
        #[serde(default)]
        form: Option<GuestDetails>,
    },
    /// `keydown` on the host document.
    Key {
        /// `event.key`.
        key: String,
    },
    /// Retry control of the load error fallback.
    RetryLoad,
    /// `updateHeight` on the control object.
    UpdateHeight {
        /// Requested height.
        height: f64,
    },
    /// `requestHeight` on the control object.
    RequestHeight,
    /// `reload` on the control object.
    Reload,
    /// `setDebugMode` on the control object.
    Debug {
        /// Overlay on or off.
        enabled: bool,
    },
    /// `resetStability` on the control object.
    ResetStability,
}

impl RecordedEvent {
    /// The host modal event for a `Modal` entry.
    ///
    /// Returns `Ok(None)` for every other kind of entry.
    pub fn modal_event(&self, index: usize) -> Result<Option<ModalUiEvent>, CliError> {
        let Self::Modal { action, form } = self else {
            return Ok(None);
        };
        let event = match ModalAction::parse(action) {
            Some(ModalAction::SubmitGuest) => {
                ModalUiEvent::SubmitGuest(form.clone().unwrap_or_default())
            },
            Some(ModalAction::Back) => ModalUiEvent::Back,
            Some(ModalAction::MakeAnotherBooking) => ModalUiEvent::MakeAnotherBooking,
            Some(ModalAction::Close) => ModalUiEvent::CloseButton,
            Some(ModalAction::Backdrop) => ModalUiEvent::BackdropClick,
            None => {
                return Err(CliError::UnknownModalAction { index, action: action.clone() });
            },
        };
        Ok(Some(event))
    }

    /// The binding event for entries that map onto [`HostEvent`].
    ///
    /// Key presses and control object calls have no `HostEvent` and return
    /// `Ok(None)`.
    pub fn host_event(&self, index: usize) -> Result<Option<HostEvent>, CliError> {
        let event = match self {
            Self::FrameLoaded => HostEvent::FrameLoaded,
            Self::FrameError { reason } => HostEvent::FrameLoadFailed { reason: reason.clone() },
            Self::Message { origin, data } => {
                HostEvent::Inbound { origin: origin.clone(), data: data.clone() }
            },
            Self::Viewport { width } => HostEvent::ViewportResized { width: *width },
            Self::Modal { .. } => match self.modal_event(index)? {
                Some(event) => HostEvent::Modal(event),
                None => return Ok(None),
            },
            Self::RetryLoad => HostEvent::RetryLoad,
            Self::Key { .. }
            | Self::UpdateHeight { .. }
            | Self::RequestHeight
            | Self::Reload
            | Self::Debug { .. }
            | Self::ResetStability => return Ok(None),
        };
        Ok(Some(event))
    }
}

impl Trace {
    /// Parse and validate a trace.
    pub fn from_json(raw: &str) -> Result<Self, CliError> {
        let trace: Self = serde_json::from_str(raw)?;
        trace.validate()?;
        Ok(trace)
    }

    /// Read, parse and validate a trace file.
    pub fn load(path: &Path) -> Result<Self, CliError> {
        let raw = std::fs::read_to_string(path)
            .map_err(|source| CliError::ReadTrace { path: path.to_path_buf(), source })?;
        Self::from_json(&raw)
    }

    /// Check time order and modal action names.
    pub fn validate(&self) -> Result<(), CliError> {
        let mut previous_ms = 0;
        for (index, entry) in self.events.iter().enumerate() {
            if entry.at_ms < previous_ms {
                return Err(CliError::OutOfOrder { index, at_ms: entry.at_ms, previous_ms });
            }
            previous_ms = entry.at_ms;
            entry.event.modal_event(index)?;
        }
        Ok(())
    }

    /// Time of the last recorded event.
    pub fn duration_ms(&self) -> u64 {
        self.events.last().map_or(0, |e| e.at_ms)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn minimal_trace_takes_defaults() {
        let trace = Trace::from_json("{}").unwrap();
        assert_eq!(trace.config, HostConfig::default());
        assert_eq!(trace.viewport_width, DEFAULT_VIEWPORT_WIDTH);
        assert!(trace.events.is_empty());
        assert_eq!(trace.duration_ms(), 0);
    }

    #[test]
    fn parses_every_event_kind() {
        let raw = json!({
            "config": {"debug": true},
            "viewportWidth": 375,
            "events": [
                {"atMs": 0, "event": "frame-loaded"},
                {"atMs": 1, "event": "frame-error", "reason": "net::ERR_FAILED"},
                {"atMs": 2, "event": "message", "origin": "https://book.stayframe.io",
                 "data": {"type": "CLOSE_MODAL"}},
                {"atMs": 3, "event": "viewport", "width": 800},
                {"atMs": 4, "event": "modal", "action": "submit-guest",
                 "form": {"firstName": "Ada", "lastName": "Lovelace",
                          "email": "ada@example.com", "phone": "1"}},
                {"atMs": 5, "event": "key", "key": "Escape"},
                {"atMs": 6, "event": "retry-load"},
                {"atMs": 7, "event": "update-height", "height": 1200.5},
                {"atMs": 8, "event": "request-height"},
                {"atMs": 9, "event": "reload"},
                {"atMs": 10, "event": "debug", "enabled": false},
                {"atMs": 11, "event": "reset-stability"}
            ]
        });
        let trace = Trace::from_json(&raw.to_string()).unwrap();

        assert!(trace.config.debug);
        assert_eq!(trace.viewport_width, 375);
        assert_eq!(trace.events.len(), 12);
        assert_eq!(trace.duration_ms(), 11);
        assert_eq!(trace.events[3].event, RecordedEvent::Viewport { width: 800 });

        let submit = trace.events[4].event.host_event(4).unwrap();
        assert!(matches!(
            submit,
            Some(HostEvent::Modal(ModalUiEvent::SubmitGuest(ref g))) if g.first_name == "Ada"
        ));
        assert_eq!(trace.events[5].event.host_event(5).unwrap(), None);
    }

    #[test]
    fn out_of_order_events_are_rejected() {
        let raw = json!({"events": [
            {"atMs": 40, "event": "frame-loaded"},
            {"atMs": 10, "event": "reload"}
        ]});
        let err = Trace::from_json(&raw.to_string()).unwrap_err();
        assert!(matches!(err, CliError::OutOfOrder { index: 1, at_ms: 10, previous_ms: 40 }));
    }

    #[test]
    fn unknown_modal_action_is_rejected() {
        let raw = json!({"events": [{"atMs": 0, "event": "modal", "action": "pay-now"}]});
        let err = Trace::from_json(&raw.to_string()).unwrap_err();
        assert!(matches!(err, CliError::UnknownModalAction { index: 0, ref action } if action == "pay-now"));
        assert!(err.is_trace_error());
    }

    #[test]
    fn unknown_event_kind_is_a_parse_error() {
        let raw = json!({"events": [{"atMs": 0, "event": "scroll"}]});
        let err = Trace::from_json(&raw.to_string()).unwrap_err();
        assert!(matches!(err, CliError::ParseTrace(_)));
    }
}
