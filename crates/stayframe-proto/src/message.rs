//! Typed protocol messages.

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::{TransportError, TransportMessage};

/// Where a height report came from.
///
/// `iframe-message`, `initial-load` and `state-change` force the host to
/// apply the update regardless of how small the change is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HeightSource {
    /// Continuous `resize` reports from the embedded reporter.
    #[serde(rename = "postMessage")]
    PostMessage,
    /// Explicit `iframe-height` reply from the embedded app.
    #[serde(rename = "iframe-message")]
    IframeMessage,
    /// First report after the embedded document loaded.
    #[serde(rename = "initial-load")]
    InitialLoad,
    /// Booking flow step change.
    #[serde(rename = "state-change")]
    StateChange,
    /// Host raised the height to a new viewport minimum.
    #[serde(rename = "resize-adjustment")]
    ResizeAdjustment,
    /// Host page integrator called the control surface.
    #[serde(rename = "external-api")]
    ExternalApi,
    /// Report caused by scrolling.
    #[serde(rename = "scroll-related")]
    ScrollRelated,
}

impl HeightSource {
    /// All sources, in wire order.
    pub const ALL: [Self; 7] = [
        Self::PostMessage,
        Self::IframeMessage,
        Self::InitialLoad,
        Self::StateChange,
        Self::ResizeAdjustment,
        Self::ExternalApi,
        Self::ScrollRelated,
    ];

    /// Wire name.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::PostMessage => "postMessage",
            Self::IframeMessage => "iframe-message",
            Self::InitialLoad => "initial-load",
            Self::StateChange => "state-change",
            Self::ResizeAdjustment => "resize-adjustment",
            Self::ExternalApi => "external-api",
            Self::ScrollRelated => "scroll-related",
        }
    }

    /// Parse a wire name.
    pub fn parse(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.as_str() == name)
    }

    /// Returns true if updates from this source skip the significance
    /// threshold.
    pub const fn forces_update(self) -> bool {
        matches!(self, Self::IframeMessage | Self::InitialLoad | Self::StateChange)
    }

    /// Returns true if the embedded document measured this height, as
    /// opposed to the host page deciding it.
    pub const fn is_embedded(self) -> bool {
        !matches!(self, Self::ResizeAdjustment | Self::ExternalApi)
    }
}

impl std::fmt::Display for HeightSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Booking step the embedded app asks the host to render.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ModalKind {
    /// Guest details form.
    Guest,
    /// Payment step.
    Payment,
    /// Booking confirmation.
    Confirmation,
}

impl ModalKind {
    /// Wire type of the matching open request.
    pub const fn open_type(self) -> &'static str {
        match self {
            Self::Guest => OPEN_GUEST_MODAL,
            Self::Payment => OPEN_PAYMENT_MODAL,
            Self::Confirmation => OPEN_CONFIRMATION_MODAL,
        }
    }
}

/// Guest details collected by the host's guest form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GuestDetails {
    /// First name.
    #[serde(default)]
    pub first_name: String,
    /// Last name.
    #[serde(default)]
    pub last_name: String,
    /// Email address.
    #[serde(default)]
    pub email: String,
    /// Phone number.
    #[serde(default)]
    pub phone: String,
}

/// Display fields a modal payload may carry.
///
/// The host only shows these; it never interprets them. Every field is
/// optional and unknown fields are ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BookingSummary {
    /// Studio display name.
    pub studio_name: Option<String>,
    /// Check-in date as formatted by the embedded app.
    pub check_in: Option<String>,
    /// Check-out date as formatted by the embedded app.
    pub check_out: Option<String>,
    /// Number of guests.
    pub guests: Option<u32>,
    /// Formatted total price.
    pub total: Option<String>,
    /// Booking reference, present on confirmation.
    pub booking_reference: Option<String>,
    /// Guest details already entered, used to prefill the guest form.
    pub guest_details: Option<GuestDetails>,
}

impl BookingSummary {
    /// Read the display fields out of an opaque modal payload.
    ///
    /// Fields of the wrong shape are dropped one by one rather than failing
    /// the whole summary.
    pub fn from_payload(payload: &Value) -> Self {
        if let Ok(summary) = serde_json::from_value::<Self>(payload.clone()) {
            return summary;
        }

        let Some(fields) = payload.as_object() else {
            return Self::default();
        };
        let text = |name: &str| fields.get(name).and_then(Value::as_str).map(str::to_string);

        Self {
            studio_name: text("studioName"),
            check_in: text("checkIn"),
            check_out: text("checkOut"),
            guests: fields
                .get("guests")
                .and_then(Value::as_u64)
                .and_then(|g| u32::try_from(g).ok()),
            total: text("total"),
            booking_reference: text("bookingReference"),
            guest_details: fields
                .get("guestDetails")
                .and_then(|g| serde_json::from_value(g.clone()).ok()),
        }
    }
}

/// Payload of `request-height`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestHeight {
    /// Part of the initial post-load request chain.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub is_initial: Option<bool>,
    /// Sent in response to a visibility change.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub is_visible: Option<bool>,
    /// Minimum height the host currently enforces.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub min_height: Option<u32>,
}

/// Payload of `height-updated`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HeightUpdated {
    /// Height applied to the iframe element.
    pub new_height: u32,
    /// Device classification used.
    pub is_mobile: bool,
    /// Host viewport width at the time of the update.
    pub viewport_width: u32,
    /// Minimum height used for the clamp.
    pub min_height: u32,
}

const IFRAME_HEIGHT: &str = "iframe-height";
const REQUEST_HEIGHT: &str = "request-height";
const HEIGHT_UPDATED: &str = "height-updated";
const CONTENT_VISIBILITY_CHANGE: &str = "content-visibility-change";
const WINDOW_RESIZE: &str = "window-resize";
const RESIZE: &str = "resize";
const START_HEIGHT_TRACKING: &str = "startHeightTracking";
const OPEN_GUEST_MODAL: &str = "OPEN_GUEST_MODAL";
const OPEN_PAYMENT_MODAL: &str = "OPEN_PAYMENT_MODAL";
const OPEN_CONFIRMATION_MODAL: &str = "OPEN_CONFIRMATION_MODAL";
const GUEST_DETAILS_SUBMITTED: &str = "GUEST_DETAILS_SUBMITTED";
const GO_BACK_TO_GUEST_DETAILS: &str = "GO_BACK_TO_GUEST_DETAILS";
const MAKE_ANOTHER_BOOKING: &str = "MAKE_ANOTHER_BOOKING";
const CLOSE_MODAL: &str = "CLOSE_MODAL";
const MODAL_CLOSED: &str = "MODAL_CLOSED";

/// Every recognised cross-window message.
#[derive(Debug, Clone, PartialEq)]
pub enum Message {
    /// Embedded -> host: explicit height report.
    IframeHeight {
        /// Reported height, finite and positive.
        height: f64,
        /// Report source, if the sender named a known one.
        source: Option<HeightSource>,
    },

    /// Host -> embedded: please report your height.
    RequestHeight(RequestHeight),

    /// Host -> embedded: confirmation of an applied height.
    HeightUpdated(HeightUpdated),

    /// Embedded -> host: content visibility changed.
    ContentVisibilityChange,

    /// Host -> embedded: the host viewport changed.
    WindowResize {
        /// New minimum height.
        min_height: u32,
    },

    /// Embedded -> host: continuous reporter output.
    Resize {
        /// Measured height, finite and positive.
        height: f64,
        /// Embedded app id.
        app_id: String,
    },

    /// Host -> embedded: start (or restart) height tracking.
    StartHeightTracking,

    /// Embedded -> host: render a step as a host modal.
    OpenModal {
        /// Which step.
        kind: ModalKind,
        /// Step-specific display payload.
        payload: Value,
    },

    /// Host -> embedded: guest form submitted.
    GuestDetailsSubmitted(GuestDetails),

    /// Host -> embedded: back from payment to guest details.
    GoBackToGuestDetails,

    /// Host -> embedded: start over after confirmation.
    MakeAnotherBooking,

    /// Embedded -> host: close the host modal.
    CloseModal,

    /// Host -> embedded: the user dismissed the host modal.
    ModalClosed,
}

impl Message {
    /// Wire type name.
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::IframeHeight { .. } => IFRAME_HEIGHT,
            Self::RequestHeight(_) => REQUEST_HEIGHT,
            Self::HeightUpdated(_) => HEIGHT_UPDATED,
            Self::ContentVisibilityChange => CONTENT_VISIBILITY_CHANGE,
            Self::WindowResize { .. } => WINDOW_RESIZE,
            Self::Resize { .. } => RESIZE,
            Self::StartHeightTracking => START_HEIGHT_TRACKING,
            Self::OpenModal { kind, .. } => kind.open_type(),
            Self::GuestDetailsSubmitted(_) => GUEST_DETAILS_SUBMITTED,
            Self::GoBackToGuestDetails => GO_BACK_TO_GUEST_DETAILS,
            Self::MakeAnotherBooking => MAKE_ANOTHER_BOOKING,
            Self::CloseModal => CLOSE_MODAL,
            Self::ModalClosed => MODAL_CLOSED,
        }
    }

    /// Build the typed message out of a parsed envelope.
    pub fn from_envelope(envelope: &TransportMessage) -> Result<Self, TransportError> {
        let message = match envelope.kind.as_str() {
            IFRAME_HEIGHT => {
                let height = read_height(IFRAME_HEIGHT, envelope)?;
                let source = envelope
                    .source
                    .as_deref()
                    .or_else(|| envelope.field("source").and_then(Value::as_str))
                    .and_then(HeightSource::parse);
                Self::IframeHeight { height, source }
            },
            REQUEST_HEIGHT => Self::RequestHeight(read_payload(REQUEST_HEIGHT, envelope)?),
            HEIGHT_UPDATED => Self::HeightUpdated(read_payload(HEIGHT_UPDATED, envelope)?),
            CONTENT_VISIBILITY_CHANGE => Self::ContentVisibilityChange,
            WINDOW_RESIZE => {
                let min_height = envelope
                    .field("minHeight")
                    .and_then(Value::as_f64)
                    .filter(|h| h.is_finite() && *h >= 0.0)
                    .map(round_px)
                    .ok_or_else(|| TransportError::MalformedPayload {
                        kind: WINDOW_RESIZE,
                        reason: "missing numeric minHeight".to_string(),
                    })?;
                Self::WindowResize { min_height }
            },
            RESIZE => Self::Resize {
                height: read_height(RESIZE, envelope)?,
                app_id: envelope.source.clone().unwrap_or_default(),
            },
            START_HEIGHT_TRACKING => Self::StartHeightTracking,
            OPEN_GUEST_MODAL => open_modal(ModalKind::Guest, envelope),
            OPEN_PAYMENT_MODAL => open_modal(ModalKind::Payment, envelope),
            OPEN_CONFIRMATION_MODAL => open_modal(ModalKind::Confirmation, envelope),
            GUEST_DETAILS_SUBMITTED => {
                Self::GuestDetailsSubmitted(read_payload(GUEST_DETAILS_SUBMITTED, envelope)?)
            },
            GO_BACK_TO_GUEST_DETAILS => Self::GoBackToGuestDetails,
            MAKE_ANOTHER_BOOKING => Self::MakeAnotherBooking,
            CLOSE_MODAL => Self::CloseModal,
            MODAL_CLOSED => Self::ModalClosed,
            other => return Err(TransportError::UnknownType { kind: other.to_string() }),
        };

        Ok(message)
    }

    /// Build the wire envelope for this message.
    pub fn to_envelope(&self) -> TransportMessage {
        let envelope = TransportMessage::new(self.type_name());

        match self {
            Self::IframeHeight { height, source } => {
                let envelope = envelope.with_field("height", json!(height));
                match source {
                    Some(source) => envelope.with_source(source.as_str()),
                    None => envelope,
                }
            },
            Self::RequestHeight(request) => with_fields(envelope, request),
            Self::HeightUpdated(updated) => with_fields(envelope, updated),
            Self::WindowResize { min_height } => {
                envelope.with_field("minHeight", json!(min_height))
            },
            Self::Resize { height, app_id } => {
                envelope.with_field("height", json!(height)).with_source(app_id.clone())
            },
            Self::OpenModal { payload, .. } => envelope.with_data(payload.clone()),
            Self::GuestDetailsSubmitted(details) => {
                envelope.with_data(serde_json::to_value(details).unwrap_or(Value::Null))
            },
            Self::ContentVisibilityChange
            | Self::StartHeightTracking
            | Self::GoBackToGuestDetails
            | Self::MakeAnotherBooking
            | Self::CloseModal
            | Self::ModalClosed => envelope,
        }
    }
}

/// Round a CSS pixel value to whole pixels, saturating at the `u32` range.
fn round_px(value: f64) -> u32 {
    if value <= 0.0 {
        0
    } else if value >= f64::from(u32::MAX) {
        u32::MAX
    } else {
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let px = value.round() as u32;
        px
    }
}

fn read_height(kind: &'static str, envelope: &TransportMessage) -> Result<f64, TransportError> {
    let Some(raw) = envelope.field("height") else {
        return Err(TransportError::MalformedPayload {
            kind,
            reason: "missing height".to_string(),
        });
    };

    match raw.as_f64() {
        Some(height) if height.is_finite() && height > 0.0 => Ok(height),
        _ => Err(TransportError::InvalidHeight { kind, raw: raw.to_string() }),
    }
}

fn read_payload<T: serde::de::DeserializeOwned>(
    kind: &'static str,
    envelope: &TransportMessage,
) -> Result<T, TransportError> {
    serde_json::from_value(Value::Object(envelope.merged_fields()))
        .map_err(|e| TransportError::MalformedPayload { kind, reason: e.to_string() })
}

fn open_modal(kind: ModalKind, envelope: &TransportMessage) -> Message {
    Message::OpenModal { kind, payload: envelope.data.clone().unwrap_or(Value::Null) }
}

fn with_fields<T: Serialize>(envelope: TransportMessage, payload: &T) -> TransportMessage {
    match serde_json::to_value(payload) {
        Ok(Value::Object(fields)) => {
            fields.into_iter().fold(envelope, |env, (name, value)| env.with_field(&name, value))
        },
        _ => envelope,
    }
}
