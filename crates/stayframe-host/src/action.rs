//! Events fed into the host binding and actions it produces.

use serde::{Serialize, Serializer};
use serde_json::Value;
use stayframe_core::DeviceClass;
use stayframe_proto::{GuestDetails, HeightSource, Message, ModalKind};

use crate::view::ModalView;

/// Events the host page driver feeds into an [`crate::EmbedBinding`].
#[derive(Debug, Clone, PartialEq)]
pub enum HostEvent {
    /// The iframe element fired `load`.
    FrameLoaded,

    /// The iframe element fired `error`.
    FrameLoadFailed {
        /// Driver-provided description, logged only.
        reason: String,
    },

    /// A `message` event reached the host window.
    Inbound {
        /// `event.origin`.
        origin: String,
        /// `event.data`.
        data: Value,
    },

    /// The host window was resized.
    ViewportResized {
        /// New viewport width in CSS pixels.
        width: u32,
    },

    /// The user interacted with the host modal.
    Modal(ModalUiEvent),

    /// The user clicked the retry control of the load error fallback.
    RetryLoad,

    /// Time passed; process due timers.
    Tick,
}

/// User interaction with the host-rendered modal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModalUiEvent {
    /// Guest form submitted with the values of the host's inputs.
    SubmitGuest(GuestDetails),
    /// "Back" on the payment modal.
    Back,
    /// "Make another booking" on the confirmation modal.
    MakeAnotherBooking,
    /// Explicit close button.
    CloseButton,
    /// Click on the backdrop outside the panel.
    BackdropClick,
    /// Escape key.
    Escape,
}

impl ModalUiEvent {
    /// Returns true for the paths that dismiss the modal without completing
    /// its step.
    pub const fn is_dismissal(&self) -> bool {
        matches!(self, Self::CloseButton | Self::BackdropClick | Self::Escape)
    }
}

/// Effects the driver applies to the host page.
///
/// Serialized as `{"action": "<snake_case>", ...}` for the JavaScript shim.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum HostAction {
    /// Set the iframe element's height.
    SetFrameHeight {
        /// Height in CSS pixels.
        px: u32,
    },

    /// Set the container's `min-height`.
    SetContainerMinHeight {
        /// Height in CSS pixels.
        px: u32,
    },

    /// Set the container's exact height (mobile only).
    SetContainerHeight {
        /// Height in CSS pixels.
        px: u32,
    },

    /// Post a message into the iframe's window.
    PostToFrame {
        /// Message to post.
        #[serde(serialize_with = "serialize_message")]
        message: Message,
    },

    /// Show the loading indicator.
    ShowLoading,

    /// Hide the loading indicator.
    HideLoading,

    /// Show the load failure fallback with a retry control.
    ShowLoadError {
        /// User-facing message.
        message: String,
    },

    /// Remove the load failure fallback.
    HideLoadError,

    /// Reload the iframe document.
    ReloadFrame,

    /// Insert a modal (backdrop and panel) into the host page.
    ShowModal {
        /// Step the modal renders.
        kind: ModalKind,
        /// Rendered, escaped markup.
        #[serde(rename = "html", serialize_with = "serialize_view")]
        view: ModalView,
    },

    /// Remove the current modal from the host page.
    RemoveModal,

    /// Dispatch a local event for other host-page listeners.
    HeightChanged {
        /// Applied height.
        height: u32,
        /// Device classification used.
        device: DeviceClass,
        /// Source of the report that produced the update.
        source: HeightSource,
    },

    /// Show, refresh or hide (`None`) the debug overlay.
    DebugOverlay {
        /// Overlay text.
        text: Option<String>,
    },
}

fn serialize_message<S: Serializer>(message: &Message, serializer: S) -> Result<S::Ok, S::Error> {
    stayframe_proto::encode(message).serialize(serializer)
}

fn serialize_view<S: Serializer>(view: &ModalView, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&view.to_html())
}
