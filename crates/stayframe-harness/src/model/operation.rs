//! Height-side inputs applied to both the binding and the model.
//!
//! Operations are generated by proptest (or decoded by the fuzzer through
//! `Arbitrary`) and applied to both the model and the real binding.

use arbitrary::Arbitrary;
use stayframe_proto::HeightSource;

/// Operations a host page can experience.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Arbitrary)]
pub enum Operation {
    /// The embedded app reports a height.
    Report {
        /// Reported height in CSS pixels. Zero is an invalid report.
        height: u16,
        /// Report source.
        source: ModelSource,
    },

    /// Host page code calls `update_height`.
    UpdateHeight {
        /// Requested height in CSS pixels.
        height: u16,
    },

    /// The host viewport is resized.
    ViewportResize {
        /// New width in CSS pixels.
        width: u16,
    },

    /// Host page code calls `reset_stability`.
    ResetStability,

    /// Advance virtual time, then process due timers once.
    AdvanceTime {
        /// Milliseconds to advance.
        millis: u16,
    },
}

/// Report sources the embedded app can send.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Arbitrary)]
pub enum ModelSource {
    /// `resize` report.
    PostMessage,
    /// `iframe-height` reply to a request.
    IframeMessage,
    /// First report after load.
    InitialLoad,
    /// Step change.
    StateChange,
    /// Scroll-driven report.
    ScrollRelated,
}

impl ModelSource {
    /// Protocol source.
    pub const fn to_source(self) -> HeightSource {
        match self {
            Self::PostMessage => HeightSource::PostMessage,
            Self::IframeMessage => HeightSource::IframeMessage,
            Self::InitialLoad => HeightSource::InitialLoad,
            Self::StateChange => HeightSource::StateChange,
            Self::ScrollRelated => HeightSource::ScrollRelated,
        }
    }

    /// Returns true if the model skips the threshold for this source.
    pub const fn forced(self) -> bool {
        matches!(self, Self::IframeMessage | Self::InitialLoad | Self::StateChange)
    }
}
