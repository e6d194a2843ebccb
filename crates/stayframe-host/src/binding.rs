//! Per-iframe host binding.
//!
//! An `EmbedBinding` is what the host page script creates for each
//! embedded booking iframe. It owns the resize controller and the modal
//! host, validates every inbound message against its origin allow-list and
//! routes what survives. The public methods other than [`EmbedBinding::handle`]
//! form the external control surface exposed to host page code.

use stayframe_core::{DeviceClass, Environment};
use stayframe_proto::{HeightSource, Message, OriginAllowList, TransportError};

use crate::{
    action::{HostAction, HostEvent},
    config::HostConfig,
    error::BindingError,
    modal::ModalHost,
    resize::ResizeController,
    target::{FrameLookup, FrameTarget},
};

/// Host-side state for one embedded booking iframe.
pub struct EmbedBinding<E: Environment> {
    resize: ResizeController<E>,
    modal: ModalHost,
    allowed: OriginAllowList,
    target: FrameTarget,
}

impl<E: Environment> EmbedBinding<E> {
    /// Attach to an iframe in a viewport `viewport_width` pixels wide.
    ///
    /// # Errors
    ///
    /// Returns `BindingError` if the configured allow-list contains an entry
    /// that is not a valid origin.
    pub fn new(
        env: E,
        config: &HostConfig,
        viewport_width: u32,
    ) -> Result<(Self, Vec<HostAction>), BindingError> {
        let allowed = config.allow_list()?;
        let (resize, mut actions) = ResizeController::new(env, viewport_width);
        let mut resize = resize.with_load_error_message(config.load_error_message.clone());

        if config.debug {
            actions.extend(resize.set_debug_mode(true));
        }

        let binding = Self { resize, modal: ModalHost::new(), allowed, target: config.target() };
        Ok((binding, actions))
    }

    /// Process a host page event.
    pub fn handle(&mut self, event: HostEvent) -> Vec<HostAction> {
        match event {
            HostEvent::FrameLoaded => {
                let mut actions = self.resize.frame_loaded();
                actions.push(HostAction::PostToFrame { message: Message::StartHeightTracking });
                actions
            },
            HostEvent::FrameLoadFailed { reason } => self.resize.frame_load_failed(&reason),
            HostEvent::Inbound { origin, data } => self.handle_inbound(&origin, &data),
            HostEvent::ViewportResized { width } => self.resize.viewport_resized(width),
            HostEvent::Modal(event) => self.modal.handle(event),
            HostEvent::RetryLoad => self.resize.reload(),
            HostEvent::Tick => self.resize.tick(),
        }
    }

    /// A key was pressed on the host page.
    pub fn key_down(&mut self, key: &str) -> Vec<HostAction> {
        self.modal.key_down(key)
    }

    fn handle_inbound(&mut self, origin: &str, data: &serde_json::Value) -> Vec<HostAction> {
        match stayframe_proto::decode(origin, data, &self.allowed) {
            Ok(message) => self.route(message),
            Err(e) => {
                log_dropped(&e);
                Vec::new()
            },
        }
    }

    fn route(&mut self, message: Message) -> Vec<HostAction> {
        match message {
            Message::IframeHeight { height, source } => {
                self.resize.report(height, source.unwrap_or(HeightSource::IframeMessage))
            },
            Message::Resize { height, .. } => self.resize.report(height, HeightSource::PostMessage),
            Message::ContentVisibilityChange => self.resize.content_visibility_changed(),
            Message::OpenModal { kind, payload } => self.modal.open(kind, &payload),
            Message::CloseModal => self.modal.close_requested(),
            other => {
                tracing::debug!("Ignoring host-bound copy of {}", other.type_name());
                Vec::new()
            },
        }
    }

    /// External control: set the height explicitly.
    pub fn update_height(&mut self, height: f64) -> Vec<HostAction> {
        self.resize.update_height(height)
    }

    /// External control: ask the embedded app for its height.
    pub fn request_height(&self) -> Vec<HostAction> {
        self.resize.request_height()
    }

    /// External control: reload the iframe.
    pub fn reload(&mut self) -> Vec<HostAction> {
        self.resize.reload()
    }

    /// External control: height currently applied.
    pub fn height(&self) -> u32 {
        self.resize.height()
    }

    /// External control: minimum height for the current viewport.
    pub fn min_height(&self) -> u32 {
        self.resize.min_height()
    }

    /// External control: toggle the debug overlay.
    pub fn set_debug_mode(&mut self, enabled: bool) -> Vec<HostAction> {
        self.resize.set_debug_mode(enabled)
    }

    /// External control: mark the height unstable.
    pub fn reset_stability(&mut self) -> Vec<HostAction> {
        self.resize.reset_stability()
    }

    /// Returns true once an update has been applied since the last load or
    /// viewport change.
    pub fn is_stable(&self) -> bool {
        self.resize.is_stable()
    }

    /// Device classification for the current viewport.
    pub fn device(&self) -> DeviceClass {
        self.resize.device()
    }

    /// Earliest pending timer deadline.
    pub fn next_deadline(&self) -> Option<E::Instant> {
        self.resize.next_deadline()
    }

    /// The resize controller.
    pub fn resize(&self) -> &ResizeController<E> {
        &self.resize
    }

    /// The modal host.
    pub fn modal(&self) -> &ModalHost {
        &self.modal
    }

    /// How the iframe is located.
    pub fn target(&self) -> &FrameTarget {
        &self.target
    }

    /// Locate the iframe on the page. A miss is logged only.
    pub fn resolve_frame<L: FrameLookup>(&self, lookup: &L) -> Option<L::Handle> {
        self.target.resolve(lookup)
    }

    /// Host page is navigating away.
    pub fn teardown(&mut self) {
        self.resize.teardown();
    }
}

fn log_dropped(e: &TransportError) {
    match e {
        TransportError::DisallowedOrigin { .. } | TransportError::UnknownType { .. } => {
            tracing::debug!("Dropped inbound message: {}", e);
        },
        _ if e.is_measurement() => tracing::warn!("Dropped invalid height report: {}", e),
        _ => tracing::warn!("Dropped malformed message: {}", e),
    }
}
