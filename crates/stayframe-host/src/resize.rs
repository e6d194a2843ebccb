//! Host-side resize controller.
//!
//! One controller per embedded iframe. It is the only writer of the iframe
//! element's height: every report from the embedded document, every external
//! `update_height` call and every viewport change funnels through the same
//! clamp, threshold and debounce path.
//!
//! # State
//!
//! ```text
//! Loading --load--> Ready(unstable) --applied update--> Ready(stable)
//!    ^                    ^                                  |
//!    |                    +-------- viewport resize ---------+
//!    +--reload-- Failed <--load error-- Loading
//! ```
//!
//! The controller is sans-IO. Methods return [`HostAction`]s; timers are
//! scheduled internally and fire when the driver calls [`ResizeController::tick`]
//! at or after [`ResizeController::next_deadline`].

use stayframe_core::{
    Environment, Timers,
    policy::{
        self, APPLY_DEBOUNCE, DeviceClass, INITIAL_RETRIES, MAX_HEIGHT, VIEWPORT_DEBOUNCE,
    },
};
use stayframe_proto::{HeightSource, HeightUpdated, Message, RequestHeight};

use crate::action::HostAction;

/// Message shown when the iframe fails to load, unless configured otherwise.
pub const DEFAULT_LOAD_ERROR_MESSAGE: &str =
    "The booking widget could not be loaded. Please try again.";

/// Lifecycle phase of the embedded document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Waiting for the iframe `load` event.
    Loading,
    /// Loaded. `stable` once an update has been applied since the last
    /// load or viewport resize.
    Ready {
        /// An update has been applied.
        stable: bool,
    },
    /// The iframe reported a load error.
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TimerKey {
    ApplyHeight,
    ViewportResize,
    InitialRetry,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct PendingUpdate {
    target: u32,
    source: HeightSource,
}

/// Height negotiation state for one iframe.
pub struct ResizeController<E: Environment> {
    env: E,
    phase: Phase,

    /// Host viewport as of the last processed resize.
    viewport_width: u32,
    device: DeviceClass,
    min_height: u32,

    /// Height currently on the iframe element.
    last_applied: u32,

    /// Accepted update waiting for the apply debounce.
    pending: Option<PendingUpdate>,

    /// Width waiting for the viewport debounce.
    pending_viewport: Option<u32>,

    /// Minimum in force when the frame loaded. The retry chain stops once
    /// the embedded document reports a height beyond it.
    initial_min: u32,
    /// Largest height the embedded document reported since the last load.
    peak_report: u32,
    retries_sent: u32,

    debug: bool,
    load_error_message: String,
    timers: Timers<TimerKey, E::Instant>,
}

impl<E: Environment> ResizeController<E> {
    /// Attach to an iframe in a host viewport `viewport_width` pixels wide.
    ///
    /// Returns the controller and the actions that size the iframe to the
    /// current minimum and show the loading indicator.
    pub fn new(env: E, viewport_width: u32) -> (Self, Vec<HostAction>) {
        let device = DeviceClass::from_viewport_width(viewport_width);
        let min_height = device.min_height();

        let controller = Self {
            env,
            phase: Phase::Loading,
            viewport_width,
            device,
            min_height,
            last_applied: min_height,
            pending: None,
            pending_viewport: None,
            initial_min: min_height,
            peak_report: 0,
            retries_sent: 0,
            debug: false,
            load_error_message: DEFAULT_LOAD_ERROR_MESSAGE.to_string(),
            timers: Timers::new(),
        };

        let actions = vec![
            HostAction::SetFrameHeight { px: min_height },
            HostAction::SetContainerMinHeight { px: min_height },
            HostAction::ShowLoading,
        ];
        (controller, actions)
    }

    /// Replace the message shown by the load error fallback.
    #[must_use]
    pub fn with_load_error_message(mut self, message: impl Into<String>) -> Self {
        self.load_error_message = message.into();
        self
    }

    /// Current lifecycle phase.
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Height currently applied to the iframe.
    pub fn height(&self) -> u32 {
        self.last_applied
    }

    /// Minimum height for the current viewport.
    pub fn min_height(&self) -> u32 {
        self.min_height
    }

    /// Device classification for the current viewport.
    pub fn device(&self) -> DeviceClass {
        self.device
    }

    /// Host viewport width as of the last processed resize.
    pub fn viewport_width(&self) -> u32 {
        self.viewport_width
    }

    /// Returns true once an update has been applied since the last load or
    /// viewport change.
    pub fn is_stable(&self) -> bool {
        matches!(self.phase, Phase::Ready { stable: true })
    }

    /// Returns true if debug mode is on.
    pub fn is_debug(&self) -> bool {
        self.debug
    }

    /// Earliest pending timer deadline, for the driver's sleep.
    pub fn next_deadline(&self) -> Option<E::Instant> {
        self.timers.next_deadline()
    }

    /// The iframe fired `load`.
    ///
    /// Hides the loading indicator and starts the initial request-height
    /// chain: one request now and up to three retries at 500, 1000 and
    /// 1500 ms after the previous one.
    pub fn frame_loaded(&mut self) -> Vec<HostAction> {
        let mut actions = vec![HostAction::HideLoading];
        if self.phase == Phase::Failed {
            actions.push(HostAction::HideLoadError);
        }

        self.phase = Phase::Ready { stable: false };
        self.initial_min = self.min_height;
        self.peak_report = 0;
        self.retries_sent = 0;

        actions.push(self.initial_request());
        self.schedule(TimerKey::InitialRetry, policy::initial_retry_delay(1));

        tracing::debug!("Frame loaded, requesting initial height (min {})", self.min_height);
        actions
    }

    /// The iframe fired `error`.
    pub fn frame_load_failed(&mut self, reason: &str) -> Vec<HostAction> {
        tracing::warn!("Booking frame failed to load: {}", reason);

        self.phase = Phase::Failed;
        self.timers.cancel(TimerKey::InitialRetry);

        vec![
            HostAction::HideLoading,
            HostAction::ShowLoadError { message: self.load_error_message.clone() },
        ]
    }

    /// Reload the iframe and re-arm the load sequence.
    ///
    /// Also the handler of the load error fallback's retry control.
    pub fn reload(&mut self) -> Vec<HostAction> {
        let mut actions = Vec::new();
        if self.phase == Phase::Failed {
            actions.push(HostAction::HideLoadError);
        }

        self.phase = Phase::Loading;
        self.pending = None;
        self.timers.cancel(TimerKey::ApplyHeight);
        self.timers.cancel(TimerKey::InitialRetry);

        actions.push(HostAction::ShowLoading);
        actions.push(HostAction::ReloadFrame);
        actions
    }

    /// A height report from the embedded document.
    ///
    /// The height is clamped into the current bounds. The update is accepted
    /// if it moves the iframe by more than the device threshold or if
    /// `source` forces updates. Accepted updates replace any pending one and
    /// apply after a 30 ms debounce; rejected ones are logged and dropped.
    pub fn report(&mut self, height: f64, source: HeightSource) -> Vec<HostAction> {
        if !height.is_finite() || height <= 0.0 {
            tracing::warn!("Ignoring invalid height {} from {}", height, source);
            return Vec::new();
        }

        if source.is_embedded() {
            self.peak_report = self.peak_report.max(policy::clamp_height(height, 0, MAX_HEIGHT));
        }

        let effective = policy::clamp_height(height, self.min_height, MAX_HEIGHT);
        let reference = self.pending.map_or(self.last_applied, |p| p.target);
        let delta = effective.abs_diff(reference);

        if delta <= self.device.threshold() && !source.forces_update() {
            tracing::debug!(
                "Rejected height {} from {}: within {}px of {}",
                effective,
                source,
                self.device.threshold(),
                reference
            );
            return Vec::new();
        }

        self.pending = Some(PendingUpdate { target: effective, source });
        if self.schedule(TimerKey::ApplyHeight, APPLY_DEBOUNCE) {
            tracing::debug!("Height {} from {} supersedes pending update", effective, source);
        }

        Vec::new()
    }

    /// External control: request a specific height.
    pub fn update_height(&mut self, height: f64) -> Vec<HostAction> {
        self.report(height, HeightSource::ExternalApi)
    }

    /// External control: ask the embedded document to report its height.
    pub fn request_height(&self) -> Vec<HostAction> {
        vec![self.post(Message::RequestHeight(RequestHeight {
            min_height: Some(self.min_height),
            ..RequestHeight::default()
        }))]
    }

    /// The embedded document's content visibility changed.
    ///
    /// Only asks for a fresh height while no update has been applied since
    /// the last load or viewport change.
    pub fn content_visibility_changed(&self) -> Vec<HostAction> {
        if self.is_stable() {
            tracing::debug!("Visibility change ignored: height is stable");
            return Vec::new();
        }

        vec![self.post(Message::RequestHeight(RequestHeight {
            is_visible: Some(true),
            min_height: Some(self.min_height),
            ..RequestHeight::default()
        }))]
    }

    /// The host viewport was resized. Processed after a 250 ms debounce.
    pub fn viewport_resized(&mut self, width: u32) -> Vec<HostAction> {
        self.pending_viewport = Some(width);
        self.schedule(TimerKey::ViewportResize, VIEWPORT_DEBOUNCE);
        Vec::new()
    }

    /// External control: mark the height unstable.
    pub fn reset_stability(&mut self) -> Vec<HostAction> {
        if let Phase::Ready { stable } = &mut self.phase {
            *stable = false;
        }
        self.overlay().into_iter().collect()
    }

    /// External control: toggle the debug overlay.
    pub fn set_debug_mode(&mut self, enabled: bool) -> Vec<HostAction> {
        self.debug = enabled;
        if enabled {
            vec![HostAction::DebugOverlay { text: Some(self.status_line()) }]
        } else {
            vec![HostAction::DebugOverlay { text: None }]
        }
    }

    /// Process every timer due at the current time.
    pub fn tick(&mut self) -> Vec<HostAction> {
        let now = self.env.now();
        let mut actions = Vec::new();

        for key in self.timers.expired(now) {
            match key {
                TimerKey::ApplyHeight => actions.extend(self.apply_pending()),
                TimerKey::ViewportResize => actions.extend(self.apply_viewport()),
                TimerKey::InitialRetry => actions.extend(self.retry_initial_request()),
            }
        }

        actions
    }

    /// Cancel all timers and drop pending work. The controller stays
    /// queryable but does nothing further until the frame loads again.
    pub fn teardown(&mut self) {
        self.timers.clear();
        self.pending = None;
        self.pending_viewport = None;
    }

    fn apply_pending(&mut self) -> Vec<HostAction> {
        let Some(PendingUpdate { target, source }) = self.pending.take() else {
            return Vec::new();
        };

        // The minimum may have moved since the update was accepted.
        let px = policy::clamp_height(f64::from(target), self.min_height, MAX_HEIGHT);
        self.last_applied = px;
        if let Phase::Ready { stable } = &mut self.phase {
            *stable = true;
        }

        tracing::debug!("Applied height {} from {}", px, source);

        let mut actions = vec![
            HostAction::SetFrameHeight { px },
            HostAction::SetContainerMinHeight { px },
        ];
        if self.device.is_mobile() {
            actions.push(HostAction::SetContainerHeight { px });
        }
        actions.push(self.post(Message::HeightUpdated(HeightUpdated {
            new_height: px,
            is_mobile: self.device.is_mobile(),
            viewport_width: self.viewport_width,
            min_height: self.min_height,
        })));
        actions.push(HostAction::HeightChanged { height: px, device: self.device, source });
        actions.extend(self.overlay());
        actions
    }

    fn apply_viewport(&mut self) -> Vec<HostAction> {
        let Some(width) = self.pending_viewport.take() else {
            return Vec::new();
        };

        self.viewport_width = width;
        self.device = DeviceClass::from_viewport_width(width);
        self.min_height = self.device.min_height();
        if let Phase::Ready { stable } = &mut self.phase {
            *stable = false;
        }

        // A pending update is re-clamped to the new minimum when it applies.
        if self.pending.is_none() && self.last_applied < self.min_height {
            tracing::debug!(
                "Raising height {} to new minimum {}",
                self.last_applied,
                self.min_height
            );
            self.pending = Some(PendingUpdate {
                target: self.min_height,
                source: HeightSource::ResizeAdjustment,
            });
            self.schedule(TimerKey::ApplyHeight, APPLY_DEBOUNCE);
        }

        let mut actions = vec![self.post(Message::WindowResize { min_height: self.min_height })];
        actions.extend(self.overlay());
        actions
    }

    fn retry_initial_request(&mut self) -> Vec<HostAction> {
        if !matches!(self.phase, Phase::Ready { .. }) {
            return Vec::new();
        }
        if self.peak_report > self.initial_min {
            tracing::debug!("Embedded document reported {}, retries stopped", self.peak_report);
            return Vec::new();
        }

        self.retries_sent += 1;
        let attempt = self.retries_sent;
        if attempt < INITIAL_RETRIES {
            self.schedule(TimerKey::InitialRetry, policy::initial_retry_delay(attempt + 1));
        }

        tracing::debug!("Initial height retry {}/{}", attempt, INITIAL_RETRIES);
        vec![self.initial_request()]
    }

    fn initial_request(&self) -> HostAction {
        self.post(Message::RequestHeight(RequestHeight {
            is_initial: Some(true),
            min_height: Some(self.min_height),
            ..RequestHeight::default()
        }))
    }

    fn schedule(&mut self, key: TimerKey, delay: std::time::Duration) -> bool {
        let deadline = self.env.now() + delay;
        self.timers.schedule(key, deadline)
    }

    fn post(&self, message: Message) -> HostAction {
        HostAction::PostToFrame { message }
    }

    fn overlay(&self) -> Option<HostAction> {
        self.debug.then(|| HostAction::DebugOverlay { text: Some(self.status_line()) })
    }

    fn status_line(&self) -> String {
        let device = if self.device.is_mobile() { "mobile" } else { "desktop" };
        let stability = if self.is_stable() { "stable" } else { "unstable" };
        format!(
            "height {}px | min {}px | {} {}px | {}",
            self.last_applied, self.min_height, device, self.viewport_width, stability
        )
    }
}
