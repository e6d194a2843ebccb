//! Embedded-side height reporter.
//!
//! Watches the booking document and tells the host how tall it is. Reports
//! are triggered by load, body resizes, DOM mutations (debounced 50 ms),
//! window resizes (debounced 100 ms), a 2 s safety-net interval and the
//! host's `startHeightTracking`. Routine reports go out as `resize` and are
//! suppressed when the height moved by less than 10 px since the last one
//! sent. Reports the host must not miss (load, explicit request, step
//! change) go out as `iframe-height` with a forcing source.
//!
//! Outside an iframe every report is a no-op.

use std::time::Duration;

use stayframe_core::{
    Environment, Timers,
    policy::{
        MUTATION_DEBOUNCE, PERIODIC_REPORT_INTERVAL, REPORT_NOISE_THRESHOLD,
        WINDOW_RESIZE_DEBOUNCE,
    },
};
use stayframe_proto::{HeightSource, HeightUpdated, Message, RequestHeight};

use crate::{action::EmbedAction, measure::DocumentMeasure};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TimerKey {
    Mutation,
    WindowResize,
    StateChange,
    Periodic,
}

/// Height reporting state of the embedded document.
pub struct HeightReporter<E: Environment> {
    env: E,
    app_id: String,
    embedded: bool,

    /// Last height posted to the host, any message type.
    last_sent: Option<f64>,

    /// Minimum the host last announced.
    host_min_height: Option<u32>,

    /// Height the host last confirmed applying.
    confirmed: Option<u32>,

    timers: Timers<TimerKey, E::Instant>,
}

impl<E: Environment> HeightReporter<E> {
    /// Create a reporter for the app `app_id`.
    pub fn new(env: E, app_id: impl Into<String>, embedded: bool) -> Self {
        Self {
            env,
            app_id: app_id.into(),
            embedded,
            last_sent: None,
            host_min_height: None,
            confirmed: None,
            timers: Timers::new(),
        }
    }

    /// Returns true if running inside an iframe.
    pub fn is_embedded(&self) -> bool {
        self.embedded
    }

    /// Last height posted to the host.
    pub fn last_sent(&self) -> Option<f64> {
        self.last_sent
    }

    /// Minimum height the host last announced.
    pub fn host_min_height(&self) -> Option<u32> {
        self.host_min_height
    }

    /// Height the host last confirmed.
    pub fn confirmed_height(&self) -> Option<u32> {
        self.confirmed
    }

    /// Earliest pending timer deadline.
    pub fn next_deadline(&self) -> Option<E::Instant> {
        self.timers.next_deadline()
    }

    /// The document finished loading. Sends the initial height and starts
    /// the periodic safety net.
    pub fn loaded(&mut self, doc: &impl DocumentMeasure) -> Vec<EmbedAction> {
        if !self.embedded {
            return Vec::new();
        }
        self.schedule(TimerKey::Periodic, PERIODIC_REPORT_INTERVAL);
        self.send_forced(doc, HeightSource::InitialLoad).into_iter().collect()
    }

    /// The body element was resized.
    pub fn body_resized(&mut self, doc: &impl DocumentMeasure) -> Vec<EmbedAction> {
        self.send_routine(doc).into_iter().collect()
    }

    /// Structure, style or class attributes changed somewhere in the document.
    pub fn mutated(&mut self) {
        if self.embedded {
            self.schedule(TimerKey::Mutation, MUTATION_DEBOUNCE);
        }
    }

    /// The iframe's own window was resized.
    pub fn window_resized(&mut self) {
        if self.embedded {
            self.schedule(TimerKey::WindowResize, WINDOW_RESIZE_DEBOUNCE);
        }
    }

    /// The booking step changed. Reports once the new step has rendered.
    pub fn step_changed(&mut self) {
        if self.embedded {
            self.schedule(TimerKey::StateChange, MUTATION_DEBOUNCE);
        }
    }

    /// The host sent `startHeightTracking`.
    ///
    /// Reports immediately regardless of the noise threshold and restarts
    /// the periodic timer.
    pub fn start_tracking(&mut self, doc: &impl DocumentMeasure) -> Vec<EmbedAction> {
        if !self.embedded {
            return Vec::new();
        }
        self.schedule(TimerKey::Periodic, PERIODIC_REPORT_INTERVAL);
        self.send(doc, |height, app_id| Message::Resize { height, app_id })
            .into_iter()
            .collect()
    }

    /// The host sent `request-height`. Always answered.
    pub fn height_requested(
        &mut self,
        request: &RequestHeight,
        doc: &impl DocumentMeasure,
    ) -> Vec<EmbedAction> {
        if let Some(min) = request.min_height {
            self.host_min_height = Some(min);
        }
        self.send_forced(doc, HeightSource::IframeMessage).into_iter().collect()
    }

    /// The host sent `window-resize`.
    pub fn host_resized(&mut self, min_height: u32) {
        tracing::debug!("Host minimum height is now {}", min_height);
        self.host_min_height = Some(min_height);
    }

    /// The host sent `height-updated`.
    pub fn height_confirmed(&mut self, update: &HeightUpdated) {
        tracing::debug!(
            "Host applied height {} (min {}, mobile {})",
            update.new_height,
            update.min_height,
            update.is_mobile
        );
        self.confirmed = Some(update.new_height);
        self.host_min_height = Some(update.min_height);
    }

    /// Process every timer due now.
    pub fn tick(&mut self, doc: &impl DocumentMeasure) -> Vec<EmbedAction> {
        let now = self.env.now();
        let mut actions = Vec::new();

        for key in self.timers.expired(now) {
            match key {
                TimerKey::Mutation | TimerKey::WindowResize => {
                    actions.extend(self.send_routine(doc));
                },
                TimerKey::StateChange => {
                    actions.extend(self.send_forced(doc, HeightSource::StateChange));
                },
                TimerKey::Periodic => {
                    actions.extend(self.send_routine(doc));
                    self.schedule(TimerKey::Periodic, PERIODIC_REPORT_INTERVAL);
                },
            }
        }
        actions
    }

    /// Stop all timers.
    pub fn stop(&mut self) {
        self.timers.clear();
    }

    fn send_routine(&mut self, doc: &impl DocumentMeasure) -> Option<EmbedAction> {
        if !self.embedded {
            return None;
        }
        let height = measure(doc)?;
        if let Some(last) = self.last_sent
            && (height - last).abs() < REPORT_NOISE_THRESHOLD
        {
            return None;
        }
        self.post(height, Message::Resize { height, app_id: self.app_id.clone() })
    }

    fn send_forced(
        &mut self,
        doc: &impl DocumentMeasure,
        source: HeightSource,
    ) -> Option<EmbedAction> {
        self.send(doc, |height, _| Message::IframeHeight { height, source: Some(source) })
    }

    fn send(
        &mut self,
        doc: &impl DocumentMeasure,
        build: impl FnOnce(f64, String) -> Message,
    ) -> Option<EmbedAction> {
        if !self.embedded {
            return None;
        }
        let height = measure(doc)?;
        let message = build(height, self.app_id.clone());
        self.post(height, message)
    }

    fn post(&mut self, height: f64, message: Message) -> Option<EmbedAction> {
        self.last_sent = Some(height);
        Some(EmbedAction::PostToParent { message })
    }

    fn schedule(&mut self, key: TimerKey, delay: Duration) {
        let deadline = self.env.now() + delay;
        self.timers.schedule(key, deadline);
    }
}

fn measure(doc: &impl DocumentMeasure) -> Option<f64> {
    let height = doc.measure().height();
    if height.is_none() {
        tracing::warn!("Document height unavailable, skipping report");
    }
    height
}
