//! The embedded booking app's protocol side.
//!
//! Ties the height reporter, the modal delegate and the booking flow to one
//! origin-checked message receiver. The UI layer calls the intent methods
//! (`search`, `select_studio`, ...) and applies the returned actions.

use serde_json::Value;
use stayframe_core::Environment;
use stayframe_proto::{
    BookingSummary, EmbedParams, GuestDetails, Message, OriginAllowList, TransportError,
};

use crate::{
    action::EmbedAction,
    config::EmbedConfig,
    delegate::{Embedding, ModalDelegate, Presentation},
    error::EmbedError,
    flow::{BookingFlow, Step},
    measure::DocumentMeasure,
    reporter::HeightReporter,
};

/// Protocol state of the embedded booking app.
pub struct EmbeddedApp<E: Environment> {
    reporter: HeightReporter<E>,
    delegate: ModalDelegate,
    flow: BookingFlow,
    allowed: OriginAllowList,
}

impl<E: Environment> EmbeddedApp<E> {
    /// Create the app for a document with the given embedding, loaded with
    /// `params` from its URL.
    pub fn new(
        env: E,
        config: &EmbedConfig,
        embedding: Embedding,
        params: EmbedParams,
    ) -> Result<Self, EmbedError> {
        let allowed = config.allow_list()?;
        Ok(Self {
            reporter: HeightReporter::new(env, config.app_id.clone(), embedding.is_framed()),
            delegate: ModalDelegate::new(embedding),
            flow: BookingFlow::new(params),
            allowed,
        })
    }

    /// Current booking step.
    pub fn step(&self) -> Step {
        self.flow.step()
    }

    /// The booking flow.
    pub fn flow(&self) -> &BookingFlow {
        &self.flow
    }

    /// The height reporter.
    pub fn reporter(&self) -> &HeightReporter<E> {
        &self.reporter
    }

    /// Detected embedding.
    pub fn embedding(&self) -> Embedding {
        self.delegate.embedding()
    }

    /// Earliest pending timer deadline.
    pub fn next_deadline(&self) -> Option<E::Instant> {
        self.reporter.next_deadline()
    }

    /// The document finished loading.
    pub fn loaded(&mut self, doc: &impl DocumentMeasure) -> Vec<EmbedAction> {
        let mut actions = vec![EmbedAction::RenderStep { step: self.flow.step() }];
        actions.extend(self.reporter.loaded(doc));
        actions
    }

    /// A `message` event reached the booking window.
    pub fn handle_message(
        &mut self,
        origin: &str,
        data: &Value,
        doc: &impl DocumentMeasure,
    ) -> Vec<EmbedAction> {
        let message = match stayframe_proto::decode(origin, data, &self.allowed) {
            Ok(message) => message,
            Err(e) => {
                log_dropped(&e);
                return Vec::new();
            },
        };

        match message {
            Message::RequestHeight(request) => self.reporter.height_requested(&request, doc),
            Message::HeightUpdated(update) => {
                self.reporter.height_confirmed(&update);
                Vec::new()
            },
            Message::WindowResize { min_height } => {
                self.reporter.host_resized(min_height);
                Vec::new()
            },
            Message::StartHeightTracking => self.reporter.start_tracking(doc),
            Message::GuestDetailsSubmitted(_)
            | Message::GoBackToGuestDetails
            | Message::MakeAnotherBooking
            | Message::ModalClosed => {
                let entered = self.flow.apply(&message);
                self.entered(entered)
            },
            other => {
                tracing::debug!("Ignoring embed-bound copy of {}", other.type_name());
                Vec::new()
            },
        }
    }

    /// The body element was resized.
    pub fn body_resized(&mut self, doc: &impl DocumentMeasure) -> Vec<EmbedAction> {
        self.reporter.body_resized(doc)
    }

    /// The document mutated.
    pub fn mutated(&mut self) {
        self.reporter.mutated();
    }

    /// The iframe window was resized.
    pub fn window_resized(&mut self) {
        self.reporter.window_resized();
    }

    /// Process due timers.
    pub fn tick(&mut self, doc: &impl DocumentMeasure) -> Vec<EmbedAction> {
        self.reporter.tick(doc)
    }

    /// Search submitted.
    pub fn search(
        &mut self,
        check_in: Option<String>,
        check_out: Option<String>,
        guests: Option<u32>,
    ) -> Vec<EmbedAction> {
        let entered = self.flow.search(check_in, check_out, guests);
        self.entered(entered)
    }

    /// Studio picked from the results.
    pub fn select_studio(&mut self, selection: BookingSummary) -> Vec<EmbedAction> {
        let entered = self.flow.select_studio(selection);
        self.entered(entered)
    }

    /// Guest details entered in the local form (top-level documents only).
    pub fn submit_guest_details(&mut self, details: GuestDetails) -> Vec<EmbedAction> {
        let entered = self.flow.submit_guest_details(details);
        self.entered(entered)
    }

    /// Payment confirmed by the payment collaborator.
    pub fn payment_completed(&mut self, booking_reference: &str) -> Vec<EmbedAction> {
        let entered = self.flow.payment_completed(booking_reference);
        self.entered(entered)
    }

    /// Leave a modal step without the user dismissing it.
    pub fn cancel(&mut self) -> Vec<EmbedAction> {
        let entered = self.flow.cancel();
        if entered.is_none() {
            return Vec::new();
        }

        let mut actions: Vec<EmbedAction> = self
            .delegate
            .dismiss()
            .map(|message| EmbedAction::PostToParent { message })
            .into_iter()
            .collect();
        actions.extend(self.entered(entered));
        actions
    }

    fn entered(&mut self, step: Option<Step>) -> Vec<EmbedAction> {
        let Some(step) = step else {
            return Vec::new();
        };
        self.reporter.step_changed();

        let Some(kind) = step.modal_kind() else {
            return vec![EmbedAction::RenderStep { step }];
        };
        match self.delegate.present(kind, self.flow.payload()) {
            Presentation::Delegated(message) => vec![EmbedAction::PostToParent { message }],
            Presentation::Local => vec![EmbedAction::RenderStep { step }],
        }
    }
}

fn log_dropped(e: &TransportError) {
    match e {
        TransportError::DisallowedOrigin { .. } | TransportError::UnknownType { .. } => {
            tracing::debug!("Dropped message from parent: {}", e);
        },
        _ => tracing::warn!("Dropped malformed message from parent: {}", e),
    }
}
