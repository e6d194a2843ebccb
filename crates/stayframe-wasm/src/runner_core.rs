//! Platform-independent runner cores.
//!
//! Everything the wasm exports do apart from touching JavaScript values:
//! configuration parsing, event dispatch and action serialization. Generic
//! over the environment so native tests drive it with a manual clock.

use serde::{Serialize, de::DeserializeOwned};
use serde_json::Value;
use stayframe_core::Environment;
use stayframe_embed::{DocumentMetrics, EmbedConfig, EmbedError, EmbeddedApp, Embedding, Step};
use stayframe_host::{
    BindingError, EmbedBinding, HostConfig, HostEvent, ModalAction, ModalUiEvent,
};
use stayframe_proto::{BookingSummary, EmbedParams, GuestDetails};
use thiserror::Error;
use url::Url;

/// Failure surfaced to JavaScript.
#[derive(Debug, Error)]
pub enum RunnerError {
    /// Host binding rejected its configuration.
    #[error(transparent)]
    Binding(#[from] BindingError),

    /// Embedded app rejected its configuration.
    #[error(transparent)]
    Embed(#[from] EmbedError),

    /// Argument JSON did not parse.
    #[error("invalid {what}: {source}")]
    Json {
        /// Which argument.
        what: &'static str,
        /// Parse failure.
        source: serde_json::Error,
    },

    /// `data-action` value not produced by the modal markup.
    #[error("unknown modal action {0:?}")]
    UnknownAction(String),
}

/// Serialize actions for the shim. Serialization failures yield an empty
/// list.
pub fn actions_json<A: Serialize>(actions: &[A]) -> String {
    serde_json::to_string(actions).unwrap_or_else(|e| {
        tracing::warn!("Failed to serialize actions: {}", e);
        "[]".to_string()
    })
}

fn parse<T: DeserializeOwned>(what: &'static str, raw: &str) -> Result<T, RunnerError> {
    serde_json::from_str(raw).map_err(|source| RunnerError::Json { what, source })
}

fn metrics(raw: &str) -> DocumentMetrics {
    serde_json::from_str(raw).unwrap_or_else(|e| {
        tracing::warn!("Unreadable document metrics: {}", e);
        DocumentMetrics::default()
    })
}

/// Host page side.
pub struct HostCore<E: Environment> {
    binding: EmbedBinding<E>,
}

impl<E: Environment> HostCore<E> {
    /// Parse `config_json` and attach. Returns the core and the attach
    /// actions as JSON.
    pub fn new(
        env: E,
        config_json: &str,
        viewport_width: u32,
    ) -> Result<(Self, String), RunnerError> {
        let config = if config_json.trim().is_empty() {
            HostConfig::default()
        } else {
            HostConfig::from_json(config_json)?
        };
        let (binding, actions) = EmbedBinding::new(env, &config, viewport_width)?;
        Ok((Self { binding }, actions_json(&actions)))
    }

    /// The binding.
    pub fn binding(&self) -> &EmbedBinding<E> {
        &self.binding
    }

    /// Feed a host event.
    pub fn handle(&mut self, event: HostEvent) -> String {
        actions_json(&self.binding.handle(event))
    }

    /// A `message` event with already-parsed `data`.
    pub fn handle_message(&mut self, origin: &str, data: Value) -> String {
        self.handle(HostEvent::Inbound { origin: origin.to_string(), data })
    }

    /// Click or submit on an element carrying `data-action`. `form_json`
    /// holds the guest form values for `submit-guest`.
    pub fn modal_action(
        &mut self,
        action: &str,
        form_json: Option<&str>,
    ) -> Result<String, RunnerError> {
        let event = match ModalAction::parse(action) {
            Some(ModalAction::SubmitGuest) => {
                let details: GuestDetails = parse("guest form", form_json.unwrap_or("{}"))?;
                ModalUiEvent::SubmitGuest(details)
            },
            Some(ModalAction::Back) => ModalUiEvent::Back,
            Some(ModalAction::MakeAnotherBooking) => ModalUiEvent::MakeAnotherBooking,
            Some(ModalAction::Close) => ModalUiEvent::CloseButton,
            Some(ModalAction::Backdrop) => ModalUiEvent::BackdropClick,
            None => return Err(RunnerError::UnknownAction(action.to_string())),
        };
        Ok(self.handle(HostEvent::Modal(event)))
    }

    /// Key pressed on the host page.
    pub fn key_down(&mut self, key: &str) -> String {
        actions_json(&self.binding.key_down(key))
    }

    /// External control: set the height.
    pub fn update_height(&mut self, height: f64) -> String {
        actions_json(&self.binding.update_height(height))
    }

    /// External control: ask for the height.
    pub fn request_height(&self) -> String {
        actions_json(&self.binding.request_height())
    }

    /// External control: reload.
    pub fn reload(&mut self) -> String {
        actions_json(&self.binding.reload())
    }

    /// External control: debug overlay.
    pub fn set_debug_mode(&mut self, enabled: bool) -> String {
        actions_json(&self.binding.set_debug_mode(enabled))
    }

    /// External control: mark unstable.
    pub fn reset_stability(&mut self) -> String {
        actions_json(&self.binding.reset_stability())
    }

    /// CSS selectors the shim tries, in order, to find the iframe.
    pub fn target_selectors(&self) -> Vec<String> {
        self.binding.target().selectors().iter().map(|s| s.css()).collect()
    }

    /// Host page is unloading.
    pub fn teardown(&mut self) {
        self.binding.teardown();
    }
}

/// Embedded app side.
pub struct EmbedCore<E: Environment> {
    app: EmbeddedApp<E>,
}

impl<E: Environment> EmbedCore<E> {
    /// Parse `config_json` and start the app at `location`.
    pub fn new(
        env: E,
        config_json: &str,
        embedding: Embedding,
        location: &str,
    ) -> Result<Self, RunnerError> {
        let config = if config_json.trim().is_empty() {
            EmbedConfig::default()
        } else {
            EmbedConfig::from_json(config_json)?
        };

        let params = match Url::parse(location) {
            Ok(url) => EmbedParams::from_url(&url),
            Err(e) => {
                tracing::warn!("Unparseable location {:?}: {}", location, e);
                EmbedParams::default()
            },
        };

        Ok(Self { app: EmbeddedApp::new(env, &config, embedding, params)? })
    }

    /// The app.
    pub fn app(&self) -> &EmbeddedApp<E> {
        &self.app
    }

    /// Current step.
    pub fn step(&self) -> Step {
        self.app.step()
    }

    /// Document loaded.
    pub fn loaded(&mut self, metrics_json: &str) -> String {
        actions_json(&self.app.loaded(&metrics(metrics_json)))
    }

    /// A `message` event with already-parsed `data`.
    pub fn handle_message(&mut self, origin: &str, data: &Value, metrics_json: &str) -> String {
        actions_json(&self.app.handle_message(origin, data, &metrics(metrics_json)))
    }

    /// Body resized.
    pub fn body_resized(&mut self, metrics_json: &str) -> String {
        actions_json(&self.app.body_resized(&metrics(metrics_json)))
    }

    /// Document mutated.
    pub fn mutated(&mut self) {
        self.app.mutated();
    }

    /// Iframe window resized.
    pub fn window_resized(&mut self) {
        self.app.window_resized();
    }

    /// Process due timers.
    pub fn tick(&mut self, metrics_json: &str) -> String {
        actions_json(&self.app.tick(&metrics(metrics_json)))
    }

    /// Search form submitted: `{"checkIn", "checkOut", "guests"}`.
    pub fn search(&mut self, search_json: &str) -> Result<String, RunnerError> {
        let summary: BookingSummary = parse("search", search_json)?;
        Ok(actions_json(&self.app.search(summary.check_in, summary.check_out, summary.guests)))
    }

    /// Studio selected, with its display fields.
    pub fn select_studio(&mut self, selection_json: &str) -> Result<String, RunnerError> {
        let selection: BookingSummary = parse("selection", selection_json)?;
        Ok(actions_json(&self.app.select_studio(selection)))
    }

    /// Local guest form submitted.
    pub fn submit_guest_details(&mut self, form_json: &str) -> Result<String, RunnerError> {
        let details: GuestDetails = parse("guest form", form_json)?;
        Ok(actions_json(&self.app.submit_guest_details(details)))
    }

    /// Payment confirmed.
    pub fn payment_completed(&mut self, booking_reference: &str) -> String {
        actions_json(&self.app.payment_completed(booking_reference))
    }

    /// Abandon the current modal step.
    pub fn cancel(&mut self) -> String {
        actions_json(&self.app.cancel())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::{
        sync::{
            Arc,
            atomic::{AtomicU64, Ordering},
        },
        time::Duration,
    };

    use serde_json::json;
    use stayframe_core::MonoTime;

    use super::*;

    #[derive(Clone, Default)]
    struct ManualClock {
        now_ms: Arc<AtomicU64>,
    }

    impl Environment for ManualClock {
        type Instant = MonoTime;

        fn now(&self) -> MonoTime {
            MonoTime::from_millis(self.now_ms.load(Ordering::SeqCst))
        }

        fn sleep(&self, duration: Duration) -> impl std::future::Future<Output = ()> + Send {
            self.now_ms
                .fetch_add(u64::try_from(duration.as_millis()).unwrap_or(u64::MAX), Ordering::SeqCst);
            std::future::ready(())
        }
    }

    fn parsed(json: &str) -> Vec<Value> {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn host_attach_actions() {
        let (_, actions) = HostCore::new(ManualClock::default(), "", 1280).unwrap();
        assert_eq!(
            parsed(&actions),
            vec![
                json!({"action": "set_frame_height", "px": 420}),
                json!({"action": "set_container_min_height", "px": 420}),
                json!({"action": "show_loading"}),
            ]
        );
    }

    #[test]
    fn host_config_errors_surface() {
        let err = HostCore::new(ManualClock::default(), "{\"allowedOrigins\": 3}", 1280);
        assert!(matches!(err, Err(RunnerError::Binding(_))));
    }

    #[test]
    fn open_and_submit_guest_modal() {
        let (mut host, _) = HostCore::new(ManualClock::default(), "", 1280).unwrap();
        let opened = parsed(&host.handle_message(
            "https://book.stayframe.io",
            json!({"type": "OPEN_GUEST_MODAL", "data": {"studioName": "Loft 3"}}),
        ));
        assert_eq!(opened[0]["action"], json!("show_modal"));
        assert_eq!(opened[0]["kind"], json!("GUEST"));
        assert!(opened[0]["html"].as_str().unwrap().contains("Loft 3"));

        let submitted = parsed(
            &host
                .modal_action(
                    "submit-guest",
                    Some(r#"{"firstName": "Ada", "lastName": "L", "email": "a@b.c", "phone": "1"}"#),
                )
                .unwrap(),
        );
        assert_eq!(submitted[0], json!({"action": "remove_modal"}));
        assert_eq!(submitted[1]["message"]["type"], json!("GUEST_DETAILS_SUBMITTED"));
        assert_eq!(submitted[1]["message"]["data"]["firstName"], json!("Ada"));
    }

    #[test]
    fn unknown_modal_action() {
        let (mut host, _) = HostCore::new(ManualClock::default(), "", 1280).unwrap();
        assert!(matches!(host.modal_action("pay-now", None), Err(RunnerError::UnknownAction(_))));
    }

    #[test]
    fn selectors_for_the_shim() {
        let (host, _) =
            HostCore::new(ManualClock::default(), r#"{"frameId": "booking"}"#, 1280).unwrap();
        assert_eq!(host.target_selectors(), vec!["#booking".to_string()]);
    }

    #[test]
    fn embed_reads_location_and_reports() {
        let config = r#"{"allowedParentOrigins": ["https://studios.example"]}"#;
        let mut embed = EmbedCore::new(
            ManualClock::default(),
            config,
            Embedding::Framed,
            "https://book.stayframe.io/embed?checkIn=2026-11-02",
        )
        .unwrap();
        assert_eq!(embed.app().flow().summary().check_in.as_deref(), Some("2026-11-02"));

        let actions = parsed(&embed.loaded(r#"{"bodyScroll": 840, "rootClient": 600}"#));
        assert_eq!(actions[0], json!({"action": "render_step", "step": "search"}));
        assert_eq!(
            actions[1]["message"],
            json!({"type": "iframe-height", "height": 840.0, "source": "initial-load"})
        );
    }

    #[test]
    fn embed_search_json() {
        let mut embed =
            EmbedCore::new(ManualClock::default(), "", Embedding::TopLevel, "about:blank").unwrap();
        let actions = parsed(
            &embed
                .search(r#"{"checkIn": "2026-11-02", "checkOut": "2026-11-05", "guests": 2}"#)
                .unwrap(),
        );
        assert_eq!(actions, vec![json!({"action": "render_step", "step": "results"})]);
        assert_eq!(embed.step(), Step::Results);
        assert!(matches!(embed.search("nope"), Err(RunnerError::Json { what: "search", .. })));
    }
}
