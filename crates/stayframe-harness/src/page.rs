//! Simulated host page with one embedded booking iframe.
//!
//! `SimPage` plays the browser for both windows. Host actions are applied to
//! a small DOM model, posts are queued and delivered in order with the
//! sender's origin, and both state machines are ticked when the virtual
//! clock reaches their next deadline.
//!
//! ```text
//!   host window                          iframe window
//!  ┌─────────────┐  PostToFrame (host)  ┌──────────────┐
//!  │ EmbedBinding│ ───────────────────▶ │ EmbeddedApp  │
//!  │             │ ◀─────────────────── │              │
//!  └─────────────┘  PostToParent (app)  └──────────────┘
//! ```

use std::collections::VecDeque;

use serde_json::Value;
use stayframe_core::MonoTime;
use stayframe_embed::{DocumentMetrics, EmbedAction, EmbedConfig, EmbeddedApp, Embedding, Step};
use stayframe_host::{
    EmbedBinding, EmbedUrl, FrameLookup, HostAction, HostConfig, HostEvent, ModalUiEvent,
    Selector,
};
use stayframe_proto::{BookingSummary, EmbedParams, GuestDetails, HeightSource, ModalKind};

use crate::{error::HarnessError, sim_env::SimEnv};

/// Origin of the simulated host page unless configured otherwise.
pub const DEFAULT_HOST_ORIGIN: &str = "https://studios.example";

/// Iframe `src` unless configured otherwise.
pub const DEFAULT_FRAME_SRC: &str = "https://book.stayframe.io/embed?studio=loft-3";

/// An iframe element on the simulated host page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimFrame {
    /// Element id.
    pub id: Option<String>,
    /// Class names.
    pub classes: Vec<String>,
    /// `src` attribute.
    pub src: String,
}

/// The iframe elements present on the simulated page, in document order.
#[derive(Debug, Clone, Default)]
pub struct SimFrames(pub Vec<SimFrame>);

impl FrameLookup for SimFrames {
    type Handle = usize;

    fn query(&self, selector: &Selector) -> Option<usize> {
        self.0.iter().position(|frame| match selector {
            Selector::Tag(tag) => tag.eq_ignore_ascii_case("iframe"),
            Selector::SrcContains(needle) => frame.src.contains(needle.as_str()),
            Selector::Id(id) => frame.id.as_deref() == Some(id.as_str()),
            Selector::Class(class) => frame.classes.iter().any(|c| c == class),
        })
    }
}

/// Host page state, as left by the applied actions.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HostDom {
    /// Iframe element height.
    pub frame_height: Option<u32>,
    /// Container `min-height`.
    pub container_min_height: Option<u32>,
    /// Container exact height.
    pub container_height: Option<u32>,
    /// Loading indicator visible.
    pub loading: bool,
    /// Load error fallback message, if shown.
    pub load_error: Option<String>,
    /// Open modal and its markup.
    pub modal: Option<(ModalKind, String)>,
    /// Modals inserted so far.
    pub modals_shown: usize,
    /// Debug overlay text.
    pub overlay: Option<String>,
    /// `height_changed` events dispatched on the host page.
    pub height_events: Vec<(u32, HeightSource)>,
    /// Times the iframe document was reloaded.
    pub reloads: usize,
}

/// One applied action.
#[derive(Debug, Clone, PartialEq)]
pub enum TraceEvent {
    /// Applied by the host window.
    Host(HostAction),
    /// Applied by the iframe window.
    Embed(EmbedAction),
}

/// One applied action and when.
#[derive(Debug, Clone, PartialEq)]
pub struct TraceEntry {
    /// Virtual time in milliseconds.
    pub at_ms: u64,
    /// The action.
    pub event: TraceEvent,
}

/// How the simulated page is put together.
#[derive(Debug, Clone)]
pub struct PageSetup {
    /// Host binding configuration.
    pub host: HostConfig,
    /// Embedded app configuration.
    pub embed: EmbedConfig,
    /// Origin of the host page.
    pub host_origin: String,
    /// Iframe `src`. The app origin is derived from it.
    pub src: String,
    /// Iframe element id.
    pub frame_id: Option<String>,
    /// Iframe element classes.
    pub frame_classes: Vec<String>,
    /// Whether the app runs framed or as the top-level document.
    pub embedding: Embedding,
    /// Host viewport width.
    pub viewport_width: u32,
    /// Height of the embedded document's content.
    pub content_height: f64,
}

impl Default for PageSetup {
    fn default() -> Self {
        Self {
            host: HostConfig::default(),
            embed: EmbedConfig {
                allowed_parent_origins: vec![DEFAULT_HOST_ORIGIN.to_string()],
                ..EmbedConfig::default()
            },
            host_origin: DEFAULT_HOST_ORIGIN.to_string(),
            src: DEFAULT_FRAME_SRC.to_string(),
            frame_id: None,
            frame_classes: Vec::new(),
            embedding: Embedding::Framed,
            viewport_width: 1280,
            content_height: 900.0,
        }
    }
}

/// A host page and its embedded booking app on one virtual clock.
pub struct SimPage {
    env: SimEnv,
    setup: PageSetup,
    app_origin: String,
    params: EmbedParams,

    binding: EmbedBinding<SimEnv>,
    app: EmbeddedApp<SimEnv>,

    frames: SimFrames,
    dom: HostDom,
    document: DocumentMetrics,
    rendered: Vec<Step>,

    to_frame: VecDeque<Value>,
    to_parent: VecDeque<Value>,
    trace: Vec<TraceEntry>,
}

impl SimPage {
    /// Build the page. The iframe has not loaded yet; call [`SimPage::load`].
    ///
    /// # Errors
    ///
    /// Returns `HarnessError` if the `src` is not an http(s) URL or either
    /// configuration is rejected.
    pub fn new(setup: PageSetup) -> Result<Self, HarnessError> {
        let env = SimEnv::new();
        let src = EmbedUrl::parse(&setup.src)?;
        let params = EmbedParams::from_url(&src.to_url());

        let (binding, actions) =
            EmbedBinding::new(env.clone(), &setup.host, setup.viewport_width)?;
        let app = EmbeddedApp::new(env.clone(), &setup.embed, setup.embedding, params.clone())?;

        let frames = SimFrames(vec![SimFrame {
            id: setup.frame_id.clone(),
            classes: setup.frame_classes.clone(),
            src: src.to_string(),
        }]);

        let mut page = Self {
            env,
            app_origin: src.origin(),
            params,
            binding,
            app,
            frames,
            dom: HostDom::default(),
            document: DocumentMetrics::uniform(setup.content_height),
            rendered: Vec::new(),
            to_frame: VecDeque::new(),
            to_parent: VecDeque::new(),
            trace: Vec::new(),
            setup,
        };
        page.apply_host(actions);
        Ok(page)
    }

    /// Page with the default setup.
    ///
    /// # Errors
    ///
    /// See [`SimPage::new`].
    pub fn with_defaults() -> Result<Self, HarnessError> {
        Self::new(PageSetup::default())
    }

    /// The shared virtual clock.
    pub fn env(&self) -> &SimEnv {
        &self.env
    }

    /// Current virtual time in milliseconds.
    pub fn now_ms(&self) -> u64 {
        self.env.now_ms()
    }

    /// Host page DOM state.
    pub fn dom(&self) -> &HostDom {
        &self.dom
    }

    /// The host binding.
    pub fn binding(&self) -> &EmbedBinding<SimEnv> {
        &self.binding
    }

    /// The embedded app.
    pub fn app(&self) -> &EmbeddedApp<SimEnv> {
        &self.app
    }

    /// Current booking step.
    pub fn step(&self) -> Step {
        self.app.step()
    }

    /// Steps the app rendered inside the iframe, in order.
    pub fn rendered(&self) -> &[Step] {
        &self.rendered
    }

    /// Every applied action, in order.
    pub fn trace(&self) -> &[TraceEntry] {
        &self.trace
    }

    /// Origin of the embedded app.
    pub fn app_origin(&self) -> &str {
        &self.app_origin
    }

    /// The iframe document and then the iframe element finished loading.
    pub fn load(&mut self) {
        let actions = self.app.loaded(&self.document);
        self.apply_embed(actions);
        self.pump();

        let actions = self.binding.handle(HostEvent::FrameLoaded);
        self.apply_host(actions);
        self.pump();
    }

    /// The iframe element fired `error`.
    pub fn fail_load(&mut self, reason: &str) {
        let actions =
            self.binding.handle(HostEvent::FrameLoadFailed { reason: reason.to_string() });
        self.apply_host(actions);
    }

    /// The user clicked the load error fallback's retry control.
    pub fn click_retry(&mut self) {
        let actions = self.binding.handle(HostEvent::RetryLoad);
        self.apply_host(actions);
        self.pump();
    }

    /// The embedded content changed height.
    pub fn set_content_height(&mut self, height: f64) {
        self.document = DocumentMetrics::uniform(height);
        self.app.mutated();
        let actions = self.app.body_resized(&self.document);
        self.apply_embed(actions);
        self.pump();
    }

    /// The host window was resized. The iframe window resizes with it.
    pub fn resize_viewport(&mut self, width: u32) {
        let actions = self.binding.handle(HostEvent::ViewportResized { width });
        self.apply_host(actions);
        self.app.window_resized();
        self.pump();
    }

    /// Advance the clock by `ms`, firing every timer due on the way.
    pub fn advance(&mut self, ms: u64) {
        let until = self.env.now_ms().saturating_add(ms);

        while let Some(at) = self.next_deadline_ms().filter(|at| *at <= until) {
            self.env.advance_to(at);

            let actions = self.binding.handle(HostEvent::Tick);
            self.apply_host(actions);
            let actions = self.app.tick(&self.document);
            self.apply_embed(actions);
            self.pump();
        }
        self.env.advance_to(until);
    }

    /// Earliest timer deadline of either window.
    pub fn next_deadline_ms(&self) -> Option<u64> {
        [self.binding.next_deadline(), self.app.next_deadline()]
            .into_iter()
            .flatten()
            .min()
            .map(MonoTime::as_millis)
    }

    /// Search submitted in the app.
    pub fn search(
        &mut self,
        check_in: Option<&str>,
        check_out: Option<&str>,
        guests: Option<u32>,
    ) {
        let actions =
            self.app.search(check_in.map(str::to_string), check_out.map(str::to_string), guests);
        self.apply_embed(actions);
        self.pump();
    }

    /// Studio picked in the app.
    pub fn select_studio(&mut self, selection: BookingSummary) {
        let actions = self.app.select_studio(selection);
        self.apply_embed(actions);
        self.pump();
    }

    /// Guest details entered in the app's own form.
    pub fn submit_guest_details(&mut self, details: GuestDetails) {
        let actions = self.app.submit_guest_details(details);
        self.apply_embed(actions);
        self.pump();
    }

    /// Payment confirmed.
    pub fn payment_completed(&mut self, booking_reference: &str) {
        let actions = self.app.payment_completed(booking_reference);
        self.apply_embed(actions);
        self.pump();
    }

    /// The app abandons the current modal step.
    pub fn cancel(&mut self) {
        let actions = self.app.cancel();
        self.apply_embed(actions);
        self.pump();
    }

    /// User interaction with the host modal.
    pub fn modal_event(&mut self, event: ModalUiEvent) {
        let actions = self.binding.handle(HostEvent::Modal(event));
        self.apply_host(actions);
        self.pump();
    }

    /// Key pressed on the host page.
    pub fn key_down(&mut self, key: &str) {
        let actions = self.binding.key_down(key);
        self.apply_host(actions);
        self.pump();
    }

    /// Host page code calls `update_height`.
    pub fn update_height(&mut self, height: f64) {
        let actions = self.binding.update_height(height);
        self.apply_host(actions);
        self.pump();
    }

    /// Host page code calls `request_height`.
    pub fn request_height(&mut self) {
        let actions = self.binding.request_height();
        self.apply_host(actions);
        self.pump();
    }

    /// Host page code calls `reload`.
    pub fn reload(&mut self) {
        let actions = self.binding.reload();
        self.apply_host(actions);
        self.pump();
    }

    /// Host page code calls `set_debug_mode`.
    pub fn set_debug_mode(&mut self, enabled: bool) {
        let actions = self.binding.set_debug_mode(enabled);
        self.apply_host(actions);
    }

    /// Host page code calls `reset_stability`.
    pub fn reset_stability(&mut self) {
        let actions = self.binding.reset_stability();
        self.apply_host(actions);
    }

    /// Some other window posts `data` to the host window.
    pub fn post_to_host(&mut self, origin: &str, data: Value) {
        let actions = self.binding.handle(HostEvent::Inbound { origin: origin.to_string(), data });
        self.apply_host(actions);
        self.pump();
    }

    /// Some other window posts `data` into the iframe.
    pub fn post_to_frame(&mut self, origin: &str, data: Value) {
        let actions = self.app.handle_message(origin, &data, &self.document);
        self.apply_embed(actions);
        self.pump();
    }

    /// Remove the iframe element from the host page.
    pub fn remove_frame(&mut self) {
        self.frames.0.clear();
    }

    fn frame(&self) -> Option<usize> {
        self.binding.resolve_frame(&self.frames)
    }

    fn pump(&mut self) {
        loop {
            if let Some(data) = self.to_frame.pop_front() {
                let actions =
                    self.app.handle_message(&self.setup.host_origin, &data, &self.document);
                self.apply_embed(actions);
            } else if let Some(data) = self.to_parent.pop_front() {
                let origin = self.app_origin.clone();
                let actions = self.binding.handle(HostEvent::Inbound { origin, data });
                self.apply_host(actions);
            } else {
                break;
            }
        }
    }

    fn apply_host(&mut self, actions: Vec<HostAction>) {
        for action in actions {
            self.record(TraceEvent::Host(action.clone()));

            match action {
                HostAction::SetFrameHeight { px } => {
                    if self.frame().is_some() {
                        self.dom.frame_height = Some(px);
                    }
                },
                HostAction::SetContainerMinHeight { px } => {
                    self.dom.container_min_height = Some(px);
                },
                HostAction::SetContainerHeight { px } => self.dom.container_height = Some(px),
                HostAction::PostToFrame { message } => {
                    if self.frame().is_some() {
                        self.to_frame.push_back(stayframe_proto::encode(&message));
                    }
                },
                HostAction::ShowLoading => self.dom.loading = true,
                HostAction::HideLoading => self.dom.loading = false,
                HostAction::ShowLoadError { message } => self.dom.load_error = Some(message),
                HostAction::HideLoadError => self.dom.load_error = None,
                HostAction::ReloadFrame => self.reload_document(),
                HostAction::ShowModal { kind, view } => {
                    self.dom.modal = Some((kind, view.to_html()));
                    self.dom.modals_shown += 1;
                },
                HostAction::RemoveModal => self.dom.modal = None,
                HostAction::HeightChanged { height, source, .. } => {
                    self.dom.height_events.push((height, source));
                },
                HostAction::DebugOverlay { text } => self.dom.overlay = text,
            }
        }
    }

    fn apply_embed(&mut self, actions: Vec<EmbedAction>) {
        for action in actions {
            self.record(TraceEvent::Embed(action.clone()));

            match action {
                EmbedAction::PostToParent { message } => {
                    self.to_parent.push_back(stayframe_proto::encode(&message));
                },
                EmbedAction::RenderStep { step } => self.rendered.push(step),
            }
        }
    }

    /// Navigation replaces the iframe document: queued posts are lost and
    /// the app starts over from its URL.
    fn reload_document(&mut self) {
        self.dom.reloads += 1;
        self.to_frame.clear();

        match EmbeddedApp::new(
            self.env.clone(),
            &self.setup.embed,
            self.setup.embedding,
            self.params.clone(),
        ) {
            Ok(app) => self.app = app,
            Err(e) => tracing::warn!("Reloaded app failed to start: {}", e),
        }
    }

    fn record(&mut self, event: TraceEvent) {
        self.trace.push(TraceEntry { at_ms: self.env.now_ms(), event });
    }
}
