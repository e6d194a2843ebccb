//! `wasm-bindgen` exports.
//!
//! Wraps the runner cores with JS-friendly types. Only compiled on `wasm32`
//! targets.

use std::time::Duration;

use js_sys::{Array, Function, JSON, Object, Reflect};
use serde_json::Value;
use stayframe_core::{Environment, MonoTime};
use stayframe_embed::Embedding;
use stayframe_host::HostEvent;
use wasm_bindgen::{JsCast, prelude::*};

use super::runner_core::{EmbedCore, HostCore, RunnerError};

/// Clock backed by `performance.now()`.
#[derive(Debug, Clone, Copy, Default)]
pub struct BrowserEnv;

impl Environment for BrowserEnv {
    type Instant = MonoTime;

    fn now(&self) -> MonoTime {
        let ms = performance_now().filter(|ms| ms.is_finite() && *ms >= 0.0).unwrap_or(0.0);
        MonoTime::from_duration(Duration::from_secs_f64(ms / 1000.0))
    }

    /// Timers are driven by the shim through `tick`; nothing in the
    /// controllers awaits a sleep.
    fn sleep(&self, _duration: Duration) -> impl std::future::Future<Output = ()> + Send {
        std::future::ready(())
    }
}

fn performance_now() -> Option<f64> {
    let performance = Reflect::get(&js_sys::global(), &"performance".into()).ok()?;
    let now = Reflect::get(&performance, &"now".into()).ok()?.dyn_into::<Function>().ok()?;
    now.call0(&performance).ok()?.as_f64()
}

fn console_error(msg: &str) {
    let global = js_sys::global();
    let Ok(console) = Reflect::get(&global, &"console".into()) else {
        return;
    };
    let Ok(error) = Reflect::get(&console, &"error".into()) else {
        return;
    };
    let Ok(error_fn) = error.dyn_into::<Function>() else {
        return;
    };
    let _ = error_fn.call1(&console, &JsValue::from_str(msg));
}

fn install_panic_hook() {
    use std::sync::Once;

    static ONCE: Once = Once::new();
    ONCE.call_once(|| {
        std::panic::set_hook(Box::new(|info| {
            let msg = match info.location() {
                Some(loc) => format!("panic at {}:{}:{}: {info}", loc.file(), loc.line(), loc.column()),
                None => format!("panic: {info}"),
            };
            console_error(&msg);
        }));
    });
}

fn js_error(e: &RunnerError) -> JsValue {
    js_sys::Error::new(&e.to_string()).into()
}

/// `event.data` as JSON. Values `JSON.stringify` rejects become `null`,
/// which the decoder drops.
fn data_to_json(data: &JsValue) -> Value {
    JSON::stringify(data)
        .ok()
        .and_then(|s| s.as_string())
        .and_then(|s| serde_json::from_str(&s).ok())
        .unwrap_or(Value::Null)
}

#[allow(clippy::cast_precision_loss)]
fn deadline_ms(deadline: Option<MonoTime>) -> Option<f64> {
    deadline.map(|t| t.as_millis() as f64)
}

fn framed() -> Embedding {
    Embedding::detect(|| -> Result<bool, JsValue> {
        let global = js_sys::global();
        let top = Reflect::get(&global, &"top".into())?;
        let this = Reflect::get(&global, &"self".into())?;
        Ok(Object::is(&top, &this))
    })
}

/// Module initialisation.
#[wasm_bindgen(start)]
pub fn wasm_start() {
    install_panic_hook();
}

/// Host page controller for one booking iframe.
///
/// Every method returns the resulting actions as a JSON array for the page
/// shim to apply. The shim owns the DOM and the `postMessage` calls:
/// `post_to_frame` actions go to the iframe's `contentWindow` with the
/// iframe's origin as target, and a throw from `postMessage` (detached
/// frame, cross-origin access) is caught and logged with `console.warn`,
/// never propagated into the host page.
#[wasm_bindgen]
pub struct HostRunner {
    inner: HostCore<BrowserEnv>,
    attach: String,
}

#[wasm_bindgen]
impl HostRunner {
    /// Attach with JSON configuration (empty string for defaults) in a
    /// viewport `viewport_width` pixels wide.
    #[wasm_bindgen(constructor)]
    pub fn new(config_json: &str, viewport_width: u32) -> Result<Self, JsValue> {
        install_panic_hook();
        let (inner, attach) =
            HostCore::new(BrowserEnv, config_json, viewport_width).map_err(|e| js_error(&e))?;
        Ok(Self { inner, attach })
    }

    /// Actions produced when attaching. Apply once after construction.
    #[wasm_bindgen(js_name = attachActions)]
    pub fn attach_actions(&self) -> String {
        self.attach.clone()
    }

    /// Selectors to locate the iframe, in order.
    #[wasm_bindgen(js_name = targetSelectors)]
    pub fn target_selectors(&self) -> Array {
        self.inner.target_selectors().into_iter().map(JsValue::from).collect()
    }

    /// `message` event on the host window.
    #[wasm_bindgen(js_name = handleMessage)]
    pub fn handle_message(&mut self, origin: &str, data: &JsValue) -> String {
        self.inner.handle_message(origin, data_to_json(data))
    }

    /// Iframe `load`.
    #[wasm_bindgen(js_name = frameLoaded)]
    pub fn frame_loaded(&mut self) -> String {
        self.inner.handle(HostEvent::FrameLoaded)
    }

    /// Iframe `error`.
    #[wasm_bindgen(js_name = frameError)]
    pub fn frame_error(&mut self, reason: &str) -> String {
        self.inner.handle(HostEvent::FrameLoadFailed { reason: reason.to_string() })
    }

    /// Retry control of the load error fallback.
    #[wasm_bindgen(js_name = retryLoad)]
    pub fn retry_load(&mut self) -> String {
        self.inner.handle(HostEvent::RetryLoad)
    }

    /// Host window `resize`.
    #[wasm_bindgen(js_name = viewportResized)]
    pub fn viewport_resized(&mut self, width: u32) -> String {
        self.inner.handle(HostEvent::ViewportResized { width })
    }

    /// Click or submit on a modal element with `data-action`.
    #[wasm_bindgen(js_name = modalAction)]
    pub fn modal_action(&mut self, action: &str, form_json: Option<String>) -> Result<String, JsValue> {
        self.inner.modal_action(action, form_json.as_deref()).map_err(|e| js_error(&e))
    }

    /// `keydown` on the host document.
    #[wasm_bindgen(js_name = keyDown)]
    pub fn key_down(&mut self, key: &str) -> String {
        self.inner.key_down(key)
    }

    /// Timer callback.
    pub fn tick(&mut self) -> String {
        self.inner.handle(HostEvent::Tick)
    }

    /// When to call `tick` next, in `performance.now()` milliseconds.
    #[wasm_bindgen(js_name = nextDeadlineMs)]
    pub fn next_deadline_ms(&self) -> Option<f64> {
        deadline_ms(self.inner.binding().next_deadline())
    }

    /// Set the height explicitly.
    #[wasm_bindgen(js_name = updateHeight)]
    pub fn update_height(&mut self, height: f64) -> String {
        self.inner.update_height(height)
    }

    /// Ask the embedded app for its height.
    #[wasm_bindgen(js_name = requestHeight)]
    pub fn request_height(&self) -> String {
        self.inner.request_height()
    }

    /// Reload the iframe.
    pub fn reload(&mut self) -> String {
        self.inner.reload()
    }

    /// Height currently applied.
    #[wasm_bindgen(js_name = getHeight)]
    pub fn get_height(&self) -> u32 {
        self.inner.binding().height()
    }

    /// Minimum height for the current viewport.
    #[wasm_bindgen(js_name = getMinHeight)]
    pub fn get_min_height(&self) -> u32 {
        self.inner.binding().min_height()
    }

    /// Toggle the debug overlay.
    #[wasm_bindgen(js_name = setDebugMode)]
    pub fn set_debug_mode(&mut self, enabled: bool) -> String {
        self.inner.set_debug_mode(enabled)
    }

    /// Mark the height unstable.
    #[wasm_bindgen(js_name = resetStability)]
    pub fn reset_stability(&mut self) -> String {
        self.inner.reset_stability()
    }

    /// Host page unload.
    pub fn teardown(&mut self) {
        self.inner.teardown();
    }
}

/// Embedded booking app controller.
///
/// As with [`HostRunner`], the document shim applies the returned actions.
/// `post_to_parent` actions go to `window.parent` with the configured
/// host origin as target. A throw from `postMessage` is caught and logged.
#[wasm_bindgen]
pub struct EmbedRunner {
    inner: EmbedCore<BrowserEnv>,
}

#[wasm_bindgen]
impl EmbedRunner {
    /// Start with JSON configuration at `location` (`window.location.href`).
    /// Embedding is detected from `window.top`.
    #[wasm_bindgen(constructor)]
    pub fn new(config_json: &str, location: &str) -> Result<Self, JsValue> {
        install_panic_hook();
        let inner =
            EmbedCore::new(BrowserEnv, config_json, framed(), location).map_err(|e| js_error(&e))?;
        Ok(Self { inner })
    }

    /// Returns true when running inside an iframe.
    #[wasm_bindgen(js_name = isFramed)]
    pub fn is_framed(&self) -> bool {
        self.inner.app().embedding().is_framed()
    }

    /// Current booking step name.
    pub fn step(&self) -> String {
        serde_json::to_value(self.inner.step())
            .ok()
            .and_then(|v| v.as_str().map(str::to_string))
            .unwrap_or_default()
    }

    /// Document `load`. `metrics_json` holds the six document heights.
    pub fn loaded(&mut self, metrics_json: &str) -> String {
        self.inner.loaded(metrics_json)
    }

    /// `message` event on the iframe window.
    #[wasm_bindgen(js_name = handleMessage)]
    pub fn handle_message(&mut self, origin: &str, data: &JsValue, metrics_json: &str) -> String {
        self.inner.handle_message(origin, &data_to_json(data), metrics_json)
    }

    /// `ResizeObserver` callback on the body.
    #[wasm_bindgen(js_name = bodyResized)]
    pub fn body_resized(&mut self, metrics_json: &str) -> String {
        self.inner.body_resized(metrics_json)
    }

    /// `MutationObserver` callback.
    pub fn mutated(&mut self) {
        self.inner.mutated();
    }

    /// Iframe window `resize`.
    #[wasm_bindgen(js_name = windowResized)]
    pub fn window_resized(&mut self) {
        self.inner.window_resized();
    }

    /// Timer callback.
    pub fn tick(&mut self, metrics_json: &str) -> String {
        self.inner.tick(metrics_json)
    }

    /// When to call `tick` next, in `performance.now()` milliseconds.
    #[wasm_bindgen(js_name = nextDeadlineMs)]
    pub fn next_deadline_ms(&self) -> Option<f64> {
        deadline_ms(self.inner.app().next_deadline())
    }

    /// Search submitted.
    pub fn search(&mut self, search_json: &str) -> Result<String, JsValue> {
        self.inner.search(search_json).map_err(|e| js_error(&e))
    }

    /// Studio selected.
    #[wasm_bindgen(js_name = selectStudio)]
    pub fn select_studio(&mut self, selection_json: &str) -> Result<String, JsValue> {
        self.inner.select_studio(selection_json).map_err(|e| js_error(&e))
    }

    /// Local guest form submitted.
    #[wasm_bindgen(js_name = submitGuestDetails)]
    pub fn submit_guest_details(&mut self, form_json: &str) -> Result<String, JsValue> {
        self.inner.submit_guest_details(form_json).map_err(|e| js_error(&e))
    }

    /// Payment confirmed.
    #[wasm_bindgen(js_name = paymentCompleted)]
    pub fn payment_completed(&mut self, booking_reference: &str) -> String {
        self.inner.payment_completed(booking_reference)
    }

    /// Abandon the current modal step.
    pub fn cancel(&mut self) -> String {
        self.inner.cancel()
    }
}
