//! Browser surface for Stayframe.
//!
//! Two `wasm-bindgen` exports, one per window:
//!
//! - `HostRunner`: created by the embed snippet on the host page, one per
//!   booking iframe
//! - `EmbedRunner`: created by the booking app inside the iframe
//!
//! Both take events from a thin JavaScript shim and return the resulting
//! actions as a JSON array for the shim to apply. Timers are the shim's job:
//! it calls `tick` at `nextDeadlineMs`.

#![forbid(unsafe_code)]
#![deny(missing_docs)]

#[cfg(target_arch = "wasm32")]
mod wasm;

#[cfg(target_arch = "wasm32")]
pub use wasm::{EmbedRunner, HostRunner};

// Runner core is used by the wasm module and by native tests.
#[cfg(any(target_arch = "wasm32", test))]
#[cfg_attr(not(target_arch = "wasm32"), allow(dead_code))]
mod runner_core;
