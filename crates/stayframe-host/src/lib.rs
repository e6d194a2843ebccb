//! Stayframe host page controller.
//!
//! Runs in the page that embeds the booking iframe. Sizes the iframe from
//! the embedded app's height reports and renders booking steps the app
//! delegates as page-level modals.
//!
//! Everything here is sans-IO. The driver (the wasm surface in a browser,
//! the simulation harness in tests) turns DOM and window events into
//! [`HostEvent`]s and applies the returned [`HostAction`]s.
//!
//! # Components
//!
//! - [`EmbedBinding`]: per-iframe entry point and external control surface
//! - [`ResizeController`]: height negotiation, the only writer of the iframe
//!   height
//! - [`ModalHost`]: one host-rendered modal at a time
//! - [`ModalView`]: escaped modal markup
//! - [`FrameTarget`]: explicit or fallback iframe lookup
//! - [`EmbedUrl`]: the iframe `src`

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod action;
pub mod binding;
pub mod config;
pub mod embed_url;
pub mod error;
pub mod modal;
pub mod resize;
pub mod target;
pub mod view;

pub use action::{HostAction, HostEvent, ModalUiEvent};
pub use binding::EmbedBinding;
pub use config::HostConfig;
pub use embed_url::EmbedUrl;
pub use error::BindingError;
pub use modal::ModalHost;
pub use resize::{Phase, ResizeController};
pub use target::{FrameLookup, FrameTarget, Selector};
pub use view::{ModalAction, ModalView};
