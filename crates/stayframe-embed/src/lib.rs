//! Stayframe embedded app side.
//!
//! Runs inside the booking iframe. Reports the document height to the host
//! page and hands modal booking steps to the host when framed.
//!
//! Like the host crate this is sans-IO: the driver measures the document,
//! forwards window events and applies the returned [`EmbedAction`]s.
//!
//! # Components
//!
//! - [`EmbeddedApp`]: origin-checked receiver and UI intents
//! - [`HeightReporter`]: height measurement triggers and noise suppression
//! - [`ModalDelegate`]: embedding detection and modal hand-off
//! - [`BookingFlow`]: booking step machine

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod action;
pub mod app;
pub mod config;
pub mod delegate;
pub mod error;
pub mod flow;
pub mod measure;
pub mod reporter;

pub use action::EmbedAction;
pub use app::EmbeddedApp;
pub use config::EmbedConfig;
pub use delegate::{Embedding, ModalDelegate, Presentation};
pub use error::EmbedError;
pub use flow::{BookingFlow, Step};
pub use measure::{DocumentMeasure, DocumentMetrics};
pub use reporter::HeightReporter;
