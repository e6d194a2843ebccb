//! Deterministic simulation harness for Stayframe.
//!
//! Runs a host page binding and an embedded booking app against one virtual
//! clock, delivering every message between the two windows through the same
//! origin checks a browser would apply. Given the same sequence of inputs the
//! simulation produces the same trace, so failures replay exactly.
//!
//! # Model-Based Testing
//!
//! The `model` module holds a reference implementation of the host height
//! policy. Operations are applied to both the model and the real binding and
//! their observable states are compared.

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod error;
pub mod model;
pub mod page;
pub mod sim_env;

pub use error::HarnessError;
pub use model::{ModelFrame, ModelSource, ObservableState, Operation};
pub use page::{HostDom, PageSetup, SimFrame, SimFrames, SimPage, TraceEntry, TraceEvent};
pub use sim_env::SimEnv;
