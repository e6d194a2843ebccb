//! Executable model of host frame sizing.
//!
//! The model is a deliberately plain restatement of the host height policy:
//! integer heights, explicit deadlines, no timer wheel. It is the oracle the
//! real binding is checked against.
//!
//! # Design Principles
//!
//! - Simplicity: the model should be obviously correct
//! - Behaviour, not structure: captures what the host does, not how
//! - Deterministic: same inputs produce same outputs

mod frame;
mod operation;

pub use frame::{ModelFrame, ObservableState};
pub use operation::{ModelSource, Operation};
