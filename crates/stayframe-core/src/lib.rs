//! Stayframe core runtime.
//!
//! Shared, I/O-free building blocks for the host and embedded state
//! machines:
//!
//! - [`Environment`]: time source, so the same controller runs against a
//!   browser clock, the system clock or a simulated one
//! - [`Timers`]: every debounce, retry and periodic timer, keyed by purpose
//! - [`policy`]: the fixed height policy (bounds, thresholds, delays)

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod env;
pub mod policy;
pub mod timer;

pub use env::{Environment, MonoTime};
pub use policy::DeviceClass;
pub use timer::Timers;
