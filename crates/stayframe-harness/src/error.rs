//! Harness setup errors.

use stayframe_embed::EmbedError;
use stayframe_host::BindingError;
use thiserror::Error;

/// Failure to set up a simulated page.
#[derive(Debug, Error)]
pub enum HarnessError {
    /// Host binding rejected its configuration.
    #[error("host binding: {0}")]
    Binding(#[from] BindingError),

    /// Embedded app rejected its configuration.
    #[error("embedded app: {0}")]
    Embed(#[from] EmbedError),
}
