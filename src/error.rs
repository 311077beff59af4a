use std::io;

use thiserror::Error;

/// Everything that can go wrong between the editor and the host.
///
/// Variants only carry the message; the caller decides how to render it.
#[derive(Debug, Error)]
pub enum BridgeError {
    /// No project, timeline or media pool is open. Expected and non-fatal.
    #[error("{0}")]
    HostUnavailable(String),
    /// The host refused or failed a call.
    #[error("{0}")]
    HostCallFailed(String),
    #[error("{0}")]
    InvalidInput(String),
    #[error("{context}: {source}")]
    IoFailure {
        context: String,
        #[source]
        source: io::Error,
    },
}

impl BridgeError {
    pub fn io(context: impl Into<String>, source: io::Error) -> Self {
        BridgeError::IoFailure {
            context: context.into(),
            source,
        }
    }
}
