//! Error types for tabweld

use thiserror::Error;

use crate::host::TabId;

/// Result type for tabweld operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for tabweld
#[derive(Debug, Error)]
pub enum Error {
    /// Host refused to attach the debugger (restricted URL, permission denied)
    #[error("Host refused attach for tab {tab}: {message}")]
    HostAttach { tab: TabId, message: String },

    /// Command referenced a tab or session no longer in the registry
    #[error("Routing error: {0}")]
    Routing(String),

    /// The host's raw command primitive rejected the request
    #[error("Host command error in {method}: {message} (code {code})")]
    HostCommand {
        method: String,
        code: i64,
        message: String,
    },

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Timeout
    #[error("Timeout: {0}")]
    Timeout(String),
}

impl Error {
    /// Create a host-attach error
    pub fn host_attach(tab: TabId, message: impl Into<String>) -> Self {
        Self::HostAttach {
            tab,
            message: message.into(),
        }
    }

    /// Create a routing error
    pub fn routing(message: impl Into<String>) -> Self {
        Self::Routing(message.into())
    }

    /// Create a host-command error with full context
    pub fn host_command(method: impl Into<String>, code: i64, message: impl Into<String>) -> Self {
        Self::HostCommand {
            method: method.into(),
            code,
            message: message.into(),
        }
    }

    /// Check if this is a routing error (stale tab/session reference)
    pub fn is_routing(&self) -> bool {
        matches!(self, Error::Routing(_))
    }

    /// Numeric code for the protocol error envelope.
    ///
    /// Host command errors keep the code the host reported; everything else
    /// maps onto the generic server-error range.
    pub fn code(&self) -> i64 {
        match self {
            Error::HostCommand { code, .. } => *code,
            Error::Routing(_) => -32001,
            _ => -32000,
        }
    }
}
