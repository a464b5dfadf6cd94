//! Error types for the ExESDB client.
//!
//! Every failure a caller can observe is one of the [`ClientError`] variants,
//! so handling code can `match` over the taxonomy instead of inspecting
//! message strings.

use std::fmt;

use tonic::{Code, Status};

use crate::config::ConfigError;

/// Result type for client operations.
pub type Result<T> = std::result::Result<T, ClientError>;

/// Capability area an operation belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    Streams,
    EventStore,
    StoreManagement,
    Snapshots,
    Subscriptions,
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Capability::Streams => "streams",
            Capability::EventStore => "event store",
            Capability::StoreManagement => "store management",
            Capability::Snapshots => "snapshots",
            Capability::Subscriptions => "subscriptions",
        };
        f.write_str(name)
    }
}

/// Why a call stopped before the server answered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CancelReason {
    /// The caller's cancellation signal fired.
    Requested,
    /// The request timeout (or a shorter per-call timeout) elapsed.
    DeadlineExceeded,
}

impl fmt::Display for CancelReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CancelReason::Requested => f.write_str("cancellation requested"),
            CancelReason::DeadlineExceeded => f.write_str("deadline exceeded"),
        }
    }
}

/// Errors that can occur during client operations.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// Invalid settings, detected before any network activity.
    #[error("invalid configuration: {0}")]
    Configuration(#[from] ConfigError),

    /// The client has been shut down.
    #[error("client has been shut down")]
    Closed,

    /// The call failed for a network, protocol or server-reported reason.
    #[error("{capability} {method} failed: {status}")]
    Transport {
        capability: Capability,
        method: &'static str,
        #[source]
        status: Box<Status>,
    },

    /// The call was aborted by a cancellation signal or a timeout.
    #[error("{method} cancelled: {reason}")]
    Cancelled {
        method: &'static str,
        reason: CancelReason,
    },

    /// The operation is part of the contract but not backed by the service.
    #[error("{capability} {method} is not implemented: {message}")]
    Unimplemented {
        capability: Capability,
        method: &'static str,
        message: String,
    },

    /// Invalid argument provided by caller.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}

impl ClientError {
    /// Classify a gRPC status returned by `method`.
    ///
    /// A `CANCELLED` status maps to [`ClientError::Transport`]. Call sites
    /// that see their own signal fired report [`ClientError::Cancelled`]
    /// instead.
    pub fn from_status(capability: Capability, method: &'static str, status: Status) -> Self {
        match status.code() {
            Code::DeadlineExceeded => ClientError::Cancelled {
                method,
                reason: CancelReason::DeadlineExceeded,
            },
            Code::Unimplemented => ClientError::Unimplemented {
                capability,
                method,
                message: status.message().to_string(),
            },
            _ => ClientError::Transport {
                capability,
                method,
                status: Box::new(status),
            },
        }
    }

    /// Returns the error message.
    pub fn message(&self) -> String {
        match self {
            ClientError::Configuration(e) => e.to_string(),
            ClientError::Closed => "client has been shut down".to_string(),
            ClientError::Transport { status, .. } => status.message().to_string(),
            ClientError::Cancelled { reason, .. } => reason.to_string(),
            ClientError::Unimplemented { message, .. } => message.clone(),
            ClientError::InvalidArgument(msg) => msg.clone(),
        }
    }

    /// Returns the gRPC status code if this is a transport error.
    pub fn code(&self) -> Option<Code> {
        self.status().map(Status::code)
    }

    /// Returns the underlying gRPC Status if this is a transport error.
    pub fn status(&self) -> Option<&Status> {
        match self {
            ClientError::Transport { status, .. } => Some(status),
            _ => None,
        }
    }

    /// Returns true if the server reported that the target does not exist.
    pub fn is_not_found(&self) -> bool {
        matches!(self.code(), Some(Code::NotFound))
    }

    /// Returns true if the server reported that the target already exists.
    pub fn is_already_exists(&self) -> bool {
        matches!(self.code(), Some(Code::AlreadyExists))
    }

    /// Returns true if the server could not be reached.
    pub fn is_connection_error(&self) -> bool {
        matches!(self.code(), Some(Code::Unavailable))
    }

    /// Returns true for both explicit cancellation and timeouts.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, ClientError::Cancelled { .. })
    }

    /// Returns true if the call ran out of time.
    pub fn is_timeout(&self) -> bool {
        matches!(
            self,
            ClientError::Cancelled {
                reason: CancelReason::DeadlineExceeded,
                ..
            }
        )
    }

    /// Returns true if the operation is not backed by the service.
    pub fn is_unimplemented(&self) -> bool {
        matches!(self, ClientError::Unimplemented { .. })
    }

    /// Returns true if the client was already shut down.
    pub fn is_closed(&self) -> bool {
        matches!(self, ClientError::Closed)
    }
}
