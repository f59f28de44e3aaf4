//! Pool error types.

use std::time::Duration;

use ldap_proto::ClientError;
use thiserror::Error;

/// Errors returned by the pool.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum PoolError {
    /// No healthy connection became available within the bound.
    #[error("timed out after {0:?} waiting for a pooled connection")]
    AcquisitionTimeout(Duration),

    /// The pool has been closed.
    #[error("connection pool is closed")]
    PoolClosed,

    /// Every slot failed to connect while building the pool.
    #[error("unable to open any of {attempted} connections: {source}")]
    InitialConnect {
        /// Number of connections attempted.
        attempted: usize,
        /// The last connect or bind failure.
        #[source]
        source: ClientError,
    },

    /// The directory operation failed. Passed through unchanged.
    #[error(transparent)]
    Operation(#[from] ClientError),

    /// The client answered with a response that does not match the request.
    #[error("{operation} returned an unexpected {response} response")]
    UnexpectedResponse {
        /// The operation that was sent.
        operation: &'static str,
        /// The kind of response that came back.
        response: &'static str,
    },

    /// Invalid pool configuration.
    #[error("invalid pool configuration: {0}")]
    Config(String),
}

impl PoolError {
    /// Whether retrying the same call later may succeed.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::AcquisitionTimeout(_))
    }

    /// The directory client error behind an operation failure, if any.
    #[must_use]
    pub fn client_error(&self) -> Option<&ClientError> {
        match self {
            Self::Operation(err) | Self::InitialConnect { source: err, .. } => Some(err),
            _ => None,
        }
    }
}
