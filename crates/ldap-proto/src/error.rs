//! Directory client error types.

use thiserror::Error;

/// Result type for directory client calls.
pub type Result<T> = std::result::Result<T, ClientError>;

/// Errors reported by a directory client.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ClientError {
    /// The transport connection could not be established.
    #[error("failed to connect to {address}: {message}")]
    Connect {
        /// Address that was dialed.
        address: String,
        /// Failure description from the transport.
        message: String,
    },

    /// The bind was rejected.
    #[error("authentication failed: {0}")]
    Authentication(String),

    /// The server answered the operation with a non-success result code.
    #[error("operation failed with result code {code}: {message}")]
    Operation {
        /// Directory result code.
        code: u32,
        /// Diagnostic message returned by the server.
        message: String,
    },

    /// The connection was closed before or during the operation.
    #[error("connection closed")]
    ConnectionClosed,

    /// The client gave up waiting for the server.
    #[error("operation timed out")]
    Timeout,

    /// IO error on the underlying transport.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ClientError {
    /// Whether this error means the connection itself is unusable, as opposed
    /// to the server rejecting one request.
    #[must_use]
    pub fn is_connection_error(&self) -> bool {
        matches!(
            self,
            Self::Connect { .. } | Self::ConnectionClosed | Self::Timeout | Self::Io(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connection_error_classification() {
        assert!(ClientError::ConnectionClosed.is_connection_error());
        assert!(ClientError::Timeout.is_connection_error());
        assert!(
            ClientError::Connect {
                address: "ldap://localhost:389".into(),
                message: "refused".into(),
            }
            .is_connection_error()
        );
        assert!(
            ClientError::Io(std::io::Error::new(std::io::ErrorKind::BrokenPipe, "pipe"))
                .is_connection_error()
        );

        assert!(!ClientError::Authentication("invalid credentials".into()).is_connection_error());
        assert!(
            !ClientError::Operation {
                code: 32,
                message: "no such object".into(),
            }
            .is_connection_error()
        );
    }

    #[test]
    fn test_display() {
        let err = ClientError::Operation {
            code: 50,
            message: "insufficient access".into(),
        };
        assert_eq!(
            err.to_string(),
            "operation failed with result code 50: insufficient access"
        );
    }
}
