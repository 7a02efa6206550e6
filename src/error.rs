//! Error types for the OpenOCD RPC client

use std::time::Duration;
use thiserror::Error;

/// Main error type for the RPC client
#[derive(Error, Debug)]
pub enum RpcError {
    #[error("Connection failed to {addr}: {source}")]
    ConnectionFailed {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Connect to {addr} timed out after {timeout:?}")]
    ConnectTimeout { addr: String, timeout: Duration },

    #[error("Not connected")]
    NotConnected,

    #[error("Already connected to {0}")]
    AlreadyConnected(String),

    #[error("Connection closed by server")]
    ConnectionClosed,

    #[error("Response timeout after {0:?}")]
    ResponseTimeout(Duration),

    #[error("Previous request was interrupted, connection released")]
    Interrupted,

    #[error("Invalid UTF-8 in response: {0}")]
    InvalidResponse(#[from] std::string::FromUtf8Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Coarse classification of [`RpcError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Transport failure: DNS, refused, reset, end of stream, timeout
    Connection,
    /// Local precondition violated, no I/O was attempted
    InvalidState,
}

impl RpcError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            RpcError::NotConnected | RpcError::AlreadyConnected(_) => ErrorKind::InvalidState,
            _ => ErrorKind::Connection,
        }
    }

    pub fn is_connection_error(&self) -> bool {
        self.kind() == ErrorKind::Connection
    }

    pub fn is_invalid_state(&self) -> bool {
        self.kind() == ErrorKind::InvalidState
    }
}

/// Result type alias for convenience
pub type Result<T> = std::result::Result<T, RpcError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_errors_are_invalid_state() {
        assert_eq!(RpcError::NotConnected.kind(), ErrorKind::InvalidState);
        assert!(RpcError::AlreadyConnected("localhost:6666".into()).is_invalid_state());
    }

    #[test]
    fn test_transport_errors_are_connection_errors() {
        let io = std::io::Error::new(std::io::ErrorKind::BrokenPipe, "pipe");
        assert!(RpcError::from(io).is_connection_error());
        assert!(RpcError::ConnectionClosed.is_connection_error());
        assert!(RpcError::ResponseTimeout(Duration::from_secs(1)).is_connection_error());
        assert!(RpcError::Interrupted.is_connection_error());
    }

    #[test]
    fn test_error_messages() {
        let err = RpcError::ConnectionFailed {
            addr: "localhost:6666".into(),
            source: std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "refused"),
        };
        assert!(err.to_string().contains("localhost:6666"));
        assert_eq!(RpcError::NotConnected.to_string(), "Not connected");
    }
}
