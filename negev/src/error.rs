//! Error types for negev.

use std::io;
use std::time::Duration;

use thiserror::Error;

/// Main error type for negev operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Transport-level errors (dial, SSH handshake, authentication)
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    /// Channel operation errors
    #[error("Channel error: {0}")]
    Channel(#[from] ChannelError),

    /// Session-level errors
    #[error("Session error: {0}")]
    Session(#[from] SessionError),

    /// Platform/vendor errors
    #[error("Platform error: {0}")]
    Platform(#[from] PlatformError),

    /// Reconciliation errors
    #[error("Reconcile error: {0}")]
    Reconcile(#[from] ReconcileError),
}

impl Error {
    /// Whether this error is a read deadline expiring rather than a hard failure.
    pub fn is_timeout(&self) -> bool {
        match self {
            Error::Channel(ChannelError::PatternTimeout { .. })
            | Error::Transport(TransportError::Timeout(_)) => true,
            Error::Session(SessionError::CommandFailed { source, .. })
            | Error::Session(SessionError::LoginFailed { source, .. }) => source.is_timeout(),
            _ => false,
        }
    }

    /// Whether the link to the device is gone and the session must reconnect.
    pub fn is_disconnect(&self) -> bool {
        match self {
            Error::Transport(TransportError::Disconnected)
            | Error::Session(SessionError::NotConnected) => true,
            Error::Session(SessionError::CommandFailed { source, .. }) => source.is_disconnect(),
            _ => false,
        }
    }
}

/// Transport layer errors (TCP dial, SSH protocol, authentication).
#[derive(Error, Debug)]
pub enum TransportError {
    /// Failed to connect to host
    #[error("Connection failed to {host}:{port}: {source}")]
    ConnectionFailed {
        host: String,
        port: u16,
        #[source]
        source: io::Error,
    },

    /// SSH handshake or protocol error
    #[error("SSH error: {0}")]
    Ssh(#[from] russh::Error),

    /// Authentication failed
    #[error("Authentication failed for user '{user}'")]
    AuthenticationFailed { user: String },

    /// Connection was closed unexpectedly
    #[error("Connection disconnected")]
    Disconnected,

    /// Operation timed out
    #[error("Operation timed out after {0:?}")]
    Timeout(Duration),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

/// Channel layer errors (prompt matching, reads).
#[derive(Error, Debug)]
pub enum ChannelError {
    /// The awaited text did not show up before the deadline.
    ///
    /// `partial` holds everything read up to that point.
    #[error("Timeout waiting for {pattern:?} after {timeout:?}")]
    PatternTimeout {
        pattern: String,
        timeout: Duration,
        partial: String,
    },
}

/// Session layer errors (login script, command execution).
#[derive(Error, Debug)]
pub enum SessionError {
    /// Session not connected
    #[error("Session not connected - call connect() first")]
    NotConnected,

    /// A login script step never saw the text it waits for
    #[error("Login failed waiting for {wait_for:?}: {source}")]
    LoginFailed {
        wait_for: String,
        #[source]
        source: Box<Error>,
    },

    /// Session configuration is incomplete
    #[error("Invalid session configuration: {message}")]
    InvalidConfig { message: String },

    /// Command execution failed
    #[error("Error executing {command:?}: {source}")]
    CommandFailed {
        command: String,
        #[source]
        source: Box<Error>,
    },
}

/// Platform/vendor driver errors.
#[derive(Error, Debug)]
pub enum PlatformError {
    /// No registered driver has this name
    #[error("Unknown switch platform: {name}")]
    UnknownPlatform { name: String },

    /// A driver with this name is already registered
    #[error("Platform already registered: {name}")]
    AlreadyRegistered { name: String },

    /// No driver recognised the device
    #[error("Unable to detect switch platform")]
    DetectionFailed,

    /// Every candidate command was rejected by the device
    #[error("Command '{command}' unsupported by switch")]
    Unsupported { command: String },

    /// A discovery query failed
    #[error("Failed to retrieve {what}: {source}")]
    QueryFailed {
        what: &'static str,
        #[source]
        source: Box<Error>,
    },
}

/// Reconciliation errors that abort a run.
#[derive(Error, Debug)]
pub enum ReconcileError {
    /// VLAN creation failed during sync
    #[error("Failed to create VLAN {vlan}: {reason}")]
    CreateVlan { vlan: String, reason: String },

    /// VLAN deletion failed during sync
    #[error("Failed to delete VLAN {vlan}: {reason}")]
    DeleteVlan { vlan: String, reason: String },
}

/// Result type alias using negev's Error.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    fn pattern_timeout() -> Error {
        ChannelError::PatternTimeout {
            pattern: "#".into(),
            timeout: Duration::from_secs(1),
            partial: String::new(),
        }
        .into()
    }

    #[test]
    fn test_timeout_through_command_failure() {
        let err: Error = SessionError::CommandFailed {
            command: "show vlan".into(),
            source: Box::new(pattern_timeout()),
        }
        .into();
        assert!(err.is_timeout());
        assert!(!err.is_disconnect());
    }

    #[test]
    fn test_disconnect_classification() {
        let err: Error = SessionError::CommandFailed {
            command: "show vlan".into(),
            source: Box::new(TransportError::Disconnected.into()),
        }
        .into();
        assert!(err.is_disconnect());
        assert!(Error::from(SessionError::NotConnected).is_disconnect());
        assert!(!pattern_timeout().is_disconnect());
        assert!(!Error::from(PlatformError::DetectionFailed).is_disconnect());
    }

    #[test]
    fn test_error_display() {
        let err = Error::from(ReconcileError::CreateVlan {
            vlan: "20".into(),
            reason: "% Invalid input".into(),
        });
        assert_eq!(
            err.to_string(),
            "Reconcile error: Failed to create VLAN 20: % Invalid input"
        );
    }
}
