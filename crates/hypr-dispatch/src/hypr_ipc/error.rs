//! Error types for Hyprland IPC operations

use std::path::PathBuf;
use thiserror::Error;

use crate::dispatcher::DispatchError;

/// Errors that can occur while listening to the Hyprland event socket
#[derive(Debug, Error)]
pub enum HyprError {
    /// The HYPRLAND_INSTANCE_SIGNATURE environment variable is not set
    #[error("HYPRLAND_INSTANCE_SIGNATURE environment variable not set - is Hyprland running?")]
    SignatureNotSet,

    /// The socket path does not exist
    #[error("Hyprland event socket not found at {path}")]
    SocketNotFound { path: PathBuf },

    /// Failed to connect to the event socket
    #[error("Failed to connect to Hyprland event socket at {path}: {source}")]
    ConnectionFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Failed to read from the event socket
    #[error("Failed to read from Hyprland event socket: {0}")]
    ReadFailed(#[source] std::io::Error),

    /// The compositor closed the connection (zero-byte read)
    #[error("Connection to Hyprland event socket closed")]
    ConnectionClosed,

    /// A registered handler returned an error
    #[error(transparent)]
    Handler(#[from] DispatchError),

    /// A registered handler panicked
    #[error("Handler for '{kind}' panicked: {message}")]
    HandlerPanicked { kind: String, message: String },

    /// Maximum reconnection attempts exceeded
    #[error("Failed to connect to Hyprland event socket after {attempts} attempts")]
    MaxRetriesExceeded { attempts: u32 },
}

impl HyprError {
    /// Whether this error means the connection is gone and must be re-established
    pub fn is_disconnect(&self) -> bool {
        match self {
            Self::ConnectionClosed => true,
            Self::ReadFailed(e) => matches!(
                e.kind(),
                std::io::ErrorKind::ConnectionReset
                    | std::io::ErrorKind::ConnectionAborted
                    | std::io::ErrorKind::BrokenPipe
            ),
            _ => false,
        }
    }
}

/// Reasons a protocol line is dropped instead of becoming an [`crate::Event`]
///
/// These are never surfaced past the listener; malformed lines are noise.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FrameError {
    #[error("line has no '>>' delimiter: {line:?}")]
    MissingDelimiter { line: String },

    #[error("line has an empty event kind: {line:?}")]
    EmptyKind { line: String },

    #[error("line is not valid UTF-8")]
    InvalidUtf8,
}
