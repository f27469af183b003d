//! Error types for setup and exchange failures.
//!
//! All variants are fatal to the operation that produced them: setup errors
//! (resolution, connect, bind, listen) are never retried, and an I/O error
//! on the client aborts the exchange. Server-side per-connection failures
//! are logged where they occur and never surface here.

use std::io;

/// A fatal exchange error.
#[derive(Debug)]
pub enum Error {
    /// The host/port pair could not be resolved to any candidate address.
    Resolution(String, io::Error),
    /// Every resolved candidate was tried and none accepted a connection.
    Connect(String),
    /// Every resolved candidate was tried and none could be bound.
    Bind(String),
    /// A candidate was bound but the socket could not enter listening mode.
    Listen(io::Error),
    /// An I/O failure during the exchange itself.
    Io(io::Error),
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::Resolution(endpoint, e) => {
                write!(f, "failed to resolve '{}': {}", endpoint, e)
            }
            Error::Connect(endpoint) => {
                write!(f, "failed to connect to '{}': all candidates refused", endpoint)
            }
            Error::Bind(endpoint) => {
                write!(f, "failed to bind '{}': all candidates failed", endpoint)
            }
            Error::Listen(e) => write!(f, "failed to listen: {}", e),
            Error::Io(e) => write!(f, "i/o error: {}", e),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Resolution(_, e) | Error::Listen(e) | Error::Io(e) => Some(e),
            Error::Connect(_) | Error::Bind(_) => None,
        }
    }
}

impl From<io::Error> for Error {
    fn from(e: io::Error) -> Self {
        Error::Io(e)
    }
}
