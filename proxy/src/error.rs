//! Errors raised while handling one client connection.

use std::io;

use thiserror::Error;

/// What went wrong with a single proxied request.
///
/// The non-I/O variants each map to the status page the client was (or will
/// be) shown; I/O failures mean the conversation is already over and the
/// connection is simply closed.
#[derive(Debug, Error)]
pub enum ProxyError {
    /// The client or origin socket failed mid-conversation.
    #[error("i/o error: {0}")]
    Io(#[from] io::Error),

    /// The request could not be parsed. The client gets `400 Bad Request`.
    #[error("malformed request: {0}")]
    Malformed(&'static str),

    /// The request used something other than plain-HTTP GET. The client
    /// gets `501 Not Implemented`.
    #[error("unsupported request: {0}")]
    NotImplemented(&'static str),

    /// The origin host could not be resolved. The client gets
    /// `502 Bad Gateway` with the resolver's complaint.
    #[error("bad gateway: {0}")]
    Gateway(&'static str),
}

impl ProxyError {
    /// Returns the status line and body for the error page owed to the
    /// client, or `None` when the connection is just closed.
    pub fn status_page(&self) -> Option<(&'static str, &'static str)> {
        match self {
            ProxyError::Io(_) => None,
            ProxyError::Malformed(_) => {
                Some(("400 Bad Request", "Invalid request sent to proxy."))
            }
            ProxyError::NotImplemented(_) => {
                Some(("501 Not Implemented", "Invalid request sent to proxy."))
            }
            ProxyError::Gateway(msg) => Some(("502 Bad Gateway", *msg)),
        }
    }
}
