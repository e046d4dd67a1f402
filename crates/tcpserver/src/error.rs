//! Error types for the server.
//!
//! [`ServerError`] is what [`Server::serve`](crate::Server::serve) returns:
//! startup failures and accept-loop failures, both fatal for that call.
//! [`ConnectionError`] stays local to one connection worker and is only
//! ever reported through the [`Observer`](crate::Observer).

use std::io;

use tcpserver_codec::CodecError;

/// Error type returned by a [`Handler`](crate::Handler).
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Errors returned from [`Server::serve`](crate::Server::serve).
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// `serve` was called after `shutdown` began.
    #[error("server is already closing")]
    Closing,

    /// `serve` was called on a server that already bound its listener.
    #[error("server is already running")]
    AlreadyRunning,

    /// The listener could not be bound.
    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: io::Error,
    },

    /// The listener failed while accepting, outside of a shutdown.
    #[error("accept failed: {0}")]
    Accept(#[source] io::Error),
}

impl ServerError {
    /// Returns `true` for errors raised before the accept loop started.
    ///
    /// A server that failed to start cannot be started again once it was
    /// bound or closed; build a new one to retry.
    pub fn is_startup(&self) -> bool {
        matches!(self, Self::Closing | Self::AlreadyRunning | Self::Bind { .. })
    }
}

/// A failure while serving a single connection.
#[derive(Debug, thiserror::Error)]
pub enum ConnectionError {
    /// No message could be read from the connection.
    #[error("failed to decode message: {0}")]
    Decode(#[source] CodecError),

    /// The handler rejected the message. Nothing was written back.
    #[error("failed to process message: {0}")]
    Handler(#[source] BoxError),

    /// The response could not be written.
    #[error("failed to encode message: {0}")]
    Encode(#[source] CodecError),
}
