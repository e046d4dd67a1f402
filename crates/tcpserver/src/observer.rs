//! Lifecycle and per-connection events.
//!
//! The server does not log directly. Everything worth reporting goes
//! through the [`Observer`] supplied in [`Config`](crate::Config), so a
//! test can record events and a service can route them wherever it wants.
//! [`TracingObserver`] is the default and turns each event into a
//! `tracing` event.

use std::io;
use std::net::SocketAddr;

use crate::ConnectionError;

/// Something that happened inside the server.
#[derive(Debug)]
pub enum Event {
    /// A connection was accepted and handed to a worker.
    Accepted { peer: SocketAddr },

    /// The response was written to the peer.
    Responded { peer: SocketAddr },

    /// The peer hung up before a full message arrived. `partial` bytes
    /// were received and discarded. Not a failure.
    PeerClosed { peer: SocketAddr, partial: usize },

    /// Decoding, handling or encoding failed for one connection.
    ConnectionFailed {
        peer: SocketAddr,
        error: ConnectionError,
    },

    /// Shutting down the connection's write side failed.
    CloseFailed { peer: SocketAddr, error: io::Error },

    /// The accept loop saw the shutdown request and released the listener.
    Closing,

    /// Shutdown finished: no connection worker is left.
    Stopped,
}

/// Receives server [`Event`]s.
///
/// Called synchronously from the accept loop and from connection workers,
/// so implementations should be quick.
pub trait Observer: Send + Sync + 'static {
    fn observe(&self, event: &Event);
}

/// Reports events through `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingObserver;

impl Observer for TracingObserver {
    fn observe(&self, event: &Event) {
        match event {
            Event::Accepted { peer } => {
                tracing::debug!(%peer, "accepted connection");
            }
            Event::Responded { peer } => {
                tracing::debug!(%peer, "response sent");
            }
            Event::PeerClosed { peer, partial } => {
                tracing::info!(%peer, partial, "connection closed by client");
            }
            Event::ConnectionFailed { peer, error } => {
                tracing::error!(%peer, error = %error, "connection failed");
            }
            Event::CloseFailed { peer, error } => {
                tracing::debug!(%peer, error = %error, "failed to close connection");
            }
            Event::Closing => tracing::info!("server is closing"),
            Event::Stopped => tracing::info!("server stopped"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tracing_observer_handles_every_event() {
        let peer: SocketAddr = "127.0.0.1:4000".parse().unwrap();
        let events = [
            Event::Accepted { peer },
            Event::Responded { peer },
            Event::PeerClosed { peer, partial: 0 },
            Event::ConnectionFailed {
                peer,
                error: ConnectionError::Handler("bad".into()),
            },
            Event::CloseFailed {
                peer,
                error: io::Error::from(io::ErrorKind::NotConnected),
            },
            Event::Closing,
            Event::Stopped,
        ];
        for event in &events {
            TracingObserver.observe(event);
        }
    }
}
