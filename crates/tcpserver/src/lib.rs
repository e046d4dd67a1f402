//! # tcpserver
//!
//! A small framework for request/response TCP servers.
//!
//! The server owns the listener, the accept loop and graceful shutdown.
//! Everything else is pluggable:
//!
//! - a [`Decoder`] cuts one message out of the incoming bytes,
//! - a [`Handler`] turns that message into a response,
//! - an [`Encoder`] writes the response back,
//! - an [`Observer`] receives lifecycle and per-connection events.
//!
//! Each connection carries exactly one request and one response, then the
//! server closes it.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use tcpserver::prelude::*;
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), ServerError> {
//! let server = Config::new()
//!     .address("127.0.0.1:8080")
//!     .handler(handler_fn(|_ctx, message: Vec<u8>| async move {
//!         Ok::<_, BoxError>(message.to_ascii_uppercase())
//!     }))
//!     .build();
//!
//! server.serve().await
//! # }
//! ```

mod config;
mod connection;
mod context;
mod error;
mod handler;
mod observer;
mod server;
mod tracker;

pub use config::{Config, ListenerAddrFn, DEFAULT_ADDRESS};
pub use context::{CancelHandle, Context};
pub use error::{BoxError, ConnectionError, ServerError};
pub use handler::{handler_fn, Echo, Handler, HandlerFn};
pub use observer::{Event, Observer, TracingObserver};
pub use server::Server;
pub use tcpserver_codec::{CodecError, Decoder, Encoder, LineCodec};

pub mod prelude {
    //! Everything needed to configure and run a server.

    pub use crate::{
        handler_fn, BoxError, Config, Context, Decoder, Echo, Encoder,
        Handler, LineCodec, Server, ServerError,
    };
}
