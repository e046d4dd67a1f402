//! Server configuration and defaults.

use std::fmt;
use std::net::SocketAddr;
use std::sync::Arc;

use tcpserver_codec::{Decoder, Encoder, LineCodec};

use crate::observer::{Observer, TracingObserver};
use crate::{Echo, Handler, Server};

/// Address used when none is configured: an ephemeral port on loopback.
pub const DEFAULT_ADDRESS: &str = "127.0.0.1:0";

/// Callback receiving the bound address before the accept loop starts.
pub type ListenerAddrFn = Arc<dyn Fn(SocketAddr) + Send + Sync>;

/// Configuration for a [`Server`].
///
/// Every option has a default, so `Config::new().build()` is a working
/// newline echo server on a random loopback port. Replacing the handler or
/// codec changes the corresponding type parameter.
///
/// | option      | default                                   |
/// |-------------|-------------------------------------------|
/// | address     | `127.0.0.1:0`                             |
/// | handler     | [`Echo`]                                  |
/// | decoder     | [`LineCodec`] (`\n`, delimiter kept)      |
/// | encoder     | [`LineCodec`] (bytes written verbatim)    |
/// | on_listen   | logs `server listening` at info           |
/// | observer    | [`TracingObserver`]                       |
///
/// ```rust
/// use tcpserver::{Config, LineCodec};
///
/// let server = Config::new()
///     .address("127.0.0.1:7000")
///     .codec(LineCodec::with_delimiter(b';'))
///     .build();
/// assert!(server.addr().is_none());
/// ```
pub struct Config<H = Echo, D = LineCodec, E = LineCodec> {
    pub(crate) address: String,
    pub(crate) handler: H,
    pub(crate) decoder: D,
    pub(crate) encoder: E,
    pub(crate) on_listen: ListenerAddrFn,
    pub(crate) observer: Arc<dyn Observer>,
}

impl Config {
    /// Creates a configuration with every default in place.
    pub fn new() -> Self {
        Self {
            address: DEFAULT_ADDRESS.to_string(),
            handler: Echo,
            decoder: LineCodec::default(),
            encoder: LineCodec::default(),
            on_listen: Arc::new(log_listening),
            observer: Arc::new(TracingObserver),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}

impl<H, D, E> Config<H, D, E> {
    /// Sets the TCP address to listen on. Port 0 picks a free port.
    pub fn address(mut self, address: impl Into<String>) -> Self {
        self.address = address.into();
        self
    }

    /// Returns the configured listen address.
    pub fn bind_address(&self) -> &str {
        &self.address
    }

    /// Replaces the handler.
    pub fn handler<H2: Handler>(self, handler: H2) -> Config<H2, D, E> {
        Config {
            address: self.address,
            handler,
            decoder: self.decoder,
            encoder: self.encoder,
            on_listen: self.on_listen,
            observer: self.observer,
        }
    }

    /// Replaces the decoder used for incoming messages.
    pub fn decoder<D2: Decoder>(self, decoder: D2) -> Config<H, D2, E> {
        Config {
            address: self.address,
            handler: self.handler,
            decoder,
            encoder: self.encoder,
            on_listen: self.on_listen,
            observer: self.observer,
        }
    }

    /// Replaces the encoder used for responses.
    pub fn encoder<E2: Encoder>(self, encoder: E2) -> Config<H, D, E2> {
        Config {
            address: self.address,
            handler: self.handler,
            decoder: self.decoder,
            encoder,
            on_listen: self.on_listen,
            observer: self.observer,
        }
    }

    /// Uses one value as both decoder and encoder.
    pub fn codec<C>(self, codec: C) -> Config<H, C, C>
    where
        C: Decoder + Encoder + Clone,
    {
        self.decoder(codec.clone()).encoder(codec)
    }

    /// Sets the callback that receives the bound address.
    ///
    /// It runs synchronously inside `serve`, before the first accept.
    pub fn on_listen<F>(mut self, on_listen: F) -> Self
    where
        F: Fn(SocketAddr) + Send + Sync + 'static,
    {
        self.on_listen = Arc::new(on_listen);
        self
    }

    /// Sets the observer that receives server events.
    pub fn observer<O: Observer>(mut self, observer: O) -> Self {
        self.observer = Arc::new(observer);
        self
    }
}

impl<H: Handler, D: Decoder, E: Encoder> Config<H, D, E> {
    /// Builds a [`Server`] from this configuration.
    pub fn build(self) -> Server<H, D, E> {
        Server::new(self)
    }
}

impl<H, D, E> fmt::Debug for Config<H, D, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("address", &self.address)
            .finish_non_exhaustive()
    }
}

fn log_listening(addr: SocketAddr) {
    tracing::info!(%addr, "server listening");
}
