//! The [`Server`]: listener ownership, accept loop and graceful shutdown.
//!
//! ```text
//! Created ──serve()──▶ Running ──shutdown()──▶ Closing ──drained──▶ Stopped
//! ```
//!
//! `serve` binds once and runs the accept loop on the calling task; every
//! accepted connection is spawned as its own worker. `shutdown` can be
//! called from any task, any number of times, before or after `serve`.

use std::net::{SocketAddr, TcpListener as StdTcpListener};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tcpserver_codec::{Decoder, Encoder, LineCodec};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::watch;

use crate::config::{Config, ListenerAddrFn};
use crate::connection::Pipeline;
use crate::context::CancelHandle;
use crate::observer::Event;
use crate::tracker::InFlight;
use crate::{Echo, Handler, ServerError};

/// What the server knows about its listener.
///
/// The listener itself is owned by the accept loop. The slot only records
/// that one was bound, where, and whether it has been released yet.
enum ListenerSlot {
    Unbound,
    Bound {
        addr: SocketAddr,
        released: watch::Receiver<bool>,
    },
}

/// Flips the slot's `released` flag when the accept loop lets go of the
/// listener, however `serve` exits.
struct ReleaseSignal(watch::Sender<bool>);

impl Drop for ReleaseSignal {
    fn drop(&mut self) {
        self.0.send_replace(true);
    }
}

/// A TCP server running one decode → handle → encode pass per connection.
///
/// Share it behind an `Arc` to call [`serve`](Self::serve) on one task and
/// [`shutdown`](Self::shutdown) from another:
///
/// ```rust,no_run
/// use std::sync::Arc;
///
/// use tcpserver::Config;
///
/// # #[tokio::main]
/// # async fn main() {
/// let server = Arc::new(Config::new().address("127.0.0.1:8080").build());
///
/// let serving = tokio::spawn({
///     let server = Arc::clone(&server);
///     async move { server.serve().await }
/// });
///
/// tokio::signal::ctrl_c().await.unwrap();
/// server.shutdown().await;
/// serving.await.unwrap().unwrap();
/// # }
/// ```
pub struct Server<H = Echo, D = LineCodec, E = LineCodec> {
    address: String,
    pipeline: Arc<Pipeline<H, D, E>>,
    on_listen: ListenerAddrFn,
    closing: AtomicBool,
    listener: Mutex<ListenerSlot>,
    cancel: CancelHandle,
    in_flight: InFlight,
}

impl<H, D, E> Server<H, D, E>
where
    H: Handler,
    D: Decoder,
    E: Encoder,
{
    /// Creates a server from `config`. Nothing is bound until
    /// [`serve`](Self::serve).
    pub fn new(config: Config<H, D, E>) -> Self {
        Self {
            address: config.address,
            pipeline: Arc::new(Pipeline {
                handler: config.handler,
                decoder: config.decoder,
                encoder: config.encoder,
                observer: config.observer,
            }),
            on_listen: config.on_listen,
            closing: AtomicBool::new(false),
            listener: Mutex::new(ListenerSlot::Unbound),
            cancel: CancelHandle::new(),
            in_flight: InFlight::new(),
        }
    }

    /// Binds the listener and accepts connections until shutdown.
    ///
    /// Returns `Ok(())` once [`shutdown`](Self::shutdown) stops the loop.
    ///
    /// # Errors
    /// - [`ServerError::Closing`] if shutdown already started.
    /// - [`ServerError::AlreadyRunning`] if a listener was bound before.
    /// - [`ServerError::Bind`] if the address cannot be bound.
    /// - [`ServerError::Accept`] if accepting fails outside of a shutdown.
    pub async fn serve(&self) -> Result<(), ServerError> {
        // Declared before the listener so it drops after it: by the time
        // `released` flips, the socket is closed.
        let (released_tx, released_rx) = watch::channel(false);
        let _release = ReleaseSignal(released_tx);

        let (listener, addr) = {
            let mut slot = self.lock_listener();
            // Checked under the lock: a concurrent shutdown either sees the
            // bound slot and waits for it, or we see the flag here.
            if self.is_closing() {
                return Err(ServerError::Closing);
            }
            if matches!(*slot, ListenerSlot::Bound { .. }) {
                return Err(ServerError::AlreadyRunning);
            }

            let listener = bind(&self.address).map_err(|source| ServerError::Bind {
                addr: self.address.clone(),
                source,
            })?;
            let addr = listener.local_addr().map_err(|source| ServerError::Bind {
                addr: self.address.clone(),
                source,
            })?;

            *slot = ListenerSlot::Bound {
                addr,
                released: released_rx,
            };
            (listener, addr)
        };

        (self.on_listen)(addr);

        let ctx = self.cancel.context();
        loop {
            let accepted = tokio::select! {
                biased;
                () = ctx.cancelled() => None,
                accepted = listener.accept() => Some(accepted),
            };

            let (stream, peer) = match accepted {
                Some(Ok(accepted)) => accepted,
                Some(Err(err)) if !self.is_closing() => {
                    return Err(ServerError::Accept(err));
                }
                Some(Err(_)) | None => {
                    self.pipeline.observer.observe(&Event::Closing);
                    return Ok(());
                }
            };

            self.spawn_worker(stream, peer);
        }
    }

    fn spawn_worker(&self, stream: TcpStream, peer: SocketAddr) {
        // Counted before the task exists so shutdown can never miss it.
        let guard = self.in_flight.track();
        let pipeline = Arc::clone(&self.pipeline);
        let ctx = self.cancel.context();

        pipeline.observer.observe(&Event::Accepted { peer });
        tokio::spawn(async move {
            let _guard = guard;
            pipeline.serve(stream, peer, ctx).await;
        });
    }

    /// Stops accepting, cancels the shared context and waits for every
    /// connection worker to finish.
    ///
    /// Safe to call concurrently and repeatedly; each call returns only
    /// once the server has drained. A handler that ignores its context keeps
    /// `shutdown` waiting for as long as it runs, so callers needing a bound
    /// should wrap this in their own timeout.
    pub async fn shutdown(&self) {
        let first = !self.closing.swap(true, Ordering::AcqRel);
        if first {
            // Wakes the accept loop, which drops the listener, and tells
            // in-flight handlers to wrap up.
            self.cancel.cancel();
        }

        let mut released = match &*self.lock_listener() {
            ListenerSlot::Bound { released, .. } => released.clone(),
            ListenerSlot::Unbound => return,
        };
        let _ = released.wait_for(|released| *released).await;

        self.in_flight.wait_idle().await;
        if first {
            self.pipeline.observer.observe(&Event::Stopped);
        }
    }

    /// Returns the bound address, or `None` when the server is not
    /// listening: before `serve`, after shutdown began, or once the accept
    /// loop has exited.
    pub fn addr(&self) -> Option<SocketAddr> {
        if self.is_closing() {
            return None;
        }
        match &*self.lock_listener() {
            ListenerSlot::Bound { addr, released } if !*released.borrow() => Some(*addr),
            _ => None,
        }
    }

    /// Returns `true` once [`shutdown`](Self::shutdown) has been called.
    pub fn is_closing(&self) -> bool {
        self.closing.load(Ordering::Acquire)
    }

    /// Number of connection workers currently running.
    pub fn in_flight(&self) -> usize {
        self.in_flight.get()
    }

    fn lock_listener(&self) -> MutexGuard<'_, ListenerSlot> {
        // The slot is only ever assigned whole, so a poisoned lock still
        // holds a consistent value.
        self.listener.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Binds synchronously so the listener slot can be claimed and filled
/// under one lock, then hands the socket to Tokio.
fn bind(address: &str) -> std::io::Result<TcpListener> {
    let listener = StdTcpListener::bind(address)?;
    listener.set_nonblocking(true)?;
    TcpListener::from_std(listener)
}
