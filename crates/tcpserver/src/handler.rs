//! The business-logic extension point.

use std::fmt;
use std::future::Future;

use crate::{BoxError, Context};

/// Turns one decoded request into one response.
///
/// The [`Context`] is cancelled when the server shuts down. Long-running
/// handlers should watch it; the server will not interrupt them otherwise.
///
/// Returning an error closes the connection without writing anything.
///
/// ```rust
/// use tcpserver::{BoxError, Context, Handler};
///
/// struct Upper;
///
/// impl Handler for Upper {
///     async fn handle(
///         &self,
///         _ctx: Context,
///         message: Vec<u8>,
///     ) -> Result<Vec<u8>, BoxError> {
///         Ok(message.to_ascii_uppercase())
///     }
/// }
/// ```
pub trait Handler: Send + Sync + 'static {
    /// Processes `message` and returns the bytes to send back.
    fn handle(
        &self,
        ctx: Context,
        message: Vec<u8>,
    ) -> impl Future<Output = Result<Vec<u8>, BoxError>> + Send;
}

/// The default handler: answers every request with the request itself.
#[derive(Debug, Clone, Copy, Default)]
pub struct Echo;

impl Handler for Echo {
    async fn handle(
        &self,
        _ctx: Context,
        message: Vec<u8>,
    ) -> Result<Vec<u8>, BoxError> {
        Ok(message)
    }
}

/// A [`Handler`] built from a closure. See [`handler_fn`].
#[derive(Clone)]
pub struct HandlerFn<F> {
    f: F,
}

/// Wraps an async closure as a [`Handler`].
///
/// ```rust
/// use tcpserver::{handler_fn, BoxError, Config};
///
/// let config = Config::new().handler(handler_fn(|_ctx, message: Vec<u8>| async move {
///     let mut reply = b"ok: ".to_vec();
///     reply.extend_from_slice(&message);
///     Ok::<_, BoxError>(reply)
/// }));
/// # drop(config);
/// ```
pub fn handler_fn<F, Fut>(f: F) -> HandlerFn<F>
where
    F: Fn(Context, Vec<u8>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Vec<u8>, BoxError>> + Send,
{
    HandlerFn { f }
}

impl<F, Fut> Handler for HandlerFn<F>
where
    F: Fn(Context, Vec<u8>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Vec<u8>, BoxError>> + Send,
{
    fn handle(
        &self,
        ctx: Context,
        message: Vec<u8>,
    ) -> impl Future<Output = Result<Vec<u8>, BoxError>> + Send {
        (self.f)(ctx, message)
    }
}

impl<F> fmt::Debug for HandlerFn<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlerFn").finish_non_exhaustive()
    }
}
