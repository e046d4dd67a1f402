//! Per-connection worker: decode, handle, encode, close.
//!
//! Each accepted connection gets its own Tokio task running
//! [`Pipeline::serve`]. The flow is a single pass:
//!   1. Decode one message (peer hang-up here is benign)
//!   2. Hand it to the handler with the server's context
//!   3. Encode the response
//!   4. Close the write side, whatever happened above
//!
//! There is no loop: one connection carries one request and one response.

use std::net::SocketAddr;
use std::sync::Arc;

use tcpserver_codec::{Decoder, Encoder};
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};

use crate::observer::{Event, Observer};
use crate::{ConnectionError, Context, Handler};

/// Everything a connection worker needs, shared read-only across workers.
pub(crate) struct Pipeline<H, D, E> {
    pub(crate) handler: H,
    pub(crate) decoder: D,
    pub(crate) encoder: E,
    pub(crate) observer: Arc<dyn Observer>,
}

impl<H, D, E> Pipeline<H, D, E>
where
    H: Handler,
    D: Decoder,
    E: Encoder,
{
    /// Serves one connection from first byte to close.
    pub(crate) async fn serve<S>(&self, mut stream: S, peer: SocketAddr, ctx: Context)
    where
        S: AsyncRead + AsyncWrite + Unpin + Send,
    {
        let event = match self.exchange(&mut stream, ctx).await {
            Ok(()) => Event::Responded { peer },
            Err(ConnectionError::Decode(error)) if error.is_eof() => Event::PeerClosed {
                peer,
                partial: error.partial_len(),
            },
            Err(error) => Event::ConnectionFailed { peer, error },
        };
        self.observer.observe(&event);

        // Dropping the stream would close it too; shutting down the write
        // side first lets the peer see a clean EOF.
        if let Err(error) = stream.shutdown().await {
            self.observer.observe(&Event::CloseFailed { peer, error });
        }
    }

    async fn exchange<S>(&self, stream: &mut S, ctx: Context) -> Result<(), ConnectionError>
    where
        S: AsyncRead + AsyncWrite + Unpin + Send,
    {
        let message = self
            .decoder
            .decode(stream)
            .await
            .map_err(ConnectionError::Decode)?;

        let response = self
            .handler
            .handle(ctx, message)
            .await
            .map_err(ConnectionError::Handler)?;

        self.encoder
            .encode(stream, &response)
            .await
            .map_err(ConnectionError::Encode)
    }
}
