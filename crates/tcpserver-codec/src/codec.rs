//! Decoder/Encoder traits and the default [`LineCodec`].
//!
//! The server never looks inside a message. It asks a [`Decoder`] to pull
//! exactly one message off the connection and an [`Encoder`] to put the
//! response back. Swapping framing (length prefixes, a different delimiter,
//! a binary header) means swapping these two values, nothing else.

use std::future::Future;

use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};

use crate::CodecError;

/// Extracts one complete message from a byte stream.
///
/// Implementations are shared by every connection worker, so they must be
/// `Send + Sync + 'static` and must not keep per-connection state.
pub trait Decoder: Send + Sync + 'static {
    /// Reads the next message from `reader`.
    ///
    /// # Errors
    /// [`CodecError::Closed`] or [`CodecError::Truncated`] when the peer
    /// hangs up, [`CodecError::Io`] when the stream itself fails. An
    /// `Io` error of kind `UnexpectedEof` is also read as a hang-up.
    fn decode<R>(
        &self,
        reader: &mut R,
    ) -> impl Future<Output = Result<Vec<u8>, CodecError>> + Send
    where
        R: AsyncRead + Unpin + Send;
}

/// Serializes a response message onto a byte stream.
pub trait Encoder: Send + Sync + 'static {
    /// Writes `message` to `writer` and flushes it.
    ///
    /// # Errors
    /// Returns [`CodecError::Io`] if the write or flush fails.
    fn encode<W>(
        &self,
        writer: &mut W,
        message: &[u8],
    ) -> impl Future<Output = Result<(), CodecError>> + Send
    where
        W: AsyncWrite + Unpin + Send;
}

// ---------------------------------------------------------------------------
// LineCodec
// ---------------------------------------------------------------------------

/// The delimiter used by [`LineCodec::default`].
pub const DEFAULT_DELIMITER: u8 = b'\n';

/// Delimiter-terminated framing.
///
/// Decoding reads up to and including the first delimiter byte and returns
/// the message *with* the delimiter. Encoding writes the bytes verbatim and
/// adds nothing, so a handler answering over this codec has to append the
/// delimiter itself if the client expects one.
///
/// ```rust
/// use tcpserver_codec::{Decoder, LineCodec};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let codec = LineCodec::default();
/// let mut input: &[u8] = b"ping\nrest";
/// let message = codec.decode(&mut input).await.unwrap();
/// assert_eq!(message, b"ping\n");
/// # }
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineCodec {
    delimiter: u8,
}

impl LineCodec {
    /// Creates a codec that splits on `\n`.
    pub fn new() -> Self {
        Self::with_delimiter(DEFAULT_DELIMITER)
    }

    /// Creates a codec that splits on `delimiter`.
    pub fn with_delimiter(delimiter: u8) -> Self {
        Self { delimiter }
    }

    /// Returns the delimiter byte.
    pub fn delimiter(&self) -> u8 {
        self.delimiter
    }
}

impl Default for LineCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl Decoder for LineCodec {
    async fn decode<R>(&self, reader: &mut R) -> Result<Vec<u8>, CodecError>
    where
        R: AsyncRead + Unpin + Send,
    {
        // The buffered reader may pull bytes past the delimiter. They are
        // dropped with it; a connection carries a single message.
        let mut reader = BufReader::new(reader);
        let mut message = Vec::new();
        reader.read_until(self.delimiter, &mut message).await?;

        match message.last() {
            None => Err(CodecError::Closed),
            Some(&last) if last != self.delimiter => {
                Err(CodecError::Truncated { len: message.len() })
            }
            Some(_) => Ok(message),
        }
    }
}

impl Encoder for LineCodec {
    async fn encode<W>(
        &self,
        writer: &mut W,
        message: &[u8],
    ) -> Result<(), CodecError>
    where
        W: AsyncWrite + Unpin + Send,
    {
        writer.write_all(message).await?;
        writer.flush().await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_decode_returns_message_with_delimiter() {
        let codec = LineCodec::default();
        let mut input: &[u8] = b"hello\n";
        let message = codec.decode(&mut input).await.unwrap();
        assert_eq!(message, b"hello\n");
    }

    #[tokio::test]
    async fn test_decode_stops_at_first_delimiter() {
        let codec = LineCodec::default();
        let mut input: &[u8] = b"first\nsecond\n";
        let message = codec.decode(&mut input).await.unwrap();
        assert_eq!(message, b"first\n");
    }

    #[tokio::test]
    async fn test_decode_lone_delimiter() {
        let codec = LineCodec::default();
        let mut input: &[u8] = b"\n";
        assert_eq!(codec.decode(&mut input).await.unwrap(), b"\n");
    }

    #[tokio::test]
    async fn test_decode_keeps_arbitrary_bytes() {
        // Anything but the delimiter passes through untouched, including
        // carriage returns and non-UTF-8 bytes.
        let codec = LineCodec::default();
        let raw = [0x00, 0xff, b'\r', 0x80, b'x', b'\n'];
        let mut input: &[u8] = &raw;
        assert_eq!(codec.decode(&mut input).await.unwrap(), raw);
    }

    #[tokio::test]
    async fn test_decode_empty_stream_is_closed() {
        let codec = LineCodec::default();
        let mut input: &[u8] = b"";
        let err = codec.decode(&mut input).await.unwrap_err();
        assert!(matches!(err, CodecError::Closed));
    }

    #[tokio::test]
    async fn test_decode_without_delimiter_is_truncated() {
        let codec = LineCodec::default();
        let mut input: &[u8] = b"partial";
        let err = codec.decode(&mut input).await.unwrap_err();
        assert!(matches!(err, CodecError::Truncated { len: 7 }));
        assert!(err.is_eof());
    }

    #[tokio::test]
    async fn test_custom_delimiter() {
        let codec = LineCodec::with_delimiter(b';');
        assert_eq!(codec.delimiter(), b';');
        let mut input: &[u8] = b"a\nb;c;";
        assert_eq!(codec.decode(&mut input).await.unwrap(), b"a\nb;");
    }

    #[tokio::test]
    async fn test_encode_writes_verbatim() {
        let codec = LineCodec::default();
        let mut out = Vec::new();
        codec.encode(&mut out, b"no newline").await.unwrap();
        assert_eq!(out, b"no newline");
    }

    #[tokio::test]
    async fn test_decode_reads_from_duplex_stream() {
        let codec = LineCodec::default();
        let (mut client, mut server) = tokio::io::duplex(64);

        let writer = tokio::spawn(async move {
            client.write_all(b"he").await.unwrap();
            client.write_all(b"llo\nignored").await.unwrap();
        });

        let message = codec.decode(&mut server).await.unwrap();
        assert_eq!(message, b"hello\n");
        writer.await.unwrap();
    }

    #[test]
    fn test_default_delimiter_is_newline() {
        assert_eq!(LineCodec::default().delimiter(), b'\n');
        assert_eq!(LineCodec::new(), LineCodec::with_delimiter(b'\n'));
    }
}
