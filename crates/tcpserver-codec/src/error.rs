//! Error types for the codec layer.
//!
//! A decoder distinguishes a peer that went away (benign, nothing to
//! process) from a broken stream. The server relies on [`CodecError::is_eof`]
//! to tell the two apart.

use std::io;

/// Errors that can occur while framing messages on a byte stream.
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    /// The peer closed the stream before sending a single byte.
    #[error("connection closed by peer")]
    Closed,

    /// The peer closed the stream in the middle of a message, before the
    /// delimiter arrived. `len` bytes were read and discarded.
    #[error("connection closed after {len} bytes without a delimiter")]
    Truncated { len: usize },

    /// Reading from or writing to the stream failed.
    #[error("i/o error: {0}")]
    Io(#[from] io::Error),
}

impl CodecError {
    /// Returns `true` when the error only means the peer hung up.
    ///
    /// Decoders built on `read_exact` surface a hang-up as an
    /// [`io::ErrorKind::UnexpectedEof`], which counts too.
    pub fn is_eof(&self) -> bool {
        match self {
            Self::Closed | Self::Truncated { .. } => true,
            Self::Io(err) => err.kind() == io::ErrorKind::UnexpectedEof,
        }
    }

    /// Bytes of an unfinished message the peer sent before hanging up.
    ///
    /// Only [`CodecError::Truncated`] knows; every other variant reports 0.
    pub fn partial_len(&self) -> usize {
        match self {
            Self::Truncated { len } => *len,
            _ => 0,
        }
    }
}
