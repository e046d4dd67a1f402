//! Message framing for tcpserver.
//!
//! A TCP connection is just bytes. This crate defines how one message is
//! cut out of those bytes and how a response is written back:
//!
//! - [`Decoder`]: pull one complete message off a stream.
//! - [`Encoder`]: write one response onto a stream.
//! - [`LineCodec`]: the default for both, reading up to and including a
//!   delimiter byte and writing bytes verbatim.
//! - [`CodecError`]: what can go wrong while doing either.
//!
//! ```text
//! TcpStream → Decoder → message → Handler → response → Encoder → TcpStream
//! ```

mod codec;
mod error;

pub use codec::{Decoder, Encoder, LineCodec, DEFAULT_DELIMITER};
pub use error::CodecError;
