//! Stream storage primitives.
//!
//! The TCP machinery of this crate is built on two byte containers: the
//! bounded pipe [`ByteStream`] carrying in-order data between a protocol
//! state machine and the application, and the [`Reassembler`] turning
//! out-of-order segments back into such a pipe.
//!
//! [`ByteStream`]: struct.ByteStream.html
//! [`Reassembler`]: struct.Reassembler.html

mod reassembler;
mod stream;

pub use self::reassembler::Reassembler;
pub use self::stream::ByteStream;
