//! The TCP layer.
//!
//! One TCP endpoint is a pair of independent state machines sharing a
//! connection: a [`Receiver`] turning incoming segments back into an ordered
//! byte stream and telling the remote how far it got, and a [`Sender`]
//! cutting the outgoing byte stream into segments, keeping them until they
//! are acknowledged and retransmitting on timeout.
//!
//! The two halves communicate with the remote end through plain in-memory
//! messages; putting those on the wire is the embedding stack's business.
//! Each [`SenderMessage`] occupies as many sequence numbers as it carries
//! payload bytes, plus one for each of the SYN and FIN flags. A
//! [`ReceiverMessage`] carries no sequence numbers of its own, only the
//! cumulative acknowledgment and the advertised window.
//!
//! [`Peer`] couples one half of each direction into a full endpoint.
//!
//! [`Receiver`]: struct.Receiver.html
//! [`Sender`]: struct.Sender.html
//! [`SenderMessage`]: struct.SenderMessage.html
//! [`ReceiverMessage`]: struct.ReceiverMessage.html
//! [`Peer`]: struct.Peer.html
use crate::wire::TcpSeqNumber;

mod config;
mod peer;
mod receiver;
mod sender;

pub use self::config::TcpConfig;
pub use self::peer::{Peer, Segment};
pub use self::receiver::Receiver;
pub use self::sender::Sender;

/// A message from the sending to the receiving side of a stream: one
/// segment.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SenderMessage {
    /// The sequence number of the first element of the segment.
    pub seqno: TcpSeqNumber,
    /// Whether the segment begins the stream.
    pub syn: bool,
    /// The bytes carried by the segment.
    pub payload: Vec<u8>,
    /// Whether the segment ends the stream.
    pub fin: bool,
    /// Whether the connection suffered an abort.
    pub rst: bool,
}

impl SenderMessage {
    /// The number of sequence numbers the segment occupies.
    pub fn sequence_length(&self) -> u64 {
        u64::from(self.syn) + self.payload.len() as u64 + u64::from(self.fin)
    }
}

/// A message from the receiving to the sending side of a stream: an
/// acknowledgment and a window.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReceiverMessage {
    /// The next sequence number the receiver is waiting for; absent until
    /// the stream's SYN arrived.
    pub ackno: Option<TcpSeqNumber>,
    /// How many more sequence numbers the receiver is willing to accept.
    pub window_size: u16,
    /// Whether the connection suffered an abort.
    pub rst: bool,
}
