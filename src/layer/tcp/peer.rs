use crate::time::Duration;

use super::{Receiver, ReceiverMessage, Sender, SenderMessage, TcpConfig};

/// Everything one endpoint tells the other in a single exchange: a segment
/// of the speaker's outbound stream together with its view of the reverse
/// direction.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Segment {
    /// The data-bearing half, consuming sequence numbers of the speaker's
    /// stream.
    pub message: SenderMessage,
    /// The acknowledgment for the reverse stream, once its SYN was seen.
    pub ack: ReceiverMessage,
}

/// A full TCP endpoint: one [`Sender`] and one [`Receiver`] coupled
/// back-to-back.
///
/// The peer stamps every outgoing segment with the receiver's current
/// acknowledgment and window, and splits every incoming segment between the
/// two halves. It adds no protocol machinery of its own; listening sockets
/// and connection teardown policy live with the embedding stack.
///
/// [`Sender`]: struct.Sender.html
/// [`Receiver`]: struct.Receiver.html
#[derive(Debug)]
pub struct Peer {
    sender: Sender,
    receiver: Receiver,
}

impl Peer {
    /// Create an endpoint for a fresh connection.
    pub fn new(config: &TcpConfig) -> Peer {
        Peer {
            sender: Sender::new(config),
            receiver: Receiver::new(config),
        }
    }

    /// Process one segment from the remote peer.
    ///
    /// The caller decides whether an acknowledgment is owed afterwards and
    /// solicits it with [`reply`] or the next [`push`].
    ///
    /// [`reply`]: #method.reply
    /// [`push`]: #method.push
    pub fn receive(&mut self, segment: Segment) {
        self.sender.receive(&segment.ack);
        self.receiver.receive(segment.message);
    }

    /// Transmit whatever the window admits of the outbound stream.
    pub fn push(&mut self, mut transmit: impl FnMut(&Segment)) {
        let ack = self.receiver.message();
        self.sender.push(|message| {
            transmit(&Segment { message: message.clone(), ack });
        });
    }

    /// Transmit a bare acknowledgment, without occupying sequence numbers.
    pub fn reply(&mut self, mut transmit: impl FnMut(&Segment)) {
        let segment = Segment {
            message: self.sender.empty_message(),
            ack: self.receiver.message(),
        };
        transmit(&segment);
    }

    /// Let `elapsed` time pass, retransmitting on timeout.
    pub fn tick(&mut self, elapsed: Duration, mut transmit: impl FnMut(&Segment)) {
        let ack = self.receiver.message();
        self.sender.tick(elapsed, |message| {
            transmit(&Segment { message: message.clone(), ack });
        });
    }

    /// Whether the connection can still make progress.
    ///
    /// False once either stream was aborted.
    pub fn active(&self) -> bool {
        !self.sender.stream().has_error() && !self.receiver.stream().has_error()
    }

    /// The sending half.
    pub fn sender(&self) -> &Sender {
        &self.sender
    }

    /// The sending half, mutably; its stream is where the application
    /// writes.
    pub fn sender_mut(&mut self) -> &mut Sender {
        &mut self.sender
    }

    /// The receiving half.
    pub fn receiver(&self) -> &Receiver {
        &self.receiver
    }

    /// The receiving half, mutably; its stream is where the application
    /// reads.
    pub fn receiver_mut(&mut self) -> &mut Receiver {
        &mut self.receiver
    }
}
