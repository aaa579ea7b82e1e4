use crate::storage::{ByteStream, Reassembler};
use crate::wire::TcpSeqNumber;

use super::{ReceiverMessage, SenderMessage, TcpConfig};

/// The receiving half of a TCP endpoint.
///
/// Segments go into a [`Reassembler`] after their sequence number is
/// translated to a stream offset; the application reads the reassembled
/// stream through [`stream_mut`]. The acknowledgment the remote needs next
/// is available from [`message`] at any time.
///
/// The SYN of the remote fixes the zero point of the sequence number space;
/// it and the FIN each occupy one sequence number around the payload bytes,
/// which is why the acknowledgment runs one (or two) ahead of the stream
/// offset.
///
/// [`Reassembler`]: ../../storage/struct.Reassembler.html
/// [`stream_mut`]: #method.stream_mut
/// [`message`]: #method.message
#[derive(Debug)]
pub struct Receiver {
    reassembler: Reassembler,
    zero_point: Option<TcpSeqNumber>,
}

impl Receiver {
    /// Create a receiver buffering at most `config.capacity` bytes.
    pub fn new(config: &TcpConfig) -> Receiver {
        Receiver {
            reassembler: Reassembler::new(ByteStream::new(config.capacity)),
            zero_point: None,
        }
    }

    /// Process one segment from the remote sender.
    pub fn receive(&mut self, message: SenderMessage) {
        if message.rst {
            self.reassembler.stream_mut().set_error();
        }
        if message.syn {
            self.zero_point = Some(message.seqno);
        }

        // Nothing to index the payload against before the SYN.
        let zero_point = match self.zero_point {
            Some(zero_point) => zero_point,
            None => return,
        };

        let checkpoint = self.reassembler.next_index() + 1;
        let abs_seqno = message.seqno.unwrap(zero_point, checkpoint);

        // The SYN occupies sequence number zero, so payload bytes sit one
        // behind their sequence number. A non-SYN segment claiming number
        // zero is nonsense and dropped here.
        let first_index = match (abs_seqno + u64::from(message.syn)).checked_sub(1) {
            Some(first_index) => first_index,
            None => return,
        };

        self.reassembler.insert(first_index, &message.payload, message.fin);
    }

    /// The acknowledgment and window to report to the remote sender.
    pub fn message(&self) -> ReceiverMessage {
        let stream = self.reassembler.stream();

        if stream.has_error() {
            return ReceiverMessage { ackno: None, window_size: 0, rst: true };
        }

        let window_size = stream.available_capacity().min(usize::from(u16::MAX)) as u16;
        let ackno = self.zero_point.map(|zero_point| {
            // One ahead of the stream for the SYN, one more once the FIN
            // made it through.
            let next = stream.bytes_pushed() + 1 + u64::from(stream.is_closed());
            TcpSeqNumber::wrap(next, zero_point)
        });

        ReceiverMessage { ackno, window_size, rst: false }
    }

    /// The number of bytes held back for missing earlier segments.
    pub fn bytes_pending(&self) -> usize {
        self.reassembler.bytes_pending()
    }

    /// The reassembled inbound stream.
    pub fn stream(&self) -> &ByteStream {
        self.reassembler.stream()
    }

    /// The reassembled inbound stream, mutably; the application reads from
    /// this end.
    pub fn stream_mut(&mut self) -> &mut ByteStream {
        self.reassembler.stream_mut()
    }
}
