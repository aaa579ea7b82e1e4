use std::collections::BTreeMap;

use crate::storage::ByteStream;
use crate::time::Duration;
use crate::wire::TcpSeqNumber;

use super::{ReceiverMessage, SenderMessage, TcpConfig};

/// The retransmission timer of a sender.
///
/// A pure data object: it only moves when [`advance`] is called, and merely
/// answers whether the current timeout has been reached. The timeout doubles
/// with each loss-driven backoff and snaps back to its initial value on
/// acknowledged progress.
///
/// [`advance`]: #method.advance
#[derive(Debug)]
struct RetransmitTimer {
    initial_rto: Duration,
    rto: Duration,
    elapsed: Duration,
    running: bool,
}

impl RetransmitTimer {
    fn new(initial_rto: Duration) -> RetransmitTimer {
        RetransmitTimer {
            initial_rto,
            rto: initial_rto,
            elapsed: Duration::ZERO,
            running: false,
        }
    }

    fn start(&mut self) {
        self.running = true;
        self.elapsed = Duration::ZERO;
    }

    fn stop(&mut self) {
        self.running = false;
        self.elapsed = Duration::ZERO;
    }

    fn is_running(&self) -> bool {
        self.running
    }

    fn reset_rto(&mut self) {
        self.rto = self.initial_rto;
    }

    fn double_rto(&mut self) {
        self.rto *= 2;
    }

    fn advance(&mut self, elapsed: Duration) {
        self.elapsed += elapsed;
    }

    fn expired(&self) -> bool {
        self.running && self.elapsed >= self.rto
    }
}

/// The sending half of a TCP endpoint.
///
/// The application writes into the outbound stream (see [`stream_mut`]);
/// [`push`] cuts whatever the remote's advertised window admits into
/// segments and hands them to a transmit callback. Every segment stays in an
/// ordered map of outstanding data until the cumulative acknowledgment
/// covers it; on timeout the earliest one is retransmitted.
///
/// When the remote closes its window entirely, [`push`] still emits a
/// single-byte probe so that a window reopening is discovered without the
/// remote's help. Such probes live under the initial timeout: stalling on a
/// full receiver is not a loss signal, so the backoff and the
/// [`consecutive_retransmissions`] count stay untouched.
///
/// [`stream_mut`]: #method.stream_mut
/// [`push`]: #method.push
/// [`consecutive_retransmissions`]: #method.consecutive_retransmissions
#[derive(Debug)]
pub struct Sender {
    input: ByteStream,
    isn: TcpSeqNumber,
    max_payload: usize,
    timer: RetransmitTimer,
    /// Transmitted but unacknowledged segments, keyed by absolute seqno.
    outstanding: BTreeMap<u64, SenderMessage>,
    /// The next absolute sequence number to emit, counting SYN and FIN.
    next_seqno: u64,
    /// The highest cumulative acknowledgment received.
    acked: u64,
    /// The window size last advertised by the remote.
    window: u16,
    retransmissions: u64,
    syn_sent: bool,
    fin_sent: bool,
}

impl Sender {
    /// Create a sender for a fresh stream.
    pub fn new(config: &TcpConfig) -> Sender {
        Sender {
            input: ByteStream::new(config.capacity),
            isn: config.isn,
            max_payload: config.max_payload,
            timer: RetransmitTimer::new(config.initial_rto),
            outstanding: BTreeMap::new(),
            next_seqno: 0,
            acked: 0,
            // Assume one free slot for the SYN until the remote says
            // otherwise.
            window: 1,
            retransmissions: 0,
            syn_sent: false,
            fin_sent: false,
        }
    }

    /// Cut segments from the outbound stream while the window has room, and
    /// transmit them.
    pub fn push(&mut self, mut transmit: impl FnMut(&SenderMessage)) {
        loop {
            // A closed window still admits one probing sequence number.
            let window = u64::from(self.window).max(1);
            let room = window.saturating_sub(self.in_flight());
            if room == 0 {
                return;
            }

            let syn = !self.syn_sent;
            let payload_room = (room - u64::from(syn)).min(self.max_payload as u64) as usize;
            let take = payload_room.min(self.input.bytes_buffered());
            let payload = self.input.peek()[..take].to_vec();
            self.input.pop(take);

            // The FIN rides along only if the stream is exhausted for good
            // and the window has a slot left for it.
            let fin = !self.fin_sent
                && self.input.is_closed()
                && self.input.bytes_buffered() == 0
                && u64::from(syn) + take as u64 != room;

            let message = SenderMessage {
                seqno: TcpSeqNumber::wrap(self.next_seqno, self.isn),
                syn,
                payload,
                fin,
                rst: self.input.has_error(),
            };
            let length = message.sequence_length();
            if length == 0 {
                return;
            }

            self.syn_sent |= syn;
            self.fin_sent |= fin;
            self.outstanding.insert(self.next_seqno, message.clone());
            self.next_seqno += length;

            transmit(&message);
            if !self.timer.is_running() {
                self.timer.start();
            }

            if self.window == 0 {
                // One probe at a time.
                return;
            }
        }
    }

    /// An empty segment carrying the current sequence number, fit for
    /// acknowledging the remote without occupying window space.
    pub fn empty_message(&self) -> SenderMessage {
        SenderMessage {
            seqno: TcpSeqNumber::wrap(self.next_seqno, self.isn),
            rst: self.input.has_error(),
            ..SenderMessage::default()
        }
    }

    /// Process an acknowledgment from the remote receiver.
    pub fn receive(&mut self, message: &ReceiverMessage) {
        if message.rst {
            self.input.set_error();
            return;
        }

        let ack = match message.ackno {
            Some(ackno) => {
                let ack = ackno.unwrap(self.isn, self.acked);
                if ack > self.next_seqno {
                    // Acknowledges data that was never sent.
                    return;
                }
                Some(ack)
            }
            None => None,
        };

        self.window = message.window_size;

        let ack = match ack {
            Some(ack) if ack > self.acked => ack,
            // Duplicate or bare window update: leave the timer alone.
            _ => return,
        };

        self.acked = ack;
        self.outstanding.retain(|seqno, segment| seqno + segment.sequence_length() > ack);

        self.timer.reset_rto();
        if self.outstanding.is_empty() {
            self.timer.stop();
        } else {
            self.timer.start();
        }
        self.retransmissions = 0;
    }

    /// Let `elapsed` time pass, retransmitting the earliest outstanding
    /// segment if the timeout expired.
    ///
    /// Backoff doubles the timeout only while the remote window is open; a
    /// zero-window probe repeats under the plain timeout.
    pub fn tick(&mut self, elapsed: Duration, mut transmit: impl FnMut(&SenderMessage)) {
        if !self.timer.is_running() {
            return;
        }

        self.timer.advance(elapsed);
        if !self.timer.expired() {
            return;
        }

        if let Some(earliest) = self.outstanding.values().next() {
            transmit(earliest);
        }

        if self.window != 0 {
            self.retransmissions += 1;
            self.timer.double_rto();
        }

        self.timer.start();
    }

    /// The number of sequence numbers sent but not yet acknowledged.
    pub fn sequence_numbers_in_flight(&self) -> u64 {
        self.outstanding.values().map(SenderMessage::sequence_length).sum()
    }

    /// How often the earliest outstanding segment was retransmitted without
    /// intervening progress.
    pub fn consecutive_retransmissions(&self) -> u64 {
        self.retransmissions
    }

    /// The outbound stream.
    pub fn stream(&self) -> &ByteStream {
        &self.input
    }

    /// The outbound stream, mutably; the application writes and closes this
    /// end.
    pub fn stream_mut(&mut self) -> &mut ByteStream {
        &mut self.input
    }

    fn in_flight(&self) -> u64 {
        self.next_seqno - self.acked
    }
}

#[cfg(test)]
mod test {
    use super::*;

    const RTO: Duration = Duration::from_millis(1_000);

    fn sender(isn: u32) -> Sender {
        Sender::new(&TcpConfig {
            capacity: 64_000,
            initial_rto: RTO,
            max_payload: 1_000,
            isn: TcpSeqNumber(isn),
        })
    }

    fn collect(sender: &mut Sender) -> Vec<SenderMessage> {
        let mut sent = Vec::new();
        sender.push(|message| sent.push(message.clone()));
        sent
    }

    fn ack(ackno: u32, window_size: u16) -> ReceiverMessage {
        ReceiverMessage { ackno: Some(TcpSeqNumber(ackno)), window_size, rst: false }
    }

    #[test]
    fn first_push_sends_syn() {
        let mut send = sender(100);
        let sent = collect(&mut send);
        assert_eq!(sent.len(), 1);
        assert!(sent[0].syn);
        assert!(sent[0].payload.is_empty());
        assert_eq!(sent[0].seqno, TcpSeqNumber(100));
        assert_eq!(send.sequence_numbers_in_flight(), 1);

        // Nothing more fits until the SYN is acknowledged.
        assert!(collect(&mut send).is_empty());
    }

    #[test]
    fn data_and_fin_after_syn_ack() {
        let mut send = sender(100);
        collect(&mut send);
        send.receive(&ack(101, 10));
        assert_eq!(send.sequence_numbers_in_flight(), 0);

        send.stream_mut().push(b"hello");
        send.stream_mut().close();
        let sent = collect(&mut send);
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].seqno, TcpSeqNumber(101));
        assert_eq!(sent[0].payload, b"hello");
        assert!(sent[0].fin);
        assert_eq!(send.sequence_numbers_in_flight(), 6);

        send.receive(&ack(107, 10));
        assert_eq!(send.sequence_numbers_in_flight(), 0);
    }

    #[test]
    fn fin_waits_for_window_space() {
        let mut send = sender(0);
        collect(&mut send);
        send.receive(&ack(1, 3));

        send.stream_mut().push(b"abc");
        send.stream_mut().close();
        let sent = collect(&mut send);
        // Three bytes fill the window; the FIN must not overflow it.
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].payload, b"abc");
        assert!(!sent[0].fin);

        send.receive(&ack(4, 1));
        let sent = collect(&mut send);
        assert_eq!(sent.len(), 1);
        assert!(sent[0].fin);
        assert!(sent[0].payload.is_empty());
    }

    #[test]
    fn respects_max_payload() {
        let mut send = sender(0);
        collect(&mut send);
        send.receive(&ack(1, 5_000));

        send.stream_mut().push(&[0x55; 2_500]);
        let sent = collect(&mut send);
        assert_eq!(sent.len(), 3);
        assert_eq!(sent[0].payload.len(), 1_000);
        assert_eq!(sent[1].payload.len(), 1_000);
        assert_eq!(sent[2].payload.len(), 500);
        assert_eq!(sent[1].seqno, TcpSeqNumber(1_001));
    }

    #[test]
    fn fills_the_window_exactly() {
        let mut send = sender(0);
        collect(&mut send);
        send.receive(&ack(1, 6));

        send.stream_mut().push(b"abcdefghij");
        let sent = collect(&mut send);
        let total: usize = sent.iter().map(|message| message.payload.len()).sum();
        assert_eq!(total, 6);
        assert_eq!(send.sequence_numbers_in_flight(), 6);

        // An ack opens the window for the rest.
        send.receive(&ack(7, 6));
        let sent = collect(&mut send);
        let total: usize = sent.iter().map(|message| message.payload.len()).sum();
        assert_eq!(total, 4);
    }

    #[test]
    fn zero_window_probe() {
        let mut send = sender(0);
        collect(&mut send);
        send.receive(&ack(1, 0));

        send.stream_mut().push(b"hello");
        let sent = collect(&mut send);
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].payload, b"h");
        assert_eq!(send.sequence_numbers_in_flight(), 1);

        // Only one probe may be outstanding.
        assert!(collect(&mut send).is_empty());
    }

    #[test]
    fn probe_retransmits_without_backoff() {
        let mut send = sender(0);
        collect(&mut send);
        send.receive(&ack(1, 0));
        send.stream_mut().push(b"hello");
        collect(&mut send);

        for _ in 0..3 {
            let mut resent = Vec::new();
            send.tick(RTO, |message| resent.push(message.clone()));
            assert_eq!(resent.len(), 1);
            assert_eq!(resent[0].payload, b"h");
        }
        assert_eq!(send.consecutive_retransmissions(), 0);

        // The window reopens: the probe is acknowledged, the rest flows.
        send.receive(&ack(2, 10));
        let sent = collect(&mut send);
        assert_eq!(sent[0].payload, b"ello");
    }

    #[test]
    fn retransmission_backs_off_and_resets() {
        let mut send = sender(0);
        collect(&mut send);

        let mut resent = Vec::new();
        send.tick(RTO, |message| resent.push(message.clone()));
        assert_eq!(resent.len(), 1);
        assert!(resent[0].syn);
        assert_eq!(send.consecutive_retransmissions(), 1);

        // Backed off: the old timeout no longer fires alone.
        send.tick(RTO, |_| panic!("retransmitted before the doubled timeout"));
        let mut resent = Vec::new();
        send.tick(RTO, |message| resent.push(message.clone()));
        assert_eq!(resent.len(), 1);
        assert_eq!(send.consecutive_retransmissions(), 2);

        // Progress resets both the counter and the timeout.
        send.receive(&ack(1, 10));
        assert_eq!(send.consecutive_retransmissions(), 0);
        send.stream_mut().push(b"x");
        collect(&mut send);
        let mut resent = Vec::new();
        send.tick(RTO, |message| resent.push(message.clone()));
        assert_eq!(resent.len(), 1);
        assert_eq!(resent[0].payload, b"x");
    }

    #[test]
    fn retransmits_the_earliest_segment() {
        let mut send = sender(0);
        collect(&mut send);
        send.receive(&ack(1, 10));
        send.stream_mut().push(b"ab");
        collect(&mut send);
        send.stream_mut().push(b"cd");
        collect(&mut send);
        assert_eq!(send.sequence_numbers_in_flight(), 4);

        let mut resent = Vec::new();
        send.tick(RTO, |message| resent.push(message.clone()));
        assert_eq!(resent.len(), 1);
        assert_eq!(resent[0].seqno, TcpSeqNumber(1));
        assert_eq!(resent[0].payload, b"ab");
    }

    #[test]
    fn duplicate_ack_leaves_the_timer_alone() {
        let mut send = sender(0);
        collect(&mut send);
        send.receive(&ack(1, 10));
        send.stream_mut().push(b"ab");
        collect(&mut send);

        send.tick(RTO / 2, |_| panic!("too early"));
        // A duplicate of the last ack must not rewind the timer.
        send.receive(&ack(1, 10));
        let mut resent = Vec::new();
        send.tick(RTO / 2, |message| resent.push(message.clone()));
        assert_eq!(resent.len(), 1);
    }

    #[test]
    fn partial_ack_keeps_covering_segment() {
        let mut send = sender(0);
        collect(&mut send);
        send.receive(&ack(1, 10));
        send.stream_mut().push(b"abcd");
        collect(&mut send);

        // Acks into the middle of the segment: it stays outstanding whole.
        send.receive(&ack(3, 10));
        assert_eq!(send.sequence_numbers_in_flight(), 4);
    }

    #[test]
    fn impossible_ack_is_dropped() {
        let mut send = sender(0);
        collect(&mut send);
        send.receive(&ack(999, 55));
        // Neither the ack nor the window made it in.
        assert_eq!(send.sequence_numbers_in_flight(), 1);
        assert!(collect(&mut send).is_empty());
    }

    #[test]
    fn empty_message_carries_position_and_error() {
        let mut send = sender(7);
        assert_eq!(send.empty_message().seqno, TcpSeqNumber(7));
        assert_eq!(send.empty_message().sequence_length(), 0);

        collect(&mut send);
        assert_eq!(send.empty_message().seqno, TcpSeqNumber(8));

        send.receive(&ReceiverMessage { ackno: None, window_size: 0, rst: true });
        assert!(send.empty_message().rst);
        assert!(send.stream().has_error());
    }
}
