use crate::time::Duration;
use crate::wire::TcpSeqNumber;

/// Configuration of one TCP endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TcpConfig {
    /// The capacity of the outbound and inbound byte streams.
    pub capacity: usize,
    /// The retransmission timeout before any backoff.
    pub initial_rto: Duration,
    /// The largest payload carried by a single segment.
    pub max_payload: usize,
    /// The initial sequence number of the outbound stream.
    pub isn: TcpSeqNumber,
}

impl TcpConfig {
    /// Default stream capacity, per direction.
    pub const DEFAULT_CAPACITY: usize = 64_000;

    /// Default retransmission timeout.
    pub const DEFAULT_RTO: Duration = Duration::from_millis(1_000);

    /// Conservative largest payload: an MTU of 1500 less the IP and TCP
    /// headers with room for options.
    pub const MAX_PAYLOAD_SIZE: usize = 1452;
}

impl Default for TcpConfig {
    fn default() -> TcpConfig {
        TcpConfig {
            capacity: Self::DEFAULT_CAPACITY,
            initial_rto: Self::DEFAULT_RTO,
            max_payload: Self::MAX_PAYLOAD_SIZE,
            isn: TcpSeqNumber(rand::random()),
        }
    }
}
