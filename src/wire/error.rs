use core::fmt;

/// The error type for packet parsing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// An incoming packet could not be parsed because it was shorter than
    /// assumed.
    ///
    /// The packet may be shorter than the minimum length of its format, or a
    /// length field may describe a payload longer than the received data.
    Truncated,

    /// An incoming packet had an incorrect checksum and was dropped.
    WrongChecksum,

    /// An incoming packet could not be recognized and was dropped.
    ///
    /// E.g. an ARP packet with a hardware type other than Ethernet. This is
    /// not fatal; well-crafted peers simply never elicit it.
    Unrecognized,

    /// An incoming packet was recognized but was self-contradictory.
    ///
    /// Example: an IPv4 packet whose header length field is smaller than the
    /// minimal header.
    Malformed,
}

/// The result type for packet parsing.
pub type Result<T> = core::result::Result<T, Error>;

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::Truncated => write!(f, "truncated packet"),
            Error::WrongChecksum => write!(f, "checksum error"),
            Error::Unrecognized => write!(f, "unrecognized packet"),
            Error::Malformed => write!(f, "malformed packet"),
        }
    }
}
