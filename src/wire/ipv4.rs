use core::{fmt, str::FromStr};
use byteorder::{ByteOrder, NetworkEndian};

use super::{Error, Result};

enum_with_unknown! {
    /// The protocol of an IPv4 payload.
    pub enum Protocol(u8) {
        Icmp = 0x01,
        Tcp  = 0x06,
        Udp  = 0x11,
    }
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Protocol::Icmp => write!(f, "ICMP"),
            Protocol::Tcp => write!(f, "TCP"),
            Protocol::Udp => write!(f, "UDP"),
            Protocol::Unknown(id) => write!(f, "0x{:02x}", id),
        }
    }
}

/// A four-octet IPv4 address.
#[derive(Debug, Hash, PartialEq, Eq, PartialOrd, Ord, Clone, Copy, Default)]
pub struct Address(pub [u8; 4]);

impl Address {
    /// The unspecified address.
    pub const UNSPECIFIED: Address = Address([0; 4]);

    /// The limited broadcast address.
    pub const BROADCAST: Address = Address([255; 4]);

    /// Construct an IPv4 address from its four octets, in big-endian.
    pub const fn new(a0: u8, a1: u8, a2: u8, a3: u8) -> Address {
        Address([a0, a1, a2, a3])
    }

    /// Construct an IPv4 address from a sequence of octets, in big-endian.
    ///
    /// # Panics
    /// The function panics if `data` is not four octets long.
    pub fn from_bytes(data: &[u8]) -> Address {
        let mut bytes = [0; 4];
        bytes.copy_from_slice(data);
        Address(bytes)
    }

    /// Return an IPv4 address as a sequence of octets, in big-endian.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Return the address as a host byte order integer.
    pub fn to_network_integer(self) -> u32 {
        u32::from_be_bytes(self.0)
    }

    /// Create the address from a host byte order integer.
    pub fn from_network_integer(num: u32) -> Self {
        Address(num.to_be_bytes())
    }

    /// Query whether the address is the limited broadcast address.
    pub fn is_broadcast(&self) -> bool {
        *self == Self::BROADCAST
    }

    /// Query whether the address is unspecified (all-zero).
    pub fn is_unspecified(&self) -> bool {
        *self == Self::UNSPECIFIED
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let bytes = self.0;
        write!(f, "{}.{}.{}.{}", bytes[0], bytes[1], bytes[2], bytes[3])
    }
}

/// An error from parsing the textual representation of an IPv4 address.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ParseAddressError(());

impl fmt::Display for ParseAddressError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("invalid ipv4 address")
    }
}

impl FromStr for Address {
    type Err = ParseAddressError;

    fn from_str(src: &str) -> core::result::Result<Self, ParseAddressError> {
        let mut parsed = [0; 4];
        let mut components = src.split('.');
        for c in parsed.iter_mut() {
            let part = components.next().ok_or(ParseAddressError(()))?;
            *c = part.parse().map_err(|_| ParseAddressError(()))?;
        }

        if components.next().is_some() {
            Err(ParseAddressError(()))
        } else {
            Ok(Address(parsed))
        }
    }
}

/// A network of IPv4 addresses described by a prefix.
///
/// The subnet with prefix length `0` contains every address.
#[derive(Debug, Hash, PartialEq, Eq, PartialOrd, Ord, Clone, Copy)]
pub struct Subnet {
    prefix: Address,
    prefix_len: u8,
}

impl Subnet {
    /// Create a subnet from a prefix and the number of its significant bits.
    ///
    /// # Panics
    /// The function panics if `prefix_len` is larger than 32.
    pub fn new(prefix: Address, prefix_len: u8) -> Subnet {
        assert!(prefix_len <= 32);
        Subnet { prefix, prefix_len }
    }

    /// Return the prefix as an address with the host bits untouched.
    pub fn prefix(&self) -> Address {
        self.prefix
    }

    /// Return the number of significant bits of the prefix.
    pub fn prefix_len(&self) -> u8 {
        self.prefix_len
    }

    /// Return the netmask selecting the significant bits.
    pub fn netmask(&self) -> Address {
        Address::from_network_integer(self.mask())
    }

    fn mask(&self) -> u32 {
        if self.prefix_len == 0 {
            0
        } else {
            !0u32 << (32 - self.prefix_len)
        }
    }

    /// Query whether the subnet contains the given address.
    pub fn contains(&self, address: Address) -> bool {
        (address.to_network_integer() ^ self.prefix.to_network_integer()) & self.mask() == 0
    }
}

impl fmt::Display for Subnet {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}/{}", self.prefix, self.prefix_len)
    }
}

byte_wrapper! {
    /// A byte sequence representing an IPv4 packet.
    #[derive(Debug, PartialEq, Eq)]
    pub struct ipv4([u8]);
}

mod field {
    use crate::wire::field::*;

    pub(crate) const VER_IHL:  usize = 0;
    pub(crate) const DSCP_ECN: usize = 1;
    pub(crate) const LENGTH:   Field = 2..4;
    pub(crate) const IDENT:    Field = 4..6;
    pub(crate) const FLG_OFF:  Field = 6..8;
    pub(crate) const TTL:      usize = 8;
    pub(crate) const PROTOCOL: usize = 9;
    pub(crate) const CHECKSUM: Field = 10..12;
    pub(crate) const SRC_ADDR: Field = 12..16;
    pub(crate) const DST_ADDR: Field = 16..20;
}

/// The length of a header without options.
pub(crate) const HEADER_LEN: usize = field::DST_ADDR.end;

impl ipv4 {
    /// Imbue a raw octet buffer with IPv4 packet structure.
    pub fn new_unchecked(buffer: &[u8]) -> &ipv4 {
        Self::__from_macro_new_unchecked(buffer)
    }

    /// Imbue a mutable octet buffer with IPv4 packet structure.
    pub fn new_unchecked_mut(buffer: &mut [u8]) -> &mut ipv4 {
        Self::__from_macro_new_unchecked_mut(buffer)
    }

    /// Shorthand for a combination of [new_unchecked] and [check_len].
    ///
    /// [new_unchecked]: #method.new_unchecked
    /// [check_len]: #method.check_len
    pub fn new_checked(data: &[u8]) -> Result<&ipv4> {
        let packet = Self::new_unchecked(data);
        packet.check_len()?;
        Ok(packet)
    }

    /// Unwrap the packet as a raw byte slice.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Ensure that no accessor method will panic if called.
    ///
    /// Returns `Err(Error::Truncated)` if the buffer is shorter than the
    /// header or the length field describes. Returns `Err(Error::Malformed)`
    /// if the header length field is smaller than the minimal header.
    pub fn check_len(&self) -> Result<()> {
        let len = self.0.len();
        if len < HEADER_LEN {
            Err(Error::Truncated)
        } else if usize::from(self.header_len()) < HEADER_LEN {
            Err(Error::Malformed)
        } else if usize::from(self.header_len()) > usize::from(self.total_len()) {
            Err(Error::Malformed)
        } else if len < usize::from(self.total_len()) {
            Err(Error::Truncated)
        } else {
            Ok(())
        }
    }

    /// Return the version field.
    #[inline]
    pub fn version(&self) -> u8 {
        self.0[field::VER_IHL] >> 4
    }

    /// Return the header length, in octets.
    #[inline]
    pub fn header_len(&self) -> u8 {
        (self.0[field::VER_IHL] & 0x0f) * 4
    }

    /// Return the total length field.
    #[inline]
    pub fn total_len(&self) -> u16 {
        NetworkEndian::read_u16(&self.0[field::LENGTH])
    }

    /// Return the time to live field.
    #[inline]
    pub fn ttl(&self) -> u8 {
        self.0[field::TTL]
    }

    /// Return the protocol field.
    #[inline]
    pub fn protocol(&self) -> Protocol {
        Protocol::from(self.0[field::PROTOCOL])
    }

    /// Return the header checksum field.
    #[inline]
    pub fn checksum(&self) -> u16 {
        NetworkEndian::read_u16(&self.0[field::CHECKSUM])
    }

    /// Return the source address field.
    pub fn src_addr(&self) -> Address {
        Address::from_bytes(&self.0[field::SRC_ADDR])
    }

    /// Return the destination address field.
    pub fn dst_addr(&self) -> Address {
        Address::from_bytes(&self.0[field::DST_ADDR])
    }

    /// Validate the header checksum.
    pub fn verify_checksum(&self) -> bool {
        checksum::data(&self.0[..usize::from(self.header_len())]) == !0
    }

    /// Set the version field.
    #[inline]
    pub fn set_version(&mut self, value: u8) {
        self.0[field::VER_IHL] = (self.0[field::VER_IHL] & 0x0f) | (value << 4);
    }

    /// Set the header length, in octets.
    #[inline]
    pub fn set_header_len(&mut self, value: u8) {
        self.0[field::VER_IHL] = (self.0[field::VER_IHL] & 0xf0) | ((value / 4) & 0x0f);
    }

    /// Set the total length field.
    #[inline]
    pub fn set_total_len(&mut self, value: u16) {
        NetworkEndian::write_u16(&mut self.0[field::LENGTH], value)
    }

    /// Set the time to live field.
    #[inline]
    pub fn set_ttl(&mut self, value: u8) {
        self.0[field::TTL] = value
    }

    /// Set the protocol field.
    #[inline]
    pub fn set_protocol(&mut self, value: Protocol) {
        self.0[field::PROTOCOL] = value.into()
    }

    /// Set the header checksum field.
    #[inline]
    pub fn set_checksum(&mut self, value: u16) {
        NetworkEndian::write_u16(&mut self.0[field::CHECKSUM], value)
    }

    /// Set the source address field.
    pub fn set_src_addr(&mut self, value: Address) {
        self.0[field::SRC_ADDR].copy_from_slice(value.as_bytes())
    }

    /// Set the destination address field.
    pub fn set_dst_addr(&mut self, value: Address) {
        self.0[field::DST_ADDR].copy_from_slice(value.as_bytes())
    }

    /// Compute and fill in the header checksum.
    pub fn fill_checksum(&mut self) {
        self.set_checksum(0);
        let checksum = !checksum::data(&self.0[..usize::from(self.header_len())]);
        self.set_checksum(checksum)
    }

    /// Return the payload as a byte slice.
    pub fn payload_slice(&self) -> &[u8] {
        let range = usize::from(self.header_len())..usize::from(self.total_len());
        &self.0[range]
    }
}

impl AsRef<[u8]> for ipv4 {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl AsMut<[u8]> for ipv4 {
    fn as_mut(&mut self) -> &mut [u8] {
        &mut self.0
    }
}

/// A high-level representation of an IPv4 header.
///
/// Emission always produces an options-free header; identification and
/// fragmentation fields are zero.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub struct Repr {
    /// The source address.
    pub src_addr: Address,
    /// The destination address.
    pub dst_addr: Address,
    /// The protocol of the payload.
    pub protocol: Protocol,
    /// The length of the payload, in octets.
    pub payload_len: usize,
    /// The time to live.
    pub ttl: u8,
}

impl Repr {
    /// Parse a checked IPv4 packet into a high-level representation.
    ///
    /// Fragmented packets are not recognized since reassembly of IP
    /// datagrams is outside the stack.
    pub fn parse(packet: &ipv4) -> Result<Repr> {
        if packet.version() != 4 {
            return Err(Error::Malformed);
        }
        if !packet.verify_checksum() {
            return Err(Error::WrongChecksum);
        }

        Ok(Repr {
            src_addr: packet.src_addr(),
            dst_addr: packet.dst_addr(),
            protocol: packet.protocol(),
            payload_len: packet.payload_slice().len(),
            ttl: packet.ttl(),
        })
    }

    /// Return the length of a header that will be emitted from this
    /// high-level representation.
    pub fn buffer_len(&self) -> usize {
        HEADER_LEN
    }

    /// Emit this high-level representation into an IPv4 packet header,
    /// filling in the checksum.
    pub fn emit(&self, packet: &mut ipv4) {
        packet.set_version(4);
        packet.set_header_len(HEADER_LEN as u8);
        packet.0[field::DSCP_ECN] = 0;
        packet.set_total_len((HEADER_LEN + self.payload_len) as u16);
        NetworkEndian::write_u16(&mut packet.0[field::IDENT], 0);
        NetworkEndian::write_u16(&mut packet.0[field::FLG_OFF], 0);
        packet.set_ttl(self.ttl);
        packet.set_protocol(self.protocol);
        packet.set_src_addr(self.src_addr);
        packet.set_dst_addr(self.dst_addr);
        packet.fill_checksum();
    }
}

impl fmt::Display for Repr {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "IPv4 src={} dst={} proto={} ttl={}",
               self.src_addr, self.dst_addr, self.protocol, self.ttl)
    }
}

pub(crate) mod checksum {
    use byteorder::{ByteOrder, NetworkEndian};

    fn propagate_carries(word: u32) -> u16 {
        let sum = (word >> 16) + (word & 0xffff);
        ((sum >> 16) as u16) + (sum as u16)
    }

    /// Compute an RFC 1071 compliant checksum (without the final complement).
    pub(crate) fn data(mut data: &[u8]) -> u16 {
        let mut accum = 0u32;

        while data.len() >= 2 {
            accum += u32::from(NetworkEndian::read_u16(data));
            data = &data[2..];
        }

        // Add the last remaining odd byte, if any.
        if let Some(&value) = data.first() {
            accum += u32::from(value) << 8;
        }

        propagate_carries(accum)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[rustfmt::skip]
    static PACKET_BYTES: [u8; 24] = [
        0x45, 0x00, 0x00, 0x18,
        0x00, 0x00, 0x00, 0x00,
        0x40, 0x06, 0x66, 0xde,
        0x0a, 0x00, 0x00, 0x01,
        0x0a, 0x00, 0x00, 0x02,
        0xaa, 0x00, 0x00, 0xff,
    ];

    fn packet_repr() -> Repr {
        Repr {
            src_addr: Address::new(10, 0, 0, 1),
            dst_addr: Address::new(10, 0, 0, 2),
            protocol: Protocol::Tcp,
            payload_len: 4,
            ttl: 64,
        }
    }

    #[test]
    fn deconstruct() {
        let packet = ipv4::new_checked(&PACKET_BYTES[..]).unwrap();
        assert_eq!(packet.version(), 4);
        assert_eq!(packet.header_len(), 20);
        assert_eq!(packet.total_len(), 24);
        assert_eq!(packet.ttl(), 64);
        assert_eq!(packet.protocol(), Protocol::Tcp);
        assert_eq!(packet.src_addr(), Address::new(10, 0, 0, 1));
        assert_eq!(packet.dst_addr(), Address::new(10, 0, 0, 2));
        assert!(packet.verify_checksum());
        assert_eq!(packet.payload_slice(), &[0xaa, 0x00, 0x00, 0xff]);
    }

    #[test]
    fn emit_and_parse() {
        let repr = packet_repr();
        let mut bytes = vec![0; repr.buffer_len() + repr.payload_len];
        bytes[20..].copy_from_slice(&[0xaa, 0x00, 0x00, 0xff]);
        repr.emit(ipv4::new_unchecked_mut(&mut bytes));
        assert_eq!(&bytes[..], &PACKET_BYTES[..]);

        let packet = ipv4::new_checked(&bytes).unwrap();
        assert_eq!(Repr::parse(packet), Ok(repr));
    }

    #[test]
    fn checksum_detects_corruption() {
        let mut bytes = PACKET_BYTES;
        bytes[8] = 63; // ttl changed without a checksum update
        let packet = ipv4::new_checked(&bytes[..]).unwrap();
        assert!(!packet.verify_checksum());
        assert_eq!(Repr::parse(packet), Err(Error::WrongChecksum));
    }

    #[test]
    fn ttl_rewrite_keeps_checksum_valid() {
        let mut bytes = PACKET_BYTES.to_vec();
        let packet = ipv4::new_unchecked_mut(&mut bytes);
        packet.set_ttl(63);
        packet.fill_checksum();
        assert!(ipv4::new_checked(&bytes).unwrap().verify_checksum());
    }

    #[test]
    fn malformed_header_len() {
        let mut bytes = PACKET_BYTES;
        bytes[0] = 0x44; // header length 16 < 20
        assert_eq!(ipv4::new_checked(&bytes[..]), Err(Error::Malformed));
    }

    #[test]
    fn subnet_matching() {
        let net = Subnet::new(Address::new(10, 1, 0, 0), 16);
        assert!(net.contains(Address::new(10, 1, 2, 3)));
        assert!(!net.contains(Address::new(10, 2, 0, 1)));
        assert_eq!(net.netmask(), Address::new(255, 255, 0, 0));

        let all = Subnet::new(Address::UNSPECIFIED, 0);
        assert!(all.contains(Address::new(8, 8, 8, 8)));

        let host = Subnet::new(Address::new(192, 168, 0, 1), 32);
        assert!(host.contains(Address::new(192, 168, 0, 1)));
        assert!(!host.contains(Address::new(192, 168, 0, 2)));
    }

    #[test]
    fn address_from_str() {
        assert_eq!("10.0.0.1".parse(), Ok(Address::new(10, 0, 0, 1)));
        assert!("10.0.0".parse::<Address>().is_err());
        assert!("10.0.0.256".parse::<Address>().is_err());
    }
}
