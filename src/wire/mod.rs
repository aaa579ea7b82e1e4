/*! Low-level packet access and construction.

The `wire` module deals with the packet *representation*. It provides two
levels of functionality.

 * First, it provides functions to extract fields from sequences of octets,
   and to insert fields into sequences of octets. This happens in the
   lowercase structures, e.g. [`ethernet_frame`] or [`ipv4_packet`], which
   wrap a byte slice without copying it.
 * Second, it provides a compact, high-level representation of header data
   that can be created from parsing and emitted into a sequence of octets.
   This happens through the `Repr` family of structs, e.g. [`ArpRepr`] or
   [`Ipv4Repr`].

[`ethernet_frame`]: struct.ethernet_frame.html
[`ipv4_packet`]: struct.ipv4_packet.html
[`ArpRepr`]: struct.ArpRepr.html
[`Ipv4Repr`]: struct.Ipv4Repr.html

The byte wrappers guarantee that, if the `check_len()` method returned
`Ok(())`, then no field accessor will panic. When parsing untrusted input it
is *necessary* to go through `new_checked`; so long as the buffer is not
truncated afterwards, no accessor will fail. The `Repr::parse()` methods
never panic on a checked packet and `Repr::emit()` never panics as long as
the underlying buffer is at least `buffer_len()` octets long.

# Examples

To emit an IPv4 packet header into an octet buffer, and then parse it back:

```rust
use rill::wire::{ipv4_packet, Ipv4Address, Ipv4Repr, IpProtocol};

let repr = Ipv4Repr {
    src_addr: Ipv4Address::new(10, 0, 0, 1),
    dst_addr: Ipv4Address::new(10, 0, 0, 2),
    protocol: IpProtocol::Tcp,
    payload_len: 10,
    ttl: 64,
};
let mut buffer = vec![0; repr.buffer_len() + repr.payload_len];
{ // emission
    let packet = ipv4_packet::new_unchecked_mut(&mut buffer);
    repr.emit(packet);
}
{ // parsing
    let packet = ipv4_packet::new_checked(&buffer)
        .expect("truncated packet");
    let parsed = Ipv4Repr::parse(packet)
        .expect("malformed packet");
    assert_eq!(repr, parsed);
}
```
*/
#![allow(missing_docs)]

mod field {
    pub(crate) type Field = ::core::ops::Range<usize>;
    pub(crate) type Rest = ::core::ops::RangeFrom<usize>;
}

mod arp;
mod error;
mod ethernet;
mod ipv4;
mod tcp;

pub use self::ethernet::{
    ethernet as ethernet_frame,
    Address as EthernetAddress,
    EtherType as EthernetProtocol,
    Repr as EthernetRepr};

pub use self::error::{
    Error,
    Result};

pub use self::arp::{
    arp as arp_packet,
    Hardware as ArpHardware,
    Operation as ArpOperation,
    Repr as ArpRepr};

pub use self::ipv4::{
    ipv4 as ipv4_packet,
    Address as Ipv4Address,
    Protocol as IpProtocol,
    Repr as Ipv4Repr,
    Subnet as Ipv4Subnet};

pub use self::tcp::SeqNumber as TcpSeqNumber;
