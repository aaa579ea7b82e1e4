use std::collections::VecDeque;
use std::rc::Rc;

use log::debug;

use crate::time::{Duration, Instant};
use crate::wire::{
    arp_packet, ethernet_frame, ipv4_packet, ArpOperation, ArpRepr, EthernetAddress,
    EthernetProtocol, EthernetRepr, Ipv4Address,
};

use super::NeighborCache;

/// The physical output of an [`Interface`].
///
/// The port is handed every frame the interface decides to transmit and must
/// accept it without blocking. It is shared: the interface keeps a
/// reference-counted handle so that replies generated while a frame is being
/// received can go out through the same path.
///
/// [`Interface`]: struct.Interface.html
pub trait OutputPort {
    /// Deliver one Ethernet frame out the physical link.
    fn transmit(&self, sender: &Interface, frame: &[u8]);
}

/// A datagram parked until its next hop resolves.
#[derive(Debug)]
struct Pending {
    next_hop: Ipv4Address,
    datagram: Vec<u8>,
    since: Instant,
}

/// A network interface connecting the internet layer with an Ethernet
/// segment.
///
/// The interface translates datagrams coming from a host stack or router
/// into Ethernet frames. To fill in the destination hardware address it
/// looks up the Ethernet address of the next IP hop, resolving unknown hops
/// with ARP requests; datagrams wait in a queue while their resolution is
/// outstanding and are dropped if it never arrives. In the opposite
/// direction it accepts Ethernet frames, answers ARP traffic aimed at its
/// own address, and queues up well-formed IPv4 datagrams for the layer
/// above.
pub struct Interface {
    name: String,
    port: Rc<dyn OutputPort>,
    hardware_addr: EthernetAddress,
    ip_addr: Ipv4Address,
    neighbors: NeighborCache,
    waiting: VecDeque<Pending>,
    inbound: VecDeque<Vec<u8>>,
    now: Instant,
}

impl Interface {
    /// Create an interface with the given addresses, transmitting through
    /// `port`.
    pub fn new(
        name: impl Into<String>,
        port: Rc<dyn OutputPort>,
        hardware_addr: EthernetAddress,
        ip_addr: Ipv4Address,
    ) -> Interface {
        Interface {
            name: name.into(),
            port,
            hardware_addr,
            ip_addr,
            neighbors: NeighborCache::new(),
            waiting: VecDeque::new(),
            inbound: VecDeque::new(),
            now: Instant::from_millis(0),
        }
    }

    /// The human-readable name of the interface.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The hardware address of the interface.
    pub fn hardware_addr(&self) -> EthernetAddress {
        self.hardware_addr
    }

    /// The protocol address of the interface.
    pub fn ip_addr(&self) -> Ipv4Address {
        self.ip_addr
    }

    /// Send an IPv4 datagram towards `next_hop` (typically a gateway, or the
    /// final destination when directly attached).
    ///
    /// When the hardware address of the hop is cached the datagram leaves
    /// immediately; otherwise it is queued and, unless one was sent within
    /// the last [`NeighborCache::SILENT_TIME`], an ARP request for the hop
    /// is broadcast.
    ///
    /// [`NeighborCache::SILENT_TIME`]:
    /// struct.NeighborCache.html#associatedconstant.SILENT_TIME
    pub fn send_datagram(&mut self, datagram: Vec<u8>, next_hop: Ipv4Address) {
        if let Some(dst) = self.neighbors.lookup(next_hop, self.now) {
            let frame = self.encapsulate(dst, EthernetProtocol::Ipv4, &datagram);
            self.transmit(&frame);
            return;
        }

        if self.neighbors.should_request(next_hop, self.now) {
            let request = ArpRepr {
                operation: ArpOperation::Request,
                source_hardware_addr: self.hardware_addr,
                source_protocol_addr: self.ip_addr,
                target_hardware_addr: EthernetAddress::default(),
                target_protocol_addr: next_hop,
            };
            let frame = self.encapsulate_arp(EthernetAddress::BROADCAST, &request);
            self.transmit(&frame);
            self.neighbors.requesting(next_hop, self.now);
        }

        self.waiting.push_back(Pending {
            next_hop,
            datagram,
            since: self.now,
        });
    }

    /// Accept one Ethernet frame from the link.
    ///
    /// Frames not addressed to this interface (or broadcast) are ignored.
    /// IPv4 payloads are queued for [`poll_inbound`]; ARP payloads update
    /// the neighbor cache, trigger a reply when they ask for our address,
    /// and release any datagrams that waited on the sender's address.
    ///
    /// [`poll_inbound`]: #method.poll_inbound
    pub fn recv_frame(&mut self, frame: &[u8]) {
        let frame = match ethernet_frame::new_checked(frame) {
            Ok(frame) => frame,
            Err(err) => {
                debug!("{}: discarding frame: {}", self.name, err);
                return;
            }
        };

        let dst = frame.dst_addr();
        if dst != self.hardware_addr && !dst.is_broadcast() {
            return;
        }

        match frame.ethertype() {
            EthernetProtocol::Ipv4 => self.recv_ipv4(frame.payload_slice()),
            EthernetProtocol::Arp => self.recv_arp(frame.payload_slice()),
            ethertype => {
                debug!("{}: discarding frame with type {}", self.name, ethertype);
            }
        }
    }

    fn recv_ipv4(&mut self, payload: &[u8]) {
        let packet = match ipv4_packet::new_checked(payload) {
            Ok(packet) => packet,
            Err(err) => {
                debug!("{}: discarding datagram: {}", self.name, err);
                return;
            }
        };
        if !packet.verify_checksum() {
            debug!("{}: discarding datagram: bad header checksum", self.name);
            return;
        }

        self.inbound.push_back(payload.to_vec());
    }

    fn recv_arp(&mut self, payload: &[u8]) {
        let repr = match arp_packet::new_checked(payload).and_then(ArpRepr::parse) {
            Ok(repr) => repr,
            Err(err) => {
                debug!("{}: discarding arp packet: {}", self.name, err);
                return;
            }
        };

        self.neighbors
            .fill(repr.source_protocol_addr, repr.source_hardware_addr, Some(self.now));

        if repr.operation == ArpOperation::Request && repr.target_protocol_addr == self.ip_addr {
            let reply = ArpRepr {
                operation: ArpOperation::Reply,
                source_hardware_addr: self.hardware_addr,
                source_protocol_addr: self.ip_addr,
                target_hardware_addr: repr.source_hardware_addr,
                target_protocol_addr: repr.source_protocol_addr,
            };
            let frame = self.encapsulate_arp(repr.source_hardware_addr, &reply);
            self.transmit(&frame);
        }

        // The sender's address just became known; release everything that
        // waited on it.
        let learned = repr.source_protocol_addr;
        let (ready, waiting) = self
            .waiting
            .drain(..)
            .partition(|pending: &Pending| pending.next_hop == learned);
        self.waiting = waiting;
        for pending in Vec::from(ready) {
            self.send_datagram(pending.datagram, pending.next_hop);
        }
    }

    /// Take the next IPv4 datagram delivered by the link, if any.
    pub fn poll_inbound(&mut self) -> Option<Vec<u8>> {
        self.inbound.pop_front()
    }

    /// Let `elapsed` time pass.
    ///
    /// Expires neighbor mappings and gives up on datagrams whose resolution
    /// attempt ran out; such a datagram is lost, exactly as if the segment
    /// had dropped it.
    pub fn tick(&mut self, elapsed: Duration) {
        self.now += elapsed;
        self.neighbors.expire(self.now);

        let now = self.now;
        let name = &self.name;
        self.waiting.retain(|pending| {
            let keep = now - pending.since < NeighborCache::SILENT_TIME;
            if !keep {
                debug!("{}: dropping datagram for {}: no arp reply", name, pending.next_hop);
            }
            keep
        });
    }

    /// The neighbor cache of the interface.
    pub fn neighbors(&self) -> &NeighborCache {
        &self.neighbors
    }

    fn transmit(&self, frame: &[u8]) {
        self.port.transmit(self, frame);
    }

    fn encapsulate(&self, dst: EthernetAddress, ethertype: EthernetProtocol, payload: &[u8]) -> Vec<u8> {
        let mut buffer = vec![0; ethernet_frame::buffer_len(payload.len())];
        let frame = ethernet_frame::new_unchecked_mut(&mut buffer);
        EthernetRepr {
            dst_addr: dst,
            src_addr: self.hardware_addr,
            ethertype,
        }
        .emit(frame);
        frame.payload_mut_slice().copy_from_slice(payload);
        buffer
    }

    fn encapsulate_arp(&self, dst: EthernetAddress, repr: &ArpRepr) -> Vec<u8> {
        let mut payload = vec![0; ArpRepr::buffer_len()];
        repr.emit(arp_packet::new_unchecked_mut(&mut payload));
        self.encapsulate(dst, EthernetProtocol::Arp, &payload)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::wire::{Ipv4Repr, IpProtocol};
    use std::cell::RefCell;

    const HADDR_A: EthernetAddress = EthernetAddress([0x02, 0, 0, 0, 0, 0x0a]);
    const HADDR_B: EthernetAddress = EthernetAddress([0x02, 0, 0, 0, 0, 0x0b]);
    const IP_A: Ipv4Address = Ipv4Address([10, 0, 0, 1]);
    const IP_B: Ipv4Address = Ipv4Address([10, 0, 0, 2]);

    /// Collects transmitted frames for inspection.
    #[derive(Default)]
    struct Wiretap {
        frames: RefCell<Vec<Vec<u8>>>,
    }

    impl OutputPort for Wiretap {
        fn transmit(&self, _sender: &Interface, frame: &[u8]) {
            self.frames.borrow_mut().push(frame.to_vec());
        }
    }

    fn interface(port: Rc<Wiretap>) -> Interface {
        Interface::new("eth0", port, HADDR_A, IP_A)
    }

    fn datagram(dst: Ipv4Address) -> Vec<u8> {
        let repr = Ipv4Repr {
            src_addr: IP_A,
            dst_addr: dst,
            protocol: IpProtocol::Udp,
            payload_len: 3,
            ttl: 64,
        };
        let mut buffer = vec![0; repr.buffer_len() + repr.payload_len];
        buffer[20..].copy_from_slice(b"hey");
        repr.emit(ipv4_packet::new_unchecked_mut(&mut buffer));
        buffer
    }

    fn arp_frame(repr: &ArpRepr, dst: EthernetAddress, src: EthernetAddress) -> Vec<u8> {
        let mut payload = vec![0; ArpRepr::buffer_len()];
        repr.emit(arp_packet::new_unchecked_mut(&mut payload));
        let mut buffer = vec![0; ethernet_frame::buffer_len(payload.len())];
        let frame = ethernet_frame::new_unchecked_mut(&mut buffer);
        EthernetRepr { dst_addr: dst, src_addr: src, ethertype: EthernetProtocol::Arp }.emit(frame);
        frame.payload_mut_slice().copy_from_slice(&payload);
        buffer
    }

    fn reply_from_b() -> Vec<u8> {
        let repr = ArpRepr {
            operation: ArpOperation::Reply,
            source_hardware_addr: HADDR_B,
            source_protocol_addr: IP_B,
            target_hardware_addr: HADDR_A,
            target_protocol_addr: IP_A,
        };
        arp_frame(&repr, HADDR_A, HADDR_B)
    }

    #[test]
    fn resolve_then_deliver() {
        let port = Rc::new(Wiretap::default());
        let mut iface = interface(port.clone());

        // Unknown hop: one broadcast ARP request, datagram queued.
        iface.send_datagram(datagram(IP_B), IP_B);
        {
            let frames = port.frames.borrow();
            assert_eq!(frames.len(), 1);
            let frame = ethernet_frame::new_checked(&frames[0]).unwrap();
            assert_eq!(frame.dst_addr(), EthernetAddress::BROADCAST);
            assert_eq!(frame.ethertype(), EthernetProtocol::Arp);
            let request = ArpRepr::parse(arp_packet::new_checked(frame.payload_slice()).unwrap()).unwrap();
            assert_eq!(request.operation, ArpOperation::Request);
            assert_eq!(request.target_protocol_addr, IP_B);
        }

        // Time passes within the silence window: no retransmission.
        iface.tick(Duration::from_millis(1_000));
        iface.send_datagram(datagram(IP_B), IP_B);
        assert_eq!(port.frames.borrow().len(), 1);

        // The reply releases both queued datagrams as IPv4 frames to B.
        iface.recv_frame(&reply_from_b());
        {
            let frames = port.frames.borrow();
            assert_eq!(frames.len(), 3);
            for frame in &frames[1..] {
                let frame = ethernet_frame::new_checked(frame).unwrap();
                assert_eq!(frame.dst_addr(), HADDR_B);
                assert_eq!(frame.ethertype(), EthernetProtocol::Ipv4);
            }
        }

        // Within the mapping lifetime further sends use the cache.
        iface.tick(Duration::from_millis(20_000));
        iface.send_datagram(datagram(IP_B), IP_B);
        assert_eq!(port.frames.borrow().len(), 4);
    }

    #[test]
    fn request_after_silence_window() {
        let port = Rc::new(Wiretap::default());
        let mut iface = interface(port.clone());

        iface.send_datagram(datagram(IP_B), IP_B);
        iface.tick(NeighborCache::SILENT_TIME);
        iface.send_datagram(datagram(IP_B), IP_B);

        let frames = port.frames.borrow();
        assert_eq!(frames.len(), 2);
        for frame in frames.iter() {
            assert_eq!(ethernet_frame::new_checked(frame).unwrap().ethertype(),
                       EthernetProtocol::Arp);
        }
    }

    #[test]
    fn unresolved_datagrams_are_dropped() {
        let port = Rc::new(Wiretap::default());
        let mut iface = interface(port.clone());

        iface.send_datagram(datagram(IP_B), IP_B);
        iface.tick(NeighborCache::SILENT_TIME);
        // The queue gave up; a late reply finds nothing to flush.
        iface.recv_frame(&reply_from_b());
        assert_eq!(port.frames.borrow().len(), 1);
    }

    #[test]
    fn answers_arp_requests() {
        let port = Rc::new(Wiretap::default());
        let mut iface = interface(port.clone());

        let request = ArpRepr {
            operation: ArpOperation::Request,
            source_hardware_addr: HADDR_B,
            source_protocol_addr: IP_B,
            target_hardware_addr: EthernetAddress::default(),
            target_protocol_addr: IP_A,
        };
        iface.recv_frame(&arp_frame(&request, EthernetAddress::BROADCAST, HADDR_B));

        let frames = port.frames.borrow();
        assert_eq!(frames.len(), 1);
        let frame = ethernet_frame::new_checked(&frames[0]).unwrap();
        assert_eq!(frame.dst_addr(), HADDR_B);
        let reply = ArpRepr::parse(arp_packet::new_checked(frame.payload_slice()).unwrap()).unwrap();
        assert_eq!(reply.operation, ArpOperation::Reply);
        assert_eq!(reply.source_hardware_addr, HADDR_A);
        assert_eq!(reply.source_protocol_addr, IP_A);
        assert_eq!(reply.target_protocol_addr, IP_B);

        // The requester was learned in passing.
        drop(frames);
        iface.send_datagram(datagram(IP_B), IP_B);
        let frames = port.frames.borrow();
        assert_eq!(frames.len(), 2);
        assert_eq!(ethernet_frame::new_checked(&frames[1]).unwrap().ethertype(),
                   EthernetProtocol::Ipv4);
    }

    #[test]
    fn requests_for_other_hosts_are_not_answered() {
        let port = Rc::new(Wiretap::default());
        let mut iface = interface(port.clone());

        let request = ArpRepr {
            operation: ArpOperation::Request,
            source_hardware_addr: HADDR_B,
            source_protocol_addr: IP_B,
            target_hardware_addr: EthernetAddress::default(),
            target_protocol_addr: Ipv4Address([10, 0, 0, 3]),
        };
        iface.recv_frame(&arp_frame(&request, EthernetAddress::BROADCAST, HADDR_B));
        assert!(port.frames.borrow().is_empty());
        // The sender mapping was still learned.
        assert_eq!(iface.neighbors().len(), 1);
    }

    #[test]
    fn delivers_ipv4_upward() {
        let port = Rc::new(Wiretap::default());
        let mut iface = interface(port.clone());

        let datagram = datagram(IP_A);
        let mut buffer = vec![0; ethernet_frame::buffer_len(datagram.len())];
        let frame = ethernet_frame::new_unchecked_mut(&mut buffer);
        EthernetRepr { dst_addr: HADDR_A, src_addr: HADDR_B, ethertype: EthernetProtocol::Ipv4 }
            .emit(frame);
        frame.payload_mut_slice().copy_from_slice(&datagram);

        iface.recv_frame(&buffer);
        assert_eq!(iface.poll_inbound(), Some(datagram));
        assert_eq!(iface.poll_inbound(), None);
    }

    #[test]
    fn foreign_frames_are_ignored() {
        let port = Rc::new(Wiretap::default());
        let mut iface = interface(port.clone());

        let mut frame = reply_from_b();
        // Readdress the frame to somebody else.
        frame[0..6].copy_from_slice(&[0x02, 0, 0, 0, 0, 0x99]);
        iface.recv_frame(&frame);
        assert!(iface.neighbors().is_empty());

        // Truncated garbage is dropped quietly.
        iface.recv_frame(&[0x00, 0x01, 0x02]);
        assert_eq!(iface.poll_inbound(), None);
    }

    #[test]
    fn mappings_age_out() {
        let port = Rc::new(Wiretap::default());
        let mut iface = interface(port.clone());

        iface.recv_frame(&reply_from_b());
        iface.tick(NeighborCache::ENTRY_LIFETIME);

        // Cache expired: the next send falls back to resolution.
        iface.send_datagram(datagram(IP_B), IP_B);
        let frames = port.frames.borrow();
        assert_eq!(ethernet_frame::new_checked(frames.last().unwrap()).unwrap().ethertype(),
                   EthernetProtocol::Arp);
    }
}
