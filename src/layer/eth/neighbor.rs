// Heads up! Before working on this file you should read, at least,
// the parts of RFC 1122 that discuss ARP.
use std::collections::BTreeMap;

use crate::time::{Duration, Expiration, Instant};
use crate::wire::{EthernetAddress, Ipv4Address};

/// A cached neighbor.
///
/// A neighbor mapping translates from a protocol address to a hardware
/// address and carries the timestamp past which the mapping should be
/// considered invalid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Neighbor {
    hardware_addr: EthernetAddress,
    expires_at: Expiration,
}

/// A cache of IP-to-Ethernet address mappings learned from ARP traffic.
///
/// Besides the mappings themselves the cache remembers when it last asked
/// for each still-unresolved address, so that lookups of the same target do
/// not flood the segment with requests.
#[derive(Debug, Default)]
pub struct NeighborCache {
    mappings: BTreeMap<Ipv4Address, Neighbor>,
    requested: BTreeMap<Ipv4Address, Instant>,
}

impl NeighborCache {
    /// Minimum delay between resolution requests for one address.
    pub const SILENT_TIME: Duration = Duration::from_millis(5_000);

    /// Neighbor entry lifetime.
    pub const ENTRY_LIFETIME: Duration = Duration::from_millis(30_000);

    /// Create an empty cache.
    pub fn new() -> NeighborCache {
        NeighborCache::default()
    }

    /// Learn a mapping, starting its lifetime at `timestamp`.
    ///
    /// Provide the current timestamp or `None` to disable expiration. A
    /// fresh observation of an already-known neighbor refreshes the expiry.
    /// Any outstanding request state for the address is resolved.
    pub fn fill(
        &mut self,
        protocol_addr: Ipv4Address,
        hardware_addr: EthernetAddress,
        timestamp: Option<Instant>,
    ) {
        self.mappings.insert(protocol_addr, Neighbor {
            hardware_addr,
            expires_at: timestamp.map(|ts| ts + Self::ENTRY_LIFETIME).into(),
        });
        self.requested.remove(&protocol_addr);
    }

    /// Look up a non-expired mapping.
    pub fn lookup(&self, protocol_addr: Ipv4Address, timestamp: Instant) -> Option<EthernetAddress> {
        let neighbor = self.mappings.get(&protocol_addr)?;
        if Expiration::When(timestamp) < neighbor.expires_at {
            Some(neighbor.hardware_addr)
        } else {
            None
        }
    }

    /// Whether a resolution request for this address may be sent now.
    ///
    /// False while an earlier request is within its silence window.
    pub fn should_request(&self, protocol_addr: Ipv4Address, timestamp: Instant) -> bool {
        match self.requested.get(&protocol_addr) {
            Some(&at) => timestamp - at >= Self::SILENT_TIME,
            None => true,
        }
    }

    /// Note that a resolution request for this address was sent.
    pub fn requesting(&mut self, protocol_addr: Ipv4Address, timestamp: Instant) {
        self.requested.insert(protocol_addr, timestamp);
    }

    /// Drop mappings whose lifetime ended and request records past their
    /// silence window.
    pub fn expire(&mut self, timestamp: Instant) {
        self.mappings.retain(|_, neighbor| Expiration::When(timestamp) < neighbor.expires_at);
        self.requested.retain(|_, &mut at| timestamp - at < Self::SILENT_TIME);
    }

    /// The number of live mappings.
    pub fn len(&self) -> usize {
        self.mappings.len()
    }

    /// Whether no mapping is currently known.
    pub fn is_empty(&self) -> bool {
        self.mappings.is_empty()
    }
}
