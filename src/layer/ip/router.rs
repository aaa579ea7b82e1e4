use log::debug;

use crate::layer::eth::Interface;
use crate::time::Duration;
use crate::wire::ipv4_packet;

use super::{Route, Routes};

/// A router with multiple network interfaces, performing
/// longest-prefix-match forwarding between them.
///
/// The router owns its interfaces and is driven like everything else: call
/// [`route`] after frames were delivered to the interfaces, and [`tick`] as
/// time passes.
///
/// [`route`]: #method.route
/// [`tick`]: #method.tick
#[derive(Default)]
pub struct Router {
    interfaces: Vec<Interface>,
    routes: Routes,
}

impl Router {
    /// Create a router with no interfaces and an empty table.
    pub fn new() -> Router {
        Router::default()
    }

    /// Add an interface, returning the index that routes refer to it by.
    pub fn add_interface(&mut self, interface: Interface) -> usize {
        self.interfaces.push(interface);
        self.interfaces.len() - 1
    }

    /// Access an interface by index.
    ///
    /// # Panics
    /// Panics if no interface with this index exists.
    pub fn interface(&self, index: usize) -> &Interface {
        &self.interfaces[index]
    }

    /// Access an interface by index, mutably.
    ///
    /// # Panics
    /// Panics if no interface with this index exists.
    pub fn interface_mut(&mut self, index: usize) -> &mut Interface {
        &mut self.interfaces[index]
    }

    /// Add a forwarding rule.
    pub fn add_route(&mut self, route: Route) {
        self.routes.add_route(route);
    }

    /// The routing table.
    pub fn routes(&self) -> &Routes {
        &self.routes
    }

    /// Forward every datagram received on any interface to its proper
    /// outgoing interface.
    ///
    /// A datagram is dropped when its TTL is spent before the hop or when no
    /// route matches its destination; forwarded datagrams leave with the TTL
    /// decremented and the header checksum recomputed.
    pub fn route(&mut self) {
        for index in 0..self.interfaces.len() {
            while let Some(mut datagram) = self.interfaces[index].poll_inbound() {
                let (dst, ttl) = {
                    let packet = match ipv4_packet::new_checked(&datagram) {
                        Ok(packet) => packet,
                        Err(err) => {
                            debug!("router: discarding datagram: {}", err);
                            continue;
                        }
                    };
                    (packet.dst_addr(), packet.ttl())
                };

                if ttl <= 1 {
                    debug!("router: dropping datagram for {}: ttl expired", dst);
                    continue;
                }
                {
                    let packet = ipv4_packet::new_unchecked_mut(&mut datagram);
                    packet.set_ttl(ttl - 1);
                    packet.fill_checksum();
                }

                let (next_hop, port) = match self.routes.lookup(dst) {
                    Some(route) => (route.next_hop.unwrap_or(dst), route.port),
                    None => {
                        debug!("router: no route for {}", dst);
                        continue;
                    }
                };
                self.interfaces[port].send_datagram(datagram, next_hop);
            }
        }
    }

    /// Let `elapsed` time pass on every interface.
    pub fn tick(&mut self, elapsed: Duration) {
        for interface in &mut self.interfaces {
            interface.tick(elapsed);
        }
    }
}
