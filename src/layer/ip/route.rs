//! CIDR, relevant rfc1519, rfc4632.
use core::cmp::Reverse;

use crate::wire::{Ipv4Address, Ipv4Subnet};

/// A forwarding rule: a prefix of addresses reachable through an interface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Route {
    /// The network routed through this rule.
    ///
    /// Better only set actual networks here. Host bits below the prefix
    /// length are accepted but never compared.
    pub net: Ipv4Subnet,

    /// Next hop for this network; `None` when the network is directly
    /// attached and the destination itself is the hop.
    pub next_hop: Option<Ipv4Address>,

    /// The index of the interface to send matching datagrams out on.
    pub port: usize,
}

impl Route {
    /// A rule matching every address, as used for a default gateway.
    pub fn gateway(gateway: Ipv4Address, port: usize) -> Route {
        Route {
            net: Ipv4Subnet::new(Ipv4Address::UNSPECIFIED, 0),
            next_hop: Some(gateway),
            port,
        }
    }
}

/// A routing table.
///
/// Rules are kept ordered by descending prefix length (ties broken by the
/// prefix itself), so a front-to-back scan finds the longest matching
/// prefix first.
#[derive(Debug, Default)]
pub struct Routes {
    storage: Vec<Route>,
}

impl Routes {
    /// Create an empty routing table.
    pub fn new() -> Routes {
        Routes::default()
    }

    /// Add a forwarding rule.
    pub fn add_route(&mut self, route: Route) {
        let order = |route: &Route| (Reverse(route.net.prefix_len()), route.net.prefix());
        let at = self.storage.partition_point(|other| order(other) < order(&route));
        self.storage.insert(at, route);
    }

    /// Find the rule with the longest prefix containing `addr`.
    pub fn lookup(&self, addr: Ipv4Address) -> Option<&Route> {
        self.storage.iter().find(|route| route.net.contains(addr))
    }

    /// Iterate over all rules, longest prefix first.
    pub fn iter(&self) -> impl Iterator<Item = &Route> {
        self.storage.iter()
    }

    /// The number of rules in the table.
    pub fn len(&self) -> usize {
        self.storage.len()
    }

    /// Whether the table holds no rules.
    pub fn is_empty(&self) -> bool {
        self.storage.is_empty()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn subnet(s: &str) -> Ipv4Subnet {
        let (prefix, len) = s.split_once('/').unwrap();
        Ipv4Subnet::new(prefix.parse().unwrap(), len.parse().unwrap())
    }

    fn addr(s: &str) -> Ipv4Address {
        s.parse().unwrap()
    }

    #[test]
    fn longest_prefix_wins() {
        let mut routes = Routes::new();
        routes.add_route(Route { net: subnet("10.0.0.0/8"), next_hop: None, port: 0 });
        routes.add_route(Route { net: subnet("10.1.0.0/16"), next_hop: None, port: 1 });
        routes.add_route(Route { net: subnet("0.0.0.0/0"), next_hop: Some(addr("172.16.0.1")), port: 2 });

        assert_eq!(routes.lookup(addr("10.1.2.3")).unwrap().port, 1);
        assert_eq!(routes.lookup(addr("10.2.0.1")).unwrap().port, 0);
        assert_eq!(routes.lookup(addr("8.8.8.8")).unwrap().port, 2);
    }

    #[test]
    fn insertion_order_does_not_matter() {
        let mut routes = Routes::new();
        routes.add_route(Route { net: subnet("0.0.0.0/0"), next_hop: None, port: 2 });
        routes.add_route(Route { net: subnet("10.1.0.0/16"), next_hop: None, port: 1 });
        routes.add_route(Route { net: subnet("10.0.0.0/8"), next_hop: None, port: 0 });

        let lens: Vec<u8> = routes.iter().map(|route| route.net.prefix_len()).collect();
        assert_eq!(lens, vec![16, 8, 0]);
        assert_eq!(routes.lookup(addr("10.1.2.3")).unwrap().port, 1);
    }

    #[test]
    fn equal_length_ties_break_on_prefix() {
        let mut routes = Routes::new();
        routes.add_route(Route { net: subnet("10.2.0.0/16"), next_hop: None, port: 2 });
        routes.add_route(Route { net: subnet("10.1.0.0/16"), next_hop: None, port: 1 });

        let prefixes: Vec<_> = routes.iter().map(|route| route.net.prefix()).collect();
        assert_eq!(prefixes, vec![addr("10.1.0.0"), addr("10.2.0.0")]);
    }

    #[test]
    fn no_route() {
        let mut routes = Routes::new();
        routes.add_route(Route { net: subnet("10.0.0.0/8"), next_hop: None, port: 0 });
        assert!(routes.lookup(addr("192.168.0.1")).is_none());
    }

    #[test]
    fn default_route_catches_all() {
        let mut routes = Routes::new();
        routes.add_route(Route::gateway(addr("172.16.0.1"), 3));
        let route = routes.lookup(addr("255.255.255.255")).unwrap();
        assert_eq!(route.next_hop, Some(addr("172.16.0.1")));
        assert_eq!(route.port, 3);
    }
}
