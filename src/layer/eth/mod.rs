//! The Ethernet layer.
//!
//! This layer owns the translation between IP datagrams and Ethernet frames:
//! an [`Interface`] resolves next-hop protocol addresses to hardware
//! addresses over ARP, queues datagrams while a resolution is outstanding,
//! and hands inbound datagrams upward. The mappings it learns live in a
//! [`NeighborCache`] and age out; resolution attempts are rate-limited per
//! target.
//!
//! [`Interface`]: struct.Interface.html
//! [`NeighborCache`]: struct.NeighborCache.html

mod interface;
mod neighbor;

pub use self::interface::{Interface, OutputPort};
pub use self::neighbor::NeighborCache;
