//! The process logic of protocol layers.
//!
//! Each protocol layer is split into two parts: the packet representation
//! contained in [`wire`] and the processing part in this module. The state
//! kept by a layer is open to inspection and reconfiguration while
//! processing does not take place, similar to reconfiguration on the OS
//! level with utilities such as `arp` or `ip route`.
//!
//! All layers share one driving model: non-blocking methods called by an
//! external event loop, with time advanced explicitly through `tick`. An
//! incoming packet that fails to parse is equivalent to a lost packet; the
//! layers drop it, note the fact at debug level, and rely on the protocols
//! above to recover.
//!
//! [`wire`]: ../wire/index.html

pub mod eth;
pub mod ip;
pub mod tcp;
