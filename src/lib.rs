//! The protocol core of a userspace TCP/IP stack.
//!
//! ## Table of contents
//!
//! 1. [The wire module](wire/index.html): field access to Ethernet, ARP and
//!    IPv4 buffers plus the sequence number arithmetic of TCP.
//! 2. [The storage module](storage/index.html): the bounded byte pipe and the
//!    stream reassembler that protocol state machines are built on.
//! 3. [The layers](layer/index.html): the TCP receiver and sender pair, the
//!    ARP-resolving Ethernet interface, and the longest-prefix-match router.
//!
//! ## Design
//!
//! Everything in this crate is single-threaded and externally driven. No
//! component blocks, spawns a task or reads a clock; progress happens only
//! when the embedding event loop calls `push`, `receive`, `recv_frame`,
//! `route` or `tick`. Time is a monotonic millisecond counter advanced by the
//! caller, which keeps every timeout deterministic and every state machine
//! testable without a runtime.
//!
//! The crate ends where raw I/O begins: frames leave through the
//! [`OutputPort`] trait and arrive as byte slices handed to
//! [`Interface::recv_frame`]. Socket surfaces, packet drivers and process
//! plumbing belong to the embedding application.
//!
//! [`OutputPort`]: layer/eth/trait.OutputPort.html
//! [`Interface::recv_frame`]: layer/eth/struct.Interface.html#method.recv_frame
#![warn(missing_docs)]
#![warn(unreachable_pub)]

#[macro_use]
mod macros;

pub mod layer;
pub mod storage;
pub mod time;
pub mod wire;
