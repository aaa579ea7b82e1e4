//! The internet layer.
//!
//! Forwarding between Ethernet segments: a [`Router`] owns a set of
//! [`Interface`]s and a table of [`Routes`], moving each received datagram
//! to the interface of its longest matching prefix.
//!
//! [`Router`]: struct.Router.html
//! [`Interface`]: ../eth/struct.Interface.html
//! [`Routes`]: struct.Routes.html

mod route;
mod router;

pub use self::route::{Route, Routes};
pub use self::router::Router;
