//! A reliable data-link layer for simulated packet-switched networks.
//!
//! Every node in a network runs a network layer that routes packets over a
//! static table, on top of a data-link layer that runs a one-bit stop-and-wait
//! ARQ protocol on each of its links. The data-link layer guarantees that
//! packets cross each link in order, exactly once and uncorrupted, however
//! unreliable the link underneath is.
//!
//! # Organization
//! - [`Message`], [`Packet`](packet::Packet) and [`Frame`](frame::Frame) are
//!   the units of data at the application, network and data-link layers
//! - [`DataLink`](datalink::DataLink) is the stop-and-wait protocol, with a
//!   [`PacketQueue`](queue::PacketQueue) per link
//! - [`Node`](node::Node) routes and forwards with a
//!   [`RoutingTable`](routing::RoutingTable)
//! - [`services`] holds the interfaces a node is driven through and calls out
//!   to
//! - [`sim`] runs whole networks of nodes over simulated links
//!
//! # Protocol structure
//!
//! A node does work only when one of three things happens: its application
//! asks to send a message, a frame arrives on one of its links, or one of its
//! timers expires. Each event is handled to completion before the next, and
//! the handler reaches the outside world only through the traits in
//! [`services`]. The per-link protocol state therefore needs no locking, and
//! the whole stack can be tested by calling the handlers directly.

mod id;
pub use id::{LinkId, NodeAddress};

mod logging;

pub mod message;
pub use message::{Message, DEFAULT_MAX_MESSAGE_SIZE};

pub mod utility;

pub mod packet;
pub use packet::ParseError as PacketError;

pub mod frame;
pub use frame::ParseError as FrameError;

pub mod queue;

pub mod services;

pub mod datalink;
pub use datalink::{DataLink, LinkError};

pub mod topology;
pub use topology::ConfigError;

pub mod routing;
pub use routing::RoutingTable;

pub mod node;
pub use node::{EventHandler, Node, RouteError};

pub mod sim;
pub use sim::{SimError, Simulation};
