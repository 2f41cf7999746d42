//! A node: the network layer that routes and forwards packets, sitting on top
//! of the data-link layer of each of its links.

use crate::{
    datalink::{DataLink, LinkError, TimeoutPolicy},
    logging::{delivery_event, forward_event},
    message::MessageError,
    packet::Packet,
    routing::RoutingTable,
    services::{NodeServices, TimerTag, Topology},
    topology::ConfigError,
    LinkId, Message, NodeAddress, DEFAULT_MAX_MESSAGE_SIZE,
};
use std::sync::Arc;
use thiserror::Error as ThisError;

/// The three events that drive a node. Each runs to completion before the
/// next is handled.
pub trait EventHandler {
    /// The local application wants to send `message` to `destination`.
    fn on_send_request(
        &mut self,
        services: &mut dyn NodeServices,
        destination: NodeAddress,
        message: Message,
    ) -> Result<(), RouteError>;

    /// A frame arrived on one of the node's links.
    fn on_frame_arrived(
        &mut self,
        services: &mut dyn NodeServices,
        link: LinkId,
        frame: &[u8],
    ) -> Result<(), LinkError>;

    /// A timer started by the node expired.
    fn on_timer_expired(
        &mut self,
        services: &mut dyn NodeServices,
        tag: TimerTag,
    ) -> Result<(), LinkError>;
}

/// A node in the network.
#[derive(Debug, Clone)]
pub struct Node {
    address: NodeAddress,
    data_link: DataLink,
    routes: Arc<RoutingTable>,
    max_message_size: usize,
}

impl Node {
    /// Creates a node, checking that every route leaving it uses one of its
    /// links.
    pub fn new(
        topology: &(impl Topology + ?Sized),
        routes: Arc<RoutingTable>,
        timeout: TimeoutPolicy,
    ) -> Result<Self, ConfigError> {
        let address = topology.address();
        for (destination, link) in routes.routes_from(address) {
            if topology.link(link).is_none() {
                Err(ConfigError::NoSuchLink {
                    node: address,
                    destination,
                    link,
                })?
            }
        }

        Ok(Self {
            address,
            data_link: DataLink::new(topology, timeout),
            routes,
            max_message_size: DEFAULT_MAX_MESSAGE_SIZE,
        })
    }

    /// Sets the largest message the node accepts from its application.
    pub fn max_message_size(mut self, max: usize) -> Self {
        self.max_message_size = max;
        self
    }

    pub fn address(&self) -> NodeAddress {
        self.address
    }

    pub fn data_link(&self) -> &DataLink {
        &self.data_link
    }

    /// Wraps a message from the local application in a packet and sends it
    /// toward its destination.
    pub fn route(
        &mut self,
        services: &mut dyn NodeServices,
        destination: NodeAddress,
        message: Message,
    ) -> Result<(), RouteError> {
        message.validate(self.max_message_size)?;

        if destination == self.address {
            delivery_event(self.address, destination, message.len());
            services.deliver_message(self.address, message);
            return Ok(());
        }

        let link = self
            .routes
            .next_hop(self.address, destination)
            .ok_or(RouteError::NoRoute {
                node: self.address,
                destination,
            })?;
        let packet = Packet::new(destination, self.address, message);
        self.data_link.submit(services, link, packet)?;
        Ok(())
    }

    /// Hands a packet that arrived from a link to the application if it is
    /// addressed here, or sends it on toward its destination otherwise.
    /// Forwarded packets keep their original source address.
    pub fn deliver_or_forward(
        &mut self,
        services: &mut dyn NodeServices,
        packet: Packet,
    ) -> Result<(), LinkError> {
        if packet.destination == self.address {
            delivery_event(packet.source, packet.destination, packet.length());
            services.deliver_message(packet.source, packet.message);
            return Ok(());
        }

        match self.routes.next_hop(self.address, packet.destination) {
            Some(link) => {
                forward_event(packet.source, packet.destination, link);
                self.data_link.submit(services, link, packet)
            }
            None => {
                tracing::warn!(
                    node = self.address.into_inner(),
                    source = packet.source.into_inner(),
                    destination = packet.destination.into_inner(),
                    "No route for transit packet, dropping it"
                );
                Ok(())
            }
        }
    }
}

impl EventHandler for Node {
    fn on_send_request(
        &mut self,
        services: &mut dyn NodeServices,
        destination: NodeAddress,
        message: Message,
    ) -> Result<(), RouteError> {
        self.route(services, destination, message)
    }

    fn on_frame_arrived(
        &mut self,
        services: &mut dyn NodeServices,
        link: LinkId,
        frame: &[u8],
    ) -> Result<(), LinkError> {
        match self.data_link.frame_arrived(services, link, frame)? {
            Some(packet) => self.deliver_or_forward(services, packet),
            None => Ok(()),
        }
    }

    fn on_timer_expired(
        &mut self,
        services: &mut dyn NodeServices,
        tag: TimerTag,
    ) -> Result<(), LinkError> {
        self.data_link.timer_expired(services, tag)
    }
}

/// Reasons the network layer refuses a message from its application.
#[derive(Debug, ThisError, Clone, Copy, PartialEq, Eq)]
pub enum RouteError {
    #[error("Invalid message: {0}")]
    InvalidMessage(#[from] MessageError),
    #[error("Node {node} has no route to {destination}")]
    NoRoute {
        node: NodeAddress,
        destination: NodeAddress,
    },
    #[error("Data-link error: {0}")]
    Link(#[from] LinkError),
}
