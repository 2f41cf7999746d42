//! Descriptions of a whole network: its nodes, the links between them and the
//! characteristics of each link.

use crate::{
    services::{LinkParams, Topology},
    LinkId, NodeAddress,
};
use rustc_hash::FxHashSet;
use std::time::Duration;
use thiserror::Error as ThisError;

/// The bandwidth of a link unless otherwise configured, in bits per second.
pub const DEFAULT_BANDWIDTH: u64 = 56_000;

/// The propagation delay of a link unless otherwise configured.
pub const DEFAULT_PROPAGATION_DELAY: Duration = Duration::from_micros(2500);

/// A node in a network description.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeSpec {
    pub address: NodeAddress,
    /// A human-readable name used in logs and reports
    pub name: Option<String>,
}

impl NodeSpec {
    pub fn new(address: NodeAddress) -> Self {
        Self {
            address,
            name: None,
        }
    }

    pub fn named(address: NodeAddress, name: impl Into<String>) -> Self {
        Self {
            address,
            name: Some(name.into()),
        }
    }
}

/// A bidirectional point-to-point link between two nodes.
#[derive(Debug, Clone, PartialEq)]
pub struct LinkSpec {
    pub a: NodeAddress,
    pub b: NodeAddress,
    /// In bits per second
    pub bandwidth: u64,
    pub propagation_delay: Duration,
    /// The probability that a frame is lost in transit
    pub loss: f64,
    /// The probability that a frame arrives with a bit flipped
    pub corruption: f64,
}

impl LinkSpec {
    /// Creates an error-free link with the default bandwidth and delay.
    pub fn new(a: NodeAddress, b: NodeAddress) -> Self {
        Self {
            a,
            b,
            bandwidth: DEFAULT_BANDWIDTH,
            propagation_delay: DEFAULT_PROPAGATION_DELAY,
            loss: 0.0,
            corruption: 0.0,
        }
    }

    pub fn bandwidth(mut self, bandwidth: u64) -> Self {
        self.bandwidth = bandwidth;
        self
    }

    pub fn propagation_delay(mut self, delay: Duration) -> Self {
        self.propagation_delay = delay;
        self
    }

    pub fn loss(mut self, loss: f64) -> Self {
        self.loss = loss;
        self
    }

    pub fn corruption(mut self, corruption: f64) -> Self {
        self.corruption = corruption;
        self
    }

    pub fn params(&self) -> LinkParams {
        LinkParams::new(self.bandwidth, self.propagation_delay)
    }

    /// Whether this link has `node` at either end.
    pub fn touches(&self, node: NodeAddress) -> bool {
        self.a == node || self.b == node
    }

    /// The node at the other end of the link from `node`.
    pub fn peer(&self, node: NodeAddress) -> NodeAddress {
        if self.a == node {
            self.b
        } else {
            self.a
        }
    }
}

/// One end of a link as seen from a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Attachment {
    /// The link's number at this node
    pub link: LinkId,
    /// The link's position in [`NetworkSpec::links`]
    pub spec_index: usize,
    /// The node at the far end
    pub peer: NodeAddress,
    /// The same link's number at the far end
    pub peer_link: LinkId,
}

/// A validated description of a network.
///
/// A node's links are numbered from 1 in the order they appear in the link
/// list, so the first link declared with a node at either end is that node's
/// link 1.
#[derive(Debug, Clone, PartialEq)]
pub struct NetworkSpec {
    nodes: Vec<NodeSpec>,
    links: Vec<LinkSpec>,
}

impl NetworkSpec {
    pub fn new(nodes: Vec<NodeSpec>, links: Vec<LinkSpec>) -> Result<Self, ConfigError> {
        let mut seen = FxHashSet::default();
        for node in nodes.iter() {
            if !seen.insert(node.address) {
                Err(ConfigError::DuplicateNode(node.address))?
            }
        }

        for link in links.iter() {
            for end in [link.a, link.b] {
                if !seen.contains(&end) {
                    Err(ConfigError::UnknownNode(end))?
                }
            }
            if link.a == link.b {
                Err(ConfigError::SelfLink(link.a))?
            }
            if link.bandwidth == 0 {
                Err(ConfigError::ZeroBandwidth(link.a, link.b))?
            }
            for (name, value) in [("loss", link.loss), ("corruption", link.corruption)] {
                if !(0.0..=1.0).contains(&value) {
                    Err(ConfigError::InvalidProbability { name, value })?
                }
            }
        }

        Ok(Self { nodes, links })
    }

    pub fn nodes(&self) -> &[NodeSpec] {
        &self.nodes
    }

    pub fn links(&self) -> &[LinkSpec] {
        &self.links
    }

    pub fn node(&self, address: NodeAddress) -> Option<&NodeSpec> {
        self.nodes.iter().find(|node| node.address == address)
    }

    pub fn contains(&self, address: NodeAddress) -> bool {
        self.node(address).is_some()
    }

    /// The indices into [`links`](Self::links) of the links attached to a
    /// node, in link number order.
    fn link_indices(&self, node: NodeAddress) -> impl Iterator<Item = usize> + '_ {
        self.links
            .iter()
            .enumerate()
            .filter(move |(_, link)| link.touches(node))
            .map(|(index, _)| index)
    }

    /// Every link attached to a node, in link number order.
    pub fn attachments(&self, node: NodeAddress) -> Vec<Attachment> {
        self.link_indices(node)
            .enumerate()
            .map(|(position, spec_index)| {
                let peer = self.links[spec_index].peer(node);
                let peer_position = self
                    .link_indices(peer)
                    .position(|index| index == spec_index)
                    .unwrap_or_default();
                Attachment {
                    link: LinkId::from_index(position),
                    spec_index,
                    peer,
                    peer_link: LinkId::from_index(peer_position),
                }
            })
            .collect()
    }

    /// The view of the network from one node.
    pub fn topology(&self, node: NodeAddress) -> Option<NodeTopology> {
        self.contains(node).then(|| NodeTopology {
            address: node,
            links: self
                .link_indices(node)
                .map(|index| self.links[index].params())
                .collect(),
        })
    }
}

/// A node's own address and the characteristics of its links.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeTopology {
    address: NodeAddress,
    links: Vec<LinkParams>,
}

impl NodeTopology {
    pub fn new(address: NodeAddress, links: Vec<LinkParams>) -> Self {
        Self { address, links }
    }
}

impl Topology for NodeTopology {
    fn address(&self) -> NodeAddress {
        self.address
    }

    fn link_count(&self) -> usize {
        self.links.len()
    }

    fn link(&self, link: LinkId) -> Option<LinkParams> {
        self.links.get(link.index()).copied()
    }
}

#[derive(Debug, ThisError, Clone, PartialEq)]
pub enum ConfigError {
    #[error("Node {0} is declared more than once")]
    DuplicateNode(NodeAddress),
    #[error("Node {0} is referenced but never declared")]
    UnknownNode(NodeAddress),
    #[error("Node {0} has a link to itself")]
    SelfLink(NodeAddress),
    #[error("The link between {0} and {1} has zero bandwidth")]
    ZeroBandwidth(NodeAddress, NodeAddress),
    #[error("The {name} probability {value} is outside [0, 1]")]
    InvalidProbability { name: &'static str, value: f64 },
    #[error("Node {node} routes {destination} over link {link}, which does not exist")]
    NoSuchLink {
        node: NodeAddress,
        destination: NodeAddress,
        link: LinkId,
    },
}
