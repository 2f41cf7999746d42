//! A simulated internet to run nodes on.
//!
//! Every node runs as its own tokio task, handling one event at a time:
//! frames arriving from its links, its retransmission timers expiring, and
//! its application generating messages. Each direction of a link is a wire
//! that delays, drops and corrupts frames according to the network description.
//!
//! Time in a simulation is tokio time. Running with the clock paused (as the
//! tests and the command line tool do) lets minutes of simulated traffic play
//! out in well under a second while keeping every delay exact.
//!
//! ```
//! # use stopwait_core::{sim::{Simulation, SimConfig}, topology::*, NodeAddress, Message};
//! # use std::time::Duration;
//! # #[tokio::main(flavor = "current_thread", start_paused = true)]
//! # async fn main() {
//! let (a, b) = (NodeAddress::new(0), NodeAddress::new(1));
//! let network = NetworkSpec::new(
//!     vec![NodeSpec::new(a), NodeSpec::new(b)],
//!     vec![LinkSpec::new(a, b)],
//! )
//! .unwrap();
//! let mut sim = Simulation::with_shortest_paths(network, SimConfig::scripted()).unwrap();
//! sim.send(a, b, Message::new("hello"));
//! let report = sim.run().await.unwrap();
//! assert_eq!(report.node(b).unwrap().received, [(a, Message::new("hello"))]);
//! # }
//! ```

mod runtime;
mod shutdown;
mod traffic;
mod wire;

pub use shutdown::{ExitStatus, Shutdown};
pub use traffic::{TrafficSink, TrafficSource, TRAFFIC_HEADER_SIZE};

use self::{
    runtime::{NodeIo, NodeRuntime, TrafficPlan},
    wire::Wire,
};
use crate::{
    datalink::{LinkStats, TimeoutPolicy},
    node::Node,
    routing::RoutingTable,
    topology::{ConfigError, NetworkSpec},
    LinkId, Message, NodeAddress, DEFAULT_MAX_MESSAGE_SIZE,
};
use rand::{rngs::SmallRng, SeedableRng};
use rustc_hash::FxHashMap;
use std::{sync::Arc, time::Duration};
use thiserror::Error as ThisError;
use tokio::{sync::mpsc, task::JoinSet, time::Instant};

/// The longest simulated time a run may cover, counting both traffic and
/// drain. Also bounds the traffic interval.
pub const MAX_RUN_TIME: Duration = Duration::from_secs(365 * 24 * 60 * 60);

/// Settings for a simulation run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SimConfig {
    /// How long nodes generate traffic for
    pub duration: Duration,
    /// How long to keep running after traffic stops, so that messages in
    /// flight can arrive
    pub drain: Duration,
    /// Seeds every random choice, so the same seed gives the same run
    pub seed: u64,
    /// The mean time between messages generated at each node. `None` or zero
    /// disables generated traffic.
    pub interval: Option<Duration>,
    /// The largest message a node accepts and generates
    pub max_message_size: usize,
    pub timeout: TimeoutPolicy,
    /// Whether to keep every delivered message in the report
    pub record_messages: bool,
}

impl SimConfig {
    /// Settings for a run driven only by messages given to
    /// [`Simulation::send`], with every delivery recorded.
    pub fn scripted() -> Self {
        Self {
            duration: Duration::ZERO,
            drain: Duration::from_secs(60),
            interval: None,
            record_messages: true,
            ..Self::default()
        }
    }
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            duration: Duration::from_secs(120),
            drain: Duration::from_secs(60),
            seed: 0xBAD5EED,
            interval: Some(Duration::from_secs(5)),
            max_message_size: DEFAULT_MAX_MESSAGE_SIZE,
            timeout: TimeoutPolicy::default(),
            record_messages: false,
        }
    }
}

/// A network of nodes ready to run.
#[derive(Debug)]
pub struct Simulation {
    network: NetworkSpec,
    nodes: Vec<Node>,
    config: SimConfig,
    scripted: Vec<(NodeAddress, NodeAddress, Message)>,
    shutdown: Shutdown,
}

impl Simulation {
    /// Creates a simulation of `network` whose nodes route with `routes`.
    pub fn new(
        network: NetworkSpec,
        routes: RoutingTable,
        config: SimConfig,
    ) -> Result<Self, SimError> {
        if network.nodes().is_empty() {
            Err(SimError::NoNodes)?
        }
        let run_time = config.duration.saturating_add(config.drain);
        if run_time > MAX_RUN_TIME || config.interval.map_or(false, |i| i > MAX_RUN_TIME) {
            Err(SimError::RunTooLong)?
        }

        let routes = Arc::new(routes);
        let nodes = network
            .nodes()
            .iter()
            .map(|spec| {
                let topology = network
                    .topology(spec.address)
                    .ok_or(ConfigError::UnknownNode(spec.address))?;
                Ok(Node::new(&topology, routes.clone(), config.timeout)?
                    .max_message_size(config.max_message_size))
            })
            .collect::<Result<Vec<_>, SimError>>()?;

        Ok(Self {
            network,
            nodes,
            config,
            scripted: vec![],
            shutdown: Shutdown::new(),
        })
    }

    /// Creates a simulation of `network` routing along shortest paths.
    pub fn with_shortest_paths(network: NetworkSpec, config: SimConfig) -> Result<Self, SimError> {
        let routes = RoutingTable::shortest_paths(&network);
        Self::new(network, routes, config)
    }

    /// Has `source` send `message` to `destination` as soon as the simulation
    /// starts. Messages from the same source are sent in the order given.
    pub fn send(&mut self, source: NodeAddress, destination: NodeAddress, message: Message) {
        self.scripted.push((source, destination, message));
    }

    /// Gets a [`Shutdown`] that can stop the simulation early.
    pub fn shutdown(&self) -> Shutdown {
        self.shutdown.clone()
    }

    pub fn network(&self) -> &NetworkSpec {
        &self.network
    }

    /// Runs the simulation to completion.
    pub async fn run(self) -> Result<SimReport, SimError> {
        let Self {
            network,
            nodes,
            config,
            mut scripted,
            mut shutdown,
        } = self;

        let start = Instant::now();
        // a zero interval would generate messages without time ever moving
        let interval = config.interval.filter(|interval| !interval.is_zero());
        let plan = TrafficPlan {
            interval: interval.unwrap_or_default(),
            until: start + config.duration,
        };

        let (senders, mut receivers): (FxHashMap<_, _>, FxHashMap<_, _>) = network
            .nodes()
            .iter()
            .map(|spec| {
                let (send, receive) = mpsc::unbounded_channel();
                ((spec.address, send), (spec.address, receive))
            })
            .unzip();

        let mut tasks = JoinSet::new();
        for node in nodes {
            let address = node.address();
            let seed = config.seed ^ u64::from(address.into_inner()).wrapping_mul(0x9E37_79B9_7F4A_7C15);

            let wires = network
                .attachments(address)
                .into_iter()
                .filter_map(|attachment| {
                    let peer = senders.get(&attachment.peer)?.clone();
                    let spec = &network.links()[attachment.spec_index];
                    Some(Wire::new(spec, peer, attachment.peer_link))
                })
                .collect();

            let sink = if config.record_messages {
                TrafficSink::recording()
            } else {
                TrafficSink::new()
            };
            let source = interval.map(|_| {
                TrafficSource::new(
                    address,
                    network.nodes().iter().map(|spec| spec.address),
                    config.max_message_size,
                    SmallRng::seed_from_u64(seed.rotate_left(32)),
                )
            });

            let (mine, others): (Vec<_>, Vec<_>) = scripted
                .into_iter()
                .partition(|(source, _, _)| *source == address);
            scripted = others;

            let runtime = NodeRuntime {
                name: network.node(address).and_then(|spec| spec.name.clone()),
                io: NodeIo::new(wires, SmallRng::seed_from_u64(seed), sink),
                events: receivers
                    .remove(&address)
                    .ok_or(ConfigError::UnknownNode(address))?,
                source,
                plan,
                scripted: mine
                    .into_iter()
                    .map(|(_, destination, message)| (destination, message))
                    .collect(),
                shutdown: shutdown.clone(),
                rejected: 0,
                node,
            };
            tasks.spawn(runtime.run());
        }
        drop(senders);

        for (source, destination, _) in scripted {
            tracing::warn!(
                source = source.into_inner(),
                destination = destination.into_inner(),
                "Dropping scripted message from a node not in the network"
            );
        }

        tracing::info!(nodes = tasks.len(), "Simulation started");
        let end = start + config.duration + config.drain;
        let status = tokio::select! {
            _ = tokio::time::sleep_until(end) => {
                shutdown.shut_down();
                ExitStatus::Exited
            }
            status = shutdown.wait_for_shutdown() => status,
        };

        let mut nodes = vec![];
        while let Some(report) = tasks.join_next().await {
            nodes.push(report?);
        }
        nodes.sort_by_key(|report| report.address);
        tracing::info!(elapsed = ?start.elapsed(), "Simulation finished");

        Ok(SimReport {
            status,
            elapsed: start.elapsed(),
            nodes,
        })
    }
}

/// What one node saw during a simulation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeReport {
    pub address: NodeAddress,
    pub name: Option<String>,
    /// Messages the node's application generated
    pub generated: u64,
    /// Messages the network layer refused to send
    pub rejected: u64,
    /// Messages delivered to the node's application, including duplicates
    pub delivered: u64,
    pub duplicates: u64,
    pub out_of_order: u64,
    /// Packets still waiting in link queues at the end
    pub backlog: usize,
    /// Links still waiting on an acknowledgement at the end
    pub unacknowledged: usize,
    pub links: Vec<(LinkId, LinkStats)>,
    /// Every delivered message and its source, if recording was enabled
    pub received: Vec<(NodeAddress, Message)>,
}

/// The outcome of a simulation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimReport {
    pub status: ExitStatus,
    /// Simulated time the run took
    pub elapsed: Duration,
    /// One report per node, in address order
    pub nodes: Vec<NodeReport>,
}

impl SimReport {
    pub fn node(&self, address: NodeAddress) -> Option<&NodeReport> {
        self.nodes.iter().find(|node| node.address == address)
    }

    pub fn generated(&self) -> u64 {
        self.nodes.iter().map(|node| node.generated).sum()
    }

    pub fn delivered(&self) -> u64 {
        self.nodes.iter().map(|node| node.delivered).sum()
    }

    pub fn duplicates(&self) -> u64 {
        self.nodes.iter().map(|node| node.duplicates).sum()
    }

    pub fn out_of_order(&self) -> u64 {
        self.nodes.iter().map(|node| node.out_of_order).sum()
    }

    /// Whether every link ended idle with nothing queued.
    pub fn drained(&self) -> bool {
        self.nodes
            .iter()
            .all(|node| node.backlog == 0 && node.unacknowledged == 0)
    }

    /// The statistics of every link of every node added together.
    pub fn link_totals(&self) -> LinkStats {
        let mut total = LinkStats::default();
        for (_, stats) in self.nodes.iter().flat_map(|node| node.links.iter()) {
            total += *stats;
        }
        total
    }
}

#[derive(Debug, ThisError)]
pub enum SimError {
    #[error("Invalid network: {0}")]
    Config(#[from] ConfigError),
    #[error("A simulation needs at least one node")]
    NoNodes,
    #[error("A simulation may cover at most {} seconds", MAX_RUN_TIME.as_secs())]
    RunTooLong,
    #[error("A node task failed: {0}")]
    Node(#[from] tokio::task::JoinError),
}
