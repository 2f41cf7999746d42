//! Application traffic for a simulation: a source generating messages to
//! random nodes and a sink checking what arrives.
//!
//! Every generated message starts with a header of the sending node's address
//! followed by a counter that increases by one for each message that node
//! sends to the same destination. The sink uses it to spot duplicated and
//! reordered deliveries. The rest of the message is random filler.

use crate::{
    services::{ApplicationSink, ApplicationSource},
    utility::BytesExt,
    Message, NodeAddress,
};
use rand::{rngs::SmallRng, seq::SliceRandom, Rng};
use rustc_hash::{FxHashMap, FxHashSet};

/// The number of bytes at the front of every generated message.
pub const TRAFFIC_HEADER_SIZE: usize = 12;

/// Generates messages addressed to random other nodes.
#[derive(Debug, Clone)]
pub struct TrafficSource {
    address: NodeAddress,
    destinations: Vec<NodeAddress>,
    counters: FxHashMap<NodeAddress, u64>,
    max_size: usize,
    rng: SmallRng,
    generated: u64,
}

impl TrafficSource {
    /// Creates a source for `address` sending to any of `destinations`
    /// except itself. Message sizes are chosen uniformly up to `max_size`,
    /// which is raised to the header size if smaller.
    pub fn new(
        address: NodeAddress,
        destinations: impl IntoIterator<Item = NodeAddress>,
        max_size: usize,
        rng: SmallRng,
    ) -> Self {
        Self {
            address,
            destinations: destinations
                .into_iter()
                .filter(|destination| *destination != address)
                .collect(),
            counters: Default::default(),
            max_size: max_size.max(TRAFFIC_HEADER_SIZE),
            rng,
            generated: 0,
        }
    }

    /// How many messages the source has produced.
    pub fn generated(&self) -> u64 {
        self.generated
    }
}

impl ApplicationSource for TrafficSource {
    fn produce_message(&mut self) -> Option<(NodeAddress, Message)> {
        let destination = *self.destinations.choose(&mut self.rng)?;
        let counter = self.counters.entry(destination).or_default();
        let sequence = *counter;
        *counter += 1;

        let size = self.rng.gen_range(TRAFFIC_HEADER_SIZE..=self.max_size);
        let mut body = Vec::with_capacity(size);
        body.extend_from_slice(&self.address.into_inner().to_le_bytes());
        body.extend_from_slice(&sequence.to_le_bytes());
        body.resize_with(size, || self.rng.gen());

        self.generated += 1;
        Some((destination, Message::new(body)))
    }
}

/// What a sink has seen from one source.
#[derive(Debug, Default, Clone)]
struct SeenFrom {
    highest: Option<u64>,
    counters: FxHashSet<u64>,
}

/// Collects delivered messages and checks them for duplicates and
/// reordering.
#[derive(Debug, Default, Clone)]
pub struct TrafficSink {
    seen: FxHashMap<NodeAddress, SeenFrom>,
    delivered: u64,
    duplicates: u64,
    out_of_order: u64,
    malformed: u64,
    record: bool,
    received: Vec<(NodeAddress, Message)>,
}

impl TrafficSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a sink that also keeps every message it is given.
    pub fn recording() -> Self {
        Self {
            record: true,
            ..Self::default()
        }
    }

    /// Messages delivered, including duplicates.
    pub fn delivered(&self) -> u64 {
        self.delivered
    }

    /// Messages delivered more than once.
    pub fn duplicates(&self) -> u64 {
        self.duplicates
    }

    /// Messages delivered after a later message from the same source.
    pub fn out_of_order(&self) -> u64 {
        self.out_of_order
    }

    /// Messages without a valid traffic header.
    pub fn malformed(&self) -> u64 {
        self.malformed
    }

    /// Every message delivered, if the sink is recording.
    pub fn received(&self) -> &[(NodeAddress, Message)] {
        &self.received
    }

    pub fn into_received(self) -> Vec<(NodeAddress, Message)> {
        self.received
    }
}

impl ApplicationSink for TrafficSink {
    fn deliver_message(&mut self, source: NodeAddress, message: Message) {
        self.delivered += 1;

        let mut header = message.iter().cloned();
        let stamped = header.next_u32_le();
        let counter = header.next_u64_le();
        match (stamped, counter) {
            (Some(stamped), Some(counter)) if NodeAddress::new(stamped) == source => {
                let seen = self.seen.entry(source).or_default();
                if !seen.counters.insert(counter) {
                    self.duplicates += 1;
                    tracing::error!(
                        source = source.into_inner(),
                        counter,
                        "Message delivered more than once"
                    );
                } else if seen.highest.map_or(false, |highest| counter < highest) {
                    self.out_of_order += 1;
                    tracing::error!(
                        source = source.into_inner(),
                        counter,
                        "Message delivered out of order"
                    );
                }
                seen.highest = seen.highest.max(Some(counter));
            }
            _ => self.malformed += 1,
        }

        if self.record {
            self.received.push((source, message));
        }
    }
}
