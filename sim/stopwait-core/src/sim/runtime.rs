//! The task that runs one node of a simulation.

use super::{shutdown::Shutdown, traffic::TrafficSink, traffic::TrafficSource, wire::Wire, NodeReport};
use crate::{
    node::{EventHandler, Node},
    services::{ApplicationSink, ApplicationSource, TimerHandle, TimerTag, Timers, Transport},
    LinkId, Message, NodeAddress,
};
use futures::StreamExt;
use rand::{rngs::SmallRng, Rng};
use rustc_hash::FxHashMap;
use std::time::Duration;
use tokio::{
    sync::mpsc,
    time::{sleep_until, Instant},
};
use tokio_util::time::{delay_queue, DelayQueue};

/// Something that happened to a node from outside it.
#[derive(Debug)]
pub(crate) enum NodeEvent {
    /// A frame finished arriving on one of the node's links
    FrameArrived { link: LinkId, frame: Vec<u8> },
}

/// Everything a node calls out to, backed by tokio.
pub(crate) struct NodeIo {
    wires: Vec<Wire>,
    rng: SmallRng,
    timers: DelayQueue<(TimerHandle, TimerTag)>,
    keys: FxHashMap<TimerHandle, delay_queue::Key>,
    next_timer: u64,
    sink: TrafficSink,
}

impl NodeIo {
    pub fn new(wires: Vec<Wire>, rng: SmallRng, sink: TrafficSink) -> Self {
        Self {
            wires,
            rng,
            timers: DelayQueue::new(),
            keys: Default::default(),
            next_timer: 0,
            sink,
        }
    }
}

impl Transport for NodeIo {
    fn transmit(&mut self, link: LinkId, frame: Vec<u8>) {
        match self.wires.get_mut(link.index()) {
            Some(wire) => wire.send(frame, &mut self.rng),
            None => tracing::error!(link = link.into_inner(), "Transmit on a missing link"),
        }
    }
}

impl Timers for NodeIo {
    fn start_timer(&mut self, duration: Duration, tag: TimerTag) -> TimerHandle {
        let handle = TimerHandle::new(self.next_timer);
        self.next_timer += 1;
        let key = self.timers.insert((handle, tag), duration);
        self.keys.insert(handle, key);
        handle
    }

    fn cancel_timer(&mut self, handle: TimerHandle) {
        if let Some(key) = self.keys.remove(&handle) {
            self.timers.remove(&key);
        }
    }
}

impl ApplicationSink for NodeIo {
    fn deliver_message(&mut self, source: NodeAddress, message: Message) {
        self.sink.deliver_message(source, message);
    }
}

/// How a node generates its own traffic.
#[derive(Debug, Clone, Copy)]
pub(crate) struct TrafficPlan {
    /// The mean time between messages
    pub interval: Duration,
    /// No messages are generated after this
    pub until: Instant,
}

pub(crate) struct NodeRuntime {
    pub node: Node,
    pub name: Option<String>,
    pub io: NodeIo,
    pub events: mpsc::UnboundedReceiver<NodeEvent>,
    pub source: Option<TrafficSource>,
    pub plan: TrafficPlan,
    /// Messages to send as soon as the node starts
    pub scripted: Vec<(NodeAddress, Message)>,
    pub shutdown: Shutdown,
    pub rejected: u64,
}

impl NodeRuntime {
    /// Handles events until the simulation shuts down, then reports what
    /// the node saw.
    pub async fn run(mut self) -> NodeReport {
        for (destination, message) in std::mem::take(&mut self.scripted) {
            self.send(destination, message);
        }

        let mut next_message = self.next_message_at(Instant::now());
        let tick = sleep_until(next_message.unwrap_or_else(Instant::now));
        tokio::pin!(tick);

        loop {
            tokio::select! {
                Some(event) = self.events.recv() => {
                    let NodeEvent::FrameArrived { link, frame } = event;
                    if let Err(e) = self.node.on_frame_arrived(&mut self.io, link, &frame) {
                        tracing::error!(node = self.node.address().into_inner(), "{}", e);
                    }
                }

                Some(expired) = self.io.timers.next() => {
                    let (handle, tag) = expired.into_inner();
                    self.io.keys.remove(&handle);
                    if let Err(e) = self.node.on_timer_expired(&mut self.io, tag) {
                        tracing::error!(node = self.node.address().into_inner(), "{}", e);
                    }
                }

                _ = &mut tick, if next_message.is_some() => {
                    let produced = self.source.as_mut().and_then(|source| source.produce_message());
                    if let Some((destination, message)) = produced {
                        self.send(destination, message);
                    }
                    next_message = self.next_message_at(Instant::now());
                    if let Some(at) = next_message {
                        tick.as_mut().reset(at);
                    }
                }

                _ = self.shutdown.wait_for_shutdown() => break,
            }
        }

        self.report()
    }

    fn send(&mut self, destination: NodeAddress, message: Message) {
        if let Err(e) = self.node.on_send_request(&mut self.io, destination, message) {
            self.rejected += 1;
            tracing::error!(node = self.node.address().into_inner(), "{}", e);
        }
    }

    /// When to generate the next message, if the node is still generating.
    fn next_message_at(&mut self, now: Instant) -> Option<Instant> {
        self.source.as_ref()?;
        let interval = self.plan.interval;
        let wait = self.io.rng.gen_range(interval / 2..=interval * 3 / 2);
        Some(now + wait).filter(|at| *at < self.plan.until)
    }

    fn report(self) -> NodeReport {
        let data_link = self.node.data_link();
        NodeReport {
            address: self.node.address(),
            name: self.name,
            generated: self.source.as_ref().map_or(0, TrafficSource::generated),
            rejected: self.rejected,
            delivered: self.io.sink.delivered(),
            duplicates: self.io.sink.duplicates(),
            out_of_order: self.io.sink.out_of_order(),
            backlog: data_link.links().map(|(_, state)| state.queued()).sum(),
            unacknowledged: data_link.links().filter(|(_, state)| !state.is_idle()).count(),
            links: data_link
                .links()
                .map(|(link, state)| (link, state.stats()))
                .collect(),
            received: self.io.sink.into_received(),
        }
    }
}
