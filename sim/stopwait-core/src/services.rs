//! The services a node relies on but does not implement itself.
//!
//! A node is driven entirely by three events: an application asking to send a
//! message, a frame arriving from a link, and a timer expiring. While handling
//! an event it calls out through these traits to put frames on links, manage
//! timers and hand messages to the application. Whatever harness hosts the
//! node implements them; [`sim`](crate::sim) provides one backed by tokio.

use crate::{LinkId, Message, NodeAddress};
use std::time::Duration;

/// Physical transmission of frames.
pub trait Transport {
    /// Puts an encoded frame on the given link. Delivery is best effort: the
    /// frame may be lost, corrupted or delayed.
    fn transmit(&mut self, link: LinkId, frame: Vec<u8>);
}

/// Identifies what a timer was started for. Handed back when it expires.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimerTag {
    /// The retransmission timer of a link's outstanding data frame
    Retransmit(LinkId),
}

/// A handle for cancelling a started timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerHandle(u64);

impl TimerHandle {
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    pub fn into_inner(self) -> u64 {
        self.0
    }
}

/// One-shot timers.
pub trait Timers {
    /// Starts a timer that expires after `duration`, reporting `tag`.
    fn start_timer(&mut self, duration: Duration, tag: TimerTag) -> TimerHandle;

    /// Cancels a timer that has not yet expired.
    fn cancel_timer(&mut self, handle: TimerHandle);
}

/// The characteristics of a link that affect how long a frame takes to cross
/// it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LinkParams {
    /// In bits per second
    pub bandwidth: u64,
    pub propagation_delay: Duration,
}

impl LinkParams {
    pub fn new(bandwidth: u64, propagation_delay: Duration) -> Self {
        Self {
            bandwidth,
            propagation_delay,
        }
    }

    /// The time to clock `bytes` onto the link.
    pub fn transmission_time(&self, bytes: usize) -> Duration {
        Duration::from_micros(bytes as u64 * 8_000_000 / self.bandwidth.max(1))
    }

    /// The one-way time for a frame of `bytes` to be fully received.
    pub fn one_way_time(&self, bytes: usize) -> Duration {
        self.transmission_time(bytes) + self.propagation_delay
    }
}

/// Information about the node and its links.
pub trait Topology {
    /// This node's own address.
    fn address(&self) -> NodeAddress;

    /// How many links the node has. Links are numbered `1..=link_count()`.
    fn link_count(&self) -> usize;

    /// The characteristics of a link, if it exists.
    fn link(&self, link: LinkId) -> Option<LinkParams>;

    /// The bandwidth of a link in bits per second.
    fn bandwidth(&self, link: LinkId) -> Option<u64> {
        self.link(link).map(|params| params.bandwidth)
    }

    /// The propagation delay of a link.
    fn propagation_delay(&self, link: LinkId) -> Option<Duration> {
        self.link(link).map(|params| params.propagation_delay)
    }
}

/// Where messages addressed to this node end up.
pub trait ApplicationSink {
    fn deliver_message(&mut self, source: NodeAddress, message: Message);
}

/// Where messages to send come from.
pub trait ApplicationSource {
    /// Produces the next message to send and its destination, if the
    /// application has one ready.
    fn produce_message(&mut self) -> Option<(NodeAddress, Message)>;
}

/// Everything a node calls out to while handling an event.
pub trait NodeServices: Transport + Timers + ApplicationSink {}

impl<T: Transport + Timers + ApplicationSink + ?Sized> NodeServices for T {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn one_way_time() {
        // 56 kbit/s, 2.5 ms propagation
        let params = LinkParams::new(56_000, Duration::from_micros(2500));
        assert_eq!(params.transmission_time(70), Duration::from_micros(10_000));
        assert_eq!(params.one_way_time(70), Duration::from_micros(12_500));
    }
}
