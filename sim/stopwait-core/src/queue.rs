//! The per-link queue of packets waiting for the link to become free.
//!
//! The queue is unbounded: the network layer is never blocked and no packet
//! is ever evicted. Running out of memory aborts the node.

use crate::packet::Packet;
use std::collections::VecDeque;

/// A FIFO of packets awaiting transmission on one link.
#[derive(Debug, Default, Clone)]
pub struct PacketQueue {
    packets: VecDeque<Packet>,
}

impl PacketQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a packet to the tail of the queue. The queue takes ownership
    /// of the packet.
    pub fn enqueue(&mut self, packet: Packet) {
        self.packets.push_back(packet);
    }

    /// Removes and returns the packet at the head of the queue.
    pub fn dequeue(&mut self) -> Option<Packet> {
        self.packets.pop_front()
    }

    /// The number of packets waiting.
    pub fn len(&self) -> usize {
        self.packets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.packets.is_empty()
    }
}
