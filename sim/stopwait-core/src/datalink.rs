//! The data-link layer: one-bit stop-and-wait ARQ, run independently on every
//! link of a node.
//!
//! Each link holds at most one unacknowledged data frame. Packets handed down
//! by the network layer wait in the link's [`PacketQueue`] until the frame in
//! flight is acknowledged. Whether a frame is in flight is read off the two
//! sender-side sequence bits alone: the link is idle exactly when
//! `ack_expected == next_frame_to_send`.
//!
//! | event                             | action                                            |
//! |-----------------------------------|---------------------------------------------------|
//! | packet submitted                  | enqueue, then transmit the head if idle           |
//! | ACK for `ack_expected`            | cancel timer, toggle `ack_expected`, send next    |
//! | any other ACK                     | ignore                                            |
//! | DATA for `frame_expected`         | toggle `frame_expected`, deliver, ACK it          |
//! | any other DATA                    | ACK it without delivering                         |
//! | retransmission timer              | resend the stored frame unchanged, restart timer  |
//! | frame fails its checksum          | ignore                                            |
//!
//! Frames that fail verification, duplicates and stale acknowledgements are
//! part of normal operation on a lossy link. They are counted in
//! [`LinkStats`] and logged but never reported as errors.

use crate::{
    frame::{Frame, FrameKind, Sequence},
    logging::{
        ack_received_event, ack_sent_event, corrupt_frame_event, data_accepted_event,
        data_sent_event, duplicate_event, stale_ack_event,
    },
    packet::Packet,
    queue::PacketQueue,
    services::{LinkParams, TimerHandle, TimerTag, Timers, Topology, Transport},
    LinkId,
};
use std::{num::NonZeroU32, time::Duration};

#[cfg(test)]
mod tests;

/// Decides how long to wait for an acknowledgement before retransmitting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeoutPolicy {
    /// How many one-way frame times to wait
    pub multiplier: NonZeroU32,
}

impl TimeoutPolicy {
    pub const DEFAULT_MULTIPLIER: NonZeroU32 = match NonZeroU32::new(3) {
        Some(multiplier) => multiplier,
        None => panic!("the default multiplier is zero"),
    };

    /// No timer is ever shorter than this, even on a link that takes no time
    /// to cross. A zero timeout would fire again at the same instant forever.
    pub const MIN_TIMEOUT: Duration = Duration::from_micros(1);

    pub fn new(multiplier: NonZeroU32) -> Self {
        Self { multiplier }
    }

    /// The retransmission timeout for a frame of `frame_bytes` on a link.
    pub fn timeout(&self, params: &LinkParams, frame_bytes: usize) -> Duration {
        (params.one_way_time(frame_bytes) * self.multiplier.get()).max(Self::MIN_TIMEOUT)
    }
}

impl Default for TimeoutPolicy {
    fn default() -> Self {
        Self::new(Self::DEFAULT_MULTIPLIER)
    }
}

/// Counters of the protocol events seen on one link.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct LinkStats {
    /// Data frames transmitted for the first time
    pub data_sent: u64,
    /// Data frames transmitted again after a timeout
    pub retransmissions: u64,
    pub acks_sent: u64,
    /// Acknowledgements that freed the link
    pub acks_received: u64,
    /// Acknowledgements for frames that were not outstanding
    pub stale_acks: u64,
    /// Data frames received with an unexpected sequence number
    pub duplicates_rejected: u64,
    /// Frames that failed verification
    pub corrupted: u64,
    /// Data frames accepted and handed to the network layer
    pub accepted: u64,
}

impl std::ops::AddAssign for LinkStats {
    fn add_assign(&mut self, rhs: Self) {
        self.data_sent += rhs.data_sent;
        self.retransmissions += rhs.retransmissions;
        self.acks_sent += rhs.acks_sent;
        self.acks_received += rhs.acks_received;
        self.stale_acks += rhs.stale_acks;
        self.duplicates_rejected += rhs.duplicates_rejected;
        self.corrupted += rhs.corrupted;
        self.accepted += rhs.accepted;
    }
}

/// The protocol state of a single link.
#[derive(Debug, Clone)]
pub struct LinkState {
    params: LinkParams,
    ack_expected: Sequence,
    next_frame_to_send: Sequence,
    frame_expected: Sequence,
    pending_timer: Option<TimerHandle>,
    /// The exact bytes of the last data frame sent, kept for retransmission
    outgoing_frame: Option<Vec<u8>>,
    queue: PacketQueue,
    stats: LinkStats,
}

impl LinkState {
    fn new(params: LinkParams) -> Self {
        Self {
            params,
            ack_expected: Sequence::Zero,
            next_frame_to_send: Sequence::Zero,
            frame_expected: Sequence::Zero,
            pending_timer: None,
            outgoing_frame: None,
            queue: PacketQueue::new(),
            stats: LinkStats::default(),
        }
    }

    /// Whether the link is free to send a new data frame.
    pub fn is_idle(&self) -> bool {
        self.ack_expected == self.next_frame_to_send
    }

    pub fn ack_expected(&self) -> Sequence {
        self.ack_expected
    }

    pub fn next_frame_to_send(&self) -> Sequence {
        self.next_frame_to_send
    }

    pub fn frame_expected(&self) -> Sequence {
        self.frame_expected
    }

    pub fn pending_timer(&self) -> Option<TimerHandle> {
        self.pending_timer
    }

    /// The number of packets waiting behind the frame in flight.
    pub fn queued(&self) -> usize {
        self.queue.len()
    }

    pub fn params(&self) -> LinkParams {
        self.params
    }

    pub fn stats(&self) -> LinkStats {
        self.stats
    }
}

/// The data-link layer of one node.
#[derive(Debug, Clone)]
pub struct DataLink {
    links: Vec<LinkState>,
    timeout: TimeoutPolicy,
}

impl DataLink {
    /// Creates the data-link layer for a node, with every link idle, every
    /// sequence bit zero and every queue empty.
    pub fn new(topology: &(impl Topology + ?Sized), timeout: TimeoutPolicy) -> Self {
        let links = (0..topology.link_count())
            .map(|index| {
                let params = topology
                    .link(LinkId::from_index(index))
                    .unwrap_or(LinkParams::new(0, Duration::ZERO));
                LinkState::new(params)
            })
            .collect();
        Self { links, timeout }
    }

    pub fn link_count(&self) -> usize {
        self.links.len()
    }

    /// The state of a link, if it exists.
    pub fn link(&self, link: LinkId) -> Option<&LinkState> {
        self.links.get(link.index())
    }

    /// Iterates over the links and their states.
    pub fn links(&self) -> impl Iterator<Item = (LinkId, &LinkState)> {
        self.links
            .iter()
            .enumerate()
            .map(|(index, state)| (LinkId::from_index(index), state))
    }

    fn link_mut(&mut self, link: LinkId) -> Result<&mut LinkState, LinkError> {
        self.links
            .get_mut(link.index())
            .ok_or(LinkError::UnknownLink(link))
    }

    /// Queues a packet for transmission on a link and sends it right away if
    /// the link is idle.
    pub fn submit<S>(&mut self, services: &mut S, link: LinkId, packet: Packet) -> Result<(), LinkError>
    where
        S: Transport + Timers + ?Sized,
    {
        let timeout = self.timeout;
        let state = self.link_mut(link)?;
        state.queue.enqueue(packet);
        transmit_next(state, services, link, timeout);
        Ok(())
    }

    /// Handles a frame arriving on a link. Returns the packet it carried if
    /// the frame was new data that should go up to the network layer.
    pub fn frame_arrived<S>(
        &mut self,
        services: &mut S,
        link: LinkId,
        bytes: &[u8],
    ) -> Result<Option<Packet>, LinkError>
    where
        S: Transport + Timers + ?Sized,
    {
        let timeout = self.timeout;
        let state = self.link_mut(link)?;

        let frame = match Frame::from_bytes(bytes) {
            Ok(frame) => frame,
            Err(e) => {
                corrupt_frame_event(link, &e);
                state.stats.corrupted += 1;
                return Ok(None);
            }
        };

        match frame.kind {
            FrameKind::Ack => {
                if !state.is_idle() && frame.sequence == state.ack_expected {
                    ack_received_event(link, frame.sequence);
                    state.stats.acks_received += 1;
                    if let Some(timer) = state.pending_timer.take() {
                        services.cancel_timer(timer);
                    }
                    state.outgoing_frame = None;
                    state.ack_expected.toggle();
                    transmit_next(state, services, link, timeout);
                } else {
                    stale_ack_event(link, frame.sequence);
                    state.stats.stale_acks += 1;
                }
                Ok(None)
            }

            FrameKind::Data => {
                let packet = match frame.packet() {
                    Ok(packet) => packet,
                    Err(e) => {
                        corrupt_frame_event(link, &e);
                        state.stats.corrupted += 1;
                        return Ok(None);
                    }
                };

                let accepted = if frame.sequence == state.frame_expected {
                    data_accepted_event(link, frame.sequence);
                    state.stats.accepted += 1;
                    state.frame_expected.toggle();
                    Some(packet)
                } else {
                    duplicate_event(link, frame.sequence);
                    state.stats.duplicates_rejected += 1;
                    None
                };

                // Acknowledge duplicates too, since the sender is still
                // waiting on an acknowledgement that was lost.
                ack_sent_event(link, frame.sequence);
                state.stats.acks_sent += 1;
                services.transmit(link, Frame::ack(frame.sequence).to_bytes());
                Ok(accepted)
            }
        }
    }

    /// Handles the expiry of a timer started by this layer.
    pub fn timer_expired<S>(&mut self, services: &mut S, tag: TimerTag) -> Result<(), LinkError>
    where
        S: Transport + Timers + ?Sized,
    {
        let timeout = self.timeout;
        let TimerTag::Retransmit(link) = tag;
        let state = self.link_mut(link)?;
        state.pending_timer = None;

        let frame = match (&state.outgoing_frame, state.is_idle()) {
            (Some(frame), false) => frame.clone(),
            _ => {
                tracing::debug!(link = link.into_inner(), "Ignoring timer for an idle link");
                return Ok(());
            }
        };

        data_sent_event(link, state.ack_expected, frame.len(), true);
        state.stats.retransmissions += 1;
        let duration = timeout.timeout(&state.params, frame.len());
        services.transmit(link, frame);
        state.pending_timer = Some(services.start_timer(duration, tag));
        Ok(())
    }
}

/// Sends the packet at the head of the link's queue if nothing is in flight.
fn transmit_next<S>(state: &mut LinkState, services: &mut S, link: LinkId, timeout: TimeoutPolicy)
where
    S: Transport + Timers + ?Sized,
{
    if !state.is_idle() {
        return;
    }
    let packet = match state.queue.dequeue() {
        Some(packet) => packet,
        None => return,
    };

    let bytes = Frame::data(state.next_frame_to_send, &packet).to_bytes();
    data_sent_event(link, state.next_frame_to_send, bytes.len(), false);
    state.stats.data_sent += 1;

    let duration = timeout.timeout(&state.params, bytes.len());
    state.outgoing_frame = Some(bytes.clone());
    services.transmit(link, bytes);
    state.pending_timer = Some(services.start_timer(duration, TimerTag::Retransmit(link)));
    state.next_frame_to_send.toggle();
}

#[derive(Debug, thiserror::Error, Clone, Copy, PartialEq, Eq)]
pub enum LinkError {
    #[error("Link {0} does not exist on this node")]
    UnknownLink(LinkId),
}
