//! Wrapper functions for logging protocol events.
//!
//! Each function corresponds to one observable event in the protocol stack.
//! Frame events are emitted under the `FRAME` target and network-layer events
//! under `PACKET`, so a subscriber can select either.

use crate::{frame::Sequence, LinkId, NodeAddress};
use tracing::{event, Level};

/// A data frame was put on a link, either for the first time or as a
/// retransmission.
pub(crate) fn data_sent_event(link: LinkId, sequence: Sequence, bytes: usize, retransmit: bool) {
    event!(
        target: "FRAME",
        Level::DEBUG,
        link = link.into_inner(),
        sequence = u8::from(sequence),
        bytes,
        retransmit,
        "DATA transmitted"
    );
}

pub(crate) fn ack_sent_event(link: LinkId, sequence: Sequence) {
    event!(target: "FRAME", Level::DEBUG, link = link.into_inner(), sequence = u8::from(sequence), "ACK transmitted");
}

pub(crate) fn ack_received_event(link: LinkId, sequence: Sequence) {
    event!(target: "FRAME", Level::DEBUG, link = link.into_inner(), sequence = u8::from(sequence), "ACK received");
}

/// An acknowledgement arrived for a frame that is not outstanding.
pub(crate) fn stale_ack_event(link: LinkId, sequence: Sequence) {
    event!(target: "FRAME", Level::DEBUG, link = link.into_inner(), sequence = u8::from(sequence), "stale ACK ignored");
}

pub(crate) fn data_accepted_event(link: LinkId, sequence: Sequence) {
    event!(target: "FRAME", Level::DEBUG, link = link.into_inner(), sequence = u8::from(sequence), "DATA accepted");
}

/// A data frame repeated one that was already accepted.
pub(crate) fn duplicate_event(link: LinkId, sequence: Sequence) {
    event!(target: "FRAME", Level::DEBUG, link = link.into_inner(), sequence = u8::from(sequence), "duplicate DATA rejected");
}

pub(crate) fn corrupt_frame_event(link: LinkId, reason: &dyn std::fmt::Display) {
    event!(target: "FRAME", Level::DEBUG, link = link.into_inner(), reason = %reason, "BAD frame ignored");
}

pub(crate) fn forward_event(source: NodeAddress, destination: NodeAddress, link: LinkId) {
    event!(
        target: "PACKET",
        Level::DEBUG,
        source = source.into_inner(),
        destination = destination.into_inner(),
        link = link.into_inner(),
        "forwarding packet"
    );
}

pub(crate) fn delivery_event(source: NodeAddress, destination: NodeAddress, bytes: usize) {
    event!(
        target: "PACKET",
        Level::INFO,
        source = source.into_inner(),
        destination = destination.into_inner(),
        bytes,
        "message delivered to application"
    );
}
