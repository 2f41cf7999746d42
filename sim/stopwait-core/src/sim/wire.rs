//! One direction of a simulated physical link.

use super::runtime::NodeEvent;
use crate::{services::LinkParams, topology::LinkSpec, LinkId};
use rand::{rngs::SmallRng, Rng};
use tokio::{
    sync::mpsc,
    time::{sleep_until, Instant},
};

/// Carries frames from one node to the node at the other end of a link.
///
/// Frames are clocked onto the wire one at a time at the link bandwidth, so a
/// frame cannot start until the one before it has finished. Each then takes
/// the propagation delay to arrive. Frames always arrive in the order they
/// were sent, unless they are lost.
#[derive(Debug)]
pub(crate) struct Wire {
    params: LinkParams,
    loss: f64,
    corruption: f64,
    /// When the last frame handed to the wire finishes transmitting
    busy_until: Instant,
    in_transit: mpsc::UnboundedSender<(Instant, Vec<u8>)>,
}

impl Wire {
    /// Creates a wire delivering to `peer`, where it arrives on `peer_link`.
    /// Must be called from within a tokio runtime.
    pub fn new(spec: &LinkSpec, peer: mpsc::UnboundedSender<NodeEvent>, peer_link: LinkId) -> Self {
        let (in_transit, mut arrivals) = mpsc::unbounded_channel::<(Instant, Vec<u8>)>();
        tokio::spawn(async move {
            while let Some((arrival, frame)) = arrivals.recv().await {
                sleep_until(arrival).await;
                if peer
                    .send(NodeEvent::FrameArrived {
                        link: peer_link,
                        frame,
                    })
                    .is_err()
                {
                    // The far node has shut down
                    break;
                }
            }
        });

        Self {
            params: spec.params(),
            loss: spec.loss,
            corruption: spec.corruption,
            busy_until: Instant::now(),
            in_transit,
        }
    }

    /// Puts a frame on the wire. It may be lost or have one bit flipped on
    /// the way.
    pub fn send(&mut self, mut frame: Vec<u8>, rng: &mut SmallRng) {
        let departure = self.busy_until.max(Instant::now());
        self.busy_until = departure + self.params.transmission_time(frame.len());
        let arrival = self.busy_until + self.params.propagation_delay;

        if rng.gen_bool(self.loss) {
            tracing::trace!(target: "FRAME", bytes = frame.len(), "frame lost on the wire");
            return;
        }
        if !frame.is_empty() && rng.gen_bool(self.corruption) {
            let bit = rng.gen_range(0..frame.len() * 8);
            frame[bit / 8] ^= 1 << (bit % 8);
            tracing::trace!(target: "FRAME", bytes = frame.len(), bit, "frame corrupted on the wire");
        }

        // Only fails once the delivery task has stopped, by which point the
        // far node is no longer listening anyway.
        let _ = self.in_transit.send((arrival, frame));
    }
}
