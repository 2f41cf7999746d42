use super::*;
use crate::{Message, NodeAddress};

const LINK: LinkId = LinkId::new(1);
const A: NodeAddress = NodeAddress::new(0);
const B: NodeAddress = NodeAddress::new(1);

/// A single-link topology at 56 kbit/s with 2.5 ms of propagation delay.
struct OneLink;

impl Topology for OneLink {
    fn address(&self) -> NodeAddress {
        A
    }

    fn link_count(&self) -> usize {
        1
    }

    fn link(&self, link: LinkId) -> Option<LinkParams> {
        (link == LINK).then(|| LinkParams::new(56_000, Duration::from_micros(2500)))
    }
}

/// Records everything the data-link layer asks of its environment.
#[derive(Default)]
struct Recorder {
    sent: Vec<(LinkId, Vec<u8>)>,
    started: Vec<(TimerHandle, Duration, TimerTag)>,
    cancelled: Vec<TimerHandle>,
    next_timer: u64,
}

impl Recorder {
    /// Takes the frames transmitted since the last call.
    fn frames(&mut self) -> Vec<Vec<u8>> {
        self.sent.drain(..).map(|(_, bytes)| bytes).collect()
    }

    fn decoded(&mut self) -> Vec<Frame> {
        self.frames()
            .iter()
            .map(|bytes| Frame::from_bytes(bytes).unwrap())
            .collect()
    }

    /// The timers that were started and never cancelled.
    fn live_timers(&self) -> Vec<TimerHandle> {
        self.started
            .iter()
            .map(|(handle, _, _)| *handle)
            .filter(|handle| !self.cancelled.contains(handle))
            .collect()
    }
}

impl Transport for Recorder {
    fn transmit(&mut self, link: LinkId, frame: Vec<u8>) {
        self.sent.push((link, frame));
    }
}

impl Timers for Recorder {
    fn start_timer(&mut self, duration: Duration, tag: TimerTag) -> TimerHandle {
        let handle = TimerHandle::new(self.next_timer);
        self.next_timer += 1;
        self.started.push((handle, duration, tag));
        handle
    }

    fn cancel_timer(&mut self, handle: TimerHandle) {
        self.cancelled.push(handle);
    }
}

fn packet(body: &str) -> Packet {
    Packet::new(B, A, Message::new(body))
}

fn pair() -> (DataLink, Recorder, DataLink, Recorder) {
    (
        DataLink::new(&OneLink, TimeoutPolicy::default()),
        Recorder::default(),
        DataLink::new(&OneLink, TimeoutPolicy::default()),
        Recorder::default(),
    )
}

#[test]
fn starts_idle() {
    let link = DataLink::new(&OneLink, TimeoutPolicy::default());
    assert_eq!(link.link_count(), 1);
    let state = link.link(LINK).unwrap();
    assert!(state.is_idle());
    assert_eq!(state.ack_expected(), Sequence::Zero);
    assert_eq!(state.next_frame_to_send(), Sequence::Zero);
    assert_eq!(state.frame_expected(), Sequence::Zero);
    assert_eq!(state.queued(), 0);
    assert_eq!(state.pending_timer(), None);
}

#[test]
fn hello_exchange() {
    //     Sender                            Receiver
    // 1.  submit "hello"
    // 2.  DATA seq=0 "hello"            --> deliver "hello", frame_expected=1
    // 3.  idle, ack_expected=1          <-- ACK seq=0
    let (mut sender, mut sender_io, mut receiver, mut receiver_io) = pair();

    // 1, 2
    sender.submit(&mut sender_io, LINK, packet("hello")).unwrap();
    let state = sender.link(LINK).unwrap();
    assert!(!state.is_idle());
    assert_eq!(state.next_frame_to_send(), Sequence::One);
    assert_eq!(sender_io.live_timers().len(), 1);
    // 27 byte frame: 3857 µs on the wire plus 2500 µs propagation, three times
    assert_eq!(sender_io.started[0].1, Duration::from_micros(3 * (3857 + 2500)));
    assert_eq!(sender_io.started[0].2, TimerTag::Retransmit(LINK));

    let data = sender_io.frames().remove(0);
    let delivered = receiver.frame_arrived(&mut receiver_io, LINK, &data).unwrap();
    assert_eq!(delivered, Some(packet("hello")));
    assert_eq!(receiver.link(LINK).unwrap().frame_expected(), Sequence::One);

    // 3
    let ack = receiver_io.frames().remove(0);
    assert_eq!(Frame::from_bytes(&ack), Ok(Frame::ack(Sequence::Zero)));
    sender.frame_arrived(&mut sender_io, LINK, &ack).unwrap();

    let state = sender.link(LINK).unwrap();
    assert!(state.is_idle());
    assert_eq!(state.ack_expected(), Sequence::One);
    assert_eq!(state.pending_timer(), None);
    assert!(sender_io.live_timers().is_empty());
    assert!(sender_io.sent.is_empty());
}

#[test]
fn queued_packets_leave_in_order() {
    let (mut sender, mut sender_io, mut receiver, mut receiver_io) = pair();
    for body in ["A", "B", "C"] {
        sender.submit(&mut sender_io, LINK, packet(body)).unwrap();
    }
    assert_eq!(sender.link(LINK).unwrap().queued(), 2);

    let mut delivered = vec![];
    while let Some(data) = sender_io.frames().pop() {
        if let Some(packet) = receiver.frame_arrived(&mut receiver_io, LINK, &data).unwrap() {
            delivered.push(packet.message.to_string());
        }
        for ack in receiver_io.frames() {
            sender.frame_arrived(&mut sender_io, LINK, &ack).unwrap();
        }
    }

    assert_eq!(delivered, ["A", "B", "C"]);
    let stats = sender.link(LINK).unwrap().stats();
    assert_eq!(stats.data_sent, 3);
    assert_eq!(stats.acks_received, 3);
    assert!(sender.link(LINK).unwrap().is_idle());
}

#[test]
fn at_most_one_frame_in_flight() {
    let (mut sender, mut sender_io, _, _) = pair();
    sender.submit(&mut sender_io, LINK, packet("A")).unwrap();
    sender.submit(&mut sender_io, LINK, packet("B")).unwrap();
    let frames = sender_io.decoded();
    assert_eq!(frames.len(), 1);
    assert_eq!(frames[0].packet(), Ok(packet("A")));
}

#[test]
fn timeout_retransmits_identical_frame() {
    let (mut sender, mut sender_io, _, _) = pair();
    sender.submit(&mut sender_io, LINK, packet("hello")).unwrap();
    let original = sender_io.frames().remove(0);

    // The frame is lost; the timer fires.
    let (_, duration, tag) = sender_io.started[0];
    sender.timer_expired(&mut sender_io, tag).unwrap();

    let resent = sender_io.frames().remove(0);
    assert_eq!(resent, original);
    assert_eq!(Frame::from_bytes(&resent).unwrap().sequence, Sequence::Zero);

    let state = sender.link(LINK).unwrap();
    assert_eq!(state.next_frame_to_send(), Sequence::One);
    assert_eq!(state.ack_expected(), Sequence::Zero);
    assert_eq!(state.stats().retransmissions, 1);
    assert_eq!(sender_io.started.len(), 2);
    assert_eq!(sender_io.started[1].1, duration);
    assert_eq!(state.pending_timer(), Some(sender_io.started[1].0));
}

#[test]
fn lost_ack_is_answered_again_but_delivered_once() {
    let (mut sender, mut sender_io, mut receiver, mut receiver_io) = pair();
    sender.submit(&mut sender_io, LINK, packet("hello")).unwrap();
    let data = sender_io.frames().remove(0);

    assert!(receiver.frame_arrived(&mut receiver_io, LINK, &data).unwrap().is_some());
    // The ACK is lost.
    receiver_io.frames();

    sender.timer_expired(&mut sender_io, TimerTag::Retransmit(LINK)).unwrap();
    let resent = sender_io.frames().remove(0);
    let delivered = receiver.frame_arrived(&mut receiver_io, LINK, &resent).unwrap();
    assert_eq!(delivered, None);
    assert_eq!(receiver.link(LINK).unwrap().frame_expected(), Sequence::One);
    assert_eq!(receiver.link(LINK).unwrap().stats().duplicates_rejected, 1);

    let acks = receiver_io.decoded();
    assert_eq!(acks, [Frame::ack(Sequence::Zero)]);
}

#[test]
fn duplicate_ack_is_ignored() {
    let (mut sender, mut sender_io, _, _) = pair();
    sender.submit(&mut sender_io, LINK, packet("A")).unwrap();
    sender.submit(&mut sender_io, LINK, packet("B")).unwrap();
    sender_io.frames();

    let ack = Frame::ack(Sequence::Zero).to_bytes();
    sender.frame_arrived(&mut sender_io, LINK, &ack).unwrap();
    // "B" goes out with sequence 1 once "A" is acknowledged.
    let frames = sender_io.decoded();
    assert_eq!(frames.len(), 1);
    assert_eq!(frames[0].sequence, Sequence::One);
    let before = sender.link(LINK).unwrap().clone();

    sender.frame_arrived(&mut sender_io, LINK, &ack).unwrap();
    let after = sender.link(LINK).unwrap();
    assert_eq!(after.ack_expected(), before.ack_expected());
    assert_eq!(after.next_frame_to_send(), before.next_frame_to_send());
    assert_eq!(after.pending_timer(), before.pending_timer());
    assert_eq!(after.stats().stale_acks, 1);
    assert!(sender_io.sent.is_empty());
}

#[test]
fn ack_while_idle_is_ignored() {
    let (mut sender, mut sender_io, _, _) = pair();
    let ack = Frame::ack(Sequence::Zero).to_bytes();
    sender.frame_arrived(&mut sender_io, LINK, &ack).unwrap();
    let state = sender.link(LINK).unwrap();
    assert!(state.is_idle());
    assert_eq!(state.ack_expected(), Sequence::Zero);
    assert_eq!(state.stats().stale_acks, 1);
}

#[test]
fn corrupt_frame_changes_nothing() {
    let (mut sender, mut sender_io, mut receiver, mut receiver_io) = pair();
    sender.submit(&mut sender_io, LINK, packet("hello")).unwrap();
    let mut data = sender_io.frames().remove(0);
    let last = data.len() - 1;
    data[last] ^= 0x10;

    let delivered = receiver.frame_arrived(&mut receiver_io, LINK, &data).unwrap();
    assert_eq!(delivered, None);
    assert!(receiver_io.sent.is_empty());
    let state = receiver.link(LINK).unwrap();
    assert_eq!(state.frame_expected(), Sequence::Zero);
    assert_eq!(state.stats().corrupted, 1);

    // A corrupted ACK does not free the sender either.
    let mut ack = Frame::ack(Sequence::Zero).to_bytes();
    ack[0] ^= 0x01;
    sender.frame_arrived(&mut sender_io, LINK, &ack).unwrap();
    assert!(!sender.link(LINK).unwrap().is_idle());
}

#[test]
fn stale_timer_on_idle_link_is_ignored() {
    let (mut sender, mut sender_io, _, _) = pair();
    sender.submit(&mut sender_io, LINK, packet("hello")).unwrap();
    sender_io.frames();
    let ack = Frame::ack(Sequence::Zero).to_bytes();
    sender.frame_arrived(&mut sender_io, LINK, &ack).unwrap();

    sender.timer_expired(&mut sender_io, TimerTag::Retransmit(LINK)).unwrap();
    assert!(sender_io.sent.is_empty());
    assert_eq!(sender_io.started.len(), 1);
    assert!(sender.link(LINK).unwrap().is_idle());
}

#[test]
fn repeated_loss_eventually_delivers_once() {
    const LOSSES: u64 = 4;
    let (mut sender, mut sender_io, mut receiver, mut receiver_io) = pair();
    sender.submit(&mut sender_io, LINK, packet("persistent")).unwrap();

    let mut transmissions = 1;
    for _ in 0..LOSSES {
        sender_io.frames();
        sender.timer_expired(&mut sender_io, TimerTag::Retransmit(LINK)).unwrap();
        transmissions += 1;
    }

    let data = sender_io.frames().remove(0);
    let delivered = receiver.frame_arrived(&mut receiver_io, LINK, &data).unwrap();
    assert_eq!(delivered, Some(packet("persistent")));
    for ack in receiver_io.frames() {
        sender.frame_arrived(&mut sender_io, LINK, &ack).unwrap();
    }

    assert_eq!(transmissions, LOSSES + 1);
    let stats = sender.link(LINK).unwrap().stats();
    assert_eq!(stats.data_sent + stats.retransmissions, LOSSES + 1);
    assert_eq!(receiver.link(LINK).unwrap().stats().accepted, 1);
    assert!(sender.link(LINK).unwrap().is_idle());
}

#[test]
fn sequence_bits_alternate() {
    let (mut sender, mut sender_io, mut receiver, mut receiver_io) = pair();
    let mut sequences = vec![];
    for body in ["1", "2", "3", "4"] {
        sender.submit(&mut sender_io, LINK, packet(body)).unwrap();
        let data = sender_io.frames().remove(0);
        sequences.push(Frame::from_bytes(&data).unwrap().sequence);
        receiver.frame_arrived(&mut receiver_io, LINK, &data).unwrap();
        let ack = receiver_io.frames().remove(0);
        sender.frame_arrived(&mut sender_io, LINK, &ack).unwrap();
    }
    use Sequence::*;
    assert_eq!(sequences, [Zero, One, Zero, One]);
}

#[test]
fn unknown_link_is_an_error() {
    let (mut sender, mut sender_io, _, _) = pair();
    let other = LinkId::new(2);
    assert_eq!(
        sender.submit(&mut sender_io, other, packet("x")),
        Err(LinkError::UnknownLink(other))
    );
    assert_eq!(
        sender.frame_arrived(&mut sender_io, LinkId::new(0), &[]),
        Err(LinkError::UnknownLink(LinkId::new(0)))
    );
    assert_eq!(
        sender.timer_expired(&mut sender_io, TimerTag::Retransmit(other)),
        Err(LinkError::UnknownLink(other))
    );
}

#[test]
fn timeout_scales_with_the_multiplier() {
    let params = LinkParams::new(56_000, Duration::from_micros(2500));
    let once = TimeoutPolicy::new(NonZeroU32::MIN).timeout(&params, 100);
    assert_eq!(once, params.one_way_time(100));
    assert_eq!(TimeoutPolicy::default().timeout(&params, 100), once * 3);
    assert_eq!(NonZeroU32::new(0).map(TimeoutPolicy::new), None);
}

#[test]
fn instant_link_still_gets_a_timeout() {
    let params = LinkParams::new(u64::MAX, Duration::ZERO);
    assert_eq!(params.one_way_time(20), Duration::ZERO);
    assert_eq!(
        TimeoutPolicy::new(NonZeroU32::MIN).timeout(&params, 20),
        TimeoutPolicy::MIN_TIMEOUT
    );
}
