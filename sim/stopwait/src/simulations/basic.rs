use super::{from_ndl, SimulationError, TWO_NODE};
use stopwait_core::{sim::SimConfig, Message, NodeAddress};

/// Runs a basic simulation.
///
/// In this simulation, one node sends a message to another over a single
/// link. Returns the message the receiver got, if any.
pub async fn basic() -> Result<Option<Message>, SimulationError> {
    let (sender, receiver) = (NodeAddress::new(0), NodeAddress::new(1));
    let mut simulation = from_ndl(TWO_NODE, SimConfig::scripted())?;
    simulation.send(sender, receiver, Message::new("Hello!"));

    let report = simulation.run().await?;
    Ok(report
        .node(receiver)
        .and_then(|node| node.received.first())
        .filter(|(source, _)| *source == sender)
        .map(|(_, message)| message.clone()))
}

#[cfg(test)]
mod tests {
    use stopwait_core::Message;

    #[tokio::test(start_paused = true)]
    async fn basic() {
        for _ in 0..5 {
            assert_eq!(super::basic().await.unwrap(), Some(Message::new("Hello!")));
        }
    }
}
