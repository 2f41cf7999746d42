use super::{from_ndl, SimulationError, FIVE_NODE, LOSSY_FIVE_NODE};
use stopwait_core::sim::{SimConfig, SimReport};

/// Runs generated traffic between every pair of nodes in the five node
/// network.
///
/// Node 2 sits between the pairs {0, 1} and {3, 4}, so most messages take two
/// or three hops.
pub async fn five_node(config: SimConfig) -> Result<SimReport, SimulationError> {
    Ok(from_ndl(FIVE_NODE, config)?.run().await?)
}

/// Like [five_node], but every link loses and corrupts a tenth of the frames
/// it carries.
pub async fn lossy_five_node(config: SimConfig) -> Result<SimReport, SimulationError> {
    Ok(from_ndl(LOSSY_FIVE_NODE, config)?.run().await?)
}

#[cfg(test)]
mod tests {
    use std::time::Duration;
    use stopwait_core::sim::{ExitStatus, SimConfig};

    fn config() -> SimConfig {
        SimConfig {
            duration: Duration::from_secs(60),
            drain: Duration::from_secs(600),
            interval: Some(Duration::from_secs(2)),
            max_message_size: 512,
            ..SimConfig::default()
        }
    }

    #[tokio::test(start_paused = true)]
    async fn five_node() {
        let report = super::five_node(config()).await.unwrap();
        assert_eq!(report.status, ExitStatus::Exited);
        assert!(report.generated() > 0);
        assert_eq!(report.delivered(), report.generated());
        assert_eq!(report.duplicates(), 0);
        assert_eq!(report.link_totals().corrupted, 0);
        assert!(report.drained());
    }

    #[tokio::test(start_paused = true)]
    async fn lossy_five_node() {
        let report = super::lossy_five_node(config()).await.unwrap();
        assert_eq!(report.delivered(), report.generated());
        assert_eq!(report.duplicates(), 0);
        assert_eq!(report.out_of_order(), 0);
        assert!(report.drained());
        assert!(report.link_totals().retransmissions > 0);
    }
}
