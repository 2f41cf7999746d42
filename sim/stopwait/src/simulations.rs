//! Prebuilt simulation setups for testing and for the command line tool.

mod basic;
pub use basic::basic;

mod five_node;
pub use five_node::{five_node, lossy_five_node};

use crate::ndl::{self, NdlError};
use std::path::Path;
use stopwait_core::{
    sim::{SimConfig, SimReport, Shutdown},
    SimError, Simulation,
};
use thiserror::Error as ThisError;

/// The built-in five node network.
pub const FIVE_NODE: &str = include_str!("../topologies/five_node.ndl");
/// The built-in five node network with unreliable links.
pub const LOSSY_FIVE_NODE: &str = include_str!("../topologies/lossy_five_node.ndl");
/// Two nodes joined by a single link.
pub const TWO_NODE: &str = include_str!("../topologies/two_node.ndl");

/// Builds a simulation of the network an NDL description declares.
pub fn from_ndl(contents: &str, config: SimConfig) -> Result<Simulation, SimulationError> {
    let (network, routes) = ndl::generate(contents)?;
    Ok(Simulation::new(network, routes, config)?)
}

/// Builds a simulation of the network described in an NDL file.
pub fn from_ndl_file(
    file_path: impl AsRef<Path>,
    config: SimConfig,
) -> Result<Simulation, SimulationError> {
    let (network, routes) = ndl::load(file_path)?;
    Ok(Simulation::new(network, routes, config)?)
}

/// Runs a simulation until it finishes or `shutdown` is triggered from
/// elsewhere.
pub async fn run_with(
    simulation: Simulation,
    shutdown: impl FnOnce(Shutdown),
) -> Result<SimReport, SimulationError> {
    shutdown(simulation.shutdown());
    Ok(simulation.run().await?)
}

#[derive(Debug, ThisError)]
pub enum SimulationError {
    #[error("{0}")]
    Ndl(#[from] NdlError),
    #[error("{0}")]
    Sim(#[from] SimError),
}
