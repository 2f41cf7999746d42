//! Parses the command line arguments and runs the simulation they describe.
//!
//! Basic usage for running the built-in five node network with logging on:
//!
//! ```text
//! cargo run -- --log
//! ```
//!
//! A network description can be given with `--ndl`:
//!
//! ```text
//! cargo run -- --ndl sim/stopwait/topologies/lossy_five_node.ndl --seed 7
//! ```

use crate::simulations::{self, SimulationError, FIVE_NODE};
use clap::Parser;
use std::{
    fs::{create_dir_all, OpenOptions},
    num::NonZeroU32,
    path::PathBuf,
    sync::Arc,
    time::Duration,
};
use stopwait_core::{
    datalink::TimeoutPolicy,
    sim::{ExitStatus, SimConfig, SimReport, MAX_RUN_TIME},
    DEFAULT_MAX_MESSAGE_SIZE,
};
use thiserror::Error as ThisError;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

/// Stores the different command line arguments.
#[derive(Parser, Debug)]
#[command(version, about = "Simulates stop-and-wait links carrying routed traffic")]
struct Args {
    /// Logging flag. Writes every event to a JSON log file under ./logs.
    #[arg(short, long)]
    log: bool,
    /// File path to the NDL file describing the network. Runs the built-in
    /// five node network if left out.
    #[arg(short, long)]
    ndl: Option<PathBuf>,
    /// Seconds of generated traffic
    #[arg(short, long, default_value_t = 120, value_parser = seconds())]
    duration: u64,
    /// Seconds to keep running after traffic stops
    #[arg(long, default_value_t = 60, value_parser = seconds())]
    drain: u64,
    /// Seed for every random choice in the run
    #[arg(short, long, default_value_t = 0xBAD5EED)]
    seed: u64,
    /// Mean milliseconds between messages at each node
    #[arg(short, long, default_value_t = 5000, value_parser = millis())]
    interval: u64,
    /// Largest message in bytes
    #[arg(short, long, default_value_t = DEFAULT_MAX_MESSAGE_SIZE)]
    max_message: usize,
    /// Retransmission timeout as a multiple of a frame's one way time
    #[arg(short, long, default_value_t = TimeoutPolicy::DEFAULT_MULTIPLIER)]
    timeout_multiplier: NonZeroU32,
}

/// Accepts whole seconds up to the longest run a simulation may cover.
fn seconds() -> clap::builder::RangedU64ValueParser<u64> {
    clap::value_parser!(u64).range(..=MAX_RUN_TIME.as_secs())
}

/// Accepts whole milliseconds up to the longest run a simulation may cover.
fn millis() -> clap::builder::RangedU64ValueParser<u64> {
    clap::value_parser!(u64).range(..=MAX_RUN_TIME.as_millis() as u64)
}

impl Args {
    fn config(&self) -> SimConfig {
        SimConfig {
            duration: Duration::from_secs(self.duration),
            drain: Duration::from_secs(self.drain),
            seed: self.seed,
            interval: (self.interval > 0).then(|| Duration::from_millis(self.interval)),
            max_message_size: self.max_message,
            timeout: TimeoutPolicy::new(self.timeout_multiplier),
            record_messages: false,
        }
    }
}

/// Parses command line arguments, runs the simulation and prints a summary
/// of it.
pub async fn initialize_from_arguments() -> Result<SimReport, CliError> {
    let cli = Args::parse();
    if cli.log {
        initialize_logging()?;
    } else {
        initialize_console();
    }

    let config = cli.config();
    let simulation = match &cli.ndl {
        Some(path) => simulations::from_ndl_file(path, config)?,
        None => simulations::from_ndl(FIVE_NODE, config)?,
    };

    let report = simulations::run_with(simulation, |shutdown| {
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                shutdown.shut_down_with_status(ExitStatus::Interrupted);
            }
        });
    })
    .await?;

    print_summary(&report);
    Ok(report)
}

fn print_summary(report: &SimReport) {
    println!(
        "{:?} after {:.3}s of simulated time",
        report.status,
        report.elapsed.as_secs_f64()
    );
    for node in report.nodes.iter() {
        println!(
            "  node {} {:<10} generated {:>5}  delivered {:>5}  duplicates {}  out of order {}  rejected {}  queued {}",
            node.address,
            node.name.as_deref().unwrap_or(""),
            node.generated,
            node.delivered,
            node.duplicates,
            node.out_of_order,
            node.rejected,
            node.backlog,
        );
    }
    let totals = report.link_totals();
    println!(
        "  frames: {} data ({} retransmitted), {} acks, {} corrupted, {} duplicates rejected",
        totals.data_sent,
        totals.retransmissions,
        totals.acks_sent,
        totals.corrupted,
        totals.duplicates_rejected,
    );
    if !report.drained() {
        println!("  some links still had packets to send when the run ended");
    }
}

/// Initializes logging to a file. Only should be called once when the sim
/// starts. Every event is written as JSON to a new file under ./logs.
fn initialize_logging() -> Result<(), CliError> {
    let main_path = "./logs";
    create_dir_all(main_path)?;
    let file_path = format!(
        "{}/debug-{}.log",
        main_path,
        chrono::offset::Local::now().format("%y-%m-%d_%H-%M-%S")
    );
    let file = OpenOptions::new()
        .write(true)
        .append(true)
        .create(true)
        .open(file_path)?;
    let subscriber = FmtSubscriber::builder()
        .with_writer(Arc::new(file))
        .with_max_level(tracing::Level::TRACE)
        .json()
        .finish();
    // set the global default so all events/logs go to the same subscriber and
    // subsequently the same file
    tracing::subscriber::set_global_default(subscriber)?;
    Ok(())
}

/// Sends warnings and errors to stderr, or whatever `RUST_LOG` asks for.
fn initialize_console() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .finish();
    // a subscriber may already be set when running inside a test harness
    let _ = tracing::subscriber::set_global_default(subscriber);
}

#[derive(Debug, ThisError)]
pub enum CliError {
    #[error("Unable to create the log file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Unable to set up logging: {0}")]
    Logging(#[from] tracing::subscriber::SetGlobalDefaultError),
    #[error("{0}")]
    Simulation(#[from] SimulationError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let args = Args::parse_from(["stopwait"]);
        assert!(!args.log);
        assert_eq!(args.ndl, None);
        assert_eq!(args.config(), SimConfig::default());
    }

    #[test]
    fn flags() {
        let args = Args::parse_from([
            "stopwait",
            "--ndl",
            "net.ndl",
            "--seed",
            "7",
            "--interval",
            "0",
            "--timeout-multiplier",
            "5",
        ]);
        assert_eq!(args.ndl, Some(PathBuf::from("net.ndl")));
        let config = args.config();
        assert_eq!(config.seed, 7);
        assert_eq!(config.interval, None);
        assert_eq!(config.timeout, TimeoutPolicy::new(NonZeroU32::new(5).unwrap()));
    }

    #[test]
    fn rejects_a_zero_timeout_multiplier() {
        assert!(Args::try_parse_from(["stopwait", "--timeout-multiplier", "0"]).is_err());
        assert!(Args::try_parse_from(["stopwait", "--timeout-multiplier", "1"]).is_ok());
    }

    #[test]
    fn rejects_times_past_the_longest_run() {
        let too_long = (MAX_RUN_TIME.as_secs() + 1).to_string();
        assert!(Args::try_parse_from(["stopwait", "--duration", &too_long]).is_err());
        assert!(Args::try_parse_from(["stopwait", "--drain", &too_long]).is_err());
        assert!(Args::try_parse_from(["stopwait", "--interval", "18446744073709551615"]).is_err());
        let longest = MAX_RUN_TIME.as_secs().to_string();
        assert!(Args::try_parse_from(["stopwait", "--duration", &longest]).is_ok());
    }
}
