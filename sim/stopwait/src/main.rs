use std::process::ExitCode;
use stopwait::cli::initialize_from_arguments;

fn main() -> ExitCode {
    println!("Stop-and-wait v{}", env!("CARGO_PKG_VERSION"));
    // simulated time only moves when every node is waiting, so a run takes
    // as long as its computation rather than its simulated duration
    let runtime = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .start_paused(true)
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            eprintln!("Unable to start the runtime: {e}");
            return ExitCode::FAILURE;
        }
    };
    match runtime.block_on(initialize_from_arguments()) {
        Ok(_) => {
            println!("Done");
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("{e}");
            ExitCode::FAILURE
        }
    }
}
