use clap::Parser;
use elevband_runner::{init_logging, run, Args};
use std::process::ExitCode;
use tracing::error;

fn main() -> ExitCode {
    let args = Args::parse();
    init_logging(args.debug);

    match run(&args) {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            error!("Error processing elevation: {e}");
            ExitCode::FAILURE
        }
    }
}
