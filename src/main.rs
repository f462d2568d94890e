use clap::Parser;
use colored::*;
use std::process;

use lifelog_mcp::cli::{Args, Mode};
use lifelog_mcp::config::Config;
use lifelog_mcp::{logging, runner};

#[tokio::main]
async fn main() {
    let args = Args::parse();

    // A missing API key stops every mode before anything starts.
    let config = match Config::from_env_and_args(&args) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{} {}", "Error:".red(), e);
            process::exit(1);
        }
    };

    logging::init_logging(config.verbose);

    let outcome = match args.mode {
        Mode::Server => runner::run_server(&config).await,
        Mode::Client => runner::run_client(&config).await,
        Mode::Interactive => runner::run_interactive(&config).await,
    };

    if let Err(e) = outcome {
        eprintln!("{} {}", "Error:".red(), e);
        process::exit(1);
    }
}
