pub mod api;
pub mod camera;
pub mod cli;
pub mod dashboard;
pub mod fetchers;
pub mod geolocation;
pub mod incidents;
pub mod models;
pub mod polling;
pub mod sequencer;
pub mod settings;
pub mod utils;

#[cfg(test)]
mod testing;

use std::process::ExitCode;

use clap::Parser;

pub fn run() -> ExitCode {
    let cli = cli::Cli::parse();
    utils::logging::init(utils::logging::parse_level(&cli.log_level));

    log::info!("FlareSense starting up...");

    let runtime = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(err) => {
            eprintln!("error: failed to start async runtime: {err}");
            return ExitCode::FAILURE;
        }
    };

    match runtime.block_on(cli::execute(cli)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            log::error!("{err:#}");
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}
