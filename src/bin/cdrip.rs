//! cdrip CLI Binary
//!
//! Command-line interface for the cdrip CD ripping toolkit.

use cdrip::cli;
use cdrip::command::DispatchContext;
use cdrip::config::FileConfigStore;
use cdrip::device::ProcCdromEnumerator;
use cdrip::error::exit_status;
use cdrip::logging::{init_logging, LoggingConfig};
use std::io::Write;
use std::process;
use tracing::{error, info};

fn main() {
    // Load the configuration store before anything else; option defaults
    // and logging both read from it
    let store = match FileConfigStore::load_default() {
        Ok(store) => store,
        Err(e) => {
            eprintln!("Failed to load configuration: {}", e);
            process::exit(exit_status::CONFIG);
        }
    };

    let logging_config = match LoggingConfig::from_store(&store) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{}", e);
            process::exit(exit_status::CONFIG);
        }
    };

    // Initialize logging early
    if let Err(e) = init_logging(Some(&logging_config)) {
        eprintln!("Failed to initialize logging: {}", e);
        process::exit(exit_status::CONFIG);
    }

    info!(config = ?store.origin(), "cdrip starting");

    let argv: Vec<String> = std::env::args_os()
        .skip(1)
        .map(|arg| arg.to_string_lossy().into_owned())
        .collect();

    let devices = ProcCdromEnumerator::default();
    let ctx = DispatchContext {
        config: &store,
        devices: &devices,
    };

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    let code = cli::run(&argv, &ctx, &mut out);
    if code != exit_status::SUCCESS {
        error!(exit_code = code, "cdrip exiting with failure");
    }
    let _ = out.flush();
    drop(out);
    process::exit(code);
}
