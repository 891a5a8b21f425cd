//! cdrip: command core for a CD ripping toolkit.
//!
//! Commands form a tree. Each level registers its options with defaults taken
//! from a configuration store, parses its share of argv, and hands the rest to
//! the selected subcommand. Leaf commands run their domain work as tasks whose
//! failures surface as a single [`task::TaskException`].

pub mod argument;
pub mod cli;
pub mod command;
pub mod commands;
pub mod config;
pub mod device;
pub mod error;
pub mod logging;
pub mod options;
pub mod task;
pub mod tasks;
