//! docsync command line
//!
//! Library half of the `docsync` binary: command definition, configuration
//! loading, tracing setup and the subcommand bodies.

#![warn(unreachable_pub)]

pub mod cli;
pub mod commands;
pub mod config;
pub mod logging;

pub use cli::build_cli;
pub use config::AppConfig;
pub use logging::init_tracing;
