//! Mode routing
//!
//! - Server mode (HTTP server), the default
//! - CLI mode (token issuing, config generation)

pub mod cli;
pub mod server;

pub use cli::run_cli;
pub use server::run_server;

use crate::cli::Commands;

/// Execution mode selected from the parsed command line
#[derive(Debug, PartialEq, Eq)]
pub enum Mode {
    Server,
    Cli,
}

/// No subcommand or `serve` starts the server; everything else is a CLI command.
pub fn detect_mode(command: Option<&Commands>) -> Mode {
    match command {
        None | Some(Commands::Serve) => Mode::Server,
        Some(_) => Mode::Cli,
    }
}
