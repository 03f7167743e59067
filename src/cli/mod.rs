//! CLI module for seekplan
//!
//! Provides command-line interface for:
//! - plan: Print the page, count and neighbour-check statements for a request
//! - explain: Print a readable summary of the plan or its rejection
//! - run: Plan and execute a request against in-memory rows

mod args;
mod commands;
mod errors;
mod io;
mod request;

pub use args::{Cli, Command, Inputs};
pub use commands::{load_config, respond, run, run_command, Mode};
pub use errors::{CliError, CliResult};
pub use io::{read_request, write_error, write_response};
pub use request::PageQuery;
