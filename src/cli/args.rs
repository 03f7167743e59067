//! CLI argument definitions using clap
//!
//! Commands:
//! - seekplan plan --catalog <path> [--config <path>]
//! - seekplan explain --catalog <path> [--config <path>]
//! - seekplan run --catalog <path> [--config <path>] --data <path>

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// seekplan - compiles filtered, permission-checked keyset page queries
#[derive(Parser, Debug)]
#[command(name = "seekplan")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// Files every command needs
#[derive(Args, Debug, Clone)]
pub struct Inputs {
    /// Path to the entity catalog (JSON array of entities)
    #[arg(long)]
    pub catalog: PathBuf,

    /// Path to the planner configuration file
    #[arg(long)]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Plan a page request read from stdin and print the statements
    Plan {
        #[command(flatten)]
        inputs: Inputs,
    },

    /// Print a human-readable explanation of the plan
    Explain {
        #[command(flatten)]
        inputs: Inputs,
    },

    /// Plan the request and execute it against rows from a JSON file
    Run {
        #[command(flatten)]
        inputs: Inputs,

        /// Path to the rows file (`{"Entity": [row, ...]}`)
        #[arg(long)]
        data: PathBuf,
    },
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}
