//! Command-line interface for looprune.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "looprune")]
#[command(about = "Removes loops with no observable effect from SSA graphs", long_about = None)]
pub struct Cli {
    /// Log filter, e.g. `debug` or `looprune_passes=trace`. Overrides RUST_LOG.
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Remove unused loops and print the resulting graph
    #[command(alias = "opt")]
    Optimize {
        /// Graph in text form
        file: PathBuf,

        /// Skip dead code elimination after loop removal
        #[arg(long)]
        no_dce: bool,

        /// Print optimization statistics to stderr
        #[arg(long)]
        stats: bool,

        /// Fail if the optimized graph is inconsistent
        #[arg(long)]
        verify: bool,

        /// Write the graph here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Print the loop forest of a graph
    Loops {
        /// Graph in text form
        file: PathBuf,
    },
}
