//! looprune CLI entry point.

mod cli;

use std::path::Path;

use clap::Parser;
use cli::{Cli, Command};
use looprune::pipeline::{self, PipelineConfig};
use looprune_ir::{IrResult, print_graph};

fn main() {
    let cli = Cli::parse();
    pipeline::init_tracing(cli.log_level.as_deref());

    let result = match cli.command {
        Command::Optimize {
            file,
            no_dce,
            stats,
            verify,
            output,
        } => {
            let config = PipelineConfig {
                dce: !no_dce,
                verify,
            };
            run_optimize(&file, &config, stats, output.as_deref())
        }
        Command::Loops { file } => show_loops(&file),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

fn run_optimize(
    path: &Path,
    config: &PipelineConfig,
    show_stats: bool,
    output: Option<&Path>,
) -> IrResult<()> {
    let optimized = pipeline::optimize_file(path, config)?;
    let text = print_graph(&optimized.graph);

    match output {
        Some(out) => std::fs::write(out, text)?,
        None => print!("{text}"),
    }

    if show_stats {
        eprint!("{}", optimized.stats);
    }
    Ok(())
}

fn show_loops(path: &Path) -> IrResult<()> {
    let source = std::fs::read_to_string(path)?;
    print!("{}", pipeline::describe_loops(&source)?);
    Ok(())
}
