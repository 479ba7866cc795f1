//! Parse, optimize, verify and print a graph.

use std::path::Path;

use looprune_ir::{Graph, IrError, IrResult, form_loops, parse_graph, print_loops, validate_graph};
use looprune_passes::{
    CompilationStat, CompilationStats, DceResult, RemoveUnusedLoops, RemoveUnusedLoopsResult,
    eliminate_dead_code,
};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

/// What the pipeline runs besides loop removal.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Run dead code elimination after loop removal. Default: true.
    pub dce: bool,
    /// Validate the final graph and fail if it is inconsistent.
    pub verify: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            dce: true,
            verify: false,
        }
    }
}

/// The optimized graph and what happened to it.
#[derive(Debug)]
pub struct PipelineOutput {
    pub graph: Graph,
    pub removal: RemoveUnusedLoopsResult,
    pub dce: Option<DceResult>,
    pub stats: CompilationStats,
}

/// Install a stderr `fmt` subscriber.
///
/// `filter` takes precedence over `RUST_LOG`; without either only warnings
/// are shown. Calling this twice is harmless.
pub fn init_tracing(filter: Option<&str>) {
    let filter = match filter {
        Some(directives) => EnvFilter::try_new(directives).ok(),
        None => EnvFilter::try_from_default_env().ok(),
    }
    .unwrap_or_else(|| EnvFilter::new("warn"));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

/// Run the pipeline on graph text.
pub fn optimize(source: &str, config: &PipelineConfig) -> IrResult<PipelineOutput> {
    let mut graph = parse_graph(source)?;
    let formation = form_loops(&mut graph);
    debug!(
        graph = graph.name(),
        loops = formation.loops,
        preheaders = formation.preheaders_inserted,
        "loops formed"
    );

    let mut stats = CompilationStats::new();
    let removal = RemoveUnusedLoops::new().stats(&mut stats).run(&mut graph);

    let dce = if config.dce {
        let result = eliminate_dead_code(&mut graph);
        stats.add(CompilationStat::DeadInstructionRemoved, result.removed_count);
        Some(result)
    } else {
        None
    };

    if config.verify {
        let check = validate_graph(&graph);
        if !check.is_ok() {
            return Err(IrError::invalid(graph.name(), &check));
        }
    }

    info!(graph = graph.name(), "pipeline finished");
    Ok(PipelineOutput {
        graph,
        removal,
        dce,
        stats,
    })
}

/// Read `path` and run the pipeline on it.
pub fn optimize_file(path: &Path, config: &PipelineConfig) -> IrResult<PipelineOutput> {
    let source = std::fs::read_to_string(path)?;
    optimize(&source, config)
}

/// Parse graph text, form loops and print the loop forest.
pub fn describe_loops(source: &str) -> IrResult<String> {
    let mut graph = parse_graph(source)?;
    form_loops(&mut graph);
    Ok(print_loops(&graph))
}
