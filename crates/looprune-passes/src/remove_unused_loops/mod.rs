//! Unused loop removal.
//!
//! Deletes innermost loops that are guaranteed to terminate and whose
//! execution has no effect visible after the loop: no stores, calls or
//! possible exceptions, and no value read once the loop exits.
//!
//! For each candidate loop the pass runs three steps:
//!
//! 1. [`analysis::is_empty_loop`] decides whether the loop is dead and
//!    collects header phis that merely pick between two outside values.
//! 2. [`rewrite::rewrite_external_phis`] points the uses of those phis at
//!    their second input.
//! 3. [`surgery::remove_loop`] jumps from the preheader straight to the
//!    exit block and deletes the loop's blocks.
//!
//! Loop information is stale after a removal, so the forest is rebuilt
//! once at the end if anything changed.

pub mod analysis;
pub mod rewrite;
pub mod surgery;

use looprune_ir::validation::{validate_cfg, validate_use_chains};
use looprune_ir::{Graph, form_loops, validate_graph};
use tracing::{debug, info};

pub use self::analysis::{ExternalPhis, is_empty_loop};
pub use self::rewrite::rewrite_external_phis;
pub use self::surgery::remove_loop;
use crate::stats::{CompilationStat, StatsSink};

/// Configuration for unused loop removal.
#[derive(Debug, Clone)]
pub struct RemoveUnusedLoopsConfig {
    /// Rebuild the loop forest after removing at least one loop.
    /// Default: true.
    pub rebuild_loops: bool,
    /// Check graph consistency after every removal. Default: on in debug
    /// builds.
    pub verify: bool,
}

impl Default for RemoveUnusedLoopsConfig {
    fn default() -> Self {
        Self {
            rebuild_loops: true,
            verify: cfg!(debug_assertions),
        }
    }
}

/// Result of running unused loop removal.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RemoveUnusedLoopsResult {
    /// Innermost loops looked at.
    pub loops_visited: usize,
    /// Loops deleted.
    pub loops_removed: usize,
    /// Blocks deleted along with them.
    pub blocks_removed: usize,
    /// Whether the loop forest was rebuilt afterwards.
    pub loops_rebuilt: bool,
}

/// Re-derives loop structure after the CFG changed.
pub trait LoopRebuilder {
    fn rebuild(&mut self, graph: &mut Graph);
}

/// The standard rebuilder: runs [`form_loops`].
#[derive(Debug, Clone, Copy, Default)]
pub struct FormLoops;

impl LoopRebuilder for FormLoops {
    fn rebuild(&mut self, graph: &mut Graph) {
        form_loops(graph);
    }
}

impl<F: FnMut(&mut Graph)> LoopRebuilder for F {
    fn rebuild(&mut self, graph: &mut Graph) {
        self(graph)
    }
}

/// The unused loop removal pass.
pub struct RemoveUnusedLoops<'a> {
    config: RemoveUnusedLoopsConfig,
    rebuilder: Box<dyn LoopRebuilder + 'a>,
    stats: Option<&'a mut dyn StatsSink>,
}

impl Default for RemoveUnusedLoops<'_> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a> RemoveUnusedLoops<'a> {
    pub fn new() -> Self {
        Self::with_config(RemoveUnusedLoopsConfig::default())
    }

    pub fn with_config(config: RemoveUnusedLoopsConfig) -> Self {
        Self {
            config,
            rebuilder: Box::new(FormLoops),
            stats: None,
        }
    }

    /// Use `rebuilder` instead of [`FormLoops`].
    pub fn rebuilder(mut self, rebuilder: impl LoopRebuilder + 'a) -> Self {
        self.rebuilder = Box::new(rebuilder);
        self
    }

    /// Report each removed loop to `stats`.
    pub fn stats(mut self, stats: &'a mut dyn StatsSink) -> Self {
        self.stats = Some(stats);
        self
    }

    /// Run the pass. The loop forest of `graph` must be current.
    pub fn run(&mut self, graph: &mut Graph) -> RemoveUnusedLoopsResult {
        let mut result = RemoveUnusedLoopsResult::default();

        for lp in graph.innermost_loops() {
            let info = graph.loop_info(lp);
            let header = info.header();
            if graph.block(header).is_removed() {
                continue;
            }
            result.loops_visited += 1;

            let Some(exit) = info.exit_block() else {
                debug!(%lp, %header, "loop kept: no single exit block");
                continue;
            };
            if !info.has_known_num_iterations() {
                debug!(%lp, %header, "loop kept: unknown trip count");
                continue;
            }
            let Some(preheader) = info.preheader() else {
                debug!(%lp, %header, "loop kept: no preheader");
                continue;
            };

            let mut external = ExternalPhis::new();
            if !is_empty_loop(graph, lp, &mut external) {
                continue;
            }

            rewrite_external_phis(graph, external);
            let removed = remove_loop(graph, lp, preheader, exit);
            result.loops_removed += 1;
            result.blocks_removed += removed.len();

            if let Some(stats) = self.stats.as_deref_mut() {
                stats.record(CompilationStat::RemoveUnusedLoops);
            }
            if self.config.verify {
                let mut check = validate_use_chains(graph);
                let cfg = validate_cfg(graph);
                check.cfg_errors = cfg.cfg_errors;
                assert!(
                    check.is_ok(),
                    "remove_unused_loops: @{} inconsistent after removing {lp}:\n{check}",
                    graph.name()
                );
            }
        }

        if result.loops_removed > 0 && self.config.rebuild_loops {
            self.rebuilder.rebuild(graph);
            result.loops_rebuilt = true;
            if self.config.verify {
                let check = validate_graph(graph);
                assert!(
                    check.is_ok(),
                    "remove_unused_loops: @{} inconsistent after rebuilding loops:\n{check}",
                    graph.name()
                );
            }
        }

        info!(
            graph = graph.name(),
            visited = result.loops_visited,
            removed = result.loops_removed,
            "remove_unused_loops finished"
        );
        result
    }
}

/// Run unused loop removal with the default configuration.
pub fn remove_unused_loops(graph: &mut Graph) -> RemoveUnusedLoopsResult {
    RemoveUnusedLoops::new().run(graph)
}
