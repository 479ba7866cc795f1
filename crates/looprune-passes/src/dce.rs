//! Dead Code Elimination (DCE) pass.
//!
//! Removes instructions whose results are never used and which can be
//! dropped without changing behavior. The graph's use-chains make each
//! dead check O(1); phis are swept the same way as ordinary instructions.

use looprune_ir::{BlockRef, Graph, InstRef};
use tracing::debug;

/// Configuration for dead code elimination.
#[derive(Debug, Clone)]
pub struct DceConfig {
    /// Maximum fixpoint iterations before giving up. Default: 100.
    pub max_iterations: usize,
}

impl Default for DceConfig {
    fn default() -> Self {
        Self {
            max_iterations: 100,
        }
    }
}

/// Result of running dead code elimination.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DceResult {
    /// Total number of instructions removed.
    pub removed_count: usize,
    /// Number of fixpoint iterations performed.
    pub iterations: usize,
    /// Whether fixpoint was reached (no more changes possible).
    pub reached_fixpoint: bool,
}

/// Eliminate dead code from a graph using default configuration.
pub fn eliminate_dead_code(graph: &mut Graph) -> DceResult {
    eliminate_dead_code_with_config(graph, DceConfig::default())
}

/// Eliminate dead code with custom configuration.
pub fn eliminate_dead_code_with_config(graph: &mut Graph, config: DceConfig) -> DceResult {
    let max_iterations = if config.max_iterations == 0 {
        100
    } else {
        config.max_iterations
    };

    let mut total_removed = 0;

    for iteration in 0..max_iterations {
        let removed = sweep_graph(graph);

        if removed == 0 {
            debug!(
                graph = graph.name(),
                removed = total_removed,
                iterations = iteration + 1,
                "dce: reached fixpoint"
            );
            return DceResult {
                removed_count: total_removed,
                iterations: iteration + 1,
                reached_fixpoint: true,
            };
        }

        total_removed += removed;
    }

    DceResult {
        removed_count: total_removed,
        iterations: max_iterations,
        reached_fixpoint: false,
    }
}

/// Sweep every live block. Returns the number of instructions removed.
fn sweep_graph(graph: &mut Graph) -> usize {
    let blocks: Vec<BlockRef> = graph.blocks().collect();
    let mut removed = 0;
    for block in blocks {
        removed += sweep_block(graph, block);
    }
    removed
}

/// Sweep a single block in reverse order, instructions before phis.
///
/// Iterating in reverse maximizes cascade removal: if C uses B's result
/// and B uses A's result, removing C first frees B, then A.
fn sweep_block(graph: &mut Graph, block: BlockRef) -> usize {
    let data = graph.block(block);
    let candidates: Vec<InstRef> = data
        .phis()
        .iter()
        .chain(data.insts())
        .rev()
        .copied()
        .collect();

    let mut removed = 0;
    for inst in candidates {
        if is_dead(graph, inst) {
            graph.remove_inst(inst);
            removed += 1;
        }
    }
    removed
}

/// Check if an instruction is dead (removable + result unused).
fn is_dead(graph: &Graph, inst: InstRef) -> bool {
    graph.kind(inst).is_removable_if_unused() && !graph.has_uses(inst)
}
