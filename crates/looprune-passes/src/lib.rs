//! Optimization passes over the looprune graph.
//!
//! - [`remove_unused_loops`]: deletes terminating loops with no observable effect
//! - [`dce`]: removes instructions whose results are never used
//! - [`stats`]: counters passes report into

pub mod dce;
pub mod remove_unused_loops;
pub mod stats;

pub use dce::{DceConfig, DceResult, eliminate_dead_code, eliminate_dead_code_with_config};
pub use remove_unused_loops::{
    FormLoops, LoopRebuilder, RemoveUnusedLoops, RemoveUnusedLoopsConfig, RemoveUnusedLoopsResult,
    remove_unused_loops,
};
pub use stats::{CompilationStat, CompilationStats, StatsSink};
