//! looprune: unused loop removal over an arena SSA graph.
//!
//! The heavy lifting lives in `looprune-ir` (graph, dominance, loops, text
//! format) and `looprune-passes` (the passes). This crate wires them into a
//! pipeline driven by the `looprune` binary.

pub mod pipeline;

pub use pipeline::{
    PipelineConfig, PipelineOutput, describe_loops, init_tracing, optimize, optimize_file,
};
