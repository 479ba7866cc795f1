//! Arena SSA control-flow graph used by the looprune passes.
//!
//! A [`Graph`] owns its instructions, blocks and loop information in
//! `cranelift_entity` maps and hands out `Copy` handles for each. Around
//! it sit the analyses the passes depend on (dominators and loop
//! formation), a text format for writing graphs by hand, and consistency
//! checks.

// === Graph model ===
pub mod graph;
pub mod inst;
pub mod refs;
pub mod types;

// === Analyses ===
pub mod dominance;
pub mod loops;

// === Text format and checking ===
pub mod error;
pub mod parser;
pub mod printer;
pub mod validation;

pub use error::{IrError, IrResult};
pub use graph::{BlockData, Graph, InstData, Use};
pub use inst::{BinaryOp, CmpOp, InstKind};
pub use loops::{LoopFormation, LoopInformation, form_loops};
pub use parser::{ParseError, parse_graph, parse_test_graph};
pub use printer::{print_graph, print_loops};
pub use refs::{BlockRef, InstRef, LoopRef};
pub use types::Type;
pub use validation::{ValidationResult, validate_graph};
