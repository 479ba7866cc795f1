//! Graph text format parser.
//!
//! Parses the textual format produced by [`crate::printer`] into a
//! [`Graph`].
//!
//! # Two-stage parsing
//!
//! 1. **Raw parse**: winnow combinators in [`raw`] parse text into `Raw*`
//!    structures.
//! 2. **Graph build**: `GraphBuilder` resolves labels and value names into
//!    `BlockRef`/`InstRef` handles, wiring edges before instructions so
//!    phi inputs can be matched to predecessor slots.

pub(crate) mod raw;

use std::collections::HashMap;

use winnow::prelude::*;

pub use self::raw::ParseError;
use self::raw::{RawGraph, RawImmediate, RawInst, RawOperand};
use crate::graph::Graph;
use crate::inst::{BinaryOp, CmpOp, InstKind};
use crate::refs::{BlockRef, InstRef};
use crate::types::Type;

// ============================================================================
// GraphBuilder (Raw -> Graph)
// ============================================================================

struct GraphBuilder<'a> {
    graph: Graph,
    /// Maps value name (without %) -> InstRef
    value_map: HashMap<&'a str, InstRef>,
    /// Maps block label (without ^) -> BlockRef
    block_map: HashMap<&'a str, BlockRef>,
}

fn build_error(message: impl Into<String>) -> ParseError {
    ParseError {
        message: message.into(),
        offset: 0,
    }
}

impl<'a> GraphBuilder<'a> {
    fn new(name: &str) -> Self {
        Self {
            graph: Graph::new(name),
            value_map: HashMap::new(),
            block_map: HashMap::new(),
        }
    }

    fn build(mut self, raw: &RawGraph<'a>) -> Result<Graph, ParseError> {
        if raw.blocks.is_empty() {
            return Err(build_error(format!("graph @{} has no blocks", raw.name)));
        }

        // --- Pass 1: blocks ---
        for block in &raw.blocks {
            let b = self.graph.add_block();
            if self.block_map.insert(block.label, b).is_some() {
                return Err(build_error(format!("duplicate block label ^{}", block.label)));
            }
        }
        self.graph.set_entry(self.block_map[raw.blocks[0].label]);

        // --- Pass 2: edges, in block order ---
        for block in &raw.blocks {
            let from = self.block_map[block.label];
            for succ in &block.successors {
                let to = self.resolve_block(succ)?;
                self.graph.add_edge(from, to);
            }
        }

        // --- Pass 3: instructions without operands ---
        let mut pending: Vec<(InstRef, &RawInst<'a>)> = Vec::new();
        for block in &raw.blocks {
            let b = self.block_map[block.label];
            for inst in &block.insts {
                let r = self.create_inst(b, inst)?;
                pending.push((r, inst));
            }
        }

        // --- Pass 4: operands (forward references allowed) ---
        for (r, inst) in pending {
            if self.graph.kind(r).is_phi() {
                self.resolve_phi_inputs(r, inst)?;
            } else {
                let operands = inst
                    .operands
                    .iter()
                    .map(|op| match op {
                        RawOperand::Value(name) => self.resolve_value(name),
                        RawOperand::PhiInput(..) => Err(build_error(format!(
                            "`{}` takes plain operands, not phi inputs",
                            inst.opcode
                        ))),
                    })
                    .collect::<Result<Vec<_>, _>>()?;
                self.graph.set_operands(r, operands);
            }
        }

        Ok(self.graph)
    }

    // ----------------------------------------------------------------
    // Name resolution
    // ----------------------------------------------------------------

    fn resolve_value(&self, name: &str) -> Result<InstRef, ParseError> {
        self.value_map
            .get(name)
            .copied()
            .ok_or_else(|| build_error(format!("undefined value %{name}")))
    }

    fn resolve_block(&self, label: &str) -> Result<BlockRef, ParseError> {
        self.block_map
            .get(label)
            .copied()
            .ok_or_else(|| build_error(format!("undefined block ^{label}")))
    }

    // ----------------------------------------------------------------
    // Instruction building
    // ----------------------------------------------------------------

    fn create_inst(&mut self, block: BlockRef, raw: &RawInst<'a>) -> Result<InstRef, ParseError> {
        let kind = build_kind(raw)?;
        let ty = match raw.ty {
            Some(name) => {
                Type::from_name(name).ok_or_else(|| build_error(format!("unknown type `{name}`")))?
            }
            None => Type::Void,
        };
        let is_phi = kind.is_phi();
        let inst = self.graph.create_inst(kind, ty, []);
        if is_phi {
            self.graph.append_phi(block, inst);
        } else {
            self.graph.append_inst(block, inst);
        }
        if let Some(name) = raw.result {
            if self.value_map.insert(name, inst).is_some() {
                return Err(build_error(format!("value %{name} defined twice")));
            }
        }
        Ok(inst)
    }

    /// Reorder labelled phi inputs to match the predecessor list of the
    /// owning block.
    fn resolve_phi_inputs(&mut self, phi: InstRef, raw: &RawInst<'a>) -> Result<(), ParseError> {
        let name = raw.result.unwrap_or("?");
        let mut labelled: Vec<Option<(&str, &str)>> = Vec::with_capacity(raw.operands.len());
        for op in &raw.operands {
            match op {
                RawOperand::PhiInput(value, pred) => labelled.push(Some((*value, *pred))),
                RawOperand::Value(_) => {
                    return Err(build_error(format!(
                        "phi %{name}: inputs must be written as [%value, ^pred]"
                    )));
                }
            }
        }

        let block = self
            .graph
            .inst_block(phi)
            .ok_or_else(|| build_error(format!("phi %{name} is detached")))?;
        let preds = self.graph.block(block).predecessors().to_vec();
        if preds.len() != labelled.len() {
            return Err(build_error(format!(
                "phi %{name} has {} inputs but its block has {} predecessors",
                labelled.len(),
                preds.len()
            )));
        }

        let mut inputs = Vec::with_capacity(preds.len());
        for pred in preds {
            let slot = labelled.iter_mut().find(|entry| {
                entry.is_some_and(|(_, label)| self.block_map.get(label) == Some(&pred))
            });
            let Some((value, _)) = slot.and_then(Option::take) else {
                return Err(build_error(format!(
                    "phi %{name} has no input for predecessor {pred}"
                )));
            };
            inputs.push(self.resolve_value(value)?);
        }
        self.graph.set_operands(phi, inputs);
        Ok(())
    }
}

fn int_immediate(raw: &RawInst<'_>) -> Result<i64, ParseError> {
    match &raw.immediate {
        Some(RawImmediate::Int(n)) => Ok(*n),
        _ => Err(build_error(format!(
            "`{}` expects an integer immediate",
            raw.opcode
        ))),
    }
}

fn index_immediate(raw: &RawInst<'_>) -> Result<u32, ParseError> {
    let n = int_immediate(raw)?;
    u32::try_from(n).map_err(|_| build_error(format!("`{}` index {n} out of range", raw.opcode)))
}

fn build_kind(raw: &RawInst<'_>) -> Result<InstKind, ParseError> {
    let no_immediate = |kind: InstKind| match raw.immediate {
        None => Ok(kind),
        Some(_) => Err(build_error(format!("`{}` takes no immediate", raw.opcode))),
    };
    match raw.opcode {
        "const" => Ok(InstKind::Const(int_immediate(raw)?)),
        "param" => Ok(InstKind::Param(index_immediate(raw)?)),
        "load.field" => Ok(InstKind::LoadField(index_immediate(raw)?)),
        "store.field" => Ok(InstKind::StoreField(index_immediate(raw)?)),
        "call" => match &raw.immediate {
            Some(RawImmediate::Symbol(callee)) => Ok(InstKind::Call(callee.clone())),
            _ => Err(build_error("`call` expects a callee @name")),
        },
        "add" => no_immediate(InstKind::Binary(BinaryOp::Add)),
        "sub" => no_immediate(InstKind::Binary(BinaryOp::Sub)),
        "mul" => no_immediate(InstKind::Binary(BinaryOp::Mul)),
        "div" => no_immediate(InstKind::Div),
        "bounds_check" => no_immediate(InstKind::BoundsCheck),
        "suspend_check" => no_immediate(InstKind::SuspendCheck),
        "goto" => no_immediate(InstKind::Goto),
        "if" => no_immediate(InstKind::If),
        "return" => no_immediate(InstKind::Return),
        "throw" => no_immediate(InstKind::Throw),
        "phi" => no_immediate(InstKind::Phi),
        other => match other.strip_prefix("cmp.").and_then(CmpOp::from_name) {
            Some(op) => no_immediate(InstKind::Compare(op)),
            None => Err(build_error(format!("unknown opcode `{other}`"))),
        },
    }
}

// ============================================================================
// Public API
// ============================================================================

/// Parse a graph from its textual representation.
pub fn parse_graph(input: &str) -> Result<Graph, ParseError> {
    let mut remaining = input;
    raw::ws.parse_next(&mut remaining).map_err(|e| ParseError {
        message: format!("lexer error: {}", e),
        offset: input.len() - remaining.len(),
    })?;

    let raw_graph = raw::raw_graph
        .parse_next(&mut remaining)
        .map_err(|e| ParseError {
            message: format!("parse error: {}", e),
            offset: input.len() - remaining.len(),
        })?;

    // Reject trailing input
    raw::ws.parse_next(&mut remaining).map_err(|e| ParseError {
        message: format!("lexer error: {}", e),
        offset: input.len() - remaining.len(),
    })?;
    if !remaining.is_empty() {
        return Err(ParseError {
            message: "trailing input after graph".to_string(),
            offset: input.len() - remaining.len(),
        });
    }

    GraphBuilder::new(&raw_graph.name).build(&raw_graph)
}

/// Parse a graph, panicking on failure.
///
/// Convenience wrapper around [`parse_graph`] for tests.
pub fn parse_test_graph(input: &str) -> Graph {
    parse_graph(input).unwrap_or_else(|e| {
        panic!(
            "Failed to parse test graph at offset {}:\n  {}\n\nInput:\n{}",
            e.offset, e.message, input
        );
    })
}
