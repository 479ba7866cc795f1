//! Text format printer for graphs.
//!
//! Prints a graph in the format accepted by [`crate::parser`]:
//!
//! ```text
//! graph @name {
//! ^bb0 -> ^bb1:
//!   %0 = const 0 : i32
//!   goto
//! ^bb1:
//!   %1 = phi [%0, ^bb0] : i32
//!   return
//! }
//! ```
//!
//! Live blocks are labelled `^bbN` in creation order and values are
//! renumbered `%N` in print order.

use std::collections::HashMap;
use std::fmt;
use std::fmt::Write;

use crate::graph::Graph;
use crate::inst::InstKind;
use crate::refs::{BlockRef, InstRef, LoopRef};

/// Print state for value numbering and block labeling.
struct PrintState<'a> {
    graph: &'a Graph,
    value_names: HashMap<InstRef, String>,
    block_labels: HashMap<BlockRef, String>,
}

impl<'a> PrintState<'a> {
    /// Number every live block and every value-producing instruction up
    /// front, so phis can name values defined further down.
    fn new(graph: &'a Graph) -> Self {
        let mut value_names = HashMap::new();
        let mut block_labels = HashMap::new();
        for (i, block) in graph.blocks().enumerate() {
            block_labels.insert(block, format!("^bb{i}"));
            let data = graph.block(block);
            for &inst in data.phis().iter().chain(data.insts()) {
                if !graph.ty(inst).is_void() {
                    let name = format!("%{}", value_names.len());
                    value_names.insert(inst, name);
                }
            }
        }
        Self {
            graph,
            value_names,
            block_labels,
        }
    }

    fn get_value_name(&self, v: InstRef) -> &str {
        self.value_names.get(&v).map(|s| s.as_str()).unwrap_or("%?")
    }

    fn get_block_label(&self, b: BlockRef) -> &str {
        self.block_labels
            .get(&b)
            .map(|s| s.as_str())
            .unwrap_or("^bb?")
    }
}

// ============================================================================
// Public API
// ============================================================================

/// Print a graph as text.
pub fn print_graph(graph: &Graph) -> String {
    let state = PrintState::new(graph);
    let mut out = String::new();
    write_graph(&state, &mut out).expect("fmt::Write to String never fails");
    out
}

/// Print the loop forest, one line per loop level.
pub fn print_loops(graph: &Graph) -> String {
    let state = PrintState::new(graph);
    let mut out = String::new();
    write_loops(&state, &mut out).expect("fmt::Write to String never fails");
    out
}

// ============================================================================
// Graph printing
// ============================================================================

fn write_graph(state: &PrintState<'_>, f: &mut impl Write) -> fmt::Result {
    let graph = state.graph;
    writeln!(f, "graph @{} {{", graph.name())?;
    for block in graph.blocks() {
        let data = graph.block(block);
        f.write_str(state.get_block_label(block))?;
        if !data.successors().is_empty() {
            f.write_str(" -> ")?;
            for (i, &succ) in data.successors().iter().enumerate() {
                if i > 0 {
                    f.write_str(", ")?;
                }
                f.write_str(state.get_block_label(succ))?;
            }
        }
        f.write_str(":\n")?;

        for &phi in data.phis() {
            write_inst(state, f, phi)?;
        }
        for &inst in data.insts() {
            write_inst(state, f, inst)?;
        }
    }
    f.write_str("}\n")
}

fn write_inst(state: &PrintState<'_>, f: &mut impl Write, inst: InstRef) -> fmt::Result {
    let graph = state.graph;
    let kind = graph.kind(inst);
    let ty = graph.ty(inst);

    f.write_str("  ")?;
    if !ty.is_void() {
        write!(f, "{} = ", state.get_value_name(inst))?;
    }
    f.write_str(&kind.mnemonic())?;

    match kind {
        InstKind::Const(n) => write!(f, " {n}")?,
        InstKind::Param(n) | InstKind::LoadField(n) | InstKind::StoreField(n) => {
            write!(f, " {n}")?
        }
        InstKind::Call(callee) => write!(f, " @{callee}")?,
        _ => {}
    }

    let operands = graph.operands(inst);
    if !operands.is_empty() {
        f.write_char(' ')?;
        if kind.is_phi() {
            let preds = graph
                .inst_block(inst)
                .map(|b| graph.block(b).predecessors())
                .unwrap_or_default();
            for (i, &v) in operands.iter().enumerate() {
                if i > 0 {
                    f.write_str(", ")?;
                }
                let label = preds
                    .get(i)
                    .map(|&p| state.get_block_label(p))
                    .unwrap_or("^bb?");
                write!(f, "[{}, {}]", state.get_value_name(v), label)?;
            }
        } else {
            for (i, &v) in operands.iter().enumerate() {
                if i > 0 {
                    f.write_str(", ")?;
                }
                f.write_str(state.get_value_name(v))?;
            }
        }
    }

    if !ty.is_void() {
        write!(f, " : {ty}")?;
    }
    f.write_char('\n')
}

// ============================================================================
// Loop forest printing
// ============================================================================

fn write_block_opt(
    state: &PrintState<'_>,
    f: &mut impl Write,
    block: Option<BlockRef>,
) -> fmt::Result {
    match block {
        Some(b) => f.write_str(state.get_block_label(b)),
        None => f.write_str("none"),
    }
}

fn write_loops(state: &PrintState<'_>, f: &mut impl Write) -> fmt::Result {
    let graph = state.graph;
    let live: Vec<(LoopRef, _)> = graph
        .loops()
        .filter(|(_, info)| !graph.block(info.header()).is_removed())
        .collect();
    if live.is_empty() {
        return f.write_str("no loops\n");
    }

    for (i, (_, info)) in live.iter().enumerate() {
        write!(f, "loop{i}: header {}", state.get_block_label(info.header()))?;
        f.write_str(", preheader ")?;
        write_block_opt(state, f, info.preheader())?;
        f.write_str(", exit ")?;
        write_block_opt(state, f, info.exit_block())?;
        if let Some(parent) = info.parent() {
            let index = live.iter().position(|(lp, _)| *lp == parent);
            match index {
                Some(p) => write!(f, ", parent loop{p}")?,
                None => f.write_str(", parent ?")?,
            }
        }
        f.write_str(", blocks [")?;
        for (j, block) in info.blocks().enumerate() {
            if j > 0 {
                f.write_str(", ")?;
            }
            f.write_str(state.get_block_label(block))?;
        }
        f.write_char(']')?;
        if info.is_innermost() {
            f.write_str(", innermost")?;
        }
        if info.has_known_num_iterations() {
            f.write_str(", countable")?;
        }
        f.write_char('\n')?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loops::form_loops;
    use crate::parser::parse_test_graph;

    const INPUT: &str = r#"graph @sum {
^bb0 -> ^bb1:
  %0 = const 0 : i32
  %1 = const 1 : i32
  %2 = param 0 : i32
  goto
^bb1 -> ^bb2, ^bb3:
  %3 = phi [%0, ^bb0], [%6, ^bb2] : i32
  %4 = cmp.lt %3, %2 : bool
  if %4
^bb2 -> ^bb1:
  suspend_check
  %5 = load.field 2 %2 : i32
  %6 = add %3, %1 : i32
  goto
^bb3:
  call @sink %3
  return %3
}
"#;

    #[test]
    fn print_round_trips() {
        let graph = parse_test_graph(INPUT);
        let printed = print_graph(&graph);
        assert_eq!(printed, INPUT);

        let reparsed = parse_test_graph(&printed);
        assert_eq!(print_graph(&reparsed), printed);
    }

    #[test]
    fn print_loop_forest() {
        let mut graph = parse_test_graph(INPUT);
        form_loops(&mut graph);
        insta::assert_snapshot!(print_loops(&graph).trim_end(), @"loop0: header ^bb1, preheader ^bb0, exit ^bb3, blocks [^bb1, ^bb2], innermost, countable");
    }

    #[test]
    fn print_without_loops() {
        let graph = parse_test_graph("graph @f {\n^bb0:\n  return\n}");
        assert_eq!(print_loops(&graph), "no loops\n");
    }
}
