//! Consistency checks for graphs.
//!
//! The graph keeps several redundant views of the same facts: operand
//! lists and use-chains, successor and predecessor lists, dominator links
//! in both directions, block loop back-references and loop member sets.
//! Each check below compares two such views and reports every mismatch.

use std::collections::HashSet;
use std::fmt;

use crate::dominance::dominates;
use crate::graph::{Graph, Use};
use crate::refs::{BlockRef, InstRef};

// ============================================================================
// Error types
// ============================================================================

/// One inconsistency, already rendered for humans.
pub struct ValidationError {
    pub message: String,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl fmt::Debug for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

/// Result of validation.
#[derive(Default)]
pub struct ValidationResult {
    pub use_chain_errors: Vec<ValidationError>,
    pub cfg_errors: Vec<ValidationError>,
    pub dominator_errors: Vec<ValidationError>,
    pub loop_errors: Vec<ValidationError>,
}

impl ValidationResult {
    pub fn is_ok(&self) -> bool {
        self.use_chain_errors.is_empty()
            && self.cfg_errors.is_empty()
            && self.dominator_errors.is_empty()
            && self.loop_errors.is_empty()
    }

    fn merge(&mut self, other: ValidationResult) {
        self.use_chain_errors.extend(other.use_chain_errors);
        self.cfg_errors.extend(other.cfg_errors);
        self.dominator_errors.extend(other.dominator_errors);
        self.loop_errors.extend(other.loop_errors);
    }
}

impl fmt::Display for ValidationResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_ok() {
            return write!(f, "validation passed");
        }
        let sections = [
            ("use-chain", &self.use_chain_errors),
            ("control-flow", &self.cfg_errors),
            ("dominator", &self.dominator_errors),
            ("loop membership", &self.loop_errors),
        ];
        for (what, errors) in sections {
            if errors.is_empty() {
                continue;
            }
            writeln!(f, "{} {what} error(s) found:", errors.len())?;
            for err in errors {
                writeln!(f, "  - {}", err)?;
            }
        }
        Ok(())
    }
}

fn error(message: String) -> ValidationError {
    ValidationError { message }
}

// ============================================================================
// Use-chain consistency
// ============================================================================

/// Check that the use-chain of every value matches the operand lists
/// exactly, and that no live instruction refers to a removed one.
pub fn validate_use_chains(graph: &Graph) -> ValidationResult {
    let mut errors = Vec::new();

    let mut expected: HashSet<(InstRef, Use)> = HashSet::new();
    for inst in graph.insts() {
        for (index, &v) in graph.operands(inst).iter().enumerate() {
            if graph.inst(v).is_removed() {
                errors.push(error(format!(
                    "{inst} operand #{index} refers to removed {v}"
                )));
            }
            expected.insert((
                v,
                Use {
                    user: inst,
                    operand_index: index as u32,
                },
            ));
        }
    }

    let mut recorded = HashSet::new();
    for v in graph.insts() {
        for &u in graph.uses(v) {
            if graph.inst(u.user).is_removed() {
                errors.push(error(format!("{v} is used by removed {}", u.user)));
            }
            recorded.insert((v, u));
        }
    }

    for (v, u) in expected.difference(&recorded) {
        errors.push(error(format!(
            "{} operand #{} = {v} missing from the use-chain",
            u.user, u.operand_index
        )));
    }
    for (v, u) in recorded.difference(&expected) {
        errors.push(error(format!(
            "use-chain of {v} lists {} operand #{} which does not refer to it",
            u.user, u.operand_index
        )));
    }

    ValidationResult {
        use_chain_errors: errors,
        ..ValidationResult::default()
    }
}

// ============================================================================
// Control-flow edges
// ============================================================================

/// Check successor/predecessor symmetry, phi arity, and that every block
/// holds only its own instructions.
pub fn validate_cfg(graph: &Graph) -> ValidationResult {
    let mut errors = Vec::new();

    for block in graph.blocks() {
        let data = graph.block(block);
        for &succ in data.successors() {
            if graph.block(succ).is_removed() {
                errors.push(error(format!("{block} jumps to removed {succ}")));
                continue;
            }
            let forward = data.successors().iter().filter(|&&s| s == succ).count();
            let backward = graph
                .block(succ)
                .predecessors()
                .iter()
                .filter(|&&p| p == block)
                .count();
            if forward != backward {
                errors.push(error(format!(
                    "{block} -> {succ} appears {forward} time(s) as successor but {backward} time(s) as predecessor"
                )));
            }
        }
        for &pred in data.predecessors() {
            if graph.block(pred).is_removed() {
                errors.push(error(format!("{block} has removed predecessor {pred}")));
            } else if !graph.block(pred).successors().contains(&block) {
                errors.push(error(format!(
                    "{pred} is a predecessor of {block} but does not jump to it"
                )));
            }
        }

        let arity = data.predecessors().len();
        for &phi in data.phis() {
            let inputs = graph.operands(phi).len();
            if inputs != arity {
                errors.push(error(format!(
                    "phi {phi} in {block} has {inputs} input(s) for {arity} predecessor(s)"
                )));
            }
        }
        for &inst in data.phis().iter().chain(data.insts()) {
            if graph.inst_block(inst) != Some(block) {
                errors.push(error(format!(
                    "{inst} is listed in {block} but belongs to {:?}",
                    graph.inst_block(inst)
                )));
            }
        }
    }

    ValidationResult {
        cfg_errors: errors,
        ..ValidationResult::default()
    }
}

// ============================================================================
// Dominator tree
// ============================================================================

/// Check that dominator links agree in both directions and that each
/// immediate dominator dominates every reachable predecessor.
pub fn validate_dominators(graph: &Graph) -> ValidationResult {
    let mut errors = Vec::new();
    let reachable = |b: BlockRef| graph.entry() == Some(b) || graph.dominator(b).is_some();

    for block in graph.blocks() {
        if let Some(dom) = graph.dominator(block) {
            if graph.block(dom).is_removed() {
                errors.push(error(format!("{block} is dominated by removed {dom}")));
                continue;
            }
            if !graph.block(dom).dominated().contains(&block) {
                errors.push(error(format!(
                    "{dom} dominates {block} but does not list it as dominated"
                )));
            }
            for &pred in graph.block(block).predecessors() {
                if reachable(pred) && !dominates(graph, dom, pred) {
                    errors.push(error(format!(
                        "{dom} is the dominator of {block} but not of its predecessor {pred}"
                    )));
                }
            }
        }
        for &child in graph.block(block).dominated() {
            if graph.dominator(child) != Some(block) {
                errors.push(error(format!(
                    "{block} lists {child} as dominated but its dominator is {:?}",
                    graph.dominator(child)
                )));
            }
        }
    }

    ValidationResult {
        dominator_errors: errors,
        ..ValidationResult::default()
    }
}

// ============================================================================
// Loop membership
// ============================================================================

/// Check that block back-references and member sets agree along every
/// nesting chain, and that no loop still lists a removed block.
pub fn validate_loop_membership(graph: &Graph) -> ValidationResult {
    let mut errors = Vec::new();

    for block in graph.blocks() {
        let mut level = graph.block_loop(block);
        while let Some(lp) = level {
            if !graph.loop_info(lp).contains(block) {
                errors.push(error(format!(
                    "{block} points into {lp} (or a child of it) but is not a member"
                )));
            }
            level = graph.loop_info(lp).parent();
        }
    }

    for (lp, info) in graph.loops() {
        if graph.block(info.header()).is_removed() {
            continue;
        }
        for block in info.blocks() {
            if graph.block(block).is_removed() {
                errors.push(error(format!("{lp} still lists removed {block}")));
            }
        }
    }

    ValidationResult {
        loop_errors: errors,
        ..ValidationResult::default()
    }
}

/// Run every check.
pub fn validate_graph(graph: &Graph) -> ValidationResult {
    let mut result = validate_use_chains(graph);
    result.merge(validate_cfg(graph));
    result.merge(validate_dominators(graph));
    result.merge(validate_loop_membership(graph));
    result
}
