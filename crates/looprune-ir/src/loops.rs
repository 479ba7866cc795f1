//! Loop structure: per-loop information and loop formation.
//!
//! [`form_loops`] derives the loop forest from the CFG from scratch. It
//! recomputes dominators, finds natural loops through their back edges,
//! gives every loop a dedicated preheader, links nesting levels and decides
//! for each loop whether its trip count is known.

use std::collections::{BTreeMap, BTreeSet};

use tracing::{debug, trace};

use crate::dominance::{compute_dominators, dominates};
use crate::graph::Graph;
use crate::inst::{BinaryOp, InstKind};
use crate::refs::{BlockRef, InstRef, LoopRef};
use crate::types::Type;

// ============================================================================
// Loop information
// ============================================================================

/// One level of loop nesting.
///
/// `blocks` holds every block of the loop, blocks of nested loops
/// included.
#[derive(Clone, Debug)]
pub struct LoopInformation {
    header: BlockRef,
    preheader: Option<BlockRef>,
    exit_block: Option<BlockRef>,
    parent: Option<LoopRef>,
    innermost: bool,
    known_iterations: bool,
    blocks: BTreeSet<BlockRef>,
}

impl LoopInformation {
    pub fn new(header: BlockRef) -> Self {
        Self {
            header,
            preheader: None,
            exit_block: None,
            parent: None,
            innermost: true,
            known_iterations: false,
            blocks: BTreeSet::from([header]),
        }
    }

    pub fn header(&self) -> BlockRef {
        self.header
    }

    /// The single block outside the loop that jumps to the header.
    pub fn preheader(&self) -> Option<BlockRef> {
        self.preheader
    }

    pub fn set_preheader(&mut self, preheader: Option<BlockRef>) {
        self.preheader = preheader;
    }

    /// The unique block outside the loop reached by leaving it, if all
    /// exiting edges agree on one.
    pub fn exit_block(&self) -> Option<BlockRef> {
        self.exit_block
    }

    pub fn set_exit_block(&mut self, exit: Option<BlockRef>) {
        self.exit_block = exit;
    }

    pub fn parent(&self) -> Option<LoopRef> {
        self.parent
    }

    pub fn set_parent(&mut self, parent: Option<LoopRef>) {
        self.parent = parent;
    }

    /// No other loop is nested inside this one.
    pub fn is_innermost(&self) -> bool {
        self.innermost
    }

    pub fn set_innermost(&mut self, innermost: bool) {
        self.innermost = innermost;
    }

    /// The trip count can be determined statically, so the loop is
    /// guaranteed to terminate.
    pub fn has_known_num_iterations(&self) -> bool {
        self.known_iterations
    }

    /// Override the countability verdict of loop formation.
    pub fn set_known_iterations(&mut self, known: bool) {
        self.known_iterations = known;
    }

    /// Member blocks in ascending order.
    pub fn blocks(&self) -> impl Iterator<Item = BlockRef> + '_ {
        self.blocks.iter().copied()
    }

    pub fn num_blocks(&self) -> usize {
        self.blocks.len()
    }

    pub fn contains(&self, block: BlockRef) -> bool {
        self.blocks.contains(&block)
    }

    pub fn add_block(&mut self, block: BlockRef) {
        self.blocks.insert(block);
    }

    /// Drop a block from the membership. Returns whether it was a member.
    pub fn remove(&mut self, block: BlockRef) -> bool {
        self.blocks.remove(&block)
    }
}

// ============================================================================
// Loop formation
// ============================================================================

/// Summary of one [`form_loops`] run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct LoopFormation {
    /// Number of loops in the rebuilt forest.
    pub loops: usize,
    /// Number of preheader blocks created to make the forest well formed.
    pub preheaders_inserted: usize,
}

/// Rebuild the loop forest of `graph`.
///
/// Any previous loop information is discarded. Dominators are recomputed
/// as a side effect, and a preheader block is inserted in front of every
/// loop header that lacks one.
pub fn form_loops(graph: &mut Graph) -> LoopFormation {
    let mut preheaders_inserted = 0;

    // Each insertion changes the CFG, so restart from fresh dominators.
    let bodies = loop {
        compute_dominators(graph);
        let bodies = find_natural_loops(graph);
        let pending = bodies
            .iter()
            .find(|(header, body)| needs_preheader(graph, **header, body));
        match pending {
            Some((&header, body)) => {
                let body = body.clone();
                insert_preheader(graph, header, &body);
                preheaders_inserted += 1;
            }
            None => break bodies,
        }
    };

    let loops = build_forest(graph, &bodies);
    debug!(
        graph = graph.name(),
        loops, preheaders_inserted, "form_loops: loop forest rebuilt"
    );
    LoopFormation {
        loops,
        preheaders_inserted,
    }
}

fn is_reachable(graph: &Graph, block: BlockRef) -> bool {
    graph.entry() == Some(block) || graph.dominator(block).is_some()
}

/// Natural loops keyed by header. Back edges sharing a header are merged.
fn find_natural_loops(graph: &Graph) -> BTreeMap<BlockRef, BTreeSet<BlockRef>> {
    let mut bodies: BTreeMap<BlockRef, BTreeSet<BlockRef>> = BTreeMap::new();
    for block in graph.blocks() {
        if !is_reachable(graph, block) {
            continue;
        }
        for &succ in graph.block(block).successors() {
            if !dominates(graph, succ, block) {
                continue;
            }
            trace!(latch = %block, header = %succ, "back edge");
            let body = bodies
                .entry(succ)
                .or_insert_with(|| BTreeSet::from([succ]));
            let mut worklist = vec![block];
            while let Some(b) = worklist.pop() {
                if body.insert(b) {
                    worklist.extend(
                        graph
                            .block(b)
                            .predecessors()
                            .iter()
                            .copied()
                            .filter(|&p| is_reachable(graph, p)),
                    );
                }
            }
        }
    }
    bodies
}

fn outside_predecessors(
    graph: &Graph,
    header: BlockRef,
    body: &BTreeSet<BlockRef>,
) -> Vec<BlockRef> {
    graph
        .block(header)
        .predecessors()
        .iter()
        .copied()
        .filter(|p| !body.contains(p))
        .collect()
}

/// A header needs a preheader unless exactly one outside edge enters it,
/// from a block with no other successor.
fn needs_preheader(graph: &Graph, header: BlockRef, body: &BTreeSet<BlockRef>) -> bool {
    match outside_predecessors(graph, header, body).as_slice() {
        // Entry block as header; there is nowhere to put a preheader.
        [] => false,
        [pred] => graph.block(*pred).successors().len() != 1,
        _ => true,
    }
}

/// Route every outside edge into `header` through a new block.
///
/// Header phi inputs arriving along those edges are merged into new phis
/// of the preheader, which then feed the header along a single edge. The
/// preheader edge takes slot 0.
fn insert_preheader(graph: &mut Graph, header: BlockRef, body: &BTreeSet<BlockRef>) {
    let preheader = graph.add_block();
    graph.push_inst(preheader, InstKind::Goto, Type::Void, []);

    let preds = graph.block(header).predecessors().to_vec();
    let slots: Vec<usize> = (0..preds.len())
        .filter(|&slot| !body.contains(&preds[slot]))
        .collect();
    if slots.is_empty() {
        return;
    }

    for &slot in &slots {
        let pred = preds[slot];
        graph.block_mut(preheader).predecessors.push(pred);
        if let Some(succ) = graph
            .block_mut(pred)
            .successors
            .iter_mut()
            .find(|s| **s == header)
        {
            *succ = preheader;
        }
    }

    let phis = graph.block(header).phis().to_vec();
    for phi in phis {
        let operands = graph.operands(phi).to_vec();
        let entering: Vec<InstRef> = slots.iter().map(|&s| operands[s]).collect();
        let merged = if let [input] = entering.as_slice() {
            *input
        } else {
            graph.push_inst(preheader, InstKind::Phi, graph.ty(phi), entering)
        };
        let mut rebuilt: Vec<InstRef> = operands
            .iter()
            .enumerate()
            .filter(|(slot, _)| !slots.contains(slot))
            .map(|(_, &v)| v)
            .collect();
        rebuilt.insert(0, merged);
        graph.set_operands(phi, rebuilt);
    }

    let mut rebuilt: Vec<BlockRef> = preds
        .iter()
        .enumerate()
        .filter(|(slot, _)| !slots.contains(slot))
        .map(|(_, &p)| p)
        .collect();
    rebuilt.insert(0, preheader);
    graph.block_mut(header).predecessors = rebuilt.into_iter().collect();
    graph.block_mut(preheader).successors.push(header);

    debug!(%header, %preheader, "form_loops: inserted preheader");
}

/// Create the loop levels, link parents and set block back-references.
fn build_forest(graph: &mut Graph, bodies: &BTreeMap<BlockRef, BTreeSet<BlockRef>>) -> usize {
    graph.clear_loops();

    let mut refs: BTreeMap<BlockRef, LoopRef> = BTreeMap::new();
    for (&header, body) in bodies {
        let mut info = LoopInformation::new(header);
        for &block in body {
            info.add_block(block);
        }
        let preheader = find_preheader(graph, header, body);
        if let Some(preheader) = preheader {
            move_preheader_first(graph, header, preheader);
        }
        info.set_preheader(preheader);
        info.set_exit_block(find_exit_block(graph, body));
        info.set_known_iterations(has_known_iterations(graph, header, body));
        refs.insert(header, graph.add_loop(info));
    }

    // The smallest enclosing body is the immediate parent.
    let smallest_containing = |block: BlockRef, except: Option<BlockRef>| {
        bodies
            .iter()
            .filter(|(h, body)| Some(**h) != except && body.contains(&block))
            .min_by_key(|(_, body)| body.len())
            .map(|(h, _)| refs[h])
    };

    for &header in bodies.keys() {
        if let Some(parent) = smallest_containing(header, Some(header)) {
            let lp = refs[&header];
            graph.loop_info_mut(lp).set_parent(Some(parent));
            graph.loop_info_mut(parent).set_innermost(false);
        }
    }

    let blocks: Vec<BlockRef> = graph.blocks().collect();
    for block in blocks {
        graph.set_block_loop(block, smallest_containing(block, None));
    }

    bodies.len()
}

/// Put the preheader edge in predecessor slot 0 of `header`, shifting the
/// matching phi input along with it.
fn move_preheader_first(graph: &mut Graph, header: BlockRef, preheader: BlockRef) {
    let Some(slot) = graph
        .block(header)
        .predecessors()
        .iter()
        .position(|&p| p == preheader)
    else {
        return;
    };
    if slot == 0 {
        return;
    }

    let phis = graph.block(header).phis().to_vec();
    for phi in phis {
        let mut operands = graph.operands(phi).to_vec();
        let input = operands.remove(slot);
        operands.insert(0, input);
        graph.set_operands(phi, operands);
    }
    let preds = &mut graph.block_mut(header).predecessors;
    let pred = preds.remove(slot);
    preds.insert(0, pred);
    trace!(%header, %preheader, slot, "form_loops: moved preheader edge to slot 0");
}

fn find_preheader(graph: &Graph, header: BlockRef, body: &BTreeSet<BlockRef>) -> Option<BlockRef> {
    match outside_predecessors(graph, header, body).as_slice() {
        [pred] => Some(*pred),
        _ => None,
    }
}

fn find_exit_block(graph: &Graph, body: &BTreeSet<BlockRef>) -> Option<BlockRef> {
    let exits: BTreeSet<BlockRef> = body
        .iter()
        .flat_map(|&b| graph.block(b).successors().iter().copied())
        .filter(|s| !body.contains(s))
        .collect();
    let mut exits = exits.into_iter();
    match (exits.next(), exits.next()) {
        (Some(exit), None) => Some(exit),
        _ => None,
    }
}

/// Countable loops have a header phi stepping by a nonzero constant from
/// a constant start, and leave the loop on a comparison of that phi (or
/// its next value) against a loop-invariant bound.
fn has_known_iterations(graph: &Graph, header: BlockRef, body: &BTreeSet<BlockRef>) -> bool {
    let preds = graph.block(header).predecessors();
    graph.block(header).phis().iter().any(|&phi| {
        let inputs = graph.operands(phi);
        if inputs.len() != 2 || preds.len() != 2 {
            return false;
        }
        let (mut init, mut next) = (None, None);
        for (pred, &input) in preds.iter().zip(inputs) {
            if body.contains(pred) {
                next = Some(input);
            } else {
                init = Some(input);
            }
        }
        let (Some(init), Some(next)) = (init, next) else {
            return false;
        };
        matches!(graph.kind(init), InstKind::Const(_))
            && is_defined_outside(graph, init, body)
            && is_constant_step(graph, phi, next)
            && body
                .iter()
                .any(|&b| exits_on_bound(graph, b, body, phi, next))
    })
}

fn is_defined_outside(graph: &Graph, v: InstRef, body: &BTreeSet<BlockRef>) -> bool {
    graph.inst_block(v).is_some_and(|b| !body.contains(&b))
}

fn is_nonzero_const(graph: &Graph, v: InstRef) -> bool {
    matches!(graph.kind(v), InstKind::Const(c) if *c != 0)
}

fn is_constant_step(graph: &Graph, phi: InstRef, next: InstRef) -> bool {
    match (graph.kind(next), graph.operands(next)) {
        (InstKind::Binary(BinaryOp::Add), &[lhs, rhs]) => {
            (lhs == phi && is_nonzero_const(graph, rhs))
                || (rhs == phi && is_nonzero_const(graph, lhs))
        }
        (InstKind::Binary(BinaryOp::Sub), &[lhs, rhs]) => {
            lhs == phi && is_nonzero_const(graph, rhs)
        }
        _ => false,
    }
}

fn exits_on_bound(
    graph: &Graph,
    block: BlockRef,
    body: &BTreeSet<BlockRef>,
    phi: InstRef,
    next: InstRef,
) -> bool {
    if graph
        .block(block)
        .successors()
        .iter()
        .all(|s| body.contains(s))
    {
        return false;
    }
    let Some(term) = graph.terminator(block) else {
        return false;
    };
    let (InstKind::If, &[cond]) = (graph.kind(term), graph.operands(term)) else {
        return false;
    };
    let (InstKind::Compare(_), &[lhs, rhs]) = (graph.kind(cond), graph.operands(cond)) else {
        return false;
    };
    let is_iv = |v: InstRef| v == phi || v == next;
    let is_bound = |v: InstRef| {
        matches!(graph.kind(v), InstKind::Const(_)) || is_defined_outside(graph, v, body)
    };
    (is_iv(lhs) && is_bound(rhs)) || (is_iv(rhs) && is_bound(lhs))
}
