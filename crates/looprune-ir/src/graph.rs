//! Graph: arena-based mutable SSA control-flow graph.
//!
//! Instructions, blocks and loop levels live in `PrimaryMap`s owned by
//! [`Graph`]. Operand lists use `EntityList + ListPool`; every operand is
//! mirrored in a per-value use list, and every mutation below keeps the
//! two in sync. Cross references (uses, dominators, loop back-pointers)
//! are plain handles, so deleting an entity is an explicit unlink step.

use std::collections::HashSet;
use std::fmt;

use cranelift_entity::{EntityList, ListPool, PrimaryMap, SecondaryMap};
use smallvec::SmallVec;

use crate::inst::InstKind;
use crate::loops::LoopInformation;
use crate::refs::{BlockRef, InstRef, LoopRef};
use crate::types::Type;

// ============================================================================
// Use-chain
// ============================================================================

/// A single use of a value: which instruction uses it, at which operand index.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Use {
    pub user: InstRef,
    pub operand_index: u32,
}

// ============================================================================
// Entity data types
// ============================================================================

/// Data for a single instruction.
pub struct InstData {
    pub kind: InstKind,
    pub ty: Type,
    operands: EntityList<InstRef>,
    block: Option<BlockRef>,
    removed: bool,
}

impl InstData {
    /// The block the instruction is attached to, if any.
    pub fn block(&self) -> Option<BlockRef> {
        self.block
    }

    pub fn is_removed(&self) -> bool {
        self.removed
    }
}

/// Data for a basic block: phis first, then ordinary instructions.
///
/// Input `i` of every phi corresponds to `predecessors[i]`.
#[derive(Default)]
pub struct BlockData {
    pub(crate) phis: SmallVec<[InstRef; 4]>,
    pub(crate) insts: Vec<InstRef>,
    pub(crate) successors: SmallVec<[BlockRef; 2]>,
    pub(crate) predecessors: SmallVec<[BlockRef; 2]>,
    pub(crate) dominator: Option<BlockRef>,
    pub(crate) dominated: SmallVec<[BlockRef; 4]>,
    pub(crate) loop_info: Option<LoopRef>,
    pub(crate) removed: bool,
}

impl BlockData {
    pub fn phis(&self) -> &[InstRef] {
        &self.phis
    }

    pub fn insts(&self) -> &[InstRef] {
        &self.insts
    }

    pub fn successors(&self) -> &[BlockRef] {
        &self.successors
    }

    pub fn predecessors(&self) -> &[BlockRef] {
        &self.predecessors
    }

    /// Immediate dominator. `None` for the entry block and unreachable blocks.
    pub fn dominator(&self) -> Option<BlockRef> {
        self.dominator
    }

    /// Blocks whose immediate dominator is this block.
    pub fn dominated(&self) -> &[BlockRef] {
        &self.dominated
    }

    /// Innermost loop containing this block.
    pub fn loop_info(&self) -> Option<LoopRef> {
        self.loop_info
    }

    pub fn is_removed(&self) -> bool {
        self.removed
    }
}

// ============================================================================
// Graph
// ============================================================================

/// The control-flow/def-use graph of one method.
///
/// Owns all instructions, blocks and loop information, and provides
/// methods for creating, querying and mutating them. Use-chains are
/// maintained automatically.
pub struct Graph {
    name: String,
    insts: PrimaryMap<InstRef, InstData>,
    blocks: PrimaryMap<BlockRef, BlockData>,
    loops: PrimaryMap<LoopRef, LoopInformation>,
    entry: Option<BlockRef>,

    /// Use-chain: for each value, the list of instructions that use it.
    uses: SecondaryMap<InstRef, SmallVec<[Use; 2]>>,

    /// Backing pool for operand lists.
    operand_pool: ListPool<InstRef>,
}

/// Summarizes the graph; use [`crate::printer::print_graph`] for its text.
impl fmt::Debug for Graph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Graph")
            .field("name", &self.name)
            .field("entry", &self.entry)
            .field("blocks", &self.blocks().count())
            .field("insts", &self.insts().count())
            .field("loops", &self.loops.len())
            .finish()
    }
}

impl Graph {
    /// Create an empty graph for the method `name`.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            insts: PrimaryMap::new(),
            blocks: PrimaryMap::new(),
            loops: PrimaryMap::new(),
            entry: None,
            uses: SecondaryMap::new(),
            operand_pool: ListPool::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    // ========================================================================
    // Instruction
    // ========================================================================

    /// Create a detached instruction and register its operands in the use-chain.
    ///
    /// Attach it with [`Graph::append_inst`] or [`Graph::append_phi`].
    pub fn create_inst(
        &mut self,
        kind: InstKind,
        ty: Type,
        operands: impl IntoIterator<Item = InstRef>,
    ) -> InstRef {
        let inst = self.insts.push(InstData {
            kind,
            ty,
            operands: EntityList::new(),
            block: None,
            removed: false,
        });
        for v in operands {
            self.push_operand(inst, v);
        }
        inst
    }

    /// Create an instruction and append it to `block`, phis included.
    pub fn push_inst(
        &mut self,
        block: BlockRef,
        kind: InstKind,
        ty: Type,
        operands: impl IntoIterator<Item = InstRef>,
    ) -> InstRef {
        let is_phi = kind.is_phi();
        let inst = self.create_inst(kind, ty, operands);
        if is_phi {
            self.append_phi(block, inst);
        } else {
            self.append_inst(block, inst);
        }
        inst
    }

    /// Append a non-phi instruction to the end of a block.
    ///
    /// # Panics
    ///
    /// Panics if the instruction is a phi or already belongs to a block.
    pub fn append_inst(&mut self, block: BlockRef, inst: InstRef) {
        assert!(
            !self.insts[inst].kind.is_phi(),
            "append_inst: {inst} is a phi; use append_phi",
        );
        self.attach(block, inst);
        self.blocks[block].insts.push(inst);
    }

    /// Append a phi to the phi list of a block.
    ///
    /// # Panics
    ///
    /// Panics if the instruction is not a phi or already belongs to a block.
    pub fn append_phi(&mut self, block: BlockRef, phi: InstRef) {
        assert!(
            self.insts[phi].kind.is_phi(),
            "append_phi: {phi} is not a phi",
        );
        self.attach(block, phi);
        self.blocks[block].phis.push(phi);
    }

    fn attach(&mut self, block: BlockRef, inst: InstRef) {
        assert!(
            self.insts[inst].block.is_none(),
            "attach: {inst} already belongs to {:?}; remove it first",
            self.insts[inst].block,
        );
        self.insts[inst].block = Some(block);
    }

    /// Get immutable reference to instruction data.
    pub fn inst(&self, inst: InstRef) -> &InstData {
        &self.insts[inst]
    }

    pub fn kind(&self, inst: InstRef) -> &InstKind {
        &self.insts[inst].kind
    }

    pub fn ty(&self, inst: InstRef) -> Type {
        self.insts[inst].ty
    }

    pub fn inst_block(&self, inst: InstRef) -> Option<BlockRef> {
        self.insts[inst].block
    }

    /// Get the operands of an instruction as a slice.
    pub fn operands(&self, inst: InstRef) -> &[InstRef] {
        self.insts[inst].operands.as_slice(&self.operand_pool)
    }

    pub fn operand(&self, inst: InstRef, index: usize) -> InstRef {
        self.operands(inst)[index]
    }

    /// Replace the whole operand list of an instruction.
    pub fn set_operands(&mut self, inst: InstRef, operands: impl IntoIterator<Item = InstRef>) {
        self.unlink_operands(inst);
        for v in operands {
            self.push_operand(inst, v);
        }
    }

    /// Append one operand (a new phi input, for instance).
    pub fn push_operand(&mut self, inst: InstRef, v: InstRef) {
        let index = self.insts[inst].operands.len(&self.operand_pool);
        self.insts[inst].operands.push(v, &mut self.operand_pool);
        self.uses[v].push(Use {
            user: inst,
            operand_index: index as u32,
        });
    }

    /// Remove the operand at `index`, shifting later operands down.
    pub fn remove_operand(&mut self, inst: InstRef, index: usize) {
        let operands: SmallVec<[InstRef; 8]> = self.operands(inst).into();
        let removed = operands[index];
        self.uses[removed].retain(|u| !(u.user == inst && u.operand_index == index as u32));
        for (idx, &v) in operands.iter().enumerate().skip(index + 1) {
            for u in self.uses[v].iter_mut() {
                if u.user == inst && u.operand_index == idx as u32 {
                    u.operand_index -= 1;
                }
            }
        }
        self.insts[inst].operands.remove(index, &mut self.operand_pool);
    }

    fn unlink_operands(&mut self, inst: InstRef) {
        let operands: SmallVec<[InstRef; 8]> = self.operands(inst).into();
        for (idx, &v) in operands.iter().enumerate() {
            self.uses[v].retain(|u| !(u.user == inst && u.operand_index == idx as u32));
        }
        self.insts[inst].operands.clear(&mut self.operand_pool);
    }

    /// Detach an instruction from its block and drop its operand uses.
    ///
    /// # Panics
    ///
    /// Panics if the instruction's value still has uses.
    pub fn remove_inst(&mut self, inst: InstRef) {
        assert!(
            !self.has_uses(inst),
            "remove_inst: {inst} still has {} use(s); replace all uses first",
            self.uses[inst].len(),
        );
        if let Some(block) = self.insts[inst].block.take() {
            let data = &mut self.blocks[block];
            data.phis.retain(|i| *i != inst);
            data.insts.retain(|i| *i != inst);
        }
        self.unlink_operands(inst);
        self.insts[inst].removed = true;
    }

    /// Remove a phi from its owning block.
    pub fn remove_phi(&mut self, phi: InstRef) {
        assert!(
            self.insts[phi].kind.is_phi(),
            "remove_phi: {phi} is not a phi",
        );
        self.remove_inst(phi);
    }

    /// Live instructions, in creation order.
    pub fn insts(&self) -> impl Iterator<Item = InstRef> + '_ {
        self.insts
            .iter()
            .filter(|(_, data)| !data.removed)
            .map(|(inst, _)| inst)
    }

    /// Last instruction of the block, if it is a terminator.
    pub fn terminator(&self, block: BlockRef) -> Option<InstRef> {
        self.blocks[block]
            .insts
            .last()
            .copied()
            .filter(|&i| self.insts[i].kind.is_terminator())
    }

    // ========================================================================
    // Use-chain
    // ========================================================================

    /// Get all uses of a value.
    pub fn uses(&self, v: InstRef) -> &[Use] {
        &self.uses[v]
    }

    pub fn has_uses(&self, v: InstRef) -> bool {
        !self.uses[v].is_empty()
    }

    /// Replace all uses of `old` with `new`.
    ///
    /// Updates both operand lists and the use-chain.
    pub fn replace_all_uses(&mut self, old: InstRef, new: InstRef) {
        if old == new {
            return;
        }
        let old_uses = std::mem::take(&mut self.uses[old]);
        for u in &old_uses {
            let slice = self.insts[u.user]
                .operands
                .as_mut_slice(&mut self.operand_pool);
            debug_assert_eq!(slice[u.operand_index as usize], old);
            slice[u.operand_index as usize] = new;
            self.uses[new].push(*u);
        }
    }

    // ========================================================================
    // Block
    // ========================================================================

    pub fn add_block(&mut self) -> BlockRef {
        self.blocks.push(BlockData::default())
    }

    pub fn block(&self, block: BlockRef) -> &BlockData {
        &self.blocks[block]
    }

    /// Raw access for CFG rewrites that keep phis in sync by hand.
    pub(crate) fn block_mut(&mut self, block: BlockRef) -> &mut BlockData {
        &mut self.blocks[block]
    }

    /// Live blocks, in creation order.
    pub fn blocks(&self) -> impl Iterator<Item = BlockRef> + '_ {
        self.blocks
            .iter()
            .filter(|(_, data)| !data.removed)
            .map(|(block, _)| block)
    }

    pub fn num_blocks(&self) -> usize {
        self.blocks().count()
    }

    pub fn entry(&self) -> Option<BlockRef> {
        self.entry
    }

    pub fn set_entry(&mut self, block: BlockRef) {
        self.entry = Some(block);
    }

    /// Add a control-flow edge. Phis of `to` must receive a matching input.
    pub fn add_edge(&mut self, from: BlockRef, to: BlockRef) {
        self.blocks[from].successors.push(to);
        self.blocks[to].predecessors.push(from);
    }

    /// Retarget the edge `block -> old` to `new`.
    ///
    /// `block` is dropped from `old`'s predecessors (together with the
    /// matching phi inputs). `new`'s predecessor list is left to the
    /// caller, see [`Graph::replace_predecessor`].
    ///
    /// # Panics
    ///
    /// Panics if `old` is not a successor of `block`.
    pub fn replace_successor(&mut self, block: BlockRef, old: BlockRef, new: BlockRef) {
        let slot = self.blocks[block]
            .successors
            .iter()
            .position(|&s| s == old)
            .unwrap_or_else(|| panic!("replace_successor: {old} is not a successor of {block}"));
        self.blocks[block].successors[slot] = new;
        self.remove_predecessor(old, block);
    }

    /// Hand the predecessor slot of `old` over to `new`. Phi inputs keep
    /// their position and now flow in along the `new` edge.
    ///
    /// # Panics
    ///
    /// Panics if `old` is not a predecessor of `block`.
    pub fn replace_predecessor(&mut self, block: BlockRef, old: BlockRef, new: BlockRef) {
        let slot = self.blocks[block]
            .predecessors
            .iter()
            .position(|&p| p == old)
            .unwrap_or_else(|| panic!("replace_predecessor: {old} is not a predecessor of {block}"));
        self.blocks[block].predecessors[slot] = new;
    }

    /// Drop `pred` from the predecessors of `block` along with the phi
    /// inputs for that edge.
    pub fn remove_predecessor(&mut self, block: BlockRef, pred: BlockRef) {
        let Some(slot) = self.blocks[block]
            .predecessors
            .iter()
            .position(|&p| p == pred)
        else {
            return;
        };
        self.blocks[block].predecessors.remove(slot);
        let phis = self.blocks[block].phis.clone();
        for phi in phis {
            self.remove_operand(phi, slot);
        }
    }

    /// Delete a single block; see [`Graph::delete_blocks`].
    pub fn delete_block(&mut self, block: BlockRef) {
        self.delete_blocks(&[block]);
    }

    /// Delete a set of blocks together with every instruction they hold.
    ///
    /// Edges to and from surviving blocks are dropped, including the
    /// matching phi inputs in surviving successors.
    ///
    /// # Panics
    ///
    /// Panics if a value defined in the set is still used outside of it.
    pub fn delete_blocks(&mut self, doomed: &[BlockRef]) {
        let set: HashSet<BlockRef> = doomed.iter().copied().collect();

        let mut contents: Vec<InstRef> = Vec::new();
        for &block in doomed {
            let data = &self.blocks[block];
            contents.extend(data.phis.iter().chain(data.insts.iter()).copied());
        }

        for &block in doomed {
            let successors = self.blocks[block].successors.clone();
            for succ in successors {
                if !set.contains(&succ) {
                    self.remove_predecessor(succ, block);
                }
            }
            let predecessors = self.blocks[block].predecessors.clone();
            for pred in predecessors {
                if !set.contains(&pred) {
                    self.blocks[pred].successors.retain(|s| *s != block);
                }
            }
            if let Some(dom) = self.blocks[block].dominator {
                if !set.contains(&dom) {
                    self.blocks[dom].dominated.retain(|d| *d != block);
                }
            }
        }

        for &inst in &contents {
            self.unlink_operands(inst);
        }
        for &inst in &contents {
            if let Some(u) = self.uses[inst].first() {
                panic!(
                    "delete_blocks: {inst} is still used by {} in {:?}",
                    u.user, self.insts[u.user].block,
                );
            }
            self.insts[inst].block = None;
            self.insts[inst].removed = true;
        }

        for &block in doomed {
            self.blocks[block] = BlockData {
                removed: true,
                ..BlockData::default()
            };
        }
    }

    // ========================================================================
    // Dominator tree
    // ========================================================================

    pub fn dominator(&self, block: BlockRef) -> Option<BlockRef> {
        self.blocks[block].dominator
    }

    pub fn set_dominator(&mut self, block: BlockRef, dominator: Option<BlockRef>) {
        self.blocks[block].dominator = dominator;
    }

    /// Replace `old` with `new` in the dominated-block list of `block`.
    ///
    /// # Panics
    ///
    /// Panics if `block` does not immediately dominate `old`.
    pub fn replace_dominated_block(&mut self, block: BlockRef, old: BlockRef, new: BlockRef) {
        let slot = self.blocks[block]
            .dominated
            .iter()
            .position(|&d| d == old)
            .unwrap_or_else(|| {
                panic!("replace_dominated_block: {block} does not dominate {old}")
            });
        self.blocks[block].dominated[slot] = new;
    }

    /// Drop `child` from the dominated-block list of `block`, if present.
    pub fn remove_dominated_block(&mut self, block: BlockRef, child: BlockRef) {
        self.blocks[block].dominated.retain(|d| *d != child);
    }

    pub(crate) fn clear_dominators(&mut self) {
        for (_, data) in self.blocks.iter_mut() {
            data.dominator = None;
            data.dominated.clear();
        }
    }

    pub(crate) fn add_dominated(&mut self, dominator: BlockRef, block: BlockRef) {
        self.blocks[block].dominator = Some(dominator);
        self.blocks[dominator].dominated.push(block);
    }

    // ========================================================================
    // Loop information
    // ========================================================================

    pub fn add_loop(&mut self, info: LoopInformation) -> LoopRef {
        self.loops.push(info)
    }

    pub fn loop_info(&self, lp: LoopRef) -> &LoopInformation {
        &self.loops[lp]
    }

    pub fn loop_info_mut(&mut self, lp: LoopRef) -> &mut LoopInformation {
        &mut self.loops[lp]
    }

    /// All loop levels, outer loops and stale ones included.
    pub fn loops(&self) -> impl Iterator<Item = (LoopRef, &LoopInformation)> + '_ {
        self.loops.iter()
    }

    /// Drop the whole loop forest and every block back-reference.
    pub fn clear_loops(&mut self) {
        self.loops.clear();
        for (_, data) in self.blocks.iter_mut() {
            data.loop_info = None;
        }
    }

    pub fn set_block_loop(&mut self, block: BlockRef, lp: Option<LoopRef>) {
        self.blocks[block].loop_info = lp;
    }

    pub fn block_loop(&self, block: BlockRef) -> Option<LoopRef> {
        self.blocks[block].loop_info
    }

    /// Innermost loop of the block holding `inst`.
    pub fn inst_loop(&self, inst: InstRef) -> Option<LoopRef> {
        self.insts[inst].block.and_then(|b| self.block_loop(b))
    }

    /// Innermost loops whose header is still part of the graph, in
    /// forest order.
    pub fn innermost_loops(&self) -> Vec<LoopRef> {
        self.loops
            .iter()
            .filter(|(_, info)| info.is_innermost() && !self.blocks[info.header()].removed)
            .map(|(lp, _)| lp)
            .collect()
    }

    /// A phi sitting in the header of the loop its block belongs to.
    pub fn is_loop_header_phi(&self, phi: InstRef) -> bool {
        if !self.insts[phi].kind.is_phi() {
            return false;
        }
        let Some(block) = self.insts[phi].block else {
            return false;
        };
        self.block_loop(block)
            .is_some_and(|lp| self.loops[lp].header() == block)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inst::{BinaryOp, CmpOp};

    fn const_i32(graph: &mut Graph, block: BlockRef, value: i64) -> InstRef {
        graph.push_inst(block, InstKind::Const(value), Type::I32, [])
    }

    #[test]
    fn use_chain_tracking() {
        let mut graph = Graph::new("f");
        let b0 = graph.add_block();
        let a = const_i32(&mut graph, b0, 1);
        assert!(!graph.has_uses(a));

        let add = graph.push_inst(b0, InstKind::Binary(BinaryOp::Add), Type::I32, [a, a]);
        let uses = graph.uses(a);
        assert_eq!(uses.len(), 2);
        assert!(uses.iter().all(|u| u.user == add));
        assert_eq!(graph.operands(add), &[a, a]);
        assert_eq!(graph.inst_block(add), Some(b0));
    }

    #[test]
    fn rauw() {
        let mut graph = Graph::new("f");
        let b0 = graph.add_block();
        let a = const_i32(&mut graph, b0, 1);
        let b = const_i32(&mut graph, b0, 2);
        let cmp = graph.push_inst(b0, InstKind::Compare(CmpOp::Lt), Type::Bool, [a, b]);

        graph.replace_all_uses(a, b);

        assert!(!graph.has_uses(a));
        assert_eq!(graph.operands(cmp), &[b, b]);
        assert_eq!(graph.uses(b).len(), 2);
    }

    #[test]
    fn remove_operand_shifts_use_indices() {
        let mut graph = Graph::new("f");
        let b0 = graph.add_block();
        let a = const_i32(&mut graph, b0, 1);
        let b = const_i32(&mut graph, b0, 2);
        let c = const_i32(&mut graph, b0, 3);
        let phi = graph.push_inst(b0, InstKind::Phi, Type::I32, [a, b, c]);

        graph.remove_operand(phi, 0);

        assert_eq!(graph.operands(phi), &[b, c]);
        assert!(!graph.has_uses(a));
        assert_eq!(graph.uses(b)[0].operand_index, 0);
        assert_eq!(graph.uses(c)[0].operand_index, 1);
    }

    #[test]
    fn remove_phi_unlinks_inputs() {
        let mut graph = Graph::new("f");
        let b0 = graph.add_block();
        let a = const_i32(&mut graph, b0, 1);
        let phi = graph.push_inst(b0, InstKind::Phi, Type::I32, [a]);
        assert_eq!(graph.block(b0).phis(), &[phi]);

        graph.remove_phi(phi);

        assert!(graph.block(b0).phis().is_empty());
        assert!(!graph.has_uses(a));
        assert!(graph.inst(phi).is_removed());
    }

    #[test]
    #[should_panic(expected = "still has 1 use")]
    fn remove_used_inst_panics() {
        let mut graph = Graph::new("f");
        let b0 = graph.add_block();
        let a = const_i32(&mut graph, b0, 1);
        graph.push_inst(b0, InstKind::Return, Type::Void, [a]);
        graph.remove_inst(a);
    }

    #[test]
    fn replace_successor_and_predecessor() {
        let mut graph = Graph::new("f");
        let b0 = graph.add_block();
        let b1 = graph.add_block();
        let b2 = graph.add_block();
        graph.add_edge(b0, b1);
        graph.add_edge(b1, b2);

        graph.replace_successor(b0, b1, b2);
        graph.replace_predecessor(b2, b1, b0);

        assert_eq!(graph.block(b0).successors(), &[b2]);
        assert!(graph.block(b1).predecessors().is_empty());
        assert_eq!(graph.block(b2).predecessors(), &[b0]);
    }

    #[test]
    fn delete_blocks_drops_edges_and_phi_inputs() {
        let mut graph = Graph::new("f");
        let b0 = graph.add_block();
        let b1 = graph.add_block();
        let b2 = graph.add_block();
        graph.add_edge(b0, b1);
        graph.add_edge(b0, b2);
        graph.add_edge(b1, b2);
        let x = const_i32(&mut graph, b0, 1);
        let y = const_i32(&mut graph, b1, 2);
        let phi = graph.push_inst(b2, InstKind::Phi, Type::I32, [x, y]);

        // The phi input from b1 goes away with the edge.
        graph.delete_blocks(&[b1]);

        assert!(graph.block(b1).is_removed());
        assert!(graph.inst(y).is_removed());
        assert_eq!(graph.block(b0).successors(), &[b2]);
        assert_eq!(graph.block(b2).predecessors(), &[b0]);
        assert_eq!(graph.operands(phi), &[x]);
        assert_eq!(graph.blocks().collect::<Vec<_>>(), vec![b0, b2]);
    }

    #[test]
    #[should_panic(expected = "delete_blocks")]
    fn delete_blocks_with_escaping_value_panics() {
        let mut graph = Graph::new("f");
        let b0 = graph.add_block();
        let b1 = graph.add_block();
        graph.add_edge(b0, b1);
        let x = const_i32(&mut graph, b0, 1);
        graph.push_inst(b1, InstKind::Return, Type::Void, [x]);
        graph.delete_blocks(&[b0]);
    }

    #[test]
    fn terminator_lookup() {
        let mut graph = Graph::new("f");
        let b0 = graph.add_block();
        let b1 = graph.add_block();
        const_i32(&mut graph, b0, 1);
        assert_eq!(graph.terminator(b0), None);
        let goto = graph.push_inst(b0, InstKind::Goto, Type::Void, []);
        assert_eq!(graph.terminator(b0), Some(goto));
        assert_eq!(graph.terminator(b1), None);
    }

    #[test]
    fn debug_summarizes_live_contents() {
        let mut graph = Graph::new("f");
        let b0 = graph.add_block();
        let b1 = graph.add_block();
        graph.set_entry(b0);
        const_i32(&mut graph, b0, 1);
        graph.push_inst(b0, InstKind::Return, Type::Void, []);
        graph.delete_block(b1);

        insta::assert_snapshot!(
            format!("{graph:?}"),
            @"Graph { name: \"f\", entry: Some(block0), blocks: 1, insts: 2, loops: 0 }"
        );
    }
}
