//! CFG surgery: bypass a loop and delete its blocks.

use looprune_ir::{BlockRef, Graph, LoopRef};
use tracing::debug;

/// Route `preheader` straight to `exit` and delete every block of `lp`.
///
/// The exit block's predecessor slot for the first exiting edge is handed
/// to the preheader, so exit phis keep the input they had for that edge.
/// Dominator links are patched locally and the deleted blocks are dropped
/// from the member sets of `lp` and all of its ancestors. Other loop
/// information is stale until the loop forest is rebuilt.
///
/// Returns the deleted blocks.
///
/// # Panics
///
/// Panics if the preheader has more than one successor, or if `exit` is
/// not entered from inside the loop.
pub fn remove_loop(
    graph: &mut Graph,
    lp: LoopRef,
    preheader: BlockRef,
    exit: BlockRef,
) -> Vec<BlockRef> {
    let info = graph.loop_info(lp);
    let header = info.header();
    let blocks: Vec<BlockRef> = info.blocks().collect();

    let successors = graph.block(preheader).successors().len();
    assert!(
        successors == 1,
        "remove_loop: preheader {preheader} of {lp} has {successors} successors; expected exactly 1",
    );

    let exiting = graph
        .block(exit)
        .predecessors()
        .iter()
        .copied()
        .find(|p| blocks.contains(p))
        .unwrap_or_else(|| panic!("remove_loop: exit {exit} of {lp} has no predecessor in the loop"));

    graph.replace_predecessor(exit, exiting, preheader);
    graph.replace_successor(preheader, header, exit);

    graph.replace_dominated_block(preheader, header, exit);
    if let Some(old) = graph.dominator(exit) {
        if old != preheader && !blocks.contains(&old) {
            graph.remove_dominated_block(old, exit);
        }
    }
    graph.set_dominator(exit, Some(preheader));

    graph.delete_blocks(&blocks);

    let mut level = Some(lp);
    while let Some(current) = level {
        let info = graph.loop_info_mut(current);
        for &block in &blocks {
            info.remove(block);
        }
        level = info.parent();
    }

    debug!(%lp, %header, %preheader, %exit, blocks = blocks.len(), "removed loop");
    blocks
}
