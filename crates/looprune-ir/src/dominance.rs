//! Dominator tree construction.
//!
//! Uses the iterative algorithm of Cooper, Harvey and Kennedy over the
//! reverse postorder of the blocks reachable from the entry.

use std::collections::{HashMap, HashSet};

use crate::graph::Graph;
use crate::refs::BlockRef;

const UNDEFINED: usize = usize::MAX;

/// Blocks reachable from the entry, in reverse postorder.
pub fn reverse_postorder(graph: &Graph) -> Vec<BlockRef> {
    let Some(entry) = graph.entry() else {
        return Vec::new();
    };

    let mut postorder = Vec::new();
    let mut visited = HashSet::from([entry]);
    let mut stack = vec![(entry, 0usize)];
    while let Some((block, next)) = stack.last_mut() {
        let successors = graph.block(*block).successors();
        if let Some(&succ) = successors.get(*next) {
            *next += 1;
            if visited.insert(succ) {
                stack.push((succ, 0));
            }
        } else {
            postorder.push(*block);
            stack.pop();
        }
    }

    postorder.reverse();
    postorder
}

/// Recompute the immediate dominator and dominated list of every block.
///
/// Unreachable blocks end up with no dominator.
pub fn compute_dominators(graph: &mut Graph) {
    let rpo = reverse_postorder(graph);
    let index: HashMap<BlockRef, usize> = rpo.iter().enumerate().map(|(i, &b)| (b, i)).collect();

    let mut idom = vec![UNDEFINED; rpo.len()];
    if !rpo.is_empty() {
        idom[0] = 0;
    }

    let mut changed = true;
    while changed {
        changed = false;
        for i in 1..rpo.len() {
            let mut new_idom = UNDEFINED;
            for pred in graph.block(rpo[i]).predecessors() {
                let Some(&p) = index.get(pred) else {
                    continue;
                };
                if idom[p] == UNDEFINED {
                    continue;
                }
                new_idom = if new_idom == UNDEFINED {
                    p
                } else {
                    intersect(&idom, p, new_idom)
                };
            }
            if new_idom != idom[i] {
                idom[i] = new_idom;
                changed = true;
            }
        }
    }

    graph.clear_dominators();
    for (i, &dom) in idom.iter().enumerate().skip(1) {
        if dom != UNDEFINED {
            graph.add_dominated(rpo[dom], rpo[i]);
        }
    }
}

fn intersect(idom: &[usize], mut a: usize, mut b: usize) -> usize {
    while a != b {
        while a > b {
            a = idom[a];
        }
        while b > a {
            b = idom[b];
        }
    }
    a
}

/// Whether every path from the entry to `b` passes through `a`.
pub fn dominates(graph: &Graph, a: BlockRef, b: BlockRef) -> bool {
    if a == b {
        return true;
    }
    let mut current = b;
    while let Some(dom) = graph.dominator(current) {
        if dom == a {
            return true;
        }
        current = dom;
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    /// entry -> a -> (b | c) -> d, with an unreachable block.
    fn diamond() -> (Graph, [BlockRef; 6]) {
        let mut graph = Graph::new("diamond");
        let entry = graph.add_block();
        let a = graph.add_block();
        let b = graph.add_block();
        let c = graph.add_block();
        let d = graph.add_block();
        let dead = graph.add_block();
        graph.set_entry(entry);
        graph.add_edge(entry, a);
        graph.add_edge(a, b);
        graph.add_edge(a, c);
        graph.add_edge(b, d);
        graph.add_edge(c, d);
        graph.add_edge(dead, d);
        (graph, [entry, a, b, c, d, dead])
    }

    #[test]
    fn rpo_starts_at_entry_and_skips_unreachable() {
        let (graph, [entry, a, _, _, d, dead]) = diamond();
        let rpo = reverse_postorder(&graph);
        assert_eq!(rpo.len(), 5);
        assert_eq!(rpo[0], entry);
        assert_eq!(rpo[1], a);
        assert_eq!(rpo[4], d);
        assert!(!rpo.contains(&dead));
    }

    #[test]
    fn diamond_dominators() {
        let (mut graph, [entry, a, b, c, d, dead]) = diamond();
        compute_dominators(&mut graph);

        assert_eq!(graph.dominator(entry), None);
        assert_eq!(graph.dominator(a), Some(entry));
        assert_eq!(graph.dominator(b), Some(a));
        assert_eq!(graph.dominator(c), Some(a));
        assert_eq!(graph.dominator(d), Some(a));
        assert_eq!(graph.dominator(dead), None);

        let mut dominated = graph.block(a).dominated().to_vec();
        dominated.sort();
        assert_eq!(dominated, vec![b, c, d]);

        assert!(dominates(&graph, entry, d));
        assert!(dominates(&graph, a, b));
        assert!(!dominates(&graph, b, d));
    }

    #[test]
    fn loop_back_edge_target_dominates_latch() {
        let mut graph = Graph::new("loop");
        let entry = graph.add_block();
        let header = graph.add_block();
        let body = graph.add_block();
        let exit = graph.add_block();
        graph.set_entry(entry);
        graph.add_edge(entry, header);
        graph.add_edge(header, body);
        graph.add_edge(header, exit);
        graph.add_edge(body, header);
        compute_dominators(&mut graph);

        assert!(dominates(&graph, header, body));
        assert_eq!(graph.dominator(exit), Some(header));
    }
}
