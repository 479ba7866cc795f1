//! Emptiness analysis: decides whether a loop computes nothing the rest
//! of the method can observe.

use looprune_ir::{BlockRef, Graph, InstRef, LoopRef};
use smallvec::SmallVec;
use tracing::{debug, trace};

/// Header phis whose two inputs are both defined outside the loop.
///
/// Such a phi only selects between two loop-invariant values; once the
/// loop is gone its uses read the second input instead.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ExternalPhis(SmallVec<[InstRef; 2]>);

impl ExternalPhis {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, phi: InstRef) {
        if !self.contains(phi) {
            self.0.push(phi);
        }
    }

    pub fn contains(&self, phi: InstRef) -> bool {
        self.0.contains(&phi)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = InstRef> + '_ {
        self.0.iter().copied()
    }
}

/// Whether `lp` can be deleted without changing observable behavior.
///
/// External-merge header phis found on the way are added to `external`.
/// Phis outside the loop that only exist to receive a loop value and have
/// no uses themselves are deleted during the scan, whatever the verdict.
///
/// # Panics
///
/// Panics if `lp` is not an innermost loop.
pub fn is_empty_loop(graph: &mut Graph, lp: LoopRef, external: &mut ExternalPhis) -> bool {
    let blocks: Vec<_> = graph.loop_info(lp).blocks().collect();
    for block in blocks {
        if !check_phis(graph, lp, block, external) {
            return false;
        }
        if !check_insts(graph, lp, block) {
            return false;
        }
    }
    true
}

fn is_outside(graph: &Graph, lp: LoopRef, inst: InstRef) -> bool {
    graph.inst_loop(inst) != Some(lp)
}

fn check_phis(
    graph: &Graph,
    lp: LoopRef,
    block: BlockRef,
    external: &mut ExternalPhis,
) -> bool {
    let info = graph.loop_info(lp);
    assert!(
        info.is_innermost(),
        "is_empty_loop: {lp} (header {}) is not an innermost loop",
        info.header()
    );

    for &phi in graph.block(block).phis() {
        let inputs = graph.operands(phi);
        if graph.is_loop_header_phi(phi)
            && inputs.len() == 2
            && inputs.iter().all(|&input| is_outside(graph, lp, input))
        {
            trace!(%lp, %phi, "external-merge header phi");
            external.insert(phi);
            continue;
        }

        if let Some(u) = graph
            .uses(phi)
            .iter()
            .find(|u| is_outside(graph, lp, u.user))
        {
            debug!(%lp, %phi, user = %u.user, "loop kept: phi used after the loop");
            return false;
        }
    }
    true
}

fn check_insts(graph: &mut Graph, lp: LoopRef, block: BlockRef) -> bool {
    let insts = graph.block(block).insts().to_vec();
    for inst in insts {
        let kind = graph.kind(inst);
        if kind.is_barrier() {
            continue;
        }
        if kind.is_terminator() && !kind.can_throw() {
            continue;
        }
        if kind.has_side_effects() || kind.can_throw() || !kind.can_relocate() {
            debug!(%lp, %inst, kind = %kind.mnemonic(), "loop kept: instruction cannot be dropped");
            return false;
        }
        if graph.ty(inst).is_void() {
            continue;
        }

        let mut doomed: SmallVec<[InstRef; 2]> = SmallVec::new();
        let mut escaped = None;
        for u in graph.uses(inst) {
            if !is_outside(graph, lp, u.user) {
                continue;
            }
            if graph.kind(u.user).is_phi() && !graph.has_uses(u.user) {
                if !doomed.contains(&u.user) {
                    doomed.push(u.user);
                }
            } else {
                escaped = Some(u.user);
            }
        }

        for phi in doomed {
            trace!(%lp, %phi, "deleting unused phi fed by the loop");
            graph.remove_phi(phi);
        }

        if let Some(user) = escaped {
            debug!(%lp, %inst, %user, "loop kept: value used after the loop");
            return false;
        }
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use looprune_ir::{form_loops, parse_test_graph, print_graph};

    fn analyze(input: &str) -> (Graph, bool, ExternalPhis) {
        let mut graph = parse_test_graph(input);
        form_loops(&mut graph);
        let lp = graph.innermost_loops()[0];
        let mut external = ExternalPhis::new();
        let empty = is_empty_loop(&mut graph, lp, &mut external);
        (graph, empty, external)
    }

    #[test]
    fn counter_only_loop_is_empty() {
        let (_, empty, external) = analyze(
            r#"graph @f {
^bb0 -> ^bb1:
  %0 = const 0 : i32
  %1 = const 1 : i32
  %2 = const 10 : i32
  goto
^bb1 -> ^bb2, ^bb3:
  %3 = phi [%0, ^bb0], [%5, ^bb2] : i32
  %4 = cmp.lt %3, %2 : bool
  if %4
^bb2 -> ^bb1:
  suspend_check
  %5 = add %3, %1 : i32
  goto
^bb3:
  return
}"#,
        );
        assert!(empty);
        assert!(external.is_empty());
    }

    #[test]
    fn live_out_counter_keeps_loop() {
        let (_, empty, _) = analyze(
            r#"graph @f {
^bb0 -> ^bb1:
  %0 = const 0 : i32
  %1 = const 1 : i32
  %2 = const 10 : i32
  goto
^bb1 -> ^bb2, ^bb3:
  %3 = phi [%0, ^bb0], [%5, ^bb2] : i32
  %4 = cmp.lt %3, %2 : bool
  if %4
^bb2 -> ^bb1:
  %5 = add %3, %1 : i32
  goto
^bb3:
  return %3
}"#,
        );
        assert!(!empty);
    }

    #[test]
    fn side_effects_keep_loop() {
        let (_, empty, _) = analyze(
            r#"graph @f {
^bb0 -> ^bb1:
  %0 = const 0 : i32
  %1 = const 1 : i32
  %2 = const 10 : i32
  %3 = param 0 : ref
  goto
^bb1 -> ^bb2, ^bb3:
  %4 = phi [%0, ^bb0], [%6, ^bb2] : i32
  %5 = cmp.lt %4, %2 : bool
  if %5
^bb2 -> ^bb1:
  store.field 0 %3, %4
  %6 = add %4, %1 : i32
  goto
^bb3:
  return
}"#,
        );
        assert!(!empty);
    }

    #[test]
    fn throwing_division_keeps_loop() {
        let (_, empty, _) = analyze(
            r#"graph @f {
^bb0 -> ^bb1:
  %0 = const 0 : i32
  %1 = const 1 : i32
  %2 = const 10 : i32
  %3 = param 0 : i32
  goto
^bb1 -> ^bb2, ^bb3:
  %4 = phi [%0, ^bb0], [%7, ^bb2] : i32
  %5 = cmp.lt %4, %2 : bool
  if %5
^bb2 -> ^bb1:
  %6 = div %2, %3 : i32
  %7 = add %4, %1 : i32
  goto
^bb3:
  return
}"#,
        );
        assert!(!empty);
    }

    #[test]
    fn external_merge_phi_is_collected() {
        let (graph, empty, external) = analyze(
            r#"graph @f {
^bb0 -> ^bb1:
  %0 = const 0 : i32
  %1 = const 1 : i32
  %2 = const 10 : i32
  %3 = param 0 : i32
  %4 = param 1 : i32
  goto
^bb1 -> ^bb2, ^bb3:
  %5 = phi [%0, ^bb0], [%8, ^bb2] : i32
  %6 = phi [%3, ^bb0], [%4, ^bb2] : i32
  %7 = cmp.lt %5, %2 : bool
  if %7
^bb2 -> ^bb1:
  %8 = add %5, %1 : i32
  goto
^bb3:
  return %6
}"#,
        );
        assert!(empty);
        assert_eq!(external.len(), 1);
        let header = graph.blocks().nth(1).unwrap();
        let [counter, merge] = graph.block(header).phis() else {
            panic!("expected two header phis");
        };
        assert!(external.contains(*merge));
        assert!(!external.contains(*counter));
    }

    #[test]
    fn unused_exit_phi_is_deleted_even_when_loop_is_kept() {
        // %6 receives the comparison but nothing reads it; it goes away
        // while scanning bb1, before the call in bb3 keeps the loop alive.
        let (graph, empty, _) = analyze(
            r#"graph @f {
^bb0 -> ^bb1:
  %0 = const 0 : i32
  %1 = const 1 : i32
  %2 = const 10 : i32
  goto
^bb1 -> ^bb2, ^bb4:
  %3 = phi [%0, ^bb0], [%5, ^bb3] : i32
  %4 = cmp.lt %3, %2 : bool
  if %4
^bb2 -> ^bb3:
  %5 = add %3, %1 : i32
  goto
^bb3 -> ^bb1:
  call @tick
  goto
^bb4:
  %6 = phi [%4, ^bb1] : bool
  return
}"#,
        );
        assert!(!empty);
        insta::assert_snapshot!(print_graph(&graph), @r"
        graph @f {
        ^bb0 -> ^bb1:
          %0 = const 0 : i32
          %1 = const 1 : i32
          %2 = const 10 : i32
          goto
        ^bb1 -> ^bb2, ^bb4:
          %3 = phi [%0, ^bb0], [%5, ^bb3] : i32
          %4 = cmp.lt %3, %2 : bool
          if %4
        ^bb2 -> ^bb3:
          %5 = add %3, %1 : i32
          goto
        ^bb3 -> ^bb1:
          call @tick
          goto
        ^bb4:
          return
        }
        ");
    }

    #[test]
    #[should_panic(expected = "is not an innermost loop")]
    fn outer_loop_is_rejected() {
        let mut graph = parse_test_graph(
            r#"graph @f {
^bb0 -> ^bb1:
  %0 = param 0 : bool
  goto
^bb1 -> ^bb2, ^bb5:
  if %0
^bb2 -> ^bb3:
  goto
^bb3 -> ^bb3, ^bb4:
  if %0
^bb4 -> ^bb1:
  goto
^bb5:
  return
}"#,
        );
        form_loops(&mut graph);
        let outer = graph
            .loops()
            .find(|(_, info)| !info.is_innermost())
            .map(|(lp, _)| lp)
            .unwrap();
        is_empty_loop(&mut graph, outer, &mut ExternalPhis::new());
    }
}
