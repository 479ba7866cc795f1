//! End-to-end behavior of unused loop removal on graphs read from text.

use std::io::Write;

use looprune::{PipelineConfig, describe_loops, optimize, optimize_file};
use looprune_ir::{Graph, form_loops, parse_test_graph, print_graph, validate_graph};
use looprune_passes::{CompilationStat, CompilationStats, RemoveUnusedLoops, remove_unused_loops};

fn formed(input: &str) -> Graph {
    let mut graph = parse_test_graph(input);
    form_loops(&mut graph);
    graph
}

/// Runs the pass and asserts the graph comes out unchanged.
fn assert_kept(input: &str) {
    let mut graph = formed(input);
    let before = print_graph(&graph);
    let result = remove_unused_loops(&mut graph);
    assert_eq!(result.loops_removed, 0);
    assert_eq!(print_graph(&graph), before);
}

// ============================================================================
// Removed loops
// ============================================================================

#[test]
fn counter_only_loop_is_removed() {
    let mut graph = formed(
        r#"graph @a {
^bb0 -> ^bb1:
  %0 = const 0 : i32
  %1 = const 1 : i32
  %2 = const 100 : i32
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
    let result = remove_unused_loops(&mut graph);

    assert_eq!(result.loops_removed, 1);
    assert_eq!(result.blocks_removed, 2);
    assert!(validate_graph(&graph).is_ok());
    insta::assert_snapshot!(print_graph(&graph), @r"
    graph @a {
    ^bb0 -> ^bb1:
      %0 = const 0 : i32
      %1 = const 1 : i32
      %2 = const 100 : i32
      goto
    ^bb1:
      return
    }
    ");
}

#[test]
fn external_merge_phi_reads_second_input() {
    let mut graph = formed(
        r#"graph @e {
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
    let result = remove_unused_loops(&mut graph);

    assert_eq!(result.loops_removed, 1);
    assert!(validate_graph(&graph).is_ok());
    insta::assert_snapshot!(print_graph(&graph), @r"
    graph @e {
    ^bb0 -> ^bb1:
      %0 = const 0 : i32
      %1 = const 1 : i32
      %2 = const 10 : i32
      %3 = param 0 : i32
      %4 = param 1 : i32
      goto
    ^bb1:
      return %4
    }
    ");
}

#[test]
fn external_merge_phi_reads_back_edge_when_latch_comes_first() {
    // ^bb2 (latch) precedes ^bb3 (preheader) in the header's predecessors
    // as parsed; the merge must still resolve to the back-edge value %4.
    let mut graph = formed(
        r#"graph @r {
^bb0 -> ^bb3:
  %0 = const 0 : i32
  %1 = const 1 : i32
  %2 = const 10 : i32
  %3 = param 0 : i32
  %4 = param 1 : i32
  goto
^bb1 -> ^bb2, ^bb4:
  %5 = phi [%7, ^bb2], [%0, ^bb3] : i32
  %6 = phi [%4, ^bb2], [%3, ^bb3] : i32
  %8 = cmp.lt %5, %2 : bool
  if %8
^bb2 -> ^bb1:
  %7 = add %5, %1 : i32
  goto
^bb3 -> ^bb1:
  goto
^bb4:
  return %6
}"#,
    );
    let result = remove_unused_loops(&mut graph);

    assert_eq!(result.loops_removed, 1);
    assert!(validate_graph(&graph).is_ok());
    insta::assert_snapshot!(print_graph(&graph), @r"
    graph @r {
    ^bb0 -> ^bb1:
      %0 = const 0 : i32
      %1 = const 1 : i32
      %2 = const 10 : i32
      %3 = param 0 : i32
      %4 = param 1 : i32
      goto
    ^bb1 -> ^bb2:
      goto
    ^bb2:
      return %4
    }
    ");
}

#[test]
fn exit_reached_from_two_loop_blocks_keeps_its_phi() {
    // Both ^bb1 and ^bb2 leave the loop for ^bb3, whose phi only merges
    // values from before the loop.
    let mut graph = formed(
        r#"graph @x {
^bb0 -> ^bb1:
  %0 = const 0 : i32
  %1 = const 1 : i32
  %2 = const 10 : i32
  %3 = param 0 : bool
  goto
^bb1 -> ^bb2, ^bb3:
  %4 = phi [%0, ^bb0], [%6, ^bb2] : i32
  %5 = cmp.lt %4, %2 : bool
  if %5
^bb2 -> ^bb1, ^bb3:
  %6 = add %4, %1 : i32
  if %3
^bb3:
  %7 = phi [%2, ^bb1], [%0, ^bb2] : i32
  return %7
}"#,
    );
    let result = remove_unused_loops(&mut graph);

    assert_eq!(result.loops_removed, 1);
    assert_eq!(result.blocks_removed, 2);
    assert!(validate_graph(&graph).is_ok());
    insta::assert_snapshot!(print_graph(&graph), @r"
    graph @x {
    ^bb0 -> ^bb1:
      %0 = const 0 : i32
      %1 = const 1 : i32
      %2 = const 10 : i32
      %3 = param 0 : bool
      goto
    ^bb1:
      %4 = phi [%2, ^bb0] : i32
      return %4
    }
    ");
}

#[test]
fn branching_entry_gets_preheader_then_loop_goes() {
    // The block entering the header also branches around the loop, so
    // loop formation splits the edge with a preheader, which the pass then
    // routes straight to the exit.
    let mut graph = parse_test_graph(
        r#"graph @g {
^bb0 -> ^bb1, ^bb3:
  %0 = const 0 : i32
  %1 = const 1 : i32
  %2 = const 8 : i32
  %3 = param 0 : bool
  if %3
^bb1 -> ^bb2, ^bb3:
  %4 = phi [%0, ^bb0], [%6, ^bb2] : i32
  %5 = cmp.lt %4, %2 : bool
  if %5
^bb2 -> ^bb1:
  %6 = add %4, %1 : i32
  goto
^bb3:
  return
}"#,
    );
    let formation = form_loops(&mut graph);
    assert_eq!(formation.preheaders_inserted, 1);

    let result = remove_unused_loops(&mut graph);

    assert_eq!(result.loops_removed, 1);
    assert!(validate_graph(&graph).is_ok());
    assert_eq!(graph.loops().count(), 0);
    assert_eq!(graph.blocks().count(), 3);
}

// ============================================================================
// Kept loops
// ============================================================================

#[test]
fn counter_stored_after_loop_is_kept() {
    assert_kept(
        r#"graph @b {
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
  %6 = add %4, %1 : i32
  goto
^bb3:
  store.field 0 %3, %4
  return
}"#,
    );
}

#[test]
fn unknown_trip_count_is_kept() {
    assert_kept(
        r#"graph @c {
^bb0 -> ^bb1:
  %0 = const 0 : i32
  %1 = param 0 : i32
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
  return
}"#,
    );
}

#[test]
fn two_exit_blocks_are_kept() {
    assert_kept(
        r#"graph @d {
^bb0 -> ^bb1:
  %0 = const 0 : i32
  %1 = const 1 : i32
  %2 = const 10 : i32
  %3 = param 0 : bool
  goto
^bb1 -> ^bb2, ^bb3:
  %4 = phi [%0, ^bb0], [%6, ^bb2] : i32
  %5 = cmp.lt %4, %2 : bool
  if %5
^bb2 -> ^bb1, ^bb4:
  %6 = add %4, %1 : i32
  if %3
^bb3:
  return
^bb4:
  return
}"#,
    );
}

#[test]
fn call_in_body_is_kept() {
    assert_kept(
        r#"graph @k {
^bb0 -> ^bb1:
  %0 = const 0 : i32
  %1 = const 1 : i32
  %2 = const 10 : i32
  goto
^bb1 -> ^bb2, ^bb3:
  %3 = phi [%0, ^bb0], [%4, ^bb2] : i32
  %5 = cmp.lt %3, %2 : bool
  if %5
^bb2 -> ^bb1:
  call @observe
  %4 = add %3, %1 : i32
  goto
^bb3:
  return
}"#,
    );
}

// ============================================================================
// Pass-level properties
// ============================================================================

const NESTED: &str = r#"graph @n {
^bb0 -> ^bb1:
  %0 = const 0 : i32
  %1 = const 1 : i32
  %2 = const 4 : i32
  goto
^bb1 -> ^bb2, ^bb6:
  %3 = phi [%0, ^bb0], [%7, ^bb5] : i32
  %4 = cmp.lt %3, %2 : bool
  if %4
^bb2 -> ^bb3:
  goto
^bb3 -> ^bb4, ^bb5:
  %5 = phi [%0, ^bb2], [%8, ^bb4] : i32
  %6 = cmp.lt %5, %2 : bool
  if %6
^bb4 -> ^bb3:
  %8 = add %5, %1 : i32
  goto
^bb5 -> ^bb1:
  %7 = add %3, %1 : i32
  goto
^bb6:
  return %3
}"#;

#[test]
fn inner_loop_goes_outer_loop_stays() {
    let mut graph = formed(NESTED);
    let result = remove_unused_loops(&mut graph);

    assert_eq!(result.loops_visited, 1);
    assert_eq!(result.loops_removed, 1);
    assert!(validate_graph(&graph).is_ok());
    insta::assert_snapshot!(looprune_ir::print_loops(&graph).trim_end(), @"loop0: header ^bb1, preheader ^bb0, exit ^bb4, blocks [^bb1, ^bb2, ^bb3], innermost, countable");
}

#[test]
fn pass_is_idempotent() {
    let mut graph = formed(NESTED);
    remove_unused_loops(&mut graph);
    let once = print_graph(&graph);

    // The outer loop is now innermost, but its counter is returned.
    let again = remove_unused_loops(&mut graph);
    assert_eq!(again.loops_visited, 1);
    assert_eq!(again.loops_removed, 0);
    assert_eq!(print_graph(&graph), once);
}

#[test]
fn stats_sink_is_optional() {
    let mut plain = formed(NESTED);
    let plain_result = remove_unused_loops(&mut plain);

    let mut counted = formed(NESTED);
    let mut stats = CompilationStats::new();
    let counted_result = RemoveUnusedLoops::new().stats(&mut stats).run(&mut counted);

    assert_eq!(plain_result, counted_result);
    assert_eq!(print_graph(&plain), print_graph(&counted));
    assert_eq!(stats.get(CompilationStat::RemoveUnusedLoops), 1);
}

// ============================================================================
// Pipeline
// ============================================================================

#[test]
fn pipeline_from_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(NESTED.as_bytes()).unwrap();

    let output = optimize_file(file.path(), &PipelineConfig::default()).unwrap();

    assert_eq!(output.removal.loops_removed, 1);
    assert_eq!(output.stats.to_string(), "RemoveUnusedLoops: 1\n");
    insta::assert_snapshot!(print_graph(&output.graph), @r"
    graph @n {
    ^bb0 -> ^bb1:
      %0 = const 0 : i32
      %1 = const 1 : i32
      %2 = const 4 : i32
      goto
    ^bb1 -> ^bb2, ^bb4:
      %3 = phi [%0, ^bb0], [%5, ^bb3] : i32
      %4 = cmp.lt %3, %2 : bool
      if %4
    ^bb2 -> ^bb3:
      goto
    ^bb3 -> ^bb1:
      %5 = add %3, %1 : i32
      goto
    ^bb4:
      return %3
    }
    ");
}

#[test]
fn missing_file_is_an_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = optimize_file(&dir.path().join("absent.ir"), &PipelineConfig::default())
        .unwrap_err();
    assert!(err.to_string().starts_with("I/O error:"));
}

#[test]
fn verify_accepts_optimized_graph() {
    let config = PipelineConfig {
        dce: true,
        verify: true,
    };
    assert!(optimize(NESTED, &config).is_ok());
}

#[test]
fn describe_nested_loops() {
    insta::assert_snapshot!(describe_loops(NESTED).unwrap().trim_end(), @r"
    loop0: header ^bb1, preheader ^bb0, exit ^bb6, blocks [^bb1, ^bb2, ^bb3, ^bb4, ^bb5], countable
    loop1: header ^bb3, preheader ^bb2, exit ^bb5, parent loop0, blocks [^bb3, ^bb4], innermost, countable
    ");
}
