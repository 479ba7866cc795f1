//! Rewriting of external-merge header phis ahead of loop deletion.

use looprune_ir::Graph;
use tracing::trace;

use super::analysis::ExternalPhis;

/// Replace every use of each external-merge phi with its second input,
/// then drop the phi.
///
/// Loop formation keeps the preheader edge in predecessor slot 0 of every
/// header, so the second input is the one arriving along the back edge.
///
/// # Panics
///
/// Panics if a phi in `external` does not have exactly two inputs.
pub fn rewrite_external_phis(graph: &mut Graph, external: ExternalPhis) {
    for phi in external.iter() {
        let inputs = graph.operands(phi);
        assert!(
            inputs.len() == 2,
            "rewrite_external_phis: {phi} has {} input(s); external-merge phis have exactly 2",
            inputs.len()
        );
        let replacement = inputs[1];
        trace!(%phi, %replacement, "rewriting external-merge phi");
        graph.replace_all_uses(phi, replacement);
        graph.remove_phi(phi);
    }
}
