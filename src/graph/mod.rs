pub mod builder;
pub mod coverage_graph;
pub mod node;
pub mod persist;

pub use builder::build_coverage_graph;
pub use coverage_graph::{CoverageGraph, NodeAccess, TargetedMarker};
pub use node::CoverageNode;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prg::string::PrgString;

    #[test]
    fn marker_free_prg_keeps_all_sequence_on_wired_path() {
        let prg = PrgString::from_text("AATAACAACAA").unwrap();
        let graph = build_coverage_graph(&prg).unwrap();

        let mut node = graph.root();
        let mut seen = Vec::new();
        loop {
            let succs = graph.successors(node);
            if succs.is_empty() {
                break;
            }
            node = succs[0];
            seen.extend_from_slice(graph.node(node).sequence());
        }
        assert_eq!(seen.len(), 11);
    }

    #[test]
    fn single_site_produces_one_bubble() {
        let prg = PrgString::from_text("A[C,G]T").unwrap();
        let graph = build_coverage_graph(&prg).unwrap();
        assert_eq!(graph.bubbles_innermost_first().len(), 1);
        let marker = graph.bubbles_innermost_first()[0];
        assert!(graph.bubble_start(marker).is_some());
        assert!(graph.bubble_end(marker).is_some());
    }

    #[test]
    fn nested_site_is_recorded_in_parental_map() {
        let prg = PrgString::from_text("A[C,G[T,A]C]T").unwrap();
        let graph = build_coverage_graph(&prg).unwrap();
        assert!(graph.is_nested());
        assert_eq!(graph.bubbles_innermost_first().len(), 2);
        // innermost (child) site sorts first
        let inner = graph.bubbles_innermost_first()[0];
        assert!(graph.parent_locus(inner).is_some());
    }

    #[test]
    fn direct_deletion_sets_allele_hint_in_target_map() {
        let prg = PrgString::from_text("GGGGG[CCC,]GG").unwrap();
        let graph = build_coverage_graph(&prg).unwrap();
        let site_marker = graph.bubbles_innermost_first()[0];
        let targets = graph.target_map();
        let has_direct_deletion = targets
            .values()
            .flatten()
            .any(|t| t.id == site_marker + 1 && t.direct_deletion_allele.is_some());
        assert!(has_direct_deletion);
    }
}
