//! Coverage aggregation helpers consumed by the runner: haploid and
//! singleton coverage per allele, and credible-position counts, all derived
//! from a bubble's grouped-allele-class counts and per-base node counters.

use crate::graph::CoverageGraph;
use crate::prg::markers::{AlleleId, Base, Marker};
use crate::quasimap::CoverageStore;

/// Sum, over every equivalence class containing `allele`, of the class's
/// read count split equally across the class's members. A class of size one
/// (a read unambiguously on this allele) contributes its full count.
pub fn haploid_coverage(coverage: &CoverageStore, site_marker: Marker, allele: AlleleId) -> f64 {
    coverage
        .equivalence_classes(site_marker)
        .into_iter()
        .filter(|(class, _)| class.contains(&allele))
        .map(|(class, count)| count as f64 / class.len() as f64)
        .sum()
}

/// Count of equivalence classes equal to exactly `{allele}`.
pub fn singleton_coverage(coverage: &CoverageStore, site_marker: Marker, allele: AlleleId) -> u64 {
    coverage
        .equivalence_classes(site_marker)
        .into_iter()
        .filter(|(class, _)| class.len() == 1 && class.contains(&allele))
        .map(|(_, count)| count)
        .sum()
}

/// Total reads mapped into this bubble: the sum of every equivalence class's
/// count (Σ over classes = reads mapped into the bubble).
pub fn total_depth(coverage: &CoverageStore, site_marker: Marker) -> u64 {
    coverage.equivalence_classes(site_marker).values().sum()
}

pub fn allele_sequence(graph: &CoverageGraph, site_marker: Marker, allele: AlleleId) -> Vec<Base> {
    graph
        .allele_nodes(site_marker, allele)
        .into_iter()
        .flat_map(|idx| graph.node(idx).sequence().to_vec())
        .collect()
}

pub fn allele_len(graph: &CoverageGraph, site_marker: Marker, allele: AlleleId) -> usize {
    graph
        .allele_nodes(site_marker, allele)
        .into_iter()
        .map(|idx| graph.node(idx).sequence().len())
        .sum()
}

pub fn credible_positions(graph: &CoverageGraph, site_marker: Marker, allele: AlleleId, threshold: u64) -> usize {
    graph
        .allele_nodes(site_marker, allele)
        .into_iter()
        .map(|idx| graph.node(idx).credible_positions(threshold))
        .sum()
}

/// Every distinct allele ordinal that belongs to `site_marker`.
pub fn site_allele_ids(graph: &CoverageGraph, site_marker: Marker) -> Vec<AlleleId> {
    let mut ids: Vec<AlleleId> = graph
        .known_loci()
        .into_iter()
        .filter(|locus| locus.marker == site_marker)
        .map(|locus| locus.allele_id)
        .collect();
    ids.sort_unstable();
    ids.dedup();
    ids
}
