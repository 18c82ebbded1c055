//! Variant-aware backward search: extend a set of states by one base at a
//! time, forking across marker crossings and deduplicating by (interval,
//! path) after each step.
//!
//! Grounded on gramtools' `BWT_search.hpp`: a step narrows every live state by
//! the next read base, and additionally scans the SA range for marker
//! occurrences to fork into sibling alleles. A marker occurrence's own text
//! position (via the coverage graph's random-access array) gives the locus
//! crossed; the coverage graph's target map gives the set of markers that
//! can legitimately precede it in the variation graph, each resolved to a
//! fresh C-array block rather than the literal LF-mapped predecessor, since
//! the latter only ever recovers whichever allele happens to sit next to
//! this occurrence in the flat PRG text, not its siblings.

use std::collections::HashSet;

use crate::fmindex::{FmIndex, SaInterval};
use crate::graph::CoverageGraph;
use crate::prg::markers::{Base, Symbol, VariantLocus, ALLELE_UNKNOWN};
use crate::search::state::{Classification, SearchState};

/// Longest chain of consecutive zero-length alleles a single fork step will
/// walk through before giving up; guards against a pathological PRG with
/// unbounded nesting of empty alleles.
const MAX_MARKER_CHAIN: usize = 64;

pub fn search(fm: &FmIndex, graph: &CoverageGraph, pattern: &[Base]) -> Vec<SearchState> {
    let mut states = vec![SearchState::initial(fm.full_interval())];

    for &base in pattern.iter().rev() {
        if states.is_empty() {
            break;
        }
        let mut next_states: Vec<SearchState> = Vec::new();
        for state in &states {
            step(fm, graph, state, base, &mut next_states);
        }
        states = dedup(next_states);
    }

    states.into_iter().filter(|s| !s.is_empty()).collect()
}

fn step(fm: &FmIndex, graph: &CoverageGraph, state: &SearchState, base: Base, out: &mut Vec<SearchState>) {
    let direct = fm.backward_step(state.sa_interval, base as Symbol);
    if !direct.is_empty() {
        out.push(SearchState {
            sa_interval: direct,
            path: state.path.clone(),
            classification: state.classification,
        });
    }

    for i in state.sa_interval.lo..state.sa_interval.hi {
        if !fm.is_marker_at(i) {
            continue;
        }
        for forked in fork_across_marker(fm, graph, i, base) {
            let mut path = state.path.clone();
            path.extend(forked.loci);
            out.push(SearchState {
                sa_interval: forked.interval,
                path,
                classification: forked.classification,
            });
        }
    }
}

struct Fork {
    interval: SaInterval,
    loci: Vec<VariantLocus>,
    classification: Classification,
}

/// Cross one marker occurrence. At every marker reached — the triggering one
/// and any further ones chained through a run of zero-length alleles — look
/// up the coverage graph's target map and try each targeted marker as a
/// fresh match, rather than relying on the triggering occurrence's single
/// literal text-predecessor (which can only ever be the last-written allele
/// at that marker value, never a sibling).
fn fork_across_marker(fm: &FmIndex, graph: &CoverageGraph, marker_sa_index: u32, base: Base) -> Vec<Fork> {
    let mut out = Vec::new();
    let mut interval = SaInterval::new(marker_sa_index, marker_sa_index + 1);
    let mut loci: Vec<VariantLocus> = Vec::new();
    let mut classification = Classification::JustExitedSite;

    for _ in 0..MAX_MARKER_CHAIN {
        let marker_value = fm.bwt_at(interval.lo);
        let marker_text_pos = predecessor_text_pos(fm, interval.lo);

        if let Some(access) = graph.access_at(marker_text_pos) {
            if let Some(locus) = access.target {
                classification = classify(locus);
                loci.push(locus);
            }
        }

        fork_via_target_map(fm, graph, marker_value, base, &loci, classification, &mut out);

        let stepped = fm.backward_step(interval, marker_value);
        if stepped.is_empty() {
            break;
        }
        if fm.is_marker_at(stepped.lo) && stepped.len() == 1 {
            // Zero-length allele: no sequence between this marker and the
            // next, keep chaining through the literal text.
            interval = stepped;
            continue;
        }
        break;
    }
    out
}

/// For every marker the coverage graph records as reachable from
/// `marker_value`, seed a brand-new match on that marker's own symbol (its
/// full C-array block, exactly as if starting a fresh backward search) and
/// try to extend it by `base`. A direct-deletion hint additionally produces
/// an extra fork whose path records the empty allele, consuming no base.
fn fork_via_target_map(
    fm: &FmIndex,
    graph: &CoverageGraph,
    marker_value: Symbol,
    base: Base,
    loci_so_far: &[VariantLocus],
    classification: Classification,
    out: &mut Vec<Fork>,
) {
    for target in graph.targets_of(marker_value) {
        let fresh = SaInterval::new(fm.c_array_at(target.id), fm.c_array_at(target.id + 1));
        if fresh.is_empty() {
            continue;
        }

        let stepped = fm.backward_step(fresh, base as Symbol);
        if !stepped.is_empty() {
            let mut loci = loci_so_far.to_vec();
            if let Some(locus) = landing_locus(fm, graph, stepped) {
                loci.push(locus);
            }
            out.push(Fork {
                interval: stepped,
                loci,
                classification: Classification::InsideSite,
            });
        }

        if let Some(allele) = target.direct_deletion_allele {
            let mut loci = loci_so_far.to_vec();
            loci.push(VariantLocus::new(target.id, allele));
            out.push(Fork {
                interval: fresh,
                loci,
                classification: Classification::JustExitedSite,
            });
        }
    }
}

fn classify(locus: VariantLocus) -> Classification {
    if locus.allele_id == ALLELE_UNKNOWN {
        Classification::JustExitedSite
    } else {
        Classification::InsideSite
    }
}

/// The (site, allele) of the node that owns the base just matched by
/// `stepped`, used to attribute which allele a fork actually landed in (the
/// node's own metadata, since a base position's random-access entry carries
/// no locus of its own). `None` outside any bubble.
fn landing_locus(fm: &FmIndex, graph: &CoverageGraph, stepped: SaInterval) -> Option<VariantLocus> {
    let base_pos = fm.sa_at(stepped.lo) as usize;
    let access = graph.access_at(base_pos)?;
    let node = graph.node(access.node);
    if !node.is_in_bubble() {
        return None;
    }
    Some(VariantLocus::new(node.site_marker(), node.allele_id()))
}

/// Text position of the symbol at BWT index `i`, i.e. the position one base
/// to the left of the suffix starting at `SA[i]` (wrapping past the
/// sentinel).
fn predecessor_text_pos(fm: &FmIndex, i: u32) -> usize {
    let suffix_start = fm.sa_at(i) as usize;
    if suffix_start == 0 {
        fm.len() - 1
    } else {
        suffix_start - 1
    }
}

fn dedup(states: Vec<SearchState>) -> Vec<SearchState> {
    let mut seen: HashSet<(SaInterval, Vec<VariantLocus>)> = HashSet::new();
    let mut out = Vec::new();
    for state in states {
        let key = (state.sa_interval, state.path.clone());
        if seen.insert(key) {
            out.push(state);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::build_coverage_graph;
    use crate::prg::markers::encode_dna_bases;
    use crate::prg::string::PrgString;

    fn build(text: &str) -> (FmIndex, CoverageGraph) {
        let prg = PrgString::from_text(text).unwrap();
        let fm = FmIndex::build(prg.as_ints());
        let graph = build_coverage_graph(&prg).unwrap();
        (fm, graph)
    }

    #[test]
    fn marker_free_prg_matches_like_exact_search() {
        let (fm, graph) = build("AATAACAACAA");
        let pattern = encode_dna_bases("AAC");
        let states = search(&fm, &graph, &pattern);
        assert!(!states.is_empty());
        assert!(states.iter().all(|s| s.path.is_empty()));
    }

    #[test]
    fn read_crossing_one_site_records_the_allele_it_entered() {
        let (fm, graph) = build("AATAA[CCC,GGG]AA");
        let pattern = encode_dna_bases("TAACCCAA");
        let states = search(&fm, &graph, &pattern);
        assert!(!states.is_empty());
        assert!(states
            .iter()
            .any(|s| s.path.iter().any(|locus| locus.allele_id == 1)));
    }

    #[test]
    fn direct_deletion_allele_is_reachable() {
        let (fm, graph) = build("GGGGG[CCC,]GG");
        let pattern = encode_dna_bases("GGGGGGG");
        let states = search(&fm, &graph, &pattern);
        assert!(!states.is_empty());
    }
}
