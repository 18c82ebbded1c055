//! Drive the search engine for each read, try both strands, and fold
//! surviving states into the coverage stores.
//!
//! Grounded on the teacher's mapping drivers (`processing`/`reads` thread
//! pools over `rayon`): reads partition across a `rayon` pool, and the only
//! shared mutable state touched per read is the coverage graph's atomic
//! counters plus the grouped-allele-class mutex maps in `CoverageStore` — no
//! lock is ever held across more than one allele/class update.

use std::collections::{BTreeMap, BTreeSet};

use rayon::prelude::*;

use crate::fmindex::FmIndex;
use crate::graph::CoverageGraph;
use crate::prg::markers::{reverse_complement, Base, Marker, VariantLocus};
use crate::quasimap::coverage::CoverageStore;
use crate::quasimap::kmer_index::KmerIndex;
use crate::search::{search, SearchState};

/// Upper bound on live search states kept per read; a read that blows past
/// this during a step is abandoned as unmapped rather than let run away.
pub const MAX_CONCURRENT_STATES: usize = 4096;

pub struct MappingStats {
    pub mapped: u64,
    pub unmapped: u64,
    pub skipped_empty_or_oversized: u64,
    pub total_mapped_bases: u64,
}

/// Map every read in `reads` against `fm`/`graph`, writing coverage into
/// `coverage`. `seeds`, if given, prunes a read whose trailing k-mer cannot
/// occur in the PRG before paying for a full backward search — a pure
/// performance optimization that never changes which reads end up mapped
/// (§4.L). Returns summary counters consumed by read-statistics estimation
/// (§4.G).
pub fn quasimap_reads(
    fm: &FmIndex,
    graph: &CoverageGraph,
    coverage: &CoverageStore,
    reads: &[Vec<Base>],
    seeds: Option<&KmerIndex>,
) -> MappingStats {
    let prg_len = graph.random_access().len();

    let per_read: Vec<(bool, usize)> = reads
        .par_iter()
        .map(|read| quasimap_one(fm, graph, coverage, read, prg_len, seeds))
        .collect();

    let mut mapped = 0u64;
    let mut unmapped = 0u64;
    let mut skipped = 0u64;
    let mut total_mapped_bases = 0u64;
    for (was_mapped, bases) in per_read {
        if bases == 0 && !was_mapped {
            skipped += 1;
            continue;
        }
        if was_mapped {
            mapped += 1;
            total_mapped_bases += bases as u64;
        } else {
            unmapped += 1;
        }
    }

    MappingStats {
        mapped,
        unmapped,
        skipped_empty_or_oversized: skipped,
        total_mapped_bases,
    }
}

/// Map one read (forward, then reverse complement if forward found nothing).
/// Returns (mapped, read length) for statistics; a skipped read reports
/// `(false, 0)`.
fn quasimap_one(
    fm: &FmIndex,
    graph: &CoverageGraph,
    coverage: &CoverageStore,
    read: &[Base],
    prg_len: usize,
    seeds: Option<&KmerIndex>,
) -> (bool, usize) {
    if read.is_empty() || read.len() > prg_len {
        return (false, 0);
    }

    let forward_seeded = seeds.map(|k| k.contains_seed(read)).unwrap_or(true);
    let forward = if forward_seeded { search(fm, graph, read) } else { Vec::new() };
    let (states, oriented_read) = if !forward.is_empty() {
        (forward, read.to_vec())
    } else {
        let rc = reverse_complement(read);
        let rc_seeded = seeds.map(|k| k.contains_seed(&rc)).unwrap_or(true);
        let rc_states = if rc_seeded { search(fm, graph, &rc) } else { Vec::new() };
        (rc_states, rc)
    };

    if states.is_empty() {
        coverage.record_unmapped();
        return (false, read.len());
    }
    if states.len() > MAX_CONCURRENT_STATES {
        coverage.record_unmapped();
        return (false, read.len());
    }

    for state in &states {
        record_state(fm, graph, coverage, state, &oriented_read);
    }
    coverage.record_mapped();
    (true, read.len())
}

fn record_state(fm: &FmIndex, graph: &CoverageGraph, coverage: &CoverageStore, state: &SearchState, read: &[Base]) {
    // `path` is most-recent-crossed-first; forward-chronological order is
    // the order the read will actually walk the graph in.
    let forward_path: Vec<VariantLocus> = state.path.iter().rev().copied().collect();

    let mut by_site: BTreeMap<Marker, BTreeSet<u32>> = BTreeMap::new();
    for &locus in &forward_path {
        coverage.record_allele_hit(locus);
        by_site.entry(locus.marker).or_default().insert(locus.allele_id);
    }
    for (site_marker, class) in by_site {
        coverage.record_equivalence_class(site_marker, class);
    }

    for occurrence in state.sa_interval.lo..state.sa_interval.hi {
        let start_pos = fm.sa_at(occurrence) as usize;
        replay_per_base_coverage(graph, start_pos, read, &forward_path);
    }
}

/// Walk the coverage graph forward from `start_pos`, following `path` at
/// each bubble-start fork, incrementing the per-base counter for every
/// matched position.
fn replay_per_base_coverage(graph: &CoverageGraph, start_pos: usize, read: &[Base], path: &[VariantLocus]) {
    let access = match graph.access_at(start_pos) {
        Some(a) => a,
        None => return,
    };
    let mut node = access.node;
    let mut offset = access.offset;
    let mut path_idx = 0usize;

    for &base in read {
        loop {
            let seq_len = graph.node(node).sequence().len();
            if offset < seq_len {
                if graph.node(node).sequence()[offset] == base {
                    graph.node(node).record_base(offset);
                }
                offset += 1;
                break;
            }
            let succs = graph.successors(node);
            let Some(&next) = succs.first() else { return };
            if succs.len() > 1 {
                if let Some(locus) = path.get(path_idx) {
                    let chosen = succs.iter().copied().find(|&s| {
                        let n = graph.node(s);
                        n.site_marker() == locus.marker && n.allele_id() == locus.allele_id
                    });
                    node = chosen.unwrap_or(next);
                    path_idx += 1;
                } else {
                    node = next;
                }
            } else {
                node = next;
            }
            offset = 0;
        }
    }
}
