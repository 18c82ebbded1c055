//! Drives the level genotyper over every bubble and propagates invalidation
//! down the nesting tree.
//!
//! Grounded on the teacher's `GenotypingEngine` (bubble-by-bubble calling
//! loop) and §4.C's bubble-map ordering guarantee: a bottom-up pass computes
//! every site's raw call with its own children already final, then a
//! top-down pass nulls out any child whose parent locus was not the parent's
//! chosen haplogroup.

use std::collections::HashMap;

use rayon::prelude::*;

use crate::genotype::likelihood::{heterozygous_log_likelihood, homozygous_log_likelihood, PoissonTables, LOG_LIKELIHOOD_FLOOR};
use crate::genotype::model::{allele_len, allele_sequence, credible_positions, haploid_coverage, site_allele_ids, singleton_coverage, total_depth};
use crate::genotype::site::{AlleleInfo, GenotypeCall, GenotypedSite, NullReason};
use crate::graph::CoverageGraph;
use crate::params::Ploidy;
use crate::prg::markers::{AlleleId, Marker};
use crate::quasimap::CoverageStore;
use crate::stats::ReadStats;

/// The allele ordinal treated as "reference" for the null-call rule: a best
/// call of this allele with zero coverage anywhere on the site is null
/// rather than a (vacuous) genotype.
const REFERENCE_ALLELE_ID: AlleleId = 1;

/// Minimum (best - runner-up) log-likelihood gap required to accept a call.
const CONFIDENCE_THRESHOLD: f64 = 1.0;

pub fn genotype_graph(
    graph: &CoverageGraph,
    coverage: &CoverageStore,
    stats: &ReadStats,
    ploidy: Ploidy,
    credible_cov_t: u32,
) -> HashMap<Marker, GenotypedSite> {
    let poisson = PoissonTables::new(stats.mean_depth);
    let bubbles = graph.bubbles_innermost_first();

    // Independent bubbles (no ancestor/descendant relationship implied by
    // the innermost-first order itself) can be called in parallel; children
    // never depend on a parent's result, only parents depend on children
    // being *enumerable*, which the coverage graph already guarantees since
    // alleles are static structure, not computed state.
    let called: Vec<(Marker, GenotypedSite)> = bubbles
        .par_iter()
        .map(|&site_marker| (site_marker, call_site(graph, coverage, stats, &poisson, ploidy, credible_cov_t, site_marker)))
        .collect();

    let mut calls: HashMap<Marker, GenotypedSite> = called.into_iter().collect();

    // Top-down invalidation: walk bubbles in reverse (outermost/leftmost
    // first among what remains), nulling children under haplogroups the
    // parent didn't choose.
    for &parent_marker in bubbles.iter().rev() {
        let chosen: Option<Vec<AlleleId>> = calls.get(&parent_marker).and_then(|s| match &s.call {
            GenotypeCall::Called(alleles) => Some(alleles.clone()),
            _ => None,
        });
        for &child_marker in bubbles {
            let parent_locus = match graph.parent_locus(child_marker) {
                Some(locus) if locus.marker == parent_marker => locus,
                _ => continue,
            };
            let invalidated = match &chosen {
                None => true,
                Some(alleles) => !alleles.contains(&parent_locus.allele_id),
            };
            if invalidated {
                if let Some(child) = calls.get_mut(&child_marker) {
                    child.call = GenotypeCall::Null(NullReason::InvalidatedByParent);
                }
            }
        }
    }

    calls
}

fn call_site(
    graph: &CoverageGraph,
    coverage: &CoverageStore,
    stats: &ReadStats,
    poisson: &PoissonTables,
    ploidy: Ploidy,
    credible_cov_t: u32,
    site_marker: Marker,
) -> GenotypedSite {
    let allele_ids = site_allele_ids(graph, site_marker);
    let credible_cov_t = credible_cov_t as u64;

    let alleles: Vec<AlleleInfo> = allele_ids
        .iter()
        .map(|&id| AlleleInfo {
            allele_id: id,
            sequence: allele_sequence(graph, site_marker, id),
            haplogroup: id,
        })
        .collect();

    let per_allele_coverage: HashMap<AlleleId, f64> = allele_ids
        .iter()
        .map(|&id| (id, haploid_coverage(coverage, site_marker, id)))
        .collect();

    let depth = total_depth(coverage, site_marker);

    if depth == 0 || allele_ids.is_empty() {
        return GenotypedSite {
            site_marker,
            alleles,
            call: GenotypeCall::Null(NullReason::NoReadsMapped),
            per_allele_coverage,
            total_depth: depth,
            best_log_likelihood: LOG_LIKELIHOOD_FLOOR,
            runner_up_log_likelihood: LOG_LIKELIHOOD_FLOOR,
            confidence: 0.0,
        };
    }

    let total_coverage: f64 = per_allele_coverage.values().sum();

    // Homozygous candidates: one per allele.
    let mut candidates: Vec<(Vec<AlleleId>, f64)> = allele_ids
        .iter()
        .map(|&a| {
            let cov_a = per_allele_coverage[&a];
            let len_a = allele_len(graph, site_marker, a);
            let credible_a = credible_positions(graph, site_marker, a, credible_cov_t);
            let ll = homozygous_log_likelihood(poisson, stats, cov_a, credible_a, len_a, total_coverage - cov_a);
            let genotype = vec![a; ploidy.copies()];
            (genotype, ll)
        })
        .collect();

    // Heterozygous candidates: only alleles carrying at least one singleton
    // unit of coverage are eligible to pair, bounding the candidate count.
    if ploidy == Ploidy::Diploid {
        let eligible: Vec<AlleleId> = allele_ids
            .iter()
            .copied()
            .filter(|&a| singleton_coverage(coverage, site_marker, a) > 0)
            .collect();
        for (i, &a) in eligible.iter().enumerate() {
            for &b in &eligible[i + 1..] {
                let ll = heterozygous_log_likelihood(poisson, per_allele_coverage[&a], per_allele_coverage[&b]);
                candidates.push((vec![a, b], ll));
            }
        }
    }

    candidates.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
    let (best_genotype, best_ll) = candidates[0].clone();
    let runner_up_ll = candidates.get(1).map(|(_, ll)| *ll).unwrap_or(LOG_LIKELIHOOD_FLOOR);
    let confidence = best_ll - runner_up_ll;

    let is_reference_with_no_coverage =
        best_genotype.iter().all(|&a| a == REFERENCE_ALLELE_ID) && total_coverage == 0.0;

    let call = if is_reference_with_no_coverage {
        GenotypeCall::Null(NullReason::NoCoverage)
    } else if confidence < CONFIDENCE_THRESHOLD {
        GenotypeCall::Null(NullReason::LowConfidence)
    } else {
        GenotypeCall::Called(best_genotype)
    };

    GenotypedSite {
        site_marker,
        alleles,
        call,
        per_allele_coverage,
        total_depth: depth,
        best_log_likelihood: best_ll,
        runner_up_log_likelihood: runner_up_ll,
        confidence,
    }
}
