//! End-to-end scenarios exercising the full pipeline (PRG text -> FM-index ->
//! coverage graph -> quasi-mapping -> genotyping) without touching the CLI
//! or filesystem.

use std::collections::HashMap;

use gramalign::fmindex::FmIndex;
use gramalign::genotype::{genotype_graph, GenotypeCall, GenotypedSite};
use gramalign::graph::{build_coverage_graph, CoverageGraph};
use gramalign::params::Ploidy;
use gramalign::prg::{decode_dna_bases, encode_dna_bases, Marker, PrgString};
use gramalign::quasimap::{quasimap_reads, CoverageStore};
use gramalign::stats::ReadStats;

fn run(prg_text: &str, reads: &[&str], ploidy: Ploidy, credible_cov_t: u32) -> (CoverageGraph, HashMap<Marker, GenotypedSite>) {
    let prg = PrgString::from_text(prg_text).expect("valid PRG text");
    let fm = FmIndex::build(prg.as_ints());
    let graph = build_coverage_graph(&prg).expect("buildable graph");
    let coverage = CoverageStore::new(&graph);

    let encoded: Vec<Vec<u8>> = reads.iter().map(|r| encode_dna_bases(r)).collect();
    let mapping_stats = quasimap_reads(&fm, &graph, &coverage, &encoded, None);
    let read_stats = ReadStats::estimate(&mapping_stats, prg.len(), 0.01);
    let calls = genotype_graph(&graph, &coverage, &read_stats, ploidy, credible_cov_t);
    (graph, calls)
}

fn called_sequence(graph: &CoverageGraph, calls: &HashMap<Marker, GenotypedSite>, site_marker: Marker) -> String {
    let site = &calls[&site_marker];
    match &site.call {
        GenotypeCall::Called(alleles) => {
            let allele_id = alleles[0];
            let info = site.alleles.iter().find(|a| a.allele_id == allele_id).expect("called allele exists");
            decode_dna_bases(&info.sequence)
        }
        GenotypeCall::Null(reason) => panic!("expected a call at site {}, got null ({:?}) (graph has {} nodes)", site_marker, reason, graph.node_count()),
    }
}

/// Scenario 1: two independent, non-nested biallelic sites; five reads
/// support the `C` allele at both, one supports `G` at the first only.
#[test]
fn two_non_nested_sites_call_the_majority_allele() {
    let (graph, calls) = run(
        "AATAA[C,G]AA[C,G]AA",
        &[
            "AATAACAACAA",
            "AATAACAACAA",
            "AATAACAACAA",
            "AATAACAACAA",
            "AATAACAACAA",
            "AATAAGAACAA",
        ],
        Ploidy::Haploid,
        1,
    );

    let mut markers: Vec<Marker> = graph.bubbles_innermost_first().to_vec();
    markers.sort_unstable();
    assert_eq!(markers.len(), 2);
    assert_eq!(called_sequence(&graph, &calls, markers[0]), "C");
    assert_eq!(called_sequence(&graph, &calls, markers[1]), "C");
}

/// Scenario 2: a nested site. The outer site's first allele itself contains
/// a variant site; five reads cross both choosing the inner `G` branch, one
/// read takes the outer's plain second allele.
#[test]
fn nested_site_calls_outer_and_inner_independently() {
    let (graph, calls) = run(
        "AATAA[CCC[A,G],T]AA",
        &[
            "AATAACCCGAA",
            "AATAACCCGAA",
            "AATAACCCGAA",
            "AATAACCCGAA",
            "AATAACCCGAA",
            "AATAATAA",
        ],
        Ploidy::Haploid,
        1,
    );

    let mut markers: Vec<Marker> = graph.bubbles_innermost_first().to_vec();
    markers.sort_unstable();
    let (outer, inner) = (markers[0], markers[1]);
    assert_eq!(called_sequence(&graph, &calls, outer), "CCCG");
    assert_eq!(called_sequence(&graph, &calls, inner), "G");
}

/// Scenario 3: a direct deletion (empty allele). Reads are long enough to
/// span the whole bubble via the empty branch, so the call should be the
/// empty allele rather than the three-base insertion.
#[test]
fn direct_deletion_allele_is_called_when_reads_skip_the_site() {
    let (graph, calls) = run(
        "GGGGG[CCC,]GG",
        &["GGGGGGG", "GGGGGGG", "GGGGGGG", "GGGGGGG", "GGGGGGG"],
        Ploidy::Haploid,
        1,
    );

    let site_marker = graph.bubbles_innermost_first()[0];
    assert_eq!(called_sequence(&graph, &calls, site_marker), "");
}

/// Scenario 4: doubly-nested sites under two sibling outer alleles. Reads
/// concentrate on the first outer allele and its inner site; the second
/// inner site (under the allele that lost) is invalidated.
#[test]
fn child_site_under_an_unchosen_haplogroup_is_invalidated() {
    let (graph, calls) = run(
        "ATCGGC[TC[A,G]TC,GG[T,G]GG]AT",
        &[
            "ATCGGCTCGTCAT",
            "ATCGGCTCGTCAT",
            "ATCGGCTCGTCAT",
            "ATCGGCTCGTCAT",
            "ATCGGCTCGTCAT",
            "ATCGGCTCGTCAT",
            "ATCGGCTCGTCAT",
            "ATCGGCGGGGGAT",
        ],
        Ploidy::Haploid,
        1,
    );

    let markers: Vec<Marker> = graph.bubbles_innermost_first().to_vec();
    // innermost-first order: the two inner sites precede the outer one.
    let outer = *markers.iter().max().unwrap();
    assert_eq!(called_sequence(&graph, &calls, outer), "TCGTC");

    // The chosen outer allele is allele 1 ("TC[A,G]TC", called via its reads
    // above); its nested site should be called, while the sibling allele's
    // nested site — never chosen — is invalidated.
    let chosen_inner = markers
        .iter()
        .copied()
        .find(|&m| m != outer && graph.parent_locus(m).map(|l| l.allele_id == 1).unwrap_or(false))
        .expect("inner site nested under the chosen allele");
    let other_inner = markers
        .iter()
        .copied()
        .find(|&m| m != outer && graph.parent_locus(m).map(|l| l.allele_id == 2).unwrap_or(false))
        .expect("inner site nested under the unchosen allele");

    assert_eq!(called_sequence(&graph, &calls, chosen_inner), "G");
    assert!(calls[&other_inner].is_null());
}

/// Scenario 5: zero reads mapped. Every site must resolve to a null call,
/// never panic or silently report a confident genotype.
#[test]
fn zero_mapped_reads_nulls_every_site() {
    let (_, calls) = run("AATAA[C,G]AA", &[], Ploidy::Haploid, 1);
    assert!(!calls.is_empty());
    assert!(calls.values().all(|site| site.is_null()));
}

/// Scenario 6: balanced diploid heterozygous coverage across two alleles at
/// one site, with both shared-compatible and singleton-only reads.
#[test]
fn balanced_diploid_coverage_calls_heterozygous() {
    let (graph, calls) = run(
        "AA[CCCC,GGGG]TT",
        &[
            "AACCCCTT", "AACCCCTT", "AACCCCTT", "AACCCCTT",
            "AAGGGGTT", "AAGGGGTT", "AAGGGGTT", "AAGGGGTT",
        ],
        Ploidy::Diploid,
        1,
    );

    let site_marker = graph.bubbles_innermost_first()[0];
    let site = &calls[&site_marker];
    match &site.call {
        GenotypeCall::Called(alleles) => {
            assert_eq!(alleles.len(), 2);
            assert_ne!(alleles[0], alleles[1]);
            assert!(site.confidence >= 0.0);
        }
        GenotypeCall::Null(reason) => panic!("expected a heterozygous call, got null ({:?})", reason),
    }
}
