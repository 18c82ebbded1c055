//! A single node of the coverage graph: a run of PRG sequence (possibly
//! empty, for bubble boundaries) plus the atomic per-base coverage counters
//! that quasi-mapping increments concurrently.

use std::sync::atomic::{AtomicU64, Ordering};

use crate::prg::markers::{AlleleId, Base, Marker, ALLELE_UNKNOWN};

#[derive(Debug)]
pub struct CoverageNode {
    sequence: Vec<Base>,
    site_marker: Marker,
    allele_id: AlleleId,
    /// Position of this node's first base in the original PRG string. For
    /// empty (boundary) nodes, the position of the marker that created them.
    pos: usize,
    coverage: Vec<AtomicU64>,
    is_boundary: bool,
}

impl CoverageNode {
    pub fn new(sequence: Vec<Base>, pos: usize, site_marker: Marker, allele_id: AlleleId) -> Self {
        let coverage = (0..sequence.len()).map(|_| AtomicU64::new(0)).collect();
        CoverageNode {
            sequence,
            site_marker,
            allele_id,
            pos,
            coverage,
            is_boundary: false,
        }
    }

    /// Rebuild a content node with explicit coverage counts, used when
    /// deserializing a previously-mapped coverage graph.
    pub fn with_coverage(sequence: Vec<Base>, pos: usize, site_marker: Marker, allele_id: AlleleId, coverage: Vec<u64>) -> Self {
        debug_assert_eq!(sequence.len(), coverage.len());
        CoverageNode {
            sequence,
            site_marker,
            allele_id,
            pos,
            coverage: coverage.into_iter().map(AtomicU64::new).collect(),
            is_boundary: false,
        }
    }

    pub fn boundary(pos: usize, site_marker: Marker) -> Self {
        CoverageNode {
            sequence: Vec::new(),
            site_marker,
            allele_id: ALLELE_UNKNOWN,
            pos,
            coverage: Vec::new(),
            is_boundary: true,
        }
    }

    pub fn root(pos: usize) -> Self {
        CoverageNode {
            sequence: Vec::new(),
            site_marker: 0,
            allele_id: ALLELE_UNKNOWN,
            pos,
            coverage: Vec::new(),
            is_boundary: true,
        }
    }

    pub fn sequence(&self) -> &[Base] {
        &self.sequence
    }

    pub fn has_sequence(&self) -> bool {
        !self.sequence.is_empty()
    }

    pub fn pos(&self) -> usize {
        self.pos
    }

    pub fn site_marker(&self) -> Marker {
        self.site_marker
    }

    pub fn allele_id(&self) -> AlleleId {
        self.allele_id
    }

    pub fn is_in_bubble(&self) -> bool {
        self.site_marker != 0 && self.allele_id != ALLELE_UNKNOWN
    }

    pub fn is_boundary(&self) -> bool {
        self.is_boundary
    }

    pub fn append(&mut self, base: Base) {
        self.sequence.push(base);
        self.coverage.push(AtomicU64::new(0));
    }

    /// Increment the per-base coverage counter at `offset` within this node.
    pub fn record_base(&self, offset: usize) {
        self.coverage[offset].fetch_add(1, Ordering::Relaxed);
    }

    pub fn coverage_at(&self, offset: usize) -> u64 {
        self.coverage[offset].load(Ordering::Relaxed)
    }

    pub fn coverage_vec(&self) -> Vec<u64> {
        self.coverage.iter().map(|c| c.load(Ordering::Relaxed)).collect()
    }

    /// Number of positions whose coverage meets or exceeds `threshold`.
    pub fn credible_positions(&self, threshold: u64) -> usize {
        self.coverage
            .iter()
            .filter(|c| c.load(Ordering::Relaxed) >= threshold)
            .count()
    }
}

/// Structural equality ignoring coverage counts and node identity: same
/// sequence, same site/allele, same position.
impl PartialEq for CoverageNode {
    fn eq(&self, other: &Self) -> bool {
        self.sequence == other.sequence
            && self.site_marker == other.site_marker
            && self.allele_id == other.allele_id
            && self.pos == other.pos
            && self.is_boundary == other.is_boundary
    }
}
