//! The two coverage stores quasi-mapping writes into besides the per-base
//! counters already living on each `CoverageNode`: per-allele totals and
//! per-bubble grouped-allele-class counts.
//!
//! Grounded on the coverage-graph's atomic per-base counters
//! (`graph::node::CoverageNode::record_base`): per-allele coverage uses the
//! same atomic-counter strategy, while grouped-allele-class counts (keyed by
//! a dynamic allele subset, not a fixed array index) use one mutex-guarded
//! map per bubble, matching the design note's "partition reads / merge
//! shadows" alternative where a fixed-size atomic doesn't fit the key space.

use std::collections::{BTreeSet, HashMap};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use serde::{Deserialize, Serialize};

use crate::errors::Result;
use crate::graph::CoverageGraph;
use crate::prg::markers::{AlleleId, Marker, VariantLocus};

/// A non-empty subset of a site's allele ordinals that some read was found
/// compatible with.
pub type EquivalenceClass = BTreeSet<AlleleId>;

pub struct CoverageStore {
    per_allele: HashMap<VariantLocus, AtomicU64>,
    grouped: HashMap<Marker, Mutex<HashMap<EquivalenceClass, u64>>>,
    reads_mapped: AtomicU64,
    reads_unmapped: AtomicU64,
}

impl CoverageStore {
    pub fn new(graph: &CoverageGraph) -> Self {
        let mut grouped = HashMap::new();
        for &site_marker in graph.bubbles_innermost_first() {
            grouped.insert(site_marker, Mutex::new(HashMap::new()));
        }
        let per_allele = graph
            .known_loci()
            .into_iter()
            .map(|locus| (locus, AtomicU64::new(0)))
            .collect();
        CoverageStore {
            per_allele,
            grouped,
            reads_mapped: AtomicU64::new(0),
            reads_unmapped: AtomicU64::new(0),
        }
    }

    pub fn record_allele_hit(&self, locus: VariantLocus) {
        // every locus the graph knows about is pre-populated in `new`, so a
        // miss here means the search engine attributed coverage to a locus
        // the graph doesn't recognize.
        self.per_allele
            .get(&locus)
            .map(|c| c.fetch_add(1, Ordering::Relaxed));
    }

    pub fn allele_coverage(&self, locus: VariantLocus) -> u64 {
        self.per_allele.get(&locus).map(|c| c.load(Ordering::Relaxed)).unwrap_or(0)
    }

    pub fn record_equivalence_class(&self, site_marker: Marker, class: EquivalenceClass) {
        if class.is_empty() {
            return;
        }
        if let Some(bubble) = self.grouped.get(&site_marker) {
            let mut map = bubble.lock().expect("coverage mutex poisoned");
            *map.entry(class).or_insert(0) += 1;
        }
    }

    pub fn equivalence_classes(&self, site_marker: Marker) -> HashMap<EquivalenceClass, u64> {
        self.grouped
            .get(&site_marker)
            .map(|m| m.lock().expect("coverage mutex poisoned").clone())
            .unwrap_or_default()
    }

    pub fn record_mapped(&self) {
        self.reads_mapped.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_unmapped(&self) {
        self.reads_unmapped.fetch_add(1, Ordering::Relaxed);
    }

    pub fn reads_mapped(&self) -> u64 {
        self.reads_mapped.load(Ordering::Relaxed)
    }

    pub fn reads_unmapped(&self) -> u64 {
        self.reads_unmapped.load(Ordering::Relaxed)
    }

    /// Flatten to a plain, serializable snapshot so `quasimap` and
    /// `genotype` can run as separate CLI invocations sharing coverage
    /// through a JSON file on disk, the same way the coverage graph itself
    /// is handed between `build` and later subcommands.
    pub fn to_snapshot(&self) -> CoverageSnapshot {
        let per_allele = self
            .per_allele
            .iter()
            .map(|(&locus, c)| (locus, c.load(Ordering::Relaxed)))
            .collect();
        let grouped = self
            .grouped
            .iter()
            .map(|(&marker, classes)| {
                let classes = classes.lock().expect("coverage mutex poisoned");
                let entries = classes
                    .iter()
                    .map(|(class, &count)| (class.iter().copied().collect(), count))
                    .collect();
                (marker, entries)
            })
            .collect();
        CoverageSnapshot {
            per_allele,
            grouped,
            reads_mapped: self.reads_mapped(),
            reads_unmapped: self.reads_unmapped(),
        }
    }

    /// Rebuild a store from a snapshot, re-deriving the fixed locus/bubble
    /// key sets from `graph` exactly as `new` does so lookups by locus or
    /// site marker behave identically to a freshly-mapped store.
    pub fn from_snapshot(graph: &CoverageGraph, snapshot: CoverageSnapshot) -> Self {
        let store = CoverageStore::new(graph);
        for (locus, count) in snapshot.per_allele {
            if let Some(counter) = store.per_allele.get(&locus) {
                counter.store(count, Ordering::Relaxed);
            }
        }
        for (marker, entries) in snapshot.grouped {
            if let Some(bubble) = store.grouped.get(&marker) {
                let mut map = bubble.lock().expect("coverage mutex poisoned");
                for (class, count) in entries {
                    map.insert(class.into_iter().collect(), count);
                }
            }
        }
        store.reads_mapped.store(snapshot.reads_mapped, Ordering::Relaxed);
        store.reads_unmapped.store(snapshot.reads_unmapped, Ordering::Relaxed);
        store
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(&self.to_snapshot())?)
    }

    pub fn from_json(graph: &CoverageGraph, text: &str) -> Result<Self> {
        let snapshot: CoverageSnapshot = serde_json::from_str(text)?;
        Ok(CoverageStore::from_snapshot(graph, snapshot))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoverageSnapshot {
    per_allele: Vec<(VariantLocus, u64)>,
    grouped: HashMap<Marker, Vec<(Vec<AlleleId>, u64)>>,
    reads_mapped: u64,
    reads_unmapped: u64,
}
