//! The state carried through variant-aware backward search: an SA interval
//! plus the path of variant loci crossed to reach it.

use crate::fmindex::SaInterval;
use crate::prg::markers::VariantLocus;

/// Where a state currently sits relative to variant sites, used downstream by
/// quasi-mapping to decide how to fold a state's path into grouped-allele
/// counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    OutsideAnySite,
    InsideSite,
    JustExitedSite,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SearchState {
    pub sa_interval: SaInterval,
    /// Variant loci traversed so far, most recently crossed first.
    pub path: Vec<VariantLocus>,
    pub classification: Classification,
}

impl SearchState {
    pub fn initial(full_interval: SaInterval) -> Self {
        SearchState {
            sa_interval: full_interval,
            path: Vec::new(),
            classification: Classification::OutsideAnySite,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.sa_interval.is_empty()
    }
}
