//! The per-site output record the genotyping runner produces, and the
//! reasons a site can end up with no call.

use std::collections::HashMap;

use crate::prg::markers::{AlleleId, Base, Marker};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NullReason {
    /// Best call was the reference allele with no coverage anywhere on the site.
    NoCoverage,
    /// Confidence (best - runner-up log-likelihood) fell below the call threshold.
    LowConfidence,
    /// The haplogroup this site is nested under was not the parent's call.
    InvalidatedByParent,
    /// No reads mapped to this site at all.
    NoReadsMapped,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GenotypeCall {
    /// Allele ordinals of the call, one per copy (e.g. `[1]` haploid, `[1,1]`
    /// homozygous diploid, `[1,2]` heterozygous diploid).
    Called(Vec<AlleleId>),
    Null(NullReason),
}

#[derive(Debug, Clone)]
pub struct AlleleInfo {
    pub allele_id: AlleleId,
    pub sequence: Vec<Base>,
    /// The top-level allele of the enclosing site this allele's haplotype
    /// belongs under; equal to `allele_id` for a non-nested site.
    pub haplogroup: AlleleId,
}

#[derive(Debug, Clone)]
pub struct GenotypedSite {
    pub site_marker: Marker,
    pub alleles: Vec<AlleleInfo>,
    pub call: GenotypeCall,
    pub per_allele_coverage: HashMap<AlleleId, f64>,
    pub total_depth: u64,
    pub best_log_likelihood: f64,
    pub runner_up_log_likelihood: f64,
    pub confidence: f64,
}

impl GenotypedSite {
    pub fn is_null(&self) -> bool {
        matches!(self.call, GenotypeCall::Null(_))
    }
}
