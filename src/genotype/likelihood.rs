//! Poisson log-likelihood machinery: tables at full and half the mean depth,
//! plus the homozygous/heterozygous scoring functions the runner calls once
//! per candidate genotype.
//!
//! Grounded on `statrs::distribution::{Poisson, Discrete}`; the teacher's own
//! `genotype_likelihood_calculator.rs` precomputes a similar pmf table once
//! per site rather than re-deriving factorials per call.

use statrs::distribution::{Discrete, Poisson};

use crate::stats::ReadStats;

/// A large-magnitude finite sentinel used in place of -inf so likelihood
/// differences (confidence = best - runner-up) never produce NaN.
pub const LOG_LIKELIHOOD_FLOOR: f64 = -1.0e12;

pub struct PoissonTables {
    full: Poisson,
    half: Poisson,
}

impl PoissonTables {
    /// `mean_depth` of zero or less is clamped to a small positive value:
    /// `Poisson` requires a strictly positive rate, and a genuinely
    /// zero-coverage run should still produce finite (very negative)
    /// likelihoods rather than fail to build a table at all.
    pub fn new(mean_depth: f64) -> Self {
        let lambda = mean_depth.max(1e-9);
        let full = Poisson::new(lambda).expect("positive lambda always yields a valid Poisson");
        let half = Poisson::new((lambda / 2.0).max(1e-9)).expect("positive lambda always yields a valid Poisson");
        PoissonTables { full, half }
    }

    pub fn ln_pmf_full(&self, k: u64) -> f64 {
        clamp(self.full.ln_pmf(k))
    }

    pub fn ln_pmf_half(&self, k: u64) -> f64 {
        clamp(self.half.ln_pmf(k))
    }
}

fn clamp(value: f64) -> f64 {
    if value.is_nan() || value < LOG_LIKELIHOOD_FLOOR {
        LOG_LIKELIHOOD_FLOOR
    } else {
        value
    }
}

/// Log-likelihood of `a` being the true allele under a homozygous (haploid,
/// or diploid same-allele) call: Poisson support for the allele's own
/// coverage, a penalty for positions that fail the credible-coverage
/// threshold, and a penalty scaled by the error rate for coverage landing on
/// competing alleles (only explicable as sequencing error if `a` is truly
/// homozygous).
pub fn homozygous_log_likelihood(
    poisson: &PoissonTables,
    stats: &ReadStats,
    haploid_coverage: f64,
    credible_positions: usize,
    allele_len: usize,
    other_alleles_coverage: f64,
) -> f64 {
    let covered_term = poisson.ln_pmf_full(haploid_coverage.round().max(0.0) as u64);
    let uncovered = allele_len.saturating_sub(credible_positions) as f64;
    let uncovered_penalty = uncovered * stats.log_no_zero.min(0.0);
    let error_penalty = other_alleles_coverage * stats.error_rate.max(f64::MIN_POSITIVE).ln();
    clamp(covered_term + uncovered_penalty + error_penalty)
}

/// Log-likelihood of the heterozygous pair `(a, b)`: half-depth Poisson
/// support for each allele's own (singleton plus shared) coverage, combined
/// additively.
pub fn heterozygous_log_likelihood(poisson: &PoissonTables, coverage_a: f64, coverage_b: f64) -> f64 {
    let a = poisson.ln_pmf_half(coverage_a.round().max(0.0) as u64);
    let b = poisson.ln_pmf_half(coverage_b.round().max(0.0) as u64);
    clamp(a + b)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stats(mean_depth: f64) -> ReadStats {
        ReadStats {
            mean_depth,
            error_rate: 0.01,
            log_no_zero: if mean_depth > 0.0 { (-mean_depth.exp_m1()).ln() } else { f64::NEG_INFINITY },
            log_no_zero_half: if mean_depth > 0.0 { (-(mean_depth / 2.0).exp_m1()).ln() } else { f64::NEG_INFINITY },
        }
    }

    #[test]
    fn homozygous_call_prefers_the_covered_allele() {
        let poisson = PoissonTables::new(10.0);
        let rs = stats(10.0);
        let covered = homozygous_log_likelihood(&poisson, &rs, 10.0, 5, 5, 0.0);
        let uncovered = homozygous_log_likelihood(&poisson, &rs, 0.0, 0, 5, 10.0);
        assert!(covered > uncovered);
    }

    #[test]
    fn likelihoods_are_never_nan() {
        let poisson = PoissonTables::new(0.0);
        let rs = stats(0.0);
        let value = homozygous_log_likelihood(&poisson, &rs, 0.0, 0, 10, 0.0);
        assert!(value.is_finite());
        let het = heterozygous_log_likelihood(&poisson, 0.0, 0.0);
        assert!(het.is_finite());
    }
}
