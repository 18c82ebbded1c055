//! Depth and error-rate estimation from a completed mapping pass, plus the
//! numerically-safe log-no-zero terms the genotyper's homozygous likelihood
//! needs.
//!
//! Grounded on `utils::math_utils`'s pattern of precomputing stable log-space
//! constants once rather than recomputing `ln`/`exp` per site.

use serde::{Deserialize, Serialize};

use crate::errors::Result;
use crate::quasimap::MappingStats;

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ReadStats {
    /// Mean per-base depth across the reference (PRG) length.
    pub mean_depth: f64,
    /// Per-base sequencing error rate, either estimated or a fixed prior.
    pub error_rate: f64,
    /// log(1 - exp(-mean_depth)), numerically safe for small depth.
    pub log_no_zero: f64,
    /// log(1 - exp(-mean_depth / 2)), used for heterozygous half-depth terms.
    pub log_no_zero_half: f64,
}

impl ReadStats {
    /// Estimate from a mapping pass. `error_rate_prior` is used directly:
    /// per-base error from quality scores is a `quasimap` ambient-IO concern
    /// (FASTQ quality strings), not something the core statistics module
    /// derives from coverage alone.
    pub fn estimate(stats: &MappingStats, reference_len: usize, error_rate_prior: f64) -> Self {
        let mean_depth = if reference_len == 0 {
            0.0
        } else {
            stats.total_mapped_bases as f64 / reference_len as f64
        };

        ReadStats {
            mean_depth,
            error_rate: error_rate_prior,
            log_no_zero: log_no_zero(mean_depth),
            log_no_zero_half: log_no_zero(mean_depth / 2.0),
        }
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }
}

/// log(1 - exp(-x)), computed via `ln_1p`/`exp_m1` to stay accurate as x -> 0
/// (where a naive `(1.0 - x.exp()).ln()` loses precision catastrophically).
fn log_no_zero(x: f64) -> f64 {
    if x <= 0.0 {
        return f64::NEG_INFINITY;
    }
    (-x.exp_m1()).ln()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mean_depth_matches_total_bases_over_length() {
        let stats = MappingStats {
            mapped: 10,
            unmapped: 0,
            skipped_empty_or_oversized: 0,
            total_mapped_bases: 100,
        };
        let rs = ReadStats::estimate(&stats, 50, 0.01);
        assert!((rs.mean_depth - 2.0).abs() < 1e-9);
    }

    #[test]
    fn log_no_zero_is_finite_for_positive_depth() {
        let rs = ReadStats::estimate(
            &MappingStats {
                mapped: 1,
                unmapped: 0,
                skipped_empty_or_oversized: 0,
                total_mapped_bases: 1,
            },
            1,
            0.01,
        );
        assert!(rs.log_no_zero.is_finite());
        assert!(rs.log_no_zero_half.is_finite());
    }

    #[test]
    fn zero_depth_yields_neg_infinity_log_no_zero() {
        let rs = ReadStats::estimate(
            &MappingStats {
                mapped: 0,
                unmapped: 0,
                skipped_empty_or_oversized: 0,
                total_mapped_bases: 0,
            },
            10,
            0.01,
        );
        assert_eq!(rs.log_no_zero, f64::NEG_INFINITY);
    }
}
