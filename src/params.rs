//! The passive configuration struct shared across subcommands, built once
//! from parsed CLI arguments.
//!
//! Grounded on the teacher's `GenotypingEngine::make(args: &clap::ArgMatches,
//! ...)` convention: a plain data carrier assembled from already-validated
//! `clap` output, not a second validation layer.

use std::path::PathBuf;

use strum_macros::EnumString;

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum Ploidy {
    Haploid,
    Diploid,
}

impl Ploidy {
    pub fn copies(&self) -> usize {
        match self {
            Ploidy::Haploid => 1,
            Ploidy::Diploid => 2,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Parameters {
    pub gram_dir: PathBuf,
    pub run_dir: PathBuf,
    pub ploidy: Ploidy,
    pub credible_cov_t: u32,
    pub error_rate_prior: f64,
    pub kmer_size: usize,
    pub threads: usize,
}

impl Parameters {
    pub fn prg_path(&self) -> PathBuf {
        self.gram_dir.join("prg")
    }

    pub fn fm_index_path(&self) -> PathBuf {
        self.gram_dir.join("fm_index.bin")
    }

    pub fn coverage_graph_path(&self) -> PathBuf {
        self.gram_dir.join("coverage_graph.json")
    }

    pub fn kmer_index_path(&self) -> PathBuf {
        self.gram_dir.join("kmer_index.bin")
    }

    pub fn allele_coverage_path(&self) -> PathBuf {
        self.run_dir.join("allele_coverage.json")
    }

    pub fn read_stats_path(&self) -> PathBuf {
        self.run_dir.join("read_stats.json")
    }

    pub fn vcf_path(&self) -> PathBuf {
        self.run_dir.join("genotyped.vcf")
    }

    pub fn json_path(&self) -> PathBuf {
        self.run_dir.join("genotyped.json")
    }
}
