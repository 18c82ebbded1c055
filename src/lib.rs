//! `gramalign`: variant-aware short-read genotyping against a population
//! reference graph (PRG).
//!
//! A PRG encodes a reference plus known variation as a sequence of bases and
//! site/allele markers (see [`prg`]). Building a crate means indexing that
//! PRG two ways: an FM-index for backward search ([`fmindex`]) and a
//! coverage graph recording the site/allele structure for attributing
//! coverage ([`graph`]). Mapping reads against both ([`search`],
//! [`quasimap`]) produces per-base and per-allele coverage, which the
//! genotyper ([`genotype`]) turns into calls using a Poisson depth model
//! ([`stats`]). [`io`] and [`params`] cover the ambient concerns: FASTA/FASTQ
//! input, VCF/JSON output, and run configuration.

pub mod cli;
pub mod errors;
pub mod prg;
pub mod fmindex;
pub mod graph;
pub mod search;
pub mod quasimap;
pub mod stats;
pub mod genotype;
pub mod io;
pub mod params;

pub use errors::{GramError, Result};
pub use params::{Parameters, Ploidy};
