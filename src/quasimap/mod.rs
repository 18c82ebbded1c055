pub mod coverage;
pub mod kmer_index;
pub mod mapper;

pub use coverage::{CoverageSnapshot, CoverageStore};
pub use kmer_index::KmerIndex;
pub use mapper::{quasimap_reads, MappingStats};
