pub mod fasta_fastq;
pub mod json;
pub mod vcf;

pub use fasta_fastq::{read_fasta_reference, read_fastq_reads, EncodedRead};
pub use json::write_json_report;
pub use vcf::write_vcf;
