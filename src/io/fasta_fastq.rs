//! FASTA reference and FASTQ read ingestion, decoding records into encoded
//! `Pattern`s through the same base table the PRG string itself uses.
//!
//! Grounded on `bio::io::{fasta, fastq}`, already a teacher dependency
//! (`genes_and_codons.rs` reads a `fasta::IndexedReader`); quasi-mapping only
//! needs a forward streaming reader over records, not indexed random access.

use std::path::Path;

use bio::io::{fasta, fastq};

use crate::errors::{GramError, Result};
use crate::prg::markers::{encode_dna_base, Base};

/// A single read's encoded bases and its id, for diagnostics on skip.
pub struct EncodedRead {
    pub id: String,
    pub bases: Vec<Base>,
    /// True if every character decoded to a base; a read containing Ns or
    /// other ambiguity codes is still returned (quasi-mapping decides
    /// whether to skip it) but flagged here so callers can count it.
    pub is_clean: bool,
}

pub fn read_fasta_reference<P: AsRef<Path>>(path: P) -> Result<Vec<Base>> {
    let reader = fasta::Reader::from_file(path)?;
    let mut bases = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|e| GramError::MalformedPrg {
            position: bases.len(),
            reason: format!("invalid FASTA record: {}", e),
        })?;
        for &byte in record.seq() {
            if let Some(base) = encode_dna_base(byte) {
                bases.push(base);
            }
        }
    }
    Ok(bases)
}

pub fn read_fastq_reads<P: AsRef<Path>>(path: P) -> Result<Vec<EncodedRead>> {
    let reader = fastq::Reader::from_file(path)?;
    let mut reads = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|e| GramError::MalformedPrg {
            position: reads.len(),
            reason: format!("invalid FASTQ record: {}", e),
        })?;
        let mut bases = Vec::with_capacity(record.seq().len());
        let mut is_clean = true;
        for &byte in record.seq() {
            match encode_dna_base(byte) {
                Some(base) => bases.push(base),
                None => is_clean = false,
            }
        }
        reads.push(EncodedRead {
            id: record.id().to_string(),
            bases,
            is_clean,
        });
    }
    Ok(reads)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn reads_fasta_reference_into_encoded_bases() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, ">ref\nAATAACAACAA").unwrap();
        let bases = read_fasta_reference(file.path()).unwrap();
        assert_eq!(bases.len(), 11);
    }

    #[test]
    fn reads_fastq_reads_and_flags_ambiguous_bases() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "@r1\nAACNGT\n+\nIIIIII").unwrap();
        let reads = read_fastq_reads(file.path()).unwrap();
        assert_eq!(reads.len(), 1);
        assert!(!reads[0].is_clean);
        assert_eq!(reads[0].bases.len(), 5);
    }
}
