//! A precomputed seed index: every k-mer observed in the PRG's base
//! sequence, used to reject reads whose trailing k-mer cannot possibly
//! occur before paying for a full backward search.
//!
//! Grounded on the same little/big-endian binary convention used for the PRG
//! string itself (`prg::string::PrgString::write`/`read`), since both are
//! flat fixed-width-integer blobs handed between the `build` and `quasimap`
//! subcommands.

use byteorder::{BigEndian, ByteOrder, LittleEndian, WriteBytesExt};
use std::io::Write;

use crate::errors::{GramError, Result};
use crate::prg::string::{Endianness, PrgString};

/// Flat sorted list of encoded k-mers (each packed into a u64 over bases
/// 1-4, two bits per base) for binary-search lookup.
pub struct KmerIndex {
    k: usize,
    kmers: Vec<u64>,
}

impl KmerIndex {
    /// Slide a window of width `k` over the PRG's base symbols, skipping over
    /// markers entirely (a read can never contain one).
    pub fn build(prg: &PrgString, k: usize) -> Self {
        let bases: Vec<u8> = prg
            .as_ints()
            .iter()
            .filter(|&&s| crate::prg::markers::is_base(s))
            .map(|&s| s as u8)
            .collect();

        let mut kmers: Vec<u64> = Vec::new();
        if bases.len() >= k && k > 0 {
            for window in bases.windows(k) {
                kmers.push(pack(window));
            }
        }
        kmers.sort_unstable();
        kmers.dedup();

        KmerIndex { k, kmers }
    }

    pub fn k(&self) -> usize {
        self.k
    }

    pub fn len(&self) -> usize {
        self.kmers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.kmers.is_empty()
    }

    /// Whether the read's trailing k-mer is present in the PRG at all. A read
    /// shorter than `k` is always kept (nothing to prune on).
    pub fn contains_seed(&self, read: &[u8]) -> bool {
        if read.len() < self.k {
            return true;
        }
        let seed = &read[read.len() - self.k..];
        self.kmers.binary_search(&pack(seed)).is_ok()
    }

    pub fn write<W: Write>(&self, mut writer: W, endianness: Endianness) -> Result<()> {
        match endianness {
            Endianness::Little => writer.write_u8(0)?,
            Endianness::Big => writer.write_u8(1)?,
        }
        writer.write_u32::<LittleEndian>(self.k as u32)?;
        writer.write_u64::<LittleEndian>(self.kmers.len() as u64)?;
        for &kmer in &self.kmers {
            match endianness {
                Endianness::Little => writer.write_u64::<LittleEndian>(kmer)?,
                Endianness::Big => writer.write_u64::<BigEndian>(kmer)?,
            }
        }
        Ok(())
    }

    pub fn read(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < 13 {
            return Err(GramError::MalformedPrg {
                position: 0,
                reason: "kmer index file too short for header".to_string(),
            });
        }
        let endianness = match bytes[0] {
            0 => Endianness::Little,
            1 => Endianness::Big,
            other => {
                return Err(GramError::MalformedPrg {
                    position: 0,
                    reason: format!("unknown endianness header byte {}", other),
                })
            }
        };
        let k = LittleEndian::read_u32(&bytes[1..5]) as usize;
        let count = LittleEndian::read_u64(&bytes[5..13]) as usize;
        let body = &bytes[13..];
        if body.len() != count * 8 {
            return Err(GramError::MalformedPrg {
                position: 13,
                reason: "kmer index body length does not match recorded count".to_string(),
            });
        }
        let kmers = body
            .chunks_exact(8)
            .map(|c| match endianness {
                Endianness::Little => LittleEndian::read_u64(c),
                Endianness::Big => BigEndian::read_u64(c),
            })
            .collect();
        Ok(KmerIndex { k, kmers })
    }
}

fn pack(bases: &[u8]) -> u64 {
    let mut value = 0u64;
    for &b in bases {
        value = (value << 2) | ((b as u64) & 0b11);
    }
    value
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finds_seeds_present_in_the_prg() {
        let prg = PrgString::from_text("AATAA[CCC,GGG]AA").unwrap();
        let index = KmerIndex::build(&prg, 3);
        assert!(index.contains_seed(&[1, 1, 4])); // AAT
        assert!(!index.contains_seed(&[4, 4, 4])); // TTT never occurs
    }

    #[test]
    fn binary_round_trip_preserves_kmers() {
        let prg = PrgString::from_text("AATAACAACAA").unwrap();
        let index = KmerIndex::build(&prg, 4);
        let mut buf = Vec::new();
        index.write(&mut buf, Endianness::Little).unwrap();
        let back = KmerIndex::read(&buf).unwrap();
        assert_eq!(index.k(), back.k());
        assert_eq!(index.len(), back.len());
    }
}
