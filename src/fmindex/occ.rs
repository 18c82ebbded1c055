//! Rank support over the BWT, generalized from `bio::data_structures::bwt::Occ`
//! (which only supports a `u8` alphabet) to the PRG's sparse `u32` alphabet of
//! DNA bases plus marker IDs.
//!
//! Checkpoints are stored every `k` positions per distinct symbol; rank(i) for
//! an arbitrary i is the nearest checkpoint below i plus a linear scan over
//! the remainder, exactly as `bio`'s byte-oriented `Occ` does.

use std::collections::HashMap;

use crate::prg::markers::Symbol;

const CHECKPOINT_INTERVAL: usize = 32;

/// Occurrence/rank table over a BWT string with a `u32` alphabet.
pub struct Occ {
    checkpoints: HashMap<Symbol, Vec<u64>>,
    bwt: Vec<Symbol>,
    k: usize,
}

impl Occ {
    pub fn new(bwt: &[Symbol], alphabet: &[Symbol]) -> Self {
        let n = bwt.len();
        let num_checkpoints = n / CHECKPOINT_INTERVAL + 1;
        let mut checkpoints: HashMap<Symbol, Vec<u64>> = alphabet
            .iter()
            .map(|&s| (s, Vec::with_capacity(num_checkpoints)))
            .collect();
        let mut running: HashMap<Symbol, u64> = alphabet.iter().map(|&s| (s, 0u64)).collect();

        for (i, &c) in bwt.iter().enumerate() {
            if i % CHECKPOINT_INTERVAL == 0 {
                for &s in alphabet {
                    checkpoints.get_mut(&s).unwrap().push(running[&s]);
                }
            }
            *running.get_mut(&c).unwrap() += 1;
        }
        // final checkpoint covering the tail, so `rank(n, c)` needs no scan.
        for &s in alphabet {
            checkpoints.get_mut(&s).unwrap().push(running[&s]);
        }

        Occ {
            checkpoints,
            bwt: bwt.to_vec(),
            k: CHECKPOINT_INTERVAL,
        }
    }

    /// Number of occurrences of `symbol` in `bwt[0..i)`.
    pub fn rank(&self, symbol: Symbol, i: usize) -> u64 {
        let Some(table) = self.checkpoints.get(&symbol) else {
            return 0;
        };
        let checkpoint_idx = i / self.k;
        let mut count = table[checkpoint_idx];
        let start = checkpoint_idx * self.k;
        for &c in &self.bwt[start..i] {
            if c == symbol {
                count += 1;
            }
        }
        count
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rank_matches_naive_count() {
        let bwt: Vec<Symbol> = vec![1, 2, 1, 1, 3, 2, 1, 5, 1];
        let alphabet: Vec<Symbol> = vec![1, 2, 3, 5];
        let occ = Occ::new(&bwt, &alphabet);
        for symbol in &alphabet {
            for i in 0..=bwt.len() {
                let naive = bwt[..i].iter().filter(|&&c| c == *symbol).count() as u64;
                assert_eq!(occ.rank(*symbol, i), naive, "symbol {} i {}", symbol, i);
            }
        }
    }
}
