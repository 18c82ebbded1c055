//! Suffix array construction over the PRG's `u32` alphabet.
//!
//! The PRG alphabet is not byte-sized (marker IDs routinely exceed 255), so
//! `bio::data_structures::suffix_array` (which works over `&[u8]`) does not
//! apply directly. A single-run PRG is small enough that the classic
//! prefix-doubling construction (`O(n log n)` comparisons, each `O(1)` via
//! rank arrays) is a perfectly adequate stand-in for a linear-time SA-IS here.

use crate::prg::markers::Symbol;

/// Symbol appended once to the end of the text; smaller than every real
/// symbol (bases start at 1, markers at 5) so it always sorts last-rotation.
pub const SENTINEL: Symbol = 0;

/// Build the suffix array of `text`, which must already end with exactly one
/// `SENTINEL` and contain no other occurrence of it.
pub fn build_suffix_array(text: &[Symbol]) -> Vec<u32> {
    let n = text.len();
    if n == 0 {
        return Vec::new();
    }

    // Initial rank: the symbol value itself (sentinel is smallest by construction).
    let mut sa: Vec<u32> = (0..n as u32).collect();
    let mut rank: Vec<i64> = text.iter().map(|&s| s as i64).collect();
    let mut tmp = vec![0i64; n];

    let mut k = 1usize;
    while k < n {
        let rank_at = |i: usize| -> (i64, i64) {
            let second = if i + k < n { rank[i + k] } else { -1 };
            (rank[i], second)
        };
        sa.sort_by(|&a, &b| rank_at(a as usize).cmp(&rank_at(b as usize)));

        tmp[sa[0] as usize] = 0;
        for i in 1..n {
            let prev = sa[i - 1] as usize;
            let cur = sa[i] as usize;
            tmp[cur] = tmp[prev] + if rank_at(prev) == rank_at(cur) { 0 } else { 1 };
        }
        rank.copy_from_slice(&tmp);

        if rank[sa[n - 1] as usize] as usize == n - 1 {
            break;
        }
        k <<= 1;
    }

    sa
}

/// Derive the Burrows-Wheeler transform from `text` and its suffix array:
/// `bwt[i] = text[(sa[i] + n - 1) % n]`.
pub fn bwt_from_sa(text: &[Symbol], sa: &[u32]) -> Vec<Symbol> {
    let n = text.len();
    sa.iter()
        .map(|&s| {
            let i = s as usize;
            text[(i + n - 1) % n]
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn naive_sa(text: &[Symbol]) -> Vec<u32> {
        let n = text.len();
        let mut idx: Vec<u32> = (0..n as u32).collect();
        idx.sort_by(|&a, &b| text[a as usize..].cmp(&text[b as usize..]));
        idx
    }

    #[test]
    fn matches_naive_construction() {
        let text: Vec<Symbol> = vec![2, 1, 1, 4, 2, 1, SENTINEL];
        let fast = build_suffix_array(&text);
        let naive = naive_sa(&text);
        assert_eq!(fast, naive);
    }

    #[test]
    fn single_sentinel() {
        let text: Vec<Symbol> = vec![SENTINEL];
        assert_eq!(build_suffix_array(&text), vec![0]);
    }
}
