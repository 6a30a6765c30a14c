//! Nucleotide and peptide sequence types, genes and genome records.
//!
//! Sequences are immutable byte vectors. Equality, hashing and `Display` are
//! all by content, so two sequences read from different files compare equal
//! when their bytes do.

pub mod upstream;

use std::fmt;
use std::ops::Range;

pub use upstream::{upstream_region, UPSTREAM_WINDOW};

/// Value produced by [`complement`] for any byte outside `ACGTacgt`.
///
/// It is carried through unchanged so callers can count it as a data-quality
/// problem instead of having it silently turned into a real base.
pub const COMPLEMENT_SENTINEL: u8 = 0;

const COMPLEMENT_TABLE: [u8; 256] = build_complement_table();

const fn build_complement_table() -> [u8; 256] {
    let mut table = [COMPLEMENT_SENTINEL; 256];
    table[b'A' as usize] = b'T';
    table[b'a' as usize] = b't';
    table[b'T' as usize] = b'A';
    table[b't' as usize] = b'a';
    table[b'C' as usize] = b'G';
    table[b'c' as usize] = b'g';
    table[b'G' as usize] = b'C';
    table[b'g' as usize] = b'c';
    table
}

/// Complement a single base, preserving case.
#[inline]
pub fn complement(base: u8) -> u8 {
    COMPLEMENT_TABLE[base as usize]
}

/// DNA sequence over the nucleotide alphabet.
#[derive(Clone, Default, PartialEq, Eq, Hash)]
pub struct NucleotideSequence(Vec<u8>);

impl NucleotideSequence {
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self(bytes.into())
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Copy out `range` (0-based, half-open).
    ///
    /// # Panics
    /// If the range is out of bounds; callers clamp first.
    pub fn subsequence(&self, range: Range<usize>) -> Self {
        Self(self.0[range].to_vec())
    }

    /// Reverse complement, base by base. Unknown symbols become
    /// [`COMPLEMENT_SENTINEL`].
    pub fn reverse_complement(&self) -> Self {
        Self(self.0.iter().rev().map(|&b| complement(b)).collect())
    }

    /// Number of complement sentinels in the sequence.
    pub fn sentinel_count(&self) -> usize {
        self.0.iter().filter(|&&b| b == COMPLEMENT_SENTINEL).count()
    }
}

impl From<&str> for NucleotideSequence {
    fn from(s: &str) -> Self {
        Self::new(s.as_bytes())
    }
}

impl fmt::Display for NucleotideSequence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&String::from_utf8_lossy(&self.0))
    }
}

impl fmt::Debug for NucleotideSequence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NucleotideSequence({self})")
    }
}

/// Protein sequence (one-letter amino acid codes).
#[derive(Clone, Default, PartialEq, Eq, Hash)]
pub struct PeptideSequence(Vec<u8>);

impl PeptideSequence {
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self(bytes.into())
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<&str> for PeptideSequence {
    fn from(s: &str) -> Self {
        Self::new(s.as_bytes())
    }
}

impl fmt::Display for PeptideSequence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&String::from_utf8_lossy(&self.0))
    }
}

impl fmt::Debug for PeptideSequence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PeptideSequence({self})")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Strand {
    Forward,
    Reverse,
}

/// A coding gene.
///
/// `location` is 1-based and measured in the gene's own reading direction:
/// for forward genes it is the first base of the CDS on the given sequence,
/// for reverse genes it is the first base of the CDS counted on the reverse
/// complement (`len - end + 1` in forward coordinates). Reference genes are
/// not placed on any record and carry `location == 0`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Gene {
    pub name: String,
    pub location: usize,
    pub strand: Strand,
    pub sequence: PeptideSequence,
}

impl Gene {
    pub fn new(
        name: impl Into<String>,
        location: usize,
        strand: Strand,
        sequence: PeptideSequence,
    ) -> Self {
        Self {
            name: name.into(),
            location,
            strand,
            sequence,
        }
    }

    /// A reference gene: name and translation only.
    pub fn reference(name: impl Into<String>, sequence: PeptideSequence) -> Self {
        Self::new(name, 0, Strand::Forward, sequence)
    }
}

/// One parsed genome record: the full nucleotide sequence plus its genes in
/// file order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenomeRecord {
    pub name: String,
    pub nucleotides: NucleotideSequence,
    pub genes: Vec<Gene>,
}

impl GenomeRecord {
    pub fn new(name: impl Into<String>, nucleotides: NucleotideSequence, genes: Vec<Gene>) -> Self {
        Self {
            name: name.into(),
            nucleotides,
            genes,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn complement_preserves_case() {
        assert_eq!(complement(b'A'), b'T');
        assert_eq!(complement(b'g'), b'c');
        assert_eq!(complement(b't'), b'a');
        assert_eq!(complement(b'C'), b'G');
    }

    #[test]
    fn complement_of_unknown_symbol_is_sentinel() {
        for b in [b'N', b'n', b'-', b'U', b'R', 0u8, 255u8] {
            assert_eq!(complement(b), COMPLEMENT_SENTINEL, "byte {b}");
        }
    }

    #[test]
    fn reverse_complement_counts_sentinels() {
        let seq = NucleotideSequence::from("ACNGt");
        let rc = seq.reverse_complement();
        assert_eq!(rc.as_bytes(), &[b'a', b'C', 0, b'G', b'T']);
        assert_eq!(rc.sentinel_count(), 1);
        assert_eq!(seq.sentinel_count(), 0);
    }

    #[test]
    fn sequences_compare_and_print_by_content() {
        let a = NucleotideSequence::new(b"ACGT".to_vec());
        let b = NucleotideSequence::from("ACGT");
        assert_eq!(a, b);
        assert_eq!(a.to_string(), "ACGT");
        assert_eq!(PeptideSequence::from("MKV").to_string(), "MKV");
    }
}
