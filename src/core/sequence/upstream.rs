//! Upstream region extraction.
//!
//! The region returned is the window immediately before a gene's first base,
//! read 5'->3' in the gene's own direction. Windows are clamped at the
//! sequence start, so the operation never fails.

use super::{Gene, NucleotideSequence, Strand};

/// Nominal upstream window width in bases.
pub const UPSTREAM_WINDOW: usize = 250;

/// Extract up to `window` bases upstream of `gene` from `dna`.
///
/// The width is `min(window, location - 1)`; a gene whose location runs past
/// the end of the sequence is further clamped to the bases that exist.
/// Reverse-strand genes are located in reverse-complement coordinates, so the
/// region is taken from the 3' side of the forward sequence and reverse
/// complemented.
pub fn upstream_region(dna: &NucleotideSequence, gene: &Gene, window: usize) -> NucleotideSequence {
    let len = dna.len();
    // Exclusive end of the window in the gene's own coordinates.
    let end = gene.location.saturating_sub(1).min(len);
    let width = window.min(end);

    match gene.strand {
        Strand::Forward => dna.subsequence(end - width..end),
        Strand::Reverse => {
            let start = len - end;
            dna.subsequence(start..start + width).reverse_complement()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::sequence::PeptideSequence;

    fn gene(location: usize, strand: Strand) -> Gene {
        Gene::new("g", location, strand, PeptideSequence::from("M"))
    }

    #[test]
    fn forward_window_is_clamped_near_sequence_start() {
        let dna = NucleotideSequence::new(vec![b'A'; 1000]);
        let region = upstream_region(&dna, &gene(5, Strand::Forward), UPSTREAM_WINDOW);
        assert_eq!(region.len(), 4);
    }

    #[test]
    fn gene_at_first_base_has_empty_region() {
        let dna = NucleotideSequence::from("ACGTACGT");
        assert!(upstream_region(&dna, &gene(1, Strand::Forward), 250).is_empty());
        assert!(upstream_region(&dna, &gene(1, Strand::Reverse), 250).is_empty());
        assert!(upstream_region(&dna, &gene(0, Strand::Forward), 250).is_empty());
    }

    #[test]
    fn forward_window_ends_one_base_before_gene() {
        let dna = NucleotideSequence::from("GGGGACGTTTATG");
        // Gene starts at the ATG (location 11).
        let region = upstream_region(&dna, &gene(11, Strand::Forward), 4);
        assert_eq!(region.to_string(), "GTTT");
    }

    #[test]
    fn full_window_when_far_from_start() {
        let dna = NucleotideSequence::new(vec![b'C'; 600]);
        let region = upstream_region(&dna, &gene(400, Strand::Forward), UPSTREAM_WINDOW);
        assert_eq!(region.len(), UPSTREAM_WINDOW);
    }

    #[test]
    fn reverse_window_is_reverse_complement_of_forward_window() {
        // 30 bases; forward positions 11..=20 (1-based) hold ACGTACGTAC.
        let dna = NucleotideSequence::from("TTTTTTTTTTACGTACGTACGGGGGGGGGG");
        let len = dna.len();
        // Reverse gene whose CDS ends at forward position 10: in reverse
        // complement coordinates it starts at len - 10 + 1.
        let g = gene(len - 10 + 1, Strand::Reverse);
        let region = upstream_region(&dna, &g, 10);
        assert_eq!(region.to_string(), "GTACGTACGT");
        assert_eq!(
            region,
            NucleotideSequence::from("ACGTACGTAC").reverse_complement()
        );
    }

    #[test]
    fn reverse_window_is_clamped_at_sequence_end() {
        let dna = NucleotideSequence::from("AAAAAAAAAACCG");
        // CDS ends three bases before the end of the forward sequence.
        let g = gene(4, Strand::Reverse);
        let region = upstream_region(&dna, &g, 250);
        assert_eq!(region.to_string(), "CGG");
    }

    #[test]
    fn location_past_sequence_end_does_not_panic() {
        let dna = NucleotideSequence::from("ACGT");
        assert_eq!(upstream_region(&dna, &gene(50, Strand::Forward), 250).to_string(), "ACGT");
        assert_eq!(upstream_region(&dna, &gene(50, Strand::Reverse), 250).to_string(), "ACGT");
    }

    #[test]
    fn unknown_bases_become_sentinels_on_reverse_strand() {
        let dna = NucleotideSequence::from("AAAANNAAAA");
        let region = upstream_region(&dna, &gene(7, Strand::Reverse), 4);
        assert_eq!(region.sentinel_count(), 2);
    }
}
