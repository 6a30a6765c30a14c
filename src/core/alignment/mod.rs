//! Peptide alignment used to decide homology between genes.

pub mod homology;

pub use homology::{AlignmentError, HomologyFilter, HomologyScorer, SmithWatermanGotoh};
