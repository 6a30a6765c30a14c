//! Peptide homology test.
//!
//! Two peptides are homologous when their best local alignment score reaches
//! a fixed threshold. The score itself comes from a [`HomologyScorer`]; the
//! default is Smith-Waterman-Gotoh over BLOSUM62 with affine gaps.
//!
//! ## Gap convention
//!
//! Penalties follow the JAligner convention: a gap of length `k` costs
//! `open + (k - 1) * extend`. `bio`'s aligner charges `open + k * extend`,
//! so the opening term handed to it is `open - extend`. Scores are computed
//! on a doubled integer scale so that half-point penalties (the default
//! extend of 0.5) stay exact.

use bio::alignment::pairwise::Aligner;
use bio::scores::blosum62;
use thiserror::Error;

use crate::core::sequence::PeptideSequence;
use crate::defaults;

/// Integer scale applied to matrix scores and penalties.
const SCORE_SCALE: f32 = 2.0;

/// Longest peptide accepted by [`SmithWatermanGotoh`].
///
/// The aligner keeps a full (m+1)x(n+1) traceback of two bytes per cell, so
/// two peptides at the limit need about 200 MB for one task. Every worker can
/// hold one such matrix at a time. Longer peptides fail their task with
/// [`AlignmentError::TooLong`] instead of exhausting memory.
pub const MAX_PEPTIDE_LEN: usize = 10_000;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum AlignmentError {
    #[error("peptide of {len} residues exceeds the {max}-residue alignment limit")]
    TooLong { len: usize, max: usize },

    #[error("gap penalty {0} is not a non-negative multiple of 0.5")]
    InvalidPenalty(f32),
}

/// Best local alignment score of two peptides.
pub trait HomologyScorer: Send + Sync {
    fn score(&self, a: &PeptideSequence, b: &PeptideSequence) -> Result<f32, AlignmentError>;
}

/// Smith-Waterman-Gotoh local alignment over BLOSUM62.
#[derive(Debug, Clone, Copy)]
pub struct SmithWatermanGotoh {
    gap_open: i32,
    gap_extend: i32,
}

impl SmithWatermanGotoh {
    /// `gap_open` and `gap_extend` are positive penalties in matrix units.
    pub fn new(gap_open: f32, gap_extend: f32) -> Result<Self, AlignmentError> {
        let open = scaled_penalty(gap_open)?;
        let extend = scaled_penalty(gap_extend)?;
        Ok(Self {
            // bio scores are negative and count the first gap position as an
            // extension too.
            gap_open: -(open - extend),
            gap_extend: -extend,
        })
    }
}

impl Default for SmithWatermanGotoh {
    fn default() -> Self {
        // 10.0 and 0.5 are both exact on the doubled scale.
        Self {
            gap_open: -19,
            gap_extend: -1,
        }
    }
}

impl HomologyScorer for SmithWatermanGotoh {
    fn score(&self, a: &PeptideSequence, b: &PeptideSequence) -> Result<f32, AlignmentError> {
        for seq in [a, b] {
            if seq.len() > MAX_PEPTIDE_LEN {
                return Err(AlignmentError::TooLong {
                    len: seq.len(),
                    max: MAX_PEPTIDE_LEN,
                });
            }
        }
        if a.is_empty() || b.is_empty() {
            return Ok(0.0);
        }

        let x = normalize_residues(a.as_bytes());
        let y = normalize_residues(b.as_bytes());
        let mut aligner = Aligner::with_capacity(
            x.len(),
            y.len(),
            self.gap_open,
            self.gap_extend,
            scaled_blosum62,
        );
        let alignment = aligner.local(&x, &y);
        Ok(alignment.score as f32 / SCORE_SCALE)
    }
}

fn scaled_blosum62(a: u8, b: u8) -> i32 {
    blosum62(a, b) * SCORE_SCALE as i32
}

fn scaled_penalty(penalty: f32) -> Result<i32, AlignmentError> {
    let scaled = penalty * SCORE_SCALE;
    if !scaled.is_finite() || scaled < 0.0 || scaled.fract() != 0.0 {
        return Err(AlignmentError::InvalidPenalty(penalty));
    }
    Ok(scaled as i32)
}

/// Map residues onto the alphabet BLOSUM62 is indexed by. Lowercase is
/// folded; anything else becomes `X`.
fn normalize_residues(seq: &[u8]) -> Vec<u8> {
    seq.iter()
        .map(|&r| match r.to_ascii_uppercase() {
            c @ b'A'..=b'Z' => c,
            b'*' => b'*',
            _ => b'X',
        })
        .collect()
}

/// Yes/no homology decision against a fixed score threshold.
pub struct HomologyFilter {
    scorer: Box<dyn HomologyScorer>,
    threshold: f32,
}

impl HomologyFilter {
    pub fn new(scorer: Box<dyn HomologyScorer>, threshold: f32) -> Self {
        Self { scorer, threshold }
    }

    pub fn threshold(&self) -> f32 {
        self.threshold
    }

    /// True iff the best local alignment score is at least the threshold.
    pub fn is_homologous(
        &self,
        a: &PeptideSequence,
        b: &PeptideSequence,
    ) -> Result<bool, AlignmentError> {
        Ok(self.scorer.score(a, b)? >= self.threshold)
    }
}

impl Default for HomologyFilter {
    fn default() -> Self {
        Self::new(
            Box::new(SmithWatermanGotoh::default()),
            defaults::HOMOLOGY_THRESHOLD,
        )
    }
}

impl std::fmt::Debug for HomologyFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HomologyFilter")
            .field("threshold", &self.threshold)
            .finish_non_exhaustive()
    }
}
