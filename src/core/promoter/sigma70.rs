//! Sigma70 promoter matcher.
//!
//! The pattern is the E. coli sigma70 consensus: a `TTGACA` -35 box, a 15-19
//! base spacer and a `TATAAT` -10 box. The search is unanchored: every -35
//! offset and every allowed spacer is tried, and a candidate is scored by the
//! fraction of the twelve box positions that agree with the consensus.
//!
//! Candidate ranking, highest first:
//! 1. more identities
//! 2. spacer closer to 17
//! 3. earlier -35 position

use super::{BOX_LEN, Match, PredictError, PromoterPredictor};
use crate::core::sequence::NucleotideSequence;
use crate::defaults;

pub const PATTERN_NAME: &str = "sigma70";
pub const BOX_35: [u8; BOX_LEN] = *b"TTGACA";
pub const BOX_10: [u8; BOX_LEN] = *b"TATAAT";
pub const MIN_SPACER: usize = 15;
pub const MAX_SPACER: usize = 19;
pub const OPTIMAL_SPACER: usize = 17;

/// Longest region the matcher will scan.
pub const MAX_REGION_LEN: usize = 1 << 20;

const BOX_POSITIONS: u32 = 2 * BOX_LEN as u32;

#[derive(Debug, Clone)]
pub struct Sigma70Matcher {
    min_identities: u32,
    /// Per-offset -10 box identities for the region being scanned. Reused
    /// between calls.
    box10_identities: Vec<u8>,
}

impl Sigma70Matcher {
    /// `confidence` is the minimum fraction of box positions that must match.
    pub fn new(confidence: f64) -> Self {
        let confidence = confidence.clamp(0.0, 1.0);
        let min_identities = (confidence * BOX_POSITIONS as f64).ceil() as u32;
        Self {
            min_identities,
            box10_identities: Vec::new(),
        }
    }

    pub fn min_identities(&self) -> u32 {
        self.min_identities
    }

    /// Current scratch capacity, in offsets.
    pub fn scratch_capacity(&self) -> usize {
        self.box10_identities.capacity()
    }
}

impl Default for Sigma70Matcher {
    fn default() -> Self {
        Self::new(defaults::PROMOTER_CONFIDENCE)
    }
}

impl PromoterPredictor for Sigma70Matcher {
    fn predict(&mut self, region: &NucleotideSequence) -> Result<Option<Match>, PredictError> {
        let text = region.as_bytes();
        if text.len() > MAX_REGION_LEN {
            return Err(PredictError::RegionTooLong {
                len: text.len(),
                max: MAX_REGION_LEN,
            });
        }
        if text.len() < 2 * BOX_LEN + MIN_SPACER {
            return Ok(None);
        }

        self.box10_identities.clear();
        self.box10_identities.extend(
            text.windows(BOX_LEN)
                .map(|window| box_identities(window, &BOX_10) as u8),
        );

        // (identities, spacer deviation, position, spacer)
        let mut best: Option<(u32, usize, usize, usize)> = None;
        let last_box35 = text.len() - (2 * BOX_LEN + MIN_SPACER);
        for position in 0..=last_box35 {
            let id35 = box_identities(&text[position..position + BOX_LEN], &BOX_35);
            for spacer in MIN_SPACER..=MAX_SPACER {
                let box10_start = position + BOX_LEN + spacer;
                let Some(&id10) = self.box10_identities.get(box10_start) else {
                    break;
                };
                let identities = id35 + id10 as u32;
                let deviation = spacer.abs_diff(OPTIMAL_SPACER);
                let better = match best {
                    None => true,
                    Some((best_ids, best_dev, _, _)) => {
                        identities > best_ids || (identities == best_ids && deviation < best_dev)
                    }
                };
                if better {
                    best = Some((identities, deviation, position, spacer));
                }
            }
        }

        let Some((identities, _, position, spacer)) = best else {
            return Ok(None);
        };
        if identities < self.min_identities {
            return Ok(None);
        }

        let box10_start = position + BOX_LEN + spacer;
        Ok(Some(Match {
            pattern: PATTERN_NAME,
            position,
            box35: upper_box(&text[position..position + BOX_LEN]),
            spacer,
            box10: upper_box(&text[box10_start..box10_start + BOX_LEN]),
            identities,
            similarity: identities as f64 / BOX_POSITIONS as f64,
        }))
    }
}

#[inline]
fn box_identities(window: &[u8], consensus: &[u8; BOX_LEN]) -> u32 {
    window
        .iter()
        .zip(consensus)
        .filter(|(b, c)| b.to_ascii_uppercase() == **c)
        .count() as u32
}

fn upper_box(bases: &[u8]) -> [u8; BOX_LEN] {
    let mut out = [0u8; BOX_LEN];
    for (dst, src) in out.iter_mut().zip(bases) {
        *dst = src.to_ascii_uppercase();
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn region(s: &str) -> NucleotideSequence {
        NucleotideSequence::from(s)
    }

    /// -35 box, spacer of `spacer` C's, -10 box, padded with G's.
    fn promoter(lead: usize, box35: &str, spacer: usize, box10: &str, trail: usize) -> String {
        format!(
            "{}{}{}{}{}",
            "G".repeat(lead),
            box35,
            "C".repeat(spacer),
            box10,
            "G".repeat(trail)
        )
    }

    #[test]
    fn perfect_promoter_is_found() {
        let mut m = Sigma70Matcher::default();
        let hit = m
            .predict(&region(&promoter(20, "TTGACA", 17, "TATAAT", 20)))
            .unwrap()
            .expect("match");
        assert_eq!(hit.position, 20);
        assert_eq!(hit.spacer, 17);
        assert_eq!(&hit.box35, b"TTGACA");
        assert_eq!(&hit.box10, b"TATAAT");
        assert_eq!(hit.identities, 12);
        assert_eq!(hit.similarity, 1.0);
        assert_eq!(hit.pattern, PATTERN_NAME);
    }

    #[test]
    fn lowercase_region_matches_and_reports_uppercase_boxes() {
        let mut m = Sigma70Matcher::default();
        let text = promoter(3, "ttgaca", 16, "tataat", 3).to_ascii_lowercase();
        let hit = m.predict(&region(&text)).unwrap().expect("match");
        assert_eq!(&hit.box35, b"TTGACA");
        assert_eq!(hit.spacer, 16);
    }

    #[test]
    fn confidence_threshold_rounds_up_to_whole_positions() {
        // 0.7 * 12 = 8.4 -> 9 identities required.
        assert_eq!(Sigma70Matcher::new(0.7).min_identities(), 9);
        assert_eq!(Sigma70Matcher::new(1.0).min_identities(), 12);
        assert_eq!(Sigma70Matcher::new(0.0).min_identities(), 0);
    }

    #[test]
    fn weak_promoter_below_confidence_is_rejected() {
        // Four mismatches in the boxes: 8/12 < 0.7.
        let text = promoter(5, "TTCCCA", 17, "TATCCT", 5);
        let mut m = Sigma70Matcher::default();
        assert_eq!(m.predict(&region(&text)).unwrap(), None);
        let mut lenient = Sigma70Matcher::new(0.6);
        assert!(lenient.predict(&region(&text)).unwrap().is_some());
    }

    #[test]
    fn short_region_has_no_match() {
        let mut m = Sigma70Matcher::default();
        assert_eq!(m.predict(&region("TTGACATATAAT")).unwrap(), None);
        assert_eq!(m.predict(&region("")).unwrap(), None);
    }

    #[test]
    fn ties_prefer_spacer_closest_to_seventeen() {
        // Two perfect promoters; the later one has the optimal spacer.
        let text = format!(
            "{}{}{}",
            promoter(0, "TTGACA", 15, "TATAAT", 0),
            "G".repeat(10),
            promoter(0, "TTGACA", 17, "TATAAT", 0)
        );
        let mut m = Sigma70Matcher::default();
        let hit = m.predict(&region(&text)).unwrap().expect("match");
        assert_eq!(hit.position, 37);
        assert_eq!(hit.spacer, 17);
    }

    #[test]
    fn equal_candidates_keep_the_earliest() {
        let text = format!(
            "{}{}",
            promoter(2, "TTGACA", 17, "TATAAT", 0),
            promoter(4, "TTGACA", 17, "TATAAT", 2)
        );
        let mut m = Sigma70Matcher::default();
        let hit = m.predict(&region(&text)).unwrap().expect("match");
        assert_eq!(hit.position, 2);
    }

    #[test]
    fn scratch_is_reused_across_calls() {
        let mut m = Sigma70Matcher::default();
        let long = promoter(200, "TTGACA", 17, "TATAAT", 20);
        m.predict(&region(&long)).unwrap();
        let capacity = m.scratch_capacity();
        m.predict(&region(&promoter(10, "TTGACA", 17, "TATAAT", 10))).unwrap();
        assert_eq!(m.scratch_capacity(), capacity);
    }

    #[test]
    fn results_do_not_depend_on_previous_calls() {
        let a = region(&promoter(40, "TTGACA", 17, "TATAAT", 40));
        let b = region(&promoter(7, "TTGAAA", 19, "TAAAAT", 2));
        let mut fresh = Sigma70Matcher::default();
        let expected = fresh.predict(&b).unwrap();
        let mut used = Sigma70Matcher::default();
        used.predict(&a).unwrap();
        assert_eq!(used.predict(&b).unwrap(), expected);
    }

    #[test]
    fn oversized_region_is_an_error() {
        let mut m = Sigma70Matcher::default();
        let huge = NucleotideSequence::new(vec![b'A'; MAX_REGION_LEN + 1]);
        assert!(matches!(
            m.predict(&huge),
            Err(PredictError::RegionTooLong { .. })
        ));
    }
}
