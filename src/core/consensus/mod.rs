//! Sigma70 consensus accumulation.
//!
//! A [`Sigma70Consensus`] folds any number of promoter matches into
//! per-position base counts for both boxes plus a spacer-length histogram.
//! Every field is a sum of counts, so adding matches (or merging two
//! consensus values) gives the same result in any order.

pub mod table;

use std::collections::BTreeMap;
use std::fmt;

use crate::core::promoter::{BOX_LEN, Match};

pub use table::{ALL_BUCKET, AggregateError, ConsensusSnapshot, ConsensusTable, EquivalenceReport};

/// Column order for [`BoxProfile`] counts; the last column collects anything
/// that is not an unambiguous base.
const SYMBOLS: [u8; 5] = [b'A', b'C', b'G', b'T', b'N'];

fn symbol_index(base: u8) -> usize {
    match base.to_ascii_uppercase() {
        b'A' => 0,
        b'C' => 1,
        b'G' => 2,
        b'T' => 3,
        _ => 4,
    }
}

/// Positional base counts for one recognition box.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BoxProfile {
    counts: [[u64; SYMBOLS.len()]; BOX_LEN],
}

impl BoxProfile {
    pub fn add(&mut self, bases: &[u8; BOX_LEN]) {
        for (column, &base) in self.counts.iter_mut().zip(bases) {
            column[symbol_index(base)] += 1;
        }
    }

    pub fn merge(&mut self, other: &BoxProfile) {
        for (mine, theirs) in self.counts.iter_mut().zip(&other.counts) {
            for (a, b) in mine.iter_mut().zip(theirs) {
                *a += b;
            }
        }
    }

    /// Count of `base` at `position`.
    pub fn count(&self, position: usize, base: u8) -> u64 {
        self.counts[position][symbol_index(base)]
    }

    /// Most frequent symbol per position; ties go to the earlier of `ACGTN`,
    /// and an empty column prints as `-`.
    pub fn consensus(&self) -> String {
        self.counts
            .iter()
            .map(|column| {
                let mut best = None;
                for (i, &n) in column.iter().enumerate() {
                    if n > 0 && best.is_none_or(|(_, m)| n > m) {
                        best = Some((i, n));
                    }
                }
                best.map_or('-', |(i, _)| SYMBOLS[i] as char)
            })
            .collect()
    }
}

/// Running consensus over every match folded into one bucket.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Sigma70Consensus {
    matches: u64,
    box35: BoxProfile,
    box10: BoxProfile,
    spacers: BTreeMap<usize, u64>,
}

impl Sigma70Consensus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_match(&mut self, m: &Match) {
        self.matches += 1;
        self.box35.add(&m.box35);
        self.box10.add(&m.box10);
        *self.spacers.entry(m.spacer).or_default() += 1;
    }

    pub fn merge(&mut self, other: &Sigma70Consensus) {
        self.matches += other.matches;
        self.box35.merge(&other.box35);
        self.box10.merge(&other.box10);
        for (&spacer, &n) in &other.spacers {
            *self.spacers.entry(spacer).or_default() += n;
        }
    }

    pub fn matches(&self) -> u64 {
        self.matches
    }

    pub fn box35(&self) -> &BoxProfile {
        &self.box35
    }

    pub fn box10(&self) -> &BoxProfile {
        &self.box10
    }

    /// Spacer length -> number of matches.
    pub fn spacer_histogram(&self) -> &BTreeMap<usize, u64> {
        &self.spacers
    }

    /// Mean spacer length, if any match was added.
    pub fn mean_spacer(&self) -> Option<f64> {
        if self.matches == 0 {
            return None;
        }
        let total: u64 = self.spacers.iter().map(|(&s, &n)| s as u64 * n).sum();
        Some(total as f64 / self.matches as f64)
    }
}

impl fmt::Display for Sigma70Consensus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Some(mean) = self.mean_spacer() else {
            return f.write_str("no matches");
        };
        write!(
            f,
            "-35 {} spacer {:.2} -10 {} ({} matches; spacers",
            self.box35.consensus(),
            mean,
            self.box10.consensus(),
            self.matches
        )?;
        for (spacer, n) in &self.spacers {
            write!(f, " {spacer}:{n}")?;
        }
        f.write_str(")")
    }
}
