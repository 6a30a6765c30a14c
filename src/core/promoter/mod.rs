//! Promoter prediction.
//!
//! A [`PromoterPredictor`] scans an upstream region and returns the single
//! best motif [`Match`], or `None` when nothing clears its acceptance bar.
//! Predictors may keep scratch buffers between calls, hence `&mut self`;
//! concurrent callers each get their own instance through
//! [`workspace::PredictorPool`].

pub mod sigma70;
pub mod workspace;

use thiserror::Error;

use crate::core::sequence::NucleotideSequence;

pub use sigma70::Sigma70Matcher;
pub use workspace::{PredictorFactory, PredictorPool};

/// Length of each sigma70 recognition box.
pub const BOX_LEN: usize = 6;

/// Best motif hit in one upstream region.
#[derive(Debug, Clone, PartialEq)]
pub struct Match {
    /// Identity of the pattern that produced the hit.
    pub pattern: &'static str,
    /// 0-based offset of the -35 box within the searched region.
    pub position: usize,
    /// Region bases covered by the -35 box, upper-cased.
    pub box35: [u8; BOX_LEN],
    /// Bases between the end of the -35 box and the start of the -10 box.
    pub spacer: usize,
    /// Region bases covered by the -10 box, upper-cased.
    pub box10: [u8; BOX_LEN],
    /// Box positions agreeing with the pattern consensus.
    pub identities: u32,
    /// `identities` over the number of box positions.
    pub similarity: f64,
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum PredictError {
    #[error("region of {len} bases exceeds the {max}-base search limit")]
    RegionTooLong { len: usize, max: usize },

    #[error("pattern matcher failed: {0}")]
    Matcher(String),
}

pub trait PromoterPredictor: Send {
    fn predict(&mut self, region: &NucleotideSequence) -> Result<Option<Match>, PredictError>;
}
