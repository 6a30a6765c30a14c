// src/screen_opt.rs
//
// Run options for a promoter screen

use crate::core::alignment::{AlignmentError, HomologyFilter, SmithWatermanGotoh};
use crate::core::promoter::PredictorFactory;
use crate::core::promoter::workspace::sigma70_factory;
use crate::defaults;

/// What to do with a record file that fails to parse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RecordPolicy {
    /// Log the failure, leave the file out of the run and keep going.
    #[default]
    Skip,
    /// Fail the whole run before any task is scheduled.
    Abort,
}

/// Screening options.
#[derive(Debug, Clone, PartialEq)]
pub struct ScreenOpt {
    // Scheduling
    pub threads: usize, // Worker pool size

    // Upstream extraction
    pub window: usize, // Upstream window width in bases

    // Homology
    pub min_score: f32,  // Local alignment score needed to call two peptides homologous
    pub gap_open: f32,   // Cost of the first gap position
    pub gap_extend: f32, // Cost of each further gap position

    // Promoter prediction
    pub confidence: f64, // Fraction of box positions that must agree with the pattern

    // Input handling
    pub record_policy: RecordPolicy,
    pub verbosity: i32, // 1=error, 2=warning, 3=message, 4=debug, 5+=trace
}

impl Default for ScreenOpt {
    fn default() -> Self {
        ScreenOpt {
            threads: defaults::THREADS,
            window: defaults::UPSTREAM_WINDOW,
            min_score: defaults::HOMOLOGY_THRESHOLD,
            gap_open: defaults::GAP_OPEN,
            gap_extend: defaults::GAP_EXTEND,
            confidence: defaults::PROMOTER_CONFIDENCE,
            record_policy: RecordPolicy::default(),
            verbosity: defaults::VERBOSITY,
        }
    }
}

impl ScreenOpt {
    /// Homology filter for these scoring options.
    pub fn homology_filter(&self) -> Result<HomologyFilter, AlignmentError> {
        let scorer = SmithWatermanGotoh::new(self.gap_open, self.gap_extend)?;
        Ok(HomologyFilter::new(Box::new(scorer), self.min_score))
    }

    /// Factory for per-worker sigma70 matchers at this confidence.
    pub fn predictor_factory(&self) -> PredictorFactory {
        sigma70_factory(self.confidence)
    }

    /// Log the options in effect, as the binary does at message verbosity.
    pub fn log_parameters(&self) {
        log::info!("Screen parameters:");
        log::info!("  Threads: {}", self.threads);
        log::info!("  Upstream window: {}", self.window);
        log::info!(
            "  Homology: min score {}, gap open {}, gap extend {}",
            self.min_score,
            self.gap_open,
            self.gap_extend
        );
        log::info!("  Promoter confidence: {}", self.confidence);
        log::info!("  Malformed records: {:?}", self.record_policy);
    }
}
