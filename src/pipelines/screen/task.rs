//! Screening tasks.
//!
//! One task pairs a gene on a genome record with one reference gene. Tasks
//! never look at each other's results, so any execution order is valid.

use std::sync::Arc;

use thiserror::Error;

use crate::core::alignment::{AlignmentError, HomologyFilter};
use crate::core::consensus::{AggregateError, ConsensusTable};
use crate::core::promoter::{PredictError, PredictorFactory, PredictorPool};
use crate::core::sequence::{Gene, GenomeRecord, upstream_region};
use crate::screen_opt::ScreenOpt;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum TaskError {
    #[error("homology scoring failed: {0}")]
    Alignment(#[from] AlignmentError),

    #[error("promoter prediction failed: {0}")]
    Prediction(#[from] PredictError),

    #[error("consensus update failed: {0}")]
    Aggregation(#[from] AggregateError),

    #[error("task panicked: {0}")]
    Panicked(String),
}

/// How a task that ran to completion ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskStatus {
    NotHomologous,
    NoPromoter,
    Matched,
}

/// Per-task result collected after the barrier.
#[derive(Debug, Clone, PartialEq)]
pub enum TaskOutcome {
    Done(TaskStatus),
    Failed(TaskError),
    /// Never started because the run was cancelled.
    Cancelled,
}

/// The collaborators every task runs through.
pub struct ScreenPipeline {
    pub homology: HomologyFilter,
    pub predictor: PredictorFactory,
    pub window: usize,
}

impl ScreenPipeline {
    pub fn new(homology: HomologyFilter, predictor: PredictorFactory, window: usize) -> Self {
        Self {
            homology,
            predictor,
            window,
        }
    }

    pub fn from_opt(opt: &ScreenOpt) -> Result<Self, AlignmentError> {
        Ok(Self::new(
            opt.homology_filter()?,
            opt.predictor_factory(),
            opt.window,
        ))
    }

    /// Fresh per-worker predictor pool for one run.
    pub fn predictor_pool(&self) -> PredictorPool {
        PredictorPool::new(Arc::clone(&self.predictor))
    }
}

impl std::fmt::Debug for ScreenPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScreenPipeline")
            .field("homology", &self.homology)
            .field("window", &self.window)
            .finish_non_exhaustive()
    }
}

/// One (record gene, reference gene) pair.
#[derive(Debug, Clone, Copy)]
pub struct ScreenTask<'a> {
    /// Position in generation order.
    pub id: usize,
    pub record: &'a GenomeRecord,
    pub gene: &'a Gene,
    pub reference: &'a Gene,
}

impl ScreenTask<'_> {
    /// Homology check, then upstream extraction, prediction and the
    /// consensus update for homologous pairs.
    pub fn execute(
        &self,
        pipeline: &ScreenPipeline,
        predictors: &PredictorPool,
        table: &ConsensusTable,
    ) -> Result<TaskStatus, TaskError> {
        if !pipeline
            .homology
            .is_homologous(&self.gene.sequence, &self.reference.sequence)?
        {
            return Ok(TaskStatus::NotHomologous);
        }

        let region = upstream_region(&self.record.nucleotides, self.gene, pipeline.window);
        let sentinels = region.sentinel_count();
        if sentinels > 0 {
            log::debug!(
                "{}:{}: upstream region has {} non-ACGT bases",
                self.record.name,
                self.gene.name,
                sentinels
            );
        }

        let Some(hit) = predictors.with_predictor(|p| p.predict(&region))? else {
            return Ok(TaskStatus::NoPromoter);
        };
        table.add_match(&self.reference.name, &hit)?;
        Ok(TaskStatus::Matched)
    }
}

/// Every task for a set of references and records.
///
/// Iteration order is record, then gene within record, then reference; ids
/// follow that order. The set can be iterated any number of times.
#[derive(Debug, Clone, Copy)]
pub struct TaskSet<'a> {
    references: &'a [Gene],
    records: &'a [GenomeRecord],
}

impl<'a> TaskSet<'a> {
    pub fn new(references: &'a [Gene], records: &'a [GenomeRecord]) -> Self {
        Self {
            references,
            records,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = ScreenTask<'a>> + Clone + 'a {
        let (references, records) = (self.references, self.records);
        records
            .iter()
            .flat_map(move |record| {
                record.genes.iter().flat_map(move |gene| {
                    references
                        .iter()
                        .map(move |reference| (record, gene, reference))
                })
            })
            .enumerate()
            .map(|(id, (record, gene, reference))| ScreenTask {
                id,
                record,
                gene,
                reference,
            })
    }

    /// Sum over records of gene count, times the reference count.
    pub fn len(&self) -> usize {
        self.records.iter().map(|r| r.genes.len()).sum::<usize>() * self.references.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
