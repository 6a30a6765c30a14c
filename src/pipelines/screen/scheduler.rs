//! Task scheduling.
//!
//! [`TaskScheduler::run`] submits every task of a [`TaskSet`] to a bounded
//! rayon pool and returns only after each one has finished, failed or been
//! skipped by cancellation. [`TaskScheduler::run_sequential`] runs the same
//! tasks in generation order on the calling thread and is the baseline the
//! parallel run is checked against.
//!
//! A failing task never stops its siblings: collaborator errors and panics
//! are both turned into a [`TaskFailure`] and reported after the barrier.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use rayon::prelude::*;
use thiserror::Error;

use super::task::{ScreenPipeline, ScreenTask, TaskError, TaskOutcome, TaskSet, TaskStatus};
use crate::core::consensus::{AggregateError, ConsensusSnapshot, ConsensusTable};
use crate::core::promoter::PredictorPool;
use crate::core::sequence::{Gene, GenomeRecord};

#[derive(Debug, Error)]
pub enum ScheduleError {
    #[error("worker pool size must be at least 1")]
    ZeroThreads,

    #[error("failed to build worker pool: {0}")]
    PoolBuild(#[from] rayon::ThreadPoolBuildError),

    #[error("cannot seed consensus table: {0}")]
    Aggregate(#[from] AggregateError),

    #[error("run interrupted after {completed} of {total} tasks")]
    Interrupted { completed: usize, total: usize },
}

/// Shared cancellation flag.
///
/// Once cancelled, tasks that have not started are skipped. Tasks already
/// running are left to finish.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// A task that ran but did not complete normally.
#[derive(Debug, Clone, PartialEq)]
pub struct TaskFailure {
    pub task_id: usize,
    pub record: String,
    pub gene: String,
    pub reference: String,
    pub error: TaskError,
}

/// Outcome counts for one finished run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunSummary {
    pub total: usize,
    pub not_homologous: usize,
    pub no_promoter: usize,
    pub matched: usize,
    /// Sorted by task id.
    pub failures: Vec<TaskFailure>,
}

impl RunSummary {
    pub fn failed(&self) -> usize {
        self.failures.len()
    }

    /// Tasks accounted for; equals `total` for every finished run.
    pub fn accounted(&self) -> usize {
        self.not_homologous + self.no_promoter + self.matched + self.failed()
    }
}

/// Summary plus final consensus of a finished run.
#[derive(Debug, Clone)]
pub struct RunOutput {
    pub summary: RunSummary,
    pub consensus: ConsensusSnapshot,
}

#[derive(Debug, Clone)]
pub struct TaskScheduler {
    threads: usize,
    cancel: CancelToken,
}

impl TaskScheduler {
    pub fn new(threads: usize) -> Result<Self, ScheduleError> {
        if threads == 0 {
            return Err(ScheduleError::ZeroThreads);
        }
        Ok(Self {
            threads,
            cancel: CancelToken::new(),
        })
    }

    /// Share `token` with this scheduler instead of its private one.
    pub fn with_cancel_token(mut self, token: CancelToken) -> Self {
        self.cancel = token;
        self
    }

    pub fn threads(&self) -> usize {
        self.threads
    }

    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    /// Run every task on a pool of `threads` workers and wait for all of them.
    pub fn run(
        &self,
        pipeline: &ScreenPipeline,
        references: &[Gene],
        records: &[GenomeRecord],
    ) -> Result<RunOutput, ScheduleError> {
        let tasks = TaskSet::new(references, records);
        let table = seed_table(references)?;
        let predictors = pipeline.predictor_pool();

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.threads)
            .thread_name(|i| format!("screen-worker-{i}"))
            .build()?;
        log::debug!(
            "Scheduling {} tasks on {} workers",
            tasks.len(),
            pool.current_num_threads()
        );

        let work: Vec<ScreenTask<'_>> = tasks.iter().collect();
        let outcomes: Vec<(ScreenTask<'_>, TaskOutcome)> = pool.install(|| {
            work.par_iter()
                .map(|task| (*task, self.dispatch(task, pipeline, &predictors, &table)))
                .collect()
        });

        finish(outcomes, table)
    }

    /// Run every task in generation order on the calling thread.
    pub fn run_sequential(
        &self,
        pipeline: &ScreenPipeline,
        references: &[Gene],
        records: &[GenomeRecord],
    ) -> Result<RunOutput, ScheduleError> {
        let tasks = TaskSet::new(references, records);
        let table = seed_table(references)?;
        let predictors = pipeline.predictor_pool();
        log::debug!("Running {} tasks sequentially", tasks.len());

        let outcomes = tasks
            .iter()
            .map(|task| (task, self.dispatch(&task, pipeline, &predictors, &table)))
            .collect();

        finish(outcomes, table)
    }

    fn dispatch(
        &self,
        task: &ScreenTask<'_>,
        pipeline: &ScreenPipeline,
        predictors: &PredictorPool,
        table: &ConsensusTable,
    ) -> TaskOutcome {
        if self.cancel.is_cancelled() {
            return TaskOutcome::Cancelled;
        }

        let result = panic::catch_unwind(AssertUnwindSafe(|| {
            task.execute(pipeline, predictors, table)
        }))
        .unwrap_or_else(|payload| Err(TaskError::Panicked(panic_message(payload.as_ref()))));

        match result {
            Ok(status) => {
                log::trace!(
                    "task {} {}:{} vs {}: {:?}",
                    task.id,
                    task.record.name,
                    task.gene.name,
                    task.reference.name,
                    status
                );
                TaskOutcome::Done(status)
            }
            Err(error) => {
                log::warn!(
                    "task {} {}:{} vs {} failed: {}",
                    task.id,
                    task.record.name,
                    task.gene.name,
                    task.reference.name,
                    error
                );
                TaskOutcome::Failed(error)
            }
        }
    }
}

fn seed_table(references: &[Gene]) -> Result<ConsensusTable, AggregateError> {
    ConsensusTable::seeded(references.iter().map(|g| g.name.clone()))
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

fn finish(
    outcomes: Vec<(ScreenTask<'_>, TaskOutcome)>,
    table: ConsensusTable,
) -> Result<RunOutput, ScheduleError> {
    let total = outcomes.len();
    let mut summary = RunSummary {
        total,
        ..RunSummary::default()
    };
    let mut cancelled = 0;

    for (task, outcome) in outcomes {
        match outcome {
            TaskOutcome::Done(TaskStatus::NotHomologous) => summary.not_homologous += 1,
            TaskOutcome::Done(TaskStatus::NoPromoter) => summary.no_promoter += 1,
            TaskOutcome::Done(TaskStatus::Matched) => summary.matched += 1,
            TaskOutcome::Failed(error) => summary.failures.push(TaskFailure {
                task_id: task.id,
                record: task.record.name.clone(),
                gene: task.gene.name.clone(),
                reference: task.reference.name.clone(),
                error,
            }),
            TaskOutcome::Cancelled => cancelled += 1,
        }
    }

    if cancelled > 0 {
        return Err(ScheduleError::Interrupted {
            completed: total - cancelled,
            total,
        });
    }
    summary.failures.sort_by_key(|f| f.task_id);
    Ok(RunOutput {
        summary,
        consensus: table.into_snapshot(),
    })
}
