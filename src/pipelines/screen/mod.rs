//! Promoter screening pipeline.
//!
//! ```text
//! reference genes × (records → genes)
//!     → homology filter → upstream region → promoter prediction → consensus
//! ```
//!
//! Every (record gene, reference gene) pair is an independent task; the
//! consensus table is the only state tasks share.

pub mod orchestrator;
pub mod scheduler;
pub mod task;

pub use orchestrator::{
    ComparisonReport, ExecutionMode, Orchestrator, ScreenInputs, ScreenReport, SkippedRecord,
};
pub use scheduler::{CancelToken, RunOutput, RunSummary, ScheduleError, TaskFailure, TaskScheduler};
pub use task::{ScreenPipeline, ScreenTask, TaskError, TaskOutcome, TaskSet, TaskStatus};
