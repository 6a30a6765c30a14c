//! Screen orchestration.
//!
//! Loads the reference list and genome records, hands them to a
//! [`TaskScheduler`] and wraps the result with timing. The comparison mode
//! runs the same inputs sequentially and in parallel and checks that both
//! consensus tables print identically.

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use anyhow::{Context, Result};

use super::scheduler::{CancelToken, RunSummary, ScheduleError, TaskScheduler};
use super::task::ScreenPipeline;
use crate::core::consensus::{ConsensusSnapshot, EquivalenceReport};
use crate::core::io::{list_record_files, read_genbank_file, read_reference_genes};
use crate::core::sequence::{Gene, GenomeRecord};
use crate::screen_opt::{RecordPolicy, ScreenOpt};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionMode {
    Sequential,
    Parallel { threads: usize },
}

impl fmt::Display for ExecutionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExecutionMode::Sequential => f.write_str("sequential"),
            ExecutionMode::Parallel { threads: 1 } => f.write_str("parallel, 1 thread"),
            ExecutionMode::Parallel { threads } => write!(f, "parallel, {threads} threads"),
        }
    }
}

/// A record file left out of the run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedRecord {
    pub path: PathBuf,
    pub reason: String,
}

/// Everything a screen reads, loaded up front.
#[derive(Debug, Clone, Default)]
pub struct ScreenInputs {
    pub references: Vec<Gene>,
    pub records: Vec<GenomeRecord>,
    pub skipped: Vec<SkippedRecord>,
}

impl ScreenInputs {
    pub fn gene_count(&self) -> usize {
        self.records.iter().map(|r| r.genes.len()).sum()
    }
}

#[derive(Debug, Clone)]
pub struct ScreenReport {
    pub mode: ExecutionMode,
    pub summary: RunSummary,
    pub consensus: ConsensusSnapshot,
    pub skipped: Vec<SkippedRecord>,
    pub elapsed: Duration,
}

impl fmt::Display for ScreenReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = &self.summary;
        writeln!(f, "# mode: {}", self.mode)?;
        writeln!(f, "# elapsed: {:.3} s", self.elapsed.as_secs_f64())?;
        writeln!(
            f,
            "# tasks: {} total, {} not homologous, {} no promoter, {} matched, {} failed",
            s.total,
            s.not_homologous,
            s.no_promoter,
            s.matched,
            s.failed()
        )?;
        for skipped in &self.skipped {
            writeln!(
                f,
                "# skipped record {}: {}",
                skipped.path.display(),
                skipped.reason
            )?;
        }
        for failure in &s.failures {
            writeln!(
                f,
                "# failed task {} {}:{} vs {}: {}",
                failure.task_id, failure.record, failure.gene, failure.reference, failure.error
            )?;
        }
        write!(f, "{}", self.consensus)
    }
}

/// Sequential baseline next to a parallel run over the same inputs.
#[derive(Debug, Clone)]
pub struct ComparisonReport {
    pub sequential: ScreenReport,
    pub parallel: ScreenReport,
    pub equivalence: EquivalenceReport,
}

impl ComparisonReport {
    /// Sequential time over parallel time.
    pub fn speedup(&self) -> f64 {
        let parallel = self.parallel.elapsed.as_secs_f64();
        if parallel > 0.0 {
            self.sequential.elapsed.as_secs_f64() / parallel
        } else {
            f64::INFINITY
        }
    }

    pub fn is_equivalent(&self) -> bool {
        self.equivalence.is_equivalent()
    }
}

impl fmt::Display for ComparisonReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "# sequential: {:.3} s",
            self.sequential.elapsed.as_secs_f64()
        )?;
        writeln!(
            f,
            "# {}: {:.3} s",
            self.parallel.mode,
            self.parallel.elapsed.as_secs_f64()
        )?;
        writeln!(f, "# speedup: {:.2}x", self.speedup())?;
        if self.is_equivalent() {
            writeln!(
                f,
                "# equivalent: yes ({} buckets)",
                self.equivalence.compared
            )?;
        } else {
            writeln!(
                f,
                "# equivalent: no (mismatched: {})",
                self.equivalence.mismatched.join(", ")
            )?;
        }
        write!(f, "{}", self.parallel)
    }
}

#[derive(Debug)]
pub struct Orchestrator {
    opt: ScreenOpt,
    pipeline: ScreenPipeline,
    cancel: CancelToken,
}

impl Orchestrator {
    pub fn new(opt: ScreenOpt) -> Result<Self> {
        let pipeline = ScreenPipeline::from_opt(&opt).context("invalid scoring options")?;
        Ok(Self::with_pipeline(opt, pipeline))
    }

    /// Use `pipeline` instead of the collaborators `opt` describes.
    pub fn with_pipeline(opt: ScreenOpt, pipeline: ScreenPipeline) -> Self {
        Self {
            opt,
            pipeline,
            cancel: CancelToken::new(),
        }
    }

    pub fn options(&self) -> &ScreenOpt {
        &self.opt
    }

    /// Token that interrupts any run this orchestrator starts.
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    /// Read the reference list and every record file under `record_dir`.
    ///
    /// IO failures are fatal. A record file that does not parse is skipped
    /// or fails the load depending on the record policy.
    pub fn load_inputs(&self, reference: &Path, record_dir: &Path) -> Result<ScreenInputs> {
        let references = read_reference_genes(reference)
            .with_context(|| format!("loading reference genes from {}", reference.display()))?;
        let files = list_record_files(record_dir)
            .with_context(|| format!("listing records under {}", record_dir.display()))?;

        let mut inputs = ScreenInputs {
            references,
            ..ScreenInputs::default()
        };
        for path in files {
            match read_genbank_file(&path) {
                Ok(records) => {
                    for record in &records {
                        log::info!(
                            "Loaded {} ({} bp, {} genes)",
                            record.name,
                            record.nucleotides.len(),
                            record.genes.len()
                        );
                    }
                    inputs.records.extend(records);
                }
                Err(e) if e.is_record_scoped() && self.opt.record_policy == RecordPolicy::Skip => {
                    log::error!("Skipping {}: {}", path.display(), e);
                    inputs.skipped.push(SkippedRecord {
                        path,
                        reason: e.to_string(),
                    });
                }
                Err(e) => {
                    return Err(e).with_context(|| format!("loading record {}", path.display()));
                }
            }
        }

        log::info!(
            "{} reference genes, {} records, {} genes, {} files skipped",
            inputs.references.len(),
            inputs.records.len(),
            inputs.gene_count(),
            inputs.skipped.len()
        );
        Ok(inputs)
    }

    /// Screen loaded inputs and time the run.
    pub fn screen(
        &self,
        inputs: &ScreenInputs,
        mode: ExecutionMode,
    ) -> Result<ScreenReport, ScheduleError> {
        let start = Instant::now();
        let output = match mode {
            ExecutionMode::Sequential => TaskScheduler::new(1)?
                .with_cancel_token(self.cancel_token())
                .run_sequential(&self.pipeline, &inputs.references, &inputs.records)?,
            ExecutionMode::Parallel { threads } => TaskScheduler::new(threads)?
                .with_cancel_token(self.cancel_token())
                .run(&self.pipeline, &inputs.references, &inputs.records)?,
        };
        let elapsed = start.elapsed();

        log::info!(
            "Screened {} tasks ({}) in {:.3} real sec: {} matched, {} failed",
            output.summary.total,
            mode,
            elapsed.as_secs_f64(),
            output.summary.matched,
            output.summary.failed()
        );
        Ok(ScreenReport {
            mode,
            summary: output.summary,
            consensus: output.consensus,
            skipped: inputs.skipped.clone(),
            elapsed,
        })
    }

    /// Load and screen in parallel with the configured thread count.
    pub fn run(&self, reference: &Path, record_dir: &Path) -> Result<ScreenReport> {
        let inputs = self.load_inputs(reference, record_dir)?;
        let report = self.screen(
            &inputs,
            ExecutionMode::Parallel {
                threads: self.opt.threads,
            },
        )?;
        Ok(report)
    }

    /// Sequential baseline then parallel run over the same inputs.
    pub fn compare(&self, inputs: &ScreenInputs) -> Result<ComparisonReport, ScheduleError> {
        let sequential = self.screen(inputs, ExecutionMode::Sequential)?;
        let parallel = self.screen(
            inputs,
            ExecutionMode::Parallel {
                threads: self.opt.threads,
            },
        )?;
        let equivalence = sequential.consensus.equivalence(&parallel.consensus);

        if equivalence.is_equivalent() {
            log::info!(
                "Sequential and parallel consensus agree on {} buckets",
                equivalence.compared
            );
        } else {
            log::warn!(
                "Sequential and parallel consensus differ: {}",
                equivalence.mismatched.join(", ")
            );
        }
        Ok(ComparisonReport {
            sequential,
            parallel,
            equivalence,
        })
    }
}
