use std::fs::File;
use std::future::Future;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::thread::JoinHandle;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};

use ferrous_promoter::defaults;
use ferrous_promoter::pipelines::screen::{CancelToken, Orchestrator};
use ferrous_promoter::screen_opt::{RecordPolicy, ScreenOpt};

#[derive(Parser)]
#[command(name = "ferrous-promoter")]
#[command(about = "FerrousPromoter - sigma70 promoter consensus across homologous genes", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Screen genome records for promoters upstream of genes homologous to the references
    Screen(ScreenArgs),

    /// Run sequential and parallel screens on the same inputs and compare them
    Compare(ScreenArgs),
}

#[derive(Args)]
struct ScreenArgs {
    /// Reference gene list (alternating name and peptide lines)
    #[arg(value_name = "REFERENCE")]
    reference: PathBuf,

    /// Directory searched recursively for GenBank records (.gz accepted)
    #[arg(value_name = "RECORD_DIR")]
    record_dir: PathBuf,

    /// Number of worker threads
    #[arg(short = 't', long, value_name = "INT", default_value_t = defaults::THREADS)]
    threads: usize,

    /// Upstream window width in bases
    #[arg(short = 'w', long, value_name = "INT", default_value_t = defaults::UPSTREAM_WINDOW)]
    window: usize,

    /// Minimum local alignment score to call two genes homologous
    #[arg(long, value_name = "FLOAT", default_value_t = defaults::HOMOLOGY_THRESHOLD)]
    min_score: f32,

    /// Fraction of promoter box positions that must match
    #[arg(long, value_name = "FLOAT", default_value_t = defaults::PROMOTER_CONFIDENCE)]
    confidence: f64,

    /// Abort on a malformed record file instead of skipping it
    #[arg(long)]
    strict: bool,

    /// Verbose level: 1=error, 2=warning, 3=message, 4+=debugging
    #[arg(short = 'v', long, value_name = "INT", default_value_t = defaults::VERBOSITY)]
    verbosity: i32,

    /// Output report file (default: stdout)
    #[arg(short = 'o', long, value_name = "FILE")]
    output: Option<PathBuf>,
}

impl ScreenArgs {
    fn to_opt(&self) -> ScreenOpt {
        ScreenOpt {
            threads: validate_threads(self.threads),
            window: self.window,
            min_score: self.min_score,
            confidence: self.confidence,
            record_policy: if self.strict {
                RecordPolicy::Abort
            } else {
                RecordPolicy::Skip
            },
            verbosity: self.verbosity,
            ..ScreenOpt::default()
        }
    }
}

fn init_logging(verbosity: i32) {
    // Map verbosity (1=error, 2=warning, 3=message, 4=debug, 5+=trace) to log levels
    let log_level = match verbosity {
        v if v <= 1 => log::LevelFilter::Error,
        2 => log::LevelFilter::Warn,
        3 => log::LevelFilter::Info,
        4 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };

    env_logger::Builder::from_default_env()
        .filter_level(log_level)
        .format_timestamp(None)
        .format_target(false)
        .init();
}

fn validate_threads(requested: usize) -> usize {
    if requested < 1 {
        log::warn!("Invalid thread count {}, using 1 thread", requested);
        return 1;
    }

    let cores = num_cpus::get();
    if requested > cores * 2 {
        log::warn!(
            "Thread count {} is more than twice the {} available cores",
            requested,
            cores
        );
    }
    requested
}

fn open_output(path: Option<&Path>) -> Result<Box<dyn Write>> {
    match path {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("creating output file {}", path.display()))?;
            Ok(Box::new(BufWriter::new(file)))
        }
        None => Ok(Box::new(BufWriter::new(io::stdout().lock()))),
    }
}

/// Trip `token` once `signal` resolves. Tasks already running finish; the
/// rest are skipped and the run reports itself interrupted.
fn cancel_on<F>(signal: F, token: CancelToken) -> Result<JoinHandle<()>>
where
    F: Future<Output = io::Result<()>> + Send + 'static,
{
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("building signal runtime")?;
    std::thread::Builder::new()
        .name("interrupt".to_string())
        .spawn(move || {
            match runtime.block_on(signal) {
                Ok(()) => {
                    log::warn!("Interrupted, waiting for running tasks to finish");
                    token.cancel();
                }
                Err(e) => log::warn!("Cannot listen for interrupts: {}", e),
            }
        })
        .context("spawning interrupt listener")
}

fn screen(args: &ScreenArgs) -> Result<()> {
    let opt = args.to_opt();
    if opt.verbosity >= 3 {
        opt.log_parameters();
    }

    let orchestrator = Orchestrator::new(opt)?;
    cancel_on(tokio::signal::ctrl_c(), orchestrator.cancel_token())?;
    let report = orchestrator.run(&args.reference, &args.record_dir)?;

    let mut out = open_output(args.output.as_deref())?;
    write!(out, "{report}").context("writing report")?;
    out.flush().context("writing report")?;
    Ok(())
}

/// Returns whether both runs produced the same consensus.
fn compare(args: &ScreenArgs) -> Result<bool> {
    let opt = args.to_opt();
    if opt.verbosity >= 3 {
        opt.log_parameters();
    }

    let orchestrator = Orchestrator::new(opt)?;
    cancel_on(tokio::signal::ctrl_c(), orchestrator.cancel_token())?;
    let inputs = orchestrator.load_inputs(&args.reference, &args.record_dir)?;
    let report = orchestrator.compare(&inputs)?;
    log::info!(
        "Sequential {:.3} s, parallel {:.3} s, speedup {:.2}x",
        report.sequential.elapsed.as_secs_f64(),
        report.parallel.elapsed.as_secs_f64(),
        report.speedup()
    );

    let mut out = open_output(args.output.as_deref())?;
    write!(out, "{report}").context("writing report")?;
    out.flush().context("writing report")?;
    Ok(report.is_equivalent())
}

fn main() {
    let cli = Cli::parse();

    match cli.command {
        Commands::Screen(args) => {
            init_logging(args.verbosity);
            if let Err(e) = screen(&args) {
                log::error!("{:#}", e);
                std::process::exit(1);
            }
        }

        Commands::Compare(args) => {
            init_logging(args.verbosity);
            match compare(&args) {
                Ok(true) => {}
                Ok(false) => {
                    log::error!("Parallel consensus differs from the sequential baseline");
                    std::process::exit(2);
                }
                Err(e) => {
                    log::error!("{:#}", e);
                    std::process::exit(1);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolved_signal_trips_the_token() {
        let token = CancelToken::new();
        cancel_on(std::future::ready(Ok(())), token.clone())
            .unwrap()
            .join()
            .unwrap();
        assert!(token.is_cancelled());
    }

    #[test]
    fn failed_listener_leaves_the_run_alone() {
        let token = CancelToken::new();
        cancel_on(
            std::future::ready(Err(io::Error::other("no signal support"))),
            token.clone(),
        )
        .unwrap()
        .join()
        .unwrap();
        assert!(!token.is_cancelled());
    }

    #[test]
    fn zero_threads_become_one() {
        assert_eq!(validate_threads(0), 1);
        assert_eq!(validate_threads(3), 3);
    }
}
