//! `sluice run` - drive a synthetic workload through the executor.
//!
//! Each task sleeps for `--sleep-ms` (returning early if cancelled). Every
//! `--fail-every`-th task returns an error and every `--panic-every`-th task
//! panics, so the output shows each outcome the executor can report.

use clap::Args;
use sluice::executor::{
    task, BoxTask, Completion, Executor, ExecutorError, ExecutorOptions, TaskError,
};
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tracing::info;

use crate::error::CliError;
use crate::runner::CliRunner;

/// Arguments for `sluice run`.
#[derive(Debug, Args)]
pub struct RunArgs {
    /// Maximum concurrent tasks (default: from config, else CPU count)
    #[arg(long)]
    pub capacity: Option<usize>,

    /// Number of tasks to submit
    #[arg(long, default_value = "10")]
    pub tasks: usize,

    /// How long each task sleeps, in milliseconds
    #[arg(long, default_value = "100")]
    pub sleep_ms: u64,

    /// Make every Nth task return an error
    #[arg(long)]
    pub fail_every: Option<usize>,

    /// Make every Nth task panic
    #[arg(long)]
    pub panic_every: Option<usize>,

    /// Stop collecting results after this many milliseconds
    /// (default: executor.task_timeout from config, else wait for all)
    #[arg(long)]
    pub timeout_ms: Option<u64>,

    /// Config file to use instead of ~/.sluice/config.ini
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long)]
    pub debug: bool,
}

/// Shape of the synthetic workload.
#[derive(Debug, Clone, Copy)]
struct Workload {
    sleep: Duration,
    fail_every: Option<usize>,
    panic_every: Option<usize>,
}

impl Workload {
    fn outcome(&self, number: usize) -> Outcome {
        let hits = |every: Option<usize>| matches!(every, Some(n) if n > 0 && number % n == 0);
        if hits(self.panic_every) {
            Outcome::Panic
        } else if hits(self.fail_every) {
            Outcome::Fail
        } else {
            Outcome::Succeed
        }
    }

    /// Builds task `number` (1-based).
    fn task(&self, number: usize) -> BoxTask<String> {
        let sleep = self.sleep;
        let outcome = self.outcome(number);
        task(move |cancel| async move {
            let interrupted = tokio::select! {
                _ = cancel.cancelled() => true,
                _ = tokio::time::sleep(sleep) => false,
            };
            if interrupted {
                return Err(TaskError::from(format!("task {} interrupted", number)));
            }
            match outcome {
                Outcome::Panic => panic!("task {} panicked on purpose", number),
                Outcome::Fail => Err(TaskError::from(format!("task {} failed on purpose", number))),
                Outcome::Succeed => Ok(format!("task {} done", number)),
            }
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Outcome {
    Succeed,
    Fail,
    Panic,
}

/// Outcome counts for a finished run.
#[derive(Debug, Default, PartialEq, Eq)]
struct Summary {
    ok: usize,
    failed: usize,
    panicked: usize,
    cancelled: usize,
    missing: usize,
}

impl Summary {
    fn tally<T>(submitted: usize, completions: &[Completion<T>]) -> Self {
        let mut summary = Self {
            missing: submitted.saturating_sub(completions.len()),
            ..Self::default()
        };
        for completion in completions {
            match &completion.result {
                Ok(_) => summary.ok += 1,
                Err(ExecutorError::Panic(_)) => summary.panicked += 1,
                Err(ExecutorError::Cancelled) | Err(ExecutorError::ShutDown) => {
                    summary.cancelled += 1
                }
                Err(_) => summary.failed += 1,
            }
        }
        summary
    }
}

/// Run the `run` command.
pub fn run(args: RunArgs) -> Result<(), CliError> {
    let runner = CliRunner::new(args.config.as_deref(), args.debug)?;
    runner.log_startup("run");

    let settings = &runner.config().executor;
    let capacity = args.capacity.unwrap_or(settings.capacity);
    let timeout = args
        .timeout_ms
        .map(Duration::from_millis)
        .or(settings.task_timeout);
    let shutdown_timeout = settings.shutdown_timeout;
    let workload = Workload {
        sleep: Duration::from_millis(args.sleep_ms),
        fail_every: args.fail_every,
        panic_every: args.panic_every,
    };

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(CliError::Runtime)?;

    runtime.block_on(async move {
        let executor = Executor::new(capacity, ExecutorOptions::default())?;
        info!(capacity, tasks = args.tasks, "starting workload");

        let tasks: Vec<_> = (1..=args.tasks).map(|n| workload.task(n)).collect();
        let started = Instant::now();
        let completions = match timeout {
            Some(limit) => executor.execute_all_with_timeout(limit, tasks).await,
            None => executor.execute_all(tasks).await,
        };
        let elapsed = started.elapsed();

        for completion in &completions {
            let number = completion.index + 1;
            let id = completion.id.to_string();
            match &completion.result {
                Ok(value) => println!("#{:<4} {:<9} ok     {}", number, id, value),
                Err(e) => println!("#{:<4} {:<9} error  {}", number, id, e),
            }
        }

        let summary = Summary::tally(args.tasks, &completions);
        let stats = executor.stats();
        println!();
        println!(
            "{} ok, {} failed, {} panicked, {} cancelled, {} not collected",
            summary.ok, summary.failed, summary.panicked, summary.cancelled, summary.missing
        );
        println!(
            "capacity {}, peak concurrency {}, elapsed {:?}",
            stats.capacity, stats.peak_running, elapsed
        );

        executor
            .shutdown(shutdown_timeout)
            .await
            .map_err(CliError::Shutdown)
    })
}
