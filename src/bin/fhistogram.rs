//! Count the bytes of every file under each PATH into eight classes by their
//! top three bits, printing the running totals as workers merge.

use anyhow::Context;
use clap::Parser;
use rust_job_queue::histogram::DEFAULT_FLUSH_EVERY;
use rust_job_queue::prelude::*;
use std::num::{NonZeroU64, NonZeroUsize};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Number of worker threads
    #[arg(short = 'n', long = "threads", default_value = "1")]
    threads: NonZeroUsize,

    /// Maximum number of files waiting to be counted
    #[arg(long, default_value = "64")]
    queue_capacity: NonZeroUsize,

    /// Bytes read between merges into the shared totals
    #[arg(long, default_value_t = DEFAULT_FLUSH_EVERY)]
    flush_every: NonZeroU64,

    /// Files or directories to count
    #[arg(required = true)]
    paths: Vec<PathBuf>,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        // Whoever read our output stopped listening, e.g. `| head`
        Err(err) if is_broken_pipe(&err) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("fhistogram: {:#}", err);
            ExitCode::FAILURE
        }
    }
}

fn is_broken_pipe(err: &anyhow::Error) -> bool {
    err.chain()
        .filter_map(|cause| cause.downcast_ref::<PoolError>())
        .any(PoolError::is_broken_pipe)
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let shared = Arc::new(SharedHistogram::new());
    let sink = Arc::new(OutputSink::stdout());
    let histogram = HistogramProcessor::new(Arc::clone(&shared), sink)
        .with_flush_every(cli.flush_every);

    let config = PoolConfig::new(cli.threads.get())
        .with_queue_capacity(cli.queue_capacity.get())
        .with_thread_name_prefix("fhistogram");

    let summary = pipeline::run(&config, &FileWalker::new(cli.paths), Arc::new(histogram))
        .context("histogram aborted")?;

    log::debug!(
        "counted {} bytes across {} files",
        shared.snapshot().total(),
        summary.files_queued
    );
    Ok(())
}
