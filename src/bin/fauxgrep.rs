//! Print every line containing NEEDLE in the files under each PATH.

use anyhow::Context;
use clap::Parser;
use rust_job_queue::prelude::*;
use std::num::NonZeroUsize;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Number of worker threads
    #[arg(short = 'n', long = "threads", default_value = "1")]
    threads: NonZeroUsize,

    /// Match against lines with their trailing newline still attached
    #[arg(long)]
    keep_newline: bool,

    /// Maximum number of files waiting to be searched
    #[arg(long, default_value = "100")]
    queue_capacity: NonZeroUsize,

    /// Fixed string to search for
    needle: String,

    /// Files or directories to search
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
            eprintln!("fauxgrep: {:#}", err);
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
    let terminator = if cli.keep_newline {
        LineTerminator::Keep
    } else {
        LineTerminator::Strip
    };
    let sink = Arc::new(OutputSink::stdout());
    let search = SearchProcessor::new(&cli.needle, sink).with_line_terminator(terminator);

    let config = PoolConfig::new(cli.threads.get())
        .with_queue_capacity(cli.queue_capacity.get())
        .with_thread_name_prefix("fauxgrep");

    let summary = pipeline::run(&config, &FileWalker::new(cli.paths), Arc::new(search))
        .context("search aborted")?;

    log::debug!(
        "searched {} files with {} workers",
        summary.files_queued,
        summary.pool.workers.len()
    );
    Ok(())
}
