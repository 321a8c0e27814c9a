//! Directory traversal that feeds file paths into a queue

use crate::queue::BoundedQueue;
use std::ops::ControlFlow;
use std::path::PathBuf;
use walkdir::WalkDir;

/// Outcome of one traversal
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProduceSummary {
    /// Regular files handed to the consumer
    pub files_queued: u64,
    /// Entries that could not be read (missing roots, unreadable
    /// directories, symlink loops)
    pub entries_skipped: u64,
    /// True if the queue refused a push before traversal finished
    pub stopped_early: bool,
}

/// Walks a set of root paths and yields every regular file beneath them.
///
/// Symbolic links are followed; walkdir detects link loops and reports them
/// as errors, which are logged and skipped. Directories are descended into but
/// never yielded.
#[derive(Debug, Clone)]
pub struct FileWalker {
    roots: Vec<PathBuf>,
    follow_links: bool,
}

impl FileWalker {
    /// Create a walker over `roots`
    pub fn new<I, P>(roots: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        Self {
            roots: roots.into_iter().map(Into::into).collect(),
            follow_links: true,
        }
    }

    /// Whether to follow symbolic links (default: true)
    #[must_use = "builder methods return a new value and do not modify the original"]
    pub fn follow_links(mut self, follow: bool) -> Self {
        self.follow_links = follow;
        self
    }

    /// Calls `visit` with each regular file until it returns `Break`.
    pub fn for_each_file<F>(&self, mut visit: F) -> ProduceSummary
    where
        F: FnMut(PathBuf) -> ControlFlow<()>,
    {
        let mut summary = ProduceSummary::default();

        for root in &self.roots {
            for entry in WalkDir::new(root).follow_links(self.follow_links) {
                let entry = match entry {
                    Ok(entry) => entry,
                    Err(e) => {
                        log::warn!("skipping {}", e);
                        summary.entries_skipped += 1;
                        continue;
                    }
                };

                if !entry.file_type().is_file() {
                    continue;
                }

                if visit(entry.into_path()).is_break() {
                    summary.stopped_early = true;
                    return summary;
                }
                summary.files_queued += 1;
            }
        }

        summary
    }

    /// Pushes one job per regular file into `queue`, then closes it.
    ///
    /// The queue is closed exactly once, after the last push, even when the
    /// traversal stops early because a worker closed the queue after a fatal
    /// error.
    pub fn produce(&self, queue: &BoundedQueue<PathBuf>) -> ProduceSummary {
        let summary = self.for_each_file(|path| match queue.push(path) {
            Ok(()) => ControlFlow::Continue(()),
            Err(e) => {
                let reason = e.to_string();
                let path = e.into_inner();
                log::debug!("stopping traversal at {}: {}", path.display(), reason);
                ControlFlow::Break(())
            }
        });
        queue.close();

        log::debug!(
            "traversal finished: {} files queued, {} entries skipped",
            summary.files_queued,
            summary.entries_skipped
        );
        summary
    }
}
