//! Substring line search, one file per job

use crate::core::{PoolError, Processor, Result};
use crate::output::OutputSink;
use memchr::memmem;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// How a line's trailing terminator is treated before the needle is matched.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LineTerminator {
    /// Match against the line without its trailing `\n` (or `\r\n`)
    #[default]
    Strip,
    /// Match against the raw line, terminator included, so a needle ending
    /// in `\n` can match the end of a line
    Keep,
}

/// Prints every line of a file that contains a fixed byte string.
///
/// Output records have the form `path:lineno: line`, with 1-based line
/// numbers, and are written through a shared [`OutputSink`] one record at a
/// time. Files do not need to be valid UTF-8; lines are matched and printed as
/// raw bytes.
pub struct SearchProcessor {
    finder: memmem::Finder<'static>,
    terminator: LineTerminator,
    sink: Arc<OutputSink>,
}

impl std::fmt::Debug for SearchProcessor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SearchProcessor")
            .field("needle", &String::from_utf8_lossy(self.finder.needle()))
            .field("terminator", &self.terminator)
            .finish()
    }
}

impl SearchProcessor {
    /// Create a search for `needle`, writing matches to `sink`
    pub fn new(needle: impl AsRef<[u8]>, sink: Arc<OutputSink>) -> Self {
        Self {
            finder: memmem::Finder::new(needle.as_ref()).into_owned(),
            terminator: LineTerminator::default(),
            sink,
        }
    }

    /// Set how line terminators are treated when matching
    #[must_use = "builder methods return a new value and do not modify the original"]
    pub fn with_line_terminator(mut self, terminator: LineTerminator) -> Self {
        self.terminator = terminator;
        self
    }

    /// The needle being searched for
    pub fn needle(&self) -> &[u8] {
        self.finder.needle()
    }

    /// Search one file and return the number of matching lines.
    ///
    /// # Errors
    ///
    /// - [`PoolError::Open`] if the file cannot be opened
    /// - [`PoolError::Read`] if reading fails part way; lines already
    ///   reported stay reported
    pub fn search_file(&self, path: &Path) -> Result<u64> {
        let file = File::open(path).map_err(|e| PoolError::open(path, e))?;
        self.search_reader(path, BufReader::new(file))
    }

    /// Search any buffered reader, labelling matches with `path`.
    pub fn search_reader<R: BufRead>(&self, path: &Path, mut reader: R) -> Result<u64> {
        let label = path.display().to_string();
        let mut line = Vec::new();
        let mut lineno: u64 = 0;
        let mut matches = 0;

        loop {
            line.clear();
            let read = reader
                .read_until(b'\n', &mut line)
                .map_err(|e| PoolError::read(path, e))?;
            if read == 0 {
                break;
            }
            lineno += 1;

            let stripped = strip_terminator(&line);
            let haystack = match self.terminator {
                LineTerminator::Strip => stripped,
                LineTerminator::Keep => &line[..],
            };

            if self.finder.find(haystack).is_some() {
                self.sink.emit(&format_match(&label, lineno, stripped))?;
                matches += 1;
            }
        }

        Ok(matches)
    }
}

impl Processor<PathBuf> for SearchProcessor {
    fn process(&self, path: PathBuf) -> Result<()> {
        self.search_file(&path).map(|_| ())
    }

    fn name(&self) -> &str {
        "SearchProcessor"
    }
}

fn strip_terminator(line: &[u8]) -> &[u8] {
    let line = line.strip_suffix(b"\n").unwrap_or(line);
    line.strip_suffix(b"\r").unwrap_or(line)
}

fn format_match(label: &str, lineno: u64, line: &[u8]) -> Vec<u8> {
    let mut record = format!("{}:{}: ", label, lineno).into_bytes();
    record.reserve(line.len() + 1);
    record.extend_from_slice(line);
    record.push(b'\n');
    record
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{self, Cursor, Read};

    fn processor(needle: &str) -> (SearchProcessor, crate::output::CaptureBuffer) {
        let (sink, buffer) = OutputSink::capture();
        (SearchProcessor::new(needle, Arc::new(sink)), buffer)
    }

    #[test]
    fn test_reports_matching_lines_with_numbers() {
        let (search, out) = processor("needle");
        let input = "hay\nneedle here\nhay\nanother needle\n";

        let matches = search
            .search_reader(Path::new("f.txt"), Cursor::new(input))
            .unwrap();

        assert_eq!(matches, 2);
        assert_eq!(
            out.lines(),
            vec!["f.txt:2: needle here", "f.txt:4: another needle"]
        );
    }

    #[test]
    fn test_last_line_without_newline() {
        let (search, out) = processor("end");
        search
            .search_reader(Path::new("f"), Cursor::new("start\nthe end"))
            .unwrap();
        assert_eq!(out.to_string_lossy(), "f:2: the end\n");
    }

    #[test]
    fn test_crlf_is_stripped_from_output() {
        let (search, out) = processor("x");
        search
            .search_reader(Path::new("f"), Cursor::new("x\r\n"))
            .unwrap();
        assert_eq!(out.to_string_lossy(), "f:1: x\n");
    }

    #[test]
    fn test_terminator_mode_changes_matching() {
        let (strip, strip_out) = processor("end\n");
        strip
            .search_reader(Path::new("f"), Cursor::new("the end\n"))
            .unwrap();
        assert!(strip_out.lines().is_empty());

        let (sink, keep_out) = OutputSink::capture();
        let keep = SearchProcessor::new("end\n", Arc::new(sink))
            .with_line_terminator(LineTerminator::Keep);
        keep.search_reader(Path::new("f"), Cursor::new("the end\n"))
            .unwrap();
        assert_eq!(keep_out.lines(), vec!["f:1: the end"]);
    }

    #[test]
    fn test_non_utf8_lines() {
        let (search, out) = processor("ab");
        let input: &[u8] = b"\xff\xfeab\n";
        search
            .search_reader(Path::new("bin"), Cursor::new(input))
            .unwrap();
        assert_eq!(out.contents(), b"bin:1: \xff\xfeab\n".to_vec());
    }

    #[test]
    fn test_missing_file_is_open_error() {
        let (search, out) = processor("x");
        let result = search.process(PathBuf::from("/definitely/not/here.txt"));
        assert!(matches!(result, Err(PoolError::Open { .. })));
        assert!(out.contents().is_empty());
    }

    struct FailAfterFirstLine {
        served: bool,
    }

    impl Read for FailAfterFirstLine {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            if self.served {
                return Err(io::Error::new(io::ErrorKind::Other, "device gone"));
            }
            self.served = true;
            let line = b"needle\n";
            buf[..line.len()].copy_from_slice(line);
            Ok(line.len())
        }
    }

    #[test]
    fn test_read_error_abandons_file() {
        let (search, out) = processor("needle");
        let reader = io::BufReader::new(FailAfterFirstLine { served: false });
        let result = search.search_reader(Path::new("flaky"), reader);

        assert!(matches!(result, Err(PoolError::Read { .. })));
        assert_eq!(out.lines(), vec!["flaky:1: needle"]);
    }
}
