//! Deduplicating, thread-safe output for discovered domains.
//!
//! The sink owns the output file. Every worker shares one `ResultSink` and
//! calls [`ResultSink::accept`]; membership check, write and count update
//! happen inside a single critical section so two workers can never both
//! record the same domain.

use crate::error::IpFinderError;
use std::collections::HashSet;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

/// Outcome of offering a domain to the sink.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AcceptOutcome {
    /// First time this domain was seen; it was written and counted
    Accepted,
    /// Already recorded earlier in this scan; nothing happened
    Duplicate,
}

struct SinkState {
    seen: HashSet<String>,
    writer: Option<BufWriter<File>>,
    count: usize,
}

/// Concurrency-safe deduplicating writer for the output artifact.
pub struct ResultSink {
    path: PathBuf,
    state: Mutex<SinkState>,
}

impl ResultSink {
    /// Create the output file, truncating any previous content.
    ///
    /// The parent directory is created if it does not exist.
    ///
    /// # Errors
    ///
    /// Returns `IpFinderError::FileError` if the directory or the file cannot
    /// be created. Callers treat this as fatal.
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self, IpFinderError> {
        let path = path.as_ref();

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| {
                IpFinderError::file_error(
                    parent.to_string_lossy(),
                    format!("Failed to create output directory: {}", e),
                )
            })?;
        }

        let file = File::create(path).map_err(|e| {
            IpFinderError::file_error(
                path.to_string_lossy(),
                format!("Failed to create output file: {}", e),
            )
        })?;

        Ok(Self {
            path: path.to_path_buf(),
            state: Mutex::new(SinkState {
                seen: HashSet::new(),
                writer: Some(BufWriter::new(file)),
                count: 0,
            }),
        })
    }

    /// Record a domain if it has not been seen before.
    ///
    /// A domain is only marked as seen once its line has been written, so a
    /// failed write leaves it eligible for a later attempt.
    ///
    /// # Errors
    ///
    /// - `InvalidDomain` for an empty string
    /// - `SinkClosed` after [`close`](Self::close)
    /// - `FileError` if the write itself fails
    pub fn accept(&self, domain: &str) -> Result<AcceptOutcome, IpFinderError> {
        let domain = domain.trim();
        if domain.is_empty() {
            return Err(IpFinderError::invalid_domain(domain, "empty domain"));
        }

        let mut state = self.lock();
        let state = &mut *state;

        let Some(writer) = state.writer.as_mut() else {
            return Err(IpFinderError::SinkClosed);
        };

        if state.seen.contains(domain) {
            return Ok(AcceptOutcome::Duplicate);
        }

        writeln!(writer, "{}", domain).map_err(|e| {
            IpFinderError::file_error(
                self.path.to_string_lossy(),
                format!("Failed to write '{}': {}", domain, e),
            )
        })?;

        state.seen.insert(domain.to_string());
        state.count += 1;
        Ok(AcceptOutcome::Accepted)
    }

    /// Number of distinct domains written so far.
    pub fn final_count(&self) -> usize {
        self.lock().count
    }

    /// Whether [`close`](Self::close) has been called.
    pub fn is_closed(&self) -> bool {
        self.lock().writer.is_none()
    }

    /// Path of the output artifact.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Flush buffered output and release the file handle.
    ///
    /// Calling `close` more than once is a no-op.
    pub fn close(&self) -> Result<(), IpFinderError> {
        let writer = self.lock().writer.take();

        match writer {
            Some(writer) => writer
                .into_inner()
                .map_err(|e| e.into_error())
                .and_then(|file| file.sync_all())
                .map_err(|e| {
                    IpFinderError::file_error(
                        self.path.to_string_lossy(),
                        format!("Failed to flush output file: {}", e),
                    )
                }),
            None => Ok(()),
        }
    }

    // A worker that panicked mid-write leaves the set and file consistent
    // (insert happens after the write), so a poisoned lock is still usable.
    fn lock(&self) -> MutexGuard<'_, SinkState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl std::fmt::Debug for ResultSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResultSink")
            .field("path", &self.path)
            .field("count", &self.final_count())
            .finish()
    }
}
