// Copyright 2025 Reality Recorder Contributors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

// Background CSV row writer
//
// Producers enqueue rows without touching disk; a dedicated worker thread
// drains the channel in FIFO order and appends one line per row. Worker-side
// I/O failures are logged and counted, never propagated to producers.

use crossbeam::channel::{unbounded, Sender};
use std::fmt;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;
use tracing::{debug, error};

use crate::error::RecorderError;

/// A single CSV cell. Numbers are rendered with Rust's default formatting,
/// which does not depend on the process locale.
#[derive(Debug, Clone, PartialEq)]
pub enum CsvValue {
    Int(i64),
    Float(f64),
    Text(String),
}

impl fmt::Display for CsvValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CsvValue::Int(v) => write!(f, "{v}"),
            CsvValue::Float(v) => write!(f, "{v}"),
            CsvValue::Text(s) => f.write_str(s),
        }
    }
}

impl From<i64> for CsvValue {
    fn from(v: i64) -> Self {
        CsvValue::Int(v)
    }
}

impl From<u32> for CsvValue {
    fn from(v: u32) -> Self {
        CsvValue::Int(i64::from(v))
    }
}

impl From<f64> for CsvValue {
    fn from(v: f64) -> Self {
        CsvValue::Float(v)
    }
}

impl From<f32> for CsvValue {
    fn from(v: f32) -> Self {
        CsvValue::Float(f64::from(v))
    }
}

impl From<&str> for CsvValue {
    fn from(v: &str) -> Self {
        CsvValue::Text(v.to_string())
    }
}

/// An ordered row of cells.
pub type CsvRow = Vec<CsvValue>;

struct WorkerHandle {
    tx: Sender<CsvRow>,
    worker: JoinHandle<()>,
}

/// Append-only delimited-row writer backed by a dedicated worker thread.
///
/// Rows are written to the file in the exact order they were enqueued, no
/// matter how many threads enqueue concurrently. `close` blocks until the
/// queue is drained and the file handle is released, and is idempotent;
/// enqueue attempts after `close` are rejected with
/// [`RecorderError::WriterClosed`].
pub struct CsvWriter {
    path: PathBuf,
    header_len: Option<usize>,
    inner: Mutex<Option<WorkerHandle>>,
    io_errors: Arc<AtomicUsize>,
}

impl CsvWriter {
    /// Create (or truncate) the file at `path`, creating parent directories
    /// as needed. When a header is given it is written synchronously before
    /// this returns, so it always precedes every row.
    pub fn open(path: impl AsRef<Path>, header: Option<&[&str]>) -> Result<Self, RecorderError> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let file = File::create(&path)?;
        let mut out = BufWriter::new(file);

        if let Some(columns) = header {
            writeln!(out, "{}", columns.join(","))?;
            out.flush()?;
        }

        let io_errors = Arc::new(AtomicUsize::new(0));
        let (tx, rx) = unbounded::<CsvRow>();

        let worker_errors = Arc::clone(&io_errors);
        let worker_path = path.clone();
        let worker = std::thread::spawn(move || {
            for row in rx.iter() {
                let line = row
                    .iter()
                    .map(ToString::to_string)
                    .collect::<Vec<_>>()
                    .join(",");
                if let Err(e) = writeln!(out, "{line}") {
                    worker_errors.fetch_add(1, Ordering::Relaxed);
                    error!("failed to write row to {}: {}", worker_path.display(), e);
                }
            }
            if let Err(e) = out.flush() {
                worker_errors.fetch_add(1, Ordering::Relaxed);
                error!("failed to flush {}: {}", worker_path.display(), e);
            }
            debug!("csv worker for {} finished", worker_path.display());
        });

        Ok(Self {
            path,
            header_len: header.map(<[&str]>::len),
            inner: Mutex::new(Some(WorkerHandle { tx, worker })),
            io_errors,
        })
    }

    /// Queue a row for writing and return immediately. Rows whose cell count
    /// differs from the header are rejected before they can damage the file
    /// structure; writers opened without a header accept any width.
    pub fn enqueue(&self, row: CsvRow) -> Result<(), RecorderError> {
        if let Some(expected) = self.header_len {
            if row.len() != expected {
                return Err(RecorderError::ColumnCountMismatch {
                    expected,
                    actual: row.len(),
                });
            }
        }

        let guard = self.inner.lock().unwrap();
        match guard.as_ref() {
            Some(handle) => handle.tx.send(row).map_err(|_| RecorderError::WriterClosed),
            None => Err(RecorderError::WriterClosed),
        }
    }

    /// Signal end of input and block until every enqueued row has been
    /// written and the file handle released. Safe to call more than once.
    /// Shutdown-path only; never call this from a per-tick context.
    pub fn close(&self) -> Result<(), RecorderError> {
        let handle = self.inner.lock().unwrap().take();
        if let Some(WorkerHandle { tx, worker }) = handle {
            drop(tx);
            if worker.join().is_err() {
                error!("csv worker for {} panicked", self.path.display());
            }
        }
        Ok(())
    }

    /// Number of rows (or the final flush) lost to worker-side I/O errors.
    /// This is the out-of-band channel for disk failures; `enqueue` never
    /// reports them.
    pub fn io_error_count(&self) -> usize {
        self.io_errors.load(Ordering::Relaxed)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for CsvWriter {
    fn drop(&mut self) {
        let _ = self.close();
    }
}
