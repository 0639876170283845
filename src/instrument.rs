//! Logging and metrics around every public file operation.
//!
//! Each operation on a [`RemoteFile`](crate::RemoteFile) reports through
//! [`Instrumentation::observe`] exactly once, whether it succeeded or not.
//! The log line goes to `tracing`; the timing and status go to a
//! [`MetricsRecorder`].

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use crate::error::Result;

/// Operations reported to instrumentation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Open,
    Create,
    Read,
    ReadAt,
    Write,
    WriteAt,
    Seek,
    ReadAll,
    Stat,
    Close,
}

impl Operation {
    pub const ALL: [Operation; 10] = [
        Operation::Open,
        Operation::Create,
        Operation::Read,
        Operation::ReadAt,
        Operation::Write,
        Operation::WriteAt,
        Operation::Seek,
        Operation::ReadAll,
        Operation::Stat,
        Operation::Close,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::Open => "OPEN",
            Operation::Create => "CREATE",
            Operation::Read => "READ",
            Operation::ReadAt => "READ_AT",
            Operation::Write => "WRITE",
            Operation::WriteAt => "WRITE_AT",
            Operation::Seek => "SEEK",
            Operation::ReadAll => "READ_ALL",
            Operation::Stat => "STAT",
            Operation::Close => "CLOSE",
        }
    }

    fn index(&self) -> usize {
        *self as usize
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Success,
    Error,
}

impl Status {
    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Success => "SUCCESS",
            Status::Error => "ERROR",
        }
    }
}

/// Sink for per-operation timing and status
pub trait MetricsRecorder: Send + Sync {
    fn record(&self, op: Operation, status: Status, elapsed: Duration);
}

/// Lock-free counters of successes, failures and total time per operation
#[derive(Debug, Default)]
pub struct OperationStats {
    success: [AtomicU64; Operation::ALL.len()],
    failure: [AtomicU64; Operation::ALL.len()],
    elapsed_us: [AtomicU64; Operation::ALL.len()],
}

impl OperationStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn successes(&self, op: Operation) -> u64 {
        self.success[op.index()].load(Ordering::Relaxed)
    }

    pub fn failures(&self, op: Operation) -> u64 {
        self.failure[op.index()].load(Ordering::Relaxed)
    }

    pub fn total(&self, op: Operation) -> u64 {
        self.successes(op) + self.failures(op)
    }

    /// Accumulated wall time spent in `op`
    pub fn elapsed(&self, op: Operation) -> Duration {
        Duration::from_micros(self.elapsed_us[op.index()].load(Ordering::Relaxed))
    }
}

impl MetricsRecorder for OperationStats {
    fn record(&self, op: Operation, status: Status, elapsed: Duration) {
        let counter = match status {
            Status::Success => &self.success[op.index()],
            Status::Error => &self.failure[op.index()],
        };
        counter.fetch_add(1, Ordering::Relaxed);
        self.elapsed_us[op.index()].fetch_add(elapsed.as_micros() as u64, Ordering::Relaxed);
    }
}

/// Instrumentation handle shared by every file opened from a session
#[derive(Clone)]
pub struct Instrumentation {
    recorder: Arc<dyn MetricsRecorder>,
}

impl Default for Instrumentation {
    fn default() -> Self {
        Self::new(Arc::new(OperationStats::new()))
    }
}

impl Instrumentation {
    pub fn new(recorder: Arc<dyn MetricsRecorder>) -> Self {
        Self { recorder }
    }

    /// Log and record the outcome of `op` started at `start`, passing the
    /// result through untouched.
    pub fn observe<T>(
        &self,
        op: Operation,
        path: &str,
        start: Instant,
        result: Result<T>,
    ) -> Result<T> {
        let elapsed = start.elapsed();
        let status = match &result {
            Ok(_) => {
                tracing::debug!(
                    op = op.as_str(),
                    path,
                    status = Status::Success.as_str(),
                    elapsed_us = elapsed.as_micros() as u64,
                    "remote file operation"
                );
                Status::Success
            }
            Err(e) => {
                tracing::error!(
                    op = op.as_str(),
                    path,
                    status = Status::Error.as_str(),
                    kind = e.kind(),
                    elapsed_us = elapsed.as_micros() as u64,
                    "remote file operation failed: {e}"
                );
                Status::Error
            }
        };
        self.recorder.record(op, status, elapsed);
        result
    }
}
