use std::sync::Arc;
use std::time::{Instant, SystemTime};
use tokio::io::AsyncReadExt;

use super::reader::{self, FormatReader, FormatToken};
use crate::error::{FileError, Result};
use crate::instrument::{Instrumentation, Operation};
use crate::session::TransferSession;

/// Reference point for [`RemoteFile::seek`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum Whence {
    Start = 0,
    Current = 1,
    End = 2,
}

impl TryFrom<i32> for Whence {
    type Error = FileError;

    fn try_from(value: i32) -> Result<Self> {
        match value {
            0 => Ok(Whence::Start),
            1 => Ok(Whence::Current),
            2 => Ok(Whence::End),
            other => Err(FileError::invalid(format!("unrecognized whence {other}"))),
        }
    }
}

impl From<Whence> for i32 {
    fn from(whence: Whence) -> Self {
        whence as i32
    }
}

/// Random-access handle on a remote file
///
/// The handle owns a path and a logical offset. Every read or write opens
/// a fresh stream at the requested offset and drops it before returning,
/// so nothing stays open between calls. The remote size is never cached:
/// [`seek`](Self::seek) asks the session each time.
///
/// A handle is not meant to be shared between tasks; callers serialize
/// access themselves.
pub struct RemoteFile<S: TransferSession> {
    session: Arc<S>,
    path: String,
    offset: u64,
    modified: Option<SystemTime>,
    instrumentation: Instrumentation,
}

impl<S: TransferSession> RemoteFile<S> {
    pub(crate) fn new(
        session: Arc<S>,
        path: String,
        modified: Option<SystemTime>,
        instrumentation: Instrumentation,
    ) -> Self {
        Self {
            session,
            path,
            offset: 0,
            modified,
            instrumentation,
        }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// Last path component
    pub fn name(&self) -> &str {
        self.path.rsplit('/').next().unwrap_or(&self.path)
    }

    /// Current logical offset
    pub fn offset(&self) -> u64 {
        self.offset
    }

    /// Modification time as of the last open or write
    pub fn mod_time(&self) -> Option<SystemTime> {
        self.modified
    }

    /// Current remote size, queried fresh
    pub async fn size(&self) -> Result<u64> {
        let start = Instant::now();
        let result = self.session.file_size(&self.path).await;
        self.instrumentation.observe(Operation::Stat, &self.path, start, result)
    }

    /// Read up to `buf.len()` bytes at the current offset and advance it
    /// by the number of bytes read.
    pub async fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        let start = Instant::now();
        let result = self.read_from(self.offset, buf).await;
        if let Ok(n) = result {
            self.offset += n as u64;
        }
        self.instrumentation.observe(Operation::Read, &self.path, start, result)
    }

    /// Read up to `buf.len()` bytes at `offset` without moving the handle
    pub async fn read_at(&self, buf: &mut [u8], offset: u64) -> Result<usize> {
        let start = Instant::now();
        let result = self.read_from(offset, buf).await;
        self.instrumentation.observe(Operation::ReadAt, &self.path, start, result)
    }

    /// Store `buf` at the current offset and advance past it
    pub async fn write(&mut self, buf: &[u8]) -> Result<usize> {
        let start = Instant::now();
        let result = self.write_to(self.offset, buf).await;
        if let Ok(n) = result {
            self.offset += n as u64;
        }
        self.instrumentation.observe(Operation::Write, &self.path, start, result)
    }

    /// Store `buf` at `offset` without moving the handle
    pub async fn write_at(&mut self, buf: &[u8], offset: u64) -> Result<usize> {
        let start = Instant::now();
        let result = self.write_to(offset, buf).await;
        self.instrumentation.observe(Operation::WriteAt, &self.path, start, result)
    }

    /// Move the offset relative to `whence` (see [`Whence`]).
    ///
    /// The target must land in `[0, size]` of the freshly queried remote
    /// size. Out-of-range targets are rejected, never clamped. On any
    /// error no position is returned and the stored offset is unchanged.
    pub async fn seek(&mut self, offset: i64, whence: i32) -> Result<u64> {
        let start = Instant::now();
        let result = self.seek_target(offset, whence).await;
        if let Ok(target) = result {
            self.offset = target;
        }
        self.instrumentation.observe(Operation::Seek, &self.path, start, result)
    }

    /// Open a sequential reader suited to the file's format.
    ///
    /// Choosing the single-object strategy rewinds the handle to offset 0.
    pub async fn read_all(&mut self) -> Result<FormatReader> {
        let start = Instant::now();
        let result = reader::open_reader(self.session.as_ref(), &self.path, self.offset).await;
        if let Ok(r) = &result {
            if r.format() == FormatToken::Object {
                self.offset = 0;
            }
        }
        self.instrumentation.observe(Operation::ReadAll, &self.path, start, result)
    }

    /// Release the handle
    pub async fn close(self) -> Result<()> {
        let start = Instant::now();
        self.instrumentation.observe(Operation::Close, &self.path, start, Ok(()))
    }

    async fn read_from(&self, offset: u64, buf: &mut [u8]) -> Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }

        let mut stream = self.session.retrieve_from(&self.path, offset).await?;
        let mut filled = 0;
        while filled < buf.len() {
            let n = stream.read(&mut buf[filled..]).await?;
            if n == 0 {
                break;
            }
            filled += n;
        }
        Ok(filled)
    }

    async fn write_to(&mut self, offset: u64, buf: &[u8]) -> Result<usize> {
        let mut data = buf;
        self.session.store_from(&self.path, &mut data, offset).await?;

        match self.session.modification_time(&self.path).await {
            Ok(t) => self.modified = Some(t),
            Err(e) => tracing::warn!("Failed to refresh modification time of {}: {}", self.path, e),
        }
        Ok(buf.len())
    }

    async fn seek_target(&self, offset: i64, whence: i32) -> Result<u64> {
        let whence = Whence::try_from(whence)?;
        let size = self.session.file_size(&self.path).await?;

        let base = match whence {
            Whence::Start => 0,
            Whence::Current => self.offset as i128,
            Whence::End => size as i128,
        };
        let target = base + offset as i128;
        if target < 0 || target > size as i128 {
            return Err(FileError::OutOfRange { target, size });
        }
        Ok(target as u64)
    }
}
