//! Format-aware sequential readers.
//!
//! [`open_reader`] picks one of three readers for a remote file:
//!
//! - files without a `.json` suffix get a [`LineReader`]
//! - `.json` files whose first token is `[` get a [`JsonArrayReader`]
//! - any other `.json` file gets a [`JsonObjectReader`] over a stream
//!   reopened from offset 0
//!
//! All three share the `next()` / `scan()` iteration contract through
//! [`FormatReader`]. `next()` never fails: a lookahead error is held back
//! and returned by the following `scan()`.

use serde::de::{DeserializeOwned, Error as _};
use std::any::Any;
use tokio::io::{AsyncBufReadExt, BufReader, Lines};

use super::json::{self, Lead};
use crate::error::{FileError, Result};
use crate::session::{TransferSession, TransferStream};

type Stream = BufReader<TransferStream>;

/// Extension that marks structured content
pub const JSON_EXTENSION: &str = ".json";

/// Content classification fixed when a reader is opened
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormatToken {
    Array,
    Object,
    Text,
}

/// Sequential reader returned by [`RemoteFile::read_all`](crate::RemoteFile::read_all)
pub enum FormatReader {
    JsonArray(JsonArrayReader),
    JsonObject(JsonObjectReader),
    Lines(LineReader),
}

impl FormatReader {
    pub fn format(&self) -> FormatToken {
        match self {
            FormatReader::JsonArray(_) => FormatToken::Array,
            FormatReader::JsonObject(_) => FormatToken::Object,
            FormatReader::Lines(_) => FormatToken::Text,
        }
    }

    /// Report whether another record can be scanned
    pub async fn next(&mut self) -> bool {
        match self {
            FormatReader::JsonArray(r) => r.next().await,
            FormatReader::JsonObject(r) => r.next(),
            FormatReader::Lines(r) => r.next().await,
        }
    }

    /// Decode the current record into `target`.
    ///
    /// Line readers only accept a `String` target; anything else fails
    /// with [`FileError::InvalidArgument`] and leaves `target` untouched.
    pub async fn scan<T>(&mut self, target: &mut T) -> Result<()>
    where
        T: DeserializeOwned + Any,
    {
        match self {
            FormatReader::JsonArray(r) => r.scan(target).await,
            FormatReader::JsonObject(r) => r.scan(target).await,
            FormatReader::Lines(r) => match (target as &mut dyn Any).downcast_mut::<String>() {
                Some(line) => r.scan(line),
                None => Err(FileError::invalid(format!(
                    "line reader requires a String target, got {}",
                    std::any::type_name::<T>()
                ))),
            },
        }
    }
}

pub(crate) fn is_structured(path: &str) -> bool {
    path.ends_with(JSON_EXTENSION)
}

/// Classify `path` and build the matching reader.
///
/// Classification streams from `offset`; the object strategy discards that
/// stream and reopens from the start of the file.
pub(crate) async fn open_reader<S>(session: &S, path: &str, offset: u64) -> Result<FormatReader>
where
    S: TransferSession + ?Sized,
{
    let mut stream = BufReader::new(session.retrieve_from(path, offset).await?);

    if !is_structured(path) {
        return Ok(FormatReader::Lines(LineReader::new(stream)));
    }

    match json::peek_lead(&mut stream).await? {
        Lead::Array => Ok(FormatReader::JsonArray(JsonArrayReader::new(stream))),
        Lead::Value => {
            drop(stream);
            let fresh = BufReader::new(session.retrieve_from(path, 0).await?);
            Ok(FormatReader::JsonObject(JsonObjectReader::new(fresh)))
        }
    }
}

/// Streams the elements of a top-level JSON array, one per `scan`
pub struct JsonArrayReader {
    stream: Stream,
    /// The opening `[` has been consumed
    opened: bool,
    /// At least one element has been scanned
    started: bool,
    /// A `,` or `]` must come before the next element
    expect_separator: bool,
    done: bool,
    pending: Option<FileError>,
}

impl JsonArrayReader {
    fn new(stream: Stream) -> Self {
        Self {
            stream,
            opened: false,
            started: false,
            expect_separator: false,
            done: false,
            pending: None,
        }
    }

    pub async fn next(&mut self) -> bool {
        if self.done {
            return false;
        }
        if self.pending.is_some() {
            return true;
        }
        match self.advance().await {
            Ok(true) => true,
            Ok(false) => {
                self.done = true;
                false
            }
            Err(e) => {
                self.pending = Some(e);
                true
            }
        }
    }

    pub async fn scan<T: DeserializeOwned>(&mut self, target: &mut T) -> Result<()> {
        if let Some(e) = self.pending.take() {
            self.done = true;
            return Err(e);
        }
        if self.done {
            return Err(FileError::invalid("array reader is exhausted"));
        }
        if (!self.opened || self.expect_separator) && !self.advance().await? {
            self.done = true;
            return Err(FileError::invalid("array reader is exhausted"));
        }

        let framed = json::read_value(&mut self.stream).await?;
        if !framed.complete {
            self.done = true;
        }
        self.started = true;
        self.expect_separator = true;
        *target = serde_json::from_slice(&framed.bytes)?;
        Ok(())
    }

    /// Move past the opening bracket or the separator before the next
    /// element. Returns false once the closing `]` has been consumed.
    async fn advance(&mut self) -> Result<bool> {
        if !self.opened {
            // peek_lead left the `[` in the buffer
            json::peek_non_ws(&mut self.stream).await?;
            self.stream.consume(1);
            self.opened = true;
        }

        if self.expect_separator {
            match json::peek_non_ws(&mut self.stream).await? {
                Some(b',') => {
                    self.stream.consume(1);
                    self.expect_separator = false;
                }
                Some(b']') => {
                    self.stream.consume(1);
                    return Ok(false);
                }
                // Truncated; the next scan reports it
                None => return Ok(true),
                Some(_) => {
                    return Err(serde_json::Error::custom(
                        "expected `,` or `]` after array element",
                    )
                    .into());
                }
            }
        }

        match json::peek_non_ws(&mut self.stream).await? {
            Some(b']') if !self.started => {
                self.stream.consume(1);
                Ok(false)
            }
            Some(b']') => Err(json::syntax_error(b"[1,]").into()),
            _ => Ok(true),
        }
    }
}

/// Decodes a single top-level JSON value in one `scan`
pub struct JsonObjectReader {
    stream: Stream,
    scanned: bool,
}

impl JsonObjectReader {
    fn new(stream: Stream) -> Self {
        Self {
            stream,
            scanned: false,
        }
    }

    pub fn next(&self) -> bool {
        !self.scanned
    }

    pub async fn scan<T: DeserializeOwned>(&mut self, target: &mut T) -> Result<()> {
        if self.scanned {
            return Err(FileError::invalid("object reader is exhausted"));
        }
        self.scanned = true;

        let framed = json::read_value(&mut self.stream).await?;
        *target = serde_json::from_slice(&framed.bytes)?;
        Ok(())
    }
}

/// Yields one line of text per `next` / `scan` pair
///
/// Content must be UTF-8. A line that is not surfaces from `scan` as
/// [`FileError::Decode`] and ends iteration.
pub struct LineReader {
    lines: Lines<Stream>,
    current: Option<String>,
    done: bool,
    pending: Option<FileError>,
}

impl LineReader {
    fn new(stream: Stream) -> Self {
        Self {
            lines: stream.lines(),
            current: None,
            done: false,
            pending: None,
        }
    }

    pub async fn next(&mut self) -> bool {
        if self.done {
            return false;
        }
        if self.pending.is_some() {
            return true;
        }
        match self.lines.next_line().await {
            Ok(Some(line)) => {
                self.current = Some(line);
                true
            }
            Ok(None) => {
                self.current = None;
                self.done = true;
                false
            }
            Err(e) => {
                self.current = None;
                self.pending = Some(line_error(e));
                true
            }
        }
    }

    /// Copy the current line into `target`
    pub fn scan(&mut self, target: &mut String) -> Result<()> {
        if let Some(e) = self.pending.take() {
            self.done = true;
            return Err(e);
        }
        match &self.current {
            Some(line) => {
                target.clear();
                target.push_str(line);
                Ok(())
            }
            None => Err(FileError::invalid("no current line; call next() first")),
        }
    }
}

/// Lines must be UTF-8; anything else is bad content, not a failed transfer
fn line_error(e: std::io::Error) -> FileError {
    if e.kind() == std::io::ErrorKind::InvalidData {
        return FileError::Decode(serde_json::Error::custom(format!("line is not UTF-8: {e}")));
    }
    e.into()
}
