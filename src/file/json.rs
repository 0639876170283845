//! Lookahead and value framing over a buffered JSON byte stream.
//!
//! The readers never hand `serde_json` an open-ended stream. Instead they
//! frame exactly one top-level value (or one array element) out of the
//! stream, then decode that slice. Classification peeks at the buffered
//! lead byte without consuming it, so the primary cursor is untouched.

use serde::de::{Error as _, IgnoredAny};
use std::io;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};

/// Shape of the first top-level JSON token
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Lead {
    Array,
    Value,
}

/// Skip JSON whitespace and return the next byte without consuming it.
///
/// `None` means the stream ended.
pub(crate) async fn peek_non_ws<R>(reader: &mut R) -> io::Result<Option<u8>>
where
    R: AsyncBufRead + Unpin,
{
    loop {
        let buf = reader.fill_buf().await?;
        if buf.is_empty() {
            return Ok(None);
        }
        match buf.iter().position(|b| !is_ws(*b)) {
            Some(pos) => {
                let byte = buf[pos];
                reader.consume(pos);
                return Ok(Some(byte));
            }
            None => {
                let len = buf.len();
                reader.consume(len);
            }
        }
    }
}

/// Classify the leading token of a JSON document.
///
/// Only whitespace is consumed; the lead byte stays in the buffer.
pub(crate) async fn peek_lead<R>(reader: &mut R) -> crate::Result<Lead>
where
    R: AsyncBufRead + Unpin,
{
    match peek_non_ws(reader).await? {
        None => Err(syntax_error(b"").into()),
        Some(b'[') => Ok(Lead::Array),
        Some(b) if starts_value(b) => Ok(Lead::Value),
        Some(b) => Err(syntax_error(&[b]).into()),
    }
}

/// One framed value; `complete` is false when the stream ended mid-value.
pub(crate) struct Framed {
    pub bytes: Vec<u8>,
    pub complete: bool,
}

/// Read the bytes of exactly one JSON value, leaving any trailing
/// separator in the stream.
pub(crate) async fn read_value<R>(reader: &mut R) -> io::Result<Framed>
where
    R: AsyncBufRead + Unpin,
{
    let mut framer = Framer::default();
    if peek_non_ws(reader).await?.is_none() {
        return Ok(Framed {
            bytes: Vec::new(),
            complete: false,
        });
    }

    loop {
        let buf = reader.fill_buf().await?;
        if buf.is_empty() {
            // Scalars end at EOF; containers and strings do not.
            let complete = framer.kind == Some(Kind::Scalar);
            return Ok(Framed {
                bytes: framer.out,
                complete,
            });
        }

        let mut end = None;
        for (i, b) in buf.iter().enumerate() {
            match framer.feed(*b) {
                Step::Continue => {}
                Step::DoneIncluding => {
                    end = Some((i + 1, i + 1));
                    break;
                }
                Step::DoneBefore => {
                    end = Some((i, i));
                    break;
                }
            }
        }

        match end {
            Some((take, consume)) => {
                framer.out.extend_from_slice(&buf[..take]);
                reader.consume(consume);
                return Ok(Framed {
                    bytes: framer.out,
                    complete: true,
                });
            }
            None => {
                let len = buf.len();
                framer.out.extend_from_slice(buf);
                reader.consume(len);
            }
        }
    }
}

/// Build a `serde_json` syntax error for `bytes` the way the decoder
/// itself would report it.
pub(crate) fn syntax_error(bytes: &[u8]) -> serde_json::Error {
    match serde_json::from_slice::<IgnoredAny>(bytes) {
        Err(e) => e,
        Ok(_) => serde_json::Error::custom("unexpected JSON token"),
    }
}

fn is_ws(b: u8) -> bool {
    matches!(b, b' ' | b'\t' | b'\n' | b'\r')
}

fn starts_value(b: u8) -> bool {
    matches!(b, b'{' | b'"' | b'-' | b'0'..=b'9' | b't' | b'f' | b'n')
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Kind {
    Container,
    String,
    Scalar,
}

enum Step {
    Continue,
    DoneIncluding,
    DoneBefore,
}

#[derive(Default)]
struct Framer {
    out: Vec<u8>,
    kind: Option<Kind>,
    depth: usize,
    in_string: bool,
    escaped: bool,
}

impl Framer {
    fn feed(&mut self, b: u8) -> Step {
        let kind = match self.kind {
            Some(kind) => kind,
            None => {
                let kind = match b {
                    b'{' | b'[' => Kind::Container,
                    b'"' => Kind::String,
                    _ => Kind::Scalar,
                };
                self.kind = Some(kind);
                match kind {
                    Kind::Container => self.depth = 1,
                    Kind::String => self.in_string = true,
                    Kind::Scalar => {}
                }
                return Step::Continue;
            }
        };

        if self.in_string {
            if self.escaped {
                self.escaped = false;
            } else if b == b'\\' {
                self.escaped = true;
            } else if b == b'"' {
                self.in_string = false;
                if kind == Kind::String {
                    return Step::DoneIncluding;
                }
            }
            return Step::Continue;
        }

        match kind {
            Kind::Scalar => {
                if is_ws(b) || matches!(b, b',' | b']' | b'}') {
                    Step::DoneBefore
                } else {
                    Step::Continue
                }
            }
            Kind::Container => match b {
                b'"' => {
                    self.in_string = true;
                    Step::Continue
                }
                b'{' | b'[' => {
                    self.depth += 1;
                    Step::Continue
                }
                b'}' | b']' => {
                    self.depth -= 1;
                    if self.depth == 0 {
                        Step::DoneIncluding
                    } else {
                        Step::Continue
                    }
                }
                _ => Step::Continue,
            },
            Kind::String => Step::Continue,
        }
    }
}
