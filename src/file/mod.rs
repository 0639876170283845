//! Remote file handles and the readers built on top of them.
//!
//! - [`handle`]: [`RemoteFile`], the seek/read/write state machine
//! - [`reader`]: format classification and the three sequential readers
//! - `json`: lookahead and value framing used by the JSON readers

mod handle;
mod json;
mod reader;

pub use handle::{RemoteFile, Whence};
pub use reader::{
    FormatReader, FormatToken, JSON_EXTENSION, JsonArrayReader, JsonObjectReader, LineReader,
};
