//! JSONL framing for bus requests and replies.
//!
//! Each frame is one JSON document followed by `\n`. A connection carries
//! exactly one request frame and one reply frame.

use std::io::{self, Read, Write};

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Largest request frame the server accepts, newline included.
pub const MAX_REQUEST_BYTES: usize = 64 * 1024;

/// Largest reply frame the client accepts, newline included.
pub(crate) const MAX_REPLY_BYTES: usize = 1024 * 1024;

/// A request to run one hook on the daemon.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BusRequest {
    /// Hook to call, e.g. `Status.getOSPid`.
    pub hook: String,
    /// Parameters handed to every handler of the hook.
    #[serde(default)]
    pub params: Option<Value>,
}

impl BusRequest {
    /// Builds a request for `hook`.
    #[must_use]
    pub fn new(hook: impl Into<String>, params: Option<Value>) -> Self {
        Self {
            hook: hook.into(),
            params,
        }
    }

    /// Parses one request frame.
    ///
    /// # Errors
    ///
    /// Returns a description of the problem when the frame is blank or is not
    /// a valid request document.
    pub fn parse(frame: &[u8]) -> Result<Self, String> {
        let trimmed = trim_trailing_whitespace(frame);
        if trimmed.is_empty() {
            return Err(String::from("empty request line"));
        }
        serde_json::from_slice(trimmed).map_err(|error| format!("malformed request: {error}"))
    }
}

/// The daemon's answer to one [`BusRequest`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BusReply {
    /// The hook ran; `value` is its final result.
    Value {
        /// Result of the dispatch call.
        value: Value,
    },
    /// The request could not be served.
    Error {
        /// Description of the failure.
        message: String,
    },
}

impl BusReply {
    /// Successful reply carrying `value`.
    #[must_use]
    pub fn value(value: Value) -> Self {
        Self::Value { value }
    }

    /// Failure reply carrying `message`.
    #[must_use]
    pub fn error(message: impl Into<String>) -> Self {
        Self::Error {
            message: message.into(),
        }
    }

    /// Parses one reply frame.
    ///
    /// # Errors
    ///
    /// Returns a description of the problem when the frame is not a reply
    /// document.
    pub fn parse(frame: &[u8]) -> Result<Self, String> {
        let trimmed = trim_trailing_whitespace(frame);
        if trimmed.is_empty() {
            return Err(String::from("empty reply line"));
        }
        serde_json::from_slice(trimmed).map_err(|error| format!("malformed reply: {error}"))
    }
}

/// Serialises `message` as one frame and flushes the writer.
pub(crate) fn write_frame<W, T>(writer: &mut W, message: &T) -> io::Result<()>
where
    W: Write,
    T: Serialize,
{
    let mut line = serde_json::to_vec(message).map_err(io::Error::other)?;
    line.push(b'\n');
    writer.write_all(&line)?;
    writer.flush()
}

/// Reads one frame of at most `limit` bytes.
///
/// Returns `Ok(None)` when the peer closed the stream without sending
/// anything. A peer that closes mid-line yields the partial frame.
pub(crate) fn read_frame<R: Read>(reader: &mut R, limit: usize) -> io::Result<Option<Vec<u8>>> {
    let mut buffer = Vec::new();
    let mut chunk = [0_u8; 1024];
    loop {
        let bytes_read = read_chunk_with_retry(reader, &mut chunk)?;
        if bytes_read == 0 {
            return Ok((!buffer.is_empty()).then_some(buffer));
        }

        let received = chunk.get(..bytes_read).unwrap_or_default();
        if let Some(position) = received.iter().position(|byte| *byte == b'\n') {
            buffer.extend_from_slice(received.get(..=position).unwrap_or_default());
            enforce_limit(buffer.len(), limit)?;
            return Ok(Some(buffer));
        }

        buffer.extend_from_slice(received);
        enforce_limit(buffer.len(), limit)?;
    }
}

fn read_chunk_with_retry<R: Read>(reader: &mut R, chunk: &mut [u8]) -> io::Result<usize> {
    loop {
        match reader.read(chunk) {
            Ok(read) => return Ok(read),
            Err(error) if error.kind() == io::ErrorKind::Interrupted => continue,
            Err(error) => return Err(error),
        }
    }
}

fn enforce_limit(size: usize, limit: usize) -> io::Result<()> {
    if size > limit {
        return Err(io::Error::new(
            io::ErrorKind::InvalidData,
            format!("frame exceeds maximum size of {limit} bytes"),
        ));
    }
    Ok(())
}

fn trim_trailing_whitespace(bytes: &[u8]) -> &[u8] {
    let end = bytes
        .iter()
        .rposition(|byte| !byte.is_ascii_whitespace())
        .map_or(0, |position| position + 1);
    bytes.get(..end).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use serde_json::json;
    use std::io::Cursor;

    #[test]
    fn requests_serialise_as_single_lines() {
        let mut output = Vec::new();
        write_frame(&mut output, &BusRequest::new("Status.getOSPid", None)).expect("write");
        assert_eq!(output, b"{\"hook\":\"Status.getOSPid\",\"params\":null}\n");
    }

    #[test]
    fn requests_without_params_parse() {
        let request = BusRequest::parse(b"{\"hook\":\"Plugins.reload\"}\n").expect("parse");
        assert_eq!(request, BusRequest::new("Plugins.reload", None));
    }

    #[rstest]
    #[case::value(b"{\"kind\":\"value\",\"value\":4242}\n".as_slice(), BusReply::value(json!(4242)))]
    #[case::error(
        b"{\"kind\":\"error\",\"message\":\"boom\"}".as_slice(),
        BusReply::error("boom")
    )]
    fn replies_parse(#[case] frame: &[u8], #[case] expected: BusReply) {
        assert_eq!(BusReply::parse(frame), Ok(expected));
    }

    #[rstest]
    #[case::blank(b"  \n".as_slice())]
    #[case::not_json(b"pid please\n".as_slice())]
    #[case::unknown_kind(b"{\"kind\":\"exit\",\"status\":0}\n".as_slice())]
    fn malformed_replies_are_rejected(#[case] frame: &[u8]) {
        assert!(BusReply::parse(frame).is_err());
    }

    #[test]
    fn read_frame_stops_at_the_first_newline() {
        let mut input = Cursor::new(b"{\"hook\":\"a\"}\n{\"hook\":\"b\"}\n".to_vec());
        let frame = read_frame(&mut input, MAX_REQUEST_BYTES)
            .expect("read")
            .expect("frame");
        assert_eq!(frame, b"{\"hook\":\"a\"}\n");
    }

    #[test]
    fn read_frame_reports_closed_streams() {
        let mut input = Cursor::new(Vec::new());
        assert!(read_frame(&mut input, MAX_REQUEST_BYTES).expect("read").is_none());
    }

    #[test]
    fn read_frame_enforces_the_size_limit() {
        let mut input = Cursor::new(vec![b'x'; 4096]);
        let error = read_frame(&mut input, 1024).expect_err("oversized frame");
        assert_eq!(error.kind(), io::ErrorKind::InvalidData);
    }
}
