//! C1: the DAP framed-message codec.
//!
//! Wire format:
//!
//! ```text
//! Content-Length: <decimal bytes>\r\n
//! <optional additional headers>\r\n
//! \r\n
//! <JSON payload, exactly that many bytes, UTF-8>
//! ```
//!
//! The decoder operates on raw bytes end to end so that multi-byte UTF-8 payloads (file
//! paths, variable values) never get confused with character counts. It is fed
//! incrementally: `feed` appends bytes, `try_parse` pulls the next complete message (or
//! `None` if more data is needed), and a malformed header block is discarded so parsing
//! resynchronizes at the next recognizable header rather than wedging the stream.

use super::types::Message;
use crate::{Error, Result};

const HEADER_TERMINATOR: &[u8] = b"\r\n\r\n";

#[derive(Debug, Default)]
pub struct DapCodec {
    buffer: Vec<u8>,
}

impl DapCodec {
    pub fn new() -> Self {
        Self { buffer: Vec::new() }
    }

    /// Append newly-read bytes to the internal buffer.
    pub fn feed(&mut self, bytes: &[u8]) {
        self.buffer.extend_from_slice(bytes);
    }

    /// Pull the next complete message out of the buffer, if one is available.
    ///
    /// Returns `Ok(None)` when more bytes are needed. A body that fails to parse as JSON
    /// is a fatal codec error (the stream is considered corrupted past this point).
    pub fn try_parse(&mut self) -> Result<Option<Message>> {
        loop {
            let Some(header_end) = find_subslice(&self.buffer, HEADER_TERMINATOR) else {
                // No full header block buffered yet. Bound the search: if we already
                // have an implausible amount of header-only data, something is wrong,
                // but we don't fail here -- just wait for more bytes or a resync below.
                return Ok(None);
            };

            let header_bytes = &self.buffer[..header_end];
            let header_str = String::from_utf8_lossy(header_bytes);

            match parse_content_length(&header_str) {
                Some(content_length) => {
                    let body_start = header_end + HEADER_TERMINATOR.len();
                    let body_end = body_start + content_length;

                    if self.buffer.len() < body_end {
                        // Body not fully buffered yet.
                        return Ok(None);
                    }

                    let body = &self.buffer[body_start..body_end];
                    let text = std::str::from_utf8(body)
                        .map_err(|e| Error::Dap(format!("Invalid UTF-8 in DAP body: {}", e)))?;
                    let message: Message = serde_json::from_str(text).map_err(|e| {
                        Error::Dap(format!("Malformed DAP JSON body: {}", e))
                    })?;

                    self.buffer.drain(..body_end);
                    return Ok(Some(message));
                }
                None => {
                    // Malformed header block (missing or non-numeric Content-Length).
                    // Discard it and resynchronize at the next header terminator.
                    self.buffer.drain(..header_end + HEADER_TERMINATOR.len());
                    continue;
                }
            }
        }
    }

    /// Drain every message currently parseable from the buffer.
    pub fn parse_all(&mut self) -> Result<Vec<Message>> {
        let mut messages = Vec::new();
        while let Some(msg) = self.try_parse()? {
            messages.push(msg);
        }
        Ok(messages)
    }
}

/// Find `Content-Length` case-insensitively among the header lines; every other header is
/// ignored. Returns `None` if missing or non-numeric.
fn parse_content_length(headers: &str) -> Option<usize> {
    headers.lines().find_map(|line| {
        let (name, value) = line.split_once(':')?;
        if name.trim().eq_ignore_ascii_case("content-length") {
            value.trim().parse::<usize>().ok()
        } else {
            None
        }
    })
}

fn find_subslice(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}

/// Encode a message as a `Content-Length`-framed byte buffer.
pub fn encode(message: &Message) -> Result<Vec<u8>> {
    let body = serde_json::to_vec(message)
        .map_err(|e| Error::Dap(format!("Failed to serialize DAP message: {}", e)))?;
    let header = format!("Content-Length: {}\r\n\r\n", body.len());
    let mut out = Vec::with_capacity(header.len() + body.len());
    out.extend_from_slice(header.as_bytes());
    out.extend_from_slice(&body);
    Ok(out)
}
