//! SSE line framing and `data:` payload parsing.
//!
//! The agent backend streams one JSON event per `data: ` line. Chunks from
//! the transport can split a line anywhere, including inside a multi-byte
//! character, so lines are framed on raw bytes before they are decoded.

use bytes::{Buf, BytesMut};
use tokio_util::codec::Decoder;

use crate::error::AgentError;
use crate::events::BaseEvent;

/// Prefix of an SSE data field.
pub const DATA_PREFIX: &str = "data: ";

/// Splits a byte buffer into complete `\n`-terminated lines.
///
/// Whatever follows the last newline stays in the buffer until more bytes
/// arrive. At end of stream that partial line is dropped, never parsed.
#[derive(Debug, Default, Clone, Copy)]
pub struct SseLineDecoder {
    /// Bytes already scanned without finding a newline.
    scanned: usize,
}

impl SseLineDecoder {
    /// Create a decoder with nothing scanned.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl Decoder for SseLineDecoder {
    type Item = String;
    type Error = AgentError;

    fn decode(&mut self, buf: &mut BytesMut) -> Result<Option<String>, AgentError> {
        let Some(offset) = buf[self.scanned..].iter().position(|b| *b == b'\n') else {
            self.scanned = buf.len();
            return Ok(None);
        };

        let end = self.scanned + offset;
        self.scanned = 0;

        let line = buf.split_to(end);
        buf.advance(1);
        Ok(Some(String::from_utf8_lossy(&line).into_owned()))
    }

    fn decode_eof(&mut self, buf: &mut BytesMut) -> Result<Option<String>, AgentError> {
        if let Some(line) = self.decode(buf)? {
            return Ok(Some(line));
        }
        // Unterminated trailing bytes are not an event.
        buf.clear();
        self.scanned = 0;
        Ok(None)
    }
}

/// Parse one complete line.
///
/// Returns `None` for lines that carry no event (no `data: ` prefix) and
/// `Some(Err(_))` for a data line whose payload is not a valid event.
pub fn parse_line(line: &str) -> Option<Result<BaseEvent, serde_json::Error>> {
    let payload = line.strip_prefix(DATA_PREFIX)?;
    Some(serde_json::from_str(payload))
}
