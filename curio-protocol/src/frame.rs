//! Message framing for the line-oriented wire dialect.
//!
//! Outgoing messages are pretty-printed JSON objects followed by a CRLF
//! terminator. Responses carry no length prefix; a response is complete when
//! the accumulated bytes end with the top-level closing brace on its own
//! line, followed by CRLF.

use crate::error::ProtocolError;
use bytes::{Bytes, BytesMut};
use serde::Serialize;

/// Terminator appended to every outgoing message.
pub const MESSAGE_TERMINATOR: &str = "\r\n";

/// Tail that marks a complete response frame.
pub const RESPONSE_TAIL: &[u8] = b"\n}\r\n";

/// Indentation unit for outgoing JSON (eight spaces, matching the tab stops
/// the server uses in its own output).
pub const MESSAGE_INDENT: &[u8] = b"        ";

/// Encodes a message as indented JSON followed by the message terminator.
pub fn encode_message<T: Serialize>(message: &T) -> Result<BytesMut, ProtocolError> {
    let mut payload = Vec::with_capacity(256);
    let formatter = serde_json::ser::PrettyFormatter::with_indent(MESSAGE_INDENT);
    let mut serializer = serde_json::Serializer::with_formatter(&mut payload, formatter);
    message.serialize(&mut serializer)?;

    let mut buf = BytesMut::with_capacity(payload.len() + MESSAGE_TERMINATOR.len());
    buf.extend_from_slice(&payload);
    buf.extend_from_slice(MESSAGE_TERMINATOR.as_bytes());
    Ok(buf)
}

/// Accumulates response bytes until a complete frame is present.
///
/// The tail check always runs against the accumulated buffer, never a single
/// read, so a terminator split across two reads is still detected.
#[derive(Debug)]
pub struct FrameDecoder {
    buffer: BytesMut,
}

impl FrameDecoder {
    pub fn new() -> Self {
        Self {
            buffer: BytesMut::with_capacity(8192),
        }
    }

    /// Appends data to the internal buffer.
    pub fn extend(&mut self, data: &[u8]) {
        self.buffer.extend_from_slice(data);
    }

    /// Takes the complete frame out of the buffer, if one has accumulated.
    pub fn try_frame(&mut self) -> Option<Bytes> {
        if self.buffer.ends_with(RESPONSE_TAIL) {
            Some(self.buffer.split().freeze())
        } else {
            None
        }
    }

    /// Returns the number of bytes currently buffered.
    pub fn buffered(&self) -> usize {
        self.buffer.len()
    }

    /// Clears the internal buffer.
    pub fn clear(&mut self) {
        self.buffer.clear();
    }
}

impl Default for FrameDecoder {
    fn default() -> Self {
        Self::new()
    }
}
