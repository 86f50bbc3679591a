//! Wire Codec
//!
//! Lossless conversion between [`Command`] token lists and wire lines.
//!
//! # Wire Format
//!
//! ```text
//! <token> SP <token> SP ... <token> LF
//! ```
//!
//! Each token is percent-encoded independently; tokens are joined by a
//! single ASCII space. [`encode`] does not append the trailing newline;
//! framing belongs to the transport. A carriage return immediately before
//! the newline is treated as part of the line terminator, so the engine may
//! emit either LF or CRLF.
//!
//! # Escaping
//!
//! Tokens are escaped with the full component set: every byte except ASCII
//! alphanumerics and `- _ . ! ~ * ' ( )` becomes `%XX`. The engine decodes
//! with a query-unescape that also folds `+` into a space, so `+` must
//! always travel escaped; the component set guarantees that. Decoding is
//! strict to match the engine: a `%` not followed by two hex digits is a
//! [`DecodeError`], not payload.

use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};

use crate::command::Command;
use crate::error::DecodeError;

/// Escape set for one wire token: everything except ASCII alphanumerics
/// and `- _ . ! ~ * ' ( )`.
const WIRE_TOKEN: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

/// Minimum buffer capacity for [`LineDecoder`].
const MIN_BUFFER_CAPACITY: usize = 4096;

/// Encode a command as one wire line (without the trailing newline).
#[must_use]
pub fn encode(command: &Command) -> String {
    command
        .tokens()
        .iter()
        .map(|token| utf8_percent_encode(token, WIRE_TOKEN).to_string())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Decode one wire line (already stripped of its terminator) into a command.
///
/// Splits on one-or-more whitespace characters and percent-decodes each
/// token independently. A line of pure whitespace decodes to an empty
/// command, which callers should skip.
///
/// # Errors
///
/// Returns [`DecodeError`] if a token contains a malformed percent escape
/// or decodes to invalid UTF-8.
pub fn decode_line(line: &str) -> Result<Command, DecodeError> {
    line.split_whitespace()
        .map(decode_token)
        .collect::<Result<Vec<_>, _>>()
        .map(Command::from_tokens)
}

/// Strictly percent-decode a single token.
fn decode_token(token: &str) -> Result<String, DecodeError> {
    validate_escapes(token)?;
    percent_decode_str(token)
        .decode_utf8()
        .map(|cow| cow.into_owned())
        .map_err(|_| DecodeError::InvalidUtf8)
}

/// Reject tokens where `%` is not followed by exactly two hex digits.
///
/// The percent-decoder itself is lenient and would pass such sequences
/// through as literal bytes; the engine's unescape rejects them, and the
/// two sides must agree.
fn validate_escapes(token: &str) -> Result<(), DecodeError> {
    let bytes = token.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' {
            let valid = i + 2 < bytes.len()
                && bytes[i + 1].is_ascii_hexdigit()
                && bytes[i + 2].is_ascii_hexdigit();
            if !valid {
                return Err(DecodeError::InvalidEscape {
                    token: token.to_string(),
                });
            }
            i += 3;
        } else {
            i += 1;
        }
    }
    Ok(())
}

/// Decoder state machine for streaming line framing.
///
/// Buffers incoming bytes and yields complete lines, normalizing CRLF and
/// LF terminators. Mirrors the push/decode shape of a length-prefixed frame
/// decoder, but the boundary here is the newline byte.
#[derive(Debug)]
pub struct LineDecoder {
    buffer: Vec<u8>,
    /// Position we have consumed up to.
    read_pos: usize,
}

impl Default for LineDecoder {
    fn default() -> Self {
        Self::new()
    }
}

impl LineDecoder {
    /// Create a new decoder with default buffer capacity.
    #[must_use]
    pub fn new() -> Self {
        Self {
            buffer: Vec::with_capacity(MIN_BUFFER_CAPACITY),
            read_pos: 0,
        }
    }

    /// Append bytes to the buffer.
    pub fn push(&mut self, data: &[u8]) {
        // Compact the buffer once a meaningful prefix has been consumed
        if self.read_pos > self.buffer.len() / 2 && self.read_pos > MIN_BUFFER_CAPACITY {
            self.buffer.drain(..self.read_pos);
            self.read_pos = 0;
        }
        self.buffer.extend_from_slice(data);
    }

    /// Number of unconsumed bytes in the buffer.
    #[must_use]
    pub fn available(&self) -> usize {
        self.buffer.len() - self.read_pos
    }

    /// Try to extract the next complete line.
    ///
    /// Returns:
    /// - `Ok(Some(line))` if a full line (terminator stripped) is available
    /// - `Ok(None)` if more data is needed
    /// - `Err(DecodeError::InvalidUtf8)` if the line's bytes are not UTF-8;
    ///   the offending line is consumed so decoding can continue
    pub fn next_line(&mut self) -> Result<Option<String>, DecodeError> {
        let Some(offset) = self.buffer[self.read_pos..]
            .iter()
            .position(|&b| b == b'\n')
        else {
            return Ok(None);
        };

        let newline_pos = self.read_pos + offset;
        let mut end = newline_pos;
        if end > self.read_pos && self.buffer[end - 1] == b'\r' {
            end -= 1;
        }

        let line = std::str::from_utf8(&self.buffer[self.read_pos..end])
            .map(str::to_string)
            .map_err(|_| DecodeError::InvalidUtf8);

        // Consume past the newline even when the line was garbage
        self.read_pos = newline_pos + 1;
        line.map(Some)
    }

    /// Clear the buffer.
    pub fn clear(&mut self) {
        self.buffer.clear();
        self.read_pos = 0;
    }
}
