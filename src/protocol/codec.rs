//! Protocol codec
//!
//! Encoding of requests and decoding of replies.
//!
//! ## Wire Format
//!
//! ### Request (multi-bulk array)
//! ```text
//! *<argc>\r\n
//! $<len(arg0)>\r\n<arg0>\r\n
//! ...
//! $<len(argN)>\r\n<argN>\r\n
//! ```
//!
//! ### Reply
//! ```text
//! +<status>\r\n
//! -<error>\r\n
//! :<integer>\r\n
//! $<len>\r\n<payload>\r\n        ($-1\r\n is nil)
//! *<count>\r\n<count replies>    (*-1\r\n is nil)
//! ```

use std::io::{self, BufRead, Cursor, Read, Write};

use bytes::{BufMut, Bytes, BytesMut};

use super::{Command, Pipeline, ResultValue};
use crate::error::{ClientError, ParsingFailure, Result};

/// Line terminator used by every frame
pub const CRLF: &[u8] = b"\r\n";

/// Largest bulk payload or array length accepted (512 MB)
pub const MAX_BULK_LEN: usize = 512 * 1024 * 1024;

/// Deepest array nesting accepted
pub const MAX_DEPTH: usize = 512;

// =============================================================================
// Command Encoding
// =============================================================================

/// Encode a command to bytes
///
/// Fails only for a command without any argument.
pub fn encode_command(command: &Command) -> Result<Bytes> {
    let mut buf = BytesMut::with_capacity(command.encoded_len());
    encode_into(command, &mut buf)?;
    Ok(buf.freeze())
}

/// Encode every command of a pipeline back to back
pub fn encode_pipeline(pipeline: &Pipeline) -> Result<Bytes> {
    if pipeline.is_empty() {
        return Err(ClientError::message("cannot encode an empty pipeline"));
    }

    let capacity = pipeline.commands().iter().map(Command::encoded_len).sum();
    let mut buf = BytesMut::with_capacity(capacity);
    for command in pipeline.commands() {
        encode_into(command, &mut buf)?;
    }
    Ok(buf.freeze())
}

fn encode_into(command: &Command, buf: &mut BytesMut) -> Result<()> {
    if command.is_empty() {
        return Err(ClientError::message("cannot encode an empty command"));
    }

    put_header(buf, b'*', command.len());
    for arg in command.as_args() {
        put_header(buf, b'$', arg.len());
        buf.put_slice(arg);
        buf.put_slice(CRLF);
    }
    Ok(())
}

fn put_header(buf: &mut BytesMut, marker: u8, len: usize) {
    buf.put_u8(marker);
    buf.put_slice(len.to_string().as_bytes());
    buf.put_slice(CRLF);
}

/// Write a command to a stream
pub fn write_command<W: Write>(writer: &mut W, command: &Command) -> Result<()> {
    let bytes = encode_command(command)?;
    writer.write_all(&bytes)?;
    writer.flush()?;
    Ok(())
}

// =============================================================================
// Reply Decoding
// =============================================================================

/// Decode one reply from a byte slice
///
/// Trailing bytes after the first complete reply are ignored. Failures are
/// the same as for [`read_value`], with a truncated slice always reported as
/// [`ParsingFailure::UnexpectedEof`].
pub fn decode(bytes: &[u8]) -> Result<ResultValue> {
    let mut cursor = Cursor::new(bytes);
    match read_value(&mut cursor) {
        Err(ClientError::Io(ref e)) if e.kind() == io::ErrorKind::UnexpectedEof => {
            Err(ParsingFailure::UnexpectedEof.into())
        }
        other => other,
    }
}

/// Read exactly one reply from a stream
///
/// Blocks until a complete reply is received or an error occurs. A stream
/// that ends before the first byte of the reply is reported as an I/O error
/// (the peer closed the connection); one that ends inside a reply is a
/// [`ParsingFailure::UnexpectedEof`].
///
/// ## Errors
/// - [`ClientError::Parse`] for malformed framing or content
/// - [`ClientError::Utf8`] for a status or error line that is not UTF-8
/// - [`ClientError::Io`] for transport failures
///
/// When a failure leaves the framing intact ([`ClientError::is_fatal`] is
/// false) the whole reply has been consumed, including the remaining
/// elements of an array, and the next call starts on the next reply.
pub fn read_value<R: BufRead>(reader: &mut R) -> Result<ResultValue> {
    let mut line = Vec::new();
    if reader.read_until(b'\n', &mut line)? == 0 {
        return Err(io::Error::new(
            io::ErrorKind::UnexpectedEof,
            "connection closed before a reply was received",
        )
        .into());
    }
    parse_reply(reader, line, 0)
}

/// Read `count` consecutive replies (one per pipelined command)
///
/// A reply that fails without breaking the framing does not stop the read:
/// the rest are still consumed and the first such failure is returned.
pub fn read_values<R: BufRead>(reader: &mut R, count: usize) -> Result<Vec<ResultValue>> {
    let mut values = Vec::with_capacity(count);
    let mut first_error = None;
    for _ in 0..count {
        match read_value(reader) {
            Ok(value) => values.push(value),
            Err(e) if !e.is_fatal() => {
                first_error.get_or_insert(e);
            }
            Err(e) => return Err(e),
        }
    }
    match first_error {
        Some(e) => Err(e),
        None => Ok(values),
    }
}

/// Read a nested reply, where end of stream is always a parsing failure
fn read_nested<R: BufRead>(reader: &mut R, depth: usize) -> Result<ResultValue> {
    let mut line = Vec::new();
    reader.read_until(b'\n', &mut line)?;
    parse_reply(reader, line, depth)
}

fn parse_reply<R: BufRead>(reader: &mut R, mut line: Vec<u8>, depth: usize) -> Result<ResultValue> {
    strip_terminator(&mut line)?;

    let (marker, body) = match line.split_first() {
        Some((marker, body)) => (*marker, body),
        None => return Err(ParsingFailure::MalformedTerminator.into()),
    };

    match marker {
        b'+' => Ok(ResultValue::Status(std::str::from_utf8(body)?.to_string())),
        b'-' => Ok(ResultValue::Error(std::str::from_utf8(body)?.to_string())),
        b':' => parse_integer(body).map(ResultValue::Integer),
        b'$' => match parse_length(body, '$')? {
            None => Ok(ResultValue::Nil),
            Some(len) => read_bulk(reader, len),
        },
        b'*' => match parse_length(body, '*')? {
            None => Ok(ResultValue::Nil),
            Some(count) => read_array(reader, count, depth),
        },
        other => Err(ParsingFailure::UnexpectedLeadingByte(other).into()),
    }
}

/// Read the `count` elements of an array at nesting level `depth`
///
/// An element that fails without breaking the framing does not stop the
/// read, so the array is always consumed to its end before the first such
/// failure is returned.
fn read_array<R: BufRead>(reader: &mut R, count: usize, depth: usize) -> Result<ResultValue> {
    if depth >= MAX_DEPTH {
        return Err(ParsingFailure::TooDeep { max: MAX_DEPTH }.into());
    }

    let mut items = Vec::with_capacity(count.min(1024));
    let mut first_error = None;
    for _ in 0..count {
        match read_nested(reader, depth + 1) {
            Ok(item) => items.push(item),
            Err(e) if !e.is_fatal() => {
                first_error.get_or_insert(e);
            }
            Err(e) => return Err(e),
        }
    }

    match first_error {
        Some(e) => Err(e),
        None => Ok(ResultValue::Array(items)),
    }
}

/// Check and remove the CRLF at the end of a line
fn strip_terminator(line: &mut Vec<u8>) -> Result<()> {
    if line.last() != Some(&b'\n') {
        // read_until stopped without finding '\n': the stream ended
        return Err(ParsingFailure::UnexpectedEof.into());
    }
    if line.len() < 2 || line[line.len() - 2] != b'\r' {
        return Err(ParsingFailure::MalformedTerminator.into());
    }
    line.truncate(line.len() - 2);
    Ok(())
}

fn parse_integer(body: &[u8]) -> Result<i64> {
    std::str::from_utf8(body)
        .ok()
        .and_then(|s| s.parse::<i64>().ok())
        .ok_or_else(|| ParsingFailure::InvalidInteger(String::from_utf8_lossy(body).into_owned()).into())
}

/// Parse a bulk or array length. `-1` means nil.
fn parse_length(body: &[u8], marker: char) -> Result<Option<usize>> {
    if body.is_empty() {
        return Err(ParsingFailure::TruncatedLength(marker).into());
    }

    let invalid = || ParsingFailure::InvalidLength(String::from_utf8_lossy(body).into_owned());
    let declared = std::str::from_utf8(body)
        .ok()
        .and_then(|s| s.parse::<i64>().ok())
        .ok_or_else(invalid)?;

    match declared {
        -1 => Ok(None),
        n if n < 0 => Err(invalid().into()),
        n if n as u64 > MAX_BULK_LEN as u64 => Err(ParsingFailure::Oversized {
            declared: n,
            max: MAX_BULK_LEN,
        }
        .into()),
        n => Ok(Some(n as usize)),
    }
}

/// Read a bulk payload of exactly `len` bytes plus its terminator
fn read_bulk<R: BufRead>(reader: &mut R, len: usize) -> Result<ResultValue> {
    let mut payload = vec![0u8; len];
    read_exact_or_eof(reader, &mut payload)?;

    let mut terminator = [0u8; 2];
    read_exact_or_eof(reader, &mut terminator)?;
    if &terminator != b"\r\n" {
        return Err(ParsingFailure::MalformedTerminator.into());
    }

    Ok(ResultValue::Bulk(Bytes::from(payload)))
}

fn read_exact_or_eof<R: Read>(reader: &mut R, buf: &mut [u8]) -> Result<()> {
    match reader.read_exact(buf) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => Err(ParsingFailure::UnexpectedEof.into()),
        Err(e) => Err(e.into()),
    }
}
