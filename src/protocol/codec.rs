//! Protocol codec
//!
//! Encoding and decoding functions for the wire protocol. All integers are
//! unsigned 32-bit big-endian.
//!
//! ## Wire Format
//!
//! ### Request Format
//! ```text
//! ┌──────────────┬────────────┬───────────┬─────────────┬──────────────┐
//! │ TotalLen (4) │ CmdLen (4) │ Cmd bytes │ DataLen (4) │ Data         │
//! └──────────────┴────────────┴───────────┴─────────────┴──────────────┘
//! ```
//! `TotalLen` counts the whole frame, its own four bytes included.
//!
//! ### Data by Command
//! - get/delete: key_len (4) + key
//! - set:        key_len (4) + key + value_len (4) + value + encoding (4)
//! - ping/keys:  absent, or ignored when present
//!
//! ### Response Format
//! ```text
//! ┌────────────┬──────────────────────────────────────────────┐
//! │ Status (4) │ Body (GET hit / KEYS only)                    │
//! └────────────┴──────────────────────────────────────────────┘
//! ```
//! - GET hit: encoding (4) + value_len (4) + value. The legacy framing drops
//!   `value_len` and the value runs until the connection closes.
//! - KEYS:    count (4) + count × (key_len (4) + key)

use std::io::{Read, Write};

use bytes::{Buf, BufMut, BytesMut};

use super::command::{Command, CommandKind, ErrorCode, Request};
use super::response::{Payload, Response, Status};
use super::value::{Encoding, Value};
use crate::error::{RediError, Result};

/// Size of every length, status and tag field
pub const LEN_SIZE: usize = 4;

/// Default upper bound on a request frame (16 MB)
pub const DEFAULT_MAX_FRAME_SIZE: u32 = 16 * 1024 * 1024;

/// How GET payloads are delimited in responses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ValueFraming {
    /// A value-length field precedes the value bytes
    #[default]
    LengthPrefixed,

    /// The value runs to the end of the response (connection close)
    Legacy,
}

impl ValueFraming {
    pub fn from_length_prefixed(enabled: bool) -> Self {
        if enabled {
            ValueFraming::LengthPrefixed
        } else {
            ValueFraming::Legacy
        }
    }
}

// =============================================================================
// Bounded reader
// =============================================================================

/// Cursor over a byte slice that refuses to read past its end
struct FrameReader<'a> {
    buf: &'a [u8],
}

impl<'a> FrameReader<'a> {
    fn new(buf: &'a [u8]) -> Self {
        Self { buf }
    }

    fn remaining(&self) -> usize {
        self.buf.remaining()
    }

    fn is_empty(&self) -> bool {
        !self.buf.has_remaining()
    }

    fn read_u32(&mut self) -> Result<u32> {
        if self.buf.remaining() < LEN_SIZE {
            return Err(RediError::FrameTruncated {
                needed: LEN_SIZE,
                available: self.buf.remaining(),
            });
        }
        Ok(self.buf.get_u32())
    }

    fn read_bytes(&mut self, len: u32) -> Result<&'a [u8]> {
        let len = len as usize;
        if self.buf.len() < len {
            return Err(RediError::FrameTruncated {
                needed: len,
                available: self.buf.len(),
            });
        }
        let (head, tail) = self.buf.split_at(len);
        self.buf = tail;
        Ok(head)
    }

    /// Read a `len (4) + bytes` segment
    fn read_segment(&mut self) -> Result<&'a [u8]> {
        let len = self.read_u32()?;
        self.read_bytes(len)
    }

    fn rest(&mut self) -> &'a [u8] {
        std::mem::take(&mut self.buf)
    }

    fn expect_end(&self, what: &str) -> Result<()> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(RediError::DataInvalid(format!(
                "{} trailing bytes after {}",
                self.remaining(),
                what
            )))
        }
    }
}

// =============================================================================
// Request Decoding
// =============================================================================

/// Decode one request frame.
///
/// Never fails: structural and semantic problems are recorded in
/// `Request::errors` and leave the request invalid.
pub fn decode_request(buf: &[u8]) -> Request {
    let mut request = Request::empty();
    if let Err(err) = decode_into(buf, &mut request) {
        request.reject(error_code(&err));
    }
    request.finish()
}

fn decode_into(buf: &[u8], request: &mut Request) -> Result<()> {
    let mut frame = FrameReader::new(buf);
    let total_len = frame.read_u32()? as usize;

    if total_len < LEN_SIZE {
        return Err(RediError::FrameMalformed(format!(
            "total length {} is smaller than its own header",
            total_len
        )));
    }
    if total_len > buf.len() {
        return Err(RediError::FrameTruncated {
            needed: total_len,
            available: buf.len(),
        });
    }

    let mut body = FrameReader::new(&buf[LEN_SIZE..total_len]);
    let cmd = body.read_segment()?;
    request.cmd = CommandKind::from_bytes(cmd);
    if request.cmd == CommandKind::Unknown {
        // Nothing after an unknown command is interpreted
        return Ok(());
    }

    let data = if body.is_empty() {
        None
    } else {
        let segment = body.read_segment().map_err(|err| {
            reject_data(request);
            err
        })?;
        Some(segment)
    };
    if !body.is_empty() {
        return Err(RediError::FrameMalformed(format!(
            "{} trailing bytes after data segment",
            body.remaining()
        )));
    }

    if let Err(err) = decode_data(data, request) {
        request.reject(ErrorCode::DataInvalid);
        request.reject(error_code(&err));
    }
    Ok(())
}

/// Commands that carry data fail as `dataInvalid` when their segment is unreadable
fn reject_data(request: &mut Request) {
    if matches!(
        request.cmd,
        CommandKind::Get | CommandKind::Set | CommandKind::Delete
    ) {
        request.reject(ErrorCode::DataInvalid);
    }
}

fn decode_data(data: Option<&[u8]>, request: &mut Request) -> Result<()> {
    match request.cmd {
        CommandKind::Ping | CommandKind::Keys | CommandKind::Unknown => Ok(()),
        CommandKind::Get | CommandKind::Delete => {
            let data = data.ok_or_else(|| RediError::DataInvalid("missing key".to_string()))?;
            let mut data = FrameReader::new(data);
            let key = read_key(&mut data)?;
            data.expect_end("key")?;
            request.key = Some(key);
            Ok(())
        }
        CommandKind::Set => {
            let data = data.ok_or_else(|| {
                RediError::DataInvalid("missing key, value and encoding".to_string())
            })?;
            let mut data = FrameReader::new(data);
            let key = read_key(&mut data)?;
            let raw_value = data.read_segment()?;
            let tag = data.read_u32()?;
            data.expect_end("encoding tag")?;

            let encoding = Encoding::from_tag(tag)
                .ok_or_else(|| RediError::DataInvalid(format!("unknown encoding tag {}", tag)))?;
            let value = Value::decode(raw_value, encoding)?;

            request.key = Some(key);
            request.encoding = Some(encoding);
            request.value = Some(value);
            Ok(())
        }
    }
}

fn read_key(data: &mut FrameReader<'_>) -> Result<String> {
    let key = data.read_segment()?;
    String::from_utf8(key.to_vec())
        .map_err(|_| RediError::DataInvalid("key is not valid UTF-8".to_string()))
}

fn error_code(err: &RediError) -> ErrorCode {
    match err {
        RediError::FrameTruncated { .. } => ErrorCode::FrameTruncated,
        RediError::FrameMalformed(_) => ErrorCode::FrameMalformed,
        _ => ErrorCode::DataInvalid,
    }
}

// =============================================================================
// Request Encoding
// =============================================================================

/// Build a request frame from a raw command token and optional data segment
pub fn encode_frame(cmd: &[u8], data: Option<&[u8]>) -> Vec<u8> {
    let data_len = data.map_or(0, |d| LEN_SIZE + d.len());
    let total_len = LEN_SIZE + LEN_SIZE + cmd.len() + data_len;

    let mut frame = BytesMut::with_capacity(total_len);
    frame.put_u32(total_len as u32);
    frame.put_u32(cmd.len() as u32);
    frame.put_slice(cmd);
    if let Some(data) = data {
        frame.put_u32(data.len() as u32);
        frame.put_slice(data);
    }
    frame.to_vec()
}

/// Encode a command to a request frame
pub fn encode_command(command: &Command) -> Vec<u8> {
    let cmd = command.kind().as_str().unwrap_or_default().as_bytes();

    match command {
        Command::Get { key } | Command::Delete { key } => {
            let mut data = BytesMut::with_capacity(LEN_SIZE + key.len());
            put_segment(&mut data, key.as_bytes());
            encode_frame(cmd, Some(&data[..]))
        }
        Command::Set { key, value } => {
            let (raw_value, encoding) = value.encode();
            let mut data =
                BytesMut::with_capacity(3 * LEN_SIZE + key.len() + raw_value.len());
            put_segment(&mut data, key.as_bytes());
            put_segment(&mut data, &raw_value);
            data.put_u32(encoding.tag());
            encode_frame(cmd, Some(&data[..]))
        }
        Command::Keys => encode_frame(cmd, None),
        Command::Ping { payload } => encode_frame(cmd, Some(payload.as_slice())),
    }
}

fn put_segment(buf: &mut BytesMut, bytes: &[u8]) {
    buf.put_u32(bytes.len() as u32);
    buf.put_slice(bytes);
}

// =============================================================================
// Response Encoding/Decoding
// =============================================================================

/// Encode a response to bytes
pub fn encode_response(response: &Response, framing: ValueFraming) -> Vec<u8> {
    let mut message = BytesMut::with_capacity(LEN_SIZE);
    message.put_u32(response.status.code());

    match &response.payload {
        None => {}
        Some(Payload::Value(value)) => {
            let (bytes, encoding) = value.encode();
            message.reserve(2 * LEN_SIZE + bytes.len());
            message.put_u32(encoding.tag());
            match framing {
                ValueFraming::LengthPrefixed => put_segment(&mut message, &bytes),
                ValueFraming::Legacy => message.put_slice(&bytes),
            }
        }
        Some(Payload::Keys(keys)) => {
            message.put_u32(keys.len() as u32);
            for key in keys {
                put_segment(&mut message, key.as_bytes());
            }
        }
    }

    message.to_vec()
}

/// Decode a response to a command of kind `expected`
pub fn decode_response(
    bytes: &[u8],
    expected: CommandKind,
    framing: ValueFraming,
) -> Result<Response> {
    let mut reader = FrameReader::new(bytes);
    let code = reader.read_u32()?;
    let status = Status::from_code(code)
        .ok_or_else(|| RediError::Protocol(format!("unknown response status {}", code)))?;

    let carries_body = status == Status::Ok
        && matches!(expected, CommandKind::Get | CommandKind::Keys);
    if !carries_body {
        if !reader.is_empty() {
            return Err(RediError::Protocol(format!(
                "{} unexpected bytes after status {}",
                reader.remaining(),
                code
            )));
        }
        return Ok(Response {
            status,
            payload: None,
        });
    }

    match expected {
        CommandKind::Get => {
            let tag = reader.read_u32()?;
            let raw_value = match framing {
                ValueFraming::LengthPrefixed => {
                    let raw_value = reader.read_segment()?;
                    reader.expect_end("value")?;
                    raw_value
                }
                ValueFraming::Legacy => reader.rest(),
            };
            Ok(Response::value(Value::decode_tagged(raw_value, tag)?))
        }
        _ => {
            let count = reader.read_u32()?;
            let mut keys = Vec::new();
            for _ in 0..count {
                keys.push(read_key(&mut reader)?);
            }
            reader.expect_end("key list")?;
            Ok(Response::keys(keys))
        }
    }
}

// =============================================================================
// Stream-based I/O helpers
// =============================================================================

/// Read one complete request frame from a stream.
///
/// Reads the length prefix, then exactly the rest of the frame. The returned
/// buffer is handed to [`decode_request`] untouched; a prefix smaller than
/// its own size is returned as-is so the decoder can reject it.
pub fn read_request<R: Read>(reader: &mut R, max_frame_size: u32) -> Result<Vec<u8>> {
    let mut prefix = [0u8; LEN_SIZE];
    reader.read_exact(&mut prefix)?;

    let total_len = u32::from_be_bytes(prefix);
    if total_len > max_frame_size {
        return Err(RediError::FrameMalformed(format!(
            "frame too large: {} bytes (max {})",
            total_len, max_frame_size
        )));
    }

    let total_len = total_len as usize;
    if total_len <= LEN_SIZE {
        return Ok(prefix.to_vec());
    }

    let mut frame = vec![0u8; total_len];
    frame[..LEN_SIZE].copy_from_slice(&prefix);
    reader.read_exact(&mut frame[LEN_SIZE..])?;
    Ok(frame)
}

/// Write a command to a stream
pub fn write_command<W: Write>(writer: &mut W, command: &Command) -> Result<()> {
    let bytes = encode_command(command);
    writer.write_all(&bytes)?;
    writer.flush()?;
    Ok(())
}

/// Read a complete response from a stream.
///
/// The server closes the connection after one response, so everything up to
/// end of stream belongs to it.
pub fn read_response<R: Read>(
    reader: &mut R,
    expected: CommandKind,
    framing: ValueFraming,
) -> Result<Response> {
    let mut bytes = Vec::new();
    reader.read_to_end(&mut bytes)?;
    decode_response(&bytes, expected, framing)
}

/// Write a response to a stream
pub fn write_response<W: Write>(
    writer: &mut W,
    response: &Response,
    framing: ValueFraming,
) -> Result<()> {
    let bytes = encode_response(response, framing);
    writer.write_all(&bytes)?;
    writer.flush()?;
    Ok(())
}
