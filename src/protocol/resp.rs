/// Redis RESP2 (Redis Serialization Protocol) parsing and generation

use bytes::{Buf, BufMut, Bytes, BytesMut};
use std::str;

/// RESP data types
#[derive(Debug, Clone, PartialEq)]
pub enum RespValue {
    /// Simple String (+OK\r\n)
    SimpleString(String),
    /// Error (-ERR message\r\n)
    Error(String),
    /// Integer (:123\r\n)
    Integer(i64),
    /// Bulk String ($5\r\nhello\r\n)
    BulkString(Option<Bytes>), // None represents NULL
    /// Array (*2\r\n$5\r\nhello\r\n$5\r\nworld\r\n)
    Array(Option<Vec<RespValue>>), // None represents NULL array
}

/// RESP parser for reading Redis protocol messages
pub struct RespParser;

/// RESP encoder for writing Redis protocol messages
pub struct RespEncoder;

/// Parse error types
#[derive(Debug, thiserror::Error)]
pub enum RespParseError {
    #[error("Invalid RESP format: {0}")]
    InvalidFormat(String),
    #[error("Invalid UTF-8: {0}")]
    InvalidUtf8(#[from] str::Utf8Error),
    #[error("Invalid integer: {0}")]
    InvalidInteger(String),
}

impl RespParser {
    /// Parse one RESP value from the front of `buf`.
    ///
    /// Returns `Ok(None)` without touching the buffer when the frame is not
    /// complete yet; otherwise the frame's bytes are consumed.
    pub fn parse(buf: &mut BytesMut) -> Result<Option<RespValue>, RespParseError> {
        match Self::parse_at(buf, 0)? {
            Some((value, consumed)) => {
                buf.advance(consumed);
                Ok(Some(value))
            }
            None => Ok(None),
        }
    }

    /// Parse every complete frame currently in the buffer
    pub fn parse_all(buf: &mut BytesMut) -> Result<Vec<RespValue>, RespParseError> {
        let mut values = Vec::new();
        while let Some(value) = Self::parse(buf)? {
            values.push(value);
        }
        Ok(values)
    }

    fn parse_at(buf: &[u8], pos: usize) -> Result<Option<(RespValue, usize)>, RespParseError> {
        let Some((line, next)) = Self::read_line(buf, pos) else {
            return Ok(None);
        };
        if line.is_empty() {
            return Err(RespParseError::InvalidFormat("empty frame header".to_string()));
        }

        match line[0] {
            b'+' => {
                let content = str::from_utf8(&line[1..])?.to_string();
                Ok(Some((RespValue::SimpleString(content), next)))
            }
            b'-' => {
                let content = str::from_utf8(&line[1..])?.to_string();
                Ok(Some((RespValue::Error(content), next)))
            }
            b':' => Ok(Some((RespValue::Integer(Self::parse_int(&line[1..])?), next))),
            b'$' => Self::parse_bulk_string(buf, Self::parse_int(&line[1..])?, next),
            b'*' => Self::parse_array(buf, Self::parse_int(&line[1..])?, next),
            other => Err(RespParseError::InvalidFormat(format!(
                "Unknown RESP type: {}",
                other as char
            ))),
        }
    }

    fn parse_bulk_string(
        buf: &[u8],
        size: i64,
        pos: usize,
    ) -> Result<Option<(RespValue, usize)>, RespParseError> {
        if size == -1 {
            return Ok(Some((RespValue::BulkString(None), pos)));
        }
        if size < 0 {
            return Err(RespParseError::InvalidFormat(
                "Invalid bulk string size".to_string(),
            ));
        }

        let end = pos + size as usize;
        if buf.len() < end + 2 {
            return Ok(None);
        }
        if &buf[end..end + 2] != b"\r\n" {
            return Err(RespParseError::InvalidFormat(
                "Missing \\r\\n after bulk string".to_string(),
            ));
        }

        let content = Bytes::copy_from_slice(&buf[pos..end]);
        Ok(Some((RespValue::BulkString(Some(content)), end + 2)))
    }

    fn parse_array(
        buf: &[u8],
        size: i64,
        mut pos: usize,
    ) -> Result<Option<(RespValue, usize)>, RespParseError> {
        if size == -1 {
            return Ok(Some((RespValue::Array(None), pos)));
        }
        if size < 0 {
            return Err(RespParseError::InvalidFormat("Invalid array size".to_string()));
        }

        let mut elements = Vec::with_capacity(size.min(1024) as usize);
        for _ in 0..size {
            match Self::parse_at(buf, pos)? {
                Some((element, next)) => {
                    elements.push(element);
                    pos = next;
                }
                None => return Ok(None),
            }
        }

        Ok(Some((RespValue::Array(Some(elements)), pos)))
    }

    fn parse_int(digits: &[u8]) -> Result<i64, RespParseError> {
        btoi::btoi::<i64>(digits).map_err(|_| {
            RespParseError::InvalidInteger(String::from_utf8_lossy(digits).into_owned())
        })
    }

    /// Find the line starting at `pos`; returns it without \r\n plus the
    /// offset right after the terminator.
    fn read_line(buf: &[u8], pos: usize) -> Option<(&[u8], usize)> {
        if buf.len() < pos + 2 {
            return None;
        }
        buf[pos..]
            .windows(2)
            .position(|w| w == b"\r\n")
            .map(|i| (&buf[pos..pos + i], pos + i + 2))
    }
}

impl RespEncoder {
    /// Encode a RESP value to bytes
    pub fn encode(value: &RespValue) -> Bytes {
        let mut buf = BytesMut::new();
        Self::encode_into(&mut buf, value);
        buf.freeze()
    }

    /// Encode a RESP value into an existing buffer
    pub fn encode_into(buf: &mut BytesMut, value: &RespValue) {
        match value {
            RespValue::SimpleString(s) => {
                buf.put_u8(b'+');
                buf.extend_from_slice(s.as_bytes());
                buf.put_slice(b"\r\n");
            }
            RespValue::Error(s) => {
                buf.put_u8(b'-');
                buf.extend_from_slice(s.as_bytes());
                buf.put_slice(b"\r\n");
            }
            RespValue::Integer(n) => {
                buf.put_u8(b':');
                buf.extend_from_slice(n.to_string().as_bytes());
                buf.put_slice(b"\r\n");
            }
            RespValue::BulkString(Some(data)) => {
                buf.put_u8(b'$');
                buf.extend_from_slice(data.len().to_string().as_bytes());
                buf.put_slice(b"\r\n");
                buf.extend_from_slice(data);
                buf.put_slice(b"\r\n");
            }
            RespValue::BulkString(None) => {
                buf.extend_from_slice(b"$-1\r\n");
            }
            RespValue::Array(Some(elements)) => {
                buf.put_u8(b'*');
                buf.extend_from_slice(elements.len().to_string().as_bytes());
                buf.put_slice(b"\r\n");
                for element in elements {
                    Self::encode_into(buf, element);
                }
            }
            RespValue::Array(None) => {
                buf.extend_from_slice(b"*-1\r\n");
            }
        }
    }

    /// Encode a command (name + arguments) as a RESP array of bulk strings
    pub fn encode_command(args: &[Bytes], buf: &mut BytesMut) {
        buf.put_u8(b'*');
        buf.extend_from_slice(args.len().to_string().as_bytes());
        buf.put_slice(b"\r\n");
        for arg in args {
            buf.put_u8(b'$');
            buf.extend_from_slice(arg.len().to_string().as_bytes());
            buf.put_slice(b"\r\n");
            buf.extend_from_slice(arg);
            buf.put_slice(b"\r\n");
        }
    }
}

impl RespValue {
    pub fn bulk<B: Into<Bytes>>(data: B) -> Self {
        RespValue::BulkString(Some(data.into()))
    }

    pub fn simple<S: Into<String>>(text: S) -> Self {
        RespValue::SimpleString(text.into())
    }

    pub fn is_null(&self) -> bool {
        matches!(self, RespValue::BulkString(None) | RespValue::Array(None))
    }
}
