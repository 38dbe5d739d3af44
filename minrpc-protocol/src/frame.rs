//! Binary frame formats for minrpc.
//!
//! Request frame layout:
//!
//! ```text
//! +-------------+---------------------+------------------+
//! | header_len  | header (JSON)       | args payload     |
//! |  4 bytes BE | header_len bytes    | args_len bytes   |
//! +-------------+---------------------+------------------+
//! ```
//!
//! The header carries the dispatch target (`service`, `method`) plus the
//! argument payload length. `args_len` is redundant with the trailing-data
//! boundary but keeps the frame self-describing.
//!
//! Response frame layout:
//!
//! ```text
//! +--------------+---------------------+
//! | payload_len  | payload             |
//! |  4 bytes BE  | payload_len bytes   |
//! +--------------+---------------------+
//! ```
//!
//! The response carries no header: the caller already knows which method it
//! invoked and supplies the expected response type at decode time. Only the
//! registry needs schema knowledge; the codec needs none.

use crate::error::ProtocolError;
use crate::MAX_FRAME_SIZE;
use bytes::{Buf, BufMut, Bytes, BytesMut};
use serde::{Deserialize, Serialize};

/// Size of the length prefix preceding each frame segment.
pub const LEN_PREFIX_SIZE: usize = 4;

/// Self-describing request header, serialized as JSON on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestHeader {
    /// Target service name.
    pub service: String,
    /// Target method name.
    pub method: String,
    /// Length of the argument payload following the header.
    pub args_len: u32,
}

/// A decoded request frame.
#[derive(Debug, Clone)]
pub struct RequestFrame {
    /// Dispatch target and payload length.
    pub header: RequestHeader,
    /// Raw serialized argument payload.
    pub args: Bytes,
}

impl RequestFrame {
    /// Encodes a request frame from its logical parts.
    pub fn encode(service: &str, method: &str, args: &[u8]) -> Result<BytesMut, ProtocolError> {
        if args.len() > MAX_FRAME_SIZE as usize {
            return Err(ProtocolError::FrameTooLarge {
                size: args.len() as u32,
                max: MAX_FRAME_SIZE,
            });
        }

        let header = RequestHeader {
            service: service.to_string(),
            method: method.to_string(),
            args_len: args.len() as u32,
        };
        let header_bytes = serde_json::to_vec(&header)?;
        if header_bytes.len() > MAX_FRAME_SIZE as usize {
            return Err(ProtocolError::FrameTooLarge {
                size: header_bytes.len() as u32,
                max: MAX_FRAME_SIZE,
            });
        }

        let mut buf = BytesMut::with_capacity(LEN_PREFIX_SIZE + header_bytes.len() + args.len());
        buf.put_u32(header_bytes.len() as u32);
        buf.put_slice(&header_bytes);
        buf.put_slice(args);
        Ok(buf)
    }

    /// Decodes a request frame from a receive buffer.
    ///
    /// Returns `Ok(Some(frame))` if a complete frame was consumed from the
    /// buffer, `Ok(None)` if more data is needed, or `Err` on malformed
    /// input. A length prefix beyond [`MAX_FRAME_SIZE`] is rejected rather
    /// than awaited.
    pub fn decode(buf: &mut BytesMut) -> Result<Option<Self>, ProtocolError> {
        if buf.len() < LEN_PREFIX_SIZE {
            return Ok(None);
        }

        let header_len =
            u32::from_be_bytes([buf[0], buf[1], buf[2], buf[3]]) as usize;
        if header_len > MAX_FRAME_SIZE as usize {
            return Err(ProtocolError::FrameTooLarge {
                size: header_len as u32,
                max: MAX_FRAME_SIZE,
            });
        }
        if buf.len() < LEN_PREFIX_SIZE + header_len {
            return Ok(None);
        }

        let header_slice = &buf[LEN_PREFIX_SIZE..LEN_PREFIX_SIZE + header_len];
        let header_str =
            std::str::from_utf8(header_slice).map_err(|_| ProtocolError::InvalidUtf8)?;
        let header: RequestHeader = serde_json::from_str(header_str)
            .map_err(|e| ProtocolError::MalformedFrame(format!("bad request header: {e}")))?;

        let args_len = header.args_len as usize;
        if header.args_len > MAX_FRAME_SIZE {
            return Err(ProtocolError::FrameTooLarge {
                size: header.args_len,
                max: MAX_FRAME_SIZE,
            });
        }
        if buf.len() < LEN_PREFIX_SIZE + header_len + args_len {
            return Ok(None);
        }

        buf.advance(LEN_PREFIX_SIZE + header_len);
        let args = buf.split_to(args_len).freeze();

        Ok(Some(Self { header, args }))
    }
}

/// A decoded response frame: a length-prefixed opaque payload.
#[derive(Debug, Clone)]
pub struct ResponseFrame {
    /// Raw serialized response payload.
    pub payload: Bytes,
}

impl ResponseFrame {
    /// Encodes a response frame around the given payload.
    pub fn encode(payload: &[u8]) -> Result<BytesMut, ProtocolError> {
        if payload.len() > MAX_FRAME_SIZE as usize {
            return Err(ProtocolError::FrameTooLarge {
                size: payload.len() as u32,
                max: MAX_FRAME_SIZE,
            });
        }

        let mut buf = BytesMut::with_capacity(LEN_PREFIX_SIZE + payload.len());
        buf.put_u32(payload.len() as u32);
        buf.put_slice(payload);
        Ok(buf)
    }

    /// Decodes a response frame from a receive buffer.
    ///
    /// Same incremental contract as [`RequestFrame::decode`]: decoding never
    /// reads past `4 + payload_len` bytes for one frame.
    pub fn decode(buf: &mut BytesMut) -> Result<Option<Self>, ProtocolError> {
        if buf.len() < LEN_PREFIX_SIZE {
            return Ok(None);
        }

        let payload_len =
            u32::from_be_bytes([buf[0], buf[1], buf[2], buf[3]]) as usize;
        if payload_len > MAX_FRAME_SIZE as usize {
            return Err(ProtocolError::FrameTooLarge {
                size: payload_len as u32,
                max: MAX_FRAME_SIZE,
            });
        }
        if buf.len() < LEN_PREFIX_SIZE + payload_len {
            return Ok(None);
        }

        buf.advance(LEN_PREFIX_SIZE);
        let payload = buf.split_to(payload_len).freeze();
        Ok(Some(Self { payload }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_roundtrip() {
        let args = br#"{"username":"zhang san","password":"123456"}"#;
        let encoded = RequestFrame::encode("UserService", "Login", args).unwrap();

        let mut buf = encoded;
        let decoded = RequestFrame::decode(&mut buf).unwrap().unwrap();

        assert_eq!(decoded.header.service, "UserService");
        assert_eq!(decoded.header.method, "Login");
        assert_eq!(decoded.header.args_len as usize, args.len());
        assert_eq!(decoded.args.as_ref(), args);
        assert!(buf.is_empty());
    }

    #[test]
    fn test_request_header_is_length_prefixed() {
        let encoded = RequestFrame::encode("S", "m", b"xy").unwrap();
        let header_len = u32::from_be_bytes([encoded[0], encoded[1], encoded[2], encoded[3]]);
        assert_eq!(
            encoded.len(),
            LEN_PREFIX_SIZE + header_len as usize + 2,
            "frame is exactly prefix + header + args"
        );
    }

    #[test]
    fn test_request_partial_decode() {
        let encoded = RequestFrame::encode("UserService", "Login", b"payload").unwrap();

        let mut buf = BytesMut::new();
        // Less than the length prefix
        buf.extend_from_slice(&encoded[..3]);
        assert!(RequestFrame::decode(&mut buf).unwrap().is_none());

        // Header present, args still missing
        buf.extend_from_slice(&encoded[3..encoded.len() - 2]);
        assert!(RequestFrame::decode(&mut buf).unwrap().is_none());

        buf.extend_from_slice(&encoded[encoded.len() - 2..]);
        let frame = RequestFrame::decode(&mut buf).unwrap().unwrap();
        assert_eq!(frame.args.as_ref(), b"payload");
    }

    #[test]
    fn test_request_bad_header_json() {
        let mut buf = BytesMut::new();
        buf.put_u32(9);
        buf.put_slice(b"not json!");
        let result = RequestFrame::decode(&mut buf);
        assert!(matches!(result, Err(ProtocolError::MalformedFrame(_))));
    }

    #[test]
    fn test_request_header_len_beyond_limit() {
        let mut buf = BytesMut::new();
        buf.put_u32(MAX_FRAME_SIZE + 1);
        buf.put_slice(b"whatever");
        let result = RequestFrame::decode(&mut buf);
        assert!(matches!(result, Err(ProtocolError::FrameTooLarge { .. })));
    }

    #[test]
    fn test_request_empty_args() {
        let encoded = RequestFrame::encode("EchoService", "Noop", b"").unwrap();
        let mut buf = encoded;
        let decoded = RequestFrame::decode(&mut buf).unwrap().unwrap();
        assert_eq!(decoded.header.args_len, 0);
        assert!(decoded.args.is_empty());
    }

    #[test]
    fn test_response_roundtrip() {
        let payload = br#"{"status":"ok","body":{"success":true}}"#;
        let encoded = ResponseFrame::encode(payload).unwrap();

        // Frame boundary: 4-byte BE prefix holds exactly the payload length
        let prefix = u32::from_be_bytes([encoded[0], encoded[1], encoded[2], encoded[3]]);
        assert_eq!(prefix as usize, payload.len());
        assert_eq!(encoded.len(), LEN_PREFIX_SIZE + payload.len());

        let mut buf = encoded;
        let decoded = ResponseFrame::decode(&mut buf).unwrap().unwrap();
        assert_eq!(decoded.payload.as_ref(), payload);
    }

    #[test]
    fn test_response_partial_decode() {
        let encoded = ResponseFrame::encode(b"hello response").unwrap();
        let mut buf = BytesMut::new();
        buf.extend_from_slice(&encoded[..6]);
        assert!(ResponseFrame::decode(&mut buf).unwrap().is_none());

        buf.extend_from_slice(&encoded[6..]);
        let decoded = ResponseFrame::decode(&mut buf).unwrap().unwrap();
        assert_eq!(decoded.payload.as_ref(), b"hello response");
    }

    #[test]
    fn test_response_too_large() {
        let mut buf = BytesMut::new();
        buf.put_u32(MAX_FRAME_SIZE + 1);
        let result = ResponseFrame::decode(&mut buf);
        assert!(matches!(result, Err(ProtocolError::FrameTooLarge { .. })));
    }

    #[test]
    fn test_two_requests_in_one_buffer() {
        let mut buf = BytesMut::new();
        buf.extend_from_slice(&RequestFrame::encode("A", "one", b"1").unwrap());
        buf.extend_from_slice(&RequestFrame::encode("B", "two", b"2").unwrap());

        let first = RequestFrame::decode(&mut buf).unwrap().unwrap();
        assert_eq!(first.header.service, "A");
        assert_eq!(first.args.as_ref(), b"1");

        let second = RequestFrame::decode(&mut buf).unwrap().unwrap();
        assert_eq!(second.header.service, "B");
        assert_eq!(second.args.as_ref(), b"2");
        assert!(buf.is_empty());
    }

    #[test]
    fn test_decode_never_reads_past_frame() {
        let mut buf = BytesMut::new();
        buf.extend_from_slice(&ResponseFrame::encode(b"abc").unwrap());
        buf.extend_from_slice(b"trailing garbage");

        let decoded = ResponseFrame::decode(&mut buf).unwrap().unwrap();
        assert_eq!(decoded.payload.as_ref(), b"abc");
        assert_eq!(buf.as_ref(), b"trailing garbage");
    }
}
