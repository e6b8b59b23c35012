use std::ops::Range;

use bytes::{Bytes, BytesMut};

use super::error::FrameError;
use super::reply;

pub const DEFAULT_MAX_ARGS: usize = 1024 * 1024;
pub const DEFAULT_MAX_BULK_LEN: usize = 512 * 1024 * 1024;

/// Longest header line accepted, marker byte excluded. Enough for any
/// 64-bit length plus CRLF.
const MAX_HEADER_LEN: usize = 24;

/// Most the read buffer grows ahead of a partially received bulk string.
const MAX_RESERVE: usize = 64 * 1024;

/// Upper bounds applied while decoding a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameLimits {
    pub max_args: usize,
    pub max_bulk_len: usize,
}

impl Default for FrameLimits {
    fn default() -> Self {
        Self {
            max_args: DEFAULT_MAX_ARGS,
            max_bulk_len: DEFAULT_MAX_BULK_LEN,
        }
    }
}

/// A decoded request: command name plus arguments, exactly as sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    pub name: Bytes,
    pub args: Vec<Bytes>,
}

impl Request {
    pub fn new<A>(name: impl Into<Bytes>, args: impl IntoIterator<Item = A>) -> Self
    where
        A: Into<Bytes>,
    {
        Self {
            name: name.into(),
            args: args.into_iter().map(Into::into).collect(),
        }
    }

    /// Appends the request in array-of-bulk-strings form.
    pub fn encode(&self, dst: &mut BytesMut) {
        reply::array_header(dst, self.args.len() + 1);
        reply::bulk(dst, &self.name);
        for arg in &self.args {
            reply::bulk(dst, arg);
        }
    }
}

/// Decodes one request from the front of `src`.
///
/// Returns `Ok(None)` when `src` does not yet hold a whole frame; nothing is
/// consumed in that case. On success the frame is split off `src` and the
/// arguments are slices of it.
pub fn decode(src: &mut BytesMut, limits: &FrameLimits) -> Result<Option<Request>, FrameError> {
    let mut cursor = Cursor { buf: &src[..], pos: 0 };

    let Some(count) = cursor.header(b'*', "array")? else {
        return Ok(None);
    };
    if count == 0 {
        return Err(FrameError::EmptyRequest);
    }
    if count > limits.max_args {
        return Err(FrameError::TooManyArguments {
            count,
            max: limits.max_args,
        });
    }

    let mut spans: Vec<Range<usize>> = Vec::with_capacity(count.min(16));
    for _ in 0..count {
        let Some(len) = cursor.header(b'$', "bulk")? else {
            return Ok(None);
        };
        if len > limits.max_bulk_len {
            return Err(FrameError::BulkTooLarge {
                len,
                max: limits.max_bulk_len,
            });
        }
        let start = cursor.pos;
        let end = start
            .checked_add(len)
            .filter(|end| end.checked_add(2).is_some())
            .ok_or(FrameError::InvalidLength("bulk"))?;
        if cursor.buf.len() < end + 2 {
            // The declared length is untrusted until the bytes arrive.
            let missing = end + 2 - cursor.buf.len();
            src.reserve(missing.min(MAX_RESERVE));
            return Ok(None);
        }
        if &cursor.buf[end..end + 2] != b"\r\n" {
            return Err(FrameError::MissingTerminator);
        }
        spans.push(start..end);
        cursor.pos = end + 2;
    }

    let consumed = cursor.pos;
    let frame = src.split_to(consumed).freeze();
    let mut parts = spans.into_iter().map(|span| frame.slice(span));
    let name = parts.next().unwrap_or_default();
    Ok(Some(Request {
        name,
        args: parts.collect(),
    }))
}

struct Cursor<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl Cursor<'_> {
    /// Reads `<marker><decimal>\r\n` and returns the decimal.
    fn header(&mut self, marker: u8, what: &'static str) -> Result<Option<usize>, FrameError> {
        let Some(&found) = self.buf.get(self.pos) else {
            return Ok(None);
        };
        if found != marker {
            return Err(FrameError::UnexpectedByte {
                expected: char::from(marker),
                found,
            });
        }

        let digits_at = self.pos + 1;
        let window = &self.buf[digits_at..self.buf.len().min(digits_at + MAX_HEADER_LEN)];
        let Some(cr) = window.windows(2).position(|pair| pair == b"\r\n") else {
            if window.len() >= MAX_HEADER_LEN {
                return Err(FrameError::LineTooLong);
            }
            return Ok(None);
        };

        let value = parse_length(&window[..cr]).ok_or(FrameError::InvalidLength(what))?;
        self.pos = digits_at + cr + 2;
        Ok(Some(value))
    }
}

// Plain ASCII digits only: no sign, no whitespace.
fn parse_length(digits: &[u8]) -> Option<usize> {
    if digits.is_empty() || !digits.iter().all(u8::is_ascii_digit) {
        return None;
    }
    std::str::from_utf8(digits).ok()?.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode_all(bytes: &[u8]) -> Result<Option<Request>, FrameError> {
        let mut buf = BytesMut::from(bytes);
        decode(&mut buf, &FrameLimits::default())
    }

    #[test]
    fn decodes_command_and_arguments() {
        let req = decode_all(b"*3\r\n$4\r\npush\r\n$1\r\nq\r\n$2\r\nv1\r\n")
            .unwrap()
            .unwrap();
        assert_eq!(req.name, "push");
        assert_eq!(req.args, vec!["q", "v1"]);
    }

    #[test]
    fn leaves_trailing_pipelined_bytes() {
        let mut buf = BytesMut::from(&b"*1\r\n$4\r\nping\r\n*1\r\n$4\r\nquit\r\n"[..]);
        let first = decode(&mut buf, &FrameLimits::default()).unwrap().unwrap();
        assert_eq!(first.name, "ping");
        assert_eq!(&buf[..], b"*1\r\n$4\r\nquit\r\n");
    }

    #[test]
    fn partial_frame_consumes_nothing() {
        let full = b"*2\r\n$4\r\necho\r\n$5\r\nhello\r\n";
        for cut in 0..full.len() {
            let mut buf = BytesMut::from(&full[..cut]);
            assert_eq!(decode(&mut buf, &FrameLimits::default()), Ok(None), "cut at {cut}");
            assert_eq!(buf.len(), cut);
        }
    }

    #[test]
    fn rejects_wrong_leading_byte_immediately() {
        assert_eq!(
            decode_all(b"G"),
            Err(FrameError::UnexpectedByte {
                expected: '*',
                found: b'G'
            })
        );
    }

    #[test]
    fn rejects_non_bulk_element() {
        assert_eq!(
            decode_all(b"*1\r\n:4\r\n"),
            Err(FrameError::UnexpectedByte {
                expected: '$',
                found: b':'
            })
        );
    }

    #[test]
    fn rejects_negative_and_non_numeric_lengths() {
        assert_eq!(decode_all(b"*-1\r\n"), Err(FrameError::InvalidLength("array")));
        assert_eq!(decode_all(b"*x\r\n"), Err(FrameError::InvalidLength("array")));
        assert_eq!(
            decode_all(b"*1\r\n$-1\r\n"),
            Err(FrameError::InvalidLength("bulk"))
        );
        assert_eq!(decode_all(b"*\r\n"), Err(FrameError::InvalidLength("array")));
    }

    #[test]
    fn rejects_empty_array() {
        assert_eq!(decode_all(b"*0\r\n"), Err(FrameError::EmptyRequest));
    }

    #[test]
    fn rejects_missing_crlf_after_bulk() {
        assert_eq!(
            decode_all(b"*1\r\n$4\r\npingXX"),
            Err(FrameError::MissingTerminator)
        );
    }

    #[test]
    fn rejects_unterminated_header() {
        assert_eq!(
            decode_all(b"*1111111111111111111111111111"),
            Err(FrameError::LineTooLong)
        );
    }

    #[test]
    fn enforces_limits() {
        let limits = FrameLimits {
            max_args: 1,
            max_bulk_len: 3,
        };
        let mut buf = BytesMut::from(&b"*2\r\n"[..]);
        assert_eq!(
            decode(&mut buf, &limits),
            Err(FrameError::TooManyArguments { count: 2, max: 1 })
        );
        let mut buf = BytesMut::from(&b"*1\r\n$4\r\n"[..]);
        assert_eq!(
            decode(&mut buf, &limits),
            Err(FrameError::BulkTooLarge { len: 4, max: 3 })
        );
    }

    #[test]
    fn declared_bulk_length_does_not_preallocate() {
        let mut buf = BytesMut::from(&b"*1\r\n$536870912\r\n"[..]);
        assert_eq!(decode(&mut buf, &FrameLimits::default()), Ok(None));
        assert!(buf.capacity() <= 2 * MAX_RESERVE, "capacity {}", buf.capacity());

        buf.extend_from_slice(&[b'x'; 100_000]);
        assert_eq!(decode(&mut buf, &FrameLimits::default()), Ok(None));
        // Grows with what actually arrived, not with the declared length.
        assert!(buf.capacity() < 1024 * 1024, "capacity {}", buf.capacity());
    }

    #[test]
    fn huge_bulk_length_is_rejected_without_overflow() {
        let limits = FrameLimits {
            max_args: 1,
            max_bulk_len: usize::MAX,
        };
        let mut buf = BytesMut::from(format!("*1\r\n${}\r\n", usize::MAX).as_bytes());
        assert_eq!(decode(&mut buf, &limits), Err(FrameError::InvalidLength("bulk")));
    }

    #[test]
    fn binary_arguments_survive() {
        let req = Request::new("push", [&b"q"[..], &b"\x00\r\n\xff"[..], &b"1"[..]]);
        let mut buf = BytesMut::new();
        req.encode(&mut buf);
        assert_eq!(decode(&mut buf, &FrameLimits::default()).unwrap(), Some(req));
        assert!(buf.is_empty());
    }
}
