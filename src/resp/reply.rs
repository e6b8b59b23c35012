// RESP2 reply encoders. Each function appends exactly one complete frame.

use std::fmt::{self, Write as _};

use bytes::{BufMut, BytesMut};

const CRLF: &[u8] = b"\r\n";

/// Fixed status replies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Ok,
    Pong,
}

impl Status {
    pub fn as_str(self) -> &'static str {
        match self {
            Status::Ok => "OK",
            Status::Pong => "PONG",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// `+<text>\r\n`
pub fn status(dst: &mut BytesMut, text: &str) {
    dst.put_u8(b'+');
    put_line(dst, text.as_bytes());
}

/// `-<message>\r\n`
pub fn error(dst: &mut BytesMut, message: impl fmt::Display) {
    dst.put_u8(b'-');
    let start = dst.len();
    put_display(dst, message);
    // A line reply must not contain its own terminator.
    for byte in &mut dst[start..] {
        if *byte == b'\r' || *byte == b'\n' {
            *byte = b' ';
        }
    }
    dst.put_slice(CRLF);
}

/// `:<n>\r\n`
pub fn integer(dst: &mut BytesMut, n: i64) {
    dst.put_u8(b':');
    put_display(dst, n);
    dst.put_slice(CRLF);
}

/// `$<len>\r\n<data>\r\n`
pub fn bulk(dst: &mut BytesMut, data: &[u8]) {
    dst.reserve(data.len() + 16);
    dst.put_u8(b'$');
    put_display(dst, data.len());
    dst.put_slice(CRLF);
    dst.put_slice(data);
    dst.put_slice(CRLF);
}

/// `*<count>\r\n`
pub fn array_header(dst: &mut BytesMut, count: usize) {
    dst.put_u8(b'*');
    put_display(dst, count);
    dst.put_slice(CRLF);
}

/// An array header followed by one bulk string per element.
pub fn array<I>(dst: &mut BytesMut, items: I)
where
    I: IntoIterator,
    I::IntoIter: ExactSizeIterator,
    I::Item: AsRef<[u8]>,
{
    let items = items.into_iter();
    array_header(dst, items.len());
    for item in items {
        bulk(dst, item.as_ref());
    }
}

fn put_line(dst: &mut BytesMut, text: &[u8]) {
    dst.extend(text.iter().map(|&b| if b == b'\r' || b == b'\n' { b' ' } else { b }));
    dst.put_slice(CRLF);
}

// Formats straight into the buffer; `BytesMut` grows instead of failing.
fn put_display(dst: &mut BytesMut, value: impl fmt::Display) {
    let _ = write!(dst, "{value}");
}
