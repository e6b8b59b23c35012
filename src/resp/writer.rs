use std::fmt;
use std::io;
use std::sync::Arc;

use bytes::BytesMut;
use tokio::io::{AsyncWrite, AsyncWriteExt};

use super::pool::BufferPool;
use super::reply::{self, Status};

/// Streams replies to one connection.
///
/// Every `write_*` call encodes a single frame into a pooled buffer, writes
/// it and hands the buffer back, whether or not the write succeeded.
pub struct ResponseWriter<W> {
    inner: W,
    pool: Arc<BufferPool>,
}

impl<W: AsyncWrite + Unpin> ResponseWriter<W> {
    pub fn new(inner: W, pool: Arc<BufferPool>) -> Self {
        Self { inner, pool }
    }

    pub async fn write_status(&mut self, status: Status) -> io::Result<()> {
        self.send(|buf| reply::status(buf, status.as_str())).await
    }

    pub async fn write_error(&mut self, err: impl fmt::Display) -> io::Result<()> {
        self.send(|buf| reply::error(buf, err)).await
    }

    pub async fn write_integer(&mut self, n: i64) -> io::Result<()> {
        self.send(|buf| reply::integer(buf, n)).await
    }

    pub async fn write_bulk(&mut self, data: &[u8]) -> io::Result<()> {
        self.send(|buf| reply::bulk(buf, data)).await
    }

    pub async fn write_array<I>(&mut self, items: I) -> io::Result<()>
    where
        I: IntoIterator,
        I::IntoIter: ExactSizeIterator,
        I::Item: AsRef<[u8]>,
    {
        self.send(|buf| reply::array(buf, items)).await
    }

    /// Bare CRLF, sent before the server closes on `quit`.
    pub async fn write_terminator(&mut self) -> io::Result<()> {
        self.send(|buf| buf.extend_from_slice(b"\r\n")).await
    }

    pub fn into_inner(self) -> W {
        self.inner
    }

    async fn send(&mut self, encode: impl FnOnce(&mut BytesMut)) -> io::Result<()> {
        let mut buf = self.pool.acquire();
        encode(&mut *buf);
        self.inner.write_all(&buf[..]).await?;
        self.inner.flush().await
    }
}
