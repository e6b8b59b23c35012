// Shared helpers for the end-to-end tests.
#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use bytes::{Buf, Bytes, BytesMut};
use khronos::resp::Request;
use khronos::{RespConfig, RespServer, RoutedQueue};
use redis_protocol::resp2::decode::decode;
use redis_protocol::resp2::types::OwnedFrame as RespFrame;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

const IO_TIMEOUT: Duration = Duration::from_secs(2);

pub struct TestServer {
    pub addr: SocketAddr,
    pub queue: Arc<RoutedQueue>,
    pub shutdown: CancellationToken,
    pub handle: JoinHandle<std::io::Result<()>>,
}

impl TestServer {
    pub async fn start() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let queue = Arc::new(RoutedQueue::new());
        let server = RespServer::new(RespConfig::default(), queue.clone());
        let shutdown = server.shutdown_token();
        let handle = tokio::spawn(server.serve(listener));
        Self {
            addr,
            queue,
            shutdown,
            handle,
        }
    }

    pub async fn client(&self) -> TestClient {
        TestClient::connect(self.addr).await
    }

    /// Polls until `route` has `expected` blocked poppers.
    pub async fn wait_for_waiters(&self, route: &str, expected: usize) {
        for _ in 0..500 {
            if self.queue.waiters(route) == expected {
                return;
            }
            tokio::time::sleep(Duration::from_millis(2)).await;
        }
        panic!(
            "expected {expected} waiters on {route}, found {}",
            self.queue.waiters(route)
        );
    }
}

pub struct TestClient {
    stream: TcpStream,
    buffer: BytesMut,
}

impl TestClient {
    pub async fn connect(addr: SocketAddr) -> Self {
        let stream = TcpStream::connect(addr).await.unwrap();
        Self {
            stream,
            buffer: BytesMut::with_capacity(1024),
        }
    }

    pub fn encode(parts: &[&str]) -> BytesMut {
        let (name, args) = parts.split_first().expect("request needs a name");
        let request = Request::new(
            Bytes::copy_from_slice(name.as_bytes()),
            args.iter().map(|a| Bytes::copy_from_slice(a.as_bytes())).collect::<Vec<Bytes>>(),
        );
        let mut out = BytesMut::new();
        request.encode(&mut out);
        out
    }

    pub async fn send(&mut self, parts: &[&str]) {
        let frame = Self::encode(parts);
        self.send_raw(&frame).await;
    }

    pub async fn send_raw(&mut self, bytes: &[u8]) {
        self.stream.write_all(bytes).await.unwrap();
    }

    /// Like `send_raw`, for writes the server may cut short by closing.
    pub async fn try_send_raw(&mut self, bytes: &[u8]) -> std::io::Result<()> {
        self.stream.write_all(bytes).await
    }

    pub async fn request(&mut self, parts: &[&str]) -> RespFrame {
        self.send(parts).await;
        self.read_frame().await
    }

    /// Closes the write side; the server sees EOF but can still reply.
    pub async fn finish_writing(&mut self) {
        self.stream.shutdown().await.unwrap();
    }

    pub async fn read_frame(&mut self) -> RespFrame {
        tokio::time::timeout(IO_TIMEOUT, self.next_frame())
            .await
            .expect("timed out waiting for a reply")
    }

    async fn next_frame(&mut self) -> RespFrame {
        loop {
            if let Some((frame, used)) = decode(&self.buffer).unwrap() {
                self.buffer.advance(used);
                return frame;
            }
            let n = self.stream.read_buf(&mut self.buffer).await.unwrap();
            assert!(n > 0, "connection closed while waiting for a reply");
        }
    }

    /// Everything left on the connection up to EOF. A reset counts as EOF.
    pub async fn read_to_close(&mut self) -> Vec<u8> {
        let rest = tokio::time::timeout(IO_TIMEOUT, async {
            loop {
                match self.stream.read_buf(&mut self.buffer).await {
                    Ok(0) | Err(_) => break,
                    Ok(_) => {}
                }
            }
        })
        .await;
        assert!(rest.is_ok(), "server did not close the connection");
        self.buffer.split().to_vec()
    }

    /// True if nothing arrives within `wait`.
    pub async fn is_silent_for(&mut self, wait: Duration) -> bool {
        if !self.buffer.is_empty() {
            return false;
        }
        tokio::time::timeout(wait, self.stream.read_buf(&mut self.buffer))
            .await
            .is_err()
    }
}

pub fn bulk(value: &str) -> RespFrame {
    RespFrame::BulkString(value.as_bytes().to_vec())
}

pub fn simple(value: &str) -> RespFrame {
    RespFrame::SimpleString(value.as_bytes().to_vec())
}

pub fn error(message: &str) -> RespFrame {
    RespFrame::Error(message.to_string())
}
