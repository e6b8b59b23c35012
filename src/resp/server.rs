use std::io;
use std::sync::Arc;

use tokio::net::{TcpListener, TcpStream};
use tokio_util::sync::CancellationToken;

use super::error::SessionError;
use super::pool::BufferPool;
use super::registry::Registry;
use super::session::{Session, SessionContext};
use crate::config::RespConfig;
use crate::queue::RoutedQueue;

/// RESP Server
pub struct RespServer {
    config: RespConfig,
    shared: Arc<SessionContext>,
    shutdown: CancellationToken,
}

impl RespServer {
    pub fn new(config: RespConfig, queue: Arc<RoutedQueue>) -> Self {
        Self::with_registry(config, queue, Registry::builtin())
    }

    /// Serves `registry` instead of the built-in command set.
    pub fn with_registry(config: RespConfig, queue: Arc<RoutedQueue>, registry: Registry) -> Self {
        let shared = Arc::new(SessionContext {
            queue,
            registry: Arc::new(registry),
            pool: BufferPool::new(config.buffer_pool_slots),
            limits: config.limits,
        });
        Self {
            config,
            shared,
            shutdown: CancellationToken::new(),
        }
    }

    /// Cancelling this token stops the accept loop and closes every
    /// connection, aborting blocked pops.
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    pub async fn run(self) -> io::Result<()> {
        let addr = self.config.listen_addr();
        let listener = TcpListener::bind(&addr).await?;
        self.serve(listener).await
    }

    /// Accepts connections on an already bound listener until shutdown.
    pub async fn serve(self, listener: TcpListener) -> io::Result<()> {
        tracing::info!(addr = %listener.local_addr()?, "khronos listening");

        loop {
            let accepted = tokio::select! {
                accepted = listener.accept() => accepted,
                () = self.shutdown.cancelled() => break,
            };
            match accepted {
                Ok((socket, peer)) => {
                    tracing::debug!(%peer, "accepted connection");
                    self.spawn_session(socket);
                }
                // Per-connection failures (e.g. reset before accept) must not
                // take the listener down.
                Err(err) => tracing::error!(error = %err, "accept error"),
            }
        }

        tracing::info!("khronos stopped accepting connections");
        Ok(())
    }

    fn spawn_session(&self, socket: TcpStream) {
        let peer = socket.peer_addr().ok();
        let _ = socket.set_nodelay(true);
        let (reader, writer) = socket.into_split();
        let session = Session::new(
            reader,
            writer,
            Arc::clone(&self.shared),
            self.shutdown.child_token(),
        );

        tokio::spawn(async move {
            match session.run().await {
                Ok(()) => tracing::debug!(?peer, "connection closed"),
                Err(SessionError::Frame(err)) => {
                    tracing::warn!(?peer, error = %err, "closed connection on protocol error")
                }
                Err(SessionError::Io(err)) => {
                    tracing::debug!(?peer, error = %err, kind = ?err.kind(), "connection error")
                }
            }
        });
    }
}
