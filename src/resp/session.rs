use std::future::Future;
use std::sync::Arc;

use bytes::BytesMut;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite};
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace, warn};

use super::codec::{self, FrameLimits, Request};
use super::commands::{ExecContext, Outcome};
use super::error::{FrameError, SessionError};
use super::pool::BufferPool;
use super::registry::Registry;
use super::writer::ResponseWriter;
use crate::queue::RoutedQueue;

const READ_BUFFER_CAPACITY: usize = 4096;
/// Pipelined bytes buffered while a blocking command runs. Past this the
/// connection is treated as overloaded and closed.
const MAX_PENDING_INPUT: usize = 1024 * 1024;

/// State shared by every connection of one server.
#[derive(Debug)]
pub struct SessionContext {
    pub queue: Arc<RoutedQueue>,
    pub registry: Arc<Registry>,
    pub pool: Arc<BufferPool>,
    pub limits: FrameLimits,
}

/// One client connection: read a request, run it, write the reply, repeat.
pub struct Session<R, W> {
    reader: R,
    writer: ResponseWriter<W>,
    buffer: BytesMut,
    shared: Arc<SessionContext>,
    cancel: CancellationToken,
}

impl<R, W> Session<R, W>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    /// `cancel` ends the session and aborts any pop it is blocked in.
    pub fn new(reader: R, writer: W, shared: Arc<SessionContext>, cancel: CancellationToken) -> Self {
        let writer = ResponseWriter::new(writer, Arc::clone(&shared.pool));
        Self {
            reader,
            writer,
            buffer: BytesMut::with_capacity(READ_BUFFER_CAPACITY),
            shared,
            cancel,
        }
    }

    /// Serves requests until the client quits, hangs up, breaks framing, or
    /// the session is cancelled.
    pub async fn run(mut self) -> Result<(), SessionError> {
        loop {
            match codec::decode(&mut self.buffer, &self.shared.limits) {
                Ok(Some(request)) => match self.dispatch(request).await? {
                    Outcome::Continue => {}
                    Outcome::Quit => {
                        debug!("client quit");
                        return Ok(());
                    }
                    Outcome::Cancelled => {
                        debug!("blocked command cancelled");
                        return Ok(());
                    }
                },
                Ok(None) => {
                    if !self.fill().await? {
                        return Ok(());
                    }
                }
                Err(err) => return Err(self.reject(err).await),
            }
        }
    }

    async fn dispatch(&mut self, request: Request) -> Result<Outcome, SessionError> {
        let command = match self.shared.registry.resolve(request) {
            Ok(command) => command,
            Err(err) => {
                debug!(error = %err, "rejected command");
                self.writer.write_error(&err).await?;
                return Ok(Outcome::Continue);
            }
        };
        trace!(command = command.name(), "executing");

        let ctx = ExecContext {
            queue: &self.shared.queue,
            registry: &self.shared.registry,
            cancel: &self.cancel,
        };
        if !command.is_blocking() {
            return command.execute(&ctx, &mut self.writer).await;
        }
        let execution = command.execute(&ctx, &mut self.writer);
        until_hangup(execution, &mut self.reader, &mut self.buffer, &self.cancel).await
    }

    /// Reads more input. `Ok(false)` means the session should end quietly.
    async fn fill(&mut self) -> Result<bool, SessionError> {
        let read = tokio::select! {
            read = self.reader.read_buf(&mut self.buffer) => read?,
            () = self.cancel.cancelled() => return Ok(false),
        };
        if read > 0 {
            return Ok(true);
        }
        if self.buffer.is_empty() {
            debug!("connection closed by client");
            return Ok(false);
        }
        Err(self.reject(FrameError::Truncated).await)
    }

    /// Best-effort error reply for a framing failure; the peer may already
    /// be gone.
    async fn reject(&mut self, err: FrameError) -> SessionError {
        let message = format!("ERR Protocol error: {err}");
        let _ = self.writer.write_error(message).await;
        SessionError::Frame(err)
    }
}

/// Drives `execution` while watching the socket. Pipelined input is buffered
/// for later; EOF, a read error, or more than [`MAX_PENDING_INPUT`] bytes of
/// backlog cancels `cancel` so a blocked pop gives up instead of holding a
/// waiter for a client that is gone or no longer being read.
async fn until_hangup<F, R>(
    execution: F,
    reader: &mut R,
    buffer: &mut BytesMut,
    cancel: &CancellationToken,
) -> F::Output
where
    F: Future,
    R: AsyncRead + Unpin,
{
    tokio::pin!(execution);
    let mut watching = true;
    loop {
        tokio::select! {
            biased;
            output = &mut execution => return output,
            read = reader.read_buf(buffer), if watching => {
                match read {
                    Ok(0) => debug!("client hung up during blocking command"),
                    Ok(_) if buffer.len() < MAX_PENDING_INPUT => continue,
                    Ok(_) => warn!(
                        pending = buffer.len(),
                        "pipelined input limit reached during blocking command"
                    ),
                    Err(err) => debug!(error = %err, "read failed during blocking command"),
                }
                watching = false;
                cancel.cancel();
            }
        }
    }
}
