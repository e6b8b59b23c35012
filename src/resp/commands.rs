use bytes::Bytes;
use tokio::io::AsyncWrite;
use tokio_util::sync::CancellationToken;

use super::error::{CommandError, SessionError};
use super::registry::Registry;
use super::reply::Status;
use super::utils::{expect_arity, extract_integer, extract_string};
use super::writer::ResponseWriter;
use crate::queue::RoutedQueue;

/// A validated request, ready to run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Ping(Option<Bytes>),
    Echo(Bytes),
    Push {
        route: String,
        value: Bytes,
        priority: i64,
    },
    Pop {
        route: String,
    },
    Length {
        route: String,
    },
    Command,
    Quit,
}

/// What the session does after a command ran.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Continue,
    /// The client asked to close.
    Quit,
    /// A blocking command was aborted because the connection is closing.
    Cancelled,
}

/// Everything a command may touch while executing.
pub struct ExecContext<'a> {
    pub queue: &'a RoutedQueue,
    pub registry: &'a Registry,
    pub cancel: &'a CancellationToken,
}

impl Command {
    /// PING [message]
    pub fn ping(args: Vec<Bytes>) -> Result<Self, CommandError> {
        let mut args = args.into_iter();
        match (args.next(), args.next()) {
            (message, None) => Ok(Command::Ping(message)),
            _ => Err(CommandError::WrongArity("ping")),
        }
    }

    /// ECHO message
    pub fn echo(args: Vec<Bytes>) -> Result<Self, CommandError> {
        let [message] = expect_arity::<1>("echo", args)?;
        Ok(Command::Echo(message))
    }

    /// PUSH route value priority
    pub fn push(args: Vec<Bytes>) -> Result<Self, CommandError> {
        let [route, value, priority] = expect_arity::<3>("push", args)?;
        Ok(Command::Push {
            route: extract_string(&route),
            value,
            priority: extract_integer(&priority)?,
        })
    }

    /// POP route (blocks while the route is empty)
    pub fn pop(args: Vec<Bytes>) -> Result<Self, CommandError> {
        let [route] = expect_arity::<1>("pop", args)?;
        Ok(Command::Pop {
            route: extract_string(&route),
        })
    }

    /// LENGTH route
    pub fn length(args: Vec<Bytes>) -> Result<Self, CommandError> {
        let [route] = expect_arity::<1>("length", args)?;
        Ok(Command::Length {
            route: extract_string(&route),
        })
    }

    /// COMMAND - list registered command names
    pub fn command(args: Vec<Bytes>) -> Result<Self, CommandError> {
        let [] = expect_arity::<0>("command", args)?;
        Ok(Command::Command)
    }

    /// QUIT
    pub fn quit(args: Vec<Bytes>) -> Result<Self, CommandError> {
        let [] = expect_arity::<0>("quit", args)?;
        Ok(Command::Quit)
    }

    pub fn name(&self) -> &'static str {
        match self {
            Command::Ping(_) => "ping",
            Command::Echo(_) => "echo",
            Command::Push { .. } => "push",
            Command::Pop { .. } => "pop",
            Command::Length { .. } => "length",
            Command::Command => "command",
            Command::Quit => "quit",
        }
    }

    /// Whether executing may suspend until another client acts.
    pub fn is_blocking(&self) -> bool {
        matches!(self, Command::Pop { .. })
    }

    /// Runs the command and writes its reply.
    pub async fn execute<W>(
        self,
        ctx: &ExecContext<'_>,
        writer: &mut ResponseWriter<W>,
    ) -> Result<Outcome, SessionError>
    where
        W: AsyncWrite + Unpin,
    {
        match self {
            Command::Ping(None) => writer.write_status(Status::Pong).await?,
            Command::Ping(Some(message)) | Command::Echo(message) => {
                writer.write_bulk(&message).await?
            }
            Command::Push {
                route,
                value,
                priority,
            } => {
                ctx.queue.enqueue(&route, value, priority);
                writer.write_status(Status::Ok).await?
            }
            Command::Pop { route } => match ctx.queue.dequeue(&route, ctx.cancel).await {
                Ok(item) => writer.write_bulk(item.value()).await?,
                Err(_) => return Ok(Outcome::Cancelled),
            },
            Command::Length { route } => {
                let len = i64::try_from(ctx.queue.length(&route)).unwrap_or(i64::MAX);
                writer.write_integer(len).await?
            }
            Command::Command => writer.write_array(ctx.registry.names()).await?,
            Command::Quit => {
                writer.write_terminator().await?;
                return Ok(Outcome::Quit);
            }
        }
        Ok(Outcome::Continue)
    }
}
