use thiserror::Error;

/// Malformed request bytes. The stream cannot be resynchronised after one of
/// these, so the connection is closed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FrameError {
    #[error("expected '{expected}', got '{}'", .found.escape_ascii())]
    UnexpectedByte { expected: char, found: u8 },
    #[error("invalid {0} length")]
    InvalidLength(&'static str),
    #[error("empty request")]
    EmptyRequest,
    #[error("too many arguments ({count} > {max})")]
    TooManyArguments { count: usize, max: usize },
    #[error("bulk string too large ({len} > {max})")]
    BulkTooLarge { len: usize, max: usize },
    #[error("header line too long")]
    LineTooLong,
    #[error("bulk string not terminated by CRLF")]
    MissingTerminator,
    #[error("connection closed mid-frame")]
    Truncated,
}

/// A request that framed correctly but cannot be executed. Written back to
/// the client; the connection stays open.
///
/// `Display` is the exact text sent in the error reply.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommandError {
    #[error("ERR wrong number of arguments for '{0}' command")]
    WrongArity(&'static str),
    #[error("ERR unknown command '{name}'")]
    UnknownCommand { name: String },
    #[error("ERR wrong command '{name}' args = {}", .args.join(" "))]
    WrongCommand { name: String, args: Vec<String> },
    #[error("ERR value is not an integer or out of range")]
    NotAnInteger,
}

impl CommandError {
    /// Resolution failure for `name`, keeping the arguments for diagnostics.
    pub fn unknown(name: String, args: Vec<String>) -> Self {
        if args.is_empty() {
            Self::UnknownCommand { name }
        } else {
            Self::WrongCommand { name, args }
        }
    }
}

/// Reasons a connection ends abnormally.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("transport error: {0}")]
    Io(#[from] std::io::Error),
    #[error("protocol error: {0}")]
    Frame(#[from] FrameError),
}
