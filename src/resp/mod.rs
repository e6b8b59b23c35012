// RESP protocol layer: codec, commands, sessions and the TCP server

pub mod codec;
pub mod commands;
pub mod error;
pub mod pool;
pub mod registry;
pub mod reply;
pub mod server;
pub mod session;
pub mod utils;
pub mod writer;

pub use codec::{FrameLimits, Request};
pub use commands::{Command, ExecContext, Outcome};
pub use error::{CommandError, FrameError, SessionError};
pub use pool::BufferPool;
pub use registry::{Registry, RegistryBuilder};
pub use reply::Status;
pub use server::RespServer;
pub use session::{Session, SessionContext};
pub use writer::ResponseWriter;
