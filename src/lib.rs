// khronos - in-memory routed priority queue spoken over RESP
//
// This library provides the queue, the protocol layer and the server.
// Binary entry point is in src/main.rs

pub mod config;
pub mod queue;
pub mod resp;

pub use config::RespConfig;
pub use queue::{Cancelled, Item, RoutedQueue};
pub use resp::{Registry, RespServer};
