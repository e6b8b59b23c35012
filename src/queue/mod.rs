// Routed priority queue

pub mod item;
mod route;
pub mod routed_queue;

pub use item::Item;
pub use routed_queue::{Cancelled, RoutedQueue};
