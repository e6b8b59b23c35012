use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use bytes::Bytes;
use thiserror::Error;
use tokio::sync::oneshot;
use tokio_util::sync::CancellationToken;

use super::item::Item;
use super::route::Route;

/// Returned by [`RoutedQueue::dequeue`] when the caller's token fired before
/// an item arrived.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("dequeue cancelled")]
pub struct Cancelled;

/// A set of independent max-priority queues keyed by route name.
///
/// One table-wide lock guards the route map, every heap and every waiter
/// list, so checking for an item and registering as a waiter happen
/// atomically with respect to `enqueue`. The lock is never held across an
/// await point.
///
/// Routes are created on first use and never removed.
#[derive(Debug, Default)]
pub struct RoutedQueue {
    routes: Mutex<HashMap<String, Route>>,
}

impl RoutedQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `value` to `route` and wakes at most one waiter on that route.
    /// Returns the sequence number assigned to the item.
    pub fn enqueue(&self, route: &str, value: impl Into<Bytes>, priority: i64) -> u64 {
        let mut routes = self.lock();
        route_mut(&mut routes, route).enqueue(value.into(), priority)
    }

    /// Removes the highest-priority item of `route`, waiting for one if the
    /// route is empty.
    ///
    /// Returns [`Cancelled`] if `cancel` fires first. An item that was
    /// handed over in the same instant is put back on the route instead of
    /// being lost.
    pub async fn dequeue(&self, route: &str, cancel: &CancellationToken) -> Result<Item, Cancelled> {
        loop {
            let rx = {
                let mut routes = self.lock();
                match route_mut(&mut routes, route).pop_or_wait() {
                    Ok(item) => return Ok(item),
                    Err(rx) => rx,
                }
            };

            let mut waiter = Waiter::new(self, route, rx);
            let received = tokio::select! {
                biased;
                received = waiter.recv() => received,
                () = cancel.cancelled() => return Err(Cancelled),
            };
            match received {
                Some(item) => return Ok(item),
                // Sender dropped without delivering: look at the heap again.
                None => continue,
            }
        }
    }

    /// Number of items currently queued on `route`.
    pub fn length(&self, route: &str) -> usize {
        let mut routes = self.lock();
        route_mut(&mut routes, route).len()
    }

    /// Number of dequeuers currently blocked on `route`.
    pub fn waiters(&self, route: &str) -> usize {
        self.lock().get(route).map_or(0, Route::live_waiters)
    }

    pub fn route_count(&self) -> usize {
        self.lock().len()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, Route>> {
        // Nothing inside the lock panics midway through a mutation.
        self.routes.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn route_mut<'a>(routes: &'a mut HashMap<String, Route>, name: &str) -> &'a mut Route {
    routes.entry(name.to_owned()).or_default()
}

/// A registered dequeuer. Dropping it before it received an item
/// unregisters it and restores anything delivered in the meantime.
struct Waiter<'a> {
    queue: &'a RoutedQueue,
    route: &'a str,
    rx: oneshot::Receiver<Item>,
    settled: bool,
}

impl<'a> Waiter<'a> {
    fn new(queue: &'a RoutedQueue, route: &'a str, rx: oneshot::Receiver<Item>) -> Self {
        Self {
            queue,
            route,
            rx,
            settled: false,
        }
    }

    async fn recv(&mut self) -> Option<Item> {
        let received = (&mut self.rx).await.ok();
        self.settled = true;
        received
    }
}

impl Drop for Waiter<'_> {
    fn drop(&mut self) {
        if self.settled {
            return;
        }
        // After close() no sender can succeed, so try_recv sees every item
        // that was handed to us.
        self.rx.close();
        let delivered = self.rx.try_recv().ok();

        let mut routes = self.queue.lock();
        let route = route_mut(&mut routes, self.route);
        if let Some(item) = delivered {
            route.offer(item);
        }
        route.prune_waiters();
    }
}
