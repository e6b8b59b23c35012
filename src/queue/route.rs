use std::collections::{BinaryHeap, VecDeque};

use bytes::Bytes;
use tokio::sync::oneshot;

use super::item::Item;

/// State of a single route. Only ever touched while the routing table lock
/// is held.
#[derive(Debug, Default)]
pub(crate) struct Route {
    heap: BinaryHeap<Item>,
    next_sequence: u64,
    waiters: VecDeque<oneshot::Sender<Item>>,
}

impl Route {
    /// Stamps a new item with the next sequence number and offers it.
    pub(crate) fn enqueue(&mut self, value: Bytes, priority: i64) -> u64 {
        let sequence = self.next_sequence;
        self.next_sequence += 1;
        self.offer(Item::new(value, priority, sequence));
        sequence
    }

    /// Hands `item` to the oldest live waiter, or stores it in the heap when
    /// nobody is waiting.
    ///
    /// A waiter only registers while the heap is empty, so delivering past
    /// the heap never breaks priority order.
    pub(crate) fn offer(&mut self, mut item: Item) {
        while let Some(waiter) = self.waiters.pop_front() {
            match waiter.send(item) {
                Ok(()) => return,
                // Receiver went away (cancelled pop); try the next one.
                Err(returned) => item = returned,
            }
        }
        self.heap.push(item);
    }

    /// Pops the best item, or registers a waiter and returns its receiver.
    pub(crate) fn pop_or_wait(&mut self) -> Result<Item, oneshot::Receiver<Item>> {
        if let Some(item) = self.heap.pop() {
            return Ok(item);
        }
        let (tx, rx) = oneshot::channel();
        self.waiters.push_back(tx);
        Err(rx)
    }

    pub(crate) fn prune_waiters(&mut self) {
        self.waiters.retain(|tx| !tx.is_closed());
    }

    pub(crate) fn len(&self) -> usize {
        self.heap.len()
    }

    pub(crate) fn live_waiters(&self) -> usize {
        self.waiters.iter().filter(|tx| !tx.is_closed()).count()
    }
}
