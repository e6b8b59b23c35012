use std::cmp::Ordering;

use bytes::Bytes;

/// One queued unit: an opaque payload, its priority, and the per-route
/// sequence number assigned when it was enqueued.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Item {
    value: Bytes,
    priority: i64,
    sequence: u64,
}

impl Item {
    pub(crate) fn new(value: Bytes, priority: i64, sequence: u64) -> Self {
        Self {
            value,
            priority,
            sequence,
        }
    }

    pub fn value(&self) -> &Bytes {
        &self.value
    }

    pub fn priority(&self) -> i64 {
        self.priority
    }

    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    pub fn into_value(self) -> Bytes {
        self.value
    }
}

// `BinaryHeap` is a max-heap: the greatest item is the highest priority and,
// among equal priorities, the smallest sequence number.
impl Ord for Item {
    fn cmp(&self, other: &Self) -> Ordering {
        self.priority
            .cmp(&other.priority)
            .then_with(|| other.sequence.cmp(&self.sequence))
    }
}

impl PartialOrd for Item {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BinaryHeap;

    #[test]
    fn higher_priority_wins() {
        let low = Item::new(Bytes::from_static(b"low"), 1, 0);
        let high = Item::new(Bytes::from_static(b"high"), 5, 1);
        assert!(high > low);
    }

    #[test]
    fn equal_priority_prefers_older_sequence() {
        let mut heap = BinaryHeap::new();
        heap.push(Item::new(Bytes::from_static(b"second"), 3, 1));
        heap.push(Item::new(Bytes::from_static(b"first"), 3, 0));
        heap.push(Item::new(Bytes::from_static(b"third"), 3, 2));

        let order: Vec<_> = std::iter::from_fn(|| heap.pop())
            .map(|item| item.into_value())
            .collect();
        assert_eq!(order, vec!["first", "second", "third"]);
    }

    #[test]
    fn negative_priorities_order_below_zero() {
        let neg = Item::new(Bytes::from_static(b"neg"), -10, 0);
        let zero = Item::new(Bytes::from_static(b"zero"), 0, 1);
        assert!(zero > neg);
    }
}
