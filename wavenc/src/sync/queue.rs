use std::collections::VecDeque;

use parking_lot::{Condvar, Mutex};

use crate::utils::errors::QueueError;

/// Fixed-capacity FIFO shared between producer and consumer threads.
///
/// `enqueue` blocks while the queue is full and `dequeue` blocks while it is
/// empty. A single lock guards the items; `not_full` and `not_empty` play the
/// role of the free-slot and occupied-slot counters. Every wait re-checks its
/// predicate, so spurious wakeups are harmless.
#[derive(Debug)]
pub struct BoundedQueue<T> {
    items: Mutex<VecDeque<T>>,
    capacity: usize,
    not_full: Condvar,
    not_empty: Condvar,
}

impl<T> BoundedQueue<T> {
    /// Creates a queue holding at most `capacity` items. Returns `None` for a
    /// zero capacity, which could never accept an item.
    pub fn new(capacity: usize) -> Option<Self> {
        (capacity > 0).then(|| Self {
            items: Mutex::new(VecDeque::new()),
            capacity,
            not_full: Condvar::new(),
            not_empty: Condvar::new(),
        })
    }

    /// Appends `item`, waiting for a free slot first.
    ///
    /// If storage cannot grow, the item is handed back and no slot is consumed.
    pub fn enqueue(&self, item: T) -> Result<(), QueueError<T>> {
        let mut items = self.items.lock();
        while items.len() >= self.capacity {
            self.not_full.wait(&mut items);
        }

        if items.try_reserve(1).is_err() {
            drop(items);
            // Pass the wakeup on; this producer did not take the slot.
            self.not_full.notify_one();
            return Err(QueueError::Alloc(item));
        }
        items.push_back(item);
        drop(items);

        self.not_empty.notify_one();
        Ok(())
    }

    /// Removes the oldest item, waiting for one to arrive first.
    pub fn dequeue(&self) -> T {
        let mut items = self.items.lock();
        let item = loop {
            match items.pop_front() {
                Some(item) => break item,
                None => self.not_empty.wait(&mut items),
            }
        };
        drop(items);

        self.not_full.notify_one();
        item
    }

    /// Removes the oldest item if one is available right now.
    pub fn try_dequeue(&self) -> Option<T> {
        let item = self.items.lock().pop_front()?;
        self.not_full.notify_one();
        Some(item)
    }

    pub fn size(&self) -> usize {
        self.items.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.size() == 0
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::thread;
    use std::time::Duration;

    #[test]
    fn zero_capacity_is_rejected() {
        assert!(BoundedQueue::<u8>::new(0).is_none());
    }

    #[test]
    fn fifo_order() {
        let queue = BoundedQueue::new(4).unwrap();
        for i in 0..4 {
            queue.enqueue(i).unwrap();
        }
        assert_eq!(queue.size(), 4);
        assert_eq!((0..4).map(|_| queue.dequeue()).collect::<Vec<_>>(), [0, 1, 2, 3]);
        assert!(queue.is_empty());
        assert_eq!(queue.try_dequeue(), None);
    }

    #[test]
    fn enqueue_blocks_until_slot_frees() {
        let queue = Arc::new(BoundedQueue::new(1).unwrap());
        queue.enqueue(1u32).unwrap();

        let producer = {
            let queue = Arc::clone(&queue);
            thread::spawn(move || queue.enqueue(2u32).unwrap())
        };

        thread::sleep(Duration::from_millis(50));
        assert!(!producer.is_finished());
        assert_eq!(queue.size(), 1);

        assert_eq!(queue.dequeue(), 1);
        producer.join().unwrap();
        assert_eq!(queue.dequeue(), 2);
    }

    #[test]
    fn dequeue_blocks_until_item_arrives() {
        let queue = Arc::new(BoundedQueue::new(2).unwrap());

        let consumer = {
            let queue = Arc::clone(&queue);
            thread::spawn(move || queue.dequeue())
        };

        thread::sleep(Duration::from_millis(50));
        assert!(!consumer.is_finished());

        queue.enqueue("wake").unwrap();
        assert_eq!(consumer.join().unwrap(), "wake");
    }

    #[test]
    fn many_producers_and_consumers_lose_nothing() {
        const PRODUCERS: usize = 4;
        const CONSUMERS: usize = 3;
        const PER_PRODUCER: usize = 500;
        const CAPACITY: usize = 3;

        let queue = Arc::new(BoundedQueue::new(CAPACITY).unwrap());
        let max_seen = Arc::new(AtomicUsize::new(0));

        let producers: Vec<_> = (0..PRODUCERS)
            .map(|p| {
                let queue = Arc::clone(&queue);
                let max_seen = Arc::clone(&max_seen);
                thread::spawn(move || {
                    for i in 0..PER_PRODUCER {
                        queue.enqueue(Some(p * PER_PRODUCER + i)).unwrap();
                        max_seen.fetch_max(queue.size(), Ordering::Relaxed);
                    }
                })
            })
            .collect();

        let consumers: Vec<_> = (0..CONSUMERS)
            .map(|_| {
                let queue = Arc::clone(&queue);
                thread::spawn(move || {
                    let mut got = Vec::new();
                    while let Some(value) = queue.dequeue() {
                        got.push(value);
                    }
                    got
                })
            })
            .collect();

        for producer in producers {
            producer.join().unwrap();
        }
        for _ in 0..CONSUMERS {
            queue.enqueue(None).unwrap();
        }

        let mut seen = HashSet::new();
        let mut total = 0;
        for consumer in consumers {
            for value in consumer.join().unwrap() {
                assert!(seen.insert(value), "duplicate {value}");
                total += 1;
            }
        }

        assert_eq!(total, PRODUCERS * PER_PRODUCER);
        assert!(max_seen.load(Ordering::Relaxed) <= CAPACITY);
        assert!(queue.is_empty());
    }
}
