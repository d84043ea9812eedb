//! Fixed-Capacity Circular Buffer for Reading History
//!
//! ## Overview
//!
//! The feed keeps the N most recent readings. A ring buffer gives that with
//! constant-time insertion and no reallocation once the storage is sized:
//! - O(1) insertion (overwrites oldest when full)
//! - O(1) access to the most recent item
//! - O(n) iteration in either direction
//!
//! Capacity is chosen at runtime because it comes from the feed configuration
//! (the dashboard uses 50, the feed default is 100).
//!
//! ### Memory Layout
//!
//! ```text
//! CircularBuffer with capacity 5, after 7 pushes (items 0..=6):
//! ┌─────┬─────┬─────┬─────┬─────┐
//! │  5  │  6  │  2  │  3  │  4  │  ← physical slots
//! └─────┴─────┴─────┴─────┴─────┘
//!             ↑
//!             └── write_pos = 2 (also the oldest item once full)
//!
//! iter()        → 2, 3, 4, 5, 6   (oldest first)
//! iter_recent() → 6, 5, 4, 3, 2   (newest first)
//! ```
//!
//! ## Usage Example
//!
//! ```rust
//! use roadvision_core::buffer::CircularBuffer;
//!
//! let mut history = CircularBuffer::new(3).unwrap();
//! for road_state in ["dry", "wet", "icy", "dry"] {
//!     history.push(road_state);
//! }
//!
//! let newest_first: Vec<_> = history.iter_recent().copied().collect();
//! assert_eq!(newest_first, ["dry", "icy", "wet"]);
//! ```

/// Fixed-capacity ring buffer that evicts its oldest item when full
///
/// ## Internal Invariants
///
/// - `slots.len() == capacity` and `capacity > 0`
/// - `write_pos < capacity`
/// - `len <= capacity`
/// - the `len` logical items are `Some`; when full, the oldest sits at `write_pos`
#[derive(Debug, Clone)]
pub struct CircularBuffer<T> {
    /// Storage; `None` marks a slot that was never written or was cleared
    slots: Vec<Option<T>>,

    /// Index where the next write will occur
    write_pos: usize,

    /// Current number of stored items
    len: usize,
}

impl<T> CircularBuffer<T> {
    /// Create an empty buffer holding at most `capacity` items
    ///
    /// Returns `None` for a zero capacity, which could never hold a reading.
    pub fn new(capacity: usize) -> Option<Self> {
        if capacity == 0 {
            return None;
        }
        let mut slots = Vec::with_capacity(capacity);
        slots.resize_with(capacity, || None);
        Some(Self {
            slots,
            write_pos: 0,
            len: 0,
        })
    }

    /// Add an item, returning the evicted oldest item when the buffer was full
    pub fn push(&mut self, item: T) -> Option<T> {
        let evicted = self.slots[self.write_pos].replace(item);
        self.write_pos = (self.write_pos + 1) % self.capacity();

        if self.len < self.capacity() {
            self.len += 1;
        }
        evicted
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn is_full(&self) -> bool {
        self.len == self.capacity()
    }

    /// Most recently pushed item
    pub fn latest(&self) -> Option<&T> {
        if self.is_empty() {
            return None;
        }
        let idx = if self.write_pos == 0 {
            self.capacity() - 1
        } else {
            self.write_pos - 1
        };
        self.slots[idx].as_ref()
    }

    /// Iterate from oldest to newest
    pub fn iter(&self) -> Iter<'_, T> {
        Iter {
            buffer: self,
            front: 0,
            back: self.len,
        }
    }

    /// Iterate from newest to oldest
    pub fn iter_recent(&self) -> core::iter::Rev<Iter<'_, T>> {
        self.iter().rev()
    }

    /// Drop every item, keeping the capacity
    pub fn clear(&mut self) {
        self.slots.iter_mut().for_each(|slot| *slot = None);
        self.write_pos = 0;
        self.len = 0;
    }

    /// Item at logical index (0 = oldest, len-1 = newest)
    ///
    /// ```text
    /// Physical:  [D, E, A, B, C]  (write_pos = 2, full)
    /// Logical:   [A, B, C, D, E]
    /// logical[i] = physical[(write_pos + i) % capacity]
    /// ```
    pub fn get(&self, index: usize) -> Option<&T> {
        if index >= self.len {
            return None;
        }
        let physical = if self.is_full() {
            (self.write_pos + index) % self.capacity()
        } else {
            // Not full yet: data starts at 0
            index
        };
        self.slots[physical].as_ref()
    }
}

/// Iterator over buffer contents, oldest first
pub struct Iter<'a, T> {
    buffer: &'a CircularBuffer<T>,
    front: usize,
    back: usize,
}

impl<'a, T> Iterator for Iter<'a, T> {
    type Item = &'a T;

    fn next(&mut self) -> Option<Self::Item> {
        if self.front >= self.back {
            return None;
        }
        let item = self.buffer.get(self.front)?;
        self.front += 1;
        Some(item)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.back - self.front;
        (remaining, Some(remaining))
    }
}

impl<'a, T> DoubleEndedIterator for Iter<'a, T> {
    fn next_back(&mut self) -> Option<Self::Item> {
        if self.front >= self.back {
            return None;
        }
        self.back -= 1;
        self.buffer.get(self.back)
    }
}

impl<'a, T> ExactSizeIterator for Iter<'a, T> {}
