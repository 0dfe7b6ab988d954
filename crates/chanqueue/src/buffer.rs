//! Unbounded FIFO buffer shared by the intake and drain loops.

#[cfg(debug_assertions)]
use crate::invariants::debug_assert_buffer_accounting;
use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard, PoisonError};

#[derive(Debug)]
struct Inner<T> {
    items: VecDeque<T>,
    pushed: u64,
    popped: u64,
}

/// Mutex-protected FIFO of pending items.
///
/// Every operation takes the lock for O(1) work and releases it before
/// returning, so the lock is never held across an `.await`. Nothing on the
/// buffer blocks or wakes anyone; signalling is the caller's job.
#[derive(Debug)]
pub struct Buffer<T> {
    inner: Mutex<Inner<T>>,
}

impl<T> Buffer<T> {
    /// Creates an empty buffer.
    pub fn new() -> Self {
        Self::with_capacity(0)
    }

    /// Creates an empty buffer with room for `capacity` items before
    /// reallocating.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            inner: Mutex::new(Inner {
                items: VecDeque::with_capacity(capacity),
                pushed: 0,
                popped: 0,
            }),
        }
    }

    // A panic while holding the lock cannot leave the deque half-modified,
    // so a poisoned lock is still safe to use.
    fn lock(&self) -> MutexGuard<'_, Inner<T>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Appends an item at the tail. Always succeeds.
    pub fn push(&self, item: T) {
        let mut inner = self.lock();
        inner.items.push_back(item);
        inner.pushed += 1;

        #[cfg(debug_assertions)]
        debug_assert_buffer_accounting!(inner.items.len(), inner.pushed, inner.popped);
    }

    /// Removes and returns the head item, or `None` if the buffer is empty.
    pub fn pop(&self) -> Option<T> {
        let mut inner = self.lock();
        let item = inner.items.pop_front()?;
        inner.popped += 1;

        #[cfg(debug_assertions)]
        debug_assert_buffer_accounting!(inner.items.len(), inner.pushed, inner.popped);

        Some(item)
    }

    /// Returns the number of resident items.
    pub fn len(&self) -> usize {
        self.lock().items.len()
    }

    /// Returns `true` if no items are resident.
    pub fn is_empty(&self) -> bool {
        self.lock().items.is_empty()
    }

    /// Total items ever pushed.
    pub fn pushed(&self) -> u64 {
        self.lock().pushed
    }

    /// Total items ever popped.
    pub fn popped(&self) -> u64 {
        self.lock().popped
    }
}

impl<T> Default for Buffer<T> {
    fn default() -> Self {
        Self::new()
    }
}
