//! Bounded multi-producer multi-consumer FIFO queue.
//!
//! The protocol is Dmitry Vyukov's bounded MPMC design: every slot carries
//! its own sequence counter and the two cursors only hand out logical
//! positions. A slot at position `p` reads `seq == p` while it awaits its
//! producer, `seq == p + 1` once the value is published and `seq == p + N`
//! after the consumer releases it into the next generation. Because each
//! slot signals readiness independently there is no shared size word and no
//! lock anywhere.
//!
//! ## Examples
//! ```
//! use seqring::MpmcQueue;
//!
//! let queue = MpmcQueue::<u32>::new(4);
//!
//! assert!(queue.try_push(1).is_ok());
//! assert!(queue.try_push(2).is_ok());
//!
//! assert_eq!(queue.try_pop(), Ok(1));
//! assert_eq!(queue.try_pop(), Ok(2));
//! assert!(queue.try_pop().is_err());
//! ```

use crate::error::{Empty, Full};
use crate::ring::{Heap, IndexMode, Inline, PowerOfTwo, RingBuffer, Storage};
use crossbeam_utils::{Backoff, CachePadded};
use std::sync::atomic::{AtomicU64, Ordering};

/// Bounded lock-free MPMC queue.
///
/// `push`/`pop` spin until they complete; `try_push`/`try_pop` return
/// immediately when the queue is full or empty. Share the queue by
/// reference or inside an `Arc`; all operations take `&self`.
///
/// The index mode `M` selects mask or modulo slot mapping, the storage `S`
/// heap or inline slot placement. The defaults (power-of-two capacity on
/// the heap) fit most workloads.
pub struct MpmcQueue<T, M: IndexMode = PowerOfTwo, S: Storage<T> = Heap<T>> {
    buffer: CachePadded<RingBuffer<T, M, S>>,
    head: CachePadded<AtomicU64>,
    tail: CachePadded<AtomicU64>,
}

impl<T, M: IndexMode> MpmcQueue<T, M, Heap<T>> {
    /// Create a queue with `capacity` heap-allocated slots.
    ///
    /// ## Panics
    /// When `capacity` is below 2 or, under [`PowerOfTwo`], not a power of
    /// two.
    pub fn new(capacity: usize) -> Self {
        Self::with_buffer(RingBuffer::new(capacity))
    }
}

impl<T, M: IndexMode, const N: usize> MpmcQueue<T, M, Inline<T, N>> {
    /// Create a queue with `N` slots stored inline.
    ///
    /// ## Panics
    /// When `N` violates the index mode constraint.
    pub fn new_inline() -> Self {
        Self::with_buffer(RingBuffer::new_inline())
    }
}

impl<T, M: IndexMode, S: Storage<T>> MpmcQueue<T, M, S> {
    fn with_buffer(buffer: RingBuffer<T, M, S>) -> Self {
        Self {
            buffer: CachePadded::new(buffer),
            head: CachePadded::new(AtomicU64::new(0)),
            tail: CachePadded::new(AtomicU64::new(0)),
        }
    }

    /// Attempt to push without blocking. Returns the value inside
    /// [`Full`] when the queue is full.
    pub fn try_push(&self, value: T) -> Result<(), Full<T>> {
        let mut pos = self.tail.load(Ordering::Relaxed);
        loop {
            let cell = self.buffer.slot(pos);
            let seq = cell.seq_load(Ordering::Acquire);
            let diff = seq.wrapping_sub(pos) as i64;
            if diff == 0 {
                // slot awaits this generation's producer, claim it
                match self.tail.compare_exchange_weak(
                    pos,
                    pos + 1,
                    Ordering::Relaxed,
                    Ordering::Relaxed,
                ) {
                    Ok(_) => {
                        unsafe { cell.construct(value) };
                        cell.seq_store(pos + 1, Ordering::Release);
                        return Ok(());
                    }
                    Err(current) => pos = current,
                }
            } else if diff < 0 {
                // the previous generation's consumer has not released the slot
                return Err(Full(value));
            } else {
                // lost the race to another producer
                pos = self.tail.load(Ordering::Relaxed);
            }
        }
    }

    /// Push, spinning until a slot becomes available.
    ///
    /// The ticket is taken unconditionally, so a stalled consumer side spins
    /// this producer on its own slot only; the rest of the ring keeps making
    /// progress. Callers that need a timeout must loop over
    /// [`try_push`](MpmcQueue::try_push) instead.
    pub fn push(&self, value: T) {
        let pos = self.tail.fetch_add(1, Ordering::Relaxed);
        let cell = self.buffer.slot(pos);
        let backoff = Backoff::new();
        while cell.seq_load(Ordering::Acquire) != pos {
            backoff.snooze();
        }
        unsafe { cell.construct(value) };
        cell.seq_store(pos + 1, Ordering::Release);
    }

    /// Attempt to pop without blocking. Returns [`Empty`] when no value is
    /// available.
    pub fn try_pop(&self) -> Result<T, Empty> {
        let mut pos = self.head.load(Ordering::Relaxed);
        loop {
            let cell = self.buffer.slot(pos);
            let seq = cell.seq_load(Ordering::Acquire);
            let diff = seq.wrapping_sub(pos + 1) as i64;
            if diff == 0 {
                // slot holds this generation's value, claim it
                match self.head.compare_exchange_weak(
                    pos,
                    pos + 1,
                    Ordering::Relaxed,
                    Ordering::Relaxed,
                ) {
                    Ok(_) => {
                        let value = unsafe { cell.take() };
                        cell.seq_store(pos + self.capacity() as u64, Ordering::Release);
                        return Ok(value);
                    }
                    Err(current) => pos = current,
                }
            } else if diff < 0 {
                return Err(Empty);
            } else {
                // lost the race to another consumer
                pos = self.head.load(Ordering::Relaxed);
            }
        }
    }

    /// Pop, spinning until a value becomes available.
    pub fn pop(&self) -> T {
        let pos = self.head.fetch_add(1, Ordering::Relaxed);
        let cell = self.buffer.slot(pos);
        let backoff = Backoff::new();
        while cell.seq_load(Ordering::Acquire) != pos + 1 {
            backoff.snooze();
        }
        let value = unsafe { cell.take() };
        cell.seq_store(pos + self.capacity() as u64, Ordering::Release);
        value
    }

    /// Maximum number of elements the queue can hold.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.buffer.capacity()
    }

    /// Number of elements, approximated from a racy cursor snapshot.
    pub fn len(&self) -> usize {
        let tail = self.tail.load(Ordering::Relaxed);
        let head = self.head.load(Ordering::Relaxed);
        tail.saturating_sub(head) as usize
    }

    /// Whether the queue appears empty. Racy, like [`len`](MpmcQueue::len).
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<T, M: IndexMode, S: Storage<T>> Drop for MpmcQueue<T, M, S> {
    fn drop(&mut self) {
        // destroy any values still in place; the per-cell flag covers both
        // normal residue and slots wedged by an abandoned blocking push
        for cell in self.buffer.cells() {
            unsafe { cell.destroy() };
        }
    }
}
