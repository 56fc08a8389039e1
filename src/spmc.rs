//! Single-producer broadcast queue.
//!
//! One writer appends values indefinitely; any number of readers walk the
//! stream independently, each with its own cursor. A reader that falls a
//! full ring behind is lapped: its next read resynchronizes to the most
//! recently published slot and the intervening values are lost. The writer
//! never waits and is not part of any congestion control flow.
//!
//! ## Examples
//! ```
//! use seqring::SpmcQueue;
//!
//! let mut writer = SpmcQueue::<u64>::new(8).into_writer();
//! let mut reader = writer.reader();
//!
//! writer.push(1);
//! writer.push(2);
//!
//! assert_eq!(reader.read(), Some(1));
//! assert_eq!(reader.read(), Some(2));
//! assert_eq!(reader.read(), None);
//! ```

use crate::ring::{Heap, IndexMode, Inline, PowerOfTwo, RingBuffer, Storage};
use std::sync::atomic::Ordering;
use std::sync::Arc;

/// Broadcast ring shared between one [`Writer`] and its [`Reader`]s.
///
/// Construct with [`new`](SpmcQueue::new) (or
/// [`new_inline`](SpmcQueue::new_inline)) and convert into the writer
/// handle with [`into_writer`](SpmcQueue::into_writer); readers are created
/// from the writer.
///
/// A slot's sequence equals the writer position at which it was last
/// published; slots start at 0 so an unwritten slot always reads as "writer
/// not yet here" to every reader.
pub struct SpmcQueue<T, M: IndexMode = PowerOfTwo, S: Storage<T> = Heap<T>> {
    buffer: RingBuffer<T, M, S>,
}

impl<T, M: IndexMode> SpmcQueue<T, M, Heap<T>> {
    /// Create a broadcast ring with `capacity` heap-allocated slots.
    ///
    /// ## Panics
    /// When `capacity` violates the index mode constraint.
    pub fn new(capacity: usize) -> Self {
        Self {
            buffer: RingBuffer::with_seq_init(capacity, |_| 0),
        }
    }
}

impl<T, M: IndexMode, const N: usize> SpmcQueue<T, M, Inline<T, N>> {
    /// Create a broadcast ring with `N` slots stored inline.
    ///
    /// ## Panics
    /// When `N` violates the index mode constraint.
    pub fn new_inline() -> Self {
        Self {
            buffer: RingBuffer::with_seq_init_inline(|_| 0),
        }
    }
}

impl<T, M: IndexMode, S: Storage<T>> SpmcQueue<T, M, S> {
    /// Number of slots in the ring.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.buffer.capacity()
    }

    /// Consume `self` and return the writer handle for this ring. Only a
    /// single writer exists at any time; readers are created from it.
    pub fn into_writer(self) -> Writer<T, M, S> {
        Writer {
            queue: Arc::new(self),
            write_idx: 0,
        }
    }
}

impl<T, M: IndexMode, S: Storage<T>> Drop for SpmcQueue<T, M, S> {
    fn drop(&mut self) {
        // destroy whatever the writer left in place
        for cell in self.buffer.cells() {
            unsafe { cell.destroy() };
        }
    }
}

/// Publishes values to the ring. Not cloneable; the single-writer invariant
/// is what lets `write_idx` stay a plain integer.
pub struct Writer<T, M: IndexMode = PowerOfTwo, S: Storage<T> = Heap<T>> {
    queue: Arc<SpmcQueue<T, M, S>>,
    write_idx: u64,
}

impl<T, M: IndexMode, S: Storage<T>> Writer<T, M, S> {
    /// Publish a value. Never waits; when the ring is full the oldest slot
    /// is overwritten and lagging readers lose it.
    ///
    /// The position is pre-incremented, so position 0 is a sentinel that is
    /// never published and readers can treat sequence 0 as "unwritten".
    pub fn push(&mut self, value: T) {
        self.write_idx += 1;
        let cell = self.queue.buffer.slot(self.write_idx);
        // the writer owns every slot between publications
        unsafe {
            cell.destroy();
            cell.construct(value);
        }
        cell.seq_store(self.write_idx, Ordering::Release);
    }

    /// Create a reader positioned after the most recent write, so it
    /// observes only values published from this point on.
    pub fn reader(&self) -> Reader<T, M, S> {
        Reader {
            queue: self.queue.clone(),
            next_idx: self.write_idx + 1,
        }
    }

    /// Position of the most recent write (0 before the first push).
    #[inline]
    pub fn position(&self) -> u64 {
        self.write_idx
    }

    /// Number of slots in the ring.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.queue.capacity()
    }
}

/// Consumes the stream published by a [`Writer`]. Readers never coordinate
/// with each other or with the writer; cloning one yields an independent
/// reader at the same position.
pub struct Reader<T, M: IndexMode = PowerOfTwo, S: Storage<T> = Heap<T>> {
    queue: Arc<SpmcQueue<T, M, S>>,
    next_idx: u64,
}

impl<T, M: IndexMode, S: Storage<T>> Clone for Reader<T, M, S> {
    fn clone(&self) -> Self {
        Self {
            queue: self.queue.clone(),
            next_idx: self.next_idx,
        }
    }
}

impl<T, M: IndexMode, S: Storage<T>> Reader<T, M, S> {
    /// Read the next value, or `None` when the writer has not published
    /// past this reader's position yet.
    ///
    /// When the writer has lapped this reader the cursor resynchronizes to
    /// the most recently published slot and the intervening values are
    /// skipped; [`position`](Reader::position) exposes the jump. The copy
    /// is validated against the slot sequence and retried if the writer
    /// overwrote the slot mid-read, so the returned value is never torn.
    pub fn read(&mut self) -> Option<T>
    where
        T: Copy,
    {
        loop {
            let cell = self.queue.buffer.slot(self.next_idx);
            let seq = cell.seq_load(Ordering::Acquire);
            if (seq.wrapping_sub(self.next_idx) as i64) < 0 {
                // writer has not reached this position
                return None;
            }
            let value = unsafe { cell.read() };
            if cell.seq_load(Ordering::Acquire) == seq {
                self.next_idx = seq + 1;
                return Some(value);
            }
            // overwritten mid-copy, retry against the newer sequence
        }
    }

    /// Read the next value in place, without copying. Advances the cursor
    /// exactly like [`read`](Reader::read).
    ///
    /// ## Safety
    /// The returned reference stays valid only until the writer reaches
    /// this slot again, i.e. for at most `capacity` further pushes. The
    /// caller must be done with it before then; for `Copy` element types
    /// the safe [`read`](Reader::read) is the better choice.
    pub unsafe fn read_in_place(&mut self) -> Option<&T> {
        let cell = self.queue.buffer.slot(self.next_idx);
        let seq = cell.seq_load(Ordering::Acquire);
        if (seq.wrapping_sub(self.next_idx) as i64) < 0 {
            return None;
        }
        self.next_idx = seq + 1;
        Some(cell.get())
    }

    /// Position of the next read. After a successful [`read`](Reader::read)
    /// this is one past the position of the value just returned, which lets
    /// callers account for gaps introduced by lapping.
    #[inline]
    pub fn position(&self) -> u64 {
        self.next_idx
    }

    /// Number of slots in the ring.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.queue.capacity()
    }
}
