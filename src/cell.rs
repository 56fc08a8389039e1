//! Storage slot primitives shared by the queue protocols.

use std::cell::UnsafeCell;
use std::mem::{needs_drop, replace, MaybeUninit};
use std::sync::atomic::{AtomicU64, Ordering};

/// Assumed cache line size in bytes.
pub const CACHE_LINE_SIZE: usize = 64;

/// A single storage slot: one value plus the atomic sequence counter that
/// publishes it.
///
/// The sequence counter, not a cell-local lock, is the handoff mechanism: a
/// slot's writer signals completion by advancing `seq` with release ordering
/// and the matching reader observes it with acquire ordering. The value
/// itself is never accessed atomically; the protocols serialize all access
/// to it through `seq`.
///
/// Each cell is aligned to a cache line and padded to a whole multiple of
/// one, so adjacent slots never share a line.
#[repr(align(64))]
pub struct Cell<T> {
    seq: AtomicU64,
    constructed: UnsafeCell<bool>,
    value: UnsafeCell<MaybeUninit<T>>,
}

// Safety: access to `value` and `constructed` is serialized by the queue
// protocols through `seq`.
unsafe impl<T: Send> Send for Cell<T> {}
unsafe impl<T: Send> Sync for Cell<T> {}

impl<T> Cell<T> {
    /// Create an empty cell with the given initial sequence.
    pub fn new(seq: u64) -> Self {
        Self {
            seq: AtomicU64::new(seq),
            constructed: UnsafeCell::new(false),
            value: UnsafeCell::new(MaybeUninit::uninit()),
        }
    }

    /// Load the sequence counter.
    #[inline]
    pub fn seq_load(&self, order: Ordering) -> u64 {
        self.seq.load(order)
    }

    /// Store the sequence counter.
    #[inline]
    pub fn seq_store(&self, seq: u64, order: Ordering) {
        self.seq.store(seq, order)
    }

    /// Move `value` into the cell.
    ///
    /// ## Safety
    /// The caller must hold exclusive write access to the cell and the cell
    /// must not already contain a value.
    #[inline]
    pub unsafe fn construct(&self, value: T) {
        (*self.value.get()).write(value);
        if needs_drop::<T>() {
            *self.constructed.get() = true;
        }
    }

    /// Move the value out of the cell, leaving it empty.
    ///
    /// ## Safety
    /// The caller must hold exclusive access to the cell and the cell must
    /// contain a value.
    #[inline]
    pub unsafe fn take(&self) -> T {
        if needs_drop::<T>() {
            *self.constructed.get() = false;
        }
        (*self.value.get()).assume_init_read()
    }

    /// Copy the value out, leaving it in place. Touches neither the sequence
    /// counter nor the drop flag.
    ///
    /// ## Safety
    /// The cell must contain a value. A concurrent overwrite can tear the
    /// copy; callers must re-check the sequence counter before trusting it.
    #[inline]
    pub unsafe fn read(&self) -> T
    where
        T: Copy,
    {
        (*self.value.get()).assume_init_read()
    }

    /// Borrow the value in place.
    ///
    /// ## Safety
    /// The cell must contain a value that no writer mutates for the lifetime
    /// of the returned reference.
    #[inline]
    pub unsafe fn get(&self) -> &T {
        (*self.value.get()).assume_init_ref()
    }

    /// Drop the contained value if one is present, then mark the cell empty.
    /// Idempotent: a second call on an empty cell does nothing.
    ///
    /// ## Safety
    /// The caller must hold exclusive access to the cell.
    #[inline]
    pub unsafe fn destroy(&self) {
        if needs_drop::<T>() && replace(&mut *self.constructed.get(), false) {
            (*self.value.get()).assume_init_drop();
        }
    }
}
