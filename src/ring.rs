//! Fixed-capacity cell array with position-to-slot mapping.

use crate::cell::Cell;
use std::marker::PhantomData;

mod sealed {
    pub trait Sealed {}
}

/// Maps monotonically increasing logical positions onto slot indices.
///
/// Implemented by the [`PowerOfTwo`] and [`Arbitrary`] capacity tags. The
/// tag is a type parameter so each mapping monomorphizes down to a single
/// mask or modulo instruction.
pub trait IndexMode: sealed::Sealed {
    /// Check `capacity` against the mode's constraint.
    ///
    /// ## Panics
    /// When the constraint is violated.
    fn validate(capacity: usize);

    /// Slot index for logical position `pos`.
    fn slot_index(pos: u64, capacity: usize, mask: u64) -> usize;
}

/// Capacity tag restricting capacities to powers of two; positions map to
/// slots with a bit mask.
pub enum PowerOfTwo {}

/// Capacity tag admitting any capacity of at least 2; positions map to
/// slots with a modulo. Slower than [`PowerOfTwo`] but required for
/// workloads sized by something other than a power of two.
pub enum Arbitrary {}

impl sealed::Sealed for PowerOfTwo {}
impl sealed::Sealed for Arbitrary {}

impl IndexMode for PowerOfTwo {
    #[inline]
    fn validate(capacity: usize) {
        assert!(capacity >= 2, "capacity must be at least 2");
        assert!(capacity.is_power_of_two(), "capacity must be a power of two");
    }

    #[inline]
    fn slot_index(pos: u64, _capacity: usize, mask: u64) -> usize {
        (pos & mask) as usize
    }
}

impl IndexMode for Arbitrary {
    #[inline]
    fn validate(capacity: usize) {
        assert!(capacity >= 2, "capacity must be at least 2");
    }

    #[inline]
    fn slot_index(pos: u64, capacity: usize, _mask: u64) -> usize {
        (pos % capacity as u64) as usize
    }
}

/// Backing storage for the slot array.
pub trait Storage<T>: sealed::Sealed {
    /// The slot array.
    fn slots(&self) -> &[Cell<T>];
}

/// Slots behind a single heap allocation.
pub struct Heap<T> {
    slots: Box<[Cell<T>]>,
}

/// Slots stored inline in the owning structure; `N` must be known at
/// compile time. Suitable for small capacities where the queue lives on the
/// stack or embedded in another type.
pub struct Inline<T, const N: usize> {
    slots: [Cell<T>; N],
}

impl<T> sealed::Sealed for Heap<T> {}
impl<T, const N: usize> sealed::Sealed for Inline<T, N> {}

impl<T> Storage<T> for Heap<T> {
    #[inline]
    fn slots(&self) -> &[Cell<T>] {
        &self.slots
    }
}

impl<T, const N: usize> Storage<T> for Inline<T, N> {
    #[inline]
    fn slots(&self) -> &[Cell<T>] {
        &self.slots
    }
}

/// Fixed-capacity indexed container of [`Cell`]s.
///
/// The capacity is fixed at construction and never changes. [`slot`]
/// returns the cell at `pos mod capacity`; how the reduction happens is
/// decided by the [`IndexMode`] parameter, where the slots live by the
/// [`Storage`] parameter.
///
/// [`slot`]: RingBuffer::slot
pub struct RingBuffer<T, M: IndexMode = PowerOfTwo, S: Storage<T> = Heap<T>> {
    storage: S,
    capacity: usize,
    mask: u64,
    _mode: PhantomData<M>,
    _marker: PhantomData<T>,
}

impl<T, M: IndexMode> RingBuffer<T, M, Heap<T>> {
    /// Create a heap-backed ring of `capacity` cells, slot `i` starting at
    /// sequence `i`.
    ///
    /// ## Panics
    /// When `capacity` violates the index mode constraint.
    pub fn new(capacity: usize) -> Self {
        Self::with_seq_init(capacity, |i| i)
    }

    pub(crate) fn with_seq_init(capacity: usize, seq_init: fn(u64) -> u64) -> Self {
        M::validate(capacity);
        let slots = (0..capacity as u64)
            .map(|i| Cell::new(seq_init(i)))
            .collect::<Vec<_>>()
            .into_boxed_slice();
        Self {
            storage: Heap { slots },
            capacity,
            mask: capacity as u64 - 1,
            _mode: PhantomData,
            _marker: PhantomData,
        }
    }
}

impl<T, M: IndexMode, const N: usize> RingBuffer<T, M, Inline<T, N>> {
    /// Create a ring of `N` cells stored inline, slot `i` starting at
    /// sequence `i`.
    ///
    /// ## Panics
    /// When `N` violates the index mode constraint.
    pub fn new_inline() -> Self {
        Self::with_seq_init_inline(|i| i)
    }

    pub(crate) fn with_seq_init_inline(seq_init: fn(u64) -> u64) -> Self {
        M::validate(N);
        Self {
            storage: Inline {
                slots: std::array::from_fn(|i| Cell::new(seq_init(i as u64))),
            },
            capacity: N,
            mask: N as u64 - 1,
            _mode: PhantomData,
            _marker: PhantomData,
        }
    }
}

impl<T, M: IndexMode, S: Storage<T>> RingBuffer<T, M, S> {
    /// Reference to the cell at `pos mod capacity`.
    #[inline]
    pub fn slot(&self, pos: u64) -> &Cell<T> {
        &self.storage.slots()[M::slot_index(pos, self.capacity, self.mask)]
    }

    /// Number of cells.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// All cells in storage order. Used for teardown.
    #[inline]
    pub(crate) fn cells(&self) -> &[Cell<T>] {
        self.storage.slots()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::Ordering::Relaxed;

    #[test]
    fn should_map_positions_with_mask() {
        let ring = RingBuffer::<u64>::new(4);
        for pos in 0..16u64 {
            assert_eq!(pos % 4, ring.slot(pos).seq_load(Relaxed));
        }
    }

    #[test]
    fn should_map_positions_with_modulo() {
        let ring = RingBuffer::<u64, Arbitrary>::new(5);
        for pos in 0..20u64 {
            assert_eq!(pos % 5, ring.slot(pos).seq_load(Relaxed));
        }
    }

    #[test]
    fn should_store_slots_inline() {
        let ring = RingBuffer::<u64, PowerOfTwo, Inline<u64, 8>>::new_inline();
        assert_eq!(8, ring.capacity());
        assert_eq!(3, ring.slot(11).seq_load(Relaxed));
    }

    #[test]
    fn should_init_sequences() {
        let ring = RingBuffer::<u64>::with_seq_init(4, |_| 0);
        for i in 0..4u64 {
            assert_eq!(0, ring.slot(i).seq_load(Relaxed));
        }
    }

    #[test]
    #[should_panic(expected = "power of two")]
    fn should_reject_non_power_of_two_capacity() {
        let _ = RingBuffer::<u64>::new(5);
    }

    #[test]
    #[should_panic(expected = "at least 2")]
    fn should_reject_capacity_below_two() {
        let _ = RingBuffer::<u64, Arbitrary>::new(1);
    }
}
