//! Bounded lock-free queues built on a cell-sequenced ring buffer.
//!
//! Two concurrency protocols share one core: a fixed-capacity array of
//! cache-line-aligned cells, each pairing a value slot with an atomic
//! sequence counter. All cross-thread publication flows through the
//! per-slot sequences; there are no locks, no condition variables and no
//! shared size word.
//!
//! - [`MpmcQueue`] is a multi-producer multi-consumer FIFO queue following
//!   the Vyukov bounded MPMC design, with blocking (`push`/`pop`) and
//!   non-blocking (`try_push`/`try_pop`) variants.
//! - [`SpmcQueue`] is a single-writer broadcast log: every [`Reader`]
//!   observes the whole stream independently, and a reader that falls a
//!   full ring behind is overwritten rather than slowing the writer down.
//!
//! Capacity handling (power-of-two mask vs. arbitrary modulo) and slot
//! placement (heap vs. inline) are type parameters with sensible defaults;
//! see [`ring`].
//!
//! ## Examples
//! Queue values between producer and consumer threads:
//! ```
//! use seqring::MpmcQueue;
//! use std::sync::Arc;
//!
//! let queue = Arc::new(MpmcQueue::<u64>::new(1024));
//!
//! let producer = {
//!     let queue = queue.clone();
//!     std::thread::spawn(move || {
//!         for i in 0..100 {
//!             queue.push(i);
//!         }
//!     })
//! };
//!
//! let consumer = {
//!     let queue = queue.clone();
//!     std::thread::spawn(move || {
//!         for i in 0..100 {
//!             assert_eq!(i, queue.pop());
//!         }
//!     })
//! };
//!
//! producer.join().unwrap();
//! consumer.join().unwrap();
//! ```
//! Broadcast a stream to independent readers:
//! ```
//! use seqring::SpmcQueue;
//!
//! let mut writer = SpmcQueue::<u64>::new(16).into_writer();
//! let mut a = writer.reader();
//! let mut b = writer.reader();
//!
//! writer.push(7);
//!
//! assert_eq!(a.read(), Some(7));
//! assert_eq!(b.read(), Some(7));
//! ```

pub mod cell;
pub mod error;
pub mod mpmc;
pub mod ring;
pub mod spmc;

pub use cell::CACHE_LINE_SIZE;
pub use error::{Empty, Full};
pub use mpmc::MpmcQueue;
pub use ring::{Arbitrary, Heap, IndexMode, Inline, PowerOfTwo, RingBuffer, Storage};
pub use spmc::{Reader, SpmcQueue, Writer};
