//! Defines error types.
use thiserror::Error;

/// The queue is full; the rejected value rides along so the caller can
/// retry without cloning.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("queue is full")]
pub struct Full<T>(pub T);

impl<T> Full<T> {
    /// Recover the rejected value.
    #[inline]
    pub fn into_inner(self) -> T {
        self.0
    }
}

/// The queue is empty.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("queue is empty")]
pub struct Empty;
