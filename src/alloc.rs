//! Allocation service consulted before every heap request the table makes.
//!
//! The table never talks to the global allocator blindly: it first charges
//! the number of bytes it is about to request against an [`Allocator`], and
//! releases the same amount when the memory goes away. `Global` accepts
//! every charge; `Counting` keeps a running tally and can be told to refuse,
//! which is how allocation failure is exercised in tests.

use core::mem::size_of;
use thiserror::Error;

#[derive(Error, Clone, Copy, Debug, Eq, PartialEq)]
pub enum AllocError {
    #[error("allocation size overflowed usize")]
    CapacityOverflow,
    #[error("allocation of {requested} bytes refused")]
    Exhausted { requested: usize },
}

/// Byte cost of `count` values of `T`, or `CapacityOverflow`.
pub(crate) fn bytes_for<T>(count: usize) -> Result<usize, AllocError> {
    count
        .checked_mul(size_of::<T>())
        .filter(|&n| n <= isize::MAX as usize)
        .ok_or(AllocError::CapacityOverflow)
}

pub trait Allocator {
    /// Charge `bytes` against the service. An `Err` means the caller must
    /// not perform the allocation.
    fn allocate(&mut self, bytes: usize) -> Result<(), AllocError>;

    /// Return a previous charge of `bytes`.
    fn release(&mut self, bytes: usize);
}

/// Accepts every request and tracks nothing.
#[derive(Clone, Copy, Debug, Default)]
pub struct Global;

impl Allocator for Global {
    #[inline]
    fn allocate(&mut self, _bytes: usize) -> Result<(), AllocError> {
        Ok(())
    }

    #[inline]
    fn release(&mut self, _bytes: usize) {}
}

/// Allocation-counting diagnostics service.
///
/// Tracks live bytes, the high-water mark and the number of granted
/// requests. A byte `limit` caps live bytes; `fail_after` refuses every
/// request once that many requests have been granted.
#[derive(Clone, Debug, Default)]
pub struct Counting {
    live: usize,
    peak: usize,
    granted: usize,
    refused: usize,
    limit: Option<usize>,
    fail_after: Option<usize>,
}

impl Counting {
    pub fn new() -> Self {
        Self::default()
    }

    /// Refuse any request that would take live bytes above `limit`.
    pub fn with_limit(limit: usize) -> Self {
        Self {
            limit: Some(limit),
            ..Self::default()
        }
    }

    pub fn set_limit(&mut self, limit: Option<usize>) {
        self.limit = limit;
    }

    /// Grant `n` more requests from now on, then refuse everything.
    pub fn fail_after(&mut self, n: usize) {
        self.fail_after = Some(self.granted + n);
    }

    /// Stop refusing requests because of `fail_after`.
    pub fn clear_failure(&mut self) {
        self.fail_after = None;
    }

    pub fn live_bytes(&self) -> usize {
        self.live
    }

    pub fn peak_bytes(&self) -> usize {
        self.peak
    }

    pub fn granted(&self) -> usize {
        self.granted
    }

    pub fn refused(&self) -> usize {
        self.refused
    }
}

impl Allocator for Counting {
    fn allocate(&mut self, bytes: usize) -> Result<(), AllocError> {
        let over_limit = match self.limit {
            Some(limit) => self.live.checked_add(bytes).map_or(true, |n| n > limit),
            None => false,
        };
        let tripped = self.fail_after.is_some_and(|n| self.granted >= n);
        if over_limit || tripped {
            self.refused += 1;
            return Err(AllocError::Exhausted { requested: bytes });
        }
        self.live += bytes;
        self.peak = self.peak.max(self.live);
        self.granted += 1;
        Ok(())
    }

    fn release(&mut self, bytes: usize) {
        debug_assert!(bytes <= self.live, "released more than was charged");
        self.live = self.live.saturating_sub(bytes);
    }
}

impl<A: Allocator + ?Sized> Allocator for &mut A {
    fn allocate(&mut self, bytes: usize) -> Result<(), AllocError> {
        (**self).allocate(bytes)
    }

    fn release(&mut self, bytes: usize) {
        (**self).release(bytes)
    }
}
