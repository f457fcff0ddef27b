//! Memory for transmit and scratch buffers.
//!
//! The engine does not decide where its buffers come from. Every operation that needs memory
//! asks an [`Arena`] for a buffer of an exact length and gives it back before returning, so an
//! arena never sees a buffer outlive a single call. Failure to hand out memory is an ordinary
//! result, reported by the engine as an allocation failure, never a panic or abort.
//!
//! [`Arena`]: trait.Arena.html
use alloc::vec::Vec;

/// A provider of byte buffers.
pub trait Arena {
    /// Allocate a zeroed buffer of exactly `len` bytes.
    ///
    /// Returns `None` if the memory can not be obtained.
    fn allocate(&mut self, len: usize) -> Option<Vec<u8>>;

    /// Return a buffer previously obtained from `allocate`.
    fn release(&mut self, buffer: Vec<u8>);
}

/// Allocates from the global heap.
///
/// Allocation failures are detected with a fallible reservation instead of aborting.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Heap;

/// Allocates from the global heap within a fixed byte budget.
///
/// Useful to bound the memory a single endpoint can hold at any time, and in tests to provoke
/// allocation failure at a precise point.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Bounded {
    limit: usize,
    in_use: usize,
    peak: usize,
}

impl Arena for Heap {
    fn allocate(&mut self, len: usize) -> Option<Vec<u8>> {
        let mut buffer = Vec::new();
        buffer.try_reserve_exact(len).ok()?;
        buffer.resize(len, 0);
        Some(buffer)
    }

    fn release(&mut self, buffer: Vec<u8>) {
        drop(buffer)
    }
}

impl Bounded {
    /// Create an arena that hands out at most `limit` bytes at the same time.
    pub fn new(limit: usize) -> Self {
        Bounded {
            limit,
            in_use: 0,
            peak: 0,
        }
    }

    /// The number of bytes currently handed out and not yet released.
    pub fn outstanding(&self) -> usize {
        self.in_use
    }

    /// The largest number of bytes that were outstanding at once.
    pub fn peak(&self) -> usize {
        self.peak
    }
}

impl Arena for Bounded {
    fn allocate(&mut self, len: usize) -> Option<Vec<u8>> {
        let in_use = self.in_use.checked_add(len)?;
        if in_use > self.limit {
            return None;
        }
        let buffer = Heap.allocate(len)?;
        self.in_use = in_use;
        self.peak = self.peak.max(in_use);
        Some(buffer)
    }

    fn release(&mut self, buffer: Vec<u8>) {
        self.in_use = self.in_use.saturating_sub(buffer.len());
        Heap.release(buffer)
    }
}

impl<A: Arena + ?Sized> Arena for &'_ mut A {
    fn allocate(&mut self, len: usize) -> Option<Vec<u8>> {
        (**self).allocate(len)
    }

    fn release(&mut self, buffer: Vec<u8>) {
        (**self).release(buffer)
    }
}
