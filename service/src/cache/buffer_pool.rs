//! Reusable serialization buffers for dispatcher payloads
//!
//! The dispatcher serializes every routed value once, both to measure it and
//! to hand the bytes to the backend. Buffers are checked out of a
//! [`PayloadPool`] and returned with their allocation intact when the
//! checkout guard drops.

use parking_lot::Mutex;
use std::ops::{Deref, DerefMut};
use std::sync::atomic::{AtomicU64, Ordering};

/// Default number of idle buffers retained
pub const DEFAULT_POOLED_BUFFERS: usize = 32;

/// Buffers that grew past this many bytes are released instead of retained
pub const DEFAULT_MAX_RETAINED_BYTES: usize = 64 * 1024;

/// Bounded free list of byte buffers
#[derive(Debug)]
pub struct PayloadPool {
    idle: Mutex<Vec<Vec<u8>>>,
    max_idle: usize,
    max_retained_bytes: usize,
    reused: AtomicU64,
}

impl Default for PayloadPool {
    fn default() -> Self {
        Self::new(DEFAULT_POOLED_BUFFERS, DEFAULT_MAX_RETAINED_BYTES)
    }
}

impl PayloadPool {
    #[must_use]
    pub fn new(max_idle: usize, max_retained_bytes: usize) -> Self {
        Self {
            idle: Mutex::new(Vec::with_capacity(max_idle)),
            max_idle,
            max_retained_bytes,
            reused: AtomicU64::new(0),
        }
    }

    /// Borrow an empty buffer, reusing an idle allocation when one exists
    pub fn checkout(&self) -> Payload<'_> {
        let bytes = match self.idle.lock().pop() {
            Some(bytes) => {
                self.reused.fetch_add(1, Ordering::Relaxed);
                bytes
            }
            None => Vec::new(),
        };
        Payload { bytes, pool: self }
    }

    /// Idle buffers waiting for reuse
    #[must_use]
    pub fn idle(&self) -> usize {
        self.idle.lock().len()
    }

    /// Checkouts served from an idle allocation
    #[must_use]
    pub fn reused(&self) -> u64 {
        self.reused.load(Ordering::Relaxed)
    }

    fn give_back(&self, mut bytes: Vec<u8>) {
        if bytes.capacity() == 0 || bytes.capacity() > self.max_retained_bytes {
            return;
        }
        bytes.clear();
        let mut idle = self.idle.lock();
        if idle.len() < self.max_idle {
            idle.push(bytes);
        }
    }
}

/// Checked-out buffer; returns to its pool on drop
#[derive(Debug)]
pub struct Payload<'a> {
    bytes: Vec<u8>,
    pool: &'a PayloadPool,
}

impl Deref for Payload<'_> {
    type Target = Vec<u8>;

    fn deref(&self) -> &Vec<u8> {
        &self.bytes
    }
}

impl DerefMut for Payload<'_> {
    fn deref_mut(&mut self) -> &mut Vec<u8> {
        &mut self.bytes
    }
}

impl Drop for Payload<'_> {
    fn drop(&mut self) {
        self.pool.give_back(std::mem::take(&mut self.bytes));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allocation_is_reused() {
        let pool = PayloadPool::default();
        let capacity = {
            let mut payload = pool.checkout();
            payload.extend_from_slice(br#"{"name":"Ada"}"#);
            payload.capacity()
        };
        assert_eq!(pool.idle(), 1);

        let payload = pool.checkout();
        assert!(payload.is_empty());
        assert_eq!(payload.capacity(), capacity);
        assert_eq!(pool.reused(), 1);
        assert_eq!(pool.idle(), 0);
    }

    #[test]
    fn test_unused_checkouts_are_not_retained() {
        let pool = PayloadPool::default();
        drop(pool.checkout());
        assert_eq!(pool.idle(), 0);
    }

    #[test]
    fn test_idle_and_size_bounds() {
        let pool = PayloadPool::new(1, 16);
        {
            let mut a = pool.checkout();
            let mut b = pool.checkout();
            a.push(b'a');
            b.push(b'b');
        }
        assert_eq!(pool.idle(), 1);

        let mut big = pool.checkout();
        big.extend(std::iter::repeat_n(b'x', 64));
        drop(big);
        assert_eq!(pool.idle(), 0);
    }
}
