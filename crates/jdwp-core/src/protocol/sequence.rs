//! Thread-safe sequence counter for packet ids.
//!
//! # What is a packet id? (for beginners)
//!
//! Every command we send carries a 32-bit id.  The VM copies that id into
//! its reply, and that is the *only* link between a reply and the request
//! that caused it.  Replies may come back in any order, so the session keeps
//! a table keyed by id and uses it to hand each reply to the right caller.
//!
//! Ids therefore have to be unique among the requests currently in flight.
//! A counter that goes up by one per request gives that for free, as long as
//! fewer than 2³² requests are outstanding at once.
//!
//! # Thread safety
//!
//! The counter uses `AtomicU32` internally, so any number of tasks can call
//! [`SequenceCounter::next`] at the same time without a lock and without
//! ever receiving the same value twice (until the counter wraps).

use std::sync::atomic::{AtomicU32, Ordering};

/// A lock-free, monotonically increasing source of packet ids.
///
/// The first call to [`next`](Self::next) returns 1.  After `u32::MAX` the
/// counter wraps to 0 and keeps going without panicking; an id that is
/// still in flight when the counter comes back around to it would collide.
///
/// # Examples
///
/// ```rust
/// use jdwp_core::SequenceCounter;
///
/// let counter = SequenceCounter::new();
/// assert_eq!(counter.next(), 1);
/// assert_eq!(counter.next(), 2);
/// ```
#[derive(Debug)]
pub struct SequenceCounter {
    /// The last id handed out (0 before the first call).
    inner: AtomicU32,
}

impl SequenceCounter {
    /// Creates a new counter; the first id it returns is 1.
    pub fn new() -> Self {
        Self {
            inner: AtomicU32::new(0),
        }
    }

    /// Creates a counter whose next id is `last.wrapping_add(1)`.
    pub fn starting_after(last: u32) -> Self {
        Self {
            inner: AtomicU32::new(last),
        }
    }

    /// Atomically advances the counter and returns the new value.
    ///
    /// `Ordering::Relaxed` is enough: the id only has to be unique, it does
    /// not publish any other memory.
    pub fn next(&self) -> u32 {
        // `fetch_add` wraps on overflow and returns the previous value.
        self.inner.fetch_add(1, Ordering::Relaxed).wrapping_add(1)
    }

    /// Returns the most recently issued id without advancing.
    pub fn current(&self) -> u32 {
        self.inner.load(Ordering::Relaxed)
    }
}

impl Default for SequenceCounter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_sequence_counter_first_id_is_one() {
        // Arrange
        let counter = SequenceCounter::new();

        // Act
        let first = counter.next();

        // Assert
        assert_eq!(first, 1);
    }

    #[test]
    fn test_sequence_counter_increments_monotonically() {
        // Arrange
        let counter = SequenceCounter::new();

        // Act
        let values: Vec<u32> = (0..100).map(|_| counter.next()).collect();

        // Assert
        for window in values.windows(2) {
            assert_eq!(window[1], window[0] + 1);
        }
    }

    #[test]
    fn test_sequence_counter_wraps_at_u32_max() {
        // Arrange – one step before the last representable id
        let counter = SequenceCounter {
            inner: AtomicU32::new(u32::MAX - 1),
        };

        // Act
        let last = counter.next();
        let wrapped = counter.next();
        let after = counter.next();

        // Assert
        assert_eq!(last, u32::MAX);
        assert_eq!(wrapped, 0);
        assert_eq!(after, 1);
    }

    #[test]
    fn test_starting_after_continues_from_given_id() {
        let counter = SequenceCounter::starting_after(41);
        assert_eq!(counter.next(), 42);
        assert_eq!(SequenceCounter::starting_after(u32::MAX).next(), 0);
    }

    #[test]
    fn test_current_reports_last_issued_id() {
        let counter = SequenceCounter::new();
        assert_eq!(counter.current(), 0);
        counter.next();
        counter.next();
        assert_eq!(counter.current(), 2);
    }

    #[test]
    fn test_sequence_counter_is_unique_across_threads() {
        // Arrange
        let counter = Arc::new(SequenceCounter::new());
        let threads = 8;
        let per_thread = 1_000;

        // Act
        let handles: Vec<_> = (0..threads)
            .map(|_| {
                let c = Arc::clone(&counter);
                thread::spawn(move || (0..per_thread).map(|_| c.next()).collect::<Vec<u32>>())
            })
            .collect();
        let mut all = HashSet::new();
        for h in handles {
            for id in h.join().expect("thread panicked") {
                assert!(all.insert(id), "id {id} issued twice");
            }
        }

        // Assert
        assert_eq!(all.len(), threads * per_thread);
        assert_eq!(counter.current() as usize, threads * per_thread);
    }
}
