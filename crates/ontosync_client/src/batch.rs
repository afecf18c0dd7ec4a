//! Bounded fan-out for batches of independent store calls.
//!
//! The store rate-limits per connection rather than per account, so a
//! modest number of parallel connections is the only way to move a large
//! batch in reasonable time. Width is clamped to at least 2; fan-out of 1
//! is just a slower sequential loop.

use std::panic;
use std::thread;

/// Runs `op` over `items` with at most `width` calls in flight.
///
/// Results come back in input order. A panic in any call propagates after
/// the in-flight chunk finishes.
pub fn fan_out<T, R, F>(items: Vec<T>, width: usize, op: F) -> Vec<R>
where
    T: Send,
    R: Send,
    F: Fn(T) -> R + Sync,
{
    let width = width.max(2);
    let op = &op;
    let mut results = Vec::with_capacity(items.len());
    let mut pending = items.into_iter();

    loop {
        let chunk: Vec<T> = pending.by_ref().take(width).collect();
        if chunk.is_empty() {
            break;
        }
        tracing::trace!(in_flight = chunk.len(), done = results.len(), "fan-out chunk");
        let joined = thread::scope(|scope| {
            let handles: Vec<_> = chunk
                .into_iter()
                .map(|item| scope.spawn(move || op(item)))
                .collect();
            handles
                .into_iter()
                .map(|handle| handle.join())
                .collect::<Vec<_>>()
        });
        for outcome in joined {
            match outcome {
                Ok(result) => results.push(result),
                Err(payload) => panic::resume_unwind(payload),
            }
        }
    }
    results
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn preserves_input_order() {
        let results = fan_out((0..37).collect(), 4, |n: u32| n * 2);
        assert_eq!(results, (0..37).map(|n| n * 2).collect::<Vec<_>>());
    }

    #[test]
    fn width_is_clamped_to_two() {
        let peak = AtomicUsize::new(0);
        let current = AtomicUsize::new(0);
        fan_out((0..10).collect(), 0, |_: u32| {
            let now = current.fetch_add(1, Ordering::SeqCst) + 1;
            peak.fetch_max(now, Ordering::SeqCst);
            std::thread::sleep(std::time::Duration::from_millis(5));
            current.fetch_sub(1, Ordering::SeqCst);
        });
        assert!(peak.load(Ordering::SeqCst) <= 2);
    }

    #[test]
    fn empty_batch_is_fine() {
        let results: Vec<u32> = fan_out(Vec::<u32>::new(), 8, |n| n);
        assert!(results.is_empty());
    }

    #[test]
    fn errors_travel_as_values() {
        let results = fan_out(vec![1u32, 0, 3], 2, |n| {
            if n == 0 {
                Err("zero")
            } else {
                Ok(n)
            }
        });
        assert_eq!(results, vec![Ok(1), Err("zero"), Ok(3)]);
    }
}
