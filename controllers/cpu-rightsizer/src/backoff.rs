//! # Fibonacci Backoff
//!
//! Spaces out verification scans after a rollout. The first two waits equal
//! the grace period, later waits follow the Fibonacci sequence in multiples
//! of it, capped at a maximum.
//!
//! Sequence for a 5s grace period capped at 30s: 5s, 5s, 10s, 15s, 25s, 30s.

use std::time::Duration;

/// Fibonacci backoff calculator
///
/// Each backoff is the sum of the previous two, in whole multiples of the
/// base unit.
#[derive(Debug, Clone)]
pub struct FibonacciBackoff {
    /// Length of one step
    unit: Duration,
    /// Previous backoff value in steps
    prev_steps: u32,
    /// Current backoff value in steps
    current_steps: u32,
    /// Maximum backoff value in steps
    max_steps: u32,
}

impl FibonacciBackoff {
    /// Create a backoff whose first value is `unit` and which never exceeds
    /// `max_steps` units.
    #[must_use]
    pub fn new(unit: Duration, max_steps: u32) -> Self {
        Self {
            unit,
            prev_steps: 0,
            current_steps: 1,
            max_steps: max_steps.max(1),
        }
    }

    /// Get the next backoff duration and advance the sequence
    pub fn next_backoff(&mut self) -> Duration {
        let result = self.unit * self.current_steps;

        let next_steps = self.prev_steps.saturating_add(self.current_steps);
        self.prev_steps = self.current_steps;
        self.current_steps = std::cmp::min(next_steps, self.max_steps);

        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fibonacci_backoff_sequence() {
        let mut backoff = FibonacciBackoff::new(Duration::from_secs(5), 6);

        assert_eq!(backoff.next_backoff(), Duration::from_secs(5));
        assert_eq!(backoff.next_backoff(), Duration::from_secs(5));
        assert_eq!(backoff.next_backoff(), Duration::from_secs(10));
        assert_eq!(backoff.next_backoff(), Duration::from_secs(15));
        assert_eq!(backoff.next_backoff(), Duration::from_secs(25));
        assert_eq!(backoff.next_backoff(), Duration::from_secs(30)); // capped at 6 steps
        assert_eq!(backoff.next_backoff(), Duration::from_secs(30));
    }

    #[test]
    fn test_zero_unit_never_waits() {
        let mut backoff = FibonacciBackoff::new(Duration::ZERO, 6);

        for _ in 0..5 {
            assert_eq!(backoff.next_backoff(), Duration::ZERO);
        }
    }

    #[test]
    fn test_zero_cap_is_one_step() {
        let mut backoff = FibonacciBackoff::new(Duration::from_secs(2), 0);

        assert_eq!(backoff.next_backoff(), Duration::from_secs(2));
        assert_eq!(backoff.next_backoff(), Duration::from_secs(2));
        assert_eq!(backoff.next_backoff(), Duration::from_secs(2));
    }
}
