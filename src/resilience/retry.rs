//! Bounded retry policy with a pure backoff function.
//!
//! The policy is read-only configuration: `delay(attempt)` depends on nothing
//! but the attempt index. Whether an attempt *happens* is decided by the
//! governor from the failure's `retryable` attribute.

use std::time::Duration;

/// Backoff between attempts, as a pure function of the attempt index
/// (0-based: the wait before the first retry is `delay(0)`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Backoff {
    Constant(Duration),
    /// `base * 2^attempt`, clamped to `cap`.
    Exponential { base: Duration, cap: Duration },
}

impl Backoff {
    pub fn delay(&self, attempt: u32) -> Duration {
        match self {
            Backoff::Constant(d) => *d,
            Backoff::Exponential { base, cap } => {
                let base_ms = base.as_millis() as u64;
                let cap_ms = cap.as_millis() as u64;
                let factor = 1u64.checked_shl(attempt).unwrap_or(u64::MAX);
                Duration::from_millis(base_ms.saturating_mul(factor).min(cap_ms))
            }
        }
    }
}

/// Named, immutable retry configuration for one downstream operation group.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    name: String,
    max_attempts: u32,
    backoff: Backoff,
}

impl RetryPolicy {
    /// `max_attempts` counts every attempt including the first; it is clamped
    /// to at least 1.
    pub fn new(name: impl Into<String>, max_attempts: u32, backoff: Backoff) -> Self {
        Self {
            name: name.into(),
            max_attempts: max_attempts.max(1),
            backoff,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    pub fn delay(&self, attempt: u32) -> Duration {
        self.backoff.delay(attempt)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constant_backoff_is_flat() {
        let b = Backoff::Constant(Duration::from_millis(100));
        assert_eq!(b.delay(0), Duration::from_millis(100));
        assert_eq!(b.delay(5), Duration::from_millis(100));
    }

    #[test]
    fn exponential_backoff_doubles_until_cap() {
        let b = Backoff::Exponential {
            base: Duration::from_millis(50),
            cap: Duration::from_millis(300),
        };
        assert_eq!(b.delay(0), Duration::from_millis(50));
        assert_eq!(b.delay(1), Duration::from_millis(100));
        assert_eq!(b.delay(2), Duration::from_millis(200));
        assert_eq!(b.delay(3), Duration::from_millis(300));
        assert_eq!(b.delay(30), Duration::from_millis(300));
    }

    #[test]
    fn exponential_backoff_survives_huge_attempt_indices() {
        let b = Backoff::Exponential {
            base: Duration::from_millis(50),
            cap: Duration::from_secs(10),
        };
        assert_eq!(b.delay(200), Duration::from_secs(10));
    }

    #[test]
    fn max_attempts_is_at_least_one() {
        let p = RetryPolicy::new("r", 0, Backoff::Constant(Duration::ZERO));
        assert_eq!(p.max_attempts(), 1);
    }
}
