//! Client reconnection contract for the live feed.
//!
//! The server only advertises the initial delay (via the `retry:` frame);
//! clients are expected to back off exponentially from there and, once the
//! retry budget is spent, fall back to polling `GET /api/incidents`.

use std::time::Duration;

/// Bounded exponential backoff: `delay(n) = min(initial * 2^n, max_delay)`.
///
/// # Examples
/// ```
/// use std::time::Duration;
/// use citizens_backend::inbound::sse::ReconnectPolicy;
///
/// let policy = ReconnectPolicy::new(Duration::from_secs(1), Duration::from_secs(5), 4);
/// assert_eq!(policy.delay_for(0), Some(Duration::from_secs(1)));
/// assert_eq!(policy.delay_for(3), Some(Duration::from_secs(5)));
/// assert_eq!(policy.delay_for(4), None);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReconnectPolicy {
    initial: Duration,
    max_delay: Duration,
    max_retries: u32,
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self::new(Duration::from_secs(1), Duration::from_secs(30), 10)
    }
}

impl ReconnectPolicy {
    /// Build a policy; `max_delay` is raised to `initial` when smaller.
    pub fn new(initial: Duration, max_delay: Duration, max_retries: u32) -> Self {
        Self {
            initial,
            max_delay: max_delay.max(initial),
            max_retries,
        }
    }

    /// Delay advertised in the stream's `retry:` frame.
    pub fn initial_delay(&self) -> Duration {
        self.initial
    }

    pub fn max_delay(&self) -> Duration {
        self.max_delay
    }

    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    /// Wait before reconnect attempt `attempt` (zero-based), or `None` once
    /// the client should stop and poll instead.
    pub fn delay_for(&self, attempt: u32) -> Option<Duration> {
        if attempt >= self.max_retries {
            return None;
        }
        let delay = 2_u32
            .checked_pow(attempt)
            .and_then(|factor| self.initial.checked_mul(factor))
            .unwrap_or(self.max_delay);
        Some(delay.min(self.max_delay))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(0, Some(500))]
    #[case(1, Some(1_000))]
    #[case(2, Some(2_000))]
    #[case(3, Some(4_000))]
    #[case(4, Some(5_000))]
    #[case(5, Some(5_000))]
    #[case(6, None)]
    fn delays_double_until_capped(#[case] attempt: u32, #[case] expected_ms: Option<u64>) {
        let policy =
            ReconnectPolicy::new(Duration::from_millis(500), Duration::from_secs(5), 6);
        assert_eq!(policy.delay_for(attempt), expected_ms.map(Duration::from_millis));
    }

    #[rstest]
    fn huge_attempts_saturate_at_max_delay() {
        let policy = ReconnectPolicy::new(Duration::from_secs(1), Duration::from_secs(30), 100);
        assert_eq!(policy.delay_for(64), Some(Duration::from_secs(30)));
    }

    #[rstest]
    fn max_delay_never_undercuts_initial() {
        let policy = ReconnectPolicy::new(Duration::from_secs(10), Duration::from_secs(1), 3);
        assert_eq!(policy.max_delay(), Duration::from_secs(10));
        assert_eq!(policy.delay_for(2), Some(Duration::from_secs(10)));
    }
}
