use std::time::Duration;

/// Configures rate-limit retry behavior and the per-request timeout.
///
/// `max_retry_delay` is expected to be at least `initial_retry_delay`. When it
/// is not, the ceiling wins and every wait equals `max_retry_delay`.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ClientOptions {
    /// Maximum number of retries after the initial attempt.
    pub max_retries: u32,
    /// Wait before the first retry; doubled for each further retry.
    pub initial_retry_delay: Duration,
    /// Upper bound for a single wait.
    pub max_retry_delay: Duration,
    /// Per-request transport timeout. `None` leaves it to the transport.
    pub timeout: Option<Duration>,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            max_retries: 5,
            initial_retry_delay: Duration::from_secs(60),
            max_retry_delay: Duration::from_secs(600),
            timeout: None,
        }
    }
}

impl ClientOptions {
    /// Returns the wait before retry number `attempt + 1`.
    ///
    /// `initial_retry_delay * 2^attempt`, saturating, clamped to
    /// `max_retry_delay`. No jitter is applied.
    pub fn retry_delay(&self, attempt: u32) -> Duration {
        let delay = 1u32
            .checked_shl(attempt)
            .and_then(|multiplier| self.initial_retry_delay.checked_mul(multiplier))
            .unwrap_or(Duration::MAX);
        delay.min(self.max_retry_delay)
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::ClientOptions;

    fn options(initial_ms: u64, max_ms: u64) -> ClientOptions {
        ClientOptions {
            max_retries: 5,
            initial_retry_delay: Duration::from_millis(initial_ms),
            max_retry_delay: Duration::from_millis(max_ms),
            timeout: None,
        }
    }

    #[test]
    fn default_policy_is_minute_scale() {
        let opts = ClientOptions::default();
        assert_eq!(opts.max_retries, 5);
        assert_eq!(opts.initial_retry_delay, Duration::from_secs(60));
        assert_eq!(opts.max_retry_delay, Duration::from_secs(600));
        assert_eq!(opts.timeout, None);
    }

    #[test]
    fn delay_doubles_without_jitter() {
        let opts = options(100, 10_000);
        let delays: Vec<_> = (0..5).map(|attempt| opts.retry_delay(attempt)).collect();
        assert_eq!(
            delays,
            vec![
                Duration::from_millis(100),
                Duration::from_millis(200),
                Duration::from_millis(400),
                Duration::from_millis(800),
                Duration::from_millis(1_600),
            ]
        );
        assert_eq!(opts.retry_delay(3), opts.retry_delay(3));
    }

    #[test]
    fn delay_is_clamped_at_ceiling() {
        let opts = options(1_000, 5_000);
        assert_eq!(opts.retry_delay(2), Duration::from_millis(4_000));
        assert_eq!(opts.retry_delay(3), Duration::from_millis(5_000));
        assert_eq!(opts.retry_delay(10), Duration::from_millis(5_000));
    }

    #[test]
    fn huge_attempt_saturates_to_ceiling() {
        let opts = options(1_000, 5_000);
        assert_eq!(opts.retry_delay(31), Duration::from_millis(5_000));
        assert_eq!(opts.retry_delay(64), Duration::from_millis(5_000));
        assert_eq!(opts.retry_delay(u32::MAX), Duration::from_millis(5_000));
    }

    #[test]
    fn ceiling_below_initial_wins() {
        let opts = options(2_000, 500);
        assert_eq!(opts.retry_delay(0), Duration::from_millis(500));
        assert_eq!(opts.retry_delay(4), Duration::from_millis(500));
    }
}
