//! Retry timings.

use std::time::Duration;

use watch_core::ErrorCode;

/// How long to wait before reconnecting, and how long to wait for a clean
/// logout.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct RetryPolicy {
    /// Delay after a failed connection attempt.
    pub connect_failure_delay: Duration,

    /// Delay after an established connection dropped.
    pub drop_retry_delay: Duration,

    /// Upper bound on the logout exchange when closing a session.
    pub close_grace: Duration,
}

impl RetryPolicy {
    /// Default delay after a failed connection attempt.
    pub const DEFAULT_CONNECT_FAILURE_DELAY: Duration = Duration::from_secs(3 * 60);

    /// Default grace period for logout.
    pub const DEFAULT_CLOSE_GRACE: Duration = Duration::from_secs(30);

    /// The delay before retrying after `error`.
    pub fn retry_delay(&self, error: ErrorCode) -> Duration {
        match error {
            ErrorCode::ConnectionDropped => self.drop_retry_delay,
            _ => self.connect_failure_delay,
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            connect_failure_delay: Self::DEFAULT_CONNECT_FAILURE_DELAY,
            drop_retry_delay: Duration::ZERO,
            close_grace: Self::DEFAULT_CLOSE_GRACE,
        }
    }
}
