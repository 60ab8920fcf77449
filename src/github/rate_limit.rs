//! Rate limit snapshots taken after each GitHub request.
//!
//! Both search strategies report quota usage: the GraphQL API embeds a
//! `rateLimit` object in every response body, while the REST API returns
//! `X-RateLimit-*` headers. Either source normalizes into [`RateLimitInfo`].
//! The pagination driver inspects the latest snapshot after every page and
//! stops early when the quota is depleted; snapshots are overwritten, never
//! merged, so the caller always sees the most recent request's view.

use std::time::{SystemTime, UNIX_EPOCH};

/// Rate limit state reported by the most recent GitHub request.
///
/// # Example
///
/// ```
/// use forager::github::rate_limit::RateLimitInfo;
///
/// let info = RateLimitInfo::new(5000, 4999, 1_700_000_000);
/// assert!(!info.is_exhausted());
/// assert_eq!(info.remaining(), 4999);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitInfo {
    /// Maximum requests allowed in the current window.
    limit: u32,
    /// Remaining requests in the current window.
    remaining: u32,
    /// Unix timestamp when the window resets.
    reset_at: u64,
}

impl RateLimitInfo {
    /// Creates a new rate limit snapshot.
    #[must_use]
    pub const fn new(limit: u32, remaining: u32, reset_at: u64) -> Self {
        Self {
            limit,
            remaining,
            reset_at,
        }
    }

    /// Returns the maximum requests allowed in the current window.
    #[must_use]
    pub const fn limit(&self) -> u32 {
        self.limit
    }

    /// Returns the remaining requests in the current window.
    #[must_use]
    pub const fn remaining(&self) -> u32 {
        self.remaining
    }

    /// Returns the Unix timestamp when the rate limit resets.
    #[must_use]
    pub const fn reset_at(&self) -> u64 {
        self.reset_at
    }

    /// Returns true when no quota remains.
    ///
    /// This is the conservative early-stop trigger for pagination: a search
    /// that observes an exhausted window terminates with a `RateLimited`
    /// reason and returns whatever pages were already merged.
    #[must_use]
    pub const fn is_exhausted(&self) -> bool {
        self.remaining == 0
    }

    /// Calculates seconds until the rate limit resets.
    ///
    /// Returns 0 if the reset time has already passed or if the system time
    /// cannot be determined.
    #[must_use]
    pub fn seconds_until_reset(&self) -> u64 {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|duration| duration.as_secs())
            .unwrap_or(0);

        self.reset_at.saturating_sub(now)
    }
}
