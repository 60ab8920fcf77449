//! Error types exposed by the GitHub search layer.

use thiserror::Error;

use super::rate_limit::RateLimitInfo;

/// Errors surfaced while parsing input or communicating with GitHub.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SearchError {
    /// The provided repository URL could not be parsed.
    #[error("repository URL is invalid: {0}")]
    InvalidUrl(String),

    /// The repository path is incomplete.
    #[error("repository must be identified as <owner>/<repo> or a full URL")]
    MissingPathSegments,

    /// The authentication token was blank.
    #[error("personal access token must not be blank")]
    MissingToken,

    /// The credential was rejected by GitHub.
    #[error("GitHub rejected the token: {message}")]
    Authentication {
        /// GitHub error message returned with the 401/403 response.
        message: String,
    },

    /// GitHub returned a non-authentication API error.
    #[error("GitHub API error: {message}")]
    Api {
        /// Response body from GitHub describing the failure.
        message: String,
    },

    /// Networking failed while calling GitHub.
    #[error("network error talking to GitHub: {message}")]
    Network {
        /// Transport-level error detail.
        message: String,
    },

    /// A response arrived but did not match the expected shape.
    ///
    /// Malformed responses fail the current page rather than being skipped,
    /// and are handled like network errors by the pagination driver.
    #[error("malformed GitHub response: {message}")]
    MalformedResponse {
        /// Description of the shape mismatch.
        message: String,
    },

    /// Rate limit exceeded - the API returned 403 with a rate limit message.
    #[error("GitHub API rate limit exceeded: {message}")]
    RateLimitExceeded {
        /// Rate limit info if available from the response.
        rate_limit: Option<RateLimitInfo>,
        /// Error message from GitHub.
        message: String,
    },

    /// Configuration could not be loaded.
    #[error("configuration error: {message}")]
    Configuration {
        /// Details about the configuration failure.
        message: String,
    },

    /// Local I/O operation failed.
    #[error("I/O error: {message}")]
    Io {
        /// Error detail from the underlying I/O operation.
        message: String,
    },
}

impl SearchError {
    /// Returns true when the error means the credential was rejected.
    ///
    /// The fallback controller uses this to decide whether a GraphQL failure
    /// should trigger the one-shot switch to the REST strategy.
    #[must_use]
    pub const fn is_authentication(&self) -> bool {
        matches!(self, Self::Authentication { .. })
    }

    /// Returns true when the error is a rate limit rejection.
    #[must_use]
    pub const fn is_rate_limit(&self) -> bool {
        matches!(self, Self::RateLimitExceeded { .. })
    }
}
