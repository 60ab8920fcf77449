//! Error mapping helpers shared by the gateway implementations.

use http::StatusCode;

use crate::github::error::SearchError;
use crate::github::rate_limit::RateLimitInfo;

/// Checks if a GitHub error status indicates an authentication failure.
pub(super) const fn is_auth_failure(status: StatusCode) -> bool {
    matches!(status, StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN)
}

/// Checks if an octocrab error represents a network/transport issue.
pub(super) const fn is_network_error(error: &octocrab::Error) -> bool {
    matches!(
        error,
        octocrab::Error::Http { .. }
            | octocrab::Error::Hyper { .. }
            | octocrab::Error::Service { .. }
    )
}

/// Checks whether the GitHub error represents a rate limit error based on the
/// HTTP status and message / documentation URL content.
pub(super) fn is_rate_limit_error(source: &octocrab::GitHubError) -> bool {
    let is_rate_limit_status = matches!(
        source.status_code,
        StatusCode::FORBIDDEN | StatusCode::TOO_MANY_REQUESTS
    );

    let message_indicates_rate_limit = source.message.to_lowercase().contains("rate limit")
        || source
            .documentation_url
            .as_deref()
            .is_some_and(|url| url.contains("rate-limit"));

    is_rate_limit_status && message_indicates_rate_limit
}

pub(super) fn map_octocrab_error(operation: &str, error: &octocrab::Error) -> SearchError {
    if let octocrab::Error::GitHub { source, .. } = error {
        if is_rate_limit_error(source) {
            return SearchError::RateLimitExceeded {
                rate_limit: None,
                message: format!("{operation} failed: {message}", message = source.message),
            };
        }
        return if is_auth_failure(source.status_code) {
            SearchError::Authentication {
                message: format!(
                    "{operation} failed: GitHub returned {status} {message}",
                    status = source.status_code,
                    message = source.message
                ),
            }
        } else {
            SearchError::Api {
                message: format!(
                    "{operation} failed with status {status}: {message}",
                    status = source.status_code,
                    message = source.message
                ),
            }
        };
    }

    if is_network_error(error) {
        return SearchError::Network {
            message: format!("{operation} failed: {error}"),
        };
    }

    SearchError::Api {
        message: format!("{operation} failed: {error}"),
    }
}

/// Maps a non-success REST response to a `SearchError`.
///
/// Rate limit rejections are recognised by a 403/429 status whose body
/// mentions the rate limit, and carry the header-derived snapshot so the
/// driver can report the depleted window alongside partial results.
pub(super) fn map_rest_status(
    operation: &str,
    status: StatusCode,
    body_message: Option<String>,
    rate_limit: Option<RateLimitInfo>,
) -> SearchError {
    let message = body_message.unwrap_or_else(|| "unknown error".to_owned());

    let looks_rate_limited = matches!(
        status,
        StatusCode::FORBIDDEN | StatusCode::TOO_MANY_REQUESTS
    ) && (message.to_lowercase().contains("rate limit")
        || rate_limit.is_some_and(|info| info.is_exhausted()));

    if looks_rate_limited {
        return SearchError::RateLimitExceeded {
            rate_limit,
            message: format!("{operation} failed: {message}"),
        };
    }

    if is_auth_failure(status) {
        return SearchError::Authentication {
            message: format!("{operation} failed: GitHub returned {status} {message}"),
        };
    }

    SearchError::Api {
        message: format!("{operation} failed with status {status}: {message}"),
    }
}

/// Extracts the `message` field from a GitHub JSON error body.
pub(super) fn extract_github_message(body: &str) -> Option<String> {
    let Ok(value) = serde_json::from_str::<serde_json::Value>(body) else {
        return None;
    };
    value
        .get("message")
        .and_then(serde_json::Value::as_str)
        .map(ToOwned::to_owned)
}
