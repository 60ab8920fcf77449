//! REST fallback strategy with page-number pagination.
//!
//! Used when no credential exists or the GraphQL strategy rejected the
//! credential. Works unauthenticated, never inspects timelines, and reads
//! the rate limit from `X-RateLimit-*` response headers, which is why this
//! gateway speaks reqwest directly: Octocrab does not expose response
//! headers on list calls.

use async_trait::async_trait;
use http::StatusCode;
use http::header::HeaderMap;

use crate::github::error::SearchError;
use crate::github::locator::RepositoryLocator;
use crate::github::models::{ApiIssue, Issue};
use crate::github::rate_limit::RateLimitInfo;

use super::error_mapping::{extract_github_message, map_rest_status};
use super::{IssueGateway, IssuePage, PageToken};

const USER_AGENT: &str = concat!("forager/", env!("CARGO_PKG_VERSION"));

/// Reqwest-backed REST issue gateway.
///
/// Requests are always unauthenticated. This strategy serves the
/// no-credential search and the fallback after a credential rejection, so
/// attaching a token here would either be redundant or re-send a credential
/// GitHub has just refused.
pub struct RestIssueGateway {
    http: reqwest::Client,
}

impl RestIssueGateway {
    /// Creates a gateway.
    ///
    /// # Errors
    ///
    /// Returns `SearchError::Network` when the HTTP client cannot be built.
    pub fn new() -> Result<Self, SearchError> {
        let http = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .map_err(|error| SearchError::Network {
                message: format!("build client failed: {error}"),
            })?;
        Ok(Self { http })
    }
}

#[async_trait]
impl IssueGateway for RestIssueGateway {
    fn detects_linked_change_requests(&self) -> bool {
        false
    }

    async fn fetch_page(
        &self,
        locator: &RepositoryLocator,
        token: Option<PageToken>,
        per_page: u8,
    ) -> Result<IssuePage, SearchError> {
        let page = match token {
            Some(PageToken::Number(value)) => value,
            Some(PageToken::Cursor(_)) | None => 1,
        };

        let request = self
            .http
            .get(locator.issues_url())
            .header(http::header::ACCEPT, "application/vnd.github+json")
            .query(&[
                ("state", "open"),
                ("assignee", "none"),
                ("page", page.to_string().as_str()),
                ("per_page", per_page.to_string().as_str()),
            ]);

        let response = request.send().await.map_err(|error| SearchError::Network {
            message: format!("list issues failed: {error}"),
        })?;

        let status = response.status();
        let rate_limit = rate_limit_from_headers(response.headers());

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(map_rest_status(
                "list issues",
                status,
                extract_github_message(&body),
                rate_limit,
            ));
        }

        let entries: Vec<ApiIssue> =
            response
                .json()
                .await
                .map_err(|error| SearchError::MalformedResponse {
                    message: format!("list issues returned an unexpected shape: {error}"),
                })?;

        Ok(build_page(entries, page, per_page, rate_limit, status))
    }
}

fn build_page(
    entries: Vec<ApiIssue>,
    page: u32,
    per_page: u8,
    rate_limit: Option<RateLimitInfo>,
    status: StatusCode,
) -> IssuePage {
    // The /issues endpoint interleaves pull requests; drop them but count
    // them towards the page size so a PR-heavy page is not mistaken for the
    // end of data.
    let fetched_count = entries.len();
    let issues: Vec<Issue> = entries
        .into_iter()
        .filter(|entry| !entry.is_pull_request())
        .map(Issue::from)
        .collect();

    let next = if fetched_count < usize::from(per_page) {
        None
    } else {
        Some(PageToken::Number(page.saturating_add(1)))
    };

    tracing::debug!(
        %status,
        page,
        issues = issues.len(),
        skipped = fetched_count - issues.len(),
        "fetched REST issue page"
    );

    IssuePage {
        issues,
        fetched_count,
        rate_limit,
        next,
    }
}

fn rate_limit_from_headers(headers: &HeaderMap) -> Option<RateLimitInfo> {
    let limit = header_number(headers, "x-ratelimit-limit")?;
    let remaining = header_number(headers, "x-ratelimit-remaining")?;
    let reset_at = header_number(headers, "x-ratelimit-reset").unwrap_or(0);
    Some(RateLimitInfo::new(
        u32::try_from(limit).unwrap_or(u32::MAX),
        u32::try_from(remaining).unwrap_or(u32::MAX),
        reset_at,
    ))
}

fn header_number(headers: &HeaderMap, name: &str) -> Option<u64> {
    headers
        .get(name)?
        .to_str()
        .ok()
        .and_then(|raw| raw.parse().ok())
}
