//! Gateways implementing the two issue search strategies.
//!
//! This module provides a trait-based seam between the pagination driver and
//! the GitHub API. Each strategy fetches exactly one page of normalized
//! issues per call; the trait-based design enables mocking in tests while
//! the Octocrab and reqwest implementations handle real HTTP requests.

mod client;
mod error_mapping;
mod graphql;
mod rest;

pub use graphql::GraphqlIssueGateway;
pub use rest::RestIssueGateway;

use async_trait::async_trait;

use crate::github::error::SearchError;
use crate::github::locator::RepositoryLocator;
use crate::github::models::Issue;
use crate::github::rate_limit::RateLimitInfo;

/// Opaque continuation token for fetching the next page.
///
/// The GraphQL strategy emits cursors; the REST strategy emits page numbers.
/// The pagination driver never interprets the token, it only echoes back the
/// token from the previous page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageToken {
    /// GraphQL end cursor.
    Cursor(String),
    /// REST page number (1-based) of the next page.
    Number(u32),
}

/// One page of normalized search results.
#[derive(Debug, Clone)]
pub struct IssuePage {
    /// Normalized issues on this page, in API order.
    pub issues: Vec<Issue>,
    /// Raw item count before any gateway-side filtering.
    ///
    /// The REST strategy drops interleaved pull requests from `issues`, so
    /// the driver's short-page check must use this count rather than
    /// `issues.len()` to avoid misreading a PR-heavy page as end of data.
    pub fetched_count: usize,
    /// Rate limit snapshot reported with this response, when the upstream
    /// included one.
    pub rate_limit: Option<RateLimitInfo>,
    /// Token for the next page, absent at the natural end of data.
    pub next: Option<PageToken>,
}

/// Gateway that can fetch one page of issues for a repository.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait IssueGateway: Send + Sync {
    /// Returns true when this strategy inspects issue timelines for linked
    /// change requests.
    fn detects_linked_change_requests(&self) -> bool;

    /// Fetches one page of open, unassigned issues.
    ///
    /// `token` is `None` for the first page and otherwise the `next` token
    /// from the previous page.
    async fn fetch_page(
        &self,
        locator: &RepositoryLocator,
        token: Option<PageToken>,
        per_page: u8,
    ) -> Result<IssuePage, SearchError>;
}
