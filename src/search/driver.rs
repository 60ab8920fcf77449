//! Budgeted pagination over one search strategy.
//!
//! The driver issues page requests sequentially (each request's token comes
//! from the previous response), merges pages into one ordered list with
//! first-occurrence de-duplication by issue number, and stops on the first
//! of: budget exhausted, natural end of data, depleted rate limit,
//! cancellation, or a failed page. Whatever was merged before stopping is
//! always returned.

use std::collections::HashSet;
use std::num::NonZeroU32;

use crate::github::error::SearchError;
use crate::github::gateway::{IssueGateway, PageToken};
use crate::github::locator::RepositoryLocator;
use crate::github::models::Issue;
use crate::github::rate_limit::RateLimitInfo;

use super::progress::ProgressState;
use super::{CancelFlag, ProgressObserver};

const fn nonzero(value: u32) -> NonZeroU32 {
    match NonZeroU32::new(value) {
        Some(pages) => pages,
        None => panic!("page budget must be non-zero"),
    }
}

/// Page budget for one strategy run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageBudget {
    /// Maximum number of pages to request.
    pub max_pages: NonZeroU32,
    /// Items requested per page.
    pub per_page: u8,
}

/// Budget for the GraphQL strategy: at most 300 issues inspected per search.
pub const GRAPHQL_BUDGET: PageBudget = PageBudget {
    max_pages: nonzero(3),
    per_page: 100,
};

/// Budget for the REST fallback strategy: at most 200 issues per search.
pub const REST_BUDGET: PageBudget = PageBudget {
    max_pages: nonzero(2),
    per_page: 100,
};

/// Why a paginated fetch stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TerminationReason {
    /// The page budget was used up with more data available.
    ExhaustedBudget,
    /// The upstream ran out of data before the budget did.
    EndOfData,
    /// The rate limit window was depleted; results are partial.
    RateLimited,
    /// The caller cancelled the search; results are partial.
    Cancelled,
    /// A page request failed; results are partial.
    Failed,
}

impl TerminationReason {
    /// Returns true when the merged list may be missing pages.
    #[must_use]
    pub const fn is_partial(&self) -> bool {
        matches!(self, Self::RateLimited | Self::Cancelled | Self::Failed)
    }
}

/// Result of one strategy run.
#[derive(Debug)]
pub(super) struct FetchOutcome {
    pub(super) issues: Vec<Issue>,
    pub(super) rate_limit: Option<RateLimitInfo>,
    pub(super) reason: TerminationReason,
    pub(super) error: Option<SearchError>,
    pub(super) progress: ProgressState,
}

struct PageLoop<'run> {
    merged: Vec<Issue>,
    seen: HashSet<u64>,
    rate_limit: Option<RateLimitInfo>,
    progress: ProgressState,
    observer: &'run dyn ProgressObserver,
}

impl<'run> PageLoop<'run> {
    fn new(start: ProgressState, budget: PageBudget, observer: &'run dyn ProgressObserver) -> Self {
        let progress = start.with_max_pages(budget.max_pages).to_fetching(0, 0);
        observer.observe(&progress);
        Self {
            merged: Vec::new(),
            seen: HashSet::new(),
            rate_limit: None,
            progress,
            observer,
        }
    }

    /// Merges one page, keeping the first occurrence of each issue number.
    fn merge(&mut self, issues: Vec<Issue>, page: u32) {
        for issue in issues {
            if self.seen.insert(issue.number) {
                self.merged.push(issue);
            }
        }
        let found = u64::try_from(self.merged.len()).unwrap_or(u64::MAX);
        self.progress = self.progress.to_fetching(page, found);
        self.observer.observe(&self.progress);
    }

    fn finish(self, reason: TerminationReason, error: Option<SearchError>) -> FetchOutcome {
        tracing::debug!(?reason, issues = self.merged.len(), "pagination finished");
        FetchOutcome {
            issues: self.merged,
            rate_limit: self.rate_limit,
            reason,
            error,
            progress: self.progress,
        }
    }
}

/// Runs one strategy to termination under the given budget.
///
/// Cancellation is cooperative: the flag is checked before each page
/// request, never mid-flight. A rate-limit rejection from the gateway is a
/// termination, not a failure; any other gateway error ends the run with
/// `Failed` and the error attached. Phase transitions into `error` and
/// `complete` belong to the orchestrator, which may yet fall back to
/// another strategy.
pub(super) async fn fetch_all(
    gateway: &dyn IssueGateway,
    locator: &RepositoryLocator,
    budget: PageBudget,
    start: ProgressState,
    observer: &dyn ProgressObserver,
    cancel: &CancelFlag,
) -> FetchOutcome {
    let mut state = PageLoop::new(start, budget, observer);
    let mut next_token: Option<PageToken> = None;

    for page in 1..=budget.max_pages.get() {
        if cancel.is_cancelled() {
            state.progress = state.progress.to_cancelled();
            state.observer.observe(&state.progress);
            return state.finish(TerminationReason::Cancelled, None);
        }

        let fetched = gateway
            .fetch_page(locator, next_token.take(), budget.per_page)
            .await;

        let page_data = match fetched {
            Ok(page_data) => page_data,
            Err(error) => {
                if let SearchError::RateLimitExceeded { rate_limit, .. } = &error {
                    if rate_limit.is_some() {
                        state.rate_limit = *rate_limit;
                    }
                    tracing::warn!("rate limit rejection on page {page}; keeping partial results");
                    return state.finish(TerminationReason::RateLimited, None);
                }
                return state.finish(TerminationReason::Failed, Some(error));
            }
        };

        if let Some(info) = page_data.rate_limit {
            state.rate_limit = Some(info);
        }
        state.merge(page_data.issues, page);

        if state.rate_limit.is_some_and(|info| info.is_exhausted()) {
            tracing::warn!("rate limit depleted after page {page}; stopping early");
            return state.finish(TerminationReason::RateLimited, None);
        }
        if page_data.fetched_count < usize::from(budget.per_page) || page_data.next.is_none() {
            return state.finish(TerminationReason::EndOfData, None);
        }
        next_token = page_data.next;
    }

    state.finish(TerminationReason::ExhaustedBudget, None)
}

#[cfg(test)]
mod tests {
    use mockall::predicate::eq;

    use super::{GRAPHQL_BUDGET, REST_BUDGET, TerminationReason, fetch_all};
    use crate::github::error::SearchError;
    use crate::github::gateway::{IssuePage, MockIssueGateway, PageToken};
    use crate::github::locator::RepositoryLocator;
    use crate::github::models::test_support::open_issue;
    use crate::github::rate_limit::RateLimitInfo;
    use crate::search::progress::{ProgressState, SearchPhase};
    use crate::search::{CancelFlag, NoopProgressObserver};

    fn locator() -> RepositoryLocator {
        RepositoryLocator::from_owner_repo("owner", "repo").expect("should create locator")
    }

    fn full_page(start: u64, count: u64, remaining: u32, next: Option<PageToken>) -> IssuePage {
        let issues: Vec<_> = (start..start + count).map(open_issue).collect();
        IssuePage {
            fetched_count: issues.len(),
            issues,
            rate_limit: Some(RateLimitInfo::new(5000, remaining, 0)),
            next,
        }
    }

    fn start_state() -> ProgressState {
        ProgressState::new(GRAPHQL_BUDGET.max_pages).to_authenticating()
    }

    #[tokio::test]
    async fn merges_full_budget_and_reports_exhaustion() {
        let mut gateway = MockIssueGateway::new();
        gateway
            .expect_fetch_page()
            .with(eq(locator()), eq(None), eq(100))
            .times(1)
            .returning(|_, _, _| {
                Ok(full_page(
                    1,
                    100,
                    4999,
                    Some(PageToken::Cursor("c1".to_owned())),
                ))
            });
        gateway
            .expect_fetch_page()
            .with(
                eq(locator()),
                eq(Some(PageToken::Cursor("c1".to_owned()))),
                eq(100),
            )
            .times(1)
            .returning(|_, _, _| {
                Ok(full_page(
                    101,
                    100,
                    4998,
                    Some(PageToken::Cursor("c2".to_owned())),
                ))
            });
        gateway
            .expect_fetch_page()
            .with(
                eq(locator()),
                eq(Some(PageToken::Cursor("c2".to_owned()))),
                eq(100),
            )
            .times(1)
            .returning(|_, _, _| {
                Ok(full_page(
                    201,
                    100,
                    4997,
                    Some(PageToken::Cursor("c3".to_owned())),
                ))
            });

        let outcome = fetch_all(
            &gateway,
            &locator(),
            GRAPHQL_BUDGET,
            start_state(),
            &NoopProgressObserver,
            &CancelFlag::new(),
        )
        .await;

        assert_eq!(outcome.reason, TerminationReason::ExhaustedBudget);
        assert_eq!(outcome.issues.len(), 300);
        assert_eq!(
            outcome.rate_limit.map(|info| info.remaining()),
            Some(4997),
            "latest snapshot wins"
        );
        assert_eq!(outcome.progress.current_page(), 3);
    }

    #[tokio::test]
    async fn short_page_terminates_with_end_of_data() {
        let mut gateway = MockIssueGateway::new();
        gateway
            .expect_fetch_page()
            .times(1)
            .returning(|_, _, _| Ok(full_page(1, 42, 59, Some(PageToken::Number(2)))));

        let outcome = fetch_all(
            &gateway,
            &locator(),
            REST_BUDGET,
            start_state(),
            &NoopProgressObserver,
            &CancelFlag::new(),
        )
        .await;

        assert_eq!(outcome.reason, TerminationReason::EndOfData);
        assert_eq!(outcome.issues.len(), 42);
    }

    #[tokio::test]
    async fn depleted_rate_limit_keeps_merged_pages() {
        let mut gateway = MockIssueGateway::new();
        gateway
            .expect_fetch_page()
            .with(eq(locator()), eq(None), eq(100))
            .times(1)
            .returning(|_, _, _| {
                Ok(full_page(
                    1,
                    100,
                    1,
                    Some(PageToken::Cursor("c1".to_owned())),
                ))
            });
        gateway
            .expect_fetch_page()
            .with(
                eq(locator()),
                eq(Some(PageToken::Cursor("c1".to_owned()))),
                eq(100),
            )
            .times(1)
            .returning(|_, _, _| {
                Ok(full_page(
                    101,
                    100,
                    0,
                    Some(PageToken::Cursor("c2".to_owned())),
                ))
            });

        let outcome = fetch_all(
            &gateway,
            &locator(),
            GRAPHQL_BUDGET,
            start_state(),
            &NoopProgressObserver,
            &CancelFlag::new(),
        )
        .await;

        assert_eq!(outcome.reason, TerminationReason::RateLimited);
        assert_eq!(outcome.issues.len(), 200, "pages 1-2 are kept, not discarded");
    }

    #[tokio::test]
    async fn duplicate_numbers_keep_the_first_occurrence() {
        let mut gateway = MockIssueGateway::new();
        gateway.expect_fetch_page().times(1).returning(|_, _, _| {
            let mut issues = vec![open_issue(1), open_issue(2), open_issue(1)];
            issues
                .get_mut(2)
                .expect("third issue should exist")
                .title = "Duplicate".to_owned();
            Ok(IssuePage {
                fetched_count: issues.len(),
                issues,
                rate_limit: Some(RateLimitInfo::new(5000, 100, 0)),
                next: None,
            })
        });

        let outcome = fetch_all(
            &gateway,
            &locator(),
            GRAPHQL_BUDGET,
            start_state(),
            &NoopProgressObserver,
            &CancelFlag::new(),
        )
        .await;

        let numbers: Vec<u64> = outcome.issues.iter().map(|issue| issue.number).collect();
        assert_eq!(numbers, [1, 2]);
        let first = outcome.issues.first().expect("issue 1 should survive");
        assert_eq!(first.title, "Issue 1", "first-seen entry wins");
    }

    #[tokio::test]
    async fn cancellation_is_checked_before_the_next_request() {
        let cancel = CancelFlag::new();
        let flag = cancel.clone();

        let mut gateway = MockIssueGateway::new();
        gateway
            .expect_fetch_page()
            .times(1)
            .returning(move |_, _, _| {
                // Cancel while page 1 is in flight; page 2 must not be requested.
                flag.cancel();
                Ok(full_page(
                    1,
                    100,
                    4999,
                    Some(PageToken::Cursor("c1".to_owned())),
                ))
            });

        let outcome = fetch_all(
            &gateway,
            &locator(),
            GRAPHQL_BUDGET,
            start_state(),
            &NoopProgressObserver,
            &cancel,
        )
        .await;

        assert_eq!(outcome.reason, TerminationReason::Cancelled);
        assert_eq!(outcome.issues.len(), 100, "page 1 results are kept");
        assert_eq!(outcome.progress.phase(), SearchPhase::Cancelled);
    }

    #[tokio::test]
    async fn failed_page_returns_partial_results_and_the_error() {
        let mut gateway = MockIssueGateway::new();
        gateway
            .expect_fetch_page()
            .with(eq(locator()), eq(None), eq(100))
            .times(1)
            .returning(|_, _, _| {
                Ok(full_page(
                    1,
                    100,
                    4999,
                    Some(PageToken::Cursor("c1".to_owned())),
                ))
            });
        gateway
            .expect_fetch_page()
            .with(
                eq(locator()),
                eq(Some(PageToken::Cursor("c1".to_owned()))),
                eq(100),
            )
            .times(1)
            .returning(|_, _, _| {
                Err(SearchError::Network {
                    message: "connection reset".to_owned(),
                })
            });

        let outcome = fetch_all(
            &gateway,
            &locator(),
            GRAPHQL_BUDGET,
            start_state(),
            &NoopProgressObserver,
            &CancelFlag::new(),
        )
        .await;

        assert_eq!(outcome.reason, TerminationReason::Failed);
        assert_eq!(outcome.issues.len(), 100);
        assert!(matches!(
            outcome.error,
            Some(SearchError::Network { .. })
        ));
    }

    #[tokio::test]
    async fn rate_limit_rejection_terminates_without_an_error() {
        let mut gateway = MockIssueGateway::new();
        gateway.expect_fetch_page().times(1).returning(|_, _, _| {
            Err(SearchError::RateLimitExceeded {
                rate_limit: Some(RateLimitInfo::new(60, 0, 1_700_000_000)),
                message: "API rate limit exceeded".to_owned(),
            })
        });

        let outcome = fetch_all(
            &gateway,
            &locator(),
            REST_BUDGET,
            start_state(),
            &NoopProgressObserver,
            &CancelFlag::new(),
        )
        .await;

        assert_eq!(outcome.reason, TerminationReason::RateLimited);
        assert!(outcome.error.is_none());
        assert_eq!(
            outcome.rate_limit.map(|info| info.remaining()),
            Some(0),
            "rejection carries the depleted snapshot"
        );
    }
}
