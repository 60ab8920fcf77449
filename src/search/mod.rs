//! Issue search orchestration.
//!
//! [`IssueSearch`] selects a strategy from the available credential, runs
//! the pagination driver under that strategy's budget, falls back from
//! GraphQL to REST exactly once when the credential is rejected mid-run,
//! filters the merged list, and reports the result with an attached
//! progress snapshot.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::github::error::SearchError;
use crate::github::gateway::{GraphqlIssueGateway, IssueGateway, RestIssueGateway};
use crate::github::locator::{PersonalAccessToken, RepositoryLocator};
use crate::github::models::Issue;
use crate::github::rate_limit::RateLimitInfo;

pub mod driver;
pub mod filter;
pub mod progress;

pub use driver::{GRAPHQL_BUDGET, PageBudget, REST_BUDGET, TerminationReason};
pub use filter::is_candidate;
pub use progress::{ProgressState, SearchPhase};

use driver::FetchOutcome;

/// Shared cancellation flag for one search.
///
/// Clones observe the same flag. Cancellation is cooperative and sticky:
/// once raised it stays raised, and requests after post-processing begins
/// have no effect on the outcome.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    /// Creates an unraised flag.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Raises the flag.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    /// Returns true when the flag has been raised.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Receiver for progress snapshots emitted during a search.
///
/// Implementations must be cheap; the driver calls this on every page
/// boundary from the request loop.
pub trait ProgressObserver: Send + Sync {
    /// Receives one progress snapshot.
    fn observe(&self, state: &ProgressState);
}

/// Observer that discards every snapshot.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopProgressObserver;

impl ProgressObserver for NoopProgressObserver {
    fn observe(&self, _state: &ProgressState) {}
}

/// Outcome of one search invocation.
///
/// A failed search is still a report: partial results, the termination
/// reason, and the triggering error travel together so callers can show
/// what was found before things went wrong.
#[derive(Debug)]
pub struct SearchReport {
    /// Issues surviving the candidate filter, or the unfiltered partial
    /// list when the search was cancelled or failed.
    pub issues: Vec<Issue>,
    /// Most recent rate limit snapshot, when one was observed.
    pub rate_limit: Option<RateLimitInfo>,
    /// True when linked change requests were actually inspected, so an
    /// unlinked result is meaningful rather than merely unchecked.
    pub pr_detection_available: bool,
    /// Why the fetch loop stopped.
    pub termination: TerminationReason,
    /// The error that ended a failed search.
    pub error: Option<SearchError>,
    /// Final progress snapshot.
    pub progress: ProgressState,
}

impl SearchReport {
    /// Returns true when the issue list may be missing pages.
    #[must_use]
    pub const fn is_partial(&self) -> bool {
        self.termination.is_partial()
    }
}

/// Issue search over a repository, with automatic strategy selection.
pub struct IssueSearch {
    graphql: Option<Box<dyn IssueGateway>>,
    rest: Box<dyn IssueGateway>,
}

impl IssueSearch {
    /// Creates a search from explicit gateways.
    ///
    /// `graphql` is preferred when present; `rest` serves both the
    /// unauthenticated path and the fallback path.
    #[must_use]
    pub const fn new(graphql: Option<Box<dyn IssueGateway>>, rest: Box<dyn IssueGateway>) -> Self {
        Self { graphql, rest }
    }

    /// Builds gateways for the given credential.
    ///
    /// With a token both strategies are available and GraphQL runs first;
    /// without one the search goes straight to REST. The REST gateway is
    /// always unauthenticated: it only ever runs when no credential exists
    /// or when GitHub has just rejected the credential, and re-sending a
    /// rejected token would fail the fallback too.
    ///
    /// # Errors
    ///
    /// Returns an error when either underlying HTTP client cannot be built.
    pub fn from_credential(
        token: Option<&PersonalAccessToken>,
        locator: &RepositoryLocator,
    ) -> Result<Self, SearchError> {
        let graphql = token
            .map(|credential| {
                GraphqlIssueGateway::for_token(credential, locator)
                    .map(|gateway| Box::new(gateway) as Box<dyn IssueGateway>)
            })
            .transpose()?;
        let rest = Box::new(RestIssueGateway::new()?);
        Ok(Self { graphql, rest })
    }

    /// Runs the search to a terminal report.
    ///
    /// Setup failures are embedded in the report rather than returned as
    /// `Err`; the report is the single source of truth for what happened.
    pub async fn search(
        &self,
        locator: &RepositoryLocator,
        observer: &dyn ProgressObserver,
        cancel: &CancelFlag,
    ) -> SearchReport {
        let budget = if self.graphql.is_some() {
            GRAPHQL_BUDGET
        } else {
            REST_BUDGET
        };
        let initial = ProgressState::new(budget.max_pages);
        observer.observe(&initial);
        if cancel.is_cancelled() {
            return cancelled_before_fetch(initial, observer);
        }

        let authenticating = initial.to_authenticating();
        observer.observe(&authenticating);
        if cancel.is_cancelled() {
            return cancelled_before_fetch(authenticating, observer);
        }

        let (outcome, pr_detection) = self
            .run_with_fallback(locator, authenticating, observer, cancel)
            .await;
        finalize(outcome, pr_detection, observer)
    }

    /// Runs the preferred strategy, falling back to REST at most once when
    /// GraphQL rejects the credential. Pages fetched before the rejection
    /// are discarded; the fallback restarts from the first page under its
    /// own budget.
    async fn run_with_fallback(
        &self,
        locator: &RepositoryLocator,
        progress: ProgressState,
        observer: &dyn ProgressObserver,
        cancel: &CancelFlag,
    ) -> (FetchOutcome, bool) {
        let Some(graphql) = &self.graphql else {
            let outcome = driver::fetch_all(
                self.rest.as_ref(),
                locator,
                REST_BUDGET,
                progress,
                observer,
                cancel,
            )
            .await;
            return (outcome, self.rest.detects_linked_change_requests());
        };

        let outcome = driver::fetch_all(
            graphql.as_ref(),
            locator,
            GRAPHQL_BUDGET,
            progress,
            observer,
            cancel,
        )
        .await;

        if outcome
            .error
            .as_ref()
            .is_some_and(SearchError::is_authentication)
        {
            tracing::warn!("credential rejected by GraphQL; retrying over REST");
            let fallback = driver::fetch_all(
                self.rest.as_ref(),
                locator,
                REST_BUDGET,
                progress,
                observer,
                cancel,
            )
            .await;
            return (fallback, self.rest.detects_linked_change_requests());
        }

        (outcome, graphql.detects_linked_change_requests())
    }
}

fn cancelled_before_fetch(
    progress: ProgressState,
    observer: &dyn ProgressObserver,
) -> SearchReport {
    let cancelled = progress.to_cancelled();
    observer.observe(&cancelled);
    SearchReport {
        issues: Vec::new(),
        rate_limit: None,
        pr_detection_available: false,
        termination: TerminationReason::Cancelled,
        error: None,
        progress: cancelled,
    }
}

fn finalize(
    outcome: FetchOutcome,
    pr_detection: bool,
    observer: &dyn ProgressObserver,
) -> SearchReport {
    match outcome.reason {
        TerminationReason::Cancelled => SearchReport {
            issues: outcome.issues,
            rate_limit: outcome.rate_limit,
            pr_detection_available: pr_detection,
            termination: outcome.reason,
            error: None,
            progress: outcome.progress,
        },
        TerminationReason::Failed => {
            let failed = outcome.progress.to_error();
            observer.observe(&failed);
            SearchReport {
                issues: outcome.issues,
                rate_limit: outcome.rate_limit,
                pr_detection_available: pr_detection,
                termination: outcome.reason,
                error: outcome.error,
                progress: failed,
            }
        }
        TerminationReason::ExhaustedBudget
        | TerminationReason::EndOfData
        | TerminationReason::RateLimited => {
            let merged = u64::try_from(outcome.issues.len()).unwrap_or(u64::MAX);
            let processing = outcome.progress.to_processing(merged);
            observer.observe(&processing);

            let candidates: Vec<Issue> = outcome.issues.into_iter().filter(is_candidate).collect();
            let found = u64::try_from(candidates.len()).unwrap_or(u64::MAX);
            let completed = processing.to_complete(found);
            observer.observe(&completed);

            tracing::info!(
                candidates = candidates.len(),
                reason = ?outcome.reason,
                "search finished"
            );
            SearchReport {
                issues: candidates,
                rate_limit: outcome.rate_limit,
                pr_detection_available: pr_detection,
                termination: outcome.reason,
                error: None,
                progress: completed,
            }
        }
    }
}
