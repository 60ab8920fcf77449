//! Progress state machine for one search invocation.
//!
//! Every transition produces a new immutable snapshot, so an observer on the
//! same cooperative scheduler can hold and inspect intermediate states
//! without synchronization. Snapshots serialize cleanly for callers that
//! push progress across a process boundary.

use std::num::NonZeroU32;

use serde::Serialize;

/// Phase of a search operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchPhase {
    /// The search has been created but no work has started.
    Initializing,
    /// The strategy selector is preparing a credentialled client.
    Authenticating,
    /// The pagination driver is fetching pages.
    Fetching,
    /// The merged list is being filtered.
    Processing,
    /// The search finished normally.
    Complete,
    /// The caller cancelled the search before post-processing began.
    Cancelled,
    /// The search failed.
    Error,
}

/// Immutable progress snapshot for one search.
///
/// Created once per search in the initializing phase and advanced through
/// `authenticating`, `fetching`, `processing`, and `complete`. `cancelled`
/// and `error` are reachable from the first three phases only; once
/// post-processing begins the operation runs to completion or failure.
///
/// # Example
///
/// ```
/// use std::num::NonZeroU32;
/// use forager::search::progress::ProgressState;
///
/// let pages = NonZeroU32::new(3).expect("non-zero");
/// let state = ProgressState::new(pages);
/// assert_eq!(state.percent_complete(), 5);
/// let state = state.to_authenticating();
/// assert_eq!(state.percent_complete(), 10);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ProgressState {
    phase: SearchPhase,
    current_page: u32,
    max_pages: NonZeroU32,
    issues_found: u64,
    cancelled: bool,
}

impl ProgressState {
    /// Creates the initial snapshot for a search with the given page budget.
    ///
    /// `max_pages` is non-zero by construction, which keeps the progress
    /// projection total.
    #[must_use]
    pub const fn new(max_pages: NonZeroU32) -> Self {
        Self {
            phase: SearchPhase::Initializing,
            current_page: 0,
            max_pages,
            issues_found: 0,
            cancelled: false,
        }
    }

    /// Enters the authenticating phase.
    #[must_use]
    pub const fn to_authenticating(&self) -> Self {
        Self {
            phase: SearchPhase::Authenticating,
            ..*self
        }
    }

    /// Enters or advances the fetching phase.
    ///
    /// `current_page` is the number of pages merged so far; the driver
    /// advances it after each page completes.
    #[must_use]
    pub const fn to_fetching(&self, current_page: u32, issues_found: u64) -> Self {
        Self {
            phase: SearchPhase::Fetching,
            current_page,
            issues_found,
            ..*self
        }
    }

    /// Enters the processing phase; cancellation is a no-op from here on.
    #[must_use]
    pub const fn to_processing(&self, issues_found: u64) -> Self {
        Self {
            phase: SearchPhase::Processing,
            issues_found,
            ..*self
        }
    }

    /// Enters the terminal complete phase.
    #[must_use]
    pub const fn to_complete(&self, issues_found: u64) -> Self {
        Self {
            phase: SearchPhase::Complete,
            issues_found,
            ..*self
        }
    }

    /// Enters the terminal cancelled phase.
    #[must_use]
    pub const fn to_cancelled(&self) -> Self {
        Self {
            phase: SearchPhase::Cancelled,
            cancelled: true,
            ..*self
        }
    }

    /// Enters the terminal error phase.
    #[must_use]
    pub const fn to_error(&self) -> Self {
        Self {
            phase: SearchPhase::Error,
            ..*self
        }
    }

    /// Replaces the page budget, used when the fallback controller switches
    /// strategies mid-search.
    ///
    /// A strategy switch discards the previous strategy's results and
    /// restarts page accounting, so `current_page`, `issues_found`, and the
    /// projected percentage may drop while still in the fetching phase.
    /// Within a single strategy run they only move forward.
    #[must_use]
    pub const fn with_max_pages(self, max_pages: NonZeroU32) -> Self {
        Self { max_pages, ..self }
    }

    /// Returns the current phase.
    #[must_use]
    pub const fn phase(&self) -> SearchPhase {
        self.phase
    }

    /// Returns the number of pages merged so far.
    #[must_use]
    pub const fn current_page(&self) -> u32 {
        self.current_page
    }

    /// Returns the page budget.
    #[must_use]
    pub const fn max_pages(&self) -> NonZeroU32 {
        self.max_pages
    }

    /// Returns the running issue count.
    #[must_use]
    pub const fn issues_found(&self) -> u64 {
        self.issues_found
    }

    /// Returns true when the search was cancelled.
    #[must_use]
    pub const fn is_cancelled(&self) -> bool {
        self.cancelled
    }

    /// Returns true when a cancellation request would still take effect.
    ///
    /// Cancellation only applies before post-processing; later requests are
    /// ignored rather than treated as errors.
    #[must_use]
    pub const fn can_cancel(&self) -> bool {
        matches!(
            self.phase,
            SearchPhase::Initializing | SearchPhase::Authenticating | SearchPhase::Fetching
        )
    }

    /// Projects the snapshot onto a 0..=100 completion percentage.
    ///
    /// Non-decreasing across any normally ordered transition sequence;
    /// cancelled and error always project to 0.
    #[must_use]
    pub fn percent_complete(&self) -> u8 {
        match self.phase {
            SearchPhase::Cancelled | SearchPhase::Error => 0,
            SearchPhase::Initializing => 5,
            SearchPhase::Authenticating => 10,
            SearchPhase::Fetching => {
                // max_pages is non-zero by construction.
                #[expect(
                    clippy::integer_division,
                    reason = "the page ratio rounds down intentionally"
                )]
                let scaled = self.current_page.saturating_mul(75) / self.max_pages.get();
                let capped = 15_u32.saturating_add(scaled).min(90);
                u8::try_from(capped).unwrap_or(90)
            }
            SearchPhase::Processing => 95,
            SearchPhase::Complete => 100,
        }
    }

    /// Projects the snapshot onto a human-readable status line.
    #[must_use]
    pub fn status_message(&self) -> String {
        match self.phase {
            SearchPhase::Initializing => "Preparing search".to_owned(),
            SearchPhase::Authenticating => "Authenticating with GitHub".to_owned(),
            SearchPhase::Fetching => {
                if self.max_pages.get() > 1 {
                    format!(
                        "Fetching issues (page {current} of {max})",
                        current = self.current_page,
                        max = self.max_pages
                    )
                } else {
                    "Fetching issues".to_owned()
                }
            }
            SearchPhase::Processing => "Filtering candidate issues".to_owned(),
            SearchPhase::Complete => {
                format!("Search complete: {count} issues found", count = self.issues_found)
            }
            SearchPhase::Cancelled => "Search cancelled".to_owned(),
            SearchPhase::Error => "Search failed".to_owned(),
        }
    }
}
