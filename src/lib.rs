//! Forager library crate for discovering contribution-ready GitHub issues.
//!
//! The library searches a repository for open, unassigned issues with no
//! linked change request. An authenticated search runs over GraphQL and
//! inspects issue timelines; without a credential it degrades to REST,
//! where link detection is unavailable and results are marked accordingly.

pub mod config;
pub mod github;
pub mod search;

pub use config::ForagerConfig;
pub use github::{
    Issue, IssueGateway, PersonalAccessToken, RateLimitInfo, RepositoryLocator, SearchError,
};
pub use search::{
    CancelFlag, IssueSearch, NoopProgressObserver, ProgressObserver, ProgressState, SearchReport,
    TerminationReason,
};
