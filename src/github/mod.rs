//! GitHub API plumbing: locators, wire models, and the two search
//! strategies.
//!
//! This module normalizes the GraphQL and REST response shapes into one
//! issue representation and maps upstream failures into `SearchError`
//! variants so that callers can surface precise failures without exposing
//! transport internals.

pub mod cross_reference;
pub mod error;
pub mod gateway;
pub mod locator;
pub mod models;
pub mod rate_limit;

pub use error::SearchError;
pub use gateway::{GraphqlIssueGateway, IssueGateway, IssuePage, PageToken, RestIssueGateway};
pub use locator::{PersonalAccessToken, RepositoryLocator, RepositoryName, RepositoryOwner};
pub use models::{ChangeRequestLink, Issue, Label, LinkedChangeRequest};
pub use rate_limit::RateLimitInfo;

#[cfg(test)]
pub use gateway::MockIssueGateway;
