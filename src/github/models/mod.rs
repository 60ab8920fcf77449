//! Data models for normalized issues and their wire-format sources.
//!
//! Both search strategies feed one [`Issue`] model. Types prefixed with
//! `Api` deserialize the REST issues endpoint; types prefixed with `Graph`
//! deserialize GraphQL issue nodes. Each converts into the domain types via
//! `From`, which is where the two response shapes are normalized.

use chrono::{DateTime, Utc};
use serde::Deserialize;

use super::cross_reference::{TimelineEvent, resolve_linked_change_request};

#[cfg(feature = "test-support")]
pub mod test_support;

/// Issue state as reported by GitHub.
///
/// Searches filter on open state upstream, but the value is kept so the
/// candidate predicate can re-check it defensively.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IssueState {
    /// The issue is open.
    #[default]
    Open,
    /// The issue is closed.
    Closed,
}

impl IssueState {
    fn from_api(value: &str) -> Self {
        if value.eq_ignore_ascii_case("open") {
            Self::Open
        } else {
            Self::Closed
        }
    }
}

/// Issue label with display metadata.
///
/// Labels keep their API order and are not de-duplicated by name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Label {
    /// Label name.
    pub name: String,
    /// Hex colour without a leading `#`, as GitHub reports it.
    pub color: String,
    /// Optional label description.
    pub description: Option<String>,
}

/// State of a change request referenced from an issue timeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeRequestState {
    /// The change request is open.
    Open,
    /// The change request was merged.
    Merged,
    /// The change request was closed without merging.
    Closed,
}

impl ChangeRequestState {
    pub(crate) fn from_api(value: &str) -> Self {
        if value.eq_ignore_ascii_case("open") {
            Self::Open
        } else if value.eq_ignore_ascii_case("merged") {
            Self::Merged
        } else {
            Self::Closed
        }
    }
}

/// A change request found to reference an issue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkedChangeRequest {
    /// Change request number.
    pub number: u64,
    /// Current state of the change request.
    pub state: ChangeRequestState,
    /// Canonical link to the change request.
    pub url: String,
}

/// Whether an issue has an associated change request.
///
/// This is deliberately three-valued: the REST fallback never inspects
/// timelines, so "we did not check" must stay distinct from "we checked and
/// found nothing". The candidate filter treats both non-linked variants as
/// contribution-ready and only a present link as disqualifying.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ChangeRequestLink {
    /// Detection never ran (REST fallback path).
    #[default]
    Unknown,
    /// The timeline was inspected and no relevant reference was found.
    NotFound,
    /// A change request references this issue.
    Linked(LinkedChangeRequest),
}

impl ChangeRequestLink {
    /// Returns true when a change request was found.
    #[must_use]
    pub const fn is_linked(&self) -> bool {
        matches!(self, Self::Linked(_))
    }
}

/// Normalized issue record produced by either search strategy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Issue {
    /// Issue number, unique within the repository and the only merge key.
    pub number: u64,
    /// Issue title.
    pub title: String,
    /// Canonical link to the issue.
    pub url: String,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
    /// Number of comments on the issue.
    pub comment_count: u32,
    /// Labels in API order.
    pub labels: Vec<Label>,
    /// Issue state.
    pub state: IssueState,
    /// Assignee login if the issue is assigned.
    pub assignee: Option<String>,
    /// Linked change request detection result.
    pub change_request: ChangeRequestLink,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ApiUser {
    pub(crate) login: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ApiLabel {
    pub(crate) name: String,
    #[serde(default)]
    pub(crate) color: Option<String>,
    #[serde(default)]
    pub(crate) description: Option<String>,
}

/// REST issue object. The `/issues` endpoint interleaves pull requests with
/// issues; entries carrying a `pull_request` key are skipped by the gateway.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ApiIssue {
    pub(crate) number: u64,
    pub(crate) title: String,
    pub(crate) html_url: String,
    pub(crate) state: String,
    pub(crate) created_at: DateTime<Utc>,
    pub(crate) updated_at: DateTime<Utc>,
    #[serde(default)]
    pub(crate) comments: u32,
    #[serde(default)]
    pub(crate) assignee: Option<ApiUser>,
    #[serde(default)]
    pub(crate) labels: Vec<ApiLabel>,
    #[serde(default)]
    pub(crate) pull_request: Option<serde_json::Value>,
}

impl ApiIssue {
    pub(crate) const fn is_pull_request(&self) -> bool {
        self.pull_request.is_some()
    }
}

impl From<ApiIssue> for Issue {
    fn from(value: ApiIssue) -> Self {
        Self {
            number: value.number,
            title: value.title,
            url: value.html_url,
            created_at: value.created_at,
            updated_at: value.updated_at,
            comment_count: value.comments,
            labels: value.labels.into_iter().map(Label::from).collect(),
            state: IssueState::from_api(&value.state),
            assignee: value.assignee.and_then(|user| user.login),
            // REST responses carry no timeline data, so detection never ran.
            change_request: ChangeRequestLink::Unknown,
        }
    }
}

impl From<ApiLabel> for Label {
    fn from(value: ApiLabel) -> Self {
        Self {
            name: value.name,
            color: value.color.unwrap_or_default(),
            description: value.description,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct GraphCount {
    pub(crate) total_count: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct GraphActor {
    pub(crate) login: String,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct GraphActors {
    #[serde(default)]
    pub(crate) nodes: Vec<GraphActor>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct GraphLabel {
    pub(crate) name: String,
    #[serde(default)]
    pub(crate) color: Option<String>,
    #[serde(default)]
    pub(crate) description: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct GraphLabels {
    #[serde(default)]
    pub(crate) nodes: Vec<GraphLabel>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct GraphTimelineItems {
    #[serde(default)]
    pub(crate) nodes: Vec<TimelineEvent>,
}

/// GraphQL issue node including the timeline slice used for link detection.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct GraphIssueNode {
    pub(crate) number: u64,
    pub(crate) title: String,
    pub(crate) url: String,
    pub(crate) state: String,
    pub(crate) created_at: DateTime<Utc>,
    pub(crate) updated_at: DateTime<Utc>,
    pub(crate) comments: GraphCount,
    pub(crate) assignees: GraphActors,
    pub(crate) labels: GraphLabels,
    pub(crate) timeline_items: GraphTimelineItems,
}

impl From<GraphLabel> for Label {
    fn from(value: GraphLabel) -> Self {
        Self {
            name: value.name,
            color: value.color.unwrap_or_default(),
            description: value.description,
        }
    }
}

impl From<GraphIssueNode> for Issue {
    fn from(value: GraphIssueNode) -> Self {
        let change_request = resolve_linked_change_request(&value.timeline_items.nodes)
            .map_or(ChangeRequestLink::NotFound, ChangeRequestLink::Linked);

        Self {
            number: value.number,
            title: value.title,
            url: value.url,
            created_at: value.created_at,
            updated_at: value.updated_at,
            comment_count: value.comments.total_count,
            labels: value.labels.nodes.into_iter().map(Label::from).collect(),
            state: IssueState::from_api(&value.state),
            assignee: value
                .assignees
                .nodes
                .into_iter()
                .next()
                .map(|actor| actor.login),
            change_request,
        }
    }
}
