//! Linked change-request detection over issue timelines.
//!
//! The GraphQL strategy requests a slice of each issue's timeline restricted
//! to cross-reference and connection events. This module scans that slice to
//! decide whether a change request already covers the issue. The REST
//! fallback never reaches this code; its issues carry an `Unknown` link
//! state instead.

use serde::Deserialize;

use super::models::{ChangeRequestState, LinkedChangeRequest};

/// A referenced item carried by a timeline event.
///
/// Timeline events can reference issues as well as pull requests. The inline
/// fragments in the search query only select fields on `PullRequest`, so a
/// reference to anything else deserializes with every field absent and is
/// ignored during resolution.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct ReferencedItem {
    /// Change request number, absent for non-pull-request references.
    #[serde(default)]
    pub number: Option<u64>,
    /// Change request state (`OPEN`, `MERGED`, `CLOSED`).
    #[serde(default)]
    pub state: Option<String>,
    /// Canonical link to the change request.
    #[serde(default)]
    pub url: Option<String>,
}

/// A timeline event relevant to change-request detection.
///
/// Events arrive in chronological order. Only cross-reference and connection
/// events are requested, but unknown typenames still deserialize (as
/// [`TimelineEvent::Other`]) rather than failing the page.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(tag = "__typename")]
pub enum TimelineEvent {
    /// Another item mentioned this issue.
    CrossReferencedEvent {
        /// The item that made the reference.
        #[serde(default)]
        source: Option<ReferencedItem>,
    },
    /// An item was manually connected to this issue.
    ConnectedEvent {
        /// The connected item.
        #[serde(default)]
        subject: Option<ReferencedItem>,
    },
    /// Any other timeline event; ignored.
    #[serde(other)]
    Other,
}

impl TimelineEvent {
    /// Extracts the referenced change request, if the event carries one.
    #[must_use]
    pub fn change_request(&self) -> Option<LinkedChangeRequest> {
        let reference = match self {
            Self::CrossReferencedEvent { source } => source.as_ref(),
            Self::ConnectedEvent { subject } => subject.as_ref(),
            Self::Other => None,
        }?;

        let number = reference.number?;
        let state = ChangeRequestState::from_api(reference.state.as_deref()?);
        let url = reference.url.clone()?;

        Some(LinkedChangeRequest { number, state, url })
    }
}

const fn preference(state: ChangeRequestState) -> u8 {
    match state {
        ChangeRequestState::Open => 0,
        ChangeRequestState::Merged => 1,
        ChangeRequestState::Closed => 2,
    }
}

/// Resolves whether a change request already covers the issue.
///
/// Scans the timeline events for change-request references, preferring open
/// over merged references and keeping the earliest on ties (events are
/// chronological, so the earliest still-relevant reference wins). References
/// that were closed without merging never block an issue; when only closed
/// references exist the result is `None`, meaning the issue remains a
/// candidate.
///
/// `None` here is an explicit "inspected, no link" result; callers on the
/// REST path must not use this function because no inspection occurs there.
#[must_use]
pub fn resolve_linked_change_request(events: &[TimelineEvent]) -> Option<LinkedChangeRequest> {
    let mut best: Option<LinkedChangeRequest> = None;

    for event in events {
        let Some(candidate) = event.change_request() else {
            continue;
        };
        if candidate.state == ChangeRequestState::Closed {
            continue;
        }

        let better = best
            .as_ref()
            .is_none_or(|current| preference(candidate.state) < preference(current.state));
        if better {
            best = Some(candidate);
        }
    }

    best
}

#[cfg(test)]
mod tests {
    use rstest::rstest;
    use serde_json::json;

    use super::{ReferencedItem, TimelineEvent, resolve_linked_change_request};
    use crate::github::models::ChangeRequestState;

    fn cross_referenced(number: u64, state: &str) -> TimelineEvent {
        TimelineEvent::CrossReferencedEvent {
            source: Some(ReferencedItem {
                number: Some(number),
                state: Some(state.to_owned()),
                url: Some(format!("https://github.com/octo/repo/pull/{number}")),
            }),
        }
    }

    #[test]
    fn open_reference_wins_over_earlier_closed_reference() {
        let events = [cross_referenced(10, "CLOSED"), cross_referenced(11, "OPEN")];

        let link = resolve_linked_change_request(&events).expect("should resolve a link");
        assert_eq!(link.number, 11);
        assert_eq!(link.state, ChangeRequestState::Open);
    }

    #[test]
    fn earliest_reference_wins_on_state_ties() {
        let events = [cross_referenced(20, "OPEN"), cross_referenced(21, "OPEN")];

        let link = resolve_linked_change_request(&events).expect("should resolve a link");
        assert_eq!(link.number, 20);
    }

    #[test]
    fn open_reference_preferred_over_merged() {
        let events = [cross_referenced(30, "MERGED"), cross_referenced(31, "OPEN")];

        let link = resolve_linked_change_request(&events).expect("should resolve a link");
        assert_eq!(link.number, 31);
    }

    #[rstest]
    #[case::no_events(vec![])]
    #[case::only_closed(vec![cross_referenced(40, "CLOSED")])]
    #[case::non_pull_request_reference(vec![TimelineEvent::CrossReferencedEvent {
        source: Some(ReferencedItem { number: None, state: None, url: None }),
    }])]
    fn resolves_none_when_nothing_blocks(#[case] events: Vec<TimelineEvent>) {
        assert!(resolve_linked_change_request(&events).is_none());
    }

    #[test]
    fn connected_events_count_as_references() {
        let events = [TimelineEvent::ConnectedEvent {
            subject: Some(ReferencedItem {
                number: Some(50),
                state: Some("OPEN".to_owned()),
                url: Some("https://github.com/octo/repo/pull/50".to_owned()),
            }),
        }];

        let link = resolve_linked_change_request(&events).expect("should resolve a link");
        assert_eq!(link.number, 50);
    }

    #[test]
    fn unknown_typenames_deserialize_without_failing() {
        let value = json!([
            { "__typename": "LabeledEvent" },
            {
                "__typename": "CrossReferencedEvent",
                "source": { "number": 60, "state": "OPEN",
                            "url": "https://github.com/octo/repo/pull/60" }
            }
        ]);

        let events: Vec<TimelineEvent> =
            serde_json::from_value(value).expect("should deserialize mixed events");
        let link = resolve_linked_change_request(&events).expect("should resolve a link");
        assert_eq!(link.number, 60);
    }
}
