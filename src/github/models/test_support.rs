//! Test helpers for constructing `Issue` fixtures.
//!
//! These builders reduce boilerplate when tests need issues that differ only
//! in number, assignee, or link state.

use chrono::{TimeZone, Utc};

use super::{ChangeRequestLink, ChangeRequestState, Issue, IssueState, LinkedChangeRequest};

/// Constructs an open, unassigned issue with an unknown link state.
///
/// # Examples
///
/// ```
/// use forager::github::models::test_support::open_issue;
///
/// let issue = open_issue(42);
/// assert_eq!(issue.number, 42);
/// assert!(issue.assignee.is_none());
/// ```
#[must_use]
pub fn open_issue(number: u64) -> Issue {
    Issue {
        number,
        title: format!("Issue {number}"),
        url: format!("https://github.com/octo/repo/issues/{number}"),
        created_at: Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).single().unwrap_or_default(),
        updated_at: Utc.with_ymd_and_hms(2025, 1, 2, 0, 0, 0).single().unwrap_or_default(),
        comment_count: 0,
        labels: Vec::new(),
        state: IssueState::Open,
        assignee: None,
        change_request: ChangeRequestLink::Unknown,
    }
}

/// Constructs an open issue assigned to the given login.
#[must_use]
pub fn assigned_issue(number: u64, assignee: &str) -> Issue {
    Issue {
        assignee: Some(assignee.to_owned()),
        ..open_issue(number)
    }
}

/// Constructs an open issue with a resolved link to the given change request.
#[must_use]
pub fn linked_issue(number: u64, change_request_number: u64) -> Issue {
    Issue {
        change_request: ChangeRequestLink::Linked(LinkedChangeRequest {
            number: change_request_number,
            state: ChangeRequestState::Open,
            url: format!("https://github.com/octo/repo/pull/{change_request_number}"),
        }),
        ..open_issue(number)
    }
}

/// Constructs an open issue whose timeline was inspected with no match.
#[must_use]
pub fn inspected_issue(number: u64) -> Issue {
    Issue {
        change_request: ChangeRequestLink::NotFound,
        ..open_issue(number)
    }
}
