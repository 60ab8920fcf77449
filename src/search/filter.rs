//! Candidate predicate applied to the merged issue list.

use crate::github::models::{Issue, IssueState};

/// Returns true when an issue is a contribution candidate.
///
/// A candidate is open, unassigned, and has no resolved link to a change
/// request. Issues whose link state was never inspected (the REST strategy
/// does not read timelines) pass the link check rather than being excluded
/// on missing evidence.
#[must_use]
pub fn is_candidate(issue: &Issue) -> bool {
    issue.state == IssueState::Open
        && issue.assignee.is_none()
        && !issue.change_request.is_linked()
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::is_candidate;
    use crate::github::models::test_support::{
        assigned_issue, inspected_issue, linked_issue, open_issue,
    };
    use crate::github::models::{Issue, IssueState};

    fn closed_issue(number: u64) -> Issue {
        Issue {
            state: IssueState::Closed,
            ..open_issue(number)
        }
    }

    #[rstest]
    #[case::uninspected(open_issue(1), true)]
    #[case::inspected_without_link(inspected_issue(2), true)]
    #[case::linked(linked_issue(3, 30), false)]
    #[case::assigned(assigned_issue(4, "octocat"), false)]
    #[case::closed(closed_issue(5), false)]
    fn candidate_predicate(#[case] issue: Issue, #[case] expected: bool) {
        assert_eq!(is_candidate(&issue), expected);
    }
}
