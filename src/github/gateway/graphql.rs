//! GraphQL search strategy with cursor pagination and timeline inspection.
//!
//! This strategy requires a credential. Each page carries the repository's
//! open unassigned issues, a timeline slice per issue for change-request
//! detection, and the rate limit snapshot GraphQL embeds in every response
//! body.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use octocrab::Octocrab;
use serde::Deserialize;

use crate::github::error::SearchError;
use crate::github::locator::{PersonalAccessToken, RepositoryLocator};
use crate::github::models::{GraphIssueNode, Issue};
use crate::github::rate_limit::RateLimitInfo;

use super::client::build_octocrab_client;
use super::error_mapping::map_octocrab_error;
use super::{IssueGateway, IssuePage, PageToken};

const ISSUE_SEARCH_QUERY: &str = r"
query($owner: String!, $name: String!, $pageSize: Int!, $cursor: String) {
  rateLimit { limit remaining resetAt }
  repository(owner: $owner, name: $name) {
    issues(
      states: OPEN,
      filterBy: { assignee: null },
      first: $pageSize,
      after: $cursor,
      orderBy: { field: CREATED_AT, direction: DESC }
    ) {
      pageInfo { endCursor hasNextPage }
      nodes {
        number
        title
        url
        state
        createdAt
        updatedAt
        comments { totalCount }
        assignees(first: 5) { nodes { login } }
        labels(first: 20) { nodes { name color description } }
        timelineItems(first: 20, itemTypes: [CROSS_REFERENCED_EVENT, CONNECTED_EVENT]) {
          nodes {
            __typename
            ... on CrossReferencedEvent {
              source { ... on PullRequest { number state url } }
            }
            ... on ConnectedEvent {
              subject { ... on PullRequest { number state url } }
            }
          }
        }
      }
    }
  }
}
";

#[derive(Debug, Deserialize)]
struct GraphqlEnvelope {
    data: Option<SearchData>,
    #[serde(default)]
    errors: Vec<GraphqlErrorEntry>,
}

#[derive(Debug, Deserialize)]
struct GraphqlErrorEntry {
    message: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchData {
    rate_limit: Option<GraphRateLimit>,
    repository: Option<RepositoryData>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GraphRateLimit {
    limit: u32,
    remaining: u32,
    reset_at: DateTime<Utc>,
}

impl GraphRateLimit {
    fn into_info(self) -> RateLimitInfo {
        let reset_at = u64::try_from(self.reset_at.timestamp()).unwrap_or(0);
        RateLimitInfo::new(self.limit, self.remaining, reset_at)
    }
}

#[derive(Debug, Deserialize)]
struct RepositoryData {
    issues: IssueConnection,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct IssueConnection {
    page_info: ConnectionPageInfo,
    #[serde(default)]
    nodes: Vec<GraphIssueNode>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ConnectionPageInfo {
    end_cursor: Option<String>,
    has_next_page: bool,
}

/// Octocrab-backed GraphQL issue gateway.
pub struct GraphqlIssueGateway {
    client: Octocrab,
}

impl GraphqlIssueGateway {
    /// Creates a new gateway from an Octocrab client.
    #[must_use]
    pub const fn new(client: Octocrab) -> Self {
        Self { client }
    }

    /// Builds a gateway for the given token and repository locator.
    ///
    /// # Errors
    ///
    /// Returns `SearchError::InvalidUrl` when the GraphQL base URI cannot be
    /// parsed or `SearchError::Api` when Octocrab fails to construct a
    /// client.
    pub fn for_token(
        token: &PersonalAccessToken,
        locator: &RepositoryLocator,
    ) -> Result<Self, SearchError> {
        let octocrab = build_octocrab_client(token, locator.graphql_base().as_str())?;
        Ok(Self::new(octocrab))
    }
}

#[async_trait]
impl IssueGateway for GraphqlIssueGateway {
    fn detects_linked_change_requests(&self) -> bool {
        true
    }

    async fn fetch_page(
        &self,
        locator: &RepositoryLocator,
        token: Option<PageToken>,
        per_page: u8,
    ) -> Result<IssuePage, SearchError> {
        // A page-number token can only arrive through misuse of the driver;
        // restart from the first page rather than guessing a cursor.
        let cursor = match token {
            Some(PageToken::Cursor(value)) => Some(value),
            Some(PageToken::Number(_)) | None => None,
        };

        let payload = serde_json::json!({
            "query": ISSUE_SEARCH_QUERY,
            "variables": {
                "owner": locator.owner().as_str(),
                "name": locator.repository().as_str(),
                "pageSize": i64::from(per_page),
                "cursor": cursor,
            },
        });

        let envelope: GraphqlEnvelope = self
            .client
            .graphql(&payload)
            .await
            .map_err(|error| map_octocrab_error("issue search", &error))?;

        unpack_envelope(envelope)
    }
}

fn unpack_envelope(envelope: GraphqlEnvelope) -> Result<IssuePage, SearchError> {
    if let Some(first_error) = envelope.errors.first() {
        return Err(SearchError::Api {
            message: format!("issue search failed: {}", first_error.message),
        });
    }

    let data = envelope.data.ok_or_else(|| SearchError::MalformedResponse {
        message: "GraphQL response carried neither data nor errors".to_owned(),
    })?;
    let repository = data.repository.ok_or_else(|| SearchError::Api {
        message: "repository not found or not visible with this token".to_owned(),
    })?;

    let connection = repository.issues;
    let fetched_count = connection.nodes.len();
    let issues: Vec<Issue> = connection.nodes.into_iter().map(Issue::from).collect();

    let next = if connection.page_info.has_next_page {
        connection.page_info.end_cursor.map(PageToken::Cursor)
    } else {
        None
    };

    tracing::debug!(
        issues = issues.len(),
        has_next = next.is_some(),
        "fetched GraphQL issue page"
    );

    Ok(IssuePage {
        issues,
        fetched_count,
        rate_limit: data.rate_limit.map(GraphRateLimit::into_info),
        next,
    })
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::GraphqlIssueGateway;
    use crate::github::error::SearchError;
    use crate::github::gateway::{IssueGateway, PageToken};
    use crate::github::locator::{PersonalAccessToken, RepositoryLocator};
    use crate::github::models::ChangeRequestLink;

    fn issue_node(number: u64) -> serde_json::Value {
        json!({
            "number": number,
            "title": format!("Issue {number}"),
            "url": format!("https://github.com/owner/repo/issues/{number}"),
            "state": "OPEN",
            "createdAt": "2025-01-01T00:00:00Z",
            "updatedAt": "2025-01-02T00:00:00Z",
            "comments": { "totalCount": 2 },
            "assignees": { "nodes": [] },
            "labels": { "nodes": [] },
            "timelineItems": { "nodes": [] }
        })
    }

    fn page_body(nodes: Vec<serde_json::Value>, end_cursor: Option<&str>, remaining: u32) -> serde_json::Value {
        json!({
            "data": {
                "rateLimit": {
                    "limit": 5000,
                    "remaining": remaining,
                    "resetAt": "2025-06-01T00:00:00Z"
                },
                "repository": {
                    "issues": {
                        "pageInfo": {
                            "endCursor": end_cursor,
                            "hasNextPage": end_cursor.is_some()
                        },
                        "nodes": nodes
                    }
                }
            }
        })
    }

    async fn gateway_for(server: &MockServer) -> (GraphqlIssueGateway, RepositoryLocator) {
        let locator = RepositoryLocator::parse(&format!("{}/owner/repo", server.uri()))
            .expect("should create repository locator");
        let token = PersonalAccessToken::new("valid-token").expect("token should be valid");
        let gateway =
            GraphqlIssueGateway::for_token(&token, &locator).expect("should create gateway");
        (gateway, locator)
    }

    #[tokio::test]
    async fn fetch_page_normalizes_nodes_and_rate_limit() {
        let server = MockServer::start().await;
        let (gateway, locator) = gateway_for(&server).await;

        let body = page_body(vec![issue_node(1), issue_node(2)], Some("CURSOR-2"), 4999);
        Mock::given(method("POST"))
            .and(path("/api/graphql"))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .mount(&server)
            .await;

        let page = gateway
            .fetch_page(&locator, None, 100)
            .await
            .expect("request should succeed");

        assert_eq!(page.issues.len(), 2);
        assert_eq!(page.fetched_count, 2);
        let first = page.issues.first().expect("should have first issue");
        assert_eq!(first.number, 1);
        assert_eq!(first.change_request, ChangeRequestLink::NotFound);
        assert_eq!(page.next, Some(PageToken::Cursor("CURSOR-2".to_owned())));

        let info = page.rate_limit.expect("rate limit should be populated");
        assert_eq!(info.limit(), 5000);
        assert_eq!(info.remaining(), 4999);
    }

    #[tokio::test]
    async fn fetch_page_threads_cursor_into_variables() {
        let server = MockServer::start().await;
        let (gateway, locator) = gateway_for(&server).await;

        let body = page_body(vec![issue_node(3)], None, 4998);
        Mock::given(method("POST"))
            .and(path("/api/graphql"))
            .and(body_partial_json(json!({
                "variables": { "cursor": "CURSOR-2", "pageSize": 100 }
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .mount(&server)
            .await;

        let page = gateway
            .fetch_page(&locator, Some(PageToken::Cursor("CURSOR-2".to_owned())), 100)
            .await
            .expect("request should succeed");

        assert_eq!(page.issues.len(), 1);
        assert!(page.next.is_none(), "last page should carry no token");
    }

    #[tokio::test]
    async fn fetch_page_maps_bad_credentials_to_authentication() {
        let server = MockServer::start().await;
        let (gateway, locator) = gateway_for(&server).await;

        Mock::given(method("POST"))
            .and(path("/api/graphql"))
            .respond_with(ResponseTemplate::new(401).set_body_json(json!({
                "message": "Bad credentials",
                "documentation_url": "https://docs.github.com/graphql"
            })))
            .mount(&server)
            .await;

        let error = gateway
            .fetch_page(&locator, None, 100)
            .await
            .expect_err("request should fail");
        assert!(error.is_authentication(), "got {error:?}");
    }

    #[tokio::test]
    async fn fetch_page_surfaces_graphql_errors_as_api_errors() {
        let server = MockServer::start().await;
        let (gateway, locator) = gateway_for(&server).await;

        Mock::given(method("POST"))
            .and(path("/api/graphql"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": null,
                "errors": [{ "message": "Could not resolve to a Repository" }]
            })))
            .mount(&server)
            .await;

        let error = gateway
            .fetch_page(&locator, None, 100)
            .await
            .expect_err("request should fail");
        assert!(
            matches!(&error, SearchError::Api { message } if message.contains("Could not resolve")),
            "got {error:?}"
        );
    }
}
