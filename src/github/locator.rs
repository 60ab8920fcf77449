//! Repository identity wrappers and API endpoint derivation.

use url::Url;

use super::error::SearchError;

/// Repository owner wrapper to avoid stringly typed parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositoryOwner(String);

impl RepositoryOwner {
    pub(crate) fn new(value: &str) -> Result<Self, SearchError> {
        if value.is_empty() {
            return Err(SearchError::MissingPathSegments);
        }
        Ok(Self(value.to_owned()))
    }

    /// Borrow the owner value.
    #[must_use]
    pub const fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

/// Repository name wrapper to prevent parameter mix-ups.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositoryName(String);

impl RepositoryName {
    pub(crate) fn new(value: &str) -> Result<Self, SearchError> {
        if value.is_empty() {
            return Err(SearchError::MissingPathSegments);
        }
        Ok(Self(value.to_owned()))
    }

    /// Borrow the repository name.
    #[must_use]
    pub const fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

/// Personal access token wrapper enforcing presence.
///
/// The search core never inspects token contents beyond presence; a blank
/// token is rejected here so the strategy selector only sees usable
/// credentials or none at all.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersonalAccessToken(String);

impl PersonalAccessToken {
    /// Validates that the token is non-empty and trims whitespace.
    ///
    /// # Errors
    ///
    /// Returns `SearchError::MissingToken` when the supplied string is blank.
    pub fn new(token: impl AsRef<str>) -> Result<Self, SearchError> {
        let trimmed = token.as_ref().trim();
        if trimmed.is_empty() {
            return Err(SearchError::MissingToken);
        }
        Ok(Self(trimmed.to_owned()))
    }

    /// Borrow the token value.
    #[must_use]
    pub const fn value(&self) -> &str {
        self.0.as_str()
    }
}

impl AsRef<str> for PersonalAccessToken {
    fn as_ref(&self) -> &str {
        self.value()
    }
}

/// Derives the REST API base URL from a host string.
fn derive_rest_base(scheme: &str, host: &str, port: Option<u16>) -> Result<Url, SearchError> {
    if host.eq_ignore_ascii_case("github.com") {
        Url::parse("https://api.github.com")
            .map_err(|error| SearchError::InvalidUrl(error.to_string()))
    } else {
        let mut api_url = host_base(scheme, host, port)?;
        api_url.set_path("api/v3");
        Ok(api_url)
    }
}

/// Derives the GraphQL API base URL from a host string.
///
/// GitHub Enterprise serves GraphQL from `/api/graphql`, not `/api/v3`, so
/// the GraphQL base is derived separately from the REST base. Routes are
/// appended to the base path, so `<base>/graphql` is the final endpoint.
fn derive_graphql_base(scheme: &str, host: &str, port: Option<u16>) -> Result<Url, SearchError> {
    if host.eq_ignore_ascii_case("github.com") {
        Url::parse("https://api.github.com")
            .map_err(|error| SearchError::InvalidUrl(error.to_string()))
    } else {
        let mut api_url = host_base(scheme, host, port)?;
        api_url.set_path("api");
        Ok(api_url)
    }
}

fn host_base(scheme: &str, host: &str, port: Option<u16>) -> Result<Url, SearchError> {
    let authority = if host.contains(':') {
        format!("[{host}]")
    } else {
        host.to_owned()
    };
    let mut api_url = Url::parse(&format!("{scheme}://{authority}"))
        .map_err(|error| SearchError::InvalidUrl(error.to_string()))?;

    api_url
        .set_port(port)
        .map_err(|()| SearchError::InvalidUrl("invalid port".to_owned()))?;
    Ok(api_url)
}

/// Parsed repository identity with derived API base URLs.
///
/// # Example
///
/// ```
/// use forager::github::locator::RepositoryLocator;
///
/// let locator = RepositoryLocator::parse("https://github.com/octo/repo")
///     .expect("should parse repository URL");
/// assert_eq!(locator.owner().as_str(), "octo");
/// assert_eq!(locator.repository().as_str(), "repo");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositoryLocator {
    rest_base: Url,
    graphql_base: Url,
    owner: RepositoryOwner,
    repository: RepositoryName,
}

impl RepositoryLocator {
    /// Creates a repository locator from owner and repository name strings.
    ///
    /// Uses `github.com` as the default host.
    ///
    /// # Errors
    ///
    /// Returns `SearchError::MissingPathSegments` when owner or repo is empty.
    pub fn from_owner_repo(owner: &str, repo: &str) -> Result<Self, SearchError> {
        let validated_owner = RepositoryOwner::new(owner)?;
        let repository = RepositoryName::new(repo)?;
        let rest_base = derive_rest_base("https", "github.com", None)?;
        let graphql_base = derive_graphql_base("https", "github.com", None)?;

        Ok(Self {
            rest_base,
            graphql_base,
            owner: validated_owner,
            repository,
        })
    }

    /// Parses a repository identifier.
    ///
    /// Accepts either a full URL in the form `https://github.com/<owner>/<repo>`
    /// (GitHub Enterprise hosts derive `/api/v3` and `/api` bases) or the
    /// `<owner>/<repo>` shorthand, which targets `github.com`.
    ///
    /// # Errors
    ///
    /// Returns `SearchError::InvalidUrl` when URL parsing fails or
    /// `MissingPathSegments` when the path is not `/owner/repo`.
    pub fn parse(input: &str) -> Result<Self, SearchError> {
        if !input.contains("://") {
            let mut parts = input.splitn(2, '/');
            let owner = parts.next().unwrap_or_default();
            let repo = parts.next().unwrap_or_default();
            return Self::from_owner_repo(owner, repo.trim_end_matches('/'));
        }

        let parsed =
            Url::parse(input).map_err(|error| SearchError::InvalidUrl(error.to_string()))?;

        let mut segments = parsed
            .path_segments()
            .ok_or(SearchError::MissingPathSegments)?;

        let owner_segment = segments.next().ok_or(SearchError::MissingPathSegments)?;
        let repository_segment = segments.next().ok_or(SearchError::MissingPathSegments)?;

        let owner = RepositoryOwner::new(owner_segment)?;
        let repository = RepositoryName::new(repository_segment)?;

        let host = parsed
            .host_str()
            .ok_or_else(|| SearchError::InvalidUrl("URL must include a host".to_owned()))?;
        let rest_base = derive_rest_base(parsed.scheme(), host, parsed.port())?;
        let graphql_base = derive_graphql_base(parsed.scheme(), host, parsed.port())?;

        Ok(Self {
            rest_base,
            graphql_base,
            owner,
            repository,
        })
    }

    /// REST API base URL derived from the repository host.
    #[must_use]
    pub const fn rest_base(&self) -> &Url {
        &self.rest_base
    }

    /// GraphQL API base URL derived from the repository host.
    #[must_use]
    pub const fn graphql_base(&self) -> &Url {
        &self.graphql_base
    }

    /// Repository owner.
    #[must_use]
    pub const fn owner(&self) -> &RepositoryOwner {
        &self.owner
    }

    /// Repository name.
    #[must_use]
    pub const fn repository(&self) -> &RepositoryName {
        &self.repository
    }

    /// Returns the absolute REST URL for listing issues.
    pub(crate) fn issues_url(&self) -> String {
        format!(
            "{base}/repos/{owner}/{repo}/issues",
            base = self.rest_base.as_str().trim_end_matches('/'),
            owner = self.owner.as_str(),
            repo = self.repository.as_str()
        )
    }
}
