//! Application configuration loaded from CLI, environment, and files.
//!
//! Values merge from command-line arguments, environment variables, and
//! configuration files using ortho-config's layered approach.
//!
//! # Precedence
//!
//! Configuration values are loaded with the following precedence (lowest to
//! highest):
//!
//! 1. **Defaults** – Built-in application defaults
//! 2. **Configuration file** – `.forager.toml` in current directory, home
//!    directory, or XDG config directory
//! 3. **Environment variables** – `FORAGER_REPOSITORY`, `FORAGER_TOKEN`, or
//!    legacy `GITHUB_TOKEN`
//! 4. **Command-line arguments** – `--repository`/`-r` and `--token`/`-t`
//!
//! # Configuration File
//!
//! Place `.forager.toml` in the current directory, home directory, or
//! XDG config directory with:
//!
//! ```toml
//! repository = "octocat/hello-world"
//! token = "ghp_example"
//! ```

use std::env;

use ortho_config::OrthoConfig;
use serde::{Deserialize, Serialize};

use crate::github::error::SearchError;

/// Application configuration supporting CLI, environment, and file sources.
///
/// # Environment Variables
///
/// - `FORAGER_REPOSITORY` or `--repository`: Repository URL or `owner/repo`
/// - `FORAGER_TOKEN`, `GITHUB_TOKEN`, or `--token`: Authentication token
///
/// # Example
///
/// ```no_run
/// use forager::ForagerConfig;
/// use ortho_config::OrthoConfig;
///
/// let config = ForagerConfig::load().expect("failed to load configuration");
/// let repository = config.require_repository().expect("repository required");
/// ```
#[derive(Debug, Clone, Default, Deserialize, Serialize, OrthoConfig)]
#[serde(default)]
#[ortho_config(
    prefix = "FORAGER",
    discovery(
        dotfile_name = ".forager.toml",
        config_file_name = "forager.toml",
        app_name = "forager"
    )
)]
pub struct ForagerConfig {
    /// Repository to search, as a URL or `owner/repo` shorthand.
    ///
    /// Can be provided via:
    /// - CLI: `--repository <REPO>` or `-r <REPO>`
    /// - Environment: `FORAGER_REPOSITORY`
    /// - Config file: `repository = "..."`
    #[ortho_config(cli_short = 'r')]
    pub repository: Option<String>,

    /// Personal access token for GitHub API authentication.
    ///
    /// Optional: without a token the search runs unauthenticated over REST
    /// and cannot detect linked change requests.
    ///
    /// Can be provided via:
    /// - CLI: `--token <TOKEN>` or `-t <TOKEN>`
    /// - Environment: `FORAGER_TOKEN` or `GITHUB_TOKEN` (legacy)
    /// - Config file: `token = "..."`
    #[ortho_config(cli_short = 't')]
    pub token: Option<String>,
}

impl ForagerConfig {
    /// Resolves the token from configuration or the legacy `GITHUB_TOKEN`
    /// environment variable.
    ///
    /// If no token is provided via `FORAGER_TOKEN`, the CLI, or a
    /// configuration file, this method falls back to reading `GITHUB_TOKEN`
    /// from the environment. A missing token is not an error here; the
    /// search degrades to the unauthenticated strategy.
    #[must_use]
    pub fn resolve_token(&self) -> Option<String> {
        self.token
            .clone()
            .or_else(|| env::var("GITHUB_TOKEN").ok())
    }

    /// Returns the repository identifier or an error if missing.
    ///
    /// # Errors
    ///
    /// Returns [`SearchError::Configuration`] when no repository is
    /// configured.
    pub fn require_repository(&self) -> Result<&str, SearchError> {
        self.repository
            .as_deref()
            .ok_or_else(|| SearchError::Configuration {
                message: "repository is required (use --repository or -r)".to_owned(),
            })
    }
}
