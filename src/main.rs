//! Forager CLI entrypoint for issue discovery.

use std::io::{self, Write};
use std::process::ExitCode;

use forager::{
    CancelFlag, ForagerConfig, IssueSearch, PersonalAccessToken, ProgressObserver, ProgressState,
    RepositoryLocator, SearchError, SearchReport,
};
use ortho_config::OrthoConfig;

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            if writeln!(io::stderr().lock(), "{error}").is_err() {
                return ExitCode::FAILURE;
            }
            ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<(), SearchError> {
    let config = load_config()?;

    let repository = config.require_repository()?;
    let locator = RepositoryLocator::parse(repository)?;

    let token = config
        .resolve_token()
        .map(PersonalAccessToken::new)
        .transpose()?;

    let search = IssueSearch::from_credential(token.as_ref(), &locator)?;
    let report = search
        .search(&locator, &StderrProgress, &CancelFlag::new())
        .await;

    write_report(&report)?;
    report.error.map_or(Ok(()), Err)
}

/// Loads configuration from CLI, environment, and files.
///
/// # Errors
///
/// Returns [`SearchError::Configuration`] when ortho-config fails to parse
/// arguments or load configuration files.
fn load_config() -> Result<ForagerConfig, SearchError> {
    ForagerConfig::load().map_err(|error| SearchError::Configuration {
        message: error.to_string(),
    })
}

/// Progress observer that mirrors status lines to stderr.
struct StderrProgress;

impl ProgressObserver for StderrProgress {
    fn observe(&self, state: &ProgressState) {
        let line = format!(
            "[{percent:>3}%] {message}",
            percent = state.percent_complete(),
            message = state.status_message()
        );
        // Progress is advisory; a broken stderr must not abort the search.
        let _ = writeln!(io::stderr().lock(), "{line}");
    }
}

fn write_report(report: &SearchReport) -> Result<(), SearchError> {
    let mut stdout = io::stdout().lock();

    let mut render = || -> io::Result<()> {
        if report.is_partial() {
            writeln!(
                stdout,
                "Warning: results are partial ({reason:?})",
                reason = report.termination
            )?;
        }
        if !report.pr_detection_available {
            writeln!(
                stdout,
                "Note: linked pull requests were not checked; some issues may already be in progress"
            )?;
        }
        for issue in &report.issues {
            writeln!(
                stdout,
                "#{number} {title}\n    {url}",
                number = issue.number,
                title = issue.title,
                url = issue.url
            )?;
        }
        writeln!(
            stdout,
            "{count} candidate issue(s) found",
            count = report.issues.len()
        )?;
        if let Some(info) = report.rate_limit {
            writeln!(
                stdout,
                "Rate limit: {remaining}/{limit} remaining",
                remaining = info.remaining(),
                limit = info.limit()
            )?;
        }
        Ok(())
    };

    render().map_err(|error| SearchError::Io {
        message: error.to_string(),
    })
}
