//! Locating the released pull request from a GitHub Actions event payload.

use std::path::Path;

use membership::PullRequestNumber;
use serde_json::Value;

use crate::GithubError;

/// How the pull request behind a workflow run can be found.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PullRequestLocator {
    /// The event is a `pull_request` event carrying the number directly.
    Number(PullRequestNumber),
    /// The event is a `push`; the pull request is looked up from this commit.
    Commit(String),
}

/// Finds the pull request reference in an event payload.
///
/// Checked in order: `pull_request.number`, `head_commit.id`, `commits[0].id`.
/// Returns `None` when the payload references neither.
pub fn locate_pull_request(event: &Value) -> Option<PullRequestLocator> {
    if let Some(number) = event.pointer("/pull_request/number").and_then(Value::as_u64) {
        return Some(PullRequestLocator::Number(PullRequestNumber::new(number)));
    }

    event
        .pointer("/head_commit/id")
        .or_else(|| event.pointer("/commits/0/id"))
        .and_then(Value::as_str)
        .filter(|sha| !sha.is_empty())
        .map(|sha| PullRequestLocator::Commit(sha.to_string()))
}

/// Reads and parses the event payload at `path` (`GITHUB_EVENT_PATH`).
///
/// # Errors
///
/// [`GithubError::InvalidEvent`] when the file cannot be read or is not JSON.
pub async fn load_event(path: &Path) -> Result<Value, GithubError> {
    let invalid = |message: String| GithubError::InvalidEvent {
        path: path.display().to_string(),
        message,
    };
    let raw = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| invalid(e.to_string()))?;
    serde_json::from_str(&raw).map_err(|e| invalid(e.to_string()))
}
