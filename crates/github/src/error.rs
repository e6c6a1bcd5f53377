//! Adapter errors and HTTP failure classification.

use std::time::Duration;

use membership::ProviderError;
use reqwest::header::HeaderMap;
use reqwest::StatusCode;
use serde::Deserialize;
use thiserror::Error;

/// Errors raised by the adapter outside the membership port.
#[derive(Debug, Error)]
pub enum GithubError {
    /// A GitHub API call failed.
    #[error(transparent)]
    Api(#[from] ProviderError),

    /// The HTTP client could not be constructed.
    #[error("Could not build HTTP client: {0}")]
    Client(#[from] reqwest::Error),

    /// The configured API base URL is unusable.
    #[error("Invalid GitHub API URL '{url}'")]
    InvalidBaseUrl { url: String },

    /// The token contains characters that cannot appear in a header.
    #[error("GitHub token contains invalid characters")]
    InvalidToken,

    /// The Actions event payload could not be read or parsed.
    #[error("Invalid event payload at '{path}': {message}")]
    InvalidEvent { path: String, message: String },
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    message: Option<String>,
}

/// Extracts the `message` field of a GitHub error body.
fn api_message(body: &str) -> Option<String> {
    serde_json::from_str::<ApiErrorBody>(body)
        .ok()
        .and_then(|b| b.message)
        .filter(|m| !m.is_empty())
}

fn header_u64(headers: &HeaderMap, name: &str) -> Option<u64> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse().ok())
}

/// Server-requested delay from `Retry-After` (seconds) or `x-ratelimit-reset`
/// (epoch seconds), relative to `now_epoch`.
pub(crate) fn retry_after(headers: &HeaderMap, now_epoch: i64) -> Option<Duration> {
    if let Some(seconds) = header_u64(headers, "retry-after") {
        return Some(Duration::from_secs(seconds));
    }
    let reset = i64::try_from(header_u64(headers, "x-ratelimit-reset")?).ok()?;
    Some(Duration::from_secs(u64::try_from(reset - now_epoch).unwrap_or(0)))
}

/// Maps a non-success GitHub response to a [`ProviderError`].
///
/// 403 and 429 count as rate limiting when the quota is exhausted or the
/// server asked for a delay; otherwise 401/403 are permission failures.
pub(crate) fn classify_response(
    status: StatusCode,
    headers: &HeaderMap,
    body: &str,
    now_epoch: i64,
) -> ProviderError {
    let message = api_message(body).unwrap_or_else(|| status.to_string());

    let quota_exhausted = header_u64(headers, "x-ratelimit-remaining") == Some(0);
    let throttled = status == StatusCode::TOO_MANY_REQUESTS
        || (status == StatusCode::FORBIDDEN
            && (quota_exhausted || headers.contains_key("retry-after")));
    if throttled {
        return ProviderError::rate_limited(message, retry_after(headers, now_epoch));
    }

    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => ProviderError::permission_denied(message),
        StatusCode::NOT_FOUND => ProviderError::not_found(message),
        StatusCode::UNPROCESSABLE_ENTITY => ProviderError::already_pending(message),
        s if s.is_server_error() => ProviderError::transient(message),
        _ => ProviderError::unknown(message),
    }
}

/// Maps a transport failure to a [`ProviderError`].
pub(crate) fn classify_transport(error: &reqwest::Error) -> ProviderError {
    if error.is_timeout() || error.is_connect() || error.is_request() || error.is_body() {
        ProviderError::transient(error.to_string())
    } else {
        ProviderError::unknown(error.to_string())
    }
}
