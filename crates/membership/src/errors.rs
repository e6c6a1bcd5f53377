//! Error and retry-policy types for contributor reconciliation.
//!
//! [`ConfigurationError`] covers conditions that abort a run before any
//! contributor is processed. [`ProviderError`] covers a single failed call to
//! the identity provider; it never aborts a run and is folded into that
//! contributor's result.
//!
//! [`RetryPolicy`] is a cross-cutting concern: every [`ProviderError`] can
//! produce one, and the reconciler retries only what it says is retryable.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{OrganizationName, TeamSlug};

// ---------------------------------------------------------------------------
// Retry semantics
// ---------------------------------------------------------------------------

/// Whether an error condition is safe to retry and, if so, after what delay.
///
/// - `Retryable` errors: network timeouts, 5xx responses, rate-limit responses.
/// - `NonRetryable` errors: permission denied, unknown user, pending invitation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum RetryPolicy {
    /// The operation may be retried.
    ///
    /// `after` optionally specifies the minimum delay before retrying (e.g.
    /// derived from `Retry-After` or `x-ratelimit-reset` response headers).
    Retryable {
        /// Minimum back-off before the next attempt. `None` means apply the
        /// caller's own back-off schedule.
        after: Option<Duration>,
    },
    /// The operation must not be retried.
    NonRetryable,
}

// ---------------------------------------------------------------------------
// Per-contributor failures
// ---------------------------------------------------------------------------

/// Coarse classification of a per-contributor failure, as surfaced in results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureReason {
    /// The credential may not perform the operation.
    PermissionDenied,
    /// The provider throttled the request and the retry budget ran out.
    RateLimited,
    /// Network failure, server error, or run deadline; may succeed later.
    Transient,
    /// An invitation is already outstanding for this contributor.
    AlreadyPending,
    /// Anything else, including unknown users.
    Unknown,
}

impl std::fmt::Display for FailureReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Self::PermissionDenied => "permission-denied",
            Self::RateLimited => "rate-limited",
            Self::Transient => "transient",
            Self::AlreadyPending => "already-pending",
            Self::Unknown => "unknown",
        };
        write!(f, "{label}")
    }
}

/// Fine-grained kind of a [`ProviderError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderErrorKind {
    PermissionDenied,
    RateLimited,
    Transient,
    AlreadyPending,
    NotFound,
    Unknown,
}

/// A failed call to the identity provider.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{kind:?}: {message}")]
pub struct ProviderError {
    /// What went wrong.
    pub kind: ProviderErrorKind,
    /// Provider-supplied detail (e.g. the `message` field of an API error body).
    pub message: String,
    /// Server-requested delay before the next attempt.
    pub retry_after: Option<Duration>,
}

impl ProviderError {
    /// Creates an error of `kind` with no retry hint.
    pub fn new(kind: ProviderErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            retry_after: None,
        }
    }

    pub fn permission_denied(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorKind::PermissionDenied, message)
    }

    pub fn rate_limited(message: impl Into<String>, retry_after: Option<Duration>) -> Self {
        Self {
            retry_after,
            ..Self::new(ProviderErrorKind::RateLimited, message)
        }
    }

    pub fn transient(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorKind::Transient, message)
    }

    pub fn already_pending(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorKind::AlreadyPending, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorKind::NotFound, message)
    }

    pub fn unknown(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorKind::Unknown, message)
    }

    /// Whether the reconciler may re-issue the call.
    pub fn retry_policy(&self) -> RetryPolicy {
        match self.kind {
            ProviderErrorKind::RateLimited | ProviderErrorKind::Transient => {
                RetryPolicy::Retryable {
                    after: self.retry_after,
                }
            }
            _ => RetryPolicy::NonRetryable,
        }
    }

    /// The classification recorded in the contributor's result.
    pub fn failure_reason(&self) -> FailureReason {
        match self.kind {
            ProviderErrorKind::PermissionDenied => FailureReason::PermissionDenied,
            ProviderErrorKind::RateLimited => FailureReason::RateLimited,
            ProviderErrorKind::Transient => FailureReason::Transient,
            ProviderErrorKind::AlreadyPending => FailureReason::AlreadyPending,
            ProviderErrorKind::NotFound | ProviderErrorKind::Unknown => FailureReason::Unknown,
        }
    }
}

// ---------------------------------------------------------------------------
// Run-level failures
// ---------------------------------------------------------------------------

/// Conditions that abort a run before any contributor is processed.
///
/// Nothing is partially done when one of these is returned.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigurationError {
    /// The organisation does not exist or is not visible to the credential.
    #[error("Organization '{organization}' does not exist or is not visible")]
    UnknownOrganization { organization: OrganizationName },

    /// The team does not exist in the organisation.
    #[error("Team '{team}' does not exist in organization '{organization}'")]
    UnknownTeam {
        organization: OrganizationName,
        team: TeamSlug,
    },

    /// The credential was rejected outright.
    #[error("Credential rejected: {message}")]
    InvalidCredential { message: String },

    /// The credential is valid but lacks a scope needed to invite.
    #[error("Credential is missing required scope '{scope}'")]
    MissingScope { scope: String },

    /// No organisation was configured and none could be inferred.
    #[error("No organization configured and the repository is not organization-owned")]
    MissingOrganization,

    /// The target could not be verified because the provider failed.
    #[error("Could not verify invitation target: {0}")]
    Unverifiable(ProviderError),
}
