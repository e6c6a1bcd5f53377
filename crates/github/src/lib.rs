//! GitHub infrastructure adapter.
//!
//! Implements the ports defined in the [`membership`] crate over the GitHub
//! REST API:
//!
//! - [`GithubClient`] implements [`membership::MembershipProvider`]: target
//!   verification, organisation and team membership reads, organisation
//!   invitations, and team adds.
//! - [`PullRequestContributors`] implements [`membership::ContributorSource`]:
//!   the author, commit authors, and co-authors of the pull request behind
//!   the release workflow run.
//!
//! ## Architectural Layer
//!
//! **Infrastructure.** This crate must not contain domain rules. HTTP status
//! handling, rate-limit headers, pagination, and authentication live here; the
//! reconciler only ever sees [`membership::ProviderError`] kinds.

mod client;
mod contributors;
mod error;
mod event;
mod provider;

pub use client::{GithubClient, GithubSettings, DEFAULT_API_URL};
pub use contributors::PullRequestContributors;
pub use error::GithubError;
pub use event::{load_event, locate_pull_request, PullRequestLocator};
