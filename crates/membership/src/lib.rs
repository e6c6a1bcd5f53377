//! Domain model for contributor invitations.
//!
//! This crate contains every domain concept, newtype identifier, shared value
//! type, and error type used when inviting release contributors into a GitHub
//! organisation. Infrastructure crates implement the traits defined here; they
//! never add domain rules.
//!
//! ## Architectural Layer
//!
//! **Business logic + port definitions.** This crate has no I/O dependencies.
//! It defines *what* is needed; infrastructure crates define *how* to supply it.
//!
//! ## Module Layout
//!
//! | Module | Contents |
//! |--------|----------|
//! | [`identifiers`] | Newtype identifiers (`Login`, `OrganizationName`, `TeamSlug`, etc.) |
//! | [`types`] | Targets, membership status, outcomes, and the run report |
//! | [`errors`] | Provider and configuration errors, retry policy |
//! | [`policy`] | Exclusion list and bot handling |
//! | [`contributors`] | Ordered contributor sets and co-author trailer parsing |
//! | [`ports`] | `MembershipProvider` and `ContributorSource` traits |

pub mod contributors;
pub mod errors;
pub mod identifiers;
pub mod policy;
pub mod ports;
pub mod types;

// Re-export everything at the crate root for ergonomic usage by downstream crates.
pub use contributors::{parse_co_authors, ContributorSet};
pub use errors::{ConfigurationError, FailureReason, ProviderError, ProviderErrorKind, RetryPolicy};
pub use identifiers::{
    Login, OrganizationName, PullRequestNumber, ReconciliationRunId, RepositoryId, TeamId,
    TeamSlug, UserId,
};
pub use policy::{ExclusionPolicy, KNOWN_BOT_EXCLUSIONS};
pub use ports::{ContributorSource, MembershipProvider};
pub use types::{
    ExclusionReason, InvitationOutcome, InvitationResult, InvitationTarget, InviteAction,
    MembershipStatus, OrgRole, ReconciliationReport, Timestamp,
};
