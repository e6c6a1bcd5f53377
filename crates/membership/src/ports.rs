//! Port traits implemented by infrastructure crates.
//!
//! The reconciler depends only on these traits. Which implementation backs
//! them (GitHub REST, a GitHub Enterprise instance, an in-memory fake) is
//! chosen by the composition root at deploy time.

use async_trait::async_trait;

use crate::{
    ConfigurationError, ContributorSet, InvitationTarget, Login, OrganizationName, ProviderError,
    TeamSlug,
};

/// Read and mutate organisation membership.
///
/// Only [`MembershipProvider::invite_to_org`] and [`MembershipProvider::add_to_team`]
/// mutate external state. Credentials are owned by the implementation.
#[async_trait]
pub trait MembershipProvider: Send + Sync {
    /// Confirms that the organisation (and team) exist and that the credential
    /// may invite into them. Called once per run, before any contributor.
    async fn verify_target(&self, target: &InvitationTarget) -> Result<(), ConfigurationError>;

    /// Returns `true` if `login` is an active organisation member.
    async fn is_org_member(
        &self,
        organization: &OrganizationName,
        login: &Login,
    ) -> Result<bool, ProviderError>;

    /// Returns `true` if `login` is an active member of `team`.
    async fn is_team_member(
        &self,
        organization: &OrganizationName,
        team: &TeamSlug,
        login: &Login,
    ) -> Result<bool, ProviderError>;

    /// Sends an organisation invitation carrying the target's role and team.
    async fn invite_to_org(
        &self,
        target: &InvitationTarget,
        login: &Login,
    ) -> Result<(), ProviderError>;

    /// Adds an existing organisation member to `team`.
    async fn add_to_team(
        &self,
        organization: &OrganizationName,
        team: &TeamSlug,
        login: &Login,
    ) -> Result<(), ProviderError>;
}

/// Supplies the contributors of the release being published.
#[async_trait]
pub trait ContributorSource: Send + Sync {
    /// The error type produced when contributors cannot be determined.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Returns the contributors of the current release. An empty set is valid.
    async fn release_contributors(&self) -> Result<ContributorSet, Self::Error>;
}
