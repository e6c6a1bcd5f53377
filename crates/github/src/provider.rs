//! [`MembershipProvider`] over the GitHub REST API.

use async_trait::async_trait;
use membership::{
    ConfigurationError, InvitationTarget, Login, MembershipProvider, OrganizationName,
    ProviderError, ProviderErrorKind, TeamSlug,
};
use reqwest::{Method, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

use crate::GithubClient;

/// Scope a classic token needs to send organisation invitations.
const INVITE_SCOPE: &str = "admin:org";

#[derive(Debug, Deserialize)]
struct UserBody {
    id: u64,
}

#[derive(Debug, Deserialize)]
struct TeamMembershipBody {
    state: String,
}

#[derive(Debug, Serialize)]
struct InvitationRequest<'a> {
    invitee_id: u64,
    role: &'a str,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    team_ids: Vec<u64>,
}

#[derive(Debug, Serialize)]
struct TeamMembershipRequest {
    role: &'static str,
}

/// Returns `true` when a classic token's `X-OAuth-Scopes` header grants
/// invitation rights. Fine-grained tokens send no header and pass.
fn scopes_allow_invites(header: Option<&str>) -> bool {
    header.map_or(true, |scopes| {
        scopes.split(',').map(str::trim).any(|s| s == INVITE_SCOPE)
    })
}

#[async_trait]
impl MembershipProvider for GithubClient {
    #[instrument(skip_all, fields(organization = %target.organization))]
    async fn verify_target(&self, target: &InvitationTarget) -> Result<(), ConfigurationError> {
        let organization = &target.organization;
        let url = self.url(&["orgs", organization.as_str()]);
        let response = self
            .send(self.request(Method::GET, url))
            .await
            .map_err(ConfigurationError::Unverifiable)?;

        match response.status() {
            s if s.is_success() => {}
            StatusCode::NOT_FOUND => {
                return Err(ConfigurationError::UnknownOrganization {
                    organization: organization.clone(),
                })
            }
            StatusCode::UNAUTHORIZED => {
                let error = self.unexpected(response).await;
                return Err(ConfigurationError::InvalidCredential {
                    message: error.message,
                });
            }
            _ => {
                return Err(ConfigurationError::Unverifiable(
                    self.unexpected(response).await,
                ))
            }
        }

        let scopes = response
            .headers()
            .get("x-oauth-scopes")
            .and_then(|v| v.to_str().ok());
        if !scopes_allow_invites(scopes) {
            return Err(ConfigurationError::MissingScope {
                scope: INVITE_SCOPE.to_string(),
            });
        }

        if let Some(team) = &target.team {
            let id = self
                .team_id(organization, team)
                .await
                .map_err(ConfigurationError::Unverifiable)?
                .ok_or_else(|| ConfigurationError::UnknownTeam {
                    organization: organization.clone(),
                    team: team.clone(),
                })?;
            debug!(%team, team_id = %id, "Resolved team");
        }

        Ok(())
    }

    async fn is_org_member(
        &self,
        organization: &OrganizationName,
        login: &Login,
    ) -> Result<bool, ProviderError> {
        let url = self.url(&["orgs", organization.as_str(), "members", login.as_str()]);
        let response = self.send(self.request(Method::GET, url)).await?;
        match response.status() {
            StatusCode::NO_CONTENT => Ok(true),
            StatusCode::NOT_FOUND => Ok(false),
            StatusCode::FOUND => Err(ProviderError::permission_denied(
                "the token's user is not an organization member and cannot read membership",
            )),
            _ => Err(self.unexpected(response).await),
        }
    }

    async fn is_team_member(
        &self,
        organization: &OrganizationName,
        team: &TeamSlug,
        login: &Login,
    ) -> Result<bool, ProviderError> {
        let url = self.url(&[
            "orgs",
            organization.as_str(),
            "teams",
            team.as_str(),
            "memberships",
            login.as_str(),
        ]);
        let response = self.send(self.request(Method::GET, url)).await?;
        match response.status() {
            StatusCode::NOT_FOUND => Ok(false),
            s if s.is_success() => {
                let body: TeamMembershipBody = response.json().await.map_err(|e| {
                    ProviderError::unknown(format!("Unexpected team membership body: {e}"))
                })?;
                Ok(body.state == "active")
            }
            _ => Err(self.unexpected(response).await),
        }
    }

    #[instrument(skip_all, fields(%login, organization = %target.organization))]
    async fn invite_to_org(
        &self,
        target: &InvitationTarget,
        login: &Login,
    ) -> Result<(), ProviderError> {
        let user: UserBody = self
            .get_json(&["users", login.as_str()], &[])
            .await
            .map_err(|e| match e.kind {
                ProviderErrorKind::NotFound => {
                    ProviderError::not_found(format!("GitHub user '{login}' does not exist"))
                }
                _ => e,
            })?;

        let mut team_ids = Vec::new();
        if let Some(team) = &target.team {
            let id = self
                .team_id(&target.organization, team)
                .await?
                .ok_or_else(|| ProviderError::not_found(format!("team '{team}' does not exist")))?;
            team_ids.push(id.as_u64());
        }

        let body = InvitationRequest {
            invitee_id: user.id,
            role: target.role.as_str(),
            team_ids,
        };
        let url = self.url(&["orgs", target.organization.as_str(), "invitations"]);
        let response = self.send(self.request(Method::POST, url).json(&body)).await?;
        if !response.status().is_success() {
            return Err(self.unexpected(response).await);
        }

        info!("Organization invitation sent");
        Ok(())
    }

    #[instrument(skip_all, fields(%login, %organization, %team))]
    async fn add_to_team(
        &self,
        organization: &OrganizationName,
        team: &TeamSlug,
        login: &Login,
    ) -> Result<(), ProviderError> {
        let url = self.url(&[
            "orgs",
            organization.as_str(),
            "teams",
            team.as_str(),
            "memberships",
            login.as_str(),
        ]);
        let body = TeamMembershipRequest { role: "member" };
        let response = self.send(self.request(Method::PUT, url).json(&body)).await?;
        if !response.status().is_success() {
            return Err(self.unexpected(response).await);
        }

        info!("Added to team");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classic_token_needs_admin_org() {
        assert!(scopes_allow_invites(Some("repo, admin:org")));
        assert!(!scopes_allow_invites(Some("repo, read:org")));
        assert!(!scopes_allow_invites(Some("")));
    }

    #[test]
    fn fine_grained_token_is_not_checked() {
        assert!(scopes_allow_invites(None));
    }
}
