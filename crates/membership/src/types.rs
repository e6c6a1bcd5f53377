//! Shared value types for contributor reconciliation.
//!
//! Unlike the newtype identifiers in [`crate::identifiers`], these types carry
//! the decisions made during a run: who is targeted, what each contributor's
//! membership looks like, and what happened to them.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{FailureReason, Login, OrganizationName, ReconciliationRunId, TeamSlug};

// ---------------------------------------------------------------------------
// Target
// ---------------------------------------------------------------------------

/// Organisation role granted by an invitation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrgRole {
    /// Regular organisation member.
    #[default]
    DirectMember,
    /// Organisation owner.
    Admin,
    /// Billing manager (no repository access).
    BillingManager,
}

impl OrgRole {
    /// Wire value expected by the GitHub invitation endpoint.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::DirectMember => "direct_member",
            Self::Admin => "admin",
            Self::BillingManager => "billing_manager",
        }
    }
}

/// Where contributors are invited to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvitationTarget {
    /// Organisation contributors become members of.
    pub organization: OrganizationName,
    /// Team contributors are added to. `None` targets the organisation only.
    pub team: Option<TeamSlug>,
    /// Role granted by organisation invitations.
    pub role: OrgRole,
}

impl InvitationTarget {
    /// Creates a target for `organization` with the default role and no team.
    pub fn new(organization: OrganizationName) -> Self {
        Self {
            organization,
            team: None,
            role: OrgRole::default(),
        }
    }

    /// Sets the team contributors are added to.
    #[must_use]
    pub fn with_team(mut self, team: TeamSlug) -> Self {
        self.team = Some(team);
        self
    }

    /// Sets the organisation role granted by invitations.
    #[must_use]
    pub fn with_role(mut self, role: OrgRole) -> Self {
        self.role = role;
        self
    }
}

// ---------------------------------------------------------------------------
// Membership
// ---------------------------------------------------------------------------

/// Membership state of one contributor, as read from the identity provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MembershipStatus {
    /// Whether the contributor is an active organisation member.
    pub org_member: bool,
    /// Whether the contributor is an active team member.
    ///
    /// `None` when no team is targeted, or when the contributor is not an
    /// organisation member (team membership is then irrelevant).
    pub team_member: Option<bool>,
}

impl MembershipStatus {
    /// Returns `true` when no invitation is needed.
    pub fn is_complete(self) -> bool {
        self.org_member && self.team_member.unwrap_or(true)
    }

    /// The single mutating call needed to complete membership, if any.
    pub fn required_action(self) -> Option<InviteAction> {
        if !self.org_member {
            Some(InviteAction::OrganizationInvite)
        } else if self.team_member == Some(false) {
            Some(InviteAction::TeamAdd)
        } else {
            None
        }
    }
}

/// The mutation issued for a contributor who is not yet a full member.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InviteAction {
    /// Organisation invitation (carrying the team, if one is targeted).
    OrganizationInvite,
    /// Existing organisation member added to the team.
    TeamAdd,
}

impl std::fmt::Display for InviteAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::OrganizationInvite => write!(f, "organization invite"),
            Self::TeamAdd => write!(f, "team add"),
        }
    }
}

// ---------------------------------------------------------------------------
// Outcomes
// ---------------------------------------------------------------------------

/// Why a contributor was excluded from invitation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExclusionReason {
    /// The login appears in the configured exclusion list.
    Listed,
    /// The login is a GitHub App account and bots are skipped.
    Bot,
}

/// What happened to one contributor during a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum InvitationOutcome {
    /// Already an organisation (and team) member; nothing was sent.
    AlreadyMember,
    /// Excluded by policy; the identity provider was not consulted.
    Excluded {
        /// Which policy rule matched.
        reason: ExclusionReason,
    },
    /// An invitation or team add was issued successfully.
    Invited {
        /// The mutation that was issued.
        action: InviteAction,
    },
    /// Dry run: the mutation that would have been issued.
    WouldInvite {
        /// The mutation that was skipped.
        action: InviteAction,
    },
    /// The membership read or the mutation failed.
    Failed {
        /// Coarse failure classification.
        reason: FailureReason,
        /// Provider-supplied detail.
        message: String,
    },
}

impl InvitationOutcome {
    /// Returns `true` for [`InvitationOutcome::Failed`].
    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Failed { .. })
    }

    /// Returns `true` for failures that should fail the calling pipeline.
    ///
    /// An invitation that is already pending is reported but does not count:
    /// re-running a release before the invitee accepts is routine.
    pub fn fails_run(&self) -> bool {
        match self {
            Self::Failed { reason, .. } => *reason != FailureReason::AlreadyPending,
            _ => false,
        }
    }

    /// Short label used in logs and summaries.
    pub fn label(&self) -> &'static str {
        match self {
            Self::AlreadyMember => "already_member",
            Self::Excluded { .. } => "excluded",
            Self::Invited { .. } => "invited",
            Self::WouldInvite { .. } => "would_invite",
            Self::Failed { .. } => "failed",
        }
    }
}

/// The single result recorded for one contributor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvitationResult {
    /// The contributor this result belongs to.
    pub login: Login,
    /// What happened.
    #[serde(flatten)]
    pub outcome: InvitationOutcome,
    /// Number of mutating calls made (including retries). Zero when none.
    pub attempts: u32,
}

// ---------------------------------------------------------------------------
// Report
// ---------------------------------------------------------------------------

/// Outcome of one reconciliation run. Produced once, never stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReconciliationReport {
    /// Identifier of the run.
    pub run_id: ReconciliationRunId,
    /// Target the run invited into.
    pub target: InvitationTarget,
    /// Whether mutations were suppressed.
    pub dry_run: bool,
    /// When processing started.
    pub started_at: Timestamp,
    /// When the last result was recorded.
    pub finished_at: Timestamp,
    /// One result per contributor, in input order.
    pub results: Vec<InvitationResult>,
}

impl ReconciliationReport {
    /// Returns `true` if any contributor ended in [`InvitationOutcome::Failed`].
    pub fn has_failures(&self) -> bool {
        self.results.iter().any(|r| r.outcome.is_failure())
    }

    /// Returns `true` if any result [fails the run](InvitationOutcome::fails_run).
    pub fn fails_run(&self) -> bool {
        self.results.iter().any(|r| r.outcome.fails_run())
    }

    /// Results that ended in failure.
    pub fn failures(&self) -> impl Iterator<Item = &InvitationResult> {
        self.results.iter().filter(|r| r.outcome.is_failure())
    }

    /// Number of results per outcome label.
    pub fn summary(&self) -> BTreeMap<&'static str, usize> {
        let mut counts = BTreeMap::new();
        for result in &self.results {
            *counts.entry(result.outcome.label()).or_insert(0) += 1;
        }
        counts
    }

    /// Pretty-printed JSON rendering for workflow logs.
    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

// ---------------------------------------------------------------------------
// Time
// ---------------------------------------------------------------------------

/// A UTC wall-clock timestamp.
///
/// Wraps [`chrono::DateTime<Utc>`] so callers never depend on `chrono` types
/// directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Timestamp(DateTime<Utc>);

impl Timestamp {
    /// Returns the current UTC time as a [`Timestamp`].
    pub fn now() -> Self {
        Self(Utc::now())
    }

    /// Creates a [`Timestamp`] from a [`DateTime<Utc>`].
    pub fn from_utc(dt: DateTime<Utc>) -> Self {
        Self(dt)
    }

    /// Returns the underlying [`DateTime<Utc>`].
    pub fn as_datetime(self) -> DateTime<Utc> {
        self.0
    }
}

impl std::fmt::Display for Timestamp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.to_rfc3339())
    }
}
