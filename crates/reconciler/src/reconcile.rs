//! The contributor invitation reconciler.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use futures::stream::{self, StreamExt};
use membership::{
    ContributorSet, ExclusionPolicy, FailureReason, InvitationOutcome, InvitationResult,
    InvitationTarget, InviteAction, Login, MembershipProvider, MembershipStatus, ProviderError,
    ReconciliationReport, ReconciliationRunId, Timestamp,
};
use tokio::time::Instant;
use tracing::{debug, info, info_span, warn, Instrument};

use crate::retry::{with_retry, Attempted};
use crate::{ReconcileError, ReconcilerConfig};

/// Decides, per contributor, whether to invite them and performs the invite.
///
/// The identity provider is injected; the reconciler owns no durable state.
pub struct Reconciler {
    provider: Arc<dyn MembershipProvider>,
    config: ReconcilerConfig,
}

impl Reconciler {
    pub fn new(provider: Arc<dyn MembershipProvider>, config: ReconcilerConfig) -> Self {
        Self { provider, config }
    }

    pub fn config(&self) -> &ReconcilerConfig {
        &self.config
    }

    /// Runs one reconciliation pass over `contributors`.
    ///
    /// Returns one result per contributor, in input order. Only a
    /// configuration problem fails the whole run; every per-contributor
    /// failure is reported in the result instead.
    ///
    /// # Errors
    ///
    /// [`ReconcileError::Configuration`] when the provider rejects the target
    /// or credential. No contributor has been touched in that case.
    pub async fn reconcile(
        &self,
        contributors: &ContributorSet,
        target: &InvitationTarget,
        exclusions: &ExclusionPolicy,
    ) -> Result<ReconciliationReport, ReconcileError> {
        let run_id = ReconciliationRunId::new_random();
        let span = info_span!(
            "reconcile",
            %run_id,
            organization = %target.organization,
            team = target.team.as_ref().map(|t| t.as_str()),
            contributors = contributors.len(),
            dry_run = self.config.dry_run,
        );

        self.run(run_id, contributors, target, exclusions)
            .instrument(span)
            .await
    }

    async fn run(
        &self,
        run_id: ReconciliationRunId,
        contributors: &ContributorSet,
        target: &InvitationTarget,
        exclusions: &ExclusionPolicy,
    ) -> Result<ReconciliationReport, ReconcileError> {
        let started_at = Timestamp::now();

        if contributors.is_empty() {
            info!("No contributors to reconcile");
            return Ok(self.report(run_id, target, started_at, Vec::new()));
        }

        self.provider.verify_target(target).await?;

        let deadline = self.config.run_timeout.map(|timeout| Instant::now() + timeout);
        let results: Vec<InvitationResult> = stream::iter(contributors.iter())
            .map(|login| self.resolve_before(deadline, login, target, exclusions))
            .buffered(self.config.concurrency.max(1))
            .collect()
            .await;

        let report = self.report(run_id, target, started_at, results);
        info!(summary = ?report.summary(), "Reconciliation finished");
        Ok(report)
    }

    fn report(
        &self,
        run_id: ReconciliationRunId,
        target: &InvitationTarget,
        started_at: Timestamp,
        results: Vec<InvitationResult>,
    ) -> ReconciliationReport {
        ReconciliationReport {
            run_id,
            target: target.clone(),
            dry_run: self.config.dry_run,
            started_at,
            finished_at: Timestamp::now(),
            results,
        }
    }

    async fn resolve_before(
        &self,
        deadline: Option<Instant>,
        login: &Login,
        target: &InvitationTarget,
        exclusions: &ExclusionPolicy,
    ) -> InvitationResult {
        let mutations = AtomicU32::new(0);
        let result = if let Some(reason) = exclusions.classify(login) {
            finished(login, InvitationOutcome::Excluded { reason }, 0)
        } else if let Some(deadline) = deadline {
            if Instant::now() >= deadline {
                deadline_exceeded(login, 0)
            } else {
                tokio::time::timeout_at(deadline, self.resolve(login, target, &mutations))
                    .await
                    .unwrap_or_else(|_| deadline_exceeded(login, mutations.load(Ordering::Relaxed)))
            }
        } else {
            self.resolve(login, target, &mutations).await
        };

        match &result.outcome {
            InvitationOutcome::Failed { reason, message } => {
                warn!(%login, %reason, %message, attempts = result.attempts, "Contributor not invited");
            }
            outcome => {
                info!(%login, outcome = outcome.label(), attempts = result.attempts, "Contributor reconciled");
            }
        }
        result
    }

    /// Membership read followed by at most one mutating call.
    ///
    /// `mutations` counts mutating calls as they are issued, so a caller that
    /// cancels this future still knows whether one was sent.
    async fn resolve(
        &self,
        login: &Login,
        target: &InvitationTarget,
        mutations: &AtomicU32,
    ) -> InvitationResult {
        let status = match self.membership(login, target).await {
            Ok(status) => status,
            Err(error) => return failed(login, &error, 0),
        };
        debug!(%login, ?status, "Membership read");

        let Some(action) = status.required_action() else {
            return finished(login, InvitationOutcome::AlreadyMember, 0);
        };

        if self.config.dry_run {
            return finished(login, InvitationOutcome::WouldInvite { action }, 0);
        }

        let Attempted { result, attempts } = match action {
            InviteAction::OrganizationInvite => {
                with_retry(&self.config.retry, "invite_to_org", login, || {
                    mutations.fetch_add(1, Ordering::Relaxed);
                    self.provider.invite_to_org(target, login)
                })
                .await
            }
            InviteAction::TeamAdd => {
                let Some(team) = target.team.as_ref() else {
                    return finished(login, InvitationOutcome::AlreadyMember, 0);
                };
                with_retry(&self.config.retry, "add_to_team", login, || {
                    mutations.fetch_add(1, Ordering::Relaxed);
                    self.provider.add_to_team(&target.organization, team, login)
                })
                .await
            }
        };

        match result {
            Ok(()) => finished(login, InvitationOutcome::Invited { action }, attempts),
            Err(error) => failed(login, &error, attempts),
        }
    }

    async fn membership(
        &self,
        login: &Login,
        target: &InvitationTarget,
    ) -> Result<MembershipStatus, ProviderError> {
        let org_member = with_retry(&self.config.retry, "is_org_member", login, || {
            self.provider.is_org_member(&target.organization, login)
        })
        .await
        .result?;

        let team_member = match (&target.team, org_member) {
            (Some(team), true) => Some(
                with_retry(&self.config.retry, "is_team_member", login, || {
                    self.provider
                        .is_team_member(&target.organization, team, login)
                })
                .await
                .result?,
            ),
            _ => None,
        };

        Ok(MembershipStatus {
            org_member,
            team_member,
        })
    }
}

fn finished(login: &Login, outcome: InvitationOutcome, attempts: u32) -> InvitationResult {
    InvitationResult {
        login: login.clone(),
        outcome,
        attempts,
    }
}

/// `attempts` is the number of mutating calls already issued when the
/// deadline hit; a non-zero value means the last one may have taken effect.
fn deadline_exceeded(login: &Login, attempts: u32) -> InvitationResult {
    let message = if attempts == 0 {
        "run deadline exceeded before the contributor was resolved"
    } else {
        "run deadline exceeded while an invitation was in flight; it may have been applied"
    };
    finished(
        login,
        InvitationOutcome::Failed {
            reason: FailureReason::Transient,
            message: message.to_string(),
        },
        attempts,
    )
}

fn failed(login: &Login, error: &ProviderError, attempts: u32) -> InvitationResult {
    finished(
        login,
        InvitationOutcome::Failed {
            reason: error.failure_reason(),
            message: error.message.clone(),
        },
        attempts,
    )
}
