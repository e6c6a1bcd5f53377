//! Human-readable rendering of a [`ReconciliationReport`].

use std::fmt::Write as _;

use clap::ValueEnum;
use membership::{ExclusionReason, InvitationOutcome, InvitationResult, ReconciliationReport};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ReportFormat {
    Text,
    Json,
}

pub fn render(report: &ReconciliationReport, format: ReportFormat) -> Result<String, serde_json::Error> {
    match format {
        ReportFormat::Text => Ok(render_text(report)),
        ReportFormat::Json => report.to_json_pretty(),
    }
}

fn render_text(report: &ReconciliationReport) -> String {
    let mut out = String::new();
    let target = match &report.target.team {
        Some(team) => format!("{}/{}", report.target.organization, team),
        None => report.target.organization.to_string(),
    };
    let mode = if report.dry_run { " (dry run)" } else { "" };
    let _ = writeln!(out, "Contributor invitations for {target}{mode}");

    for result in &report.results {
        let handle = format!("@{}", result.login);
        let _ = writeln!(out, "  {handle:<25} {}", describe(result));
    }

    let summary = report
        .summary()
        .into_iter()
        .map(|(label, count)| format!("{label}={count}"))
        .collect::<Vec<_>>()
        .join(" ");
    if summary.is_empty() {
        let _ = writeln!(out, "No contributors to invite");
    } else {
        let _ = writeln!(out, "Summary: {summary}");
    }
    out
}

fn describe(result: &InvitationResult) -> String {
    match &result.outcome {
        InvitationOutcome::AlreadyMember => "already a member".to_string(),
        InvitationOutcome::Excluded { reason } => match reason {
            ExclusionReason::Listed => "excluded (listed)".to_string(),
            ExclusionReason::Bot => "excluded (bot)".to_string(),
        },
        InvitationOutcome::Invited { action } => {
            format!("invited ({action}, {} attempt(s))", result.attempts)
        }
        InvitationOutcome::WouldInvite { action } => format!("would invite ({action})"),
        InvitationOutcome::Failed { reason, message } => {
            format!("failed: {reason} after {} attempt(s): {message}", result.attempts)
        }
    }
}

#[cfg(test)]
mod tests {
    use membership::{
        FailureReason, InvitationTarget, InviteAction, Login, OrganizationName,
        ReconciliationRunId, TeamSlug, Timestamp,
    };

    use super::*;

    fn result(name: &str, outcome: InvitationOutcome, attempts: u32) -> InvitationResult {
        InvitationResult {
            login: Login::new(name).unwrap(),
            outcome,
            attempts,
        }
    }

    fn report(results: Vec<InvitationResult>) -> ReconciliationReport {
        ReconciliationReport {
            run_id: ReconciliationRunId::new_random(),
            target: InvitationTarget::new(OrganizationName::new("acme").unwrap())
                .with_team(TeamSlug::new("contributors").unwrap()),
            dry_run: false,
            started_at: Timestamp::now(),
            finished_at: Timestamp::now(),
            results,
        }
    }

    #[test]
    fn text_lists_every_contributor_and_summary() {
        let report = report(vec![
            result("alice", InvitationOutcome::AlreadyMember, 0),
            result(
                "carol",
                InvitationOutcome::Invited {
                    action: InviteAction::OrganizationInvite,
                },
                1,
            ),
            result(
                "dave",
                InvitationOutcome::Failed {
                    reason: FailureReason::RateLimited,
                    message: "secondary rate limit".into(),
                },
                3,
            ),
        ]);

        let text = render(&report, ReportFormat::Text).unwrap();
        assert!(text.starts_with("Contributor invitations for acme/contributors\n"));
        assert!(text.contains("@alice"));
        assert!(text.contains("invited (organization invite, 1 attempt(s))"));
        assert!(text.contains("failed: rate-limited after 3 attempt(s): secondary rate limit"));
        assert!(text.ends_with("Summary: already_member=1 failed=1 invited=1\n"));
    }

    #[test]
    fn empty_report_says_so() {
        let text = render(&report(Vec::new()), ReportFormat::Text).unwrap();
        assert!(text.contains("No contributors to invite"));
    }

    #[test]
    fn json_flattens_outcome() {
        let report = report(vec![result(
            "bob",
            InvitationOutcome::Excluded {
                reason: ExclusionReason::Listed,
            },
            0,
        )]);

        let json: serde_json::Value =
            serde_json::from_str(&render(&report, ReportFormat::Json).unwrap()).unwrap();
        assert_eq!(json["results"][0]["login"], "bob");
        assert_eq!(json["results"][0]["outcome"], "excluded");
        assert_eq!(json["results"][0]["reason"], "listed");
    }
}
