//! Operator-facing report text.

use crate::inspector::{ContainerReservation, ReservationSource};
use crate::policy::{Candidate, Classification, PolicyOutcome};
use crate::reconciler::{CandidateAction, RunSummary};
use crate::rollout::Verification;
use std::fmt;

/// Separator printed after every block.
pub const RULE: &str = "----------------------------------------";

fn source_label(source: ReservationSource) -> &'static str {
    match source {
        ReservationSource::Limit => "limit",
        ReservationSource::Request => "request",
    }
}

fn write_header(f: &mut fmt::Formatter<'_>, r: &ContainerReservation) -> fmt::Result {
    writeln!(f, "Pod: {} (Namespace: {}, Container: {})", r.pod, r.namespace, r.container)
}

fn write_candidate(f: &mut fmt::Formatter<'_>, candidate: &Candidate) -> fmt::Result {
    let r = &candidate.reservation;
    write_header(f, r)?;
    writeln!(f, "Current CPU {}: {}", source_label(r.source), r.reservation)?;
    match candidate.classification {
        Classification::Actionable => writeln!(f, "Suggested CPU request: {}", candidate.proposed)?,
        Classification::Exempt => writeln!(f, "Managed externally. Will not adjust CPU request.")?,
        Classification::NoOp => match (r.source, r.request) {
            (ReservationSource::Limit, Some(request)) => {
                writeln!(f, "CPU limit above threshold, request already at {}", request)?
            }
            _ => writeln!(f, "Already at or below the suggested {}", candidate.proposed)?,
        },
    }
    writeln!(f, "{}", RULE)
}

fn write_section<'a>(
    f: &mut fmt::Formatter<'_>,
    title: &str,
    candidates: impl Iterator<Item = &'a Candidate>,
) -> fmt::Result {
    let mut candidates = candidates.peekable();
    if candidates.peek().is_none() {
        return Ok(());
    }
    writeln!(f, "{}", title)?;
    for candidate in candidates {
        write_candidate(f, candidate)?;
    }
    writeln!(f)
}

/// Dry-run report: what would change, what is exempt, what is already at target.
pub struct PlanReport<'a>(pub &'a PolicyOutcome);

impl fmt::Display for PlanReport<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let outcome = self.0;
        write_section(f, "The following pods have high CPU requests and need changes:", outcome.actionable())?;
        write_section(f, "Exempt (managed externally), will not be changed:", outcome.exempt())?;
        write_section(f, "Already at the suggested value:", outcome.no_ops())?;
        writeln!(
            f,
            "{} to change, {} exempt, {} already at target, {} below threshold",
            outcome.actionable().count(),
            outcome.exempt().count(),
            outcome.no_ops().count(),
            outcome.below_threshold
        )
    }
}

/// Post-change reservations as observed after the grace period.
pub struct VerificationReport<'a>(pub &'a Verification);

impl fmt::Display for VerificationReport<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let verification = self.0;
        writeln!(f, "Updated list of pods and their CPU requests:")?;
        for candidate in &verification.outcome.candidates {
            let r = &candidate.reservation;
            write_header(f, r)?;
            writeln!(f, "Updated CPU {}: {}", source_label(r.source), r.reservation)?;
            writeln!(f, "{}", RULE)?;
        }
        match verification.remaining_actionable() {
            0 => writeln!(f, "All changed containers are at or below target."),
            n => writeln!(
                f,
                "{} containers still show their old value after {} check(s); their pods may not have restarted yet.",
                n, verification.attempts
            ),
        }
    }
}

/// Final tally of a run that applied changes.
pub struct SummaryReport<'a>(pub &'a RunSummary);

impl fmt::Display for SummaryReport<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let summary = self.0;
        writeln!(f, "Summary:")?;
        for record in &summary.records {
            let r = &record.candidate.reservation;
            write!(f, "  {}/{} [{}]: ", r.namespace, r.pod, r.container)?;
            match &record.action {
                CandidateAction::Mutated { workload, outcome } => {
                    writeln!(f, "{} -> {} ({:?})", workload, record.candidate.proposed, outcome)?
                }
                CandidateAction::InstanceRestart { reason } => writeln!(f, "pod restart only ({})", reason)?,
                CandidateAction::Failed { error } => writeln!(f, "FAILED: {}", error)?,
            }
        }
        writeln!(
            f,
            "{} workloads restarted, {} pods deleted, {} failures",
            summary.restarted.len(),
            summary.terminated.len(),
            summary.failure_count()
        )?;
        for (target, error) in &summary.trigger_failures {
            writeln!(f, "  rollout of {} failed: {}", target, error)?;
        }
        if let Some(error) = &summary.verification_error {
            writeln!(f, "Verification skipped: {}", error)?;
        }
        Ok(())
    }
}
