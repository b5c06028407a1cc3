//! One rightsizing pass.
//!
//! Scan, classify, report, confirm, then for every actionable candidate
//! resolve its owner and either edit the owning Deployment or fall back to
//! restarting the pod. Rollouts are issued once per workload after all edits,
//! followed by a verification scan.

use crate::config::Config;
use crate::error::RightsizerError;
use crate::inspector;
use crate::mutator::{self, MutationOutcome};
use crate::ownership::{self, OwnershipResolution, WorkloadRef};
use crate::policy::{Candidate, PolicyOutcome};
use crate::prompt;
use crate::report::{PlanReport, SummaryReport, VerificationReport};
use crate::rollout;
use chrono::Utc;
use cluster_client::{ClusterClientTrait, object_ref};
use std::io::{BufRead, Write};
use tracing::{error, info, warn};

/// What happened to one actionable candidate.
#[derive(Debug, Clone, PartialEq)]
pub enum CandidateAction {
    /// The owning workload's template was edited (or already matched).
    Mutated {
        workload: WorkloadRef,
        outcome: MutationOutcome,
    },
    /// No editable owner; the pod is deleted instead.
    InstanceRestart { reason: String },
    /// The edit failed; nothing else was attempted for this candidate.
    Failed { error: String },
}

#[derive(Debug, Clone, PartialEq)]
pub struct CandidateRecord {
    pub candidate: Candidate,
    pub action: CandidateAction,
}

/// Everything a confirmed run did.
#[derive(Debug, Clone, Default)]
pub struct RunSummary {
    pub records: Vec<CandidateRecord>,
    /// Workloads whose rollout was triggered.
    pub restarted: Vec<WorkloadRef>,
    /// Pods deleted, as (namespace, name).
    pub terminated: Vec<(String, String)>,
    /// Rollout triggers that failed, as (target, error).
    pub trigger_failures: Vec<(String, String)>,
    pub verification_error: Option<String>,
}

impl RunSummary {
    pub fn failure_count(&self) -> usize {
        let failed = self
            .records
            .iter()
            .filter(|r| matches!(r.action, CandidateAction::Failed { .. }))
            .count();
        failed + self.trigger_failures.len()
    }
}

/// How a run ended.
#[derive(Debug)]
pub enum RunStatus {
    NothingToDo,
    Declined,
    Completed(RunSummary),
}

/// Runs a rightsizing pass against a cluster.
pub struct Reconciler {
    client: Box<dyn ClusterClientTrait>,
    config: Config,
}

impl Reconciler {
    pub fn new(client: impl ClusterClientTrait + 'static, config: Config) -> Self {
        Self {
            client: Box::new(client),
            config,
        }
    }

    /// Scan the cluster and classify every reservation. A failed scan ends the run.
    pub async fn plan(&self) -> Result<PolicyOutcome, RightsizerError> {
        let reservations = inspector::scan(self.client.as_ref()).await?;
        Ok(self.config.policy.classify(reservations))
    }

    /// Apply every actionable candidate, then trigger rollouts.
    ///
    /// Individual failures are logged and recorded; they never stop the pass.
    pub async fn apply(&self, outcome: &PolicyOutcome) -> RunSummary {
        let client = self.client.as_ref();
        let mut summary = RunSummary::default();
        let mut restarts: Vec<WorkloadRef> = Vec::new();
        let mut terminations: Vec<(String, String)> = Vec::new();

        for candidate in outcome.actionable() {
            let r = &candidate.reservation;
            let action = match ownership::resolve(client, &r.namespace, &r.pod).await {
                OwnershipResolution::Workload(workload) => {
                    match mutator::apply_reservation(
                        client,
                        &workload,
                        &r.container,
                        candidate.proposed,
                        self.config.conflict_retries,
                    )
                    .await
                    {
                        Ok(mutation) => {
                            if mutation != MutationOutcome::ContainerNotFound && !restarts.contains(&workload) {
                                restarts.push(workload.clone());
                            }
                            CandidateAction::Mutated {
                                workload,
                                outcome: mutation,
                            }
                        }
                        Err(e) => {
                            error!("{}", e);
                            CandidateAction::Failed { error: e.to_string() }
                        }
                    }
                }
                OwnershipResolution::InstanceOnly { reason } => {
                    info!("Pod {}/{} will be restarted directly: {}", r.namespace, r.pod, reason);
                    let key = (r.namespace.clone(), r.pod.clone());
                    if !terminations.contains(&key) {
                        terminations.push(key);
                    }
                    CandidateAction::InstanceRestart { reason }
                }
            };
            summary.records.push(CandidateRecord {
                candidate: candidate.clone(),
                action,
            });
        }

        let now = Utc::now();
        for workload in restarts {
            match rollout::restart_workload(client, &workload, now).await {
                Ok(()) => summary.restarted.push(workload),
                Err(e) => {
                    error!("{}", e);
                    summary.trigger_failures.push((workload.to_string(), e.to_string()));
                }
            }
        }
        for (namespace, pod) in terminations {
            match rollout::terminate_instance(client, &namespace, &pod).await {
                Ok(()) => summary.terminated.push((namespace, pod)),
                Err(e) => {
                    error!("{}", e);
                    summary
                        .trigger_failures
                        .push((object_ref("Pod", &namespace, &pod), e.to_string()));
                }
            }
        }

        summary
    }

    /// Full interactive pass: report, confirm on `input`/`output`, apply, verify.
    pub async fn run<R: BufRead, W: Write>(&self, input: &mut R, output: &mut W) -> Result<RunStatus, RightsizerError> {
        let outcome = self.plan().await?;
        write!(output, "{}", PlanReport(&outcome))?;

        if !outcome.has_actions() {
            writeln!(output, "No changes needed.")?;
            return Ok(RunStatus::NothingToDo);
        }

        if self.config.assume_yes {
            info!("Confirmation skipped, applying changes");
        } else if !prompt::confirm(input, output, "Proceed with these changes?")? {
            writeln!(output, "No changes made.")?;
            return Ok(RunStatus::Declined);
        }

        let mut summary = self.apply(&outcome).await;

        match rollout::verify(self.client.as_ref(), &self.config.policy, self.config.verify).await {
            Ok(verification) => write!(output, "{}", VerificationReport(&verification))?,
            Err(e) => {
                warn!("Verification scan failed: {}", e);
                summary.verification_error = Some(e.to_string());
            }
        }

        write!(output, "{}", SummaryReport(&summary))?;
        Ok(RunStatus::Completed(summary))
    }
}

#[cfg(test)]
#[path = "reconciler_test.rs"]
mod tests;
