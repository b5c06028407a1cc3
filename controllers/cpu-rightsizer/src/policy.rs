//! Rightsizing policy.
//!
//! Decides per container whether its reservation should change, to what, and
//! whether the owning pod is exempt.

use crate::inspector::ContainerReservation;
use crate::quantity::Millicores;
use std::cmp;

/// Default label key that marks a pod as managed by the MMC.AI platform.
pub const DEFAULT_MANAGED_BY_LABEL: &str = "mmc.ai/project";
/// Default retention threshold.
pub const DEFAULT_THRESHOLD: Millicores = Millicores(100);
/// Default fixed target.
pub const DEFAULT_TARGET: Millicores = Millicores(50);

/// How a new reservation is computed from the current one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReductionRule {
    /// Always propose the same value.
    Fixed(Millicores),
    /// Propose `current / divisor`, never below `floor`.
    Proportional { divisor: u64, floor: Millicores },
}

impl ReductionRule {
    /// Proportional rule with divisor 10 and a 20m floor.
    pub const PROPORTIONAL_DEFAULT: ReductionRule = ReductionRule::Proportional {
        divisor: 10,
        floor: Millicores(20),
    };

    pub fn propose(&self, current: Millicores) -> Millicores {
        match *self {
            ReductionRule::Fixed(target) => target,
            ReductionRule::Proportional { divisor, floor } => {
                cmp::max(Millicores(current.get() / divisor.max(1)), floor)
            }
        }
    }
}

impl Default for ReductionRule {
    fn default() -> Self {
        ReductionRule::Fixed(DEFAULT_TARGET)
    }
}

/// Policy verdict for one candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    /// Pod carries the managed-by marker; reported, never changed.
    Exempt,
    /// The proposal would not lower the declared request.
    NoOp,
    /// Will be changed once confirmed.
    Actionable,
}

/// A reservation at or above the threshold, with the policy's verdict.
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    pub reservation: ContainerReservation,
    pub proposed: Millicores,
    pub classification: Classification,
}

impl Candidate {
    pub fn is_actionable(&self) -> bool {
        self.classification == Classification::Actionable
    }
}

/// Result of classifying a scan.
#[derive(Debug, Clone, Default)]
pub struct PolicyOutcome {
    /// Candidates in scan order (largest reservation first).
    pub candidates: Vec<Candidate>,
    /// Containers dropped for being under the threshold.
    pub below_threshold: usize,
}

impl PolicyOutcome {
    pub fn actionable(&self) -> impl Iterator<Item = &Candidate> {
        self.by_class(Classification::Actionable)
    }

    pub fn exempt(&self) -> impl Iterator<Item = &Candidate> {
        self.by_class(Classification::Exempt)
    }

    pub fn no_ops(&self) -> impl Iterator<Item = &Candidate> {
        self.by_class(Classification::NoOp)
    }

    pub fn has_actions(&self) -> bool {
        self.actionable().next().is_some()
    }

    fn by_class(&self, class: Classification) -> impl Iterator<Item = &Candidate> {
        self.candidates.iter().filter(move |c| c.classification == class)
    }
}

/// Threshold, reduction rule and exemption marker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PolicyEngine {
    pub threshold: Millicores,
    pub rule: ReductionRule,
    pub managed_by_label: String,
}

impl Default for PolicyEngine {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_THRESHOLD,
            rule: ReductionRule::default(),
            managed_by_label: DEFAULT_MANAGED_BY_LABEL.to_string(),
        }
    }
}

impl PolicyEngine {
    /// Classify one reservation, or `None` when it is under the threshold.
    pub fn evaluate(&self, reservation: ContainerReservation) -> Option<Candidate> {
        if reservation.reservation < self.threshold {
            return None;
        }
        let proposed = self.rule.propose(reservation.reservation);
        // Only the request is ever rewritten; a limit-sourced figure stays put
        let written = reservation.request.unwrap_or(reservation.reservation);
        let classification = if reservation.labels.contains_key(&self.managed_by_label) {
            Classification::Exempt
        } else if proposed >= written {
            Classification::NoOp
        } else {
            Classification::Actionable
        };
        Some(Candidate {
            reservation,
            proposed,
            classification,
        })
    }

    /// Classify a whole scan, preserving its order.
    pub fn classify(&self, reservations: Vec<ContainerReservation>) -> PolicyOutcome {
        let total = reservations.len();
        let candidates: Vec<Candidate> = reservations
            .into_iter()
            .filter_map(|r| self.evaluate(r))
            .collect();
        PolicyOutcome {
            below_threshold: total - candidates.len(),
            candidates,
        }
    }
}
