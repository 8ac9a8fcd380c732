//! Built-in assignment optimizer — weighted candidate scoring.
//!
//! Implements the `Optimizer` collaborator trait locally, so a deployment
//! without a remote optimization service still produces ranked
//! recommendations. Scoring combines three components:
//!
//! - **Skill match** (weight 0.6): ratio of required capabilities held,
//!   plus a small versatility bonus and experience modifier.
//! - **Workload** (weight 0.3): remaining capacity after the task, banded
//!   by projected utilization.
//! - **Availability** (weight 0.1): available > busy > out of office.
//!
//! Hard constraints run first: candidates on vacation or out of office are
//! ineligible, as is anyone holding none of the required capabilities or on
//! the exclusion list. When nobody clears the constraints the solver
//! returns a recommendation with no primary — fabricating an assignment is
//! the orchestrator's job to avoid, and it starts here.

use async_trait::async_trait;
use coverdesk_core::collaborator::{Optimizer, RankedChoice, Recommendation};
use coverdesk_core::error::CollaboratorError;
use coverdesk_core::roster::{Availability, Candidate};
use coverdesk_core::task::Task;
use tracing::debug;

const SKILL_WEIGHT: f64 = 0.6;
const WORKLOAD_WEIGHT: f64 = 0.3;
const AVAILABILITY_WEIGHT: f64 = 0.1;

/// Minimum combined score for a candidate to appear as an alternate.
const VIABLE_THRESHOLD: f64 = 0.3;

/// How many alternates to report alongside the primary.
const MAX_ALTERNATES: usize = 3;

/// The local weighted-scoring optimizer.
#[derive(Debug, Clone, Default)]
pub struct LocalSolver {
    /// Candidate names or addresses that must not be assigned.
    excluded: Vec<String>,
}

impl LocalSolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Exclude specific candidates (by name or address) from assignment.
    pub fn with_exclusions(mut self, excluded: Vec<String>) -> Self {
        self.excluded = excluded;
        self
    }

    // ── Score components ──────────────────────────────────────────────────

    /// Skill matching score in [0, 1].
    fn skill_match_score(task: &Task, candidate: &Candidate) -> f64 {
        let required: Vec<String> = task
            .required_capabilities
            .iter()
            .map(|s| s.to_lowercase())
            .collect();
        let held: Vec<String> = candidate
            .capabilities
            .iter()
            .map(|s| s.to_lowercase())
            .collect();

        if required.is_empty() {
            return 0.7; // Neutral score for tasks with no specific requirements
        }
        if held.is_empty() {
            return 0.1;
        }

        let matches = required.iter().filter(|r| held.contains(r)).count();
        if matches == 0 {
            return 0.2; // Some potential for learning
        }

        let match_ratio = matches as f64 / required.len() as f64;
        let additional = held.iter().filter(|h| !required.contains(h)).count();
        let versatility_bonus = (additional as f64 * 0.05).min(0.2);
        let experience_modifier = (1.0 + held.len() as f64 * 0.02).min(1.2);

        ((match_ratio + versatility_bonus) * experience_modifier).min(1.0)
    }

    /// Workload impact score in [0, 1]; higher means more spare capacity.
    fn workload_score(task: &Task, candidate: &Candidate) -> f64 {
        let available = candidate.max_hours - candidate.current_load;
        if available <= 0.0 {
            return 0.0;
        }
        if task.estimated_hours > available {
            // Can partially handle but will be overloaded.
            return 0.3 * (available / task.estimated_hours);
        }

        let utilization_after = (candidate.current_load + task.estimated_hours) / candidate.max_hours;
        if utilization_after <= 0.7 {
            1.0
        } else if utilization_after <= 0.85 {
            0.8
        } else if utilization_after <= 1.0 {
            0.5
        } else {
            0.2
        }
    }

    fn availability_score(candidate: &Candidate) -> f64 {
        match candidate.availability {
            Availability::Available => 1.0,
            Availability::Busy => 0.3,
            Availability::OutOfOffice | Availability::Vacation => 0.0,
        }
    }

    fn combined_score(task: &Task, candidate: &Candidate) -> f64 {
        Self::skill_match_score(task, candidate) * SKILL_WEIGHT
            + Self::workload_score(task, candidate) * WORKLOAD_WEIGHT
            + Self::availability_score(candidate) * AVAILABILITY_WEIGHT
    }

    // ── Constraints ───────────────────────────────────────────────────────

    fn is_eligible(&self, task: &Task, candidate: &Candidate) -> bool {
        if !candidate.availability.is_assignable() {
            return false;
        }
        if self.excluded.contains(&candidate.name) || self.excluded.contains(&candidate.address) {
            return false;
        }
        candidate.covers_any(&task.required_capabilities)
    }

    // ── Rationale ─────────────────────────────────────────────────────────

    fn rationale(task: &Task, candidate: &Candidate) -> String {
        let skill = Self::skill_match_score(task, candidate);
        let workload = Self::workload_score(task, candidate);
        let mut reasons: Vec<&str> = Vec::new();

        if skill > 0.8 {
            reasons.push("excellent skill match");
        } else if skill > 0.6 {
            reasons.push("good skill match");
        } else if skill > 0.4 {
            reasons.push("adequate skills");
        } else {
            reasons.push("can learn required skills");
        }

        if workload > 0.8 {
            reasons.push("low current workload");
        } else if workload > 0.5 {
            reasons.push("manageable workload");
        } else if workload > 0.3 {
            reasons.push("busy but can accommodate");
        } else {
            reasons.push("high workload");
        }

        match candidate.availability {
            Availability::Available => reasons.push("currently available"),
            Availability::Busy => reasons.push("somewhat busy"),
            _ => {}
        }

        reasons[..reasons.len().min(3)].join(", ")
    }
}

#[async_trait]
impl Optimizer for LocalSolver {
    fn name(&self) -> &str {
        "local"
    }

    async fn recommend(
        &self,
        task: &Task,
        roster: &[Candidate],
    ) -> Result<Recommendation, CollaboratorError> {
        if roster.is_empty() {
            return Ok(Recommendation {
                primary: None,
                alternates: Vec::new(),
            });
        }

        // Score everyone; eligibility decides who can actually be chosen.
        let mut scored: Vec<(&Candidate, f64, bool)> = roster
            .iter()
            .map(|c| {
                (
                    c,
                    Self::combined_score(task, c),
                    self.is_eligible(task, c),
                )
            })
            .collect();

        // Priority scales the objective uniformly; it keeps integer
        // objective values comparable across tasks when logged.
        let weight = task.priority.weight();
        scored.sort_by(|a, b| {
            let oa = (a.1 * 1000.0) as i64 * weight as i64;
            let ob = (b.1 * 1000.0) as i64 * weight as i64;
            ob.cmp(&oa)
        });

        let primary = scored
            .iter()
            .find(|(_, _, eligible)| *eligible)
            .map(|(c, score, _)| RankedChoice {
                candidate: c.name.clone(),
                confidence: *score,
                rationale: Self::rationale(task, c),
            });

        let alternates: Vec<RankedChoice> = match &primary {
            Some(p) => scored
                .iter()
                .filter(|(c, score, eligible)| {
                    *eligible && c.name != p.candidate && *score > VIABLE_THRESHOLD
                })
                .take(MAX_ALTERNATES)
                .map(|(c, score, _)| RankedChoice {
                    candidate: c.name.clone(),
                    confidence: *score,
                    rationale: Self::rationale(task, c),
                })
                .collect(),
            None => Vec::new(),
        };

        debug!(
            task_id = %task.id,
            candidates = roster.len(),
            viable = scored.iter().filter(|(_, s, e)| *e && *s > VIABLE_THRESHOLD).count(),
            chose = primary.as_ref().map(|p| p.candidate.as_str()).unwrap_or("nobody"),
            "Solver ranked roster"
        );

        Ok(Recommendation { primary, alternates })
    }
}
