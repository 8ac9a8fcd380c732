//! Roster types — the candidate pool the optimizer picks from.
//!
//! Roster rows are owned by an external collaborator (typically a
//! spreadsheet); the core reads them through the [`RosterSource`] trait and
//! never writes them back.

use crate::error::CollaboratorError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Candidate availability as reported by the roster.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Availability {
    #[default]
    Available,
    Busy,
    OutOfOffice,
    Vacation,
}

impl Availability {
    /// Whether the candidate can be assigned at all. Out-of-office and
    /// vacation are hard exclusions.
    pub fn is_assignable(self) -> bool {
        matches!(self, Availability::Available | Availability::Busy)
    }
}

/// One roster entry. Read-only to the core.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Candidate {
    /// Display name, used as the assignee identifier
    pub name: String,

    /// Contact address for notifications
    pub address: String,

    /// Capabilities this candidate holds
    #[serde(default)]
    pub capabilities: Vec<String>,

    /// Hours already committed this period
    #[serde(default)]
    pub current_load: f64,

    /// Capacity in hours per period
    #[serde(default = "default_max_hours")]
    pub max_hours: f64,

    /// Availability flag
    #[serde(default)]
    pub availability: Availability,
}

fn default_max_hours() -> f64 {
    40.0
}

impl Candidate {
    /// Whether this candidate holds at least one of the required
    /// capabilities. Comparison is case-insensitive. An empty requirement
    /// set matches everyone.
    pub fn covers_any(&self, required: &[String]) -> bool {
        if required.is_empty() {
            return true;
        }
        let held: Vec<String> = self.capabilities.iter().map(|c| c.to_lowercase()).collect();
        required.iter().any(|r| held.contains(&r.to_lowercase()))
    }
}

/// The roster collaborator boundary. Implementations fetch the current
/// candidate snapshot; failures surface as [`CollaboratorError`].
#[async_trait]
pub trait RosterSource: Send + Sync {
    /// Human-readable source name (e.g., "sheet", "static").
    fn name(&self) -> &str;

    /// Fetch the current roster snapshot.
    async fn roster(&self) -> Result<Vec<Candidate>, CollaboratorError>;
}

/// A fixed roster, for tests and single-file deployments.
pub struct StaticRoster {
    candidates: Vec<Candidate>,
}

impl StaticRoster {
    pub fn new(candidates: Vec<Candidate>) -> Self {
        Self { candidates }
    }
}

#[async_trait]
impl RosterSource for StaticRoster {
    fn name(&self) -> &str {
        "static"
    }

    async fn roster(&self) -> Result<Vec<Candidate>, CollaboratorError> {
        Ok(self.candidates.clone())
    }
}
