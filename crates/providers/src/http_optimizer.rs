//! HTTP client for a remote assignment-optimization service.
//!
//! Speaks a small JSON contract: POST `{base_url}/recommend` with the task
//! and roster, get back a [`Recommendation`]. Anything that does not parse
//! into that shape — or names a candidate outside the roster — is a
//! malformed response, never data flowing inward.

use async_trait::async_trait;
use coverdesk_core::collaborator::{Optimizer, Recommendation};
use coverdesk_core::error::CollaboratorError;
use coverdesk_core::roster::Candidate;
use coverdesk_core::task::Task;
use serde::Serialize;
use tracing::{debug, warn};

/// A remote optimizer reached over HTTP.
pub struct HttpOptimizer {
    base_url: String,
    client: reqwest::Client,
}

#[derive(Serialize)]
struct RecommendRequest<'a> {
    task: &'a Task,
    roster: &'a [Candidate],
}

impl HttpOptimizer {
    pub fn new(base_url: impl Into<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client,
        }
    }

    fn unavailable(&self, reason: impl Into<String>) -> CollaboratorError {
        CollaboratorError::Unavailable {
            collaborator: self.name().to_string(),
            reason: reason.into(),
        }
    }

    fn malformed(&self, reason: impl Into<String>) -> CollaboratorError {
        CollaboratorError::MalformedResponse {
            collaborator: self.name().to_string(),
            reason: reason.into(),
        }
    }

    /// Reject recommendations that name people outside the roster.
    fn validate(
        &self,
        recommendation: Recommendation,
        roster: &[Candidate],
    ) -> Result<Recommendation, CollaboratorError> {
        let known = |name: &str| roster.iter().any(|c| c.name == name);

        if let Some(primary) = &recommendation.primary
            && !known(&primary.candidate)
        {
            return Err(self.malformed(format!(
                "primary candidate '{}' is not on the roster",
                primary.candidate
            )));
        }
        if let Some(alt) = recommendation
            .alternates
            .iter()
            .find(|a| !known(&a.candidate))
        {
            return Err(self.malformed(format!(
                "alternate candidate '{}' is not on the roster",
                alt.candidate
            )));
        }

        Ok(recommendation)
    }
}

#[async_trait]
impl Optimizer for HttpOptimizer {
    fn name(&self) -> &str {
        "http-optimizer"
    }

    async fn recommend(
        &self,
        task: &Task,
        roster: &[Candidate],
    ) -> Result<Recommendation, CollaboratorError> {
        let url = format!("{}/recommend", self.base_url);

        debug!(task_id = %task.id, candidates = roster.len(), "Requesting remote recommendation");

        let response = self
            .client
            .post(&url)
            .json(&RecommendRequest { task, roster })
            .send()
            .await
            .map_err(|e| self.unavailable(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(status = status.as_u16(), body = %body, "Optimizer returned error");
            return Err(self.unavailable(format!("HTTP {status}: {body}")));
        }

        let recommendation: Recommendation = response
            .json()
            .await
            .map_err(|e| self.malformed(format!("failed to parse recommendation: {e}")))?;

        self.validate(recommendation, roster)
    }
}
