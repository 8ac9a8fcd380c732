//! Text-generation collaborators: a deterministic template renderer and an
//! LLM client speaking the OpenAI-compatible chat completions contract.
//!
//! The template generator is the default. It never fails, never needs a
//! network, and produces the same text for the same inputs, which keeps
//! replayed deliveries byte-identical. The LLM generator is opt-in and its
//! output is validated at the boundary: the reply must be a JSON object
//! with the agreed fields, and a named assignee must come from the roster.

use async_trait::async_trait;
use coverdesk_core::collaborator::{Recommendation, RenderedDecision, TextGenerator};
use coverdesk_core::context::MemoryContext;
use coverdesk_core::error::CollaboratorError;
use coverdesk_core::roster::Candidate;
use coverdesk_core::task::Task;
use serde::Deserialize;
use tracing::{debug, warn};

// ── Template generator ────────────────────────────────────────────────────

/// Deterministic offline renderer. The default text generator, and the
/// test double everywhere else.
#[derive(Debug, Clone, Default)]
pub struct TemplateTextGenerator;

impl TemplateTextGenerator {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl TextGenerator for TemplateTextGenerator {
    fn name(&self) -> &str {
        "template"
    }

    async fn render(
        &self,
        _context: &MemoryContext,
        task: &Task,
        recommendation: &Recommendation,
        _roster: &[Candidate],
    ) -> Result<RenderedDecision, CollaboratorError> {
        let short = task.short_description();

        match &recommendation.primary {
            Some(primary) => {
                let mut body = format!(
                    "Hi {assignee},\n\n\
                     You have been assigned: {description}\n\
                     Requested by: {requester}\n\
                     Priority: {priority}\n",
                    assignee = primary.candidate,
                    description = task.description,
                    requester = task.requester,
                    priority = task.priority,
                );
                if let Some(deadline) = task.deadline {
                    body.push_str(&format!("Deadline: {}\n", deadline.to_rfc3339()));
                }
                body.push_str(&format!("\nWhy you: {}.\n", primary.rationale));
                if !recommendation.alternates.is_empty() {
                    let names: Vec<&str> = recommendation
                        .alternates
                        .iter()
                        .map(|a| a.candidate.as_str())
                        .collect();
                    body.push_str(&format!("Backup options: {}.\n", names.join(", ")));
                }

                Ok(RenderedDecision {
                    assignee: Some(primary.candidate.clone()),
                    rationale: primary.rationale.clone(),
                    notification_subject: format!("Coverage assigned: {short}"),
                    notification_body: body,
                })
            }
            None => Ok(RenderedDecision {
                assignee: None,
                rationale: "No roster candidate meets the requirements right now".into(),
                notification_subject: format!("Unable to assign: {short}"),
                notification_body: format!(
                    "Hi {requester},\n\n\
                     Nobody on the current roster can take this request:\n\
                     {description}\n\n\
                     Every candidate is either unavailable or lacks the required \
                     capabilities. The request stays open; it will be picked up \
                     when you resubmit or the roster changes.\n",
                    requester = task.requester,
                    description = task.description,
                ),
            }),
        }
    }
}

// ── LLM generator ─────────────────────────────────────────────────────────

/// Natural-language rendering via an OpenAI-compatible chat endpoint.
pub struct LlmTextGenerator {
    base_url: String,
    api_key: String,
    model: String,
    client: reqwest::Client,
}

/// The JSON object the model is instructed to reply with.
#[derive(Debug, Deserialize)]
struct LlmDecision {
    #[serde(default)]
    assignee: Option<String>,
    rationale: String,
    subject: String,
    body: String,
}

#[derive(Debug, Deserialize)]
struct ApiResponse {
    choices: Vec<ApiChoice>,
}

#[derive(Debug, Deserialize)]
struct ApiChoice {
    message: ApiMessage,
}

#[derive(Debug, Deserialize)]
struct ApiMessage {
    #[serde(default)]
    content: Option<String>,
}

impl LlmTextGenerator {
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        model: impl Into<String>,
    ) -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(120))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            model: model.into(),
            client,
        }
    }

    fn malformed(&self, reason: impl Into<String>) -> CollaboratorError {
        CollaboratorError::MalformedResponse {
            collaborator: self.name().to_string(),
            reason: reason.into(),
        }
    }

    fn build_prompt(
        context: &MemoryContext,
        task: &Task,
        recommendation: &Recommendation,
    ) -> String {
        let recommendation_json =
            serde_json::to_string_pretty(recommendation).unwrap_or_else(|_| "{}".into());
        format!(
            "{context}\n\n\
             [Current Request]\n\
             Description: {description}\n\
             Requester: {requester}\n\
             Priority: {priority}\n\n\
             [Optimizer Recommendation]\n\
             {recommendation_json}\n\n\
             Write the assignment decision. Reply with ONLY a JSON object:\n\
             {{\"assignee\": <name from the recommendation or null>, \
             \"rationale\": <one sentence>, \
             \"subject\": <notification subject>, \
             \"body\": <notification body>}}",
            context = context.render(),
            description = task.description,
            requester = task.requester,
            priority = task.priority,
        )
    }

    /// Models wrap JSON in markdown fences more often than not.
    fn strip_fences(content: &str) -> &str {
        let trimmed = content.trim();
        let trimmed = trimmed
            .strip_prefix("```json")
            .or_else(|| trimmed.strip_prefix("```"))
            .unwrap_or(trimmed);
        trimmed.strip_suffix("```").unwrap_or(trimmed).trim()
    }

    fn parse_reply(&self, content: &str) -> Result<LlmDecision, CollaboratorError> {
        serde_json::from_str(Self::strip_fences(content))
            .map_err(|e| self.malformed(format!("reply is not the agreed JSON shape: {e}")))
    }

    fn validate_assignee(
        &self,
        decision: &LlmDecision,
        roster: &[Candidate],
    ) -> Result<(), CollaboratorError> {
        if let Some(name) = &decision.assignee
            && !roster.iter().any(|c| &c.name == name)
        {
            return Err(self.malformed(format!("assignee '{name}' is not on the roster")));
        }
        Ok(())
    }
}

#[async_trait]
impl TextGenerator for LlmTextGenerator {
    fn name(&self) -> &str {
        "llm"
    }

    async fn render(
        &self,
        context: &MemoryContext,
        task: &Task,
        recommendation: &Recommendation,
        roster: &[Candidate],
    ) -> Result<RenderedDecision, CollaboratorError> {
        let url = format!("{}/chat/completions", self.base_url);
        let body = serde_json::json!({
            "model": self.model,
            "messages": [
                { "role": "system", "content": "You write concise, professional assignment notifications for a coverage coordinator." },
                { "role": "user", "content": Self::build_prompt(context, task, recommendation) },
            ],
            "temperature": 0.3,
            "stream": false,
        });

        debug!(model = %self.model, task_id = %task.id, "Rendering decision via LLM");

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| CollaboratorError::Unavailable {
                collaborator: self.name().to_string(),
                reason: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            warn!(status = status.as_u16(), body = %error_body, "Text generator returned error");
            return Err(CollaboratorError::Unavailable {
                collaborator: self.name().to_string(),
                reason: format!("HTTP {status}: {error_body}"),
            });
        }

        let api_response: ApiResponse = response
            .json()
            .await
            .map_err(|e| self.malformed(format!("failed to parse response: {e}")))?;

        let content = api_response
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| self.malformed("no content in response"))?;

        let decision = self.parse_reply(&content)?;
        self.validate_assignee(&decision, roster)?;

        Ok(RenderedDecision {
            assignee: decision.assignee,
            rationale: decision.rationale,
            notification_subject: decision.subject,
            notification_body: decision.body,
        })
    }
}
