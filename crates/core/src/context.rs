//! MemoryContext — the assembled view handed to the text generator for one
//! orchestration run.
//!
//! This is a read projection, not a stored entity: it is recomputed per run
//! from the store's hot and warm tiers and never persisted directly.

use crate::decision::Decision;
use crate::message::Message;
use crate::roster::Candidate;
use crate::task::Task;
use serde::{Deserialize, Serialize};

/// Everything the text generator gets to see for one run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryContext {
    /// Fixed self-description from the agent identity
    pub self_description: String,

    /// Hot tier: the N most recently stored messages, in store order
    pub recent_messages: Vec<Message>,

    /// Hot tier: all tasks not in a terminal state
    pub open_tasks: Vec<Task>,

    /// Warm tier: decisions within the trailing horizon
    pub recent_decisions: Vec<Decision>,

    /// Warm tier: candidates mentioned in a hot-tier message within the
    /// horizon
    pub known_candidates: Vec<Candidate>,
}

impl MemoryContext {
    /// Render the context as prompt text. Sections with nothing to say are
    /// omitted entirely.
    pub fn render(&self) -> String {
        let mut out = String::with_capacity(2048);

        out.push_str(&self.self_description);
        out.push('\n');

        if !self.recent_messages.is_empty() {
            out.push_str("\n[Recent Messages]\n");
            for msg in &self.recent_messages {
                out.push_str(&format!(
                    "- ({:?}) {} | {}: {}\n",
                    msg.direction, msg.from, msg.subject, msg.body
                ));
            }
        }

        if !self.open_tasks.is_empty() {
            out.push_str("\n[Open Tasks]\n");
            for task in &self.open_tasks {
                out.push_str(&format!(
                    "- {} [{}] {} (requested by {})\n",
                    task.id, task.status, task.description, task.requester
                ));
            }
        }

        if !self.recent_decisions.is_empty() {
            out.push_str("\n[Recent Decisions]\n");
            for d in &self.recent_decisions {
                let who = d.assignee.as_deref().unwrap_or("nobody");
                out.push_str(&format!(
                    "- task {} attempt {}: {} ({:.2}) — {}\n",
                    d.task_id, d.attempt, who, d.confidence, d.rationale
                ));
            }
        }

        if !self.known_candidates.is_empty() {
            out.push_str("\n[People Recently Mentioned]\n");
            for c in &self.known_candidates {
                out.push_str(&format!(
                    "- {} ({:?}, {:.0}h/{:.0}h): {}\n",
                    c.name,
                    c.availability,
                    c.current_load,
                    c.max_hours,
                    c.capabilities.join(", ")
                ));
            }
        }

        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::MessageId;
    use crate::task::{Priority, TaskId};
    use chrono::Utc;

    fn context_with_everything() -> MemoryContext {
        MemoryContext {
            self_description: "You are Coverdesk.".into(),
            recent_messages: vec![Message::incoming(
                MessageId::from("m-1"),
                "alice@example.com",
                vec!["desk@example.com".into()],
                "Need cover",
                "Thursday 18:00",
                Utc::now(),
            )],
            open_tasks: vec![Task::new(
                "cover Thursday",
                vec!["conversation".into()],
                Priority::High,
                None,
                "alice@example.com",
                "m-1",
            )],
            recent_decisions: vec![Decision::assigned(
                TaskId::generate(),
                1,
                "bob",
                "good skill match",
                0.9,
            )],
            known_candidates: vec![],
        }
    }

    #[test]
    fn render_includes_all_populated_sections() {
        let rendered = context_with_everything().render();
        assert!(rendered.contains("You are Coverdesk."));
        assert!(rendered.contains("[Recent Messages]"));
        assert!(rendered.contains("[Open Tasks]"));
        assert!(rendered.contains("[Recent Decisions]"));
        assert!(rendered.contains("Thursday 18:00"));
        assert!(rendered.contains("bob"));
    }

    #[test]
    fn empty_sections_are_omitted() {
        let ctx = MemoryContext {
            self_description: "You are Coverdesk.".into(),
            recent_messages: vec![],
            open_tasks: vec![],
            recent_decisions: vec![],
            known_candidates: vec![],
        };
        let rendered = ctx.render();
        assert!(!rendered.contains("[Recent Messages]"));
        assert!(!rendered.contains("[Open Tasks]"));
        assert!(!rendered.contains("[People Recently Mentioned]"));
    }
}
