//! Agent identity — the fixed self-description included in every
//! memory context handed to the text generator.

use serde::{Deserialize, Serialize};

/// The agent's identity. Loaded from config; falls back to a built-in
/// default when nothing is configured.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Identity {
    /// The agent's name
    pub name: String,

    /// Address notifications are sent from
    pub address: String,

    /// Self-description prepended to every memory context
    pub self_description: String,
}

impl Identity {
    pub fn new(
        name: impl Into<String>,
        address: impl Into<String>,
        self_description: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            address: address.into(),
            self_description: self_description.into(),
        }
    }
}

impl Default for Identity {
    fn default() -> Self {
        Self {
            name: "Coverdesk".into(),
            address: "coverdesk@localhost".into(),
            self_description: concat!(
                "You are Coverdesk, an assignment coordinator. ",
                "You match incoming requests to qualified, available people, ",
                "explain your reasoning plainly, and never fabricate an ",
                "assignment when nobody qualifies.",
            )
            .into(),
        }
    }
}
