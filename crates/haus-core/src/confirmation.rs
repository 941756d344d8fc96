//! Confirmation types for owner-in-the-loop spending.
//!
//! When an agent's safety policy requires confirmation, a mutating command is
//! not executed during the turn. The dispatcher instead hands back a
//! [`PendingConfirmation`] which the orchestration layer stores and later
//! resumes together with a [`ConfirmationDecision`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A mutating command parked until its owner confirms it out of band.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PendingConfirmation {
    /// Token the confirmation event refers back to.
    pub token: Uuid,
    /// Agent whose turn produced the command.
    pub agent_id: String,
    /// Skill to run on approval.
    pub skill_id: String,
    /// Tag as the agent wrote it.
    pub command_tag: String,
    /// Positional params as parsed.
    pub params: Vec<String>,
    /// Amount the handler declared for spend accounting.
    pub amount: Option<f64>,
    /// Destination address the handler declared, if any.
    pub destination: Option<String>,
    /// Human-readable summary shown to the owner.
    pub description: String,
    /// When the command was held.
    pub created_at: DateTime<Utc>,
}

/// The owner's answer to a [`PendingConfirmation`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfirmationDecision {
    /// Whether the owner allowed the command.
    pub approved: bool,
    /// Reason given for a rejection.
    pub reason: Option<String>,
    /// Who decided.
    pub reviewer: String,
}

impl ConfirmationDecision {
    /// Approval by `reviewer`.
    pub fn approve(reviewer: impl Into<String>) -> Self {
        Self {
            approved: true,
            reason: None,
            reviewer: reviewer.into(),
        }
    }

    /// Rejection by `reviewer` with a reason.
    pub fn reject(reviewer: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            approved: false,
            reason: Some(reason.into()),
            reviewer: reviewer.into(),
        }
    }
}
