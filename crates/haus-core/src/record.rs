use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// What a transaction did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionKind {
    /// Native or token transfer.
    Send,
    /// Mento exchange swap.
    Swap,
    /// Tip to another address.
    Tip,
}

/// Lifecycle of a submitted transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionStatus {
    /// Submitted, not yet mined.
    Pending,
    /// Mined successfully.
    Confirmed,
    /// Reverted or dropped.
    Failed,
}

/// A submitted transaction, display-ready for the storage collaborator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionRecord {
    /// Transaction hash as returned by the signer.
    pub hash: String,
    /// Send, swap or tip.
    pub kind: TransactionKind,
    /// Status at the time of recording.
    pub status: TransactionStatus,
    /// Short summary for the activity feed.
    pub description: String,
    /// Amount sent or sold, in whole units.
    pub amount: Option<f64>,
    /// Currency symbol of `amount`.
    pub currency: Option<String>,
    /// Recipient address, for transfers.
    pub to: Option<String>,
}

/// Severity of an activity line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActivityKind {
    /// A mutating command ran.
    Action,
    /// A mutating command failed.
    Error,
    /// Informational.
    Info,
    /// Refused or rejected command.
    Warning,
}

/// One line of an agent's activity feed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActivityRecord {
    /// When the event happened.
    pub timestamp: DateTime<Utc>,
    /// Severity.
    pub kind: ActivityKind,
    /// Human-readable line.
    pub message: String,
    /// Structured detail such as skill id and params.
    #[serde(default)]
    pub metadata: serde_json::Value,
}

impl ActivityRecord {
    /// Record stamped with the current time.
    pub fn new(kind: ActivityKind, message: impl Into<String>, metadata: serde_json::Value) -> Self {
        Self {
            timestamp: Utc::now(),
            kind,
            message: message.into(),
            metadata,
        }
    }
}
