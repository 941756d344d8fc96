use crate::record::TransactionRecord;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::Range;

/// Grouping used to filter skills in the registry and in prompt instructions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SkillCategory {
    /// Native and token transfers.
    Transfer,
    /// Mento exchange quotes and swaps.
    Exchange,
    /// Oracle price feeds.
    Oracle,
    /// Balances, gas prices and other chain data.
    Data,
    /// DeFi protocol interactions.
    Defi,
    /// Tipping and social payments.
    Social,
    /// Forex analysis over stable-asset pairs.
    Forex,
}

impl SkillCategory {
    /// All categories, in display order.
    pub const ALL: [SkillCategory; 7] = [
        SkillCategory::Transfer,
        SkillCategory::Exchange,
        SkillCategory::Oracle,
        SkillCategory::Data,
        SkillCategory::Defi,
        SkillCategory::Social,
        SkillCategory::Forex,
    ];

    /// Lowercase name, as used in configuration and the CLI.
    pub fn as_str(&self) -> &'static str {
        match self {
            SkillCategory::Transfer => "transfer",
            SkillCategory::Exchange => "exchange",
            SkillCategory::Oracle => "oracle",
            SkillCategory::Data => "data",
            SkillCategory::Defi => "defi",
            SkillCategory::Social => "social",
            SkillCategory::Forex => "forex",
        }
    }

    /// Parses a category name case-insensitively.
    pub fn parse(s: &str) -> Option<Self> {
        let lower = s.trim().to_lowercase();
        Self::ALL.into_iter().find(|c| c.as_str() == lower)
    }
}

impl fmt::Display for SkillCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One positional parameter of a skill's command marker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkillParam {
    /// Parameter name, used in prompt instructions and error messages.
    pub name: String,
    /// Whether the marker must supply this field.
    pub required: bool,
    /// What the parameter means.
    pub description: String,
    /// A representative value.
    pub example: String,
}

impl SkillParam {
    /// Creates a required parameter.
    pub fn required(
        name: impl Into<String>,
        description: impl Into<String>,
        example: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            required: true,
            description: description.into(),
            example: example.into(),
        }
    }

    /// Creates an optional trailing parameter.
    pub fn optional(
        name: impl Into<String>,
        description: impl Into<String>,
        example: impl Into<String>,
    ) -> Self {
        Self {
            required: false,
            ..Self::required(name, description, example)
        }
    }
}

/// An example exchange shown to the LLM in the system prompt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkillExample {
    /// What the user asks.
    pub input: String,
    /// How the agent replies, marker included.
    pub output: String,
}

/// Immutable description of one capability an agent may invoke.
///
/// `params` order is the positional contract between the marker syntax
/// `[[TAG|p1|p2]]` and the handler.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SkillDefinition {
    /// Unique skill identifier.
    pub id: String,
    /// Human-readable name.
    pub name: String,
    /// Short description.
    pub description: String,
    /// Category for grouping.
    pub category: SkillCategory,
    /// Marker tag, matched case-insensitively.
    pub command_tag: String,
    /// Positional parameters.
    pub params: Vec<SkillParam>,
    /// Example usages for the system prompt.
    #[serde(default)]
    pub examples: Vec<SkillExample>,
    /// Whether the skill needs the agent's wallet.
    pub requires_wallet: bool,
    /// Whether the skill changes on-chain state.
    pub mutates_state: bool,
}

impl SkillDefinition {
    /// Number of leading parameters the marker must supply.
    pub fn required_count(&self) -> usize {
        self.params.iter().filter(|p| p.required).count()
    }

    /// The marker template, e.g. `[[SEND_CELO|to|amount]]`.
    pub fn marker_syntax(&self) -> String {
        let mut out = format!("[[{}", self.command_tag);
        for param in &self.params {
            out.push('|');
            if param.required {
                out.push_str(&param.name);
            } else {
                out.push_str(&format!("{}?", param.name));
            }
        }
        out.push_str("]]");
        out
    }
}

/// A command marker recognized in an agent reply.
///
/// Created by the parser, consumed once by the dispatcher.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedCommand {
    /// Registered skill id the tag resolved to.
    pub skill_id: String,
    /// The tag exactly as the agent wrote it.
    pub command_tag: String,
    /// Trimmed fields after the tag, in written order.
    pub params: Vec<String>,
    /// The full marker text, brackets included.
    pub raw: String,
    /// Byte offsets of `raw` within the whole reply.
    pub span: Range<usize>,
}

/// Outcome classification for a dispatched command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkillErrorKind {
    /// Missing or malformed parameters.
    ValidationError,
    /// Missing wallet or credentials.
    ConfigurationError,
    /// Spending limit or blocklist breach.
    SafetyViolation,
    /// Downstream network or contract failure.
    ExecutionError,
    /// Registry inconsistency; aborts the turn.
    Internal,
    /// Held back until the owner confirms.
    PendingConfirmation,
}

impl SkillErrorKind {
    /// Short lowercase label used in rendered failure text.
    pub fn label(&self) -> &'static str {
        match self {
            SkillErrorKind::ValidationError => "invalid parameters",
            SkillErrorKind::ConfigurationError => "not configured",
            SkillErrorKind::SafetyViolation => "blocked by safety policy",
            SkillErrorKind::ExecutionError => "execution failed",
            SkillErrorKind::Internal => "internal error",
            SkillErrorKind::PendingConfirmation => "awaiting owner confirmation",
        }
    }
}

impl fmt::Display for SkillErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// What a handler returns on success.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SkillOutput {
    /// Text that replaces the marker.
    pub display: String,
    /// Structured payload for callers.
    pub data: Option<serde_json::Value>,
    /// Transaction submitted by a mutating handler, if any.
    pub transaction: Option<TransactionRecord>,
}

impl SkillOutput {
    /// Output with display text only.
    pub fn text(display: impl Into<String>) -> Self {
        Self {
            display: display.into(),
            ..Self::default()
        }
    }

    /// Attaches a structured payload.
    pub fn with_data(mut self, data: serde_json::Value) -> Self {
        self.data = Some(data);
        self
    }

    /// Attaches the submitted transaction.
    pub fn with_transaction(mut self, tx: TransactionRecord) -> Self {
        self.transaction = Some(tx);
        self
    }
}

/// The outcome of one command execution. Immutable once produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkillResult {
    /// Skill the command resolved to.
    pub skill_id: String,
    /// Whether the handler ran and succeeded.
    pub success: bool,
    /// Structured payload from the handler, on success.
    pub data: Option<serde_json::Value>,
    /// Replacement text on success, failure detail otherwise.
    pub display: String,
    /// Failure class; `None` on success.
    pub error: Option<SkillErrorKind>,
}

impl SkillResult {
    /// Successful result carrying the handler's output.
    pub fn success(skill_id: impl Into<String>, output: SkillOutput) -> Self {
        Self {
            skill_id: skill_id.into(),
            success: true,
            data: output.data,
            display: output.display,
            error: None,
        }
    }

    /// Failed result of the given class.
    pub fn failure(
        skill_id: impl Into<String>,
        kind: SkillErrorKind,
        detail: impl Into<String>,
    ) -> Self {
        Self {
            skill_id: skill_id.into(),
            success: false,
            data: None,
            display: detail.into(),
            error: Some(kind),
        }
    }

    /// Whether this is an engine fault rather than a skill failure.
    pub fn is_internal(&self) -> bool {
        self.error == Some(SkillErrorKind::Internal)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn send_def() -> SkillDefinition {
        SkillDefinition {
            id: "send_celo".into(),
            name: "Send CELO".into(),
            description: "Send native CELO".into(),
            category: SkillCategory::Transfer,
            command_tag: "SEND_CELO".into(),
            params: vec![
                SkillParam::required("to", "Recipient", "0xabc"),
                SkillParam::required("amount", "Amount", "1.5"),
                SkillParam::optional("memo", "Note", "rent"),
            ],
            examples: vec![],
            requires_wallet: true,
            mutates_state: true,
        }
    }

    #[test]
    fn test_required_count_ignores_optional() {
        assert_eq!(send_def().required_count(), 2);
    }

    #[test]
    fn test_marker_syntax() {
        assert_eq!(send_def().marker_syntax(), "[[SEND_CELO|to|amount|memo?]]");
    }

    #[test]
    fn test_category_parse() {
        assert_eq!(SkillCategory::parse("Oracle"), Some(SkillCategory::Oracle));
        assert_eq!(SkillCategory::parse("nope"), None);
    }

    #[test]
    fn test_definition_serializes_camel_case() {
        let json = serde_json::to_value(send_def()).unwrap();
        assert_eq!(json["commandTag"], "SEND_CELO");
        assert_eq!(json["requiresWallet"], true);
        assert_eq!(json["category"], "transfer");
    }

    #[test]
    fn test_failure_result() {
        let result = SkillResult::failure("x", SkillErrorKind::SafetyViolation, "over limit");
        assert!(!result.success);
        assert_eq!(result.error, Some(SkillErrorKind::SafetyViolation));
        assert!(!result.is_internal());
    }
}
