//! Execution context passed to every handler.

use haus_security::SafetyPolicy;
use std::collections::HashSet;

/// Per-turn execution state supplied by the orchestration layer.
///
/// The dispatcher takes this by `&mut`, so spend accounting within a turn is
/// strictly sequential.
#[derive(Debug, Clone)]
pub struct ExecutionContext {
    /// Agent the turn runs for.
    pub agent_id: String,
    /// Agent wallet, required by skills that sign or read the agent's balance.
    pub wallet_address: Option<String>,
    /// HD derivation index handed to the signer.
    pub wallet_derivation_index: Option<u32>,
    /// Spending policy; its running total is updated as spends commit.
    pub policy: SafetyPolicy,
    /// Skill ids the agent may use; `None` allows every registered skill.
    pub enabled_skills: Option<HashSet<String>>,
}

impl ExecutionContext {
    /// Context with no wallet and every skill enabled.
    pub fn new(agent_id: impl Into<String>, policy: SafetyPolicy) -> Self {
        Self {
            agent_id: agent_id.into(),
            wallet_address: None,
            wallet_derivation_index: None,
            policy,
            enabled_skills: None,
        }
    }

    /// Attaches the agent wallet.
    pub fn with_wallet(mut self, address: impl Into<String>, derivation_index: u32) -> Self {
        self.wallet_address = Some(address.into());
        self.wallet_derivation_index = Some(derivation_index);
        self
    }

    /// Restricts the agent to the given skill ids.
    pub fn with_enabled_skills<I, S>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.enabled_skills = Some(ids.into_iter().map(Into::into).collect());
        self
    }

    /// Whether `skill_id` may be used by this agent.
    pub fn is_enabled(&self, skill_id: &str) -> bool {
        self.enabled_skills
            .as_ref()
            .map_or(true, |ids| ids.contains(skill_id))
    }
}
