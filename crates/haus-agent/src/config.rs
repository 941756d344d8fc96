//! Configuration sections read from `haus.toml`.

use haus_security::SafetyPolicy;
use haus_skills::{ExecutionContext, SkillRegistry};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// JSON-RPC endpoint used for every chain read.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RpcConfig {
    /// Endpoint URL.
    #[serde(default = "default_rpc_url")]
    pub url: String,
    /// Per-request timeout in seconds.
    #[serde(default = "default_rpc_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_rpc_url() -> String {
    "https://forno.celo.org".to_string()
}

fn default_rpc_timeout_secs() -> u64 {
    10
}

impl Default for RpcConfig {
    fn default() -> Self {
        Self {
            url: default_rpc_url(),
            timeout_secs: default_rpc_timeout_secs(),
        }
    }
}

impl RpcConfig {
    /// Request timeout as a [`Duration`].
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Dispatcher and activity-log settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Upper bound on a single skill invocation.
    #[serde(default = "default_handler_timeout_secs")]
    pub handler_timeout_secs: u64,
    /// When set, transactions and activity are appended to
    /// `<dir>/activity.jsonl`.
    #[serde(default)]
    pub activity_log_dir: Option<PathBuf>,
}

fn default_handler_timeout_secs() -> u64 {
    30
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            handler_timeout_secs: default_handler_timeout_secs(),
            activity_log_dir: None,
        }
    }
}

impl EngineConfig {
    /// Handler timeout as a [`Duration`].
    pub fn handler_timeout(&self) -> Duration {
        Duration::from_secs(self.handler_timeout_secs)
    }
}

/// The agent a turn runs for.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentConfig {
    /// Agent id recorded on every event.
    #[serde(default = "default_agent_id")]
    pub id: String,
    /// Template whose skill set is enabled; all skills when unset.
    #[serde(default)]
    pub template: Option<String>,
    /// Agent wallet address.
    #[serde(default)]
    pub wallet_address: Option<String>,
    /// HD derivation index of the agent wallet.
    #[serde(default)]
    pub wallet_derivation_index: Option<u32>,
}

fn default_agent_id() -> String {
    "local-agent".to_string()
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            id: default_agent_id(),
            template: None,
            wallet_address: None,
            wallet_derivation_index: None,
        }
    }
}

impl AgentConfig {
    /// Builds the per-turn context. An unknown template enables nothing.
    pub fn context(&self, policy: SafetyPolicy, registry: &SkillRegistry) -> ExecutionContext {
        let mut ctx = ExecutionContext::new(&self.id, policy);
        ctx.wallet_address = self.wallet_address.clone();
        ctx.wallet_derivation_index = self.wallet_derivation_index;
        if let Some(template) = &self.template {
            ctx.enabled_skills = Some(registry.template_skill_ids(template).unwrap_or_default());
        }
        ctx
    }
}
