//! Command dispatch: validation, safety, confirmation and execution.

use crate::context::ExecutionContext;
use crate::registry::SkillRegistry;
use crate::skill::SkillHandler;
use chrono::Utc;
use haus_core::{
    ActivityKind, ActivityRecord, ConfirmationDecision, HausError, ParsedCommand,
    PendingConfirmation, SkillDefinition, SkillErrorKind, SkillOutput, SkillResult,
};
use haus_security::{EventSink, SpendIntent};
use parking_lot::Mutex;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};
use uuid::Uuid;

/// Default upper bound on a single handler invocation.
pub const DEFAULT_HANDLER_TIMEOUT: Duration = Duration::from_secs(30);

/// What the dispatcher produced for one command.
#[derive(Debug, Clone)]
pub enum DispatchOutcome {
    /// The command ran, or was refused before running.
    Finished(SkillResult),
    /// The command was held back. `result` carries
    /// [`SkillErrorKind::PendingConfirmation`] for display.
    AwaitingConfirmation {
        /// Everything needed to resume the command later.
        pending: PendingConfirmation,
        /// Placeholder shown in the reply while the command is held.
        result: SkillResult,
    },
}

impl DispatchOutcome {
    /// The result to splice into the reply.
    pub fn result(&self) -> &SkillResult {
        match self {
            DispatchOutcome::Finished(result) => result,
            DispatchOutcome::AwaitingConfirmation { result, .. } => result,
        }
    }

    /// Consumes the outcome, keeping only its result.
    pub fn into_result(self) -> SkillResult {
        match self {
            DispatchOutcome::Finished(result) => result,
            DispatchOutcome::AwaitingConfirmation { result, .. } => result,
        }
    }

    /// The held command, if confirmation is required.
    pub fn pending(&self) -> Option<&PendingConfirmation> {
        match self {
            DispatchOutcome::AwaitingConfirmation { pending, .. } => Some(pending),
            DispatchOutcome::Finished(_) => None,
        }
    }
}

/// Validates parsed commands, enforces the safety policy and runs handlers.
///
/// Never returns an error: every failure becomes a [`SkillResult`] value.
/// Commands of one turn must be dispatched one at a time; the `&mut`
/// context makes the check-then-commit of spend accounting atomic.
pub struct Dispatcher {
    registry: Arc<SkillRegistry>,
    sink: Option<Arc<dyn EventSink>>,
    handler_timeout: Duration,
    consumed: Mutex<HashSet<Uuid>>,
}

impl Dispatcher {
    /// Dispatcher over `registry` with no event sink and the default timeout.
    pub fn new(registry: Arc<SkillRegistry>) -> Self {
        Self {
            registry,
            sink: None,
            handler_timeout: DEFAULT_HANDLER_TIMEOUT,
            consumed: Mutex::new(HashSet::new()),
        }
    }

    /// Records transactions and activity for mutating skills.
    pub fn with_sink(mut self, sink: Arc<dyn EventSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    /// Upper bound on a single handler invocation.
    pub fn with_handler_timeout(mut self, timeout: Duration) -> Self {
        self.handler_timeout = timeout;
        self
    }

    /// The registry commands are resolved against.
    pub fn registry(&self) -> &Arc<SkillRegistry> {
        &self.registry
    }

    /// Runs one parsed command through the full pipeline.
    pub async fn dispatch(
        &self,
        command: &ParsedCommand,
        ctx: &mut ExecutionContext,
    ) -> DispatchOutcome {
        self.run(&command.skill_id, &command.command_tag, &command.params, ctx, false)
            .await
    }

    /// Completes a command previously held for confirmation.
    ///
    /// Limits are checked again against the context's current running total,
    /// since other spends may have been committed in the meantime. Each
    /// confirmation token is honored once, whether approved or rejected.
    pub async fn resume(
        &self,
        pending: &PendingConfirmation,
        decision: &ConfirmationDecision,
        ctx: &mut ExecutionContext,
    ) -> SkillResult {
        if pending.agent_id != ctx.agent_id {
            warn!(
                token = %pending.token,
                expected = %pending.agent_id,
                got = %ctx.agent_id,
                "Confirmation resumed under the wrong agent"
            );
            return SkillResult::failure(
                &pending.skill_id,
                SkillErrorKind::SafetyViolation,
                "confirmation belongs to a different agent",
            );
        }

        if !self.consumed.lock().insert(pending.token) {
            warn!(token = %pending.token, skill = %pending.skill_id, "Confirmation reused");
            return SkillResult::failure(
                &pending.skill_id,
                SkillErrorKind::SafetyViolation,
                format!("confirmation {} was already used", pending.token),
            );
        }

        if !decision.approved {
            let reason = decision.reason.as_deref().unwrap_or("no reason given");
            info!(
                token = %pending.token,
                skill = %pending.skill_id,
                reviewer = %decision.reviewer,
                reason = %reason,
                "Command rejected by owner"
            );
            self.activity(
                ctx,
                ActivityKind::Warning,
                format!("{} rejected by {}", pending.description, decision.reviewer),
                serde_json::json!({ "skill": pending.skill_id, "reason": reason }),
            );
            return SkillResult::failure(
                &pending.skill_id,
                SkillErrorKind::SafetyViolation,
                format!("rejected by {}: {reason}", decision.reviewer),
            );
        }

        info!(
            token = %pending.token,
            skill = %pending.skill_id,
            reviewer = %decision.reviewer,
            "Command approved by owner"
        );
        self.run(&pending.skill_id, &pending.command_tag, &pending.params, ctx, true)
            .await
            .into_result()
    }

    async fn run(
        &self,
        skill_id: &str,
        command_tag: &str,
        params: &[String],
        ctx: &mut ExecutionContext,
        confirmed: bool,
    ) -> DispatchOutcome {
        let Some(handler) = self.registry.handler(skill_id) else {
            error!(skill = %skill_id, "Parsed command refers to an unregistered skill");
            return finished_err(
                skill_id,
                HausError::Internal(format!("skill '{skill_id}' is not registered")),
            );
        };
        let def = handler.definition();

        if let Err(e) = validate_params(def, params) {
            warn!(skill = %skill_id, error = %e, "Command rejected");
            return finished_err(skill_id, e);
        }

        if def.requires_wallet && ctx.wallet_address.is_none() {
            warn!(skill = %skill_id, agent_id = %ctx.agent_id, "Skill requires a wallet");
            return finished_err(
                skill_id,
                HausError::Config(format!("{} requires an agent wallet", def.name)),
            );
        }

        let mut intent = None;
        if def.mutates_state {
            match self.check_safety(handler.as_ref(), params, ctx) {
                Ok(checked) => intent = checked,
                Err(e) => {
                    warn!(skill = %skill_id, agent_id = %ctx.agent_id, error = %e, "Safety check failed");
                    return finished_err(skill_id, e);
                }
            }

            if ctx.policy.require_confirmation && !confirmed {
                let pending = PendingConfirmation {
                    token: Uuid::new_v4(),
                    agent_id: ctx.agent_id.clone(),
                    skill_id: skill_id.to_string(),
                    command_tag: command_tag.to_string(),
                    params: params.to_vec(),
                    amount: intent.as_ref().map(|i| i.amount),
                    destination: intent.as_ref().and_then(|i| i.destination.clone()),
                    description: describe(def, intent.as_ref()),
                    created_at: Utc::now(),
                };
                info!(
                    skill = %skill_id,
                    token = %pending.token,
                    "Command awaiting owner confirmation"
                );
                let result = SkillResult::failure(
                    skill_id,
                    SkillErrorKind::PendingConfirmation,
                    format!("{} is awaiting owner confirmation", pending.description),
                );
                return DispatchOutcome::AwaitingConfirmation { pending, result };
            }
        }

        let started = std::time::Instant::now();
        let executed =
            match tokio::time::timeout(self.handler_timeout, handler.execute(params, ctx)).await {
                Ok(res) => res,
                Err(_) => Err(HausError::Execution(format!(
                    "{} timed out after {}s",
                    def.name,
                    self.handler_timeout.as_secs()
                ))),
            };

        match executed {
            Ok(output) => {
                info!(
                    skill = %skill_id,
                    agent_id = %ctx.agent_id,
                    duration_ms = started.elapsed().as_millis() as u64,
                    "Skill executed"
                );
                if let Some(intent) = &intent {
                    ctx.policy.commit(intent.amount);
                }
                if def.mutates_state {
                    self.record_success(def, params, &output, ctx);
                }
                DispatchOutcome::Finished(SkillResult::success(skill_id, output))
            }
            Err(e) => {
                error!(skill = %skill_id, agent_id = %ctx.agent_id, error = %e, "Skill failed");
                if def.mutates_state {
                    self.activity(
                        ctx,
                        ActivityKind::Error,
                        format!("{} failed: {e}", def.name),
                        serde_json::json!({ "skill": skill_id, "params": params }),
                    );
                }
                finished_err(skill_id, e)
            }
        }
    }

    /// Blocklist over every address-like param, then the handler's declared
    /// spend against the policy.
    fn check_safety(
        &self,
        handler: &dyn SkillHandler,
        params: &[String],
        ctx: &ExecutionContext,
    ) -> Result<Option<SpendIntent>, HausError> {
        if let Some(blocked) = params
            .iter()
            .find(|p| looks_like_address(p) && ctx.policy.is_blocked(p))
        {
            return Err(HausError::Safety(format!(
                "{blocked} is on the blocked address list"
            )));
        }

        let intent = handler.spend_intent(params, ctx)?;
        if let Some(intent) = &intent {
            ctx.policy.check(intent)?;
        }
        Ok(intent)
    }

    fn record_success(
        &self,
        def: &SkillDefinition,
        params: &[String],
        output: &SkillOutput,
        ctx: &ExecutionContext,
    ) {
        let Some(sink) = &self.sink else {
            return;
        };
        if let Some(tx) = &output.transaction {
            sink.record_transaction(&ctx.agent_id, tx.clone());
        }
        let message = output
            .transaction
            .as_ref()
            .map_or_else(|| format!("{} executed", def.name), |tx| tx.description.clone());
        sink.log_activity(
            &ctx.agent_id,
            ActivityRecord::new(
                ActivityKind::Action,
                message,
                serde_json::json!({
                    "skill": def.id,
                    "params": params,
                    "txHash": output.transaction.as_ref().map(|tx| tx.hash.clone()),
                    "spendingUsed": ctx.policy.spending_used,
                }),
            ),
        );
    }

    fn activity(
        &self,
        ctx: &ExecutionContext,
        kind: ActivityKind,
        message: String,
        metadata: serde_json::Value,
    ) {
        if let Some(sink) = &self.sink {
            sink.log_activity(&ctx.agent_id, ActivityRecord::new(kind, message, metadata));
        }
    }
}

fn finished_err(skill_id: &str, err: HausError) -> DispatchOutcome {
    DispatchOutcome::Finished(SkillResult::failure(skill_id, err.kind(), err.to_string()))
}

/// Required params must be present and non-empty. Extra trailing params are
/// left for the handler.
fn validate_params(def: &SkillDefinition, params: &[String]) -> Result<(), HausError> {
    let required: Vec<_> = def.params.iter().filter(|p| p.required).collect();
    if params.len() < required.len() {
        let missing: Vec<&str> = required[params.len()..]
            .iter()
            .map(|p| p.name.as_str())
            .collect();
        return Err(HausError::Validation(format!(
            "{} expects {} parameter(s), got {}; missing {}",
            def.command_tag,
            required.len(),
            params.len(),
            missing.join(", ")
        )));
    }
    if let Some((param, _)) = required
        .iter()
        .zip(params)
        .find(|(_, value)| value.is_empty())
    {
        return Err(HausError::Validation(format!(
            "{} parameter '{}' is empty",
            def.command_tag, param.name
        )));
    }
    Ok(())
}

fn looks_like_address(value: &str) -> bool {
    value.len() == 42
        && value.starts_with("0x")
        && value[2..].bytes().all(|b| b.is_ascii_hexdigit())
}

fn describe(def: &SkillDefinition, intent: Option<&SpendIntent>) -> String {
    match intent {
        Some(SpendIntent {
            amount,
            currency,
            destination: Some(to),
        }) => format!("{}: {amount} {currency} to {to}", def.name),
        Some(SpendIntent {
            amount, currency, ..
        }) => format!("{}: {amount} {currency}", def.name),
        None => def.name.clone(),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use haus_core::SkillParam;

    fn def(params: Vec<SkillParam>) -> SkillDefinition {
        SkillDefinition {
            id: "tip".into(),
            name: "Tip".into(),
            description: String::new(),
            category: haus_core::SkillCategory::Social,
            command_tag: "TIP".into(),
            params,
            examples: vec![],
            requires_wallet: true,
            mutates_state: true,
        }
    }

    #[test]
    fn test_validate_params_counts_required_only() {
        let d = def(vec![
            SkillParam::required("to", "", ""),
            SkillParam::required("amount", "", ""),
            SkillParam::optional("note", "", ""),
        ]);
        assert!(validate_params(&d, &["0x1".into(), "2".into()]).is_ok());
        assert!(validate_params(&d, &["0x1".into(), "2".into(), "hi".into(), "x".into()]).is_ok());
        let err = validate_params(&d, &["0x1".into()]).unwrap_err();
        assert!(err.to_string().contains("missing amount"));
        assert!(matches!(
            validate_params(&d, &["0x1".into(), String::new()]),
            Err(HausError::Validation(_))
        ));
    }

    #[test]
    fn test_looks_like_address() {
        assert!(looks_like_address("0x000000000000000000000000000000000000dEaD"));
        assert!(!looks_like_address("0x1234"));
        assert!(!looks_like_address("cUSD"));
        assert!(!looks_like_address("0xZZ0000000000000000000000000000000000dEaD"));
    }

    #[test]
    fn test_describe() {
        let d = def(vec![]);
        let intent = SpendIntent::new(2.0, "CELO").to("0xabc");
        assert_eq!(describe(&d, Some(&intent)), "Tip: 2 CELO to 0xabc");
        assert_eq!(describe(&d, None), "Tip");
    }
}
