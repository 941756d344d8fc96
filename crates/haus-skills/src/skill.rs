//! The [`SkillHandler`] trait.

use crate::context::ExecutionContext;
use async_trait::async_trait;
use haus_core::{HausResult, SkillDefinition, SkillOutput};
use haus_security::SpendIntent;

/// Trait that every skill handler implements.
///
/// Handlers receive the marker's positional params in written order. Extra
/// trailing params beyond the definition are passed through untouched.
#[async_trait]
pub trait SkillHandler: Send + Sync {
    /// Static metadata: id, command tag, params and flags.
    fn definition(&self) -> &SkillDefinition;

    /// Amount and destination this invocation would spend. Called before
    /// `execute` for mutating skills so the dispatcher can enforce limits.
    fn spend_intent(
        &self,
        _params: &[String],
        _ctx: &ExecutionContext,
    ) -> HausResult<Option<SpendIntent>> {
        Ok(None)
    }

    /// Runs the skill. Failures are returned as [`haus_core::HausError`] and
    /// turned into a result by the dispatcher.
    async fn execute(&self, params: &[String], ctx: &ExecutionContext) -> HausResult<SkillOutput>;
}
