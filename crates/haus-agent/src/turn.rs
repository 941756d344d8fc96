//! One agent turn, from stream events to spliced output.

use crate::config::{EngineConfig, RpcConfig};
use crate::splicer::OutputSplicer;
use crate::stream::StreamEvent;
use haus_core::{
    ConfirmationDecision, HausError, HausResult, ParsedCommand, PendingConfirmation, SkillResult,
};
use haus_market::{ChainReader, JsonRpcClient, MarketAddresses, MarketData, WalletSigner};
use haus_security::{EventSink, JsonlEventSink};
use haus_skills::{CommandParser, Dispatcher, ExecutionContext, Segment, SkillRegistry};
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{error, info, warn};
use uuid::Uuid;

/// One dispatched command and what it produced.
#[derive(Debug, Clone, Serialize)]
pub struct CommandOutcome {
    /// The command as parsed from the reply.
    pub command: ParsedCommand,
    /// What dispatching it produced.
    pub result: SkillResult,
}

/// Everything a finished turn produced.
#[derive(Debug, Clone, Serialize)]
pub struct TurnSummary {
    /// Id used on every log line of the turn.
    pub turn_id: Uuid,
    /// The full spliced reply.
    pub output: String,
    /// Dispatched commands, in reply order.
    pub outcomes: Vec<CommandOutcome>,
    /// Commands held for owner confirmation; resume them with
    /// [`TurnProcessor::resume`].
    pub pending: Vec<PendingConfirmation>,
    /// The turn stopped early; commands after that point were not run.
    pub cancelled: bool,
}

/// Composition root: owns the registry, the dispatcher and the market
/// resolver, and runs one agent reply at a time through them.
///
/// A processor is shareable across concurrent turns; all per-turn state lives
/// in the parser, the splicer and the caller's [`ExecutionContext`].
pub struct TurnProcessor {
    registry: Arc<SkillRegistry>,
    dispatcher: Dispatcher,
    market: Arc<MarketData>,
}

impl TurnProcessor {
    /// Processor over an existing dispatcher and market resolver.
    pub fn new(dispatcher: Dispatcher, market: Arc<MarketData>) -> Self {
        Self {
            registry: dispatcher.registry().clone(),
            dispatcher,
            market,
        }
    }

    /// Builds a processor with every built-in skill over the given reader.
    pub fn with_builtins(
        reader: Arc<dyn ChainReader>,
        rpc: &RpcConfig,
        engine: &EngineConfig,
        signer: Option<Arc<dyn WalletSigner>>,
        sink: Option<Arc<dyn EventSink>>,
    ) -> HausResult<Self> {
        let market = Arc::new(
            MarketData::new(reader, MarketAddresses::celo_mainnet())
                .with_read_timeout(rpc.timeout()),
        );
        let mut registry = SkillRegistry::new();
        haus_builtins::register_builtins(&mut registry, market.clone(), signer)?;

        let mut dispatcher = Dispatcher::new(Arc::new(registry))
            .with_handler_timeout(engine.handler_timeout());
        if let Some(sink) = sink {
            dispatcher = dispatcher.with_sink(sink);
        }
        info!(
            skills = dispatcher.registry().skill_count(),
            rpc = %rpc.url,
            "Turn processor ready"
        );
        Ok(Self::new(dispatcher, market))
    }

    /// Builds a processor that reads over JSON-RPC and, when configured, logs
    /// to a JSONL activity file. Must be called inside a tokio runtime.
    pub fn from_config(
        rpc: &RpcConfig,
        engine: &EngineConfig,
        signer: Option<Arc<dyn WalletSigner>>,
    ) -> HausResult<Self> {
        let reader = Arc::new(JsonRpcClient::new(&rpc.url, rpc.timeout())?);
        let sink = engine
            .activity_log_dir
            .clone()
            .map(|dir| Arc::new(JsonlEventSink::new(dir)) as Arc<dyn EventSink>);
        Self::with_builtins(reader, rpc, engine, signer, sink)
    }

    /// The skill registry.
    pub fn registry(&self) -> &Arc<SkillRegistry> {
        &self.registry
    }

    /// The market data resolver shared with the built-in skills.
    pub fn market(&self) -> &Arc<MarketData> {
        &self.market
    }

    /// The dispatcher commands run through.
    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    /// Runs one turn over a stream of transport events.
    ///
    /// Spliced fragments are sent on `output` as soon as they are known.
    /// Commands run strictly one after another. The turn is cancelled,
    /// between commands, when `output` is closed or the transport reports an
    /// error. Text already received is still forwarded after a transport
    /// error, with any unrun markers left verbatim. Only an internal registry
    /// fault aborts with `Err`.
    pub async fn process(
        &self,
        mut events: mpsc::Receiver<StreamEvent>,
        output: mpsc::Sender<String>,
        ctx: &mut ExecutionContext,
    ) -> HausResult<TurnSummary> {
        let turn_id = Uuid::new_v4();
        info!(turn_id = %turn_id, agent_id = %ctx.agent_id, "Starting turn");

        let mut parser = CommandParser::new(self.registry.clone())
            .with_enabled_skills(ctx.enabled_skills.clone());
        let mut splicer = OutputSplicer::new();
        let mut outcomes = Vec::new();
        let mut pending = Vec::new();
        let mut cancelled = false;
        let mut output_closed = false;

        loop {
            let (segments, last) = match events.recv().await {
                Some(StreamEvent::TextDelta { text }) => (parser.feed(&text), false),
                Some(StreamEvent::Done) | None => (parser.finish(), true),
                Some(StreamEvent::Error { message }) => {
                    warn!(turn_id = %turn_id, error = %message, "Transport error, cancelling turn");
                    cancelled = true;
                    (parser.finish(), true)
                }
            };

            for segment in segments {
                let fragment = match segment {
                    Segment::Literal(text) => splicer.literal(&text),
                    Segment::Command(command) if cancelled => splicer.literal(&command.raw),
                    Segment::Command(command) => {
                        let outcome = self.dispatcher.dispatch(&command, ctx).await;
                        if outcome.result().is_internal() {
                            error!(
                                turn_id = %turn_id,
                                skill = %command.skill_id,
                                "Internal fault, aborting turn"
                            );
                            return Err(HausError::Internal(outcome.into_result().display));
                        }
                        if let Some(p) = outcome.pending() {
                            pending.push(p.clone());
                        }
                        let result = outcome.into_result();
                        let fragment = splicer.command(&command, &result);
                        outcomes.push(CommandOutcome { command, result });
                        fragment
                    }
                };
                if fragment.is_empty() || output_closed {
                    continue;
                }
                if output.send(fragment).await.is_err() {
                    warn!(turn_id = %turn_id, "Output receiver closed, cancelling turn");
                    output_closed = true;
                    cancelled = true;
                }
            }

            if last || cancelled {
                break;
            }
        }

        info!(
            turn_id = %turn_id,
            commands = outcomes.len(),
            pending = pending.len(),
            spending_used = ctx.policy.spending_used,
            cancelled,
            "Turn finished"
        );
        Ok(TurnSummary {
            turn_id,
            output: splicer.into_output(),
            outcomes,
            pending,
            cancelled,
        })
    }

    /// Runs one turn over a complete reply.
    pub async fn process_text(
        &self,
        text: &str,
        ctx: &mut ExecutionContext,
    ) -> HausResult<TurnSummary> {
        let (events_tx, events_rx) = mpsc::channel(2);
        for event in [StreamEvent::text(text), StreamEvent::Done] {
            events_tx
                .try_send(event)
                .map_err(|e| HausError::Internal(format!("event channel: {e}")))?;
        }
        drop(events_tx);

        let (output_tx, mut output_rx) = mpsc::channel::<String>(64);
        let drain = async move { while output_rx.recv().await.is_some() {} };
        let (summary, ()) = tokio::join!(self.process(events_rx, output_tx, ctx), drain);
        summary
    }

    /// Completes a command that a previous turn left pending.
    pub async fn resume(
        &self,
        pending: &PendingConfirmation,
        decision: &ConfirmationDecision,
        ctx: &mut ExecutionContext,
    ) -> SkillResult {
        self.dispatcher.resume(pending, decision, ctx).await
    }
}
