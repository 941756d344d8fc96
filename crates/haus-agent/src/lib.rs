//! Turn orchestration for AgentHaus agents.
//!
//! Feeds a streamed LLM reply through the command parser and dispatcher, splices
//! each command's result back into the text and forwards the spliced fragments
//! as they are known.
//!
//! # Main types
//!
//! - [`TurnProcessor`]: Composition root that runs one reply per call.
//! - [`OutputSplicer`]: Rebuilds the reply with markers replaced by results.
//! - [`StreamEvent`]: Transport events a turn consumes.

pub mod config;
pub mod splicer;
pub mod stream;
pub mod turn;

pub use config::{AgentConfig, EngineConfig, RpcConfig};
pub use splicer::OutputSplicer;
pub use stream::StreamEvent;
pub use turn::{CommandOutcome, TurnProcessor, TurnSummary};
