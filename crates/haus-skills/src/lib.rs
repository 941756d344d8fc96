//! Skill engine for AgentHaus agents.
//!
//! Turns a streamed agent reply into an ordered list of literal text and parsed
//! commands, then runs each command against its registered handler under the
//! agent's safety policy.
//!
//! # Main types
//!
//! - [`SkillRegistry`]: Definitions and handlers, indexed by id and command tag.
//! - [`CommandParser`]: Incremental scanner for `[[TAG|p1|p2]]` markers.
//! - [`Dispatcher`]: Validation, safety checks, confirmation holds and execution.
//! - [`SkillHandler`]: Trait every skill implements.
//! - [`ExecutionContext`]: Per-turn agent, wallet and policy state.

pub mod context;
pub mod dispatcher;
pub mod parser;
pub mod registry;
pub mod skill;

pub use context::ExecutionContext;
pub use dispatcher::{DispatchOutcome, Dispatcher};
pub use parser::{CommandParser, ScanState, Segment};
pub use registry::SkillRegistry;
pub use skill::SkillHandler;
