//! Safety primitives for the AgentHaus skill engine.
//!
//! Provides the per-agent spending policy enforced by the dispatcher and the
//! sinks that receive transaction and activity events after a mutating
//! command has run.
//!
//! # Main types
//!
//! - [`SafetyPolicy`]: Spending limits, running total and address blocklist.
//! - [`SpendIntent`]: The amount and destination a mutating command declares.
//! - [`EventSink`]: Receiver for transaction and activity records.
//! - [`JsonlEventSink`]: Append-only JSONL sink written by a background task.
//! - [`MemoryEventSink`]: In-memory sink for tests and embedding.

/// Transaction and activity sinks.
pub mod audit;
/// Spending policy and limit checks.
pub mod policy;

pub use audit::{EventSink, JsonlEventSink, MemoryEventSink, SinkEvent};
pub use policy::{SafetyPolicy, SpendIntent};
