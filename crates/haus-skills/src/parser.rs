//! Incremental command-marker parser.

use crate::registry::SkillRegistry;
use haus_core::ParsedCommand;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, warn};

const OPEN: &str = "[[";
const CLOSE: &str = "]]";
const SEPARATOR: char = '|';

/// Longest marker body (open token included) the parser will recognize.
/// Anything longer is released as literal text, whether or not its close has
/// arrived yet.
pub const MAX_MARKER_LEN: usize = 4096;

/// One piece of a reply, in arrival order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    /// Text to forward unchanged.
    Literal(String),
    /// A recognized marker, ready to dispatch.
    Command(ParsedCommand),
}

/// Scanner state between fragments.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanState {
    /// Copying literal text.
    Text,
    /// Holding an opened marker while waiting for its close.
    OpenSeen,
    /// Stream closed; nothing more is scanned.
    Flushed,
}

/// Streaming scanner for `[[TAG|p1|p2]]` command markers.
///
/// One parser per reply. Output does not depend on how the reply was split
/// into fragments: a partial `[[` (or a trailing single `[`) is withheld until
/// the next fragment decides what it is, and flushed verbatim on
/// [`finish`](Self::finish).
pub struct CommandParser {
    registry: Arc<SkillRegistry>,
    enabled: Option<HashSet<String>>,
    buffer: String,
    /// Byte offset of `buffer[0]` within the whole reply.
    offset: usize,
    state: ScanState,
}

impl CommandParser {
    /// Parser that recognizes every skill in `registry`.
    pub fn new(registry: Arc<SkillRegistry>) -> Self {
        Self {
            registry,
            enabled: None,
            buffer: String::new(),
            offset: 0,
            state: ScanState::Text,
        }
    }

    /// Only recognize the given skill ids; other tags pass through as text.
    pub fn with_enabled_skills(mut self, enabled: Option<HashSet<String>>) -> Self {
        self.enabled = enabled;
        self
    }

    /// Current scanner state.
    pub fn state(&self) -> ScanState {
        self.state
    }

    /// Bytes currently withheld.
    pub fn pending(&self) -> &str {
        &self.buffer
    }

    /// Consumes one fragment and returns every segment it completes.
    pub fn feed(&mut self, fragment: &str) -> Vec<Segment> {
        if self.state == ScanState::Flushed {
            warn!(len = fragment.len(), "Fragment after stream close, passing through");
            self.offset += fragment.len();
            return if fragment.is_empty() {
                Vec::new()
            } else {
                vec![Segment::Literal(fragment.to_string())]
            };
        }

        self.buffer.push_str(fragment);
        let mut out = Vec::new();
        self.scan(&mut out);
        out
    }

    /// Closes the stream, releasing any withheld text as a literal.
    pub fn finish(&mut self) -> Vec<Segment> {
        let mut out = Vec::new();
        if self.state == ScanState::Flushed {
            return out;
        }
        if !self.buffer.is_empty() {
            if self.buffer.contains(OPEN) {
                debug!(len = self.buffer.len(), "Flushing unterminated marker as text");
            }
            let len = self.buffer.len();
            self.release(len, &mut out);
        }
        self.state = ScanState::Flushed;
        out
    }

    fn scan(&mut self, out: &mut Vec<Segment>) {
        loop {
            let Some(open) = self.buffer.find(OPEN) else {
                // A lone trailing '[' may be the first half of an open token.
                let keep = usize::from(self.buffer.ends_with('['));
                let len = self.buffer.len() - keep;
                self.release(len, out);
                self.state = ScanState::Text;
                return;
            };

            if open > 0 {
                self.release(open, out);
            }
            // "[[[" opens one character later.
            if self.buffer[OPEN.len()..].starts_with('[') {
                self.release(1, out);
                continue;
            }
            self.state = ScanState::OpenSeen;

            let Some(rel_close) = self.buffer[OPEN.len()..].find(CLOSE) else {
                // The close can start no earlier than a trailing ']'.
                if self.buffer.len() > MAX_MARKER_LEN + 1 {
                    self.give_up_on_open(out);
                    continue;
                }
                return;
            };
            let close = OPEN.len() + rel_close;

            // A later open before the close starts the real marker.
            if let Some(inner) = self.buffer[OPEN.len()..close].rfind(OPEN) {
                self.release(OPEN.len() + inner, out);
                continue;
            }

            let end = close + CLOSE.len();
            if close > MAX_MARKER_LEN {
                warn!(len = end, "Marker exceeds maximum length, releasing as text");
                self.release(end, out);
                self.state = ScanState::Text;
                continue;
            }

            let body = self.buffer[OPEN.len()..close].to_string();
            match self.recognize(&body, end) {
                Some(cmd) => {
                    debug!(skill = %cmd.skill_id, span = ?cmd.span, "Command marker parsed");
                    self.buffer.drain(..end);
                    self.offset += end;
                    out.push(Segment::Command(cmd));
                }
                None => self.release(end, out),
            }
            self.state = ScanState::Text;
        }
    }

    /// Releases an overlong open marker up to the next `[[`, or entirely
    /// except for a trailing `[` that may start the next marker.
    fn give_up_on_open(&mut self, out: &mut Vec<Segment>) {
        warn!(len = self.buffer.len(), "Marker exceeds maximum length, releasing as text");
        let upto = self.buffer[OPEN.len()..].find(OPEN).map_or_else(
            || self.buffer.len() - usize::from(self.buffer.ends_with('[')),
            |i| OPEN.len() + i,
        );
        self.release(upto, out);
        self.state = ScanState::Text;
    }

    fn recognize(&self, body: &str, end: usize) -> Option<ParsedCommand> {
        let mut fields = body.split(SEPARATOR).map(str::trim);
        let tag = fields.next().unwrap_or_default();
        let def = self.registry.by_tag(tag)?;
        if let Some(enabled) = &self.enabled {
            if !enabled.contains(&def.id) {
                debug!(skill = %def.id, "Skill not enabled for agent, marker kept as text");
                return None;
            }
        }
        Some(ParsedCommand {
            skill_id: def.id.clone(),
            command_tag: tag.to_string(),
            params: fields.map(str::to_string).collect(),
            raw: self.buffer[..end].to_string(),
            span: self.offset..self.offset + end,
        })
    }

    fn release(&mut self, len: usize, out: &mut Vec<Segment>) {
        if len == 0 {
            return;
        }
        let text: String = self.buffer.drain(..len).collect();
        self.offset += len;
        match out.last_mut() {
            Some(Segment::Literal(prev)) => prev.push_str(&text),
            _ => out.push(Segment::Literal(text)),
        }
    }
}
