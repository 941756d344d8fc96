//! Reassembly of the reply around command results.

use haus_core::{ParsedCommand, SkillErrorKind, SkillResult};

/// Reassembles the reply with every command marker replaced by its result.
///
/// Literals pass through byte-for-byte; fragments are returned in the order
/// they were given so callers can forward them immediately.
#[derive(Debug, Default)]
pub struct OutputSplicer {
    output: String,
    substitutions: usize,
}

impl OutputSplicer {
    /// Empty splicer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends literal text and returns it as a fragment.
    pub fn literal(&mut self, text: &str) -> String {
        self.output.push_str(text);
        text.to_string()
    }

    /// Fragment that replaces `command`'s marker.
    pub fn command(&mut self, command: &ParsedCommand, result: &SkillResult) -> String {
        let text = render(command, result);
        self.output.push_str(&text);
        self.substitutions += 1;
        text
    }

    /// Everything spliced so far.
    pub fn output(&self) -> &str {
        &self.output
    }

    /// Number of markers replaced.
    pub fn substitutions(&self) -> usize {
        self.substitutions
    }

    /// Consumes the splicer, returning the full reply.
    pub fn into_output(self) -> String {
        self.output
    }
}

/// Replacement text for a dispatched command.
pub fn render(command: &ParsedCommand, result: &SkillResult) -> String {
    if result.success {
        return result.display.clone();
    }
    let tag = command.command_tag.to_uppercase();
    match result.error {
        Some(SkillErrorKind::PendingConfirmation) => {
            format!("({tag} is awaiting owner confirmation)")
        }
        Some(kind) => format!("(Could not run {tag}: {})", kind.label()),
        None => format!("(Could not run {tag})"),
    }
}
