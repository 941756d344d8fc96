//! Transport events.

use serde::{Deserialize, Serialize};

/// Events delivered by the LLM transport while a reply is generated.
///
/// Only the text of the reply matters to the engine; providers' tool-call
/// events are mapped away before they reach a turn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StreamEvent {
    /// A chunk of reply text.
    TextDelta {
        /// Reply text, in arrival order.
        text: String,
    },

    /// The reply finished normally.
    Done,

    /// Generation was aborted upstream.
    Error {
        /// Transport error description.
        message: String,
    },
}

impl StreamEvent {
    /// Shorthand for [`StreamEvent::TextDelta`].
    pub fn text(text: impl Into<String>) -> Self {
        StreamEvent::TextDelta { text: text.into() }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_format() {
        let json = serde_json::to_value(StreamEvent::text("hi")).unwrap();
        assert_eq!(json, serde_json::json!({"type": "text_delta", "text": "hi"}));
        let done: StreamEvent = serde_json::from_str(r#"{"type":"done"}"#).unwrap();
        assert_eq!(done, StreamEvent::Done);
    }
}
