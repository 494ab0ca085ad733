//! AG-UI events received from the agent backend.
//!
//! Every `data:` line on the wire carries one JSON object with a `type`
//! discriminator. [`BaseEvent`] keeps the discriminator typed and every other
//! field untouched, so events the client does not know about still reach the
//! subscriber exactly as the server sent them.
//!
//! # Example
//!
//! ```rust
//! use osd_agui_agent::events::{BaseEvent, EventType};
//!
//! let event: BaseEvent =
//!     serde_json::from_str(r#"{"type":"RUN_ERROR","message":"boom"}"#).unwrap();
//! assert_eq!(event.event_type, EventType::RunError);
//! assert_eq!(event.message(), Some("boom"));
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Event discriminator.
///
/// Covers the standard AG-UI event set. Anything else is kept verbatim in
/// [`EventType::Other`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum EventType {
    // ─────────────────────────────────────────────────────────────────────
    // Run Lifecycle
    // ─────────────────────────────────────────────────────────────────────
    RunStarted,
    RunFinished,
    RunError,
    StepStarted,
    StepFinished,

    // ─────────────────────────────────────────────────────────────────────
    // Text Messages
    // ─────────────────────────────────────────────────────────────────────
    TextMessageStart,
    TextMessageContent,
    TextMessageEnd,
    TextMessageChunk,

    // ─────────────────────────────────────────────────────────────────────
    // Tool Calls
    // ─────────────────────────────────────────────────────────────────────
    ToolCallStart,
    ToolCallArgs,
    ToolCallEnd,
    ToolCallChunk,
    ToolCallResult,

    // ─────────────────────────────────────────────────────────────────────
    // State
    // ─────────────────────────────────────────────────────────────────────
    StateSnapshot,
    StateDelta,
    MessagesSnapshot,

    // ─────────────────────────────────────────────────────────────────────
    // Extension Points
    // ─────────────────────────────────────────────────────────────────────
    Raw,
    Custom,
    /// Application-defined type not in the standard set.
    Other(String),
}

impl EventType {
    /// Wire name of this event type.
    pub fn as_str(&self) -> &str {
        match self {
            Self::RunStarted => "RUN_STARTED",
            Self::RunFinished => "RUN_FINISHED",
            Self::RunError => "RUN_ERROR",
            Self::StepStarted => "STEP_STARTED",
            Self::StepFinished => "STEP_FINISHED",
            Self::TextMessageStart => "TEXT_MESSAGE_START",
            Self::TextMessageContent => "TEXT_MESSAGE_CONTENT",
            Self::TextMessageEnd => "TEXT_MESSAGE_END",
            Self::TextMessageChunk => "TEXT_MESSAGE_CHUNK",
            Self::ToolCallStart => "TOOL_CALL_START",
            Self::ToolCallArgs => "TOOL_CALL_ARGS",
            Self::ToolCallEnd => "TOOL_CALL_END",
            Self::ToolCallChunk => "TOOL_CALL_CHUNK",
            Self::ToolCallResult => "TOOL_CALL_RESULT",
            Self::StateSnapshot => "STATE_SNAPSHOT",
            Self::StateDelta => "STATE_DELTA",
            Self::MessagesSnapshot => "MESSAGES_SNAPSHOT",
            Self::Raw => "RAW",
            Self::Custom => "CUSTOM",
            Self::Other(name) => name,
        }
    }
}

impl From<String> for EventType {
    fn from(name: String) -> Self {
        match name.as_str() {
            "RUN_STARTED" => Self::RunStarted,
            "RUN_FINISHED" => Self::RunFinished,
            "RUN_ERROR" => Self::RunError,
            "STEP_STARTED" => Self::StepStarted,
            "STEP_FINISHED" => Self::StepFinished,
            "TEXT_MESSAGE_START" => Self::TextMessageStart,
            "TEXT_MESSAGE_CONTENT" => Self::TextMessageContent,
            "TEXT_MESSAGE_END" => Self::TextMessageEnd,
            "TEXT_MESSAGE_CHUNK" => Self::TextMessageChunk,
            "TOOL_CALL_START" => Self::ToolCallStart,
            "TOOL_CALL_ARGS" => Self::ToolCallArgs,
            "TOOL_CALL_END" => Self::ToolCallEnd,
            "TOOL_CALL_CHUNK" => Self::ToolCallChunk,
            "TOOL_CALL_RESULT" => Self::ToolCallResult,
            "STATE_SNAPSHOT" => Self::StateSnapshot,
            "STATE_DELTA" => Self::StateDelta,
            "MESSAGES_SNAPSHOT" => Self::MessagesSnapshot,
            "RAW" => Self::Raw,
            "CUSTOM" => Self::Custom,
            _ => Self::Other(name),
        }
    }
}

impl From<EventType> for String {
    fn from(event_type: EventType) -> Self {
        match event_type {
            EventType::Other(name) => name,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One event from the agent stream.
///
/// Only `type` is interpreted. All other fields are carried in `fields` and
/// serialize back out unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BaseEvent {
    /// Event discriminator.
    #[serde(rename = "type")]
    pub event_type: EventType,
    /// Event-specific payload.
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl BaseEvent {
    /// Create an event with no payload fields.
    #[must_use]
    pub fn new(event_type: EventType) -> Self {
        Self {
            event_type,
            fields: Map::new(),
        }
    }

    /// Synthetic `RUN_ERROR` event emitted when a run fails mid-stream.
    #[must_use]
    pub fn run_error(message: impl Into<String>) -> Self {
        Self::new(EventType::RunError).with_field("message", Value::String(message.into()))
    }

    /// Add or replace a payload field.
    #[must_use]
    pub fn with_field(mut self, name: impl Into<String>, value: Value) -> Self {
        self.fields.insert(name.into(), value);
        self
    }

    /// Look up a payload field.
    pub fn field(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    /// The `message` field, present on `RUN_ERROR`.
    pub fn message(&self) -> Option<&str> {
        self.field("message").and_then(Value::as_str)
    }

    /// Whether the server considers the run over after this event.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self.event_type,
            EventType::RunFinished | EventType::RunError
        )
    }
}
