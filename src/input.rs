//! Run request payload sent to the agent backend.
//!
//! The agent client never looks inside a [`RunAgentInput`]; it only hands it
//! to the transport. The shape follows the AG-UI run input so the same
//! payload works against any AG-UI compatible endpoint.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// Role of a message author.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    /// Developer instructions.
    Developer,
    /// System prompt.
    System,
    /// Assistant response.
    Assistant,
    /// User message.
    User,
    /// Tool result.
    Tool,
}

/// A message in the conversation history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    /// Unique message identifier.
    pub id: String,
    /// Role of the author.
    pub role: MessageRole,
    /// Text content.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    /// Tool call this message answers (tool role only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,
    /// Tool calls requested by the assistant.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tool_calls: Vec<Value>,
}

impl Message {
    fn with_role(role: MessageRole, content: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            role,
            content: Some(content.into()),
            tool_call_id: None,
            tool_calls: Vec::new(),
        }
    }

    /// Create a user message.
    #[must_use]
    pub fn user(content: impl Into<String>) -> Self {
        Self::with_role(MessageRole::User, content)
    }

    /// Create a system message.
    #[must_use]
    pub fn system(content: impl Into<String>) -> Self {
        Self::with_role(MessageRole::System, content)
    }

    /// Create a tool result answering `tool_call_id`.
    #[must_use]
    pub fn tool_result(tool_call_id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            tool_call_id: Some(tool_call_id.into()),
            ..Self::with_role(MessageRole::Tool, content)
        }
    }
}

/// A frontend tool the agent may call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tool {
    /// Tool name.
    pub name: String,
    /// Human-readable description.
    pub description: String,
    /// JSON schema of the arguments.
    pub parameters: Value,
}

/// Context entry forwarded to the agent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Context {
    /// What this context describes.
    pub description: String,
    /// Context value.
    pub value: String,
}

/// Payload for one agent run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunAgentInput {
    /// Conversation thread identifier.
    pub thread_id: String,
    /// Identifier of this run.
    pub run_id: String,
    /// Conversation history, oldest first.
    #[serde(default)]
    pub messages: Vec<Message>,
    /// Frontend tools available to the agent.
    #[serde(default)]
    pub tools: Vec<Tool>,
    /// Extra context entries.
    #[serde(default)]
    pub context: Vec<Context>,
    /// Shared agent state.
    #[serde(default)]
    pub state: Value,
    /// Opaque properties passed through to the agent.
    #[serde(default)]
    pub forwarded_props: Value,
}

impl RunAgentInput {
    /// Create an empty run on `thread_id` with a fresh run id.
    #[must_use]
    pub fn new(thread_id: impl Into<String>) -> Self {
        Self {
            thread_id: thread_id.into(),
            run_id: Uuid::new_v4().to_string(),
            messages: Vec::new(),
            tools: Vec::new(),
            context: Vec::new(),
            state: Value::Null,
            forwarded_props: Value::Null,
        }
    }

    /// Start a new thread with a single user message.
    #[must_use]
    pub fn user_message(content: impl Into<String>) -> Self {
        Self::new(Uuid::new_v4().to_string()).with_message(Message::user(content))
    }

    /// Follow-up run on the same thread that submits a tool result.
    #[must_use]
    pub fn tool_result(
        thread_id: impl Into<String>,
        tool_call_id: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        Self::new(thread_id).with_message(Message::tool_result(tool_call_id, content))
    }

    /// Append a message.
    #[must_use]
    pub fn with_message(mut self, message: Message) -> Self {
        self.messages.push(message);
        self
    }

    /// Offer a frontend tool.
    #[must_use]
    pub fn with_tool(mut self, tool: Tool) -> Self {
        self.tools.push(tool);
        self
    }

    /// Add a context entry.
    #[must_use]
    pub fn with_context(mut self, description: impl Into<String>, value: impl Into<String>) -> Self {
        self.context.push(Context {
            description: description.into(),
            value: value.into(),
        });
        self
    }

    /// Set the forwarded props.
    #[must_use]
    pub fn with_forwarded_props(mut self, props: Value) -> Self {
        self.forwarded_props = props;
        self
    }
}
