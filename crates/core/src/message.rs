//! Message and content-block domain types.
//!
//! These are the value objects that flow between the agent loop and the
//! completion provider: a user message goes out, the provider answers with
//! text and tool-use blocks, tool results come back as a user message.

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::tool::ToolResultEnvelope;

/// The role of a message sender in a conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// The end user (tool results are sent under this role too)
    User,
    /// The AI assistant
    Assistant,
}

impl Role {
    /// Parse a persisted role name. Anything other than user/assistant is
    /// not part of the provider conversation.
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "user" => Some(Self::User),
            "assistant" => Some(Self::Assistant),
            _ => None,
        }
    }
}

/// One block of message content.
///
/// Text and tool blocks are typed; any block type the provider adds that we
/// don't model (thinking, citations, ...) is carried through untouched in
/// [`ContentBlock::Raw`] so it can be echoed back verbatim.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Value", into = "Value")]
pub enum ContentBlock {
    Text {
        text: String,
    },
    ToolUse {
        id: String,
        name: String,
        input: Value,
    },
    ToolResult(ToolResultEnvelope),
    Raw(Value),
}

impl ContentBlock {
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text { text: text.into() }
    }

    /// The text of this block, if it is a text block.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text { text } => Some(text),
            _ => None,
        }
    }
}

impl From<ContentBlock> for Value {
    fn from(block: ContentBlock) -> Self {
        match block {
            ContentBlock::Text { text } => json!({ "type": "text", "text": text }),
            ContentBlock::ToolUse { id, name, input } => json!({
                "type": "tool_use",
                "id": id,
                "name": name,
                "input": input,
            }),
            ContentBlock::ToolResult(envelope) => json!({
                "type": "tool_result",
                "tool_use_id": envelope.tool_use_id,
                "content": envelope.content,
                "is_error": envelope.is_error,
            }),
            ContentBlock::Raw(value) => value,
        }
    }
}

impl TryFrom<Value> for ContentBlock {
    type Error = String;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        let kind = value
            .get("type")
            .and_then(Value::as_str)
            .ok_or_else(|| "content block has no \"type\"".to_string())?;

        match kind {
            "text" => {
                let text = value["text"]
                    .as_str()
                    .ok_or_else(|| "text block has no \"text\" string".to_string())?;
                Ok(Self::Text { text: text.to_string() })
            }
            "tool_use" => {
                let id = value["id"]
                    .as_str()
                    .ok_or_else(|| "tool_use block has no \"id\"".to_string())?;
                let name = value["name"]
                    .as_str()
                    .ok_or_else(|| "tool_use block has no \"name\"".to_string())?;
                Ok(Self::ToolUse {
                    id: id.to_string(),
                    name: name.to_string(),
                    input: value.get("input").cloned().unwrap_or_else(|| json!({})),
                })
            }
            "tool_result" => serde_json::from_value::<ToolResultEnvelope>(value)
                .map(Self::ToolResult)
                .map_err(|e| format!("invalid tool_result block: {e}")),
            _ => Ok(Self::Raw(value)),
        }
    }
}

/// A single provider-format message: a role and its ordered content blocks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: Vec<ContentBlock>,
}

impl Message {
    /// A user message carrying a single text block.
    pub fn user_text(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: vec![ContentBlock::text(text)],
        }
    }

    /// An assistant message carrying a single text block.
    pub fn assistant_text(text: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: vec![ContentBlock::text(text)],
        }
    }

    /// An assistant turn built from the provider's content blocks.
    pub fn assistant(content: Vec<ContentBlock>) -> Self {
        Self {
            role: Role::Assistant,
            content,
        }
    }

    /// A user turn delivering tool results back to the provider.
    pub fn tool_results(envelopes: Vec<ToolResultEnvelope>) -> Self {
        Self {
            role: Role::User,
            content: envelopes.into_iter().map(ContentBlock::ToolResult).collect(),
        }
    }

    /// The first text block anywhere in the message.
    pub fn first_text(&self) -> Option<&str> {
        self.content.iter().find_map(ContentBlock::as_text)
    }
}

/// A persisted conversation turn, as the chat front-end stores it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationRecord {
    pub role: String,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
}

impl ConversationRecord {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        let role = match role {
            Role::User => "user",
            Role::Assistant => "assistant",
        };
        Self {
            role: role.into(),
            content: content.into(),
            timestamp: None,
        }
    }

    /// Convert to a provider message with one text block, if the role is one
    /// the provider accepts.
    pub fn to_message(&self) -> Option<Message> {
        Role::parse(&self.role).map(|role| Message {
            role,
            content: vec![ContentBlock::text(self.content.clone())],
        })
    }
}
