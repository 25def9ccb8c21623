//! Tool invocation types: what the provider asks for and what goes back.
//!
//! The provider names a capability in each `tool_use` block. Capabilities are
//! a closed set; anything unrecognised lands in [`Capability::Unknown`] and is
//! ignored by the router rather than failing the round.

use serde::{Deserialize, Serialize};

use crate::message::ContentBlock;

/// Name of the shell capability as declared in the tool manifest.
pub const BASH_TOOL_NAME: &str = "bash";

/// A capability the provider may invoke.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Capability {
    /// Run a shell command.
    Bash,
    /// A capability this build doesn't know about.
    Unknown(String),
}

impl Capability {
    pub fn from_name(name: &str) -> Self {
        match name {
            BASH_TOOL_NAME => Self::Bash,
            other => Self::Unknown(other.to_string()),
        }
    }
}

/// Input payload of a bash invocation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BashInput {
    #[serde(default)]
    pub command: Option<String>,
    #[serde(default)]
    pub restart: bool,
}

impl BashInput {
    pub fn command(command: impl Into<String>) -> Self {
        Self {
            command: Some(command.into()),
            restart: false,
        }
    }

    pub fn restart() -> Self {
        Self {
            command: None,
            restart: true,
        }
    }
}

/// A provider-issued request to perform a capability.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolInvocation {
    /// Opaque id assigned by the provider.
    pub id: String,
    pub capability: Capability,
    pub input: serde_json::Value,
}

impl ToolInvocation {
    /// Extract an invocation from a `tool_use` content block.
    pub fn from_block(block: &ContentBlock) -> Option<Self> {
        match block {
            ContentBlock::ToolUse { id, name, input } => Some(Self {
                id: id.clone(),
                capability: Capability::from_name(name),
                input: input.clone(),
            }),
            _ => None,
        }
    }

    /// Decode the input as a bash payload.
    ///
    /// A payload that doesn't fit the schema (e.g. a non-string command)
    /// decodes as an empty input, which the executor reports as a missing
    /// command.
    pub fn bash_input(&self) -> BashInput {
        serde_json::from_value(self.input.clone()).unwrap_or_default()
    }
}

/// The result of running one invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToolOutcome {
    Content(String),
    Error(String),
}

impl ToolOutcome {
    pub fn is_error(&self) -> bool {
        matches!(self, Self::Error(_))
    }

    pub fn text(&self) -> &str {
        match self {
            Self::Content(text) | Self::Error(text) => text,
        }
    }
}

/// A single text part inside a tool result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ResultContent {
    Text { text: String },
}

/// The `tool_result` block sent back to the provider.
///
/// Serialized inside a [`ContentBlock`], which adds `"type": "tool_result"`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolResultEnvelope {
    pub tool_use_id: String,
    pub content: Vec<ResultContent>,
    #[serde(default)]
    pub is_error: bool,
}

impl ToolResultEnvelope {
    pub fn from_outcome(tool_use_id: impl Into<String>, outcome: &ToolOutcome) -> Self {
        Self {
            tool_use_id: tool_use_id.into(),
            content: vec![ResultContent::Text {
                text: outcome.text().to_string(),
            }],
            is_error: outcome.is_error(),
        }
    }

    /// All text parts joined by newlines.
    pub fn text(&self) -> String {
        self.content
            .iter()
            .map(|ResultContent::Text { text }| text.as_str())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// A bash call made during the current routing pass, kept for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolCallRecord {
    pub id: String,
    pub command: String,
}
