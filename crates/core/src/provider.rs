//! Provider trait: the abstraction over the completion backend.
//!
//! A Provider takes the whole conversation, the system prompt and the tool
//! manifest, and answers with content blocks plus a stop reason. The agent
//! loop never sees vendor wire formats.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::ProviderError;
use crate::message::{ContentBlock, Message};

/// A tool declared to the provider.
///
/// The shell capability is a provider-defined tool, so it is declared by
/// type and name only (no JSON schema).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolSpec {
    #[serde(rename = "type")]
    pub kind: String,
    pub name: String,
}

impl ToolSpec {
    /// The `bash` tool manifest entry.
    pub fn bash() -> Self {
        Self {
            kind: "bash_20241022".into(),
            name: crate::tool::BASH_TOOL_NAME.into(),
        }
    }
}

/// One completion request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionRequest {
    /// The model to use (e.g., "claude-3-5-sonnet-20241022")
    pub model: String,

    /// Maximum output tokens
    pub max_tokens: u32,

    /// System prompt
    pub system: String,

    /// The ordered conversation
    pub messages: Vec<Message>,

    /// Tool manifest
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tools: Vec<ToolSpec>,

    /// Provider feature flags
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub betas: Vec<String>,
}

/// Why the provider stopped generating.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    EndTurn,
    ToolUse,
    MaxTokens,
    StopSequence,
    #[serde(other)]
    Other,
}

impl StopReason {
    pub fn is_tool_use(self) -> bool {
        self == Self::ToolUse
    }
}

/// Token usage reported for one call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Usage {
    #[serde(default)]
    pub input_tokens: u64,
    #[serde(default)]
    pub output_tokens: u64,
}

/// A complete response from a provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionResponse {
    pub id: String,

    /// Which model actually responded
    pub model: String,

    pub stop_reason: StopReason,

    /// Ordered content blocks (text, tool_use, or anything else verbatim)
    pub content: Vec<ContentBlock>,

    pub usage: Usage,
}

/// The completion provider.
///
/// The agent loop calls `complete()` once per round without knowing which
/// backend answers.
#[async_trait]
pub trait Provider: Send + Sync {
    /// A human-readable name for this provider (e.g., "anthropic").
    fn name(&self) -> &str;

    /// Send a request and get a complete response.
    async fn complete(
        &self,
        request: CompletionRequest,
    ) -> std::result::Result<CompletionResponse, ProviderError>;
}
