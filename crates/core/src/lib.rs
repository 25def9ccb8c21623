//! # Bashpilot Core
//!
//! Domain types, traits, and error definitions for the Bashpilot shell agent.
//! This crate does **no I/O of its own**. It defines the vocabulary
//! that the provider, tool, telemetry and agent crates speak.
//!
//! ## Layout
//!
//! - [`message`]: conversation messages and their content blocks
//! - [`provider`]: the completion provider trait and its request/response
//! - [`tool`]: tool invocations, outcomes and the result envelope
//! - [`session`]: session identity and the per-session environment snapshot

pub mod error;
pub mod message;
pub mod provider;
pub mod session;
pub mod tool;

// Re-export key types at crate root for ergonomics
pub use error::{ProviderError, ToolError};
pub use message::{ContentBlock, ConversationRecord, Message, Role};
pub use provider::{CompletionRequest, CompletionResponse, Provider, StopReason, ToolSpec, Usage};
pub use session::{Environment, SessionId};
pub use tool::{
    BashInput, Capability, ToolCallRecord, ToolInvocation, ToolOutcome, ToolResultEnvelope,
};
