//! The agent loop: the heart of Bashpilot.
//!
//! A run follows a **request → execute → feed back** cycle:
//!
//! 1. **Receive** a user message plus the persisted conversation so far
//! 2. **Send** the transcript, system prompt and `bash` tool to the provider
//! 3. **If tool use**: run every bash call, append the results, go back to 2
//! 4. **If text**: return it as the final answer
//!
//! A failing command, the round ceiling, or cancellation stops the run early.
//! Every run leaves its usage and cost in the session log.

pub mod error;
pub mod loop_runner;
pub mod prompt;
pub mod session;
pub mod store;

pub use error::AgentError;
pub use loop_runner::{AbortReason, AgentLoop, TurnOutcome, TurnState};
pub use prompt::{DEFAULT_SYSTEM_PROMPT, DRY_RUN_TAG};
pub use session::Session;
pub use store::{ConversationStore, ConversationSummary, StoreError};
