//! Tool execution for Bashpilot.
//!
//! The provider can request one capability, `bash`. The [`ToolCallRouter`]
//! walks the `tool_use` blocks of a response in order, hands bash calls to
//! the [`BashExecutor`], and wraps every outcome in a `tool_result`
//! envelope. Neither ever returns an error: failures become error envelopes
//! the provider can read.

pub mod executor;
pub mod router;

pub use executor::{BashExecutor, DRY_RUN_MARKER};
pub use router::{RoutedResult, ToolCallRouter, ToolContext};

/// Log prefix for everything the shell tool records.
pub const BASH_LOG_PREFIX: &str = "🐚 bash";
