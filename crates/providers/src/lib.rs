//! Completion provider implementations for Bashpilot.
//!
//! All providers implement the `bashpilot_core::Provider` trait.

pub mod anthropic;

pub use anthropic::AnthropicProvider;
