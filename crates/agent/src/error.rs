//! Agent loop errors.

use bashpilot_core::error::ProviderError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AgentError {
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    /// The provider ended its turn without any text to show.
    #[error("Malformed response: {0}")]
    MalformedResponse(String),
}

pub type Result<T> = std::result::Result<T, AgentError>;
