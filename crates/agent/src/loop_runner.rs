//! The agent reasoning loop implementation.

use bashpilot_config::AppConfig;
use bashpilot_core::error::ProviderError;
use bashpilot_core::message::{ContentBlock, ConversationRecord, Message};
use bashpilot_core::provider::{CompletionRequest, Provider, ToolSpec};
use bashpilot_core::tool::ToolCallRecord;
use bashpilot_tools::{BashExecutor, ToolCallRouter};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::error::{AgentError, Result};
use crate::prompt::{self, DEFAULT_SYSTEM_PROMPT};
use crate::session::Session;

const AGENT_LOG_PREFIX: &str = "🤖 agent";
const SESSION_LOG_PREFIX: &str = "📊 session";
const COMPUTER_USE_BETA: &str = "computer-use-2024-10-22";

/// Why a run stopped without a final answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AbortReason {
    /// At least one tool invocation of the last round failed.
    ToolFailed { errors: Vec<String> },
    /// The round ceiling was reached.
    RoundLimit { rounds: u32 },
    Cancelled,
}

impl std::fmt::Display for AbortReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ToolFailed { errors } => write!(f, "Tool execution failed: {}", errors.join("; ")),
            Self::RoundLimit { rounds } => write!(
                f,
                "Stopped after {rounds} rounds without a final answer. Please provide further guidance."
            ),
            Self::Cancelled => write!(f, "Cancelled."),
        }
    }
}

/// Terminal state of a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TurnState {
    FinalAnswer,
    Aborted(AbortReason),
}

/// What a run produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TurnOutcome {
    /// The final answer, or a readable abort reason.
    pub text: String,
    pub state: TurnState,
    /// Provider calls made.
    pub rounds: u32,
    /// Bash calls of the last round that executed tools.
    pub tool_calls: Vec<ToolCallRecord>,
}

impl TurnOutcome {
    pub fn is_final_answer(&self) -> bool {
        self.state == TurnState::FinalAnswer
    }
}

/// Drives one user message to a final answer, executing the bash calls the
/// provider asks for along the way.
pub struct AgentLoop {
    /// The completion provider to use
    provider: Arc<dyn Provider>,

    /// Dispatches tool_use blocks
    router: ToolCallRouter,

    /// The model to use
    model: String,

    /// Max output tokens per provider call
    max_tokens: u32,

    system_prompt: String,

    /// Provider feature flags
    betas: Vec<String>,

    /// Tool manifest declared on every call
    tools: Vec<ToolSpec>,

    /// Maximum provider calls per run
    max_rounds: u32,

    provider_timeout: Duration,

    cancel: CancellationToken,
}

impl AgentLoop {
    /// Create a new agent loop.
    pub fn new(
        provider: Arc<dyn Provider>,
        router: ToolCallRouter,
        model: impl Into<String>,
    ) -> Self {
        Self {
            provider,
            router,
            model: model.into(),
            max_tokens: 4096,
            system_prompt: DEFAULT_SYSTEM_PROMPT.into(),
            betas: vec![COMPUTER_USE_BETA.into()],
            tools: vec![ToolSpec::bash()],
            max_rounds: 25,
            provider_timeout: Duration::from_secs(300),
            cancel: CancellationToken::new(),
        }
    }

    /// Build a loop with every knob taken from `config`.
    pub fn from_config(provider: Arc<dyn Provider>, config: &AppConfig) -> Self {
        let executor =
            BashExecutor::new(config.shell.path.clone()).with_timeout(config.command_timeout());
        let mut agent = Self::new(provider, ToolCallRouter::new(executor), config.model.clone())
            .with_max_tokens(config.max_tokens)
            .with_max_rounds(config.agent.max_rounds)
            .with_provider_timeout(config.provider_timeout());
        if let Some(prompt) = &config.system_prompt {
            agent = agent.with_system_prompt(prompt.clone());
        }
        agent
    }

    pub fn with_max_tokens(mut self, max: u32) -> Self {
        self.max_tokens = max;
        self
    }

    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = prompt.into();
        self
    }

    /// Set the maximum number of provider calls per run.
    pub fn with_max_rounds(mut self, max: u32) -> Self {
        self.max_rounds = max;
        self
    }

    pub fn with_provider_timeout(mut self, timeout: Duration) -> Self {
        self.provider_timeout = timeout;
        self
    }

    /// A handle that stops the current run at the next round boundary.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Replace a spent token with a fresh one and return a handle to it.
    pub fn reset_cancellation(&mut self) -> CancellationToken {
        self.cancel = CancellationToken::new();
        self.cancel.clone()
    }

    /// Run one user message to completion.
    ///
    /// `history` is the persisted conversation so far; records whose role is
    /// neither user nor assistant are dropped. The session transcript is
    /// replaced by this run's conversation. The cost summary is written to
    /// the session log however the run ends.
    pub async fn run(
        &self,
        session: &mut Session,
        user_message: &str,
        history: &[ConversationRecord],
    ) -> Result<TurnOutcome> {
        let result = self.drive(session, user_message, history).await;

        let log = session.log().scoped(SESSION_LOG_PREFIX);
        if let Err(e) = &result {
            log.error(format!("Error in agent loop: {e}"));
            log.error(format!("Details: {e:?}"));
        }
        for line in session.ledger().summary().log_lines() {
            log.info(line);
        }

        result
    }

    async fn drive(
        &self,
        session: &mut Session,
        user_message: &str,
        history: &[ConversationRecord],
    ) -> Result<TurnOutcome> {
        let mut messages: Vec<Message> = history
            .iter()
            .filter_map(ConversationRecord::to_message)
            .collect();
        messages.push(Message::user_text(prompt::tag_user_message(
            user_message,
            session.is_dry_run(),
        )));
        *session.transcript_mut() = messages;
        session.tool_context().tool_calls.clear();

        info!(
            session = %session.id(),
            history = history.len(),
            dry_run = session.is_dry_run(),
            "Processing user message"
        );
        if let Some(last) = session.transcript().last() {
            session
                .log()
                .scoped(AGENT_LOG_PREFIX)
                .info(format!("User input: {}", to_json(last)));
        }

        let mut rounds = 0;
        loop {
            if self.cancel.is_cancelled() {
                return Ok(Self::aborted(session, AbortReason::Cancelled, rounds));
            }
            if rounds >= self.max_rounds {
                return Ok(Self::aborted(session, AbortReason::RoundLimit { rounds }, rounds));
            }
            rounds += 1;

            debug!(session = %session.id(), round = rounds, "Agent loop round");

            let request = CompletionRequest {
                model: self.model.clone(),
                max_tokens: self.max_tokens,
                system: self.system_prompt.clone(),
                messages: session.transcript().to_vec(),
                tools: self.tools.clone(),
                betas: self.betas.clone(),
            };

            let response = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => {
                    return Ok(Self::aborted(session, AbortReason::Cancelled, rounds));
                }
                result = tokio::time::timeout(self.provider_timeout, self.provider.complete(request)) => {
                    match result {
                        Ok(response) => response?,
                        Err(_) => {
                            return Err(ProviderError::Timeout(format!(
                                "{} gave no response within {}s",
                                self.provider.name(),
                                self.provider_timeout.as_secs()
                            ))
                            .into());
                        }
                    }
                }
            };

            session
                .ledger_mut()
                .add(response.usage.input_tokens, response.usage.output_tokens);
            {
                let log = session.log().scoped(AGENT_LOG_PREFIX);
                log.info(format!(
                    "API usage: input_tokens={}, output_tokens={}",
                    response.usage.input_tokens, response.usage.output_tokens
                ));
                log.info(format!("API response: {}", to_json(&response)));
            }

            session
                .transcript_mut()
                .push(Message::assistant(response.content.clone()));

            if !response.stop_reason.is_tool_use() {
                let Some(text) = response.content.iter().find_map(ContentBlock::as_text) else {
                    return Err(AgentError::MalformedResponse(format!(
                        "response {} ended its turn ({:?}) without a text block",
                        response.id, response.stop_reason
                    )));
                };
                session
                    .log()
                    .scoped(AGENT_LOG_PREFIX)
                    .info(format!("Final response: {text}"));
                return Ok(TurnOutcome {
                    text: text.to_string(),
                    state: TurnState::FinalAnswer,
                    rounds,
                    tool_calls: session.tool_calls().to_vec(),
                });
            }

            let results = self
                .router
                .route(&response.content, &mut session.tool_context())
                .await;

            if results.is_empty() {
                session
                    .log()
                    .scoped(AGENT_LOG_PREFIX)
                    .warn("Provider signaled tool use but sent no tool_use blocks");
                continue;
            }

            let errors: Vec<String> = results
                .iter()
                .filter(|r| r.is_failure())
                .map(|r| r.envelope.text())
                .collect();
            session.transcript_mut().push(Message::tool_results(
                results.into_iter().map(|r| r.envelope).collect(),
            ));

            if !errors.is_empty() {
                let log = session.log().scoped(AGENT_LOG_PREFIX);
                for error in &errors {
                    log.error(format!("Error: {error}"));
                }
                return Ok(Self::aborted(session, AbortReason::ToolFailed { errors }, rounds));
            }
        }
    }

    fn aborted(session: &Session, reason: AbortReason, rounds: u32) -> TurnOutcome {
        warn!(session = %session.id(), rounds, reason = %reason, "Run aborted");
        session
            .log()
            .scoped(AGENT_LOG_PREFIX)
            .warn(format!("Run aborted: {reason}"));
        TurnOutcome {
            text: reason.to_string(),
            state: TurnState::Aborted(reason),
            rounds,
            tool_calls: session.tool_calls().to_vec(),
        }
    }
}

fn to_json(value: &impl serde::Serialize) -> String {
    serde_json::to_string(value).unwrap_or_else(|e| format!("<unserializable: {e}>"))
}
