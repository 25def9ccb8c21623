//! End-to-end integration tests for the Bashpilot agent pipeline.
//!
//! These tests exercise the full path from user input to final answer:
//! provider round-trips, real `/bin/sh` commands, tool-result envelopes,
//! the session log and the conversation store.

use std::sync::{Arc, Mutex};

use bashpilot_agent::{AbortReason, AgentLoop, ConversationStore, Session, TurnState};
use bashpilot_config::AppConfig;
use bashpilot_core::error::ProviderError;
use bashpilot_core::message::{ContentBlock, ConversationRecord, Role};
use bashpilot_core::provider::{CompletionRequest, CompletionResponse, Provider, StopReason, Usage};
use serde_json::json;

// ── Mock Provider ────────────────────────────────────────────────────────

/// A mock provider that returns scripted responses in sequence.
struct ScriptedProvider {
    responses: Mutex<Vec<CompletionResponse>>,
    requests: Mutex<Vec<CompletionRequest>>,
}

impl ScriptedProvider {
    fn new(responses: Vec<CompletionResponse>) -> Arc<Self> {
        Arc::new(Self {
            responses: Mutex::new(responses),
            requests: Mutex::new(Vec::new()),
        })
    }

    fn bash_then_text(command: &str, answer: &str) -> Arc<Self> {
        Self::new(vec![
            response(
                StopReason::ToolUse,
                vec![
                    ContentBlock::text("Let me run that."),
                    ContentBlock::ToolUse {
                        id: "toolu_e2e".into(),
                        name: "bash".into(),
                        input: json!({ "command": command }),
                    },
                ],
            ),
            response(StopReason::EndTurn, vec![ContentBlock::text(answer)]),
        ])
    }

    fn calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    fn last_tool_result(&self) -> Option<(String, bool)> {
        let requests = self.requests.lock().unwrap();
        let last = requests.last()?.messages.last()?;
        match last.content.first()? {
            ContentBlock::ToolResult(envelope) => Some((envelope.text(), envelope.is_error)),
            _ => None,
        }
    }
}

#[async_trait::async_trait]
impl Provider for ScriptedProvider {
    fn name(&self) -> &str {
        "e2e_mock"
    }

    async fn complete(
        &self,
        request: CompletionRequest,
    ) -> Result<CompletionResponse, ProviderError> {
        self.requests.lock().unwrap().push(request);
        let mut responses = self.responses.lock().unwrap();
        if responses.is_empty() {
            return Err(ProviderError::ApiError {
                status_code: 500,
                message: "no more scripted responses".into(),
            });
        }
        Ok(responses.remove(0))
    }
}

fn response(stop_reason: StopReason, content: Vec<ContentBlock>) -> CompletionResponse {
    CompletionResponse {
        id: "msg_e2e".into(),
        model: "claude-3-5-sonnet-20241022".into(),
        stop_reason,
        content,
        usage: Usage {
            input_tokens: 1000,
            output_tokens: 100,
        },
    }
}

/// A config whose logs and history live under `dir` and whose shell is `/bin/sh`.
fn config(dir: &std::path::Path, dry_run: bool) -> AppConfig {
    let mut config = AppConfig::default();
    config.shell.path = "/bin/sh".into();
    config.logging.sessions_dir = Some(dir.join("sessions"));
    config.history.dir = Some(dir.join("history"));
    config.dry_run = dry_run;
    config
}

// ── Scenarios ────────────────────────────────────────────────────────────

#[tokio::test]
async fn e2e_echo_hi() {
    let dir = tempfile::tempdir().unwrap();
    let config = config(dir.path(), false);
    let provider = ScriptedProvider::bash_then_text("echo hi", "The command printed: hi");
    let agent = AgentLoop::from_config(provider.clone(), &config);
    let mut session = Session::open(&config).unwrap();

    let outcome = agent.run(&mut session, "say hi", &[]).await.unwrap();

    assert_eq!(outcome.state, TurnState::FinalAnswer);
    assert_eq!(outcome.text, "The command printed: hi");
    assert_eq!(provider.calls(), 2);
    assert_eq!(provider.last_tool_result(), Some(("hi".into(), false)));

    // Two calls at 1000 in / 100 out, default rates.
    let summary = session.ledger().summary();
    assert_eq!(summary.input_tokens, 2000);
    assert_eq!(summary.output_tokens, 200);
    assert!((summary.total_cost - 0.009).abs() < 1e-10);

    let log = std::fs::read_to_string(session.log().path().unwrap()).unwrap();
    assert!(log.contains("Executing bash command: echo hi"));
    assert!(log.contains("Total input tokens: 2000"));
    assert!(log.contains("Total cost: $0.009000"));
}

#[tokio::test]
async fn e2e_false_aborts_after_one_round() {
    let dir = tempfile::tempdir().unwrap();
    let config = config(dir.path(), false);
    let provider = ScriptedProvider::bash_then_text("false", "unreachable");
    let agent = AgentLoop::from_config(provider.clone(), &config);
    let mut session = Session::open(&config).unwrap();

    let outcome = agent.run(&mut session, "run false", &[]).await.unwrap();

    assert_eq!(
        outcome.state,
        TurnState::Aborted(AbortReason::ToolFailed {
            errors: vec!["Command execution failed.".into()],
        })
    );
    assert_eq!(outcome.rounds, 1);
    assert_eq!(provider.calls(), 1);

    let last = session.transcript().last().unwrap();
    assert_eq!(last.role, Role::User);
    match &last.content[0] {
        ContentBlock::ToolResult(envelope) => {
            assert!(envelope.is_error);
            assert_eq!(envelope.text(), "Command execution failed.");
        }
        other => panic!("expected tool result, got {other:?}"),
    }

    let log = std::fs::read_to_string(session.log().path().unwrap()).unwrap();
    assert!(log.contains("Error: Command execution failed."));
    assert!(log.contains("Total cost:"));
}

#[tokio::test]
async fn e2e_dry_run_rm_is_never_executed() {
    let dir = tempfile::tempdir().unwrap();
    let victim = dir.path().join("x");
    std::fs::create_dir(&victim).unwrap();
    let command = format!("rm -rf {}", victim.display());

    let config = config(dir.path(), true);
    let provider = ScriptedProvider::bash_then_text(&command, "🔍 Dry Run: that would delete x.");
    let agent = AgentLoop::from_config(provider.clone(), &config);
    let mut session = Session::open(&config).unwrap();

    let outcome = agent.run(&mut session, "delete x", &[]).await.unwrap();

    assert!(outcome.is_final_answer());
    assert!(victim.exists());

    let (text, is_error) = provider.last_tool_result().unwrap();
    assert!(!is_error);
    assert!(text.starts_with("🔍 Dry Run:"));
    assert!(text.contains(&command));

    let requests = provider.requests.lock().unwrap();
    assert_eq!(
        requests[0].messages[0].first_text(),
        Some("[DRY RUN MODE ENABLED] delete x")
    );
}

#[tokio::test]
async fn e2e_conversation_resumes_from_store() {
    let dir = tempfile::tempdir().unwrap();
    let config = config(dir.path(), false);
    let store = ConversationStore::new(config.history_dir());
    let id = ConversationStore::new_id();

    // First turn, persisted the way the chat front-end does it.
    let provider = ScriptedProvider::new(vec![response(
        StopReason::EndTurn,
        vec![ContentBlock::text("Hello there.")],
    )]);
    let agent = AgentLoop::from_config(provider, &config);
    let mut session = Session::open(&config).unwrap();
    let outcome = agent.run(&mut session, "hi", &[]).await.unwrap();

    let mut history = vec![
        ConversationRecord::new(Role::User, "hi"),
        ConversationRecord::new(Role::Assistant, outcome.text),
    ];
    store.save(&id, &mut history).unwrap();

    // Second turn replays the stored history.
    let provider = ScriptedProvider::new(vec![response(
        StopReason::EndTurn,
        vec![ContentBlock::text("Still here.")],
    )]);
    let agent = AgentLoop::from_config(provider.clone(), &config);
    let history = store.load(&id).unwrap();
    agent.run(&mut session, "are you there?", &history).await.unwrap();

    let requests = provider.requests.lock().unwrap();
    let texts: Vec<_> = requests[0]
        .messages
        .iter()
        .map(|m| m.first_text().unwrap_or_default().to_string())
        .collect();
    assert_eq!(texts, vec!["hi", "Hello there.", "are you there?"]);

    let listed = store.list().unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].id, id);
    assert_eq!(listed[0].preview, "hi");
}

#[tokio::test]
async fn e2e_restart_then_command() {
    let dir = tempfile::tempdir().unwrap();
    let config = config(dir.path(), false);
    let provider = ScriptedProvider::new(vec![
        response(
            StopReason::ToolUse,
            vec![ContentBlock::ToolUse {
                id: "toolu_restart".into(),
                name: "bash".into(),
                input: json!({ "restart": true, "command": "exit 1" }),
            }],
        ),
        response(
            StopReason::ToolUse,
            vec![ContentBlock::ToolUse {
                id: "toolu_pwd".into(),
                name: "bash".into(),
                input: json!({ "command": "echo ready" }),
            }],
        ),
        response(StopReason::EndTurn, vec![ContentBlock::text("Restarted and ready.")]),
    ]);
    let agent = AgentLoop::from_config(provider.clone(), &config);
    let mut session = Session::open(&config).unwrap();
    session.environment_mut().set("BASHPILOT_E2E_STALE", "1");

    let outcome = agent.run(&mut session, "restart the shell", &[]).await.unwrap();

    assert_eq!(outcome.text, "Restarted and ready.");
    assert_eq!(outcome.rounds, 3);
    assert_eq!(session.environment().get("BASHPILOT_E2E_STALE"), None);
    assert_eq!(provider.last_tool_result(), Some(("ready".into(), false)));
}
