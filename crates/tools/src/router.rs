//! Routes the tool_use blocks of one assistant response to the executor.

use bashpilot_core::message::ContentBlock;
use bashpilot_core::session::Environment;
use bashpilot_core::tool::{
    Capability, ToolCallRecord, ToolInvocation, ToolOutcome, ToolResultEnvelope,
};
use bashpilot_telemetry::SessionLog;
use tracing::debug;

use crate::executor::BashExecutor;
use crate::BASH_LOG_PREFIX;

/// The per-session state a routing pass reads and mutates.
pub struct ToolContext<'a> {
    pub environment: &'a mut Environment,
    pub log: &'a SessionLog,
    /// Cleared at the start of every pass, then holds this pass's bash calls.
    pub tool_calls: &'a mut Vec<ToolCallRecord>,
    pub dry_run: bool,
}

/// One routed invocation and the envelope to send back for it.
#[derive(Debug, Clone, PartialEq)]
pub struct RoutedResult {
    pub invocation_id: String,
    pub envelope: ToolResultEnvelope,
    /// The capability is unknown and nothing ran. The envelope is an error
    /// the provider can read, not a failed command.
    pub skipped: bool,
}

impl RoutedResult {
    pub fn is_error(&self) -> bool {
        self.envelope.is_error
    }

    /// An executed invocation that failed.
    pub fn is_failure(&self) -> bool {
        self.is_error() && !self.skipped
    }
}

/// Dispatches invocations by capability.
#[derive(Debug, Clone)]
pub struct ToolCallRouter {
    executor: BashExecutor,
}

impl ToolCallRouter {
    pub fn new(executor: BashExecutor) -> Self {
        Self { executor }
    }

    /// Answer every invocation in `blocks`, strictly in order.
    ///
    /// Each `tool_use` block yields exactly one result. Bash calls run;
    /// unknown capabilities are answered with a skipped error envelope.
    /// Non-tool blocks are ignored.
    pub async fn route(
        &self,
        blocks: &[ContentBlock],
        ctx: &mut ToolContext<'_>,
    ) -> Vec<RoutedResult> {
        ctx.tool_calls.clear();
        let log = ctx.log.scoped(BASH_LOG_PREFIX);
        let mut results = Vec::new();

        for invocation in blocks.iter().filter_map(ToolInvocation::from_block) {
            match &invocation.capability {
                Capability::Bash => {
                    log.info(format!("Bash tool call input: {}", invocation.input));
                    let input = invocation.bash_input();
                    ctx.tool_calls.push(ToolCallRecord {
                        id: invocation.id.clone(),
                        command: input.command.clone().unwrap_or_default(),
                    });

                    let outcome = self
                        .executor
                        .execute(&input, &mut *ctx.environment, ctx.log, ctx.dry_run)
                        .await;
                    results.push(RoutedResult {
                        envelope: ToolResultEnvelope::from_outcome(&invocation.id, &outcome),
                        invocation_id: invocation.id,
                        skipped: false,
                    });
                }
                Capability::Unknown(name) => {
                    debug!(tool = %name, id = %invocation.id, "Skipping unknown capability");
                    let outcome = ToolOutcome::Error(format!("Unknown tool: {name}"));
                    results.push(RoutedResult {
                        envelope: ToolResultEnvelope::from_outcome(&invocation.id, &outcome),
                        invocation_id: invocation.id,
                        skipped: true,
                    });
                }
            }
        }

        results
    }
}
