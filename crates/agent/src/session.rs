//! Per-session state: environment, usage, log and transcript.

use bashpilot_config::AppConfig;
use bashpilot_core::message::Message;
use bashpilot_core::session::{Environment, SessionId};
use bashpilot_core::tool::ToolCallRecord;
use bashpilot_telemetry::{LogRotation, ModelPricing, SessionLog, UsageLedger};
use bashpilot_tools::ToolContext;
use std::io;

/// One agent session.
///
/// Everything a run mutates lives here, so independent sessions share
/// nothing.
#[derive(Debug)]
pub struct Session {
    id: SessionId,
    environment: Environment,
    ledger: UsageLedger,
    log: SessionLog,
    transcript: Vec<Message>,
    dry_run: bool,
    tool_calls: Vec<ToolCallRecord>,
}

impl Session {
    pub fn new(id: SessionId, log: SessionLog, pricing: ModelPricing, dry_run: bool) -> Self {
        Self {
            id,
            environment: Environment::from_process(),
            ledger: UsageLedger::new(pricing),
            log,
            transcript: Vec::new(),
            dry_run,
            tool_calls: Vec::new(),
        }
    }

    /// Start a session with a fresh id, logging under the configured
    /// sessions directory.
    pub fn open(config: &AppConfig) -> io::Result<Self> {
        let id = SessionId::generate();
        let rotation = LogRotation {
            max_bytes: config.logging.max_bytes,
            backup_count: config.logging.backup_count,
        };
        let log = SessionLog::open(&config.sessions_dir(), id.as_str(), rotation)?;
        let pricing = ModelPricing::new(config.pricing.input_per_m, config.pricing.output_per_m);
        Ok(Self::new(id, log, pricing, config.dry_run))
    }

    /// A session that writes no log file.
    pub fn ephemeral(dry_run: bool) -> Self {
        let id = SessionId::generate();
        let log = SessionLog::mirror_only(id.as_str());
        Self::new(id, log, ModelPricing::default(), dry_run)
    }

    pub fn id(&self) -> &SessionId {
        &self.id
    }

    pub fn environment(&self) -> &Environment {
        &self.environment
    }

    pub fn environment_mut(&mut self) -> &mut Environment {
        &mut self.environment
    }

    pub fn ledger(&self) -> &UsageLedger {
        &self.ledger
    }

    pub(crate) fn ledger_mut(&mut self) -> &mut UsageLedger {
        &mut self.ledger
    }

    pub fn log(&self) -> &SessionLog {
        &self.log
    }

    /// The provider conversation of the current run.
    pub fn transcript(&self) -> &[Message] {
        &self.transcript
    }

    pub(crate) fn transcript_mut(&mut self) -> &mut Vec<Message> {
        &mut self.transcript
    }

    pub fn is_dry_run(&self) -> bool {
        self.dry_run
    }

    /// Bash calls of the most recent routing pass.
    pub fn tool_calls(&self) -> &[ToolCallRecord] {
        &self.tool_calls
    }

    pub(crate) fn tool_context(&mut self) -> ToolContext<'_> {
        ToolContext {
            environment: &mut self.environment,
            log: &self.log,
            tool_calls: &mut self.tool_calls,
            dry_run: self.dry_run,
        }
    }
}
