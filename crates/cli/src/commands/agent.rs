//! `bashpilot chat` / `bashpilot ask`: talk to the assistant.

use bashpilot_agent::{AgentLoop, ConversationStore, Session, TurnOutcome};
use bashpilot_config::AppConfig;
use bashpilot_core::message::{ConversationRecord, Role};
use bashpilot_providers::AnthropicProvider;
use std::io::Write;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::info;

type CliResult<T> = Result<T, Box<dyn std::error::Error>>;

/// Everything one chat needs between turns.
struct Chat {
    agent: AgentLoop,
    session: Session,
    store: ConversationStore,
    conversation_id: String,
    history: Vec<ConversationRecord>,
}

impl Chat {
    fn open(conversation: Option<String>, dry_run: bool) -> CliResult<Self> {
        let mut config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;
        if dry_run {
            config.dry_run = true;
        }

        // Check for API key early, with a clear error
        let Some(api_key) = config.api_key.clone() else {
            eprintln!();
            eprintln!("  ERROR: No API key configured!");
            eprintln!();
            eprintln!("  Set the environment variable (or put it in a .env file):");
            eprintln!("    export ANTHROPIC_API_KEY='sk-ant-...'");
            eprintln!();
            eprintln!("  Or add it to your config file:");
            eprintln!("    {}", AppConfig::config_dir().join("config.toml").display());
            eprintln!();
            return Err("No API key found. See above for setup instructions.".into());
        };

        let mut provider = AnthropicProvider::new(api_key)?.with_timeout(config.provider_timeout())?;
        if let Some(url) = &config.api_url {
            provider = provider.with_base_url(url);
        }

        let agent = AgentLoop::from_config(Arc::new(provider), &config);
        let session = Session::open(&config)
            .map_err(|e| format!("Failed to open session log: {e}"))?;
        let store = ConversationStore::new(config.history_dir());

        let (conversation_id, history) = match conversation {
            Some(id) => {
                let history = store.load(&id)?;
                info!(conversation = %id, records = history.len(), "Resumed conversation");
                (id, history)
            }
            None => (ConversationStore::new_id(), Vec::new()),
        };

        Ok(Self {
            agent,
            session,
            store,
            conversation_id,
            history,
        })
    }

    /// Run one message, persist the exchange and return the reply.
    ///
    /// Ctrl+C during the turn stops it at the next round boundary.
    async fn turn(&mut self, message: &str) -> CliResult<String> {
        let token = self.agent.reset_cancellation();
        let watcher = tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                token.cancel();
            }
        });

        let result = self
            .agent
            .run(&mut self.session, message, &self.history)
            .await;
        watcher.abort();
        let outcome = result?;

        let reply = render(&outcome);
        self.history.push(ConversationRecord::new(Role::User, message));
        self.history.push(ConversationRecord::new(Role::Assistant, reply.clone()));
        self.store.save(&self.conversation_id, &mut self.history)?;
        Ok(reply)
    }
}

/// The reply as shown to the user: executed commands first, then the text.
pub fn render(outcome: &TurnOutcome) -> String {
    if outcome.tool_calls.is_empty() {
        return outcome.text.clone();
    }

    let mut text = String::from("🔧 Commands executed:\n");
    for call in &outcome.tool_calls {
        text.push_str(&format!("```bash\n{}\n```\n", call.command));
    }
    text.push('\n');
    text.push_str(&outcome.text);
    text
}

pub async fn ask(message: String, conversation: Option<String>, dry_run: bool) -> CliResult<()> {
    let mut chat = Chat::open(conversation, dry_run)?;

    eprint!("  Thinking...");
    let reply = chat.turn(&message).await;
    eprint!("\r              \r");
    println!("{}", reply?);
    eprintln!("  Conversation: {}", chat.conversation_id);
    Ok(())
}

pub async fn chat(conversation: Option<String>, dry_run: bool) -> CliResult<()> {
    let mut chat = Chat::open(conversation, dry_run)?;

    println!();
    println!("  ╔══════════════════════════════════════════════╗");
    println!("  ║         Bashpilot · Interactive Mode         ║");
    println!("  ╚══════════════════════════════════════════════╝");
    println!();
    println!("  Session:       {}", chat.session.id());
    println!("  Conversation:  {}", chat.conversation_id);
    println!("  Dry run:       {}", if chat.session.is_dry_run() { "on" } else { "off" });
    if !chat.history.is_empty() {
        println!("  Resumed:       {} earlier messages", chat.history.len());
    }
    println!();
    println!("  Type your message and press Enter.");
    println!("  Type 'exit' or Ctrl+C to quit.");
    println!();

    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        print!("  You > ");
        std::io::stdout().flush()?;

        let line = tokio::select! {
            line = lines.next_line() => line?,
            _ = tokio::signal::ctrl_c() => None,
        };
        let Some(line) = line else {
            break; // EOF (Ctrl+D) or Ctrl+C
        };

        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if matches!(line, "exit" | "quit" | "/exit" | "/quit" | ":q") {
            break;
        }

        eprint!("  ...");
        match chat.turn(line).await {
            Ok(reply) => {
                eprint!("\r     \r");
                println!();
                for line in reply.lines() {
                    println!("  Assistant > {line}");
                }
                println!();
            }
            Err(e) => {
                eprint!("\r     \r");
                eprintln!("  [Error] {e}");
                println!();
            }
        }
    }

    println!();
    println!("  Conversation saved as {}", chat.conversation_id);
    println!("  Goodbye! 👋");
    println!();
    Ok(())
}
