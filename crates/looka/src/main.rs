use anyhow::{Context, Result};
use chrono::Utc;
use std::io::Write;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use uuid::Uuid;

use looka::{
    attachment_from_path, config::Config, transcript, ChatHistory, ChatHistoryBuilder,
    ChatRef, ClientFactory, Command, CompletionsClient, Conversation, Formatter, MemoryStore,
    PersistError, StreamOutcome, TerminalSink, Turn, GREETING,
};
use looka_llm::{mask_key, Attachment};
use looka_render::terminal::stdout_is_rich;

/// Mutable REPL state for one terminal session
struct Session {
    config: Config,
    conversation: Conversation,
    history: ChatHistory,
    pending: Vec<Attachment>,
    listed: Vec<Uuid>,
    rich: bool,
    next_message_id: u64,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file
    dotenvy::dotenv().ok();

    let config = Config::load().context("Failed to load configuration")?;
    init_logging(&config);

    let client = ClientFactory::create_client(&config.llm).context("Failed to create chat client")?;
    let formatter = if config.terminal.external_formatters {
        Formatter::with_external()
    } else {
        Formatter::new()
    };
    let conversation = Conversation::new(client, config.llm.clone())
        .with_catalog(config.catalog())
        .with_formatter(formatter);

    let mut history = open_history(&config);
    match history.cleanup(Utc::now()).await {
        Ok(0) => {}
        Ok(removed) => tracing::info!(removed, "Removed chats older than the retention window"),
        Err(e) => report_store_error("cleanup", &e),
    }

    let mut session = Session {
        rich: config.terminal.rich.unwrap_or_else(stdout_is_rich),
        config,
        conversation,
        history,
        pending: Vec::new(),
        listed: Vec::new(),
        next_message_id: 1,
    };

    println!("Looka: {}", GREETING);
    println!("(/help for commands)");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        prompt(&session.pending);

        let line = tokio::select! {
            line = lines.next_line() => line.context("Failed to read input")?,
            _ = tokio::signal::ctrl_c() => None,
        };
        let Some(line) = line else { break };
        let Some(command) = Command::parse(&line) else { continue };

        if command == Command::Quit {
            break;
        }
        session.run(command).await;
    }

    println!();
    Ok(())
}

impl Session {
    async fn run(&mut self, command: Command) {
        match command {
            Command::Message(text) => self.send(&text).await,
            Command::New => {
                self.conversation.reset();
                self.history.new_chat();
                self.pending.clear();
                println!("Looka: {}", GREETING);
            }
            Command::History => self.list_history().await,
            Command::Open(chat) => self.open(chat).await,
            Command::Delete(chat) => self.delete(chat).await,
            Command::Save(path) => {
                let text = transcript::export(self.conversation.messages());
                match tokio::fs::write(&path, text).await {
                    Ok(()) => println!("Saved transcript to {}", path.display()),
                    Err(e) => eprintln!("Could not save {}: {}", path.display(), e),
                }
            }
            Command::Attach(path) => {
                if !self.conversation.capabilities().attachments {
                    eprintln!("{} does not accept attachments", self.config.llm.model);
                    return;
                }
                match attachment_from_path(&path).await {
                    Ok(attachment) => {
                        println!("Attached {}", attachment.listing());
                        self.pending.push(attachment);
                    }
                    Err(e) => eprintln!("{:#}", e),
                }
            }
            Command::Probe => self.probe().await,
            Command::Help => println!("{}", looka::commands::HELP),
            Command::Invalid(hint) => eprintln!("{}", hint),
            Command::Quit => {}
        }
    }

    async fn send(&mut self, text: &str) {
        let message_id = self.next_message_id;
        self.next_message_id += 1;

        let mut sink = TerminalSink::new(std::io::stdout(), self.rich).with_message_id(message_id);
        let cancel = CancellationToken::new();
        let watcher = tokio::spawn({
            let cancel = cancel.clone();
            async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    cancel.cancel();
                }
            }
        });

        println!("Looka:");
        let attachments = std::mem::take(&mut self.pending);
        let turn = self
            .conversation
            .send(text, attachments, &mut sink, &cancel)
            .await;
        watcher.abort();

        if let Some(Turn::Replied(StreamOutcome::Interrupted { error, .. })) = &turn {
            eprintln!("(connection lost: {})", error);
        }

        if let Err(e) = self
            .history
            .save(self.conversation.messages(), Utc::now())
            .await
        {
            report_store_error("save", &e);
        }
    }

    async fn list_history(&mut self) {
        let records = match self.history.list_recent().await {
            Ok(records) => records,
            Err(e) => {
                report_store_error("history", &e);
                return;
            }
        };

        if records.is_empty() {
            println!("No saved chats yet.");
        }

        let now = Utc::now();
        for (i, record) in records.iter().enumerate() {
            let marker = if self.history.current() == Some(record.id) { "*" } else { " " };
            println!(
                "{}{:>3}. {}  ({}, {} messages)",
                marker,
                i + 1,
                record.title,
                looka::time_ago(record.updated_at, now),
                record.messages.len()
            );
        }
        self.listed = records.into_iter().map(|r| r.id).collect();
    }

    async fn open(&mut self, chat: ChatRef) {
        let Some(id) = chat.resolve(&self.listed) else {
            eprintln!("No such chat; run /history first");
            return;
        };

        match self.history.open(id).await {
            Ok(Some(record)) => {
                self.conversation.load(record.messages);
                self.pending.clear();
                println!("Opened \"{}\"", record.title);
                println!("{}", transcript::export(self.conversation.messages()));
            }
            Ok(None) => eprintln!("Chat {} not found", id),
            Err(e) => report_store_error("open", &e),
        }
    }

    async fn delete(&mut self, chat: ChatRef) {
        let Some(id) = chat.resolve(&self.listed) else {
            eprintln!("No such chat; run /history first");
            return;
        };

        match self.history.delete(id).await {
            Ok(was_current) => {
                self.listed.retain(|listed| *listed != id);
                if was_current {
                    self.conversation.reset();
                    println!("Deleted the open chat; starting a new one.");
                } else {
                    println!("Deleted.");
                }
            }
            Err(e) => report_store_error("delete", &e),
        }
    }

    async fn probe(&self) {
        let client = match CompletionsClient::from_settings(&self.config.llm) {
            Ok(client) => client,
            Err(e) => {
                eprintln!("Probe failed: {}", e);
                return;
            }
        };

        println!(
            "Endpoint: {} (key {})",
            client.endpoint().completions_url(),
            mask_key(client.endpoint().api_key())
        );
        match client.probe(&self.config.llm.model).await {
            Ok(result) => println!("Status {}: {}", result.status, result.body),
            Err(e) => eprintln!("Probe failed: {}", e),
        }
    }
}

fn open_history(config: &Config) -> ChatHistory {
    if config.has_remote_store() {
        match ChatHistoryBuilder::new().supabase(config.supabase.clone()).build() {
            Ok(history) => return history,
            Err(e) => tracing::warn!("Chat history stays in memory: {}", e),
        }
    }

    ChatHistory::new(Arc::new(MemoryStore::new()))
}

fn report_store_error(action: &str, error: &PersistError) {
    tracing::warn!(action, %error, "Chat store request failed");
    if error.is_table_missing() {
        eprintln!("{}", error);
    } else {
        eprintln!("Chat history unavailable ({}): {}", action, error);
    }
}

fn prompt(pending: &[Attachment]) {
    if pending.is_empty() {
        print!("\n> ");
    } else {
        print!("\n[{} attached] > ", pending.len());
    }
    flush();
}

fn flush() {
    if let Err(e) = std::io::stdout().flush() {
        tracing::debug!(error = %e, "stdout flush failed");
    }
}

fn init_logging(config: &Config) {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log.level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let registry = tracing_subscriber::registry().with(env_filter);

    match config.log.format.as_str() {
        "json" => {
            registry
                .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
                .init();
        }
        _ => {
            registry
                .with(tracing_subscriber::fmt::layer().pretty().with_writer(std::io::stderr))
                .init();
        }
    }
}
