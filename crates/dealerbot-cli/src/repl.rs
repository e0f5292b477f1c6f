//! Interactive REPL — talk to the sales agent turn by turn.
//!
//! Uses `rustyline` for readline-style editing with persistent history.
//! Ctrl-C while the agent is thinking cancels that turn; Ctrl-C at the
//! prompt exits.

use anyhow::Result;
use std::path::PathBuf;

use rustyline::config::Configurer;
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use dealerbot_agent::{ChatService, TurnReply};
use dealerbot_core::utils::get_history_path;

use crate::helpers;

/// Exit commands (case-insensitive match).
const EXIT_COMMANDS: &[&str] = &["exit", "quit", "/exit", "/quit", ":q"];

/// What a line of input asks for.
#[derive(Debug, PartialEq)]
enum Input<'a> {
    Empty,
    Exit,
    Reset,
    History,
    Message(&'a str),
}

fn classify(line: &str) -> Input<'_> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return Input::Empty;
    }
    let lower = trimmed.to_lowercase();
    if EXIT_COMMANDS.contains(&lower.as_str()) {
        return Input::Exit;
    }
    match lower.as_str() {
        "/reset" => Input::Reset,
        "/history" => Input::History,
        _ => Input::Message(trimmed),
    }
}

/// Run the interactive REPL loop.
pub async fn run(service: &ChatService, session_id: &str) -> Result<()> {
    let agent_name = service.agent().context().agent_name().to_string();
    helpers::print_banner(&agent_name);

    for message in service.open_session(session_id) {
        helpers::print_message(&agent_name, &message);
    }

    let mut prompt = PromptEditor::open(history_file())?;

    loop {
        let line = match prompt.read() {
            Ok(line) => line,
            Err(ReadlineError::Interrupted | ReadlineError::Eof) => break,
            Err(e) => {
                eprintln!("Input error: {e}");
                break;
            }
        };

        match classify(&line) {
            Input::Empty => continue,
            Input::Exit => {
                println!("\nGoodbye! 👋");
                break;
            }
            Input::Reset => {
                println!();
                for message in service.reset(session_id) {
                    helpers::print_message(&agent_name, &message);
                }
            }
            Input::History => helpers::print_history(&agent_name, &service.history(session_id)),
            Input::Message(text) => {
                prompt.remember(text);
                debug!(session = session_id, input = text, "processing input");

                let cancel = CancellationToken::new();
                let reply = run_turn(service, session_id, text, &cancel).await;
                helpers::print_reply(&agent_name, &reply);
            }
        }
    }

    prompt.persist();
    service.close_session(session_id).await;
    Ok(())
}

/// Run one turn with the thinking indicator, cancelling it on Ctrl-C.
pub async fn run_turn(
    service: &ChatService,
    session_id: &str,
    text: &str,
    cancel: &CancellationToken,
) -> TurnReply {
    helpers::print_thinking();

    let turn = service.handle_turn(session_id, text, cancel);
    tokio::pin!(turn);

    let reply = tokio::select! {
        reply = &mut turn => reply,
        _ = tokio::signal::ctrl_c() => {
            cancel.cancel();
            helpers::clear_thinking();
            eprintln!("{}", helpers::dimmed("cancelling..."));
            turn.await
        }
    };

    helpers::clear_thinking();
    reply
}

// ─────────────────────────────────────────────
// Line editor
// ─────────────────────────────────────────────

/// Entries kept in the persisted REPL history.
const HISTORY_LIMIT: usize = 1000;

/// Readline editor bound to the customer's on-disk prompt history.
struct PromptEditor {
    editor: DefaultEditor,
    history_file: PathBuf,
}

impl PromptEditor {
    fn open(history_file: PathBuf) -> Result<Self> {
        let mut editor = DefaultEditor::new()?;
        editor.set_max_history_size(HISTORY_LIMIT)?;
        editor.set_auto_add_history(false);

        match editor.load_history(&history_file) {
            Ok(()) => debug!(path = %history_file.display(), "restored prompt history"),
            Err(ReadlineError::Io(e)) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => debug!(error = %e, "prompt history not restored"),
        }

        Ok(Self {
            editor,
            history_file,
        })
    }

    fn read(&mut self) -> Result<String, ReadlineError> {
        self.editor.readline("You: ")
    }

    fn remember(&mut self, text: &str) {
        let _ = self.editor.add_history_entry(text);
    }

    /// Write history to disk. Failures are logged, never fatal.
    fn persist(&mut self) {
        if let Some(dir) = self.history_file.parent() {
            let _ = std::fs::create_dir_all(dir);
        }
        if let Err(e) = self.editor.save_history(&self.history_file) {
            debug!(error = %e, "prompt history not saved");
        }
    }
}

fn history_file() -> PathBuf {
    get_history_path().join("cli_history")
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
