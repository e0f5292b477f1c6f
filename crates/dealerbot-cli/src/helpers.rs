//! Shared CLI helpers — printing replies, history, banner, and warnings.

use colored::Colorize;

use dealerbot_agent::TurnReply;
use dealerbot_core::types::{Message, Role};

/// Print the agent's reply to a turn. Failed turns are shown in red.
pub fn print_reply(agent_name: &str, reply: &TurnReply) {
    println!();
    println!("{}", format!("🚗 {agent_name}").cyan().bold());
    if reply.is_error() {
        println!("{}", reply.text.red());
    } else if reply.text.is_empty() {
        println!("{}", "(no response)".dimmed());
    } else {
        println!("{}", reply.text);
    }
    println!();
}

/// Print one stored message.
pub fn print_message(agent_name: &str, message: &Message) {
    println!("{}", speaker_label(agent_name, message.role));
    println!("{}", message.content);
    println!();
}

/// Print a whole conversation, oldest first.
pub fn print_history(agent_name: &str, messages: &[Message]) {
    println!();
    if messages.is_empty() {
        println!("{}", "(no messages yet)".dimmed());
        println!();
        return;
    }
    for message in messages {
        print_message(agent_name, message);
    }
}

fn speaker_label(agent_name: &str, role: Role) -> String {
    match role {
        Role::User => "You".green().bold().to_string(),
        Role::Assistant => format!("🚗 {agent_name}").cyan().bold().to_string(),
    }
}

/// Print the banner shown at REPL start.
pub fn print_banner(agent_name: &str) {
    let version = env!("CARGO_PKG_VERSION");
    println!();
    println!(
        "{}  v{}",
        "🚗 Dealerbot".cyan().bold(),
        version.dimmed()
    );
    println!(
        "{}",
        format!(
            "Chatting with {agent_name}. /reset starts over, /history shows the conversation, \"exit\" quits."
        )
        .dimmed()
    );
    println!();
}

pub fn print_warning(warning: &str) {
    eprintln!("{} {}", "⚠".yellow().bold(), warning.yellow());
}

pub fn dimmed(text: &str) -> String {
    text.dimmed().to_string()
}

/// Print a "thinking" placeholder while the agent works.
pub fn print_thinking() {
    eprint!("{}", "⠿ Thinking...".dimmed());
}

/// Clear the "thinking" placeholder.
pub fn clear_thinking() {
    eprint!("\r{}\r", " ".repeat(40));
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
