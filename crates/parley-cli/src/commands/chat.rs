//! Interactive conversation REPL.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use anyhow::Result;
use colored::Colorize;
use rustyline::Editor;
use rustyline::error::ReadlineError;

use parley_application::{ConversationManager, ConversationSession, SessionAction};
use parley_core::conversation::{ChatMessage, MenuAction, MessageRole};
use parley_core::error::ParleyError;

use crate::clipboard::SystemClipboard;
use crate::helper::CliHelper;

/// One line of REPL input.
#[derive(Debug, Clone, PartialEq, Eq)]
enum ReplCommand {
    Say(String),
    List,
    Copy(usize),
    Delete(usize),
    Edit { index: usize, text: String },
    Quit,
    Invalid(String),
}

impl ReplCommand {
    /// Returns `None` for blank lines.
    fn parse(line: &str) -> Option<Self> {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            return None;
        }
        if trimmed == "quit" || trimmed == "exit" {
            return Some(Self::Quit);
        }
        if !trimmed.starts_with('/') {
            return Some(Self::Say(line.to_string()));
        }

        let (command, rest) = trimmed.split_once(' ').unwrap_or((trimmed, ""));
        let rest = rest.trim_start();
        let command = match command {
            "/quit" | "/exit" => Self::Quit,
            "/list" => Self::List,
            other => match other.trim_start_matches('/').parse::<MenuAction>() {
                Ok(action) => Self::menu(action, rest),
                Err(_) => Self::Invalid(format!("Unknown command: {}", other)),
            },
        };
        Some(command)
    }

    /// `/copy <n>`, `/delete <n>`, `/edit <n> <text>`.
    fn menu(action: MenuAction, args: &str) -> Self {
        let (index, text) = args.split_once(' ').unwrap_or((args, ""));
        let usage = || match action {
            MenuAction::Edit => Self::Invalid(format!("usage: /{} <n> <new text>", action)),
            _ => Self::Invalid(format!("usage: /{} <n>", action)),
        };
        let Some(index) = parse_index(index) else {
            return usage();
        };
        match action {
            MenuAction::Copy if text.is_empty() => Self::Copy(index),
            MenuAction::Delete if text.is_empty() => Self::Delete(index),
            MenuAction::Edit => Self::Edit {
                index,
                text: text.to_string(),
            },
            _ => usage(),
        }
    }
}

/// Messages are numbered from 1 on screen.
fn parse_index(s: &str) -> Option<usize> {
    s.trim().parse::<usize>().ok().filter(|n| *n > 0)
}

pub async fn run(manager: &ConversationManager, persona: &str) -> Result<()> {
    let session = manager.open(persona).await;

    println!(
        "{}",
        format!("=== {} ===", session.persona()).bright_magenta().bold()
    );
    println!(
        "{}",
        "Type to talk. /list, /copy <n>, /edit <n> <text>, /delete <n>, /quit.".bright_black()
    );
    println!();
    render(&session.messages().await, session.persona());

    let message_count = Arc::new(AtomicUsize::new(0));
    let mut rl = Editor::new()?;
    rl.set_helper(Some(CliHelper::new(message_count.clone())));

    loop {
        message_count.store(session.messages().await.len(), Ordering::Relaxed);
        match rl.readline(">> ") {
            Ok(line) => {
                let Some(command) = ReplCommand::parse(&line) else {
                    continue;
                };
                let _ = rl.add_history_entry(line.as_str());

                if command == ReplCommand::Quit {
                    println!("{}", "Goodbye!".bright_green());
                    break;
                }
                handle(&session, command).await;
            }
            Err(ReadlineError::Interrupted) => {
                println!("{}", "CTRL-C detected. Type '/quit' to exit.".yellow());
            }
            Err(ReadlineError::Eof) => {
                println!("{}", "CTRL-D detected. Exiting...".bright_green());
                break;
            }
            Err(err) => {
                eprintln!("{}", format!("Error: {:?}", err).red());
                break;
            }
        }
    }

    manager.close_active().await;
    Ok(())
}

async fn handle(session: &ConversationSession, command: ReplCommand) {
    match command {
        ReplCommand::Say(text) => {
            let pending = tokio::spawn({
                let session = session.clone();
                async move { session.send(&text).await }
            });
            tokio::task::yield_now().await;
            if let Some(label) = session.composing_label().await {
                println!("{}", label.bright_black());
            }
            match pending.await {
                Ok(Ok(Some(reply))) => print_message(None, &reply, session.persona()),
                Ok(Ok(None)) => {}
                Ok(Err(e)) => report(SessionAction::Send, &e),
                Err(e) => eprintln!("{}", format!("Send task failed: {}", e).red()),
            }
        }
        ReplCommand::List => render(&session.messages().await, session.persona()),
        ReplCommand::Copy(index) => {
            if select(session, index).await.is_none() {
                return;
            }
            match session.copy_selected(&SystemClipboard).await {
                Ok(Some(notice)) => {
                    println!("{}", format!("{}: {}", notice.title, notice.body).green())
                }
                Ok(None) => {}
                Err(e) => report(SessionAction::Copy, &e),
            }
        }
        ReplCommand::Delete(index) => {
            if select(session, index).await.is_none() {
                return;
            }
            match session.delete_selected().await {
                Ok(Some(_)) => render(&session.messages().await, session.persona()),
                Ok(None) => println!("{}", "Deleted remotely; no local copy left.".yellow()),
                Err(e) => report(SessionAction::Delete, &e),
            }
        }
        ReplCommand::Edit { index, text } => {
            if select(session, index).await.is_none() {
                return;
            }
            session.begin_edit().await;
            session.set_draft(text).await;
            match session.confirm_edit().await {
                Ok(Some(_)) => render(&session.messages().await, session.persona()),
                Ok(None) => {
                    session.dismiss().await;
                    println!("{}", "Edit text is empty.".yellow());
                }
                Err(e) => {
                    report(SessionAction::Edit, &e);
                    render(&session.messages().await, session.persona());
                }
            }
        }
        ReplCommand::Invalid(message) => println!("{}", message.yellow()),
        ReplCommand::Quit => {}
    }
}

async fn select(session: &ConversationSession, index: usize) -> Option<ChatMessage> {
    let messages = session.messages().await;
    let Some(message) = messages.get(index - 1) else {
        println!("{}", format!("No message #{}", index).yellow());
        return None;
    };
    session.select(&message.id).await
}

fn render(messages: &[ChatMessage], persona: &str) {
    if messages.is_empty() {
        println!("{}", "(no messages)".bright_black());
    }
    for (i, message) in messages.iter().enumerate() {
        print_message(Some(i + 1), message, persona);
    }
}

fn print_message(index: Option<usize>, message: &ChatMessage, persona: &str) {
    let number = index.map(|n| format!("{:>3} ", n)).unwrap_or_default();
    match message.role {
        MessageRole::User => {
            println!("{}{}", number.bright_black(), format!("> {}", message.content).green())
        }
        MessageRole::Assistant => {
            println!("{}{}", number.bright_black(), format!("[{}]", persona).bright_magenta());
            for line in message.content.lines() {
                println!("    {}", line.bright_blue());
            }
        }
    }
}

fn report(action: SessionAction, error: &ParleyError) {
    eprintln!("{}", format!("Could not {}: {}", action, error).red());
    if error.is_unauthorized() {
        eprintln!(
            "{}",
            "Set PARLEY_TOKEN or write a token to ~/.config/parley/token.".bright_black()
        );
    }
}
