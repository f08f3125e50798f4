//! Rustyline helper for the conversation REPL.
//!
//! Completes slash commands and, after `/copy`, `/edit` or `/delete`, the
//! message numbers currently on screen. Hints show the arguments a command
//! still expects.

use std::borrow::Cow::{self, Borrowed, Owned};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use colored::Colorize;
use rustyline::completion::{Completer, Pair};
use rustyline::highlight::Highlighter;
use rustyline::hint::Hinter;
use rustyline::validate::Validator;
use rustyline::{Context, Helper};

struct SlashCommand {
    name: &'static str,
    /// Argument synopsis shown as a hint; empty for commands without arguments.
    args: &'static str,
    takes_index: bool,
}

const COMMANDS: &[SlashCommand] = &[
    SlashCommand {
        name: "/list",
        args: "",
        takes_index: false,
    },
    SlashCommand {
        name: "/copy",
        args: "<n>",
        takes_index: true,
    },
    SlashCommand {
        name: "/edit",
        args: "<n> <text>",
        takes_index: true,
    },
    SlashCommand {
        name: "/delete",
        args: "<n>",
        takes_index: true,
    },
    SlashCommand {
        name: "/quit",
        args: "",
        takes_index: false,
    },
];

fn lookup(name: &str) -> Option<&'static SlashCommand> {
    COMMANDS.iter().find(|c| c.name == name)
}

pub struct CliHelper {
    /// Number of messages in the transcript, refreshed by the REPL before
    /// each prompt.
    message_count: Arc<AtomicUsize>,
}

impl CliHelper {
    pub fn new(message_count: Arc<AtomicUsize>) -> Self {
        Self { message_count }
    }

    /// Start offset and replacement candidates for the text before the cursor.
    fn candidates(&self, line: &str) -> (usize, Vec<String>) {
        if !line.starts_with('/') {
            return (0, Vec::new());
        }

        match line.split_once(' ') {
            None => (
                0,
                COMMANDS
                    .iter()
                    .filter(|c| c.name.starts_with(line))
                    .map(|c| c.name.to_string())
                    .collect(),
            ),
            Some((name, rest)) if !rest.contains(' ') => {
                if !lookup(name).is_some_and(|c| c.takes_index) {
                    return (0, Vec::new());
                }
                let count = self.message_count.load(Ordering::Relaxed);
                let numbers = (1..=count)
                    .map(|n| n.to_string())
                    .filter(|n| n.starts_with(rest))
                    .collect();
                (name.len() + 1, numbers)
            }
            Some(_) => (0, Vec::new()),
        }
    }
}

/// Remaining command name plus its argument synopsis.
fn hint_for(line: &str) -> Option<String> {
    if !line.starts_with('/') {
        return None;
    }

    match line.split_once(' ') {
        None => {
            let command = COMMANDS.iter().find(|c| c.name.starts_with(line))?;
            let rest = &command.name[line.len()..];
            if command.args.is_empty() {
                (!rest.is_empty()).then(|| rest.to_string())
            } else {
                Some(format!("{} {}", rest, command.args))
            }
        }
        Some((name, "")) => {
            let command = lookup(name)?;
            (!command.args.is_empty()).then(|| command.args.to_string())
        }
        Some(_) => None,
    }
}

impl Helper for CliHelper {}

impl Completer for CliHelper {
    type Candidate = Pair;

    fn complete(
        &self,
        line: &str,
        pos: usize,
        _ctx: &Context<'_>,
    ) -> rustyline::Result<(usize, Vec<Pair>)> {
        let (start, candidates) = self.candidates(&line[..pos]);
        let pairs = candidates
            .into_iter()
            .map(|c| Pair {
                display: c.clone(),
                replacement: c,
            })
            .collect();
        Ok((start, pairs))
    }
}

impl Highlighter for CliHelper {
    fn highlight<'l>(&self, line: &'l str, _pos: usize) -> Cow<'l, str> {
        if !line.starts_with('/') {
            return Borrowed(line);
        }
        let (name, rest) = line.split_at(line.find(' ').unwrap_or(line.len()));
        let name = if lookup(name).is_some() {
            name.bright_cyan()
        } else {
            name.red()
        };
        Owned(format!("{}{}", name, rest))
    }

    fn highlight_hint<'h>(&self, hint: &'h str) -> Cow<'h, str> {
        Owned(hint.bright_black().to_string())
    }

    fn highlight_char(&self, line: &str, _pos: usize, _forced: bool) -> bool {
        line.starts_with('/')
    }
}

impl Hinter for CliHelper {
    type Hint = String;

    fn hint(&self, line: &str, pos: usize, _ctx: &Context<'_>) -> Option<String> {
        // Only hint at the end of the line.
        if pos < line.len() {
            return None;
        }
        hint_for(line)
    }
}

impl Validator for CliHelper {}
