//! Interactive chat REPL.

use std::borrow::Cow::{self, Borrowed, Owned};
use std::time::Duration;

use anyhow::Result;
use codewise_application::AssistantUseCase;
use codewise_core::session::{HistoryEntry, TurnRole};
use colored::Colorize;
use rustyline::completion::{Completer, Pair};
use rustyline::error::ReadlineError;
use rustyline::highlight::Highlighter;
use rustyline::hint::Hinter;
use rustyline::validate::Validator;
use rustyline::{Context, Editor, Helper};
use tokio::time::timeout;

const HISTORY_COMMAND: &str = "/history";

/// Rustyline helper: completes and highlights slash commands.
#[derive(Clone)]
struct CliHelper {
    commands: Vec<String>,
}

impl CliHelper {
    fn new() -> Self {
        Self {
            commands: vec![HISTORY_COMMAND.to_string()],
        }
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
        let line = &line[..pos];

        if line.starts_with('/') {
            let candidates: Vec<Pair> = self
                .commands
                .iter()
                .filter(|cmd| cmd.starts_with(line))
                .map(|cmd| Pair {
                    display: cmd.clone(),
                    replacement: cmd.clone(),
                })
                .collect();
            Ok((0, candidates))
        } else {
            Ok((0, vec![]))
        }
    }
}

impl Highlighter for CliHelper {
    fn highlight<'l>(&self, line: &'l str, _pos: usize) -> Cow<'l, str> {
        if line.starts_with('/') {
            Owned(line.bright_cyan().to_string())
        } else {
            Borrowed(line)
        }
    }

    fn highlight_char(&self, _line: &str, _pos: usize, _forced: bool) -> bool {
        true
    }
}

impl Hinter for CliHelper {
    type Hint = String;

    fn hint(&self, line: &str, pos: usize, _ctx: &Context<'_>) -> Option<String> {
        let line = &line[..pos];

        if line.starts_with('/') && !line.contains(' ') {
            self.commands
                .iter()
                .find(|cmd| cmd.starts_with(line) && cmd.len() > line.len())
                .map(|cmd| cmd[line.len()..].to_string())
        } else {
            None
        }
    }
}

impl Validator for CliHelper {}

/// What a line of REPL input asks for.
#[derive(Debug, PartialEq, Eq)]
enum Input<'a> {
    Quit,
    History,
    Empty,
    Message(&'a str),
}

fn classify(line: &str) -> Input<'_> {
    match line.trim() {
        "quit" | "exit" => Input::Quit,
        HISTORY_COMMAND => Input::History,
        "" => Input::Empty,
        message => Input::Message(message),
    }
}

fn print_history(history: &[HistoryEntry]) {
    if history.is_empty() {
        println!("{}", "(no messages yet)".bright_black());
        return;
    }
    for entry in history {
        let label = format!("[{}]", entry.role);
        let label = match entry.role {
            TurnRole::User => label.green(),
            TurnRole::Assistant => label.bright_magenta(),
        };
        println!("{} {}", label, entry.content);
    }
}

/// Runs the chat loop until `quit`, `exit` or Ctrl-D.
pub async fn run(
    assistant: &AssistantUseCase,
    token: &str,
    request_timeout: Duration,
) -> Result<()> {
    let mut rl = Editor::new()?;
    rl.set_helper(Some(CliHelper::new()));

    println!("{}", "=== Codewise Chat ===".bright_magenta().bold());
    println!(
        "{}",
        "Type a message, '/history' to view this session, or 'quit' to exit.".bright_black()
    );
    println!();

    loop {
        let line = match rl.readline(">> ") {
            Ok(line) => line,
            Err(ReadlineError::Interrupted) => {
                println!("{}", "CTRL-C detected. Type 'quit' to exit.".yellow());
                continue;
            }
            Err(ReadlineError::Eof) => {
                println!("{}", "CTRL-D detected. Exiting...".bright_green());
                break;
            }
            Err(err) => {
                eprintln!("{}", format!("Error: {:?}", err).red());
                break;
            }
        };

        match classify(&line) {
            Input::Quit => {
                println!("{}", "Goodbye!".bright_green());
                break;
            }
            Input::Empty => continue,
            Input::History => match assistant.history(token).await {
                Ok(history) => print_history(&history),
                Err(err) => eprintln!("{}", format!("Error: {}", err).red()),
            },
            Input::Message(message) => {
                let _ = rl.add_history_entry(message);

                match timeout(request_timeout, assistant.chat(token, message)).await {
                    Ok(Ok(reply)) => {
                        for line in reply.response.lines() {
                            println!("{}", line.bright_blue());
                        }
                    }
                    Ok(Err(err)) => eprintln!("{}", format!("Error: {}", err).red()),
                    Err(_) => eprintln!("{}", "Error: Request timed out.".red()),
                }
            }
        }
    }

    Ok(())
}
