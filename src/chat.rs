//! Interactive chat over the working set.
//!
//! Reads questions from stdin, one per line, and answers each over the
//! loaded emails. The session snapshot (loaded emails and history) is
//! optionally persisted as JSON between invocations.
//!
//! | Input | Effect |
//! |-------|--------|
//! | `/history` | print the question/answer history |
//! | `/remove N` | delete history entry `N` (1-based) |
//! | `/reload` | reload the working set from the mail store |
//! | `/clear` | drop the loaded emails and the history |
//! | `/quit` | exit |

use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use mailrag_core::session::ChatSession;
use mailrag_core::tasks::EmailAssistant;

use crate::assistant::{build_assistant, load_working_set, Selection};
use crate::config::Config;

#[derive(Debug, PartialEq, Eq)]
enum ChatCommand {
    Ask(String),
    History,
    Remove(usize),
    Reload,
    Clear,
    Quit,
    Unknown(String),
    Empty,
}

fn parse_command(line: &str) -> ChatCommand {
    let line = line.trim();
    if line.is_empty() {
        return ChatCommand::Empty;
    }
    if !line.starts_with('/') {
        return ChatCommand::Ask(line.to_string());
    }
    let mut parts = line.split_whitespace();
    match (parts.next(), parts.next()) {
        (Some("/history"), None) => ChatCommand::History,
        (Some("/reload"), None) => ChatCommand::Reload,
        (Some("/clear"), None) => ChatCommand::Clear,
        (Some("/quit") | Some("/exit"), None) => ChatCommand::Quit,
        (Some("/remove"), Some(n)) => match n.parse::<usize>() {
            Ok(n) if n >= 1 => ChatCommand::Remove(n - 1),
            _ => ChatCommand::Unknown(line.to_string()),
        },
        _ => ChatCommand::Unknown(line.to_string()),
    }
}

fn load_session(path: &Path) -> Result<ChatSession> {
    if !path.exists() {
        return Ok(ChatSession::new());
    }
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read session file: {}", path.display()))?;
    serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse session file: {}", path.display()))
}

fn save_session(path: &Path, session: &ChatSession) -> Result<()> {
    let json = serde_json::to_string_pretty(session)?;
    std::fs::write(path, json)
        .with_context(|| format!("Failed to write session file: {}", path.display()))
}

pub async fn run_chat(
    config: &Config,
    selection: &Selection,
    session_path: Option<PathBuf>,
) -> Result<()> {
    let assistant = build_assistant(config)?;

    let mut session = match &session_path {
        Some(path) => load_session(path)?,
        None => ChatSession::new(),
    };
    if session.loaded_emails.is_empty() {
        session = session.with_emails(load_working_set(config, selection).await?);
    }
    eprintln!(
        "Loaded {} emails. Ask a question, or /quit to exit.",
        session.loaded_emails.len()
    );

    let stdin = std::io::stdin();
    let mut stdout = std::io::stdout();
    for line in stdin.lock().lines() {
        let line = line.context("Failed to read from stdin")?;
        let command = parse_command(&line);
        if command == ChatCommand::Quit {
            break;
        }
        session = step(&assistant, config, selection, session, command, &mut stdout).await?;
        stdout.flush()?;
        if let Some(path) = &session_path {
            save_session(path, &session)?;
        }
    }
    Ok(())
}

async fn step(
    assistant: &EmailAssistant,
    config: &Config,
    selection: &Selection,
    session: ChatSession,
    command: ChatCommand,
    out: &mut impl Write,
) -> Result<ChatSession> {
    match command {
        ChatCommand::Ask(question) => {
            let (session, answer) = session.ask(assistant, &question).await?;
            writeln!(out, "{}\n", answer)?;
            Ok(session)
        }
        ChatCommand::History => {
            if session.history.is_empty() {
                writeln!(out, "No history.")?;
            }
            for (i, entry) in session.history.iter().enumerate() {
                writeln!(out, "{}. Q: {}\n   A: {}", i + 1, entry.question, entry.answer)?;
            }
            Ok(session)
        }
        ChatCommand::Remove(index) => Ok(session.remove_entry(index)),
        ChatCommand::Reload => {
            let emails = load_working_set(config, selection).await?;
            writeln!(out, "Loaded {} emails.", emails.len())?;
            Ok(session.with_emails(emails))
        }
        ChatCommand::Clear => {
            writeln!(out, "Session cleared.")?;
            Ok(session.clear())
        }
        ChatCommand::Unknown(line) => {
            writeln!(out, "Unknown command: {}", line)?;
            Ok(session)
        }
        ChatCommand::Empty | ChatCommand::Quit => Ok(session),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mailrag_core::models::{ChatHistoryEntry, EmailRecord};
    use tempfile::TempDir;

    #[test]
    fn test_parse_command() {
        assert_eq!(parse_command("  who wrote?  "), ChatCommand::Ask("who wrote?".into()));
        assert_eq!(parse_command("/history"), ChatCommand::History);
        assert_eq!(parse_command("/remove 2"), ChatCommand::Remove(1));
        assert_eq!(parse_command("/remove 0"), ChatCommand::Unknown("/remove 0".into()));
        assert_eq!(parse_command("/exit"), ChatCommand::Quit);
        assert_eq!(parse_command("   "), ChatCommand::Empty);
        assert_eq!(parse_command("/dance"), ChatCommand::Unknown("/dance".into()));
    }

    #[test]
    fn test_session_file_round_trip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("session.json");
        assert_eq!(load_session(&path).unwrap(), ChatSession::new());

        let mut session = ChatSession::new().with_emails(vec![EmailRecord {
            id: "1".into(),
            subject: "s".into(),
            sender: "a@b.c".into(),
            date: "d".into(),
            body: "b".into(),
            thread_id: "t".into(),
        }]);
        session.history.push(ChatHistoryEntry {
            question: "q".into(),
            answer: "a".into(),
        });
        save_session(&path, &session).unwrap();
        assert_eq!(load_session(&path).unwrap(), session);
    }
}
