//! Terminal chat loop.

use std::io::{self, Write};

use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;

use crate::rag::{FaqAssistant, Stage};

pub const GREETING: &str = "How can I help you today?";
const FETCHING_STATUS: &str = "Fetching context...";
const SYNTHESIZING_STATUS: &str = "Synthesizing context...";
const PROMPT: &str = "you> ";

/// The exchange on screen; only the current one is kept.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatTurn {
    pub question: String,
    pub answer: String,
}

#[derive(Debug, PartialEq, Eq)]
enum ReplInput {
    Quit,
    Skip,
    Question(String),
}

fn status_text(stage: Stage) -> &'static str {
    match stage {
        Stage::FetchingContext => FETCHING_STATUS,
        Stage::SynthesizingContext => SYNTHESIZING_STATUS,
    }
}

fn show_status(stage: Stage) {
    print!("\r{:<width$}", status_text(stage), width = SYNTHESIZING_STATUS.len());
    io::stdout().flush().ok();
}

fn clear_status() {
    print!("\r{}\r", " ".repeat(SYNTHESIZING_STATUS.len()));
    io::stdout().flush().ok();
}

fn classify(line: &str) -> ReplInput {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return ReplInput::Skip;
    }
    match trimmed.to_ascii_lowercase().as_str() {
        "/quit" | "/exit" => ReplInput::Quit,
        _ => ReplInput::Question(trimmed.to_string()),
    }
}

/// Reads questions until `/quit`, `/exit` or Ctrl-D. Ctrl-C drops the current line.
pub async fn run_repl(assistant: &FaqAssistant, store_name: &str) -> Result<(), ReadlineError> {
    let mut rl = DefaultEditor::new()?;
    let mut current: Option<ChatTurn> = None;
    println!("{} support\n{}", store_name, GREETING);

    loop {
        let line = match rl.readline(PROMPT) {
            Ok(line) => line,
            Err(ReadlineError::Interrupted) => continue,
            Err(ReadlineError::Eof) => break,
            Err(e) => return Err(e),
        };

        let question = match classify(&line) {
            ReplInput::Quit => break,
            ReplInput::Skip => continue,
            ReplInput::Question(question) => question,
        };
        rl.add_history_entry(question.as_str()).ok();

        let answer = assistant.answer_with_progress(&question, show_status).await;
        clear_status();

        let turn = current.insert(ChatTurn { question, answer });
        println!("{}\n", turn.answer);
    }

    if let Some(turn) = current {
        tracing::debug!("Last question of the session: {}", turn.question);
    }

    println!("Goodbye!");
    Ok(())
}
