//! Interactive chat command.

use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::orchestrator::Orchestrator;
use crate::session::{SessionStore, DEFAULT_SESSION};
use anyhow::Result;
use console::style;
use std::io::{self, BufRead, Write};

/// Run the interactive chat command.
pub async fn run_chat(model: Option<String>, mut settings: Settings) -> Result<()> {
    if let Err(e) = preflight::check(Operation::Ask, &settings) {
        Output::error(&format!("{}", e));
        Output::info("Run 'vitrin doctor' for detailed diagnostics.");
        return Err(e.into());
    }

    if let Some(model) = model {
        settings.llm.model = model;
    }

    let sessions = SessionStore::new(settings.rag.max_history_messages);
    let orchestrator = Orchestrator::new(settings)?;
    let engine = orchestrator.engine();

    println!("\n{}", style("Vitrin Chat").bold().cyan());
    println!(
        "{}\n",
        style("Type your questions, or 'exit' to quit. Use 'clear' to reset conversation.").dim()
    );

    let stdin = io::stdin();
    let mut stdout = io::stdout();

    loop {
        print!("{} ", style("You:").green().bold());
        stdout.flush()?;

        let mut input = String::new();
        if stdin.lock().read_line(&mut input)? == 0 {
            break;
        }

        let input = input.trim();

        if input.is_empty() {
            continue;
        }

        if input.eq_ignore_ascii_case("exit") || input.eq_ignore_ascii_case("quit") {
            Output::info("Goodbye!");
            break;
        }

        if input.eq_ignore_ascii_case("clear") {
            sessions.reset(DEFAULT_SESSION).await;
            Output::info("Conversation history cleared.");
            continue;
        }

        let history = sessions.history(DEFAULT_SESSION).await;
        let response = engine.answer(input, &history).await;
        if response.kind.is_recorded() {
            sessions
                .record_exchange(DEFAULT_SESSION, input, &response.answer)
                .await;
        }

        println!("\n{} {}\n", style("Vitrin:").cyan().bold(), response.answer);
    }

    Ok(())
}
