//! Ask command implementation.

use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::orchestrator::Orchestrator;
use crate::rag::AnswerKind;
use anyhow::Result;

/// Run the ask command.
pub async fn run_ask(question: &str, model: Option<String>, mut settings: Settings) -> Result<()> {
    if let Err(e) = preflight::check(Operation::Ask, &settings) {
        Output::error(&format!("{}", e));
        Output::info("Run 'vitrin doctor' for detailed diagnostics.");
        return Err(e.into());
    }

    if let Some(model) = model {
        settings.llm.model = model;
    }

    let orchestrator = Orchestrator::new(settings)?;

    let spinner = Output::spinner("Thinking...");
    let response = orchestrator.engine().answer(question, &[]).await;
    spinner.finish_and_clear();

    match response.kind {
        AnswerKind::Apology | AnswerKind::Unavailable => {
            Output::warning(&response.answer);
        }
        _ => println!("\n{}\n", response.format_for_display()),
    }

    Ok(())
}
