//! Serve command: run the web chat.

use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::orchestrator::Orchestrator;
use crate::server;
use anyhow::Result;
use std::sync::Arc;

/// Run the HTTP server.
pub async fn run_serve(host: Option<String>, port: Option<u16>, settings: Settings) -> Result<()> {
    if let Err(e) = preflight::check(Operation::Serve, &settings) {
        Output::error(&format!("{}", e));
        Output::info("Run 'vitrin doctor' for detailed diagnostics.");
        return Err(e.into());
    }
    if let Err(e) = preflight::check_api_key(&settings) {
        Output::warning(&format!("{} Answers will report the assistant as unavailable.", e));
    }

    let host = host.unwrap_or_else(|| settings.server.host.clone());
    let port = port.unwrap_or(settings.server.port);

    let orchestrator = Orchestrator::new(settings)?;
    let product_count = orchestrator.catalog().len();
    let state = Arc::new(orchestrator.into_app_state());

    let addr = format!("{}:{}", host, port);

    Output::header("Vitrin Chat Server");
    println!();
    Output::success(&format!("Listening on http://{}", addr));
    Output::kv("Products", &product_count.to_string());
    println!();
    println!("Endpoints:");
    Output::kv("Chat page", "GET  /");
    Output::kv("Chat", "POST /chat");
    Output::kv("Health", "GET  /health");
    println!();
    Output::info("Press Ctrl+C to stop the server.");

    server::serve(&addr, state).await?;

    Ok(())
}
