//! Doctor command - verify catalog and backend configuration.

use crate::catalog::Catalog;
use crate::cli::Output;
use crate::config::{LlmProvider, Settings};
use console::style;
use std::time::Duration;

/// Check result for a single item.
#[derive(Debug)]
pub struct CheckResult {
    pub name: String,
    pub status: CheckStatus,
    pub message: String,
    pub hint: Option<String>,
}

#[derive(Debug, PartialEq)]
pub enum CheckStatus {
    Ok,
    Warning,
    Error,
}

impl CheckResult {
    fn ok(name: &str, message: &str) -> Self {
        Self {
            name: name.to_string(),
            status: CheckStatus::Ok,
            message: message.to_string(),
            hint: None,
        }
    }

    fn warning(name: &str, message: &str, hint: &str) -> Self {
        Self {
            name: name.to_string(),
            status: CheckStatus::Warning,
            message: message.to_string(),
            hint: Some(hint.to_string()),
        }
    }

    fn error(name: &str, message: &str, hint: &str) -> Self {
        Self {
            name: name.to_string(),
            status: CheckStatus::Error,
            message: message.to_string(),
            hint: Some(hint.to_string()),
        }
    }

    fn print(&self) {
        let icon = match self.status {
            CheckStatus::Ok => style("✓").green(),
            CheckStatus::Warning => style("!").yellow(),
            CheckStatus::Error => style("✗").red(),
        };

        println!("  {} {} - {}", icon, style(&self.name).bold(), self.message);
        if let Some(hint) = &self.hint {
            println!("    {} {}", style("→").dim(), style(hint).dim());
        }
    }
}

/// Run all diagnostic checks.
pub async fn run_doctor(settings: &Settings) -> anyhow::Result<()> {
    Output::header("Vitrin Doctor");
    println!();
    println!("Checking catalog and backend configuration...\n");

    let mut checks = Vec::new();

    println!("{}", style("Catalog").bold());
    let catalog_checks = check_catalog(settings);
    for check in &catalog_checks {
        check.print();
    }
    checks.extend(catalog_checks);

    println!();

    println!("{}", style("LLM Backend").bold());
    let backend_check = match settings.llm.provider {
        LlmProvider::OpenAI => check_api_key(settings),
        LlmProvider::Ollama => check_ollama(&settings.llm.ollama_host).await,
    };
    backend_check.print();
    checks.push(backend_check);

    println!();

    println!("{}", style("Configuration").bold());
    let config_check = check_config_file();
    config_check.print();
    checks.push(config_check);

    println!();

    let errors = checks.iter().filter(|c| c.status == CheckStatus::Error).count();
    let warnings = checks.iter().filter(|c| c.status == CheckStatus::Warning).count();

    if errors > 0 {
        Output::error(&format!(
            "{} error(s) found. Please fix them before using Vitrin.",
            errors
        ));
        anyhow::bail!("doctor found {} error(s)", errors);
    } else if warnings > 0 {
        Output::warning(&format!("All checks passed with {} warning(s).", warnings));
    } else {
        Output::success("All checks passed! Vitrin is ready to use.");
    }

    Ok(())
}

/// Check that the catalog loads and report how many records carry specifications.
fn check_catalog(settings: &Settings) -> Vec<CheckResult> {
    let path = settings.catalog_path();
    let catalog = match Catalog::load(&path) {
        Ok(catalog) => catalog,
        Err(e) => {
            return vec![CheckResult::error(
                "Catalog file",
                &e.to_string(),
                "Set catalog.path in the config or pass --catalog",
            )]
        }
    };

    let mut results = vec![CheckResult::ok(
        "Catalog file",
        &format!("{} ({} products)", path.display(), catalog.len()),
    )];

    let undecoded = catalog
        .iter()
        .filter(|r| {
            r.specifications.is_empty()
                && r.raw_specifications
                    .as_deref()
                    .is_some_and(|raw| !raw.trim().is_empty())
        })
        .count();
    if undecoded > 0 {
        results.push(CheckResult::warning(
            "Specifications",
            &format!("{} product(s) have specifications that are not a JSON object", undecoded),
            "These products are shown without a specification list",
        ));
    } else {
        results.push(CheckResult::ok("Specifications", "all decodable"));
    }

    results
}

/// Check the OpenAI API key.
fn check_api_key(settings: &Settings) -> CheckResult {
    let name = settings.llm.api_key_env.as_str();
    match settings.api_key() {
        Some(key) if key.is_ascii() && key.len() > 12 => {
            CheckResult::ok(name, &format!("configured ({})", mask_key(&key)))
        }
        Some(_) => CheckResult::warning(
            name,
            "set but format looks unusual",
            "Expected format: sk-... (OpenAI API key)",
        ),
        None => CheckResult::error(
            name,
            "not set",
            &format!("Set with: export {}='sk-...'", name),
        ),
    }
}

/// Keep the first 3 and last 4 characters of a key.
fn mask_key(key: &str) -> String {
    let chars: Vec<char> = key.chars().collect();
    if chars.len() <= 7 {
        return "*".repeat(chars.len());
    }
    let head: String = chars[..3].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{}...{}", head, tail)
}

/// Check that the Ollama server answers.
async fn check_ollama(host: &str) -> CheckResult {
    let url = format!("{}/api/tags", host.trim_end_matches('/'));
    let client = match reqwest::Client::builder()
        .timeout(Duration::from_secs(3))
        .build()
    {
        Ok(client) => client,
        Err(e) => return CheckResult::error("Ollama", &e.to_string(), "Check your TLS setup"),
    };

    match client.get(&url).send().await {
        Ok(resp) if resp.status().is_success() => CheckResult::ok("Ollama", host),
        Ok(resp) => CheckResult::warning(
            "Ollama",
            &format!("{} answered {}", host, resp.status()),
            "Check llm.ollama_host",
        ),
        Err(_) => CheckResult::error(
            "Ollama",
            &format!("{} not reachable", host),
            "Start it with: ollama serve",
        ),
    }
}

/// Check if config file exists.
fn check_config_file() -> CheckResult {
    let config_path = Settings::default_config_path();
    if config_path.exists() {
        CheckResult::ok("Config file", &format!("{}", config_path.display()))
    } else {
        CheckResult::warning(
            "Config file",
            "using defaults",
            "Create with: vitrin config init",
        )
    }
}
