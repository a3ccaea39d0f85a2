//! InfoSphere terminal client
//!
//! Walks through login, role selection, reporter verification, topic and
//! region selection, and then shows the news dashboard.
//!
//! ## Usage
//!
//! ```bash
//! GEMINI_API_KEY=... cargo run --bin infosphere
//! RUST_LOG=infosphere=debug cargo run --bin infosphere -- --model gemini-2.5-flash
//! ```

use anyhow::{Context, Result};
use clap::Parser;
use colored::Colorize;
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

use infosphere::ai::{AiConfig, GeminiClient};
use infosphere::console::{help_text, loading_label, parse_command, render, Command};
use infosphere::session::{OnboardingFlow, Session};

#[derive(Parser, Debug)]
#[command(name = "infosphere", version, about = "InfoSphere news onboarding client")]
struct Cli {
    /// Gemini API key
    #[arg(long, env = "GEMINI_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Gemini model name
    #[arg(long, env = "GEMINI_MODEL")]
    model: Option<String>,

    /// Request timeout in seconds
    #[arg(long)]
    timeout_secs: Option<u64>,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("infosphere=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let mut config = AiConfig::from_env();
    if let Some(api_key) = cli.api_key {
        config.api_key = api_key;
    }
    if let Some(model) = cli.model {
        config.model = model;
    }
    if let Some(timeout) = cli.timeout_secs {
        config.timeout_seconds = timeout;
    }

    let client = Arc::new(
        GeminiClient::new(config).context("GEMINI_API_KEY (or API_KEY) must be set")?,
    );
    let flow = OnboardingFlow::new(client.clone(), client);
    let mut session = Session::new();
    let mut editor = DefaultEditor::new()?;

    println!("{}", infosphere::get_system_info::get_system_info());

    loop {
        println!("\n{}", render(&session));

        let line = match editor.readline("> ") {
            Ok(line) => line,
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => break,
            Err(e) => return Err(e.into()),
        };
        let _ = editor.add_history_entry(line.as_str());

        let intent = match parse_command(&session, &line) {
            Ok(Command::Quit) => break,
            Ok(Command::Help) => {
                println!("{}", help_text(&session));
                continue;
            }
            Ok(Command::Intent(intent)) => intent,
            Err(e) => {
                println!("{}", e.to_string().yellow());
                continue;
            }
        };

        let area = loading_label(&session, &intent);
        let loading = session.loading_flag();
        let verifying = session.verifying_flag();
        let indicator = tokio::spawn(async move {
            let mut announced = false;
            loop {
                tokio::time::sleep(Duration::from_millis(150)).await;
                if announced {
                    continue;
                }
                if loading.is_set() {
                    let message = match &area {
                        Some(area) => format!("Finding verified stories for {}...", area),
                        None => "Finding verified stories...".to_string(),
                    };
                    println!("{}", message.cyan());
                    announced = true;
                } else if verifying.is_set() {
                    println!("{}", "Verifying...".cyan());
                    announced = true;
                }
            }
        });

        let result = flow.dispatch(&mut session, intent).await;
        indicator.abort();

        if let Err(e) = result {
            println!("{}", e.to_string().yellow());
        }
    }

    Ok(())
}
