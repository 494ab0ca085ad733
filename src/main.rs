//! Command-line runner for one agent turn.
//!
//! Prints every event as a JSON line on stdout. Ctrl-C aborts the run.

use mimalloc::MiMalloc;

/// Global allocator for improved performance (M-MIMALLOC-APPS).
#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

use std::io::Write;
use std::process::ExitCode;

use anyhow::{Context, bail};
use dotenvy::dotenv;
use futures::StreamExt;
use tracing::{error, info};

use osd_agui_agent::config::AppConfig;
use osd_agui_agent::{Message, OsdAgUiAgent, RunAgentInput, Termination, telemetry};

#[tokio::main]
async fn main() -> ExitCode {
    // Load .env (if present)
    let _ = dotenv();

    match run().await {
        Ok(Termination::Failed(_)) => ExitCode::FAILURE,
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run() -> anyhow::Result<Termination> {
    let loaded = AppConfig::load().context("Configuration error")?;
    let (config, cli) = (loaded.config, loaded.cli);

    telemetry::init(&config.log);

    info!(
        name: "agent.config.loaded",
        endpoint = %config.agent.endpoint,
        "Agent configuration loaded"
    );

    let thread_id = cli.thread_id.unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
    let mut input = RunAgentInput::new(thread_id);
    if let Some((call_id, content)) = cli.tool_result {
        input = input.with_message(Message::tool_result(call_id, content));
    }
    if let Some(message) = cli.message {
        input = input.with_message(Message::user(message));
    }
    if input.messages.is_empty() {
        bail!("nothing to send: pass a MESSAGE or --tool-result");
    }

    let agent = OsdAgUiAgent::from_settings(&config.agent)?;

    let abort_handle = agent.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!(name: "agent.interrupt", "Interrupted, aborting run");
            abort_handle.abort_run();
        }
    });

    let mut events = agent.run_agent(input);
    let mut stdout = std::io::stdout().lock();
    while let Some(event) = events.next().await {
        match event {
            Ok(event) => writeln!(stdout, "{}", serde_json::to_string(&event)?)?,
            Err(e) => error!(name: "agent.run.error", error = %e, "Agent run failed"),
        }
    }

    let termination = events
        .termination()
        .cloned()
        .unwrap_or(Termination::Completed);
    info!(name: "agent.run.ended", termination = ?termination, "Agent run ended");
    Ok(termination)
}
