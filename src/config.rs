//! Layered application configuration and CLI arguments.

use clap::Parser;
use config::{Config, Environment, File};
use serde::Deserialize;
use std::path::Path;

use crate::transport::AgentSettings;

/// Config file picked up from the working directory when no path is given.
const DEFAULT_CONFIG_FILE: &str = "osd-agui.yaml";

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Config file path
    #[arg(short, long, env = "CONFIG_FILE")]
    pub config: Option<String>,

    /// Agent run endpoint URL
    #[arg(long, env = "AGENT_ENDPOINT")]
    pub endpoint: Option<String>,

    /// Bearer token for the agent endpoint
    #[arg(long, env = "AGENT_TOKEN")]
    pub token: Option<String>,

    /// Log output format (pretty or json)
    #[arg(long, env = "LOG_FORMAT")]
    pub log_format: Option<LogFormat>,

    /// Thread to continue instead of starting a new one
    #[arg(long)]
    pub thread_id: Option<String>,

    /// Submit a tool result instead of a user message (CALL_ID=CONTENT)
    #[arg(long, value_parser = parse_tool_result)]
    pub tool_result: Option<(String, String)>,

    /// User message to send
    pub message: Option<String>,
}

fn parse_tool_result(raw: &str) -> Result<(String, String), String> {
    let (call_id, content) = raw
        .split_once('=')
        .ok_or_else(|| "expected CALL_ID=CONTENT".to_string())?;
    if call_id.trim().is_empty() {
        return Err("tool call id cannot be empty".to_string());
    }
    Ok((call_id.trim().to_string(), content.to_string()))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Pretty,
    Json,
}

impl LogFormat {
    fn as_str(self) -> &'static str {
        match self {
            Self::Pretty => "pretty",
            Self::Json => "json",
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub agent: AgentSettings,
    pub log: LogConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct LogConfig {
    pub format: LogFormat,
    pub filter: String,
}

/// Loaded configuration plus the per-invocation CLI arguments.
#[derive(Debug)]
pub struct Loaded {
    pub config: AppConfig,
    pub cli: Cli,
}

impl AppConfig {
    pub fn load() -> Result<Loaded, config::ConfigError> {
        Self::load_from_args(std::env::args())
    }

    pub fn load_from_args<I, T>(args: I) -> Result<Loaded, config::ConfigError>
    where
        I: IntoIterator<Item = T>,
        T: Into<std::ffi::OsString> + Clone,
    {
        let cli =
            Cli::try_parse_from(args).map_err(|e| config::ConfigError::Message(e.to_string()))?;

        let mut builder = Config::builder();

        // 1. Defaults
        builder = builder
            .set_default("agent.xsrf_header", true)?
            .set_default("log.format", LogFormat::Pretty.as_str())?
            .set_default("log.filter", "info,osd_agui_agent=debug")?;

        // 2. Config file: explicit path must exist, the cwd fallback may not
        if let Some(path) = &cli.config {
            builder = builder.add_source(File::with_name(path).required(true));
        } else if Path::new(DEFAULT_CONFIG_FILE).exists() {
            builder = builder.add_source(File::with_name(DEFAULT_CONFIG_FILE).required(false));
        }

        // 3. Environment, e.g. OSD_AGUI_AGENT__ENDPOINT=http://localhost:5601/api/agent
        builder = builder.add_source(
            Environment::with_prefix("OSD_AGUI")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        // 4. CLI flags (clap already folded in their own env vars)
        if let Some(endpoint) = &cli.endpoint {
            builder = builder.set_override("agent.endpoint", endpoint.as_str())?;
        }
        if let Some(token) = &cli.token {
            builder = builder.set_override("agent.api_key", token.as_str())?;
        }
        if let Some(format) = cli.log_format {
            builder = builder.set_override("log.format", format.as_str())?;
        }

        let cfg: AppConfig = builder.build()?.try_deserialize()?;
        if cfg.agent.endpoint.trim().is_empty() {
            return Err(config::ConfigError::Message(
                "agent.endpoint cannot be empty".to_string(),
            ));
        }
        url::Url::parse(&cfg.agent.endpoint).map_err(|e| {
            config::ConfigError::Message(format!("agent.endpoint is not a valid URL: {e}"))
        })?;

        Ok(Loaded { config: cfg, cli })
    }
}
