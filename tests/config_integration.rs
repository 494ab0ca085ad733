use osd_agui_agent::config::{AppConfig, LogFormat};
use serial_test::serial;
use std::env;
use std::fs;

// Helper to clear environment variables that might interfere with tests
fn clear_env_vars() {
    unsafe {
        env::remove_var("OSD_AGUI_AGENT__ENDPOINT");
        env::remove_var("OSD_AGUI_AGENT__XSRF_HEADER");
        env::remove_var("OSD_AGUI_LOG__FORMAT");
        env::remove_var("CONFIG_FILE");
        env::remove_var("AGENT_ENDPOINT");
        env::remove_var("AGENT_TOKEN");
        env::remove_var("LOG_FORMAT");
    }
}

const BIN: &str = "osd-agui-agent";

#[test]
#[serial]
fn test_endpoint_is_required() {
    clear_env_vars();

    let result = AppConfig::load_from_args([BIN, "hello"]);
    assert!(result.is_err());
}

#[test]
#[serial]
fn test_defaults_with_cli_endpoint() {
    clear_env_vars();

    let loaded = AppConfig::load_from_args([
        BIN,
        "--endpoint",
        "http://localhost:5601/api/assistant/agent",
        "hello",
    ])
    .expect("Failed to load config");

    assert_eq!(
        loaded.config.agent.endpoint,
        "http://localhost:5601/api/assistant/agent"
    );
    assert!(loaded.config.agent.xsrf_header);
    assert!(loaded.config.agent.api_key.is_none());
    assert_eq!(loaded.config.log.format, LogFormat::Pretty);
    assert_eq!(loaded.config.log.filter, "info,osd_agui_agent=debug");
    assert_eq!(loaded.cli.message.as_deref(), Some("hello"));
}

#[test]
#[serial]
fn test_env_override() {
    clear_env_vars();
    unsafe {
        env::set_var("OSD_AGUI_AGENT__ENDPOINT", "http://env-host:5601/api/agent");
        env::set_var("OSD_AGUI_AGENT__XSRF_HEADER", "false");
        env::set_var("OSD_AGUI_LOG__FORMAT", "json");
    }

    let loaded = AppConfig::load_from_args([BIN]).expect("Failed to load config");
    assert_eq!(loaded.config.agent.endpoint, "http://env-host:5601/api/agent");
    assert!(!loaded.config.agent.xsrf_header);
    assert_eq!(loaded.config.log.format, LogFormat::Json);

    clear_env_vars();
}

#[test]
#[serial]
fn test_cli_beats_env() {
    clear_env_vars();
    unsafe {
        env::set_var("OSD_AGUI_AGENT__ENDPOINT", "http://env-host:5601/api/agent");
    }

    let loaded = AppConfig::load_from_args([
        BIN,
        "--endpoint",
        "http://cli-host:5601/api/agent",
        "--token",
        "abc",
        "--log-format",
        "json",
    ])
    .expect("Failed to load config");
    assert_eq!(loaded.config.agent.endpoint, "http://cli-host:5601/api/agent");
    assert_eq!(loaded.config.agent.api_key.as_deref(), Some("abc"));
    assert_eq!(loaded.config.log.format, LogFormat::Json);

    clear_env_vars();
}

#[test]
#[serial]
fn test_file_load() {
    clear_env_vars();

    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let file_path = dir.path().join("agent.yaml");
    fs::write(
        &file_path,
        r#"
agent:
  endpoint: http://file-host:5601/api/agent
  connect_timeout_secs: 5
  headers:
    securitytenant: global
log:
  filter: warn
    "#,
    )
    .expect("Failed to write temp config");

    let loaded = AppConfig::load_from_args([
        BIN,
        "--config",
        file_path.to_str().unwrap(),
        "--thread-id",
        "thread-9",
        "--tool-result",
        "call-1=done",
    ])
    .expect("Failed to load config from file");

    assert_eq!(loaded.config.agent.endpoint, "http://file-host:5601/api/agent");
    assert_eq!(loaded.config.agent.connect_timeout_secs, Some(5));
    assert_eq!(
        loaded.config.agent.headers.get("securitytenant").map(String::as_str),
        Some("global")
    );
    assert_eq!(loaded.config.log.filter, "warn");
    assert_eq!(loaded.cli.thread_id.as_deref(), Some("thread-9"));
    assert_eq!(
        loaded.cli.tool_result,
        Some(("call-1".to_string(), "done".to_string()))
    );
}

#[test]
#[serial]
fn test_missing_explicit_file_fails() {
    clear_env_vars();

    let result = AppConfig::load_from_args([
        BIN,
        "--config",
        "/nonexistent/osd-agui.yaml",
        "--endpoint",
        "http://localhost:5601/api/agent",
    ]);
    assert!(result.is_err());
}

#[test]
#[serial]
fn test_invalid_endpoint_rejected() {
    clear_env_vars();

    let result = AppConfig::load_from_args([BIN, "--endpoint", "not a url"]);
    assert!(result.is_err());
}
