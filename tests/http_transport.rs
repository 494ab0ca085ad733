use std::sync::{Arc, Mutex};

use axum::{
    Json, Router,
    body::Body,
    extract::State,
    http::{HeaderMap, StatusCode, header},
    response::{IntoResponse, Response},
    routing::post,
};
use bytes::Bytes;
use futures::StreamExt;
use osd_agui_agent::{
    AgentError, AgentSettings, EventType, OsdAgUiAgent, RunAgentInput, Termination,
};
use serde_json::Value;

#[derive(Clone, Default)]
struct Recorded {
    headers: Arc<Mutex<Option<HeaderMap>>>,
    body: Arc<Mutex<Option<Value>>>,
}

const SSE_BODY: &str = concat!(
    "data: {\"type\":\"RUN_STARTED\",\"threadId\":\"thread-1\",\"runId\":\"run-1\"}\n\n",
    "data: {\"type\":\"TEXT_MESSAGE_CONTENT\",\"messageId\":\"m1\",\"delta\":\"Looking at logs\"}\n\n",
    "data: {\"type\":\"RUN_FINISHED\",\"threadId\":\"thread-1\",\"runId\":\"run-1\"}\n\n",
);

async fn sse_handler(
    State(recorded): State<Recorded>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> impl IntoResponse {
    *recorded.headers.lock().unwrap() = Some(headers);
    *recorded.body.lock().unwrap() = Some(body);
    ([(header::CONTENT_TYPE, "text/event-stream")], SSE_BODY)
}

async fn failing_handler() -> impl IntoResponse {
    (StatusCode::INTERNAL_SERVER_ERROR, "agent unavailable")
}

async fn hanging_handler() -> Response {
    let chunks = futures::stream::iter(vec![Ok::<_, std::io::Error>(Bytes::from_static(
        b"data: {\"type\":\"RUN_STARTED\"}\n",
    ))])
    .chain(futures::stream::pending());
    Response::builder()
        .header(header::CONTENT_TYPE, "text/event-stream")
        .body(Body::from_stream(chunks))
        .unwrap()
}

async fn spawn_server(recorded: Recorded) -> String {
    let app = Router::new()
        .route("/api/agent", post(sse_handler))
        .route("/api/failing", post(failing_handler))
        .route("/api/hanging", post(hanging_handler))
        .with_state(recorded);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}

#[tokio::test]
async fn test_posts_input_and_streams_events() {
    let recorded = Recorded::default();
    let base = spawn_server(recorded.clone()).await;

    let mut settings = AgentSettings::new(format!("{base}/api/agent"));
    settings.api_key = Some("token-123".to_string());
    let agent = OsdAgUiAgent::from_settings(&settings).unwrap();

    let input = RunAgentInput::new("thread-1").with_message(osd_agui_agent::Message::user("why?"));
    let mut events = agent.run_agent(input);

    let mut types = Vec::new();
    while let Some(event) = events.next().await {
        types.push(event.unwrap().event_type);
    }
    assert_eq!(
        types,
        vec![
            EventType::RunStarted,
            EventType::TextMessageContent,
            EventType::RunFinished
        ]
    );
    assert_eq!(events.termination(), Some(&Termination::Completed));

    let headers = recorded.headers.lock().unwrap().clone().unwrap();
    assert_eq!(headers["osd-xsrf"], "osd-fetch");
    assert_eq!(headers[header::ACCEPT], "text/event-stream");
    assert_eq!(headers[header::AUTHORIZATION], "Bearer token-123");

    let body = recorded.body.lock().unwrap().clone().unwrap();
    assert_eq!(body["threadId"], "thread-1");
    assert_eq!(body["messages"][0]["content"], "why?");
}

#[tokio::test]
async fn test_server_error_status_fails_run() {
    let base = spawn_server(Recorded::default()).await;
    let agent = OsdAgUiAgent::from_settings(&AgentSettings::new(format!("{base}/api/failing")))
        .unwrap();

    let mut events = agent.run_agent(RunAgentInput::user_message("hello"));
    let first = events.next().await.unwrap();
    match first {
        Err(AgentError::Status { status, message }) => {
            assert_eq!(status, 500);
            assert_eq!(message, "Internal Server Error");
        }
        other => panic!("expected status error, got {other:?}"),
    }
    assert!(events.next().await.is_none());
}

#[tokio::test]
async fn test_abort_closes_open_stream() {
    let base = spawn_server(Recorded::default()).await;
    let agent = OsdAgUiAgent::from_settings(&AgentSettings::new(format!("{base}/api/hanging")))
        .unwrap();

    let mut events = agent.run_agent(RunAgentInput::user_message("hello"));
    let first = events.next().await.unwrap().unwrap();
    assert_eq!(first.event_type, EventType::RunStarted);

    agent.abort_run();
    assert!(events.next().await.is_none());
    assert_eq!(events.termination(), Some(&Termination::Stopped));
}

#[tokio::test]
async fn test_connection_refused_reports_run_error() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let agent =
        OsdAgUiAgent::from_settings(&AgentSettings::new(format!("http://{addr}/api/agent")))
            .unwrap();
    let mut events = agent.run_agent(RunAgentInput::user_message("hello"));

    let first = events.next().await.unwrap().unwrap();
    assert_eq!(first.event_type, EventType::RunError);
    assert!(first.message().is_some());

    let second = events.next().await.unwrap();
    assert!(matches!(second, Err(AgentError::Http(_))));
    assert!(events.next().await.is_none());
}
