//! Transport boundary between the agent client and the network.
//!
//! The client only needs one thing from the network: "send this run input,
//! give me the status and a byte stream of the body". [`AgentTransport`]
//! captures that, and [`HttpTransport`] implements it with `reqwest`.
//!
//! Transports receive the run's [`CancellationToken`] and must answer a
//! cancelled token with [`AgentError::Aborted`], both while the request is
//! pending and while the body is being read.

use std::collections::HashMap;
use std::fmt;
use std::pin::Pin;
use std::time::Duration;

use bytes::Bytes;
use futures::{Stream, StreamExt};
use reqwest::header::{ACCEPT, HeaderMap, HeaderName, HeaderValue};
use serde::Deserialize;
use tokio_util::sync::CancellationToken;
use url::Url;

use crate::error::{AgentError, Result};
use crate::input::RunAgentInput;

/// Header the dashboard host requires on every mutating API request.
pub const XSRF_HEADER: &str = "osd-xsrf";

/// Streaming response body.
pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes>> + Send>>;

/// Status and body of an agent endpoint response.
///
/// The status is not validated by the transport; the agent client decides
/// what a non-2xx status means for the run.
pub struct TransportResponse {
    /// HTTP status code.
    pub status: u16,
    /// Reason phrase for the status.
    pub reason: String,
    /// Body stream, if the response has a readable body.
    pub body: Option<ByteStream>,
}

impl TransportResponse {
    /// A 200 response streaming `body`.
    #[must_use]
    pub fn ok(body: ByteStream) -> Self {
        Self {
            status: 200,
            reason: "OK".to_string(),
            body: Some(body),
        }
    }

    /// Whether the status is in the 2xx range.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

impl fmt::Debug for TransportResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransportResponse")
            .field("status", &self.status)
            .field("reason", &self.reason)
            .field("body", &self.body.as_ref().map(|_| "ByteStream"))
            .finish()
    }
}

/// Sends run requests to the agent backend.
#[async_trait::async_trait]
pub trait AgentTransport: Send + Sync {
    /// Send `input` and return the streaming response.
    ///
    /// # Errors
    ///
    /// Returns [`AgentError::Aborted`] if `cancel` fires first, or any
    /// transport error raised while connecting.
    async fn send(
        &self,
        input: &RunAgentInput,
        cancel: CancellationToken,
    ) -> Result<TransportResponse>;
}

/// Agent endpoint connection settings.
#[derive(Clone, Deserialize)]
pub struct AgentSettings {
    /// Full URL of the agent run endpoint.
    pub endpoint: String,
    /// Optional bearer token.
    #[serde(default)]
    pub api_key: Option<String>,
    /// Send the `osd-xsrf` header.
    #[serde(default = "default_true")]
    pub xsrf_header: bool,
    /// Extra headers sent with every run request.
    #[serde(default)]
    pub headers: HashMap<String, String>,
    /// Connect timeout in seconds. Reads are never timed out.
    #[serde(default)]
    pub connect_timeout_secs: Option<u64>,
}

fn default_true() -> bool {
    true
}

impl AgentSettings {
    /// Settings for `endpoint` with everything else defaulted.
    #[must_use]
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            api_key: None,
            xsrf_header: true,
            headers: HashMap::new(),
            connect_timeout_secs: None,
        }
    }
}

impl fmt::Debug for AgentSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AgentSettings")
            .field("endpoint", &self.endpoint)
            .field("api_key", &self.api_key.as_ref().map(|_| "***"))
            .field("xsrf_header", &self.xsrf_header)
            .field("headers", &self.headers.keys().collect::<Vec<_>>())
            .field("connect_timeout_secs", &self.connect_timeout_secs)
            .finish()
    }
}

/// `reqwest` transport that POSTs the run input as JSON and streams the SSE
/// response body.
#[derive(Clone)]
pub struct HttpTransport {
    http: reqwest::Client,
    endpoint: Url,
    api_key: Option<String>,
    headers: HeaderMap,
}

impl fmt::Debug for HttpTransport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpTransport")
            .field("endpoint", &self.endpoint.as_str())
            .finish()
    }
}

impl HttpTransport {
    /// Build a transport from settings.
    ///
    /// # Errors
    ///
    /// Fails if the endpoint is not a valid URL, a header is invalid, or the
    /// HTTP client cannot be built.
    pub fn new(settings: &AgentSettings) -> Result<Self> {
        if settings.endpoint.trim().is_empty() {
            return Err(AgentError::Config("agent endpoint cannot be empty".into()));
        }
        let endpoint = Url::parse(&settings.endpoint)?;

        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("text/event-stream"));
        if settings.xsrf_header {
            headers.insert(XSRF_HEADER, HeaderValue::from_static("osd-fetch"));
        }
        for (name, value) in &settings.headers {
            let name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|e| AgentError::Config(format!("invalid header name {name:?}: {e}")))?;
            let value = HeaderValue::from_str(value)
                .map_err(|e| AgentError::Config(format!("invalid value for header {name}: {e}")))?;
            headers.insert(name, value);
        }

        let mut builder = reqwest::Client::builder();
        if let Some(secs) = settings.connect_timeout_secs {
            builder = builder.connect_timeout(Duration::from_secs(secs));
        }

        Ok(Self {
            http: builder.build()?,
            endpoint,
            api_key: settings.api_key.clone(),
            headers,
        })
    }

    /// The endpoint run requests go to.
    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

#[async_trait::async_trait]
impl AgentTransport for HttpTransport {
    async fn send(
        &self,
        input: &RunAgentInput,
        cancel: CancellationToken,
    ) -> Result<TransportResponse> {
        let mut rb = self
            .http
            .post(self.endpoint.clone())
            .headers(self.headers.clone())
            .json(input);
        if let Some(k) = &self.api_key {
            rb = rb.bearer_auth(k);
        }

        let resp = tokio::select! {
            biased;
            () = cancel.cancelled() => return Err(AgentError::Aborted),
            resp = rb.send() => resp?,
        };

        let status = resp.status();
        tracing::debug!(
            name: "transport.response",
            status = status.as_u16(),
            endpoint = %self.endpoint,
            "Agent endpoint responded"
        );

        Ok(TransportResponse {
            status: status.as_u16(),
            reason: status.canonical_reason().unwrap_or("Unknown Status").to_string(),
            body: Some(body_stream(resp, cancel)),
        })
    }
}

/// Body chunks of `resp`, ending with [`AgentError::Aborted`] once `cancel`
/// fires.
fn body_stream(resp: reqwest::Response, cancel: CancellationToken) -> ByteStream {
    let byte_stream = resp.bytes_stream();

    Box::pin(async_stream::try_stream! {
        futures::pin_mut!(byte_stream);
        loop {
            let chunk = tokio::select! {
                biased;
                () = cancel.cancelled() => Err(AgentError::Aborted),
                next = byte_stream.next() => match next {
                    Some(chunk) => chunk.map_err(AgentError::from),
                    None => break,
                },
            };
            yield chunk?;
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_empty_endpoint() {
        let err = HttpTransport::new(&AgentSettings::new("  ")).unwrap_err();
        assert!(matches!(err, AgentError::Config(_)));
    }

    #[test]
    fn test_keeps_parsed_endpoint() {
        let transport =
            HttpTransport::new(&AgentSettings::new("http://localhost:5601/api/agent")).unwrap();
        assert_eq!(transport.endpoint().host_str(), Some("localhost"));
        assert_eq!(transport.endpoint().port(), Some(5601));
        assert_eq!(transport.endpoint().path(), "/api/agent");
    }

    #[test]
    fn test_rejects_invalid_endpoint() {
        let err = HttpTransport::new(&AgentSettings::new("not a url")).unwrap_err();
        assert!(matches!(err, AgentError::InvalidUrl(_)));
    }

    #[test]
    fn test_default_headers() {
        let transport =
            HttpTransport::new(&AgentSettings::new("http://localhost:5601/api/agent")).unwrap();
        assert_eq!(transport.headers[ACCEPT], "text/event-stream");
        assert_eq!(transport.headers[XSRF_HEADER], "osd-fetch");
    }

    #[test]
    fn test_xsrf_header_can_be_disabled() {
        let mut settings = AgentSettings::new("http://localhost:5601/api/agent");
        settings.xsrf_header = false;
        settings
            .headers
            .insert("x-tenant".to_string(), "global".to_string());

        let transport = HttpTransport::new(&settings).unwrap();
        assert!(transport.headers.get(XSRF_HEADER).is_none());
        assert_eq!(transport.headers["x-tenant"], "global");
    }

    #[test]
    fn test_rejects_invalid_header_name() {
        let mut settings = AgentSettings::new("http://localhost:5601/api/agent");
        settings
            .headers
            .insert("bad header".to_string(), "x".to_string());
        assert!(matches!(
            HttpTransport::new(&settings).unwrap_err(),
            AgentError::Config(_)
        ));
    }

    #[test]
    fn test_success_range() {
        let mut resp = TransportResponse::ok(Box::pin(futures::stream::empty()));
        assert!(resp.is_success());
        resp.status = 302;
        assert!(!resp.is_success());
        resp.status = 500;
        assert!(!resp.is_success());
    }

    #[test]
    fn test_debug_redacts_api_key() {
        let mut settings = AgentSettings::new("http://localhost:5601/api/agent");
        settings.api_key = Some("secret-token".to_string());
        let debug = format!("{settings:?}");
        assert!(!debug.contains("secret-token"));
    }
}
