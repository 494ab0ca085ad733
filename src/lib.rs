//! Streaming AG-UI agent client for dashboard investigation chat.
//!
//! Sends a run request to an AG-UI agent backend and streams the agent's
//! Server-Sent Events back as typed events, with cooperative cancellation
//! that leaves an in-flight stream alone while tool results are submitted
//! into the same run.
//!
//! # Modules
//!
//! - [`agent`]: the streaming client, its session and event stream
//! - [`events`]: AG-UI event model
//! - [`input`]: run request payload
//! - [`sse`]: SSE line framing and `data:` parsing
//! - [`transport`]: transport boundary and the `reqwest` implementation
//! - [`config`]: layered settings for the CLI
//! - [`telemetry`]: structured logging setup

// Allow pedantic clippy warnings that don't add value for this codebase
#![allow(clippy::missing_fields_in_debug)]
#![allow(clippy::cargo_common_metadata)]
#![allow(clippy::multiple_crate_versions)]

pub mod agent;
pub mod config;
pub mod error;
pub mod events;
pub mod input;
pub mod sse;
pub mod telemetry;
pub mod transport;

pub use agent::{OsdAgUiAgent, RunEvents, Termination};
pub use error::{AgentError, Result};
pub use events::{BaseEvent, EventType};
pub use input::{Message, MessageRole, RunAgentInput};
pub use transport::{AgentSettings, AgentTransport, ByteStream, HttpTransport, TransportResponse};
