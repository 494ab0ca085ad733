//! Streaming AG-UI agent client.
//!
//! [`OsdAgUiAgent`] sends a [`RunAgentInput`](crate::input::RunAgentInput) to
//! the agent backend and turns the SSE response into a stream of
//! [`BaseEvent`](crate::events::BaseEvent)s.
//!
//! # Architecture
//!
//! - [`OsdAgUiAgent`]: owns the connection session and applies the reuse
//!   policy when a run starts
//! - [`RunEvents`]: the single-subscriber event stream returned by
//!   [`OsdAgUiAgent::run_agent`]
//! - a producer task per run that reads the body and pushes events
//!
//! # Connection Reuse
//!
//! Tool results are submitted as a follow-up run while the first run's
//! stream is still open. Starting that follow-up must not cancel the open
//! stream, so a run started while another is in flight shares its
//! cancellation token. A run started when nothing is in flight cancels the
//! previous token and gets a fresh one.
//!
//! # Example
//!
//! ```rust,no_run
//! use futures::StreamExt;
//! use osd_agui_agent::{AgentSettings, OsdAgUiAgent, RunAgentInput};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let agent = OsdAgUiAgent::from_settings(&AgentSettings::new(
//!     "http://localhost:5601/api/assistant/agent",
//! ))?;
//!
//! let mut events = agent.run_agent(RunAgentInput::user_message("Why did latency spike?"));
//! while let Some(event) = events.next().await {
//!     println!("{}", event?.event_type);
//! }
//! println!("run ended: {:?}", events.termination());
//! # Ok(())
//! # }
//! ```

mod client;
mod producer;
mod run_events;

pub use client::OsdAgUiAgent;
pub use run_events::{RunEvents, Termination};
