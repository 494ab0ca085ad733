//! Producer task: reads one response body and pushes events to the
//! subscriber.

use std::sync::{Arc, Mutex};

use bytes::BytesMut;
use futures::StreamExt;
use tokio::sync::mpsc;
use tokio_util::codec::Decoder;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

use crate::error::{AgentError, Result};
use crate::events::BaseEvent;
use crate::input::RunAgentInput;
use crate::sse::{self, SseLineDecoder};
use crate::transport::AgentTransport;

use super::client::{Session, end_connection};

/// Message from the producer to [`RunEvents`](super::RunEvents).
///
/// The channel closing without `Failed` or `Stopped` means the body ended.
#[derive(Debug)]
pub(super) enum Signal {
    Event(BaseEvent),
    Failed(AgentError),
    Stopped,
}

pub(super) struct Producer {
    transport: Arc<dyn AgentTransport>,
    session: Arc<Mutex<Session>>,
    cancel: CancellationToken,
    tx: mpsc::Sender<Signal>,
}

impl Producer {
    pub(super) fn new(
        transport: Arc<dyn AgentTransport>,
        session: Arc<Mutex<Session>>,
        cancel: CancellationToken,
        tx: mpsc::Sender<Signal>,
    ) -> Self {
        Self {
            transport,
            session,
            cancel,
            tx,
        }
    }

    /// Drive the run to its end and report how it ended.
    pub(super) async fn run(self, input: RunAgentInput) {
        let outcome = self.stream_events(&input).await;
        end_connection(&self.session);

        match outcome {
            Ok(()) if self.tx.is_closed() => {
                debug!(name: "run.detached", run_id = %input.run_id, "Subscriber dropped");
            }
            Ok(()) => {
                info!(name: "run.completed", run_id = %input.run_id, "Agent stream ended");
            }
            Err(e) if e.is_abort() || self.cancel.is_cancelled() => {
                info!(name: "run.stopped", run_id = %input.run_id, "Agent run cancelled");
                let _ = self.tx.send(Signal::Stopped).await;
            }
            Err(e) => {
                warn!(name: "run.failed", run_id = %input.run_id, error = %e, "Agent run failed");
                // Status and body failures happen before any event is read.
                if !matches!(e, AgentError::Status { .. } | AgentError::MissingBody) {
                    let _ = self
                        .tx
                        .send(Signal::Event(BaseEvent::run_error(e.to_string())))
                        .await;
                }
                let _ = self.tx.send(Signal::Failed(e)).await;
            }
        }
    }

    /// Request the run and forward every event in the body.
    ///
    /// Returns `Ok` when the body ends or the subscriber goes away. The body
    /// stream is dropped on every return path.
    #[instrument(
        name = "agent.run",
        skip_all,
        fields(thread_id = %input.thread_id, run_id = %input.run_id)
    )]
    async fn stream_events(&self, input: &RunAgentInput) -> Result<()> {
        let response = tokio::select! {
            biased;
            () = self.cancel.cancelled() => return Err(AgentError::Aborted),
            () = self.tx.closed() => return Ok(()),
            response = self.transport.send(input, self.cancel.clone()) => response?,
        };

        if !response.is_success() {
            return Err(AgentError::Status {
                status: response.status,
                message: response.reason,
            });
        }
        let mut body = response.body.ok_or(AgentError::MissingBody)?;

        info!(name: "run.started", "Agent stream opened");

        let mut decoder = SseLineDecoder::new();
        let mut buf = BytesMut::new();
        loop {
            let next = tokio::select! {
                biased;
                () = self.cancel.cancelled() => return Err(AgentError::Aborted),
                () = self.tx.closed() => return Ok(()),
                next = body.next() => next,
            };
            let Some(chunk) = next else { break };
            buf.extend_from_slice(&chunk?);

            while let Some(line) = decoder.decode(&mut buf)? {
                match sse::parse_line(&line) {
                    Some(Ok(event)) => {
                        if self.tx.send(Signal::Event(event)).await.is_err() {
                            return Ok(());
                        }
                    }
                    Some(Err(e)) => {
                        let preview: String = line.chars().take(200).collect();
                        warn!(
                            name: "sse.line.malformed",
                            error = %e,
                            line = %preview,
                            "Skipping malformed SSE data line"
                        );
                    }
                    None => {}
                }
            }
        }

        if !buf.is_empty() {
            debug!(
                name: "sse.partial_line.discarded",
                bytes = buf.len(),
                "Stream ended inside a line"
            );
        }
        Ok(())
    }
}
