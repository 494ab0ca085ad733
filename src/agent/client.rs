//! Agent client and its connection session.

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::error::Result;
use crate::input::RunAgentInput;
use crate::transport::{AgentSettings, AgentTransport, HttpTransport};

use super::producer::{Producer, Signal};
use super::run_events::RunEvents;

/// Events buffered between the producer task and a slow subscriber.
const EVENT_BUFFER: usize = 64;

/// Connection state shared by every run of one client.
#[derive(Debug, Default)]
pub(super) struct Session {
    /// Token of the current connection. Replaced, never reset.
    cancel: Option<CancellationToken>,
    /// Producers currently reading a response body.
    in_flight: usize,
}

impl Session {
    fn is_active(&self) -> bool {
        self.in_flight > 0
    }
}

/// Streaming AG-UI agent client.
///
/// Clones share the same session, so a clone is the same client.
#[derive(Clone)]
pub struct OsdAgUiAgent {
    transport: Arc<dyn AgentTransport>,
    session: Arc<Mutex<Session>>,
}

impl fmt::Debug for OsdAgUiAgent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OsdAgUiAgent")
            .field("transport", &"AgentTransport")
            .field("session", &*self.lock_session())
            .finish()
    }
}

impl OsdAgUiAgent {
    /// Create a client over `transport`.
    pub fn new(transport: impl AgentTransport + 'static) -> Self {
        Self::with_transport(Arc::new(transport))
    }

    /// Create a client over a shared transport.
    pub fn with_transport(transport: Arc<dyn AgentTransport>) -> Self {
        Self {
            transport,
            session: Arc::new(Mutex::new(Session::default())),
        }
    }

    /// Create a client with an [`HttpTransport`] built from `settings`.
    pub fn from_settings(settings: &AgentSettings) -> Result<Self> {
        Ok(Self::new(HttpTransport::new(settings)?))
    }

    /// Start a run.
    ///
    /// Nothing happens until the returned stream is first polled. That first
    /// poll applies the reuse policy, marks the session active and spawns the
    /// producer task, so it must happen inside a Tokio runtime.
    pub fn run_agent(&self, input: RunAgentInput) -> RunEvents {
        RunEvents::new(self.clone(), input)
    }

    /// Cancel the current connection, if any.
    ///
    /// Every run sharing the connection stops at its next read and ends as
    /// [`Termination::Stopped`](super::Termination::Stopped).
    pub fn abort_run(&self) {
        let session = self.lock_session();
        if let Some(token) = &session.cancel {
            debug!(name: "run.abort", in_flight = session.in_flight, "Aborting agent run");
            token.cancel();
        }
    }

    /// Whether a run is currently reading a response body.
    pub fn is_active(&self) -> bool {
        self.lock_session().is_active()
    }

    /// Apply the reuse policy and spawn the producer for `input`.
    pub(super) fn start(&self, input: RunAgentInput) -> mpsc::Receiver<Signal> {
        let cancel = self.begin_connection();
        let (tx, rx) = mpsc::channel(EVENT_BUFFER);

        let producer = Producer::new(
            Arc::clone(&self.transport),
            Arc::clone(&self.session),
            cancel,
            tx,
        );
        tokio::spawn(producer.run(input));

        rx
    }

    fn begin_connection(&self) -> CancellationToken {
        let mut session = self.lock_session();

        let token = match session.cancel.take() {
            Some(current) if session.is_active() && !current.is_cancelled() => {
                debug!(
                    name: "run.reused_connection",
                    in_flight = session.in_flight,
                    "Joining in-flight connection"
                );
                current
            }
            Some(stale) => {
                debug!(name: "run.superseded", "Cancelling previous connection");
                stale.cancel();
                CancellationToken::new()
            }
            None => CancellationToken::new(),
        };

        session.cancel = Some(token.clone());
        session.in_flight += 1;
        token
    }

    fn lock_session(&self) -> MutexGuard<'_, Session> {
        lock(&self.session)
    }
}

/// Lock the session, recovering it if a holder panicked.
fn lock(session: &Mutex<Session>) -> MutexGuard<'_, Session> {
    session.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Mark one producer as finished.
pub(super) fn end_connection(session: &Mutex<Session>) {
    let mut session = lock(session);
    session.in_flight = session.in_flight.saturating_sub(1);
}
