//! Subscriber side of a run.

use std::fmt;
use std::pin::Pin;
use std::task::{Context, Poll};

use futures::Stream;
use futures::stream::FusedStream;
use tokio_stream::wrappers::ReceiverStream;

use crate::error::AgentError;
use crate::events::BaseEvent;
use crate::input::RunAgentInput;

use super::client::OsdAgUiAgent;
use super::producer::Signal;

/// How a run's event stream ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Termination {
    /// The response body ended.
    Completed,
    /// The run was cancelled. No error was reported.
    Stopped,
    /// The run failed with this message.
    Failed(String),
}

enum State {
    /// Not polled yet; nothing has been sent.
    Idle {
        agent: OsdAgUiAgent,
        input: Box<RunAgentInput>,
    },
    Live(ReceiverStream<Signal>),
    Done,
}

/// Event stream of one run.
///
/// Yields events in wire order. A failed run yields a final `Err` and then
/// ends; a cancelled run just ends. After the stream returns `None`,
/// [`termination`](Self::termination) says which of the three happened.
///
/// Dropping the stream stops its producer at the next read without
/// cancelling the shared connection.
pub struct RunEvents {
    state: State,
    termination: Option<Termination>,
}

impl fmt::Debug for RunEvents {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = match &self.state {
            State::Idle { .. } => "idle",
            State::Live(_) => "live",
            State::Done => "done",
        };
        f.debug_struct("RunEvents")
            .field("state", &state)
            .field("termination", &self.termination)
            .finish()
    }
}

impl RunEvents {
    pub(super) fn new(agent: OsdAgUiAgent, input: RunAgentInput) -> Self {
        Self {
            state: State::Idle {
                agent,
                input: Box::new(input),
            },
            termination: None,
        }
    }

    /// How the run ended, once the stream is exhausted.
    pub fn termination(&self) -> Option<&Termination> {
        self.termination.as_ref()
    }

    fn finish(&mut self, termination: Termination) {
        self.state = State::Done;
        self.termination.get_or_insert(termination);
    }
}

impl Stream for RunEvents {
    type Item = Result<BaseEvent, AgentError>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();

        loop {
            match std::mem::replace(&mut this.state, State::Done) {
                State::Idle { agent, input } => {
                    this.state = State::Live(ReceiverStream::new(agent.start(*input)));
                }
                State::Live(mut rx) => {
                    return match Pin::new(&mut rx).poll_next(cx) {
                        Poll::Pending => {
                            this.state = State::Live(rx);
                            Poll::Pending
                        }
                        Poll::Ready(Some(Signal::Event(event))) => {
                            this.state = State::Live(rx);
                            Poll::Ready(Some(Ok(event)))
                        }
                        Poll::Ready(Some(Signal::Failed(e))) => {
                            this.finish(Termination::Failed(e.to_string()));
                            Poll::Ready(Some(Err(e)))
                        }
                        Poll::Ready(Some(Signal::Stopped)) => {
                            this.finish(Termination::Stopped);
                            Poll::Ready(None)
                        }
                        Poll::Ready(None) => {
                            this.finish(Termination::Completed);
                            Poll::Ready(None)
                        }
                    };
                }
                State::Done => return Poll::Ready(None),
            }
        }
    }
}

impl FusedStream for RunEvents {
    fn is_terminated(&self) -> bool {
        matches!(self.state, State::Done)
    }
}
