//! Client-side view of one submitted instruction.

use std::collections::VecDeque;

use futures::Stream;
use remote_repl_core::{ExecResult, InstructionId, OutputChunk, RequestId};
use remote_repl_transport::{MessageLevel, ServerEvent, Transport};

use crate::{ReplError, ReplSession};

/// Lifecycle of one instruction.
#[derive(Debug, Clone, PartialEq)]
pub enum ExecutionState {
    /// Sent; waiting for the server to assign an instruction id.
    Submitted,
    /// The server acknowledged the request.
    Acknowledged { instruction_id: InstructionId },
    /// Finished with a result. Terminal.
    Completed {
        instruction_id: InstructionId,
        result: ExecResult,
    },
    /// The server reported an error. Terminal.
    Failed { code: String },
}

/// What one dispatched event did to the handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Step {
    Acknowledged,
    Output,
    Completed,
    Discarded,
    Unclassified,
}

/// Handle to a submitted instruction.
///
/// Borrows the session for as long as it lives, so its accessors are the
/// only thing reading the connection. Each accessor reads events one at a
/// time and only as far as it needs to. Dropping a handle before it reaches a
/// terminal state leaves the session busy; server-side work is not aborted.
pub struct ExecutionHandle<'s, T: Transport> {
    session: &'s mut ReplSession<T>,
    request_id: RequestId,
    state: ExecutionState,
    output: VecDeque<OutputChunk>,
}

impl<'s, T: Transport> ExecutionHandle<'s, T> {
    pub(crate) const fn new(session: &'s mut ReplSession<T>, request_id: RequestId) -> Self {
        Self {
            session,
            request_id,
            state: ExecutionState::Submitted,
            output: VecDeque::new(),
        }
    }

    /// Request id this instruction was submitted with.
    #[must_use]
    pub const fn request_id(&self) -> RequestId {
        self.request_id
    }

    /// Server-assigned instruction id, once acknowledged.
    #[must_use]
    pub const fn instruction_id(&self) -> Option<InstructionId> {
        match self.state {
            ExecutionState::Acknowledged { instruction_id }
            | ExecutionState::Completed { instruction_id, .. } => Some(instruction_id),
            ExecutionState::Submitted | ExecutionState::Failed { .. } => None,
        }
    }

    /// Current lifecycle state.
    #[must_use]
    pub const fn state(&self) -> &ExecutionState {
        &self.state
    }

    /// Whether a result or an error has arrived.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(
            self.state,
            ExecutionState::Completed { .. } | ExecutionState::Failed { .. }
        )
    }

    /// Number of received chunks not yet consumed.
    #[must_use]
    pub fn buffered(&self) -> usize {
        self.output.len()
    }

    /// Next output chunk in arrival order.
    ///
    /// Returns `Ok(None)` once the instruction is finished and every buffered
    /// chunk has been consumed. Chunks buffered while waiting for
    /// [`ExecutionHandle::result`] are still returned afterwards.
    ///
    /// # Errors
    /// Returns [`ReplError::ReplProtocol`] if the server reports an error
    /// while waiting, or a transport error.
    pub async fn next_output(&mut self) -> Result<Option<OutputChunk>, ReplError> {
        loop {
            if let Some(chunk) = self.output.pop_front() {
                return Ok(Some(chunk));
            }
            if self.is_terminal() {
                return Ok(None);
            }
            self.step().await?;
        }
    }

    /// Wait for the instruction's result.
    ///
    /// Output arriving in the meantime is buffered for
    /// [`ExecutionHandle::next_output`].
    ///
    /// # Errors
    /// Returns [`ReplError::ReplProtocol`] if the server reported an error for
    /// this instruction (now or earlier), or a transport error.
    pub async fn result(&mut self) -> Result<ExecResult, ReplError> {
        loop {
            match &self.state {
                ExecutionState::Completed { result, .. } => return Ok(result.clone()),
                ExecutionState::Failed { code } => {
                    return Err(ReplError::ReplProtocol { code: code.clone() });
                }
                ExecutionState::Submitted | ExecutionState::Acknowledged { .. } => {}
            }
            self.step().await?;
        }
    }

    /// Output chunks as a stream. The stream ends after the first error.
    pub fn output_stream(&mut self) -> impl Stream<Item = Result<OutputChunk, ReplError>> + '_ {
        futures::stream::unfold((self, false), |(handle, done)| async move {
            if done {
                return None;
            }
            match handle.next_output().await {
                Ok(Some(chunk)) => Some((Ok(chunk), (handle, false))),
                Ok(None) => None,
                Err(err) => Some((Err(err), (handle, true))),
            }
        })
    }

    /// Read one event from the connection and apply it.
    async fn step(&mut self) -> Result<Step, ReplError> {
        let event = self.session.recv_event().await?;

        // Events that do not match this instruction are dropped with a
        // warning instead of failing the read.
        // TODO: decide whether a mismatch should fail the handle once the
        // server guarantees one instruction per connection.
        let step = match event {
            ServerEvent::ExecReceived { request_id, seq } => match self.state {
                ExecutionState::Submitted if request_id == self.request_id => {
                    self.state = ExecutionState::Acknowledged {
                        instruction_id: seq,
                    };
                    Step::Acknowledged
                }
                _ => {
                    tracing::warn!(
                        expected = %self.request_id,
                        %request_id,
                        %seq,
                        "Unexpected exec_received, discarding"
                    );
                    Step::Discarded
                }
            },
            ServerEvent::Output {
                instruction_id,
                chunk,
            } => match self.state {
                ExecutionState::Acknowledged { instruction_id: id } if id == instruction_id => {
                    self.output.push_back(chunk);
                    Step::Output
                }
                _ => {
                    tracing::warn!(
                        expected = ?self.instruction_id(),
                        %instruction_id,
                        "Unexpected output, discarding"
                    );
                    Step::Discarded
                }
            },
            ServerEvent::Result {
                instruction_id,
                result,
            } => match self.state {
                ExecutionState::Acknowledged { instruction_id: id } if id == instruction_id => {
                    self.state = ExecutionState::Completed {
                        instruction_id,
                        result,
                    };
                    self.session.finish();
                    Step::Completed
                }
                _ => {
                    tracing::warn!(
                        expected = ?self.instruction_id(),
                        %instruction_id,
                        "Unexpected result, discarding"
                    );
                    Step::Discarded
                }
            },
            ServerEvent::Error { code, id } => {
                tracing::debug!(%code, ?id, request_id = %self.request_id, "instruction failed");
                self.state = ExecutionState::Failed { code: code.clone() };
                self.session.finish();
                return Err(ReplError::ReplProtocol { code });
            }
            ServerEvent::Connected { machine_name } => {
                self.session.set_machine_name(machine_name);
                Step::Unclassified
            }
            ServerEvent::Message { message, level } => {
                match level {
                    MessageLevel::Info => tracing::info!(%message, "server message"),
                    MessageLevel::Warn => tracing::warn!(%message, "server message"),
                    MessageLevel::Error => tracing::error!(%message, "server message"),
                }
                Step::Unclassified
            }
            ServerEvent::Unknown { kind } => {
                tracing::debug!(%kind, "ignoring unknown event");
                Step::Unclassified
            }
        };

        Ok(step)
    }
}
