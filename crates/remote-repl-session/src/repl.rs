//! REPL session over one duplex connection.

use remote_repl_core::{Instruction, MachineName, RequestId};
use remote_repl_transport::{ClientFrame, ServerEvent, Transport};

use crate::{ExecutionHandle, ReplError};

/// Whether an instruction is outstanding on the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Ready for a new instruction.
    Idle,
    /// An instruction was submitted and has not reached a result or error.
    Busy { request_id: RequestId },
}

/// Interactive execution session on a remote machine.
///
/// Owns the connection exclusively. At most one instruction runs at a time;
/// there is no queue and no background reader. Events are only read while an
/// [`ExecutionHandle`] accessor is waiting for them. The connection is released
/// by [`ReplSession::close`] or when the session is dropped.
pub struct ReplSession<T: Transport> {
    transport: T,
    machine_name: MachineName,
    next_request_id: RequestId,
    state: SessionState,
}

impl<T: Transport> ReplSession<T> {
    /// Create a session over an established connection.
    #[must_use]
    pub fn new(transport: T, machine_name: MachineName) -> Self {
        Self {
            transport,
            machine_name,
            next_request_id: RequestId::default(),
            state: SessionState::Idle,
        }
    }

    /// Create a session over a fresh connection, waiting for the server to
    /// announce the machine it connected to.
    ///
    /// `requested` may be [`MachineName::NEW`]; the session takes the name
    /// the server reports.
    ///
    /// # Errors
    /// Returns [`ReplError::Handshake`] if the first event is anything other
    /// than `connected`, or a transport error.
    pub async fn connect(transport: T, requested: MachineName) -> Result<Self, ReplError> {
        let mut session = Self::new(transport, requested);
        let event = session.recv_event().await?;
        match event {
            ServerEvent::Connected { machine_name } => {
                session.set_machine_name(machine_name);
                Ok(session)
            }
            other => Err(ReplError::Handshake {
                kind: other.kind().to_string(),
            }),
        }
    }

    /// Machine this session runs on.
    ///
    /// Updated when the server announces the machine it connected to, so a
    /// session opened with [`MachineName::NEW`] learns the assigned name.
    #[must_use]
    pub const fn machine_name(&self) -> &MachineName {
        &self.machine_name
    }

    /// Current session state.
    #[must_use]
    pub const fn state(&self) -> SessionState {
        self.state
    }

    /// Whether a new instruction can be submitted.
    #[must_use]
    pub const fn is_idle(&self) -> bool {
        matches!(self.state, SessionState::Idle)
    }

    /// Submit code with the server's default timeout.
    ///
    /// # Errors
    /// Returns [`ReplError::InstructionAlreadyRunning`] if the previous
    /// instruction has not finished, or a transport error if sending fails.
    pub async fn submit(
        &mut self,
        code: impl Into<String>,
    ) -> Result<ExecutionHandle<'_, T>, ReplError> {
        self.submit_instruction(Instruction::new(code)).await
    }

    /// Submit an instruction.
    ///
    /// # Errors
    /// Returns [`ReplError::InstructionAlreadyRunning`] if the previous
    /// instruction has not finished, or a transport error if sending fails.
    pub async fn submit_instruction(
        &mut self,
        instruction: Instruction,
    ) -> Result<ExecutionHandle<'_, T>, ReplError> {
        if let SessionState::Busy { request_id } = self.state {
            return Err(ReplError::InstructionAlreadyRunning { request_id });
        }

        let request_id = self.next_request_id.post_increment();
        self.transport
            .send(&ClientFrame::exec(instruction, request_id))
            .await?;
        self.state = SessionState::Busy { request_id };
        tracing::debug!(%request_id, machine = %self.machine_name, "instruction submitted");

        Ok(ExecutionHandle::new(self, request_id))
    }

    /// Release the connection.
    ///
    /// # Errors
    /// Returns error if the transport fails while closing. The connection is
    /// released either way.
    pub async fn close(mut self) -> Result<(), ReplError> {
        self.transport.close().await.map_err(ReplError::from)
    }

    pub(crate) async fn recv_event(&mut self) -> Result<ServerEvent, ReplError> {
        Ok(self.transport.recv().await?)
    }

    pub(crate) fn finish(&mut self) {
        self.state = SessionState::Idle;
    }

    pub(crate) fn set_machine_name(&mut self, machine_name: MachineName) {
        if machine_name != self.machine_name {
            tracing::info!(from = %self.machine_name, to = %machine_name, "connected to machine");
            self.machine_name = machine_name;
        }
    }
}
