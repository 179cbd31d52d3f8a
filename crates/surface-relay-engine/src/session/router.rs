use futures::{Stream, StreamExt};
use std::rc::Rc;
use thiserror::Error;

use crate::host::{Host, HostError, Port};
use crate::injection::{FillOutcome, InjectionEngine};
use crate::session::protocol::{Command, CommandEnvelope, EditRequest, OutboundMessage, ProtocolError};
use crate::session::{SessionContext, SessionId};
use crate::surface::selection;

/// Reasons a command did not run.
///
/// Everything except [`RelayError::Host`] is an expected, silent outcome and
/// is never reported back to the external session.
#[derive(Debug, Error)]
pub enum RelayError {
    #[error("No editable surface is tracked")]
    NoSurfaceTracked,

    #[error("Document is hidden")]
    DocumentHidden,

    #[error("Session {received} does not belong to this document ({expected})")]
    SessionMismatch {
        expected: SessionId,
        received: SessionId,
    },

    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    #[error(transparent)]
    Host(#[from] HostError),
}

impl RelayError {
    pub fn is_silent(&self) -> bool {
        !matches!(self, RelayError::Host(_))
    }
}

/// What a successfully dispatched command did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dispatch {
    Edit(EditRequest),
    Fill(FillOutcome),
}

/// Routes the commands of one channel against one document context.
///
/// Several routers (one per connected channel) may share a context; they
/// share nothing else.
pub struct SessionRouter<H: Host, P: Port> {
    context: Rc<SessionContext<H::Surface>>,
    host: H,
    port: P,
    injector: InjectionEngine,
}

impl<H: Host, P: Port> SessionRouter<H, P> {
    pub fn new(
        context: Rc<SessionContext<H::Surface>>,
        host: H,
        port: P,
        injector: InjectionEngine,
    ) -> Self {
        Self {
            context,
            host,
            port,
            injector,
        }
    }

    pub fn context(&self) -> &SessionContext<H::Surface> {
        &self.context
    }

    /// Process inbound envelopes strictly one at a time, in arrival order,
    /// until the channel ends.
    pub async fn run<St>(&self, mut inbound: St)
    where
        St: Stream<Item = CommandEnvelope> + Unpin,
    {
        while let Some(envelope) = inbound.next().await {
            self.handle(envelope).await;
        }
        log::debug!("Channel for session {} closed", self.context.id());
    }

    /// Dispatch one envelope, logging instead of returning failures
    pub async fn handle(&self, envelope: CommandEnvelope) -> Option<Dispatch> {
        match self.dispatch(envelope).await {
            Ok(dispatch) => Some(dispatch),
            Err(err) if err.is_silent() => {
                log::debug!("Ignoring command: {err}");
                None
            }
            Err(err) => {
                log::warn!("Command failed: {err}");
                None
            }
        }
    }

    pub async fn dispatch(&self, envelope: CommandEnvelope) -> Result<Dispatch, RelayError> {
        let command = Command::try_from(envelope)?;
        self.execute(command).await
    }

    pub async fn execute(&self, command: Command) -> Result<Dispatch, RelayError> {
        match command {
            Command::EditTextInput => self.edit_text_input().map(Dispatch::Edit),
            Command::FillTextInput { session_id, text } => self
                .fill_text_input(&session_id, &text)
                .await
                .map(Dispatch::Fill),
        }
    }

    fn edit_text_input(&self) -> Result<EditRequest, RelayError> {
        let surface = self
            .context
            .current_surface()
            .ok_or(RelayError::NoSurfaceTracked)?;
        if self.host.is_hidden() {
            return Err(RelayError::DocumentHidden);
        }

        let snapshot = selection::snapshot(&self.host, &surface);
        let request = EditRequest::new(snapshot, self.context.id().clone());
        self.port.post(&OutboundMessage::edit(request.clone()))?;

        log::debug!(
            "Sent edit for session {} ({} chars, cursor {}:{})",
            request.session_id,
            request.text.chars().count(),
            request.cursor_line,
            request.cursor_column
        );
        Ok(request)
    }

    async fn fill_text_input(
        &self,
        session_id: &SessionId,
        text: &str,
    ) -> Result<FillOutcome, RelayError> {
        if self.host.is_hidden() {
            return Err(RelayError::DocumentHidden);
        }
        if !self.context.matches(session_id) {
            return Err(RelayError::SessionMismatch {
                expected: self.context.id().clone(),
                received: session_id.clone(),
            });
        }

        let surface = self.context.current_surface();
        let outcome = self.injector.fill(&self.host, surface.as_ref(), text).await?;
        log::debug!("Filled session {session_id}: {outcome:?}");
        Ok(outcome)
    }
}
