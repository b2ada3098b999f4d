//! Listening session shared by the wake and command engines.
//!
//! Lifecycle: `Idle -> Starting -> Listening -> (result | error | stop) -> Idle`.
//! A session only becomes `Listening` once the speech engine acknowledged
//! the request, and only returns to `Idle` once a cancellation was
//! acknowledged. Callbacks are accepted only from the current session while
//! `Listening`; everything else is stale.

use std::sync::Arc;

use tokio::sync::{broadcast, watch};
use tracing::{debug, warn};

use super::types::{EngineKind, ListeningState, VoiceEvent};
use crate::error::{Result, VoxError};
use crate::speech::{
    RecognitionRequest, SessionEvent, SessionId, SessionIdAllocator, SessionSender, SpeechEngine,
};

/// Collaborators every engine needs
#[derive(Clone)]
pub struct EngineContext {
    pub engine: Arc<dyn SpeechEngine>,
    pub ids: Arc<SessionIdAllocator>,
    /// Inbound channel passed to every session the engines start
    pub events: SessionSender,
    /// Host event fan-out (state changes)
    pub notify: broadcast::Sender<VoiceEvent>,
}

/// Internal session phase. `Starting` is only observable while a start
/// request awaits acknowledgment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    Idle,
    Starting,
    Listening,
}

pub struct ListeningSession {
    kind: EngineKind,
    ctx: EngineContext,
    phase: SessionPhase,
    current: Option<SessionId>,
    state: watch::Sender<ListeningState>,
}

impl ListeningSession {
    pub fn new(kind: EngineKind, ctx: EngineContext) -> Self {
        let (state, _) = watch::channel(ListeningState::Idle);
        Self {
            kind,
            ctx,
            phase: SessionPhase::Idle,
            current: None,
            state,
        }
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn current(&self) -> Option<SessionId> {
        self.current
    }

    pub fn state(&self) -> ListeningState {
        self.state.borrow().clone()
    }

    /// Read-only view of the published listening state
    pub fn subscribe(&self) -> watch::Receiver<ListeningState> {
        self.state.subscribe()
    }

    /// True while a session is requested or running
    pub fn is_active(&self) -> bool {
        self.phase != SessionPhase::Idle
    }

    /// True if `session` is the one this engine currently holds
    pub fn owns(&self, session: SessionId) -> bool {
        self.current == Some(session)
    }

    /// Whether a callback should be processed
    pub fn accepts(&self, event: &SessionEvent) -> bool {
        self.phase == SessionPhase::Listening && self.current == Some(event.session)
    }

    /// Request a new session. Fails with `AlreadyListening` unless idle.
    pub async fn start(&mut self, request: RecognitionRequest) -> Result<SessionId> {
        if self.phase != SessionPhase::Idle {
            return Err(VoxError::AlreadyListening);
        }
        self.open(request).await
    }

    /// Cancel the current session and wait for the engine to acknowledge.
    ///
    /// Stopping an idle session is a no-op.
    pub async fn stop(&mut self) -> Result<()> {
        let Some(session) = self.current else {
            self.phase = SessionPhase::Idle;
            return Ok(());
        };

        let result = self.ctx.engine.cancel_session(session).await;
        if let Err(e) = &result {
            warn!("{} engine: cancelling session {} failed: {}", self.kind, session, e);
        }
        self.phase = SessionPhase::Idle;
        self.current = None;
        self.publish(ListeningState::Idle);
        debug!("{} engine: session {} stopped", self.kind, session);
        result
    }

    /// The current session ended on the engine side (final result or error).
    pub fn finish(&mut self, state: ListeningState) {
        self.phase = SessionPhase::Idle;
        self.current = None;
        self.publish(state);
    }

    /// Replace the current session with a fresh one without passing through
    /// `Idle`, so observers see uninterrupted listening.
    pub async fn restart(&mut self, request: RecognitionRequest) -> Result<SessionId> {
        if let Some(previous) = self.current.take() {
            if let Err(e) = self.ctx.engine.cancel_session(previous).await {
                debug!("{} engine: releasing session {}: {}", self.kind, previous, e);
            }
        }
        self.open(request).await
    }

    async fn open(&mut self, request: RecognitionRequest) -> Result<SessionId> {
        let session = self.ctx.ids.allocate();
        self.phase = SessionPhase::Starting;
        self.current = Some(session);

        match self
            .ctx
            .engine
            .start_session(session, request, self.ctx.events.clone())
            .await
        {
            Ok(()) => {
                self.phase = SessionPhase::Listening;
                self.publish(ListeningState::Listening);
                debug!("{} engine: session {} listening", self.kind, session);
                Ok(session)
            }
            Err(e) => {
                self.phase = SessionPhase::Idle;
                self.current = None;
                self.publish(ListeningState::Error(e.to_string()));
                Err(e)
            }
        }
    }

    fn publish(&self, next: ListeningState) {
        let changed = self.state.send_if_modified(|state| {
            if *state == next {
                false
            } else {
                *state = next.clone();
                true
            }
        });
        if changed {
            let _ = self.ctx.notify.send(VoiceEvent::StateChanged {
                engine: self.kind,
                state: next,
            });
        }
    }
}
