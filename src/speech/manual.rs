//! Channel-driven speech engine.
//!
//! Recognition results are pushed in from outside (typed console input, a
//! test, another process) instead of being produced from audio. The engine
//! keeps the bookkeeping a real platform recognizer would: which session is
//! active, how many were started and which were cancelled recently.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use async_trait::async_trait;
use tokio::sync::watch;
use tracing::debug;

use super::types::{
    RecognitionError, RecognitionRequest, SessionEvent, SessionId, SessionSender, SpeechEvent,
};
use super::SpeechEngine;
use crate::audio::AudioFrame;
use crate::error::{Result, VoxError};

/// What `initialize` reports
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Availability {
    #[default]
    Available,
    Unavailable,
    PermissionDenied,
}

/// Cancelled session ids kept for inspection
const CANCELLED_HISTORY: usize = 32;

#[derive(Default)]
struct ManualState {
    current: Option<SessionId>,
    /// Senders of sessions that have not ended or been cancelled
    senders: HashMap<SessionId, SessionSender>,
    started: usize,
    last_request: Option<RecognitionRequest>,
    cancelled: VecDeque<SessionId>,
    fail_next_start: Option<VoxError>,
    background_mode: bool,
    frames_received: u64,
}

/// Speech engine whose callbacks are injected with [`ManualSpeechEngine::emit`].
pub struct ManualSpeechEngine {
    availability: Availability,
    state: Mutex<ManualState>,
    active: watch::Sender<Option<SessionId>>,
}

impl Default for ManualSpeechEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl ManualSpeechEngine {
    pub fn new() -> Self {
        Self::with_availability(Availability::Available)
    }

    pub fn with_availability(availability: Availability) -> Self {
        let (active, _) = watch::channel(None);
        Self {
            availability,
            state: Mutex::new(ManualState::default()),
            active,
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, ManualState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Deliver an event to the active session.
    ///
    /// Returns false when no session is active. Final results and errors end
    /// the session, as they do on a platform recognizer.
    pub fn emit(&self, event: SpeechEvent) -> bool {
        let Some(session) = self.lock().current else {
            debug!("Manual engine: no active session, dropping {:?}", event);
            return false;
        };
        self.emit_to(session, event)
    }

    /// Deliver an event tagged with a specific session.
    ///
    /// Returns false once that session has ended or was cancelled.
    pub fn emit_to(&self, session: SessionId, event: SpeechEvent) -> bool {
        let ends = event.ends_session();
        let sender = {
            let mut state = self.lock();
            if ends {
                if state.current == Some(session) {
                    state.current = None;
                }
                state.senders.remove(&session)
            } else {
                state.senders.get(&session).cloned()
            }
        };
        if ends {
            self.active.send_if_modified(|active| {
                if *active == Some(session) {
                    *active = None;
                    true
                } else {
                    false
                }
            });
        }
        match sender {
            Some(tx) => tx.send(SessionEvent { session, event }).is_ok(),
            None => false,
        }
    }

    /// Currently active session, if any
    pub fn active_session(&self) -> Option<SessionId> {
        self.lock().current
    }

    /// Wait until a session other than `previous` becomes active.
    pub async fn next_session(&self, previous: Option<SessionId>) -> Option<SessionId> {
        let mut rx = self.active.subscribe();
        let active = rx
            .wait_for(|active| active.is_some() && *active != previous)
            .await
            .ok()?;
        *active
    }

    /// Number of sessions started so far
    pub fn sessions_started(&self) -> usize {
        self.lock().started
    }

    /// Request used for the most recent session
    pub fn last_request(&self) -> Option<RecognitionRequest> {
        self.lock().last_request.clone()
    }

    /// Most recently cancelled sessions, oldest first
    pub fn cancelled_sessions(&self) -> Vec<SessionId> {
        self.lock().cancelled.iter().copied().collect()
    }

    /// Sessions that can still receive events
    pub fn open_sessions(&self) -> usize {
        self.lock().senders.len()
    }

    /// Make the next `start_session` call fail with `err`.
    pub fn fail_next_start(&self, err: VoxError) {
        self.lock().fail_next_start = Some(err);
    }

    pub fn background_mode(&self) -> bool {
        self.lock().background_mode
    }

    pub fn frames_received(&self) -> u64 {
        self.lock().frames_received
    }
}

#[async_trait]
impl SpeechEngine for ManualSpeechEngine {
    fn name(&self) -> &str {
        "manual"
    }

    async fn initialize(&self, language: &str) -> Result<()> {
        match self.availability {
            Availability::Available => {
                debug!("Manual engine initialized for {}", language);
                Ok(())
            }
            Availability::Unavailable => Err(VoxError::EngineUnavailable(
                "Speech recognition is not available on this device".to_string(),
            )),
            Availability::PermissionDenied => Err(VoxError::PermissionDenied(
                "Speech recognition access denied".to_string(),
            )),
        }
    }

    async fn start_session(
        &self,
        session: SessionId,
        request: RecognitionRequest,
        events: SessionSender,
    ) -> Result<()> {
        {
            let mut state = self.lock();
            if let Some(err) = state.fail_next_start.take() {
                return Err(err);
            }
            if let Some(current) = state.current {
                debug!("Manual engine busy with session {}", current);
                return Err(VoxError::Recognition(RecognitionError::Busy));
            }
            state.current = Some(session);
            state.senders.insert(session, events);
            state.started += 1;
            state.last_request = Some(request);
        }
        self.active.send_replace(Some(session));
        debug!("Manual engine started session {}", session);
        Ok(())
    }

    async fn cancel_session(&self, session: SessionId) -> Result<()> {
        {
            let mut state = self.lock();
            if state.current == Some(session) {
                state.current = None;
            }
            state.senders.remove(&session);
            if state.cancelled.len() == CANCELLED_HISTORY {
                state.cancelled.pop_front();
            }
            state.cancelled.push_back(session);
        }
        self.active.send_if_modified(|active| {
            if *active == Some(session) {
                *active = None;
                true
            } else {
                false
            }
        });
        debug!("Manual engine cancelled session {}", session);
        Ok(())
    }

    async fn set_background_mode(&self, enabled: bool) -> Result<()> {
        self.lock().background_mode = enabled;
        Ok(())
    }

    fn feed_audio(&self, _frame: &AudioFrame) {
        self.lock().frames_received += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::speech::{RecognitionResult, SessionIdAllocator};
    use tokio::sync::mpsc;

    #[tokio::test]
    async fn test_final_result_ends_session() {
        let engine = ManualSpeechEngine::new();
        let ids = SessionIdAllocator::default();
        let (tx, mut rx) = mpsc::unbounded_channel();

        let id = ids.allocate();
        engine
            .start_session(id, RecognitionRequest::new("en-US", true), tx)
            .await
            .unwrap();
        assert_eq!(engine.active_session(), Some(id));

        assert!(engine.emit(SpeechEvent::Result(RecognitionResult::partial_text("hey"))));
        assert_eq!(engine.active_session(), Some(id));
        assert!(engine.emit(SpeechEvent::Result(RecognitionResult::final_text("hey", 0.9))));
        assert_eq!(engine.active_session(), None);

        assert_eq!(rx.recv().await.unwrap().session, id);
        assert_eq!(rx.recv().await.unwrap().session, id);
        assert!(!engine.emit(SpeechEvent::EndOfSpeech));
        assert!(!engine.emit_to(id, SpeechEvent::EndOfSpeech));
        assert_eq!(engine.open_sessions(), 0);
    }

    #[tokio::test]
    async fn test_bookkeeping_stays_bounded_over_many_sessions() {
        let engine = ManualSpeechEngine::new();
        let ids = SessionIdAllocator::default();
        let (tx, _rx) = mpsc::unbounded_channel();

        let mut last = None;
        for _ in 0..1000 {
            let id = ids.allocate();
            engine
                .start_session(id, RecognitionRequest::new("en-US", true), tx.clone())
                .await
                .unwrap();
            assert!(engine.open_sessions() <= 1);
            engine.cancel_session(id).await.unwrap();
            last = Some(id);
        }

        assert_eq!(engine.sessions_started(), 1000);
        assert_eq!(engine.open_sessions(), 0);
        let cancelled = engine.cancelled_sessions();
        assert_eq!(cancelled.len(), CANCELLED_HISTORY);
        assert_eq!(cancelled.last().copied(), last);
    }

    #[tokio::test]
    async fn test_second_start_while_active_is_busy() {
        let engine = ManualSpeechEngine::new();
        let ids = SessionIdAllocator::default();
        let (tx, _rx) = mpsc::unbounded_channel();

        engine
            .start_session(ids.allocate(), RecognitionRequest::new("en-US", true), tx.clone())
            .await
            .unwrap();
        let err = engine
            .start_session(ids.allocate(), RecognitionRequest::new("en-US", true), tx)
            .await
            .unwrap_err();
        assert_eq!(err, VoxError::Recognition(RecognitionError::Busy));
    }

    #[tokio::test]
    async fn test_availability_is_reported_on_initialize() {
        let denied = ManualSpeechEngine::with_availability(Availability::PermissionDenied);
        assert!(matches!(
            denied.initialize("en-US").await,
            Err(VoxError::PermissionDenied(_))
        ));

        let missing = ManualSpeechEngine::with_availability(Availability::Unavailable);
        assert!(matches!(
            missing.initialize("en-US").await,
            Err(VoxError::EngineUnavailable(_))
        ));
    }
}
