//! Wake engine - listens for the configured wake phrase
//!
//! A wake word matches when it is contained anywhere in the normalized
//! transcript, so recognizer noise around the phrase is tolerated. In
//! continuous mode every quiet session end (final result, `NoMatch`,
//! `SpeechTimeout`) immediately re-issues a recognition request.

use tracing::{debug, info, warn};

use super::session::{EngineContext, ListeningSession};
use super::types::{EngineKind, ListeningState, WakeConfig, normalize};
use crate::error::{Result, VoxError};
use crate::speech::{
    RecognitionRequest, RecognitionResult, SessionEvent, SessionId, SpeechEvent,
};
use tokio::sync::watch;

/// What the wake engine did with a callback
#[derive(Debug, Clone, PartialEq)]
pub enum WakeOutcome {
    /// Stale, informational, or not a detection
    Ignored,
    /// A wake word was heard. Reported at most once per session.
    Detected { wake_word: String, text: String },
    /// Session ended quietly and a new one was started
    Restarted,
    /// Session ended quietly, engine is idle (single-shot mode)
    Ended,
    /// Session ended with an error, engine is idle
    Failed(VoxError),
}

pub struct WakeEngine {
    config: WakeConfig,
    session: ListeningSession,
    /// Set once a detection was reported for the current session
    detected: bool,
}

impl WakeEngine {
    pub fn new(config: WakeConfig, ctx: EngineContext) -> Self {
        Self {
            config,
            session: ListeningSession::new(EngineKind::Wake, ctx),
            detected: false,
        }
    }

    pub fn config(&self) -> &WakeConfig {
        &self.config
    }

    pub fn state(&self) -> ListeningState {
        self.session.state()
    }

    pub fn subscribe(&self) -> watch::Receiver<ListeningState> {
        self.session.subscribe()
    }

    pub fn is_active(&self) -> bool {
        self.session.is_active()
    }

    pub fn owns(&self, session: SessionId) -> bool {
        self.session.owns(session)
    }

    fn request(&self) -> RecognitionRequest {
        RecognitionRequest::new(self.config.language.clone(), self.config.partial_results)
    }

    pub async fn start(&mut self) -> Result<()> {
        self.detected = false;
        let session = self.session.start(self.request()).await?;
        info!(
            "Listening for wake words {:?} (session {})",
            self.config.wake_words(),
            session
        );
        Ok(())
    }

    pub async fn stop(&mut self) -> Result<()> {
        self.detected = false;
        self.session.stop().await
    }

    /// The first configured wake word contained in `text`, if any.
    ///
    /// Used for partial and final hypotheses alike.
    pub fn match_wake_word(&self, text: &str) -> Option<&str> {
        let normalized = normalize(text);
        self.config
            .wake_words()
            .iter()
            .find(|word| normalized.contains(word.as_str()))
            .map(String::as_str)
    }

    fn detect(&self, result: &RecognitionResult) -> Option<(String, String)> {
        result.transcripts.iter().find_map(|transcript| {
            self.match_wake_word(&transcript.text)
                .map(|word| (word.to_string(), transcript.text.clone()))
        })
    }

    /// Process one speech engine callback.
    pub async fn handle(&mut self, event: SessionEvent) -> WakeOutcome {
        if !self.session.accepts(&event) {
            debug!("Wake engine: discarding event from stale session {}", event.session);
            return WakeOutcome::Ignored;
        }

        match event.event {
            SpeechEvent::ReadyForSpeech | SpeechEvent::BeginningOfSpeech => WakeOutcome::Ignored,
            SpeechEvent::EndOfSpeech => {
                // With final results in play, the final result that follows
                // drives the restart instead.
                if self.config.continuous_listening && !self.config.detect_on_final {
                    self.restart().await
                } else {
                    WakeOutcome::Ignored
                }
            }
            SpeechEvent::Result(result) => self.on_result(result).await,
            SpeechEvent::Error(err) if err.is_benign() => {
                debug!("Wake engine: {} - recovering", err);
                self.session_ended().await
            }
            SpeechEvent::Error(err) => {
                warn!("Wake engine: recognition error: {}", err);
                self.detected = false;
                self.session.finish(ListeningState::Error(err.to_string()));
                WakeOutcome::Failed(VoxError::Recognition(err))
            }
        }
    }

    async fn on_result(&mut self, result: RecognitionResult) -> WakeOutcome {
        let eligible = if result.is_final {
            self.config.detect_on_final
        } else {
            self.config.partial_results
        };

        if eligible && !self.detected {
            if let Some((wake_word, text)) = self.detect(&result) {
                self.detected = true;
                info!("Wake word '{}' detected in \"{}\"", wake_word, text);
                if result.is_final {
                    // Session is over on the engine side; the hand-off decides what runs next
                    self.session.finish(ListeningState::Idle);
                }
                return WakeOutcome::Detected { wake_word, text };
            }
        }

        if result.is_final {
            self.session_ended().await
        } else {
            WakeOutcome::Ignored
        }
    }

    async fn session_ended(&mut self) -> WakeOutcome {
        if self.config.continuous_listening {
            self.restart().await
        } else {
            self.detected = false;
            self.session.finish(ListeningState::Idle);
            WakeOutcome::Ended
        }
    }

    async fn restart(&mut self) -> WakeOutcome {
        self.detected = false;
        match self.session.restart(self.request()).await {
            Ok(session) => {
                debug!("Wake engine: restarted as session {}", session);
                WakeOutcome::Restarted
            }
            Err(e) => {
                warn!("Wake engine: restart failed: {}", e);
                WakeOutcome::Failed(e)
            }
        }
    }
}
