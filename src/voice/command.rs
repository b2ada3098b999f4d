//! Command engine - single-shot recognition of one command utterance

use std::time::Duration;

use tokio::sync::watch;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use super::actions::{Parameters, SharedRegistry};
use super::session::{EngineContext, ListeningSession};
use super::types::{CommandConfig, EngineKind, ListeningState};
use crate::error::{Result, VoxError};
use crate::speech::{RecognitionRequest, RecognitionResult, SessionEvent, SessionId, SpeechEvent};

/// What the command engine did with a callback
#[derive(Debug, Clone, PartialEq)]
pub enum CommandOutcome {
    /// Stale or informational callback, session continues
    Ignored,
    /// Accepted text matched a pattern and its action ran
    Executed {
        text: String,
        pattern: String,
        parameters: Parameters,
    },
    /// Accepted text matched no pattern. Not an error.
    Unmatched { text: String },
    /// No transcript reached the confidence threshold
    BelowThreshold { best_confidence: Option<f32> },
    /// Recognition failed
    Failed(VoxError),
}

pub struct CommandEngine {
    config: CommandConfig,
    session: ListeningSession,
    registry: SharedRegistry,
    deadline: Option<Instant>,
}

impl CommandEngine {
    pub fn new(config: CommandConfig, registry: SharedRegistry, ctx: EngineContext) -> Self {
        Self {
            config,
            session: ListeningSession::new(EngineKind::Command, ctx),
            registry,
            deadline: None,
        }
    }

    pub fn config(&self) -> &CommandConfig {
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

    /// When the running session times out
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    pub async fn start(&mut self) -> Result<()> {
        let request = RecognitionRequest::new(self.config.language.clone(), false);
        let session = self.session.start(request).await?;
        self.deadline = Some(Instant::now() + Duration::from_millis(self.config.timeout_ms));
        info!(
            "Listening for a command (session {}, timeout {} ms)",
            session, self.config.timeout_ms
        );
        Ok(())
    }

    pub async fn stop(&mut self) -> Result<()> {
        self.deadline = None;
        self.session.stop().await
    }

    /// Force-stop after the deadline passed. Returns the error to surface.
    pub async fn expire(&mut self) -> VoxError {
        warn!("No command within {} ms", self.config.timeout_ms);
        if let Err(e) = self.stop().await {
            debug!("Command engine: stop after timeout: {}", e);
        }
        VoxError::Timeout(self.config.timeout_ms)
    }

    /// First transcript whose confidence reaches the threshold
    pub fn accept<'a>(&self, result: &'a RecognitionResult) -> Option<&'a str> {
        result
            .transcripts
            .iter()
            .find(|t| t.confidence >= self.config.confidence_threshold)
            .map(|t| t.text.as_str())
    }

    /// Process one speech engine callback.
    pub fn handle(&mut self, event: SessionEvent) -> CommandOutcome {
        if !self.session.accepts(&event) {
            debug!("Command engine: discarding event from stale session {}", event.session);
            return CommandOutcome::Ignored;
        }

        match event.event {
            SpeechEvent::Result(result) if result.is_final => {
                self.deadline = None;
                self.session.finish(ListeningState::Idle);
                self.dispatch(&result)
            }
            SpeechEvent::Error(err) => {
                warn!("Command engine: recognition error: {}", err);
                self.deadline = None;
                self.session.finish(ListeningState::Error(err.to_string()));
                CommandOutcome::Failed(VoxError::Recognition(err))
            }
            _ => CommandOutcome::Ignored,
        }
    }

    fn dispatch(&self, result: &RecognitionResult) -> CommandOutcome {
        let Some(text) = self.accept(result) else {
            let best_confidence = result
                .transcripts
                .iter()
                .map(|t| t.confidence)
                .reduce(f32::max);
            debug!(
                "Command engine: no transcript above {} (best {:?})",
                self.config.confidence_threshold, best_confidence
            );
            return CommandOutcome::BelowThreshold { best_confidence };
        };

        // Lock is released before the action runs
        let Some(resolution) = self.registry.resolve(text) else {
            debug!("No matching command found for: {}", text);
            return CommandOutcome::Unmatched {
                text: text.to_string(),
            };
        };

        info!("Command '{}' matched \"{}\"", resolution.pattern, text);
        resolution.action.invoke(&resolution.parameters);
        CommandOutcome::Executed {
            text: text.to_string(),
            pattern: resolution.pattern,
            parameters: resolution.parameters,
        }
    }
}
