//! Shared test utilities for controller integration tests

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::broadcast;
use tokio::time::timeout;

use vox::speech::{ManualSpeechEngine, RecognitionResult, SessionId, SpeechEvent};
use vox::voice::{EngineKind, ListeningState, VoiceConfig, VoiceController, VoiceEvent, WakeConfig};

/// Upper bound for any single wait in these tests
pub const WAIT: Duration = Duration::from_secs(2);

pub const WAKE_WORD: &str = "hey assistant";

/// Default test config: one wake word, built-in stop phrase
pub fn test_config() -> VoiceConfig {
    VoiceConfig::new(WakeConfig::new([WAKE_WORD]).expect("valid wake word"))
}

/// Receives controller events and checks that the two engines never
/// report `Listening` at the same time.
pub struct Probe {
    events: broadcast::Receiver<VoiceEvent>,
    wake: ListeningState,
    command: ListeningState,
}

impl Probe {
    pub fn new(events: broadcast::Receiver<VoiceEvent>) -> Self {
        Self {
            events,
            wake: ListeningState::Idle,
            command: ListeningState::Idle,
        }
    }

    fn track(&mut self, event: &VoiceEvent) {
        if let VoiceEvent::StateChanged { engine, state } = event {
            match engine {
                EngineKind::Wake => self.wake = state.clone(),
                EngineKind::Command => self.command = state.clone(),
            }
        }
        assert!(
            !(self.wake.is_listening() && self.command.is_listening()),
            "wake and command engines listening at the same time"
        );
    }

    /// Wait for the first event matching `pred`, skipping others.
    pub async fn expect<F>(&mut self, pred: F) -> VoiceEvent
    where
        F: Fn(&VoiceEvent) -> bool,
    {
        let result = timeout(WAIT, async {
            loop {
                let event = self.events.recv().await.expect("event channel closed");
                self.track(&event);
                if pred(&event) {
                    return event;
                }
            }
        })
        .await;
        result.expect("timed out waiting for event")
    }

    /// Everything received so far without waiting
    pub fn drain(&mut self) -> Vec<VoiceEvent> {
        let mut seen = Vec::new();
        while let Ok(event) = self.events.try_recv() {
            self.track(&event);
            seen.push(event);
        }
        seen
    }
}

pub struct Fixture {
    pub engine: Arc<ManualSpeechEngine>,
    pub controller: VoiceController,
    pub probe: Probe,
}

/// Initialized controller over a manual engine. Not started yet.
pub async fn fixture(config: VoiceConfig) -> Fixture {
    let engine = Arc::new(ManualSpeechEngine::new());
    let mut controller = VoiceController::new(engine.clone());
    let probe = Probe::new(controller.subscribe());
    controller
        .initialize(config)
        .await
        .expect("initialize succeeds");
    Fixture {
        engine,
        controller,
        probe,
    }
}

/// Wait until a session other than `previous` is active.
pub async fn next_session(engine: &ManualSpeechEngine, previous: Option<SessionId>) -> SessionId {
    timeout(WAIT, engine.next_session(previous))
        .await
        .expect("timed out waiting for a session")
        .expect("engine dropped")
}

pub fn final_text(text: &str, confidence: f32) -> SpeechEvent {
    SpeechEvent::Result(RecognitionResult::final_text(text, confidence))
}

pub fn partial_text(text: &str) -> SpeechEvent {
    SpeechEvent::Result(RecognitionResult::partial_text(text))
}

pub fn is_wake_detected(event: &VoiceEvent) -> bool {
    matches!(event, VoiceEvent::WakeWordDetected { .. })
}

pub fn is_state(event: &VoiceEvent, kind: EngineKind, expected: &ListeningState) -> bool {
    matches!(event, VoiceEvent::StateChanged { engine, state } if *engine == kind && state == expected)
}
