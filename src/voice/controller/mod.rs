//! Voice session controller - the single object a host talks to.
//!
//! On `start` the wake engine listens; each wake-word detection stops it and
//! hands over to the command engine; once the command engine is idle again
//! (success, no match, error or timeout) the wake engine is re-armed.

mod driver;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use tokio::sync::{broadcast, mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use self::driver::{Driver, DriverCommand};
use super::actions::{CommandAction, Parameters, SharedRegistry};
use super::command::CommandEngine;
use super::session::EngineContext;
use super::types::{ListeningState, VoiceConfig, VoiceEvent};
use super::wake::WakeEngine;
use crate::audio::{AudioFrame, AudioPreprocessor, PassThrough};
use crate::error::{Result, VoxError};
use crate::speech::{SessionIdAllocator, SpeechEngine};

/// Capacity of the host event channel
const EVENT_CHANNEL_SIZE: usize = 64;

/// Listening state of both engines at one instant
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListeningSnapshot {
    pub wake: ListeningState,
    pub command: ListeningState,
}

impl ListeningSnapshot {
    pub fn is_listening(&self) -> bool {
        self.wake.is_listening() || self.command.is_listening()
    }
}

/// Read-only observers of both engines' states
#[derive(Clone)]
pub struct StateWatch {
    pub wake: watch::Receiver<ListeningState>,
    pub command: watch::Receiver<ListeningState>,
}

impl StateWatch {
    pub fn snapshot(&self) -> ListeningSnapshot {
        ListeningSnapshot {
            wake: self.wake.borrow().clone(),
            command: self.command.borrow().clone(),
        }
    }
}

struct Runtime {
    commands: mpsc::UnboundedSender<DriverCommand>,
    states: StateWatch,
    task: JoinHandle<()>,
}

/// Orchestrates wake-word and command recognition
pub struct VoiceController {
    engine: Arc<dyn SpeechEngine>,
    registry: SharedRegistry,
    events: broadcast::Sender<VoiceEvent>,
    preprocessor: Mutex<Box<dyn AudioPreprocessor>>,
    runtime: Option<Runtime>,
}

impl VoiceController {
    pub fn new(engine: Arc<dyn SpeechEngine>) -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_SIZE);
        Self {
            engine,
            registry: SharedRegistry::new(),
            events,
            preprocessor: Mutex::new(Box::new(PassThrough)),
            runtime: None,
        }
    }

    /// Replace the audio pre-processing hook
    pub fn with_preprocessor(mut self, preprocessor: Box<dyn AudioPreprocessor>) -> Self {
        self.preprocessor = Mutex::new(preprocessor);
        self
    }

    /// Receive host events
    pub fn subscribe(&self) -> broadcast::Receiver<VoiceEvent> {
        self.events.subscribe()
    }

    pub fn is_initialized(&self) -> bool {
        self.runtime.is_some()
    }

    /// Acquire the speech engine and spawn the driver task.
    ///
    /// A permission or availability failure leaves the controller uninitialized.
    pub async fn initialize(&mut self, config: VoiceConfig) -> Result<()> {
        if self.runtime.is_some() {
            return Err(VoxError::AlreadyInitialized);
        }
        config.command.validate()?;

        self.engine.initialize(&config.wake.language).await?;

        let (speech_tx, speech_rx) = mpsc::unbounded_channel();
        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let ctx = EngineContext {
            engine: Arc::clone(&self.engine),
            ids: Arc::new(SessionIdAllocator::default()),
            events: speech_tx,
            notify: self.events.clone(),
        };

        // Actions run on the driver task, which checks the flag before re-arming
        let stop_requested = Arc::new(AtomicBool::new(false));
        if let Some(phrase) = &config.stop_phrase {
            let flag = Arc::clone(&stop_requested);
            let action: Arc<dyn CommandAction> = Arc::new(move |_: &Parameters| {
                flag.store(true, Ordering::SeqCst);
            });
            self.registry.register(phrase, &[], action)?;
        }

        let wake = WakeEngine::new(config.wake.clone(), ctx.clone());
        let command = CommandEngine::new(config.command.clone(), self.registry.clone(), ctx);
        let states = StateWatch {
            wake: wake.subscribe(),
            command: command.subscribe(),
        };

        let driver = Driver {
            wake,
            command,
            speech_rx,
            commands: command_rx,
            events: self.events.clone(),
            running: false,
            stop_requested,
        };
        let task = tokio::spawn(driver.run());

        self.runtime = Some(Runtime {
            commands: command_tx,
            states,
            task,
        });
        info!(
            "Voice controller initialized with {} engine, wake words {:?}",
            self.engine.name(),
            config.wake.wake_words()
        );
        Ok(())
    }

    async fn request(
        &self,
        make: impl FnOnce(oneshot::Sender<Result<()>>) -> DriverCommand,
    ) -> Result<()> {
        let runtime = self.runtime.as_ref().ok_or(VoxError::NotInitialized)?;
        let (tx, rx) = oneshot::channel();
        runtime
            .commands
            .send(make(tx))
            .map_err(|_| VoxError::NotInitialized)?;
        rx.await.map_err(|_| VoxError::NotInitialized)?
    }

    /// Start wake-word listening. Fails with `AlreadyListening` if an engine is active.
    pub async fn start(&self) -> Result<()> {
        self.request(DriverCommand::Start).await
    }

    /// Cancel whichever engine is active and wait until both are idle.
    pub async fn stop(&self) -> Result<()> {
        self.request(DriverCommand::Stop).await
    }

    /// True iff either engine reports `Listening`
    pub fn is_listening(&self) -> bool {
        self.snapshot().is_some_and(|s| s.is_listening())
    }

    /// Current state of both engines, if initialized
    pub fn snapshot(&self) -> Option<ListeningSnapshot> {
        self.runtime.as_ref().map(|r| r.states.snapshot())
    }

    /// Observers for both engines' states, if initialized
    pub fn state_watch(&self) -> Option<StateWatch> {
        self.runtime.as_ref().map(|r| r.states.clone())
    }

    /// Register a command. Re-registering the same pattern text replaces its action.
    pub fn add_command(
        &self,
        pattern: &str,
        parameter_names: &[String],
        action: Arc<dyn CommandAction>,
    ) -> Result<()> {
        self.registry.register(pattern, parameter_names, action)?;
        debug!("Registered command '{}'", pattern.trim());
        Ok(())
    }

    /// Remove a command. Absent patterns are ignored.
    pub fn remove_command(&self, pattern: &str) {
        if self.registry.unregister(pattern) {
            debug!("Removed command '{}'", pattern.trim());
        }
    }

    /// Registered pattern texts in registration order
    pub fn available_commands(&self) -> Vec<String> {
        self.registry.patterns()
    }

    /// Keep recognition running while the host is in the background.
    pub async fn set_background_mode(&self, enabled: bool) -> Result<()> {
        if self.runtime.is_none() {
            return Err(VoxError::NotInitialized);
        }
        self.engine.set_background_mode(enabled).await?;
        let _ = self.events.send(VoiceEvent::BackgroundModeChanged { enabled });
        info!("Background mode {}", if enabled { "enabled" } else { "disabled" });
        Ok(())
    }

    /// Run a captured frame through the pre-processing hook into the engine.
    pub fn feed_audio(&self, frame: AudioFrame) -> Result<()> {
        if self.runtime.is_none() {
            return Err(VoxError::NotInitialized);
        }
        let frame = self
            .preprocessor
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .process(frame);
        self.engine.feed_audio(&frame);
        Ok(())
    }

    /// Stop everything, join the driver and release registered commands.
    ///
    /// The controller can be initialized again afterwards.
    pub async fn shutdown(&mut self) {
        let Some(runtime) = self.runtime.take() else {
            return;
        };
        let (tx, rx) = oneshot::channel();
        if runtime.commands.send(DriverCommand::Shutdown(Some(tx))).is_ok() {
            let _ = rx.await;
        }
        if let Err(e) = runtime.task.await {
            warn!("Voice driver ended abnormally: {}", e);
        }
        self.registry.clear();
        info!("Voice controller shut down");
    }
}

impl Drop for VoiceController {
    fn drop(&mut self) {
        if let Some(runtime) = self.runtime.take() {
            // Driver stops both engines on its own
            let _ = runtime.commands.send(DriverCommand::Shutdown(None));
        }
    }
}
