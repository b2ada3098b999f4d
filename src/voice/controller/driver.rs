//! Controller driver task.
//!
//! One task owns both engines. Host commands, speech engine callbacks and
//! the command timeout are serialized through a single `select!` loop, so
//! engine transitions never interleave. Activation of one engine is only
//! issued after the other acknowledged `Idle`.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::{broadcast, mpsc, oneshot};
use tokio::time::{Instant, sleep_until};
use tracing::{debug, info, warn};

use crate::error::{Result, VoxError};
use crate::speech::SessionEvent;
use crate::voice::command::{CommandEngine, CommandOutcome};
use crate::voice::types::VoiceEvent;
use crate::voice::wake::{WakeEngine, WakeOutcome};

/// Requests from the controller handle to the driver
pub(super) enum DriverCommand {
    Start(oneshot::Sender<Result<()>>),
    Stop(oneshot::Sender<Result<()>>),
    Shutdown(Option<oneshot::Sender<()>>),
}

pub(super) struct Driver {
    pub wake: WakeEngine,
    pub command: CommandEngine,
    pub speech_rx: mpsc::UnboundedReceiver<SessionEvent>,
    pub commands: mpsc::UnboundedReceiver<DriverCommand>,
    pub events: broadcast::Sender<VoiceEvent>,
    /// Host asked for listening; wake engine is re-armed after each command
    pub running: bool,
    /// Raised by the stop-phrase action while the driver dispatches it
    pub stop_requested: Arc<AtomicBool>,
}

impl Driver {
    pub async fn run(mut self) {
        debug!("Voice driver started");
        loop {
            let deadline = self.command.deadline();
            tokio::select! {
                command = self.commands.recv() => match command {
                    Some(DriverCommand::Shutdown(reply)) => {
                        self.teardown().await;
                        if let Some(reply) = reply {
                            let _ = reply.send(());
                        }
                        break;
                    }
                    Some(command) => self.on_command(command).await,
                    None => {
                        self.teardown().await;
                        break;
                    }
                },
                Some(event) = self.speech_rx.recv() => self.on_speech(event).await,
                _ = sleep_until(deadline.unwrap_or_else(Instant::now)), if deadline.is_some() => {
                    self.on_timeout().await;
                }
            }
        }
        debug!("Voice driver stopped");
    }

    async fn on_command(&mut self, command: DriverCommand) {
        match command {
            DriverCommand::Start(reply) => {
                let _ = reply.send(self.start().await);
            }
            DriverCommand::Stop(reply) => {
                let _ = reply.send(self.stop().await);
            }
            DriverCommand::Shutdown(_) => {}
        }
    }

    async fn start(&mut self) -> Result<()> {
        if self.wake.is_active() || self.command.is_active() {
            return Err(VoxError::AlreadyListening);
        }
        self.running = true;
        if let Err(e) = self.wake.start().await {
            self.running = false;
            return Err(e);
        }
        Ok(())
    }

    async fn stop(&mut self) -> Result<()> {
        self.running = false;
        let wake = self.wake.stop().await;
        let command = self.command.stop().await;
        info!("Stopped listening");
        wake.and(command)
    }

    async fn teardown(&mut self) {
        if let Err(e) = self.stop().await {
            debug!("Teardown: {}", e);
        }
    }

    async fn on_speech(&mut self, event: SessionEvent) {
        if self.wake.owns(event.session) {
            match self.wake.handle(event).await {
                WakeOutcome::Detected { wake_word, text } => self.hand_off(wake_word, text).await,
                WakeOutcome::Failed(err) => {
                    self.running = false;
                    self.surface(err);
                }
                WakeOutcome::Ended => self.running = false,
                WakeOutcome::Restarted | WakeOutcome::Ignored => {}
            }
        } else if self.command.owns(event.session) {
            match self.command.handle(event) {
                CommandOutcome::Ignored => return,
                CommandOutcome::Executed {
                    text,
                    pattern,
                    parameters,
                } => {
                    self.emit(VoiceEvent::CommandRecognized { text });
                    self.emit(VoiceEvent::CommandExecuted {
                        pattern,
                        parameters,
                    });
                }
                CommandOutcome::Unmatched { .. } | CommandOutcome::BelowThreshold { .. } => {}
                CommandOutcome::Failed(err) => self.surface(err),
            }
            if self.stop_requested.swap(false, Ordering::SeqCst) {
                // Stop before the wake engine could be re-armed
                info!("Stop phrase recognized");
                if let Err(e) = self.stop().await {
                    self.surface(e);
                }
                return;
            }
            self.resume_wake().await;
        } else {
            debug!("Discarding event from superseded session {}", event.session);
        }
    }

    /// Wake word heard: wake engine fully stops before the command engine starts.
    async fn hand_off(&mut self, wake_word: String, text: String) {
        if let Err(e) = self.wake.stop().await {
            warn!("Wake engine did not stop cleanly: {}", e);
        }
        self.emit(VoiceEvent::WakeWordDetected { wake_word, text });

        if let Err(e) = self.command.start().await {
            self.surface(e);
            self.resume_wake().await;
        }
    }

    async fn on_timeout(&mut self) {
        let err = self.command.expire().await;
        self.surface(err);
        self.resume_wake().await;
    }

    /// Return to wake-word listening once the command engine is idle.
    async fn resume_wake(&mut self) {
        if !self.running || self.command.is_active() || self.wake.is_active() {
            return;
        }
        if let Err(e) = self.wake.start().await {
            self.running = false;
            self.surface(e);
        }
    }

    fn surface(&self, err: VoxError) {
        warn!("Voice error ({}): {}", err.kind(), err);
        self.emit(VoiceEvent::error(&err));
    }

    fn emit(&self, event: VoiceEvent) {
        // No subscribers is fine
        let _ = self.events.send(event);
    }
}
