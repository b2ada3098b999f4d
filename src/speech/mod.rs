//! Speech engine collaborator.
//!
//! The voice engines never recognize speech themselves. They ask a
//! [`SpeechEngine`] for a session and receive that session's callbacks on a
//! single inbound channel, each tagged with its [`SessionId`].
//!
//! Contract for implementations:
//! - `start_session` returns once the engine acknowledged the request.
//! - `cancel_session` returns once the session is torn down; no further
//!   events for it should be sent (stray ones are discarded by the engines).
//! - At most one callback is outstanding per session and `Result`/`Error`
//!   callbacks for a session are delivered in order.

mod manual;
mod types;

pub use manual::{Availability, ManualSpeechEngine};
pub use types::{
    RecognitionError, RecognitionRequest, RecognitionResult, SessionEvent, SessionId,
    SessionIdAllocator, SessionSender, SpeechEvent, Transcript,
};

use async_trait::async_trait;

use crate::audio::AudioFrame;
use crate::error::Result;

/// Trait for speech recognition back ends
#[async_trait]
pub trait SpeechEngine: Send + Sync {
    /// Engine name for logs
    fn name(&self) -> &str;

    /// Acquire permissions and check availability.
    ///
    /// Returns `VoxError::PermissionDenied` or `VoxError::EngineUnavailable`
    /// when recognition cannot run on this host.
    async fn initialize(&self, language: &str) -> Result<()>;

    /// Begin a recognition session. Events for it go to `events`.
    async fn start_session(
        &self,
        session: SessionId,
        request: RecognitionRequest,
        events: SessionSender,
    ) -> Result<()>;

    /// Cancel a session. Cancelling an already finished session is not an error.
    async fn cancel_session(&self, session: SessionId) -> Result<()>;

    /// Keep audio capture alive while the host is not foregrounded.
    async fn set_background_mode(&self, _enabled: bool) -> Result<()> {
        Ok(())
    }

    /// Raw audio after pre-processing. Engines that capture audio themselves ignore this.
    fn feed_audio(&self, _frame: &AudioFrame) {}
}
