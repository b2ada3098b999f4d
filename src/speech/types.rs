//! Speech engine value types: session identity, results and errors.

use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::mpsc;

/// Identity of one recognition attempt.
///
/// Every callback from the speech engine is tagged with the session it
/// belongs to, so events from a superseded session can be discarded by
/// comparing identities instead of listening flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SessionId(u64);

impl SessionId {
    pub fn value(&self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Hands out unique session ids. Shared by all engines of one controller.
#[derive(Debug)]
pub struct SessionIdAllocator {
    next: AtomicU64,
}

impl Default for SessionIdAllocator {
    fn default() -> Self {
        Self {
            next: AtomicU64::new(1),
        }
    }
}

impl SessionIdAllocator {
    pub fn allocate(&self) -> SessionId {
        SessionId(self.next.fetch_add(1, Ordering::SeqCst))
    }
}

/// One candidate transcript with the engine's confidence score
#[derive(Debug, Clone, PartialEq)]
pub struct Transcript {
    pub text: String,
    /// Confidence in [0, 1]
    pub confidence: f32,
}

impl Transcript {
    pub fn new(text: impl Into<String>, confidence: f32) -> Self {
        Self {
            text: text.into(),
            confidence,
        }
    }
}

/// Partial or final recognition hypotheses, best candidate first.
#[derive(Debug, Clone, PartialEq)]
pub struct RecognitionResult {
    pub transcripts: Vec<Transcript>,
    pub is_final: bool,
}

impl RecognitionResult {
    /// A final result with a single transcript.
    pub fn final_text(text: impl Into<String>, confidence: f32) -> Self {
        Self {
            transcripts: vec![Transcript::new(text, confidence)],
            is_final: true,
        }
    }

    /// A partial hypothesis. Engines rarely score partials, so confidence is 0.
    pub fn partial_text(text: impl Into<String>) -> Self {
        Self {
            transcripts: vec![Transcript::new(text, 0.0)],
            is_final: false,
        }
    }

    pub fn best(&self) -> Option<&Transcript> {
        self.transcripts.first()
    }
}

/// Errors reported by the speech engine for a session
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RecognitionError {
    #[error("Audio recording error")]
    Audio,
    #[error("Client side error")]
    ClientError,
    #[error("Insufficient permissions")]
    InsufficientPermissions,
    #[error("Network error")]
    Network,
    #[error("Network timeout")]
    NetworkTimeout,
    #[error("No match found")]
    NoMatch,
    #[error("RecognitionService busy")]
    Busy,
    #[error("Server error")]
    Server,
    #[error("No speech input")]
    SpeechTimeout,
    #[error("Unknown error: {0}")]
    Unknown(String),
}

impl RecognitionError {
    /// Errors that are expected while waiting for speech and are recovered
    /// locally by the wake restart policy.
    pub fn is_benign(&self) -> bool {
        matches!(self, RecognitionError::NoMatch | RecognitionError::SpeechTimeout)
    }

    /// Parse the snake_case name used on the console driver (`!no_match`).
    pub fn from_name(name: &str) -> Self {
        match name.trim().to_lowercase().as_str() {
            "audio" => RecognitionError::Audio,
            "client" | "client_error" => RecognitionError::ClientError,
            "permissions" | "insufficient_permissions" => {
                RecognitionError::InsufficientPermissions
            }
            "network" => RecognitionError::Network,
            "network_timeout" => RecognitionError::NetworkTimeout,
            "no_match" | "nomatch" => RecognitionError::NoMatch,
            "busy" => RecognitionError::Busy,
            "server" => RecognitionError::Server,
            "speech_timeout" => RecognitionError::SpeechTimeout,
            other => RecognitionError::Unknown(other.to_string()),
        }
    }
}

/// Callback delivered by the speech engine for one session
#[derive(Debug, Clone, PartialEq)]
pub enum SpeechEvent {
    ReadyForSpeech,
    BeginningOfSpeech,
    EndOfSpeech,
    /// Partial (`is_final == false`) or final hypotheses
    Result(RecognitionResult),
    Error(RecognitionError),
}

impl SpeechEvent {
    /// True for events after which the engine considers the session over.
    pub fn ends_session(&self) -> bool {
        match self {
            SpeechEvent::Result(result) => result.is_final,
            SpeechEvent::Error(_) => true,
            _ => false,
        }
    }
}

/// A speech event tagged with the session that produced it.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionEvent {
    pub session: SessionId,
    pub event: SpeechEvent,
}

/// Inbound channel every session delivers its events on.
pub type SessionSender = mpsc::UnboundedSender<SessionEvent>;

/// Parameters for one recognition attempt
#[derive(Debug, Clone, PartialEq)]
pub struct RecognitionRequest {
    pub language: String,
    pub partial_results: bool,
    pub max_results: u32,
}

impl RecognitionRequest {
    pub fn new(language: impl Into<String>, partial_results: bool) -> Self {
        Self {
            language: language.into(),
            partial_results,
            max_results: 3,
        }
    }
}
