//! CommandRegistry - maps command patterns to actions
//!
//! Entries are keyed by pattern text and kept in registration order.
//! Resolution returns the first entry whose pattern matches the utterance.

use std::sync::{Arc, Mutex, MutexGuard};

use indexmap::IndexMap;
use tracing::debug;

use super::pattern::{CommandPattern, Parameters};
use crate::error::Result;

/// Something to run when a command pattern matches.
///
/// Implementations must not block the caller for unbounded time.
pub trait CommandAction: Send + Sync {
    fn invoke(&self, parameters: &Parameters);
}

impl<F> CommandAction for F
where
    F: Fn(&Parameters) + Send + Sync,
{
    fn invoke(&self, parameters: &Parameters) {
        self(parameters)
    }
}

struct RegistryEntry {
    pattern: CommandPattern,
    action: Arc<dyn CommandAction>,
}

/// Result of resolving an utterance
#[derive(Clone)]
pub struct Resolution {
    /// Pattern text of the matching entry
    pub pattern: String,
    pub action: Arc<dyn CommandAction>,
    pub parameters: Parameters,
}

impl std::fmt::Debug for Resolution {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Resolution")
            .field("pattern", &self.pattern)
            .field("parameters", &self.parameters)
            .finish_non_exhaustive()
    }
}

/// Registry of command patterns
#[derive(Default)]
pub struct CommandRegistry {
    entries: IndexMap<String, RegistryEntry>,
}

impl CommandRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an action, replacing any entry with the same pattern text.
    pub fn register(
        &mut self,
        pattern: &str,
        parameter_names: &[String],
        action: Arc<dyn CommandAction>,
    ) -> Result<()> {
        let pattern = CommandPattern::with_parameters(pattern, parameter_names)?;
        self.insert(pattern, action);
        Ok(())
    }

    /// Insert an already compiled pattern
    pub fn insert(&mut self, pattern: CommandPattern, action: Arc<dyn CommandAction>) {
        let key = pattern.raw().to_string();
        if self
            .entries
            .insert(key.clone(), RegistryEntry { pattern, action })
            .is_some()
        {
            debug!("Replaced action for command '{}'", key);
        }
    }

    /// Remove an entry. Returns false if nothing was registered for the text.
    pub fn unregister(&mut self, pattern: &str) -> bool {
        self.entries.shift_remove(pattern.trim()).is_some()
    }

    /// Find the first entry (registration order) whose pattern matches.
    pub fn resolve(&self, utterance: &str) -> Option<Resolution> {
        self.entries.values().find_map(|entry| {
            if !entry.pattern.matches(utterance) {
                return None;
            }
            Some(Resolution {
                pattern: entry.pattern.raw().to_string(),
                action: Arc::clone(&entry.action),
                parameters: entry.pattern.extract_parameters(utterance),
            })
        })
    }

    /// Registered pattern texts in registration order
    pub fn patterns(&self) -> Vec<String> {
        self.entries.keys().cloned().collect()
    }

    pub fn contains(&self, pattern: &str) -> bool {
        self.entries.contains_key(pattern.trim())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

/// Registry shared between the host (registering) and the command engine
/// (resolving). Each call holds the lock for exactly one operation.
#[derive(Clone, Default)]
pub struct SharedRegistry {
    inner: Arc<Mutex<CommandRegistry>>,
}

impl SharedRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, CommandRegistry> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn register(
        &self,
        pattern: &str,
        parameter_names: &[String],
        action: Arc<dyn CommandAction>,
    ) -> Result<()> {
        // Compile outside the lock
        let pattern = CommandPattern::with_parameters(pattern, parameter_names)?;
        self.lock().insert(pattern, action);
        Ok(())
    }

    pub fn unregister(&self, pattern: &str) -> bool {
        self.lock().unregister(pattern)
    }

    pub fn resolve(&self, utterance: &str) -> Option<Resolution> {
        self.lock().resolve(utterance)
    }

    pub fn patterns(&self) -> Vec<String> {
        self.lock().patterns()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    pub fn clear(&self) {
        self.lock().clear();
    }
}
