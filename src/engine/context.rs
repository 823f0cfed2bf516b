use std::sync::Arc;

use arc_swap::ArcSwap;

use crate::core::parser::{normalize_key, split_key_sequence};
use crate::core::{BindingSnapshot, KeyHistory, MatchOutcome, RuleRecord, SequenceMatcher};

/// One input context (a player window, say) with its own key history.
///
/// Contexts share the engine's published snapshot but never each other's
/// history.
pub struct InputContext {
    matcher: SequenceMatcher,
    current: Arc<ArcSwap<BindingSnapshot>>,
}

impl InputContext {
    pub(crate) fn new(current: Arc<ArcSwap<BindingSnapshot>>) -> Self {
        Self {
            matcher: SequenceMatcher::new(),
            current,
        }
    }

    /// Resolves one raw keystroke (`"ctrl+shift+a"`, `"ESC"`).
    ///
    /// Keystrokes that don't normalise to exactly one key are reported as
    /// unrecognized and leave the history untouched.
    pub fn resolve(&mut self, keystroke: &str) -> MatchOutcome {
        let key = match normalize_key(keystroke) {
            Ok(key) => key,
            Err(e) => {
                tracing::debug!(keystroke, error = %e, "Keystroke could not be normalised; ignoring");
                return MatchOutcome::Unrecognized;
            }
        };
        if split_key_sequence(&key).len() != 1 {
            tracing::debug!(keystroke, "Expected a single keystroke; ignoring");
            return MatchOutcome::Unrecognized;
        }
        self.resolve_normalized(&key)
    }

    /// Resolves a keystroke already in normal form.
    pub fn resolve_normalized(&mut self, key: &str) -> MatchOutcome {
        let snapshot = self.current.load();
        self.matcher.resolve(key, &snapshot)
    }

    /// Looks up a full normalised key sequence directly, without touching
    /// the history.
    pub fn resolve_key(&self, key: &str) -> Option<Arc<RuleRecord>> {
        self.current
            .load()
            .lookup(key)
            .map(|binding| Arc::clone(&binding.rule))
    }

    /// Tells the context a keystroke was consumed elsewhere (a menu key
    /// equivalent, say), so any sequence in progress is abandoned.
    pub fn key_was_handled(&mut self) {
        tracing::trace!("Key was handled elsewhere; clearing key history");
        self.matcher.clear_history();
    }

    pub fn history(&self) -> &KeyHistory {
        self.matcher.history()
    }

    pub fn snapshot_version(&self) -> u64 {
        self.current.load().version()
    }
}
