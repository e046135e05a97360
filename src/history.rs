//! Generic undo/redo container around a pure reducer.
//!
//! DESIGN
//! ======
//! `History` owns `past`, `present` and `future` snapshots of some state and
//! forwards actions to a [`Reducer`]. The reducer never sees the history; it
//! maps `(state, action)` to a new state and nothing else.
//!
//! Every successful dispatch is one of three cases:
//!
//! 1. The action's kind is in the configured ignore set: `present` is
//!    replaced in place (transient UI state such as selection).
//! 2. The action carries a non-empty batch token equal to the previous
//!    dispatch's token: `present` is replaced in place, so a continuous drag that
//!    dispatches once per frame is a single undo step.
//! 3. Otherwise the old `present` is pushed onto `past` and `future` is
//!    cleared.
//!
//! In all three the action's token (possibly none) becomes the last token.
//! `finish_batch`, `undo` and `redo` clear it, so the next action always
//! opens a fresh entry.

#[cfg(test)]
#[path = "history_test.rs"]
mod history_test;

use std::collections::HashSet;
use std::fmt;
use std::hash::Hash;

use serde::{Deserialize, Serialize};
use tracing::debug;

/// Opaque marker linking consecutive actions into one history entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BatchToken(String);

impl BatchToken {
    #[must_use]
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// An empty token links nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<&str> for BatchToken {
    fn from(token: &str) -> Self {
        Self::new(token)
    }
}

impl From<String> for BatchToken {
    fn from(token: String) -> Self {
        Self(token)
    }
}

impl fmt::Display for BatchToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// What the history needs to know about an action.
pub trait HistoryAction {
    /// Fieldless discriminant used for the ignore set.
    type Kind: Copy + Eq + Hash + fmt::Debug;

    fn kind(&self) -> Self::Kind;

    fn batch_token(&self) -> Option<&BatchToken>;
}

/// A pure state transition.
pub trait Reducer {
    type State: Clone;
    type Action: HistoryAction;
    type Error;

    /// Produce the next state. Must not depend on anything but its inputs.
    ///
    /// # Errors
    ///
    /// Implementation-defined; an error leaves the history untouched.
    fn reduce(&self, state: &Self::State, action: &Self::Action) -> Result<Self::State, Self::Error>;
}

/// Kind of action handled by reducer `R`.
pub type KindOf<R> = <<R as Reducer>::Action as HistoryAction>::Kind;

/// Construction-time history options.
#[derive(Debug, Clone)]
pub struct HistoryConfig<K> {
    /// Action kinds that replace `present` without recording an entry.
    pub ignore: HashSet<K>,
    /// Maximum number of `past` entries; oldest are dropped first.
    pub limit: Option<usize>,
}

impl<K> Default for HistoryConfig<K> {
    fn default() -> Self {
        Self { ignore: HashSet::new(), limit: None }
    }
}

impl<K: Eq + Hash> HistoryConfig<K> {
    #[must_use]
    pub fn ignoring(kinds: impl IntoIterator<Item = K>) -> Self {
        Self { ignore: kinds.into_iter().collect(), limit: None }
    }

    #[must_use]
    pub fn with_limit(mut self, limit: Option<usize>) -> Self {
        self.limit = limit;
        self
    }
}

/// How the last dispatch was recorded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Recorded {
    /// A new entry was pushed onto `past`.
    Pushed,
    /// Merged into the current entry via a matching batch token.
    Coalesced,
    /// Kind is ignored by history; `present` replaced in place.
    Replaced,
}

pub struct History<R: Reducer> {
    reducer: R,
    config: HistoryConfig<KindOf<R>>,
    /// Oldest first; the last element is the most recent entry.
    past: Vec<R::State>,
    present: R::State,
    /// Furthest first; the last element is the next redo.
    future: Vec<R::State>,
    last_batch_token: Option<BatchToken>,
}

impl<R: Reducer> History<R> {
    #[must_use]
    pub fn new(reducer: R, initial: R::State, config: HistoryConfig<KindOf<R>>) -> Self {
        Self { reducer, config, past: Vec::new(), present: initial, future: Vec::new(), last_batch_token: None }
    }

    #[must_use]
    pub fn present(&self) -> &R::State {
        &self.present
    }

    /// Past entries, most recent first.
    pub fn past(&self) -> impl Iterator<Item = &R::State> {
        self.past.iter().rev()
    }

    /// Undone entries, next redo first.
    pub fn future(&self) -> impl Iterator<Item = &R::State> {
        self.future.iter().rev()
    }

    #[must_use]
    pub fn past_len(&self) -> usize {
        self.past.len()
    }

    #[must_use]
    pub fn future_len(&self) -> usize {
        self.future.len()
    }

    #[must_use]
    pub fn can_undo(&self) -> bool {
        !self.past.is_empty()
    }

    #[must_use]
    pub fn can_redo(&self) -> bool {
        !self.future.is_empty()
    }

    #[must_use]
    pub fn last_batch_token(&self) -> Option<&BatchToken> {
        self.last_batch_token.as_ref()
    }

    /// Reduce `action` against `present` and record the result.
    ///
    /// # Errors
    ///
    /// Propagates the reducer's error. History is unchanged in that case.
    pub fn dispatch(&mut self, action: &R::Action) -> Result<Recorded, R::Error> {
        let next = self.reducer.reduce(&self.present, action)?;
        let kind = action.kind();
        let token = action.batch_token().filter(|t| !t.is_empty()).cloned();

        let recorded = if self.config.ignore.contains(&kind) {
            Recorded::Replaced
        } else if token.is_some() && token == self.last_batch_token {
            Recorded::Coalesced
        } else {
            Recorded::Pushed
        };

        if recorded == Recorded::Pushed {
            let prev = std::mem::replace(&mut self.present, next);
            self.past.push(prev);
            self.future.clear();
            self.enforce_limit();
        } else {
            self.present = next;
        }
        self.last_batch_token = token;

        debug!(?kind, ?recorded, past = self.past.len(), future = self.future.len(), "history dispatch");
        Ok(recorded)
    }

    /// End the current batch. The next action opens a new entry even if it
    /// reuses the same token.
    pub fn finish_batch(&mut self) {
        if let Some(token) = self.last_batch_token.take() {
            debug!(%token, "history batch finished");
        }
    }

    /// Step back one entry. Returns `false` (and changes nothing) when there
    /// is nothing to undo.
    pub fn undo(&mut self) -> bool {
        let Some(prev) = self.past.pop() else {
            return false;
        };
        let current = std::mem::replace(&mut self.present, prev);
        self.future.push(current);
        self.last_batch_token = None;
        debug!(past = self.past.len(), future = self.future.len(), "history undo");
        true
    }

    /// Step forward one entry. Returns `false` (and changes nothing) when
    /// there is nothing to redo.
    pub fn redo(&mut self) -> bool {
        let Some(next) = self.future.pop() else {
            return false;
        };
        let current = std::mem::replace(&mut self.present, next);
        self.past.push(current);
        self.last_batch_token = None;
        debug!(past = self.past.len(), future = self.future.len(), "history redo");
        true
    }

    fn enforce_limit(&mut self) {
        let Some(limit) = self.config.limit else {
            return;
        };
        if self.past.len() > limit {
            let excess = self.past.len() - limit;
            self.past.drain(..excess);
        }
    }
}
