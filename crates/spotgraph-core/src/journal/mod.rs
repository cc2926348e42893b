//! Undo/redo journal.
//!
//! The journal observes the graph as a [`GraphListener`] and records one
//! [`UndoEdit`] per mutation while [`JournalState::Recording`]. Edits are kept
//! in a capacity-bounded ring: when full, the oldest edit is evicted, so undo
//! depth is bounded by the capacity.
//!
//! Edits are grouped into steps by undo points. [`UndoJournal::undo`] reverts
//! everything back to the previous undo point; [`UndoJournal::redo`] replays
//! forward to the next one. Recording after an undo truncates the redo tail.
//!
//! Replay switches the journal to [`JournalState::Replaying`], so the inverse
//! mutations it performs are never journaled themselves.

mod edit;

#[cfg(test)]
mod tests;

pub use edit::UndoEdit;

use std::collections::VecDeque;

use crate::config::UndoConfig;
use crate::error::{Error, Result};
use crate::graph::{Graph, GraphEvent, GraphListener};

/// Default number of edits kept by a journal.
pub const DEFAULT_UNDO_CAPACITY: usize = 1000;

/// Whether the journal records incoming mutations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum JournalState {
    /// Mutations are appended to the journal.
    #[default]
    Recording,
    /// The journal is replaying edits; mutations are not recorded.
    Replaying,
}

#[derive(Debug, Clone)]
struct JournalEntry {
    edit: UndoEdit,
    /// Last edit of an undo step.
    undo_point: bool,
}

/// Capacity-bounded linear undo history.
#[derive(Debug)]
pub struct UndoJournal {
    entries: VecDeque<JournalEntry>,
    /// Number of entries currently applied; `entries[cursor..]` is the redo tail.
    cursor: usize,
    capacity: usize,
    state: JournalState,
    compound_depth: usize,
    evicted: u64,
    corrupted: Option<String>,
}

impl UndoJournal {
    /// Creates an empty journal holding at most `capacity` edits.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: VecDeque::with_capacity(capacity.min(DEFAULT_UNDO_CAPACITY)),
            cursor: 0,
            capacity,
            state: JournalState::Recording,
            compound_depth: 0,
            evicted: 0,
            corrupted: None,
        }
    }

    /// Creates a journal sized from configuration.
    #[must_use]
    pub fn with_config(config: &UndoConfig) -> Self {
        Self::new(config.capacity)
    }

    /// Current recording state.
    #[must_use]
    pub fn state(&self) -> JournalState {
        self.state
    }

    /// Maximum number of edits kept.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of edits held (applied and redoable).
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if the journal holds no edits.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of edits dropped because the journal was full.
    #[must_use]
    pub fn evicted(&self) -> u64 {
        self.evicted
    }

    /// Returns true if there is an applied edit to revert.
    #[must_use]
    pub fn can_undo(&self) -> bool {
        self.cursor > 0
    }

    /// Returns true if there is a reverted edit to re-apply.
    #[must_use]
    pub fn can_redo(&self) -> bool {
        self.cursor < self.entries.len()
    }

    /// Edits currently applied, oldest first.
    pub fn applied(&self) -> impl Iterator<Item = &UndoEdit> + '_ {
        self.entries.range(..self.cursor).map(|entry| &entry.edit)
    }

    /// Appends an edit, dropping the redo tail and evicting the oldest edit if full.
    pub fn record(&mut self, edit: UndoEdit) {
        if self.state == JournalState::Replaying {
            return;
        }
        if self.cursor < self.entries.len() {
            tracing::debug!(
                dropped = self.entries.len() - self.cursor,
                "redo history truncated"
            );
            self.entries.truncate(self.cursor);
        }
        if self.entries.len() == self.capacity {
            if let Some(oldest) = self.entries.pop_front() {
                self.cursor -= 1;
                self.evicted += 1;
                tracing::debug!(edit = %oldest.edit, capacity = self.capacity, "undo edit evicted");
            }
        }
        self.entries.push_back(JournalEntry {
            edit,
            undo_point: false,
        });
        self.cursor += 1;
    }

    /// Marks the most recent edit as the end of an undo step.
    pub fn set_undo_point(&mut self) {
        if let Some(last) = self
            .cursor
            .checked_sub(1)
            .and_then(|index| self.entries.get_mut(index))
        {
            last.undo_point = true;
        }
    }

    /// Opens a compound step; nested calls are counted.
    pub fn begin_compound(&mut self) {
        self.compound_depth += 1;
    }

    /// Closes a compound step, setting an undo point when the outermost one ends.
    pub fn end_compound(&mut self) {
        self.compound_depth = self.compound_depth.saturating_sub(1);
        if self.compound_depth == 0 {
            self.set_undo_point();
        }
    }

    /// Returns true while a compound step is open.
    #[must_use]
    pub fn in_compound(&self) -> bool {
        self.compound_depth > 0
    }

    /// Ends a single-mutation step unless a compound step is open.
    pub(crate) fn end_step(&mut self) {
        if self.compound_depth == 0 {
            self.set_undo_point();
        }
    }

    /// Reverts the most recent step.
    ///
    /// Returns `Ok(false)` if there is nothing to undo. `observer` sees the
    /// inverse mutations; the journal itself does not record them.
    ///
    /// # Errors
    ///
    /// Returns `Error::JournalCorrupted` if an edit cannot be reverted. The
    /// graph may then hold a partially reverted step, and every later undo or
    /// redo fails the same way until [`clear`](Self::clear).
    pub fn undo(&mut self, graph: &mut Graph, observer: &mut impl GraphListener) -> Result<bool> {
        self.ensure_replayable("undo")?;
        if !self.can_undo() {
            return Ok(false);
        }
        let mut reverted = 0usize;
        let result = self.replaying(|journal| {
            loop {
                let index = journal.cursor - 1;
                journal.entries[index].edit.inverse().apply(graph, observer)?;
                journal.cursor = index;
                reverted += 1;
                if index == 0 || journal.entries[index - 1].undo_point {
                    return Ok(());
                }
            }
        });
        tracing::debug!(edits = reverted, cursor = self.cursor, "undo");
        if let Err(err) = &result {
            self.poison(err);
        }
        result.map(|()| true)
    }

    /// Re-applies the most recently undone step.
    ///
    /// Returns `Ok(false)` if there is nothing to redo.
    ///
    /// # Errors
    ///
    /// Returns `Error::JournalCorrupted` if an edit cannot be re-applied. As
    /// with [`undo`](Self::undo), the journal stays unusable afterwards.
    pub fn redo(&mut self, graph: &mut Graph, observer: &mut impl GraphListener) -> Result<bool> {
        self.ensure_replayable("redo")?;
        if !self.can_redo() {
            return Ok(false);
        }
        let mut replayed = 0usize;
        let result = self.replaying(|journal| {
            loop {
                let index = journal.cursor;
                journal.entries[index].edit.apply(graph, observer)?;
                journal.cursor = index + 1;
                replayed += 1;
                if journal.entries[index].undo_point || journal.cursor == journal.entries.len() {
                    return Ok(());
                }
            }
        });
        tracing::debug!(edits = replayed, cursor = self.cursor, "redo");
        if let Err(err) = &result {
            self.poison(err);
        }
        result.map(|()| true)
    }

    /// Drops all history.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.cursor = 0;
        self.corrupted = None;
    }

    fn ensure_replayable(&self, operation: &str) -> Result<()> {
        if let Some(reason) = &self.corrupted {
            return Err(Error::JournalCorrupted(reason.clone()));
        }
        if self.compound_depth > 0 {
            return Err(Error::IllegalGraphState(format!(
                "cannot {operation} inside a compound edit"
            )));
        }
        Ok(())
    }

    fn poison(&mut self, err: &Error) {
        tracing::error!(error = %err, "journal replay failed");
        let reason = match err {
            Error::JournalCorrupted(reason) => reason.clone(),
            other => other.to_string(),
        };
        self.corrupted = Some(reason);
    }

        fn replaying<T>(&mut self, f: impl FnOnce(&mut Self) -> Result<T>) -> Result<T> {
        self.state = JournalState::Replaying;
        let result = f(self);
        self.state = JournalState::Recording;
        result
    }
}

impl Default for UndoJournal {
    fn default() -> Self {
        Self::new(DEFAULT_UNDO_CAPACITY)
    }
}

impl GraphListener for UndoJournal {
    fn on_event(&mut self, graph: &Graph, event: &GraphEvent) {
        if self.state == JournalState::Replaying {
            return;
        }
        match UndoEdit::from_event(graph, event) {
            Ok(edit) => self.record(edit),
            Err(err) => {
                tracing::error!(error = %err, "failed to journal graph mutation");
                self.corrupted = Some(err.to_string());
            }
        }
    }
}
