//! Linear undo/redo over full-canvas snapshots.
//!
//! The stack is never empty and `cursor` always indexes a stored snapshot.
//! Moving the cursor is split from restoring pixels: callers ask for the
//! undo or redo target, decode it, and only then commit the move with
//! [`HistoryManager::set_cursor`]. A failed decode therefore leaves the
//! history untouched.

use crate::snapshot::Snapshot;

#[derive(Debug, Clone)]
pub struct HistoryManager {
    snapshots: Vec<Snapshot>,
    cursor: usize,
}

impl HistoryManager {
    pub fn new(initial: Snapshot) -> Self {
        Self {
            snapshots: vec![initial],
            cursor: 0,
        }
    }

    /// Append after the cursor, discarding anything that could be redone.
    pub fn push(&mut self, snapshot: Snapshot) {
        self.snapshots.truncate(self.cursor + 1);
        self.snapshots.push(snapshot);
        self.cursor = self.snapshots.len() - 1;
        log::debug!("History push: {} entries, cursor at {}", self.snapshots.len(), self.cursor);
    }

    /// Reset to a single snapshot.
    pub fn clear_with(&mut self, snapshot: Snapshot) {
        self.snapshots.clear();
        self.snapshots.push(snapshot);
        self.cursor = 0;
    }

    pub fn can_undo(&self) -> bool {
        self.cursor > 0
    }

    pub fn can_redo(&self) -> bool {
        self.cursor + 1 < self.snapshots.len()
    }

    /// Snapshot one step back, `None` at the first entry.
    pub fn undo_target(&self) -> Option<(usize, &Snapshot)> {
        let index = self.cursor.checked_sub(1)?;
        Some((index, &self.snapshots[index]))
    }

    /// Snapshot one step forward, `None` at the last entry.
    pub fn redo_target(&self) -> Option<(usize, &Snapshot)> {
        let index = self.cursor + 1;
        self.snapshots.get(index).map(|s| (index, s))
    }

    /// Move the cursor. Out-of-range indices are ignored and return `false`.
    pub fn set_cursor(&mut self, index: usize) -> bool {
        if index >= self.snapshots.len() {
            return false;
        }
        self.cursor = index;
        true
    }

    pub fn current(&self) -> &Snapshot {
        &self.snapshots[self.cursor]
    }

    pub fn get(&self, index: usize) -> Option<&Snapshot> {
        self.snapshots.get(index)
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }
}
