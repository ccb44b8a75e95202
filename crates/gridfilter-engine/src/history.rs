//! Bounded undo/redo history.

use std::collections::VecDeque;

use crate::config::HistoryConfig;

/// Linear undo/redo over whole snapshots.
///
/// Snapshots are expected to be cheap to clone (the filter tree shares
/// unchanged subtrees), so the manager stores them whole.
#[derive(Debug, Clone)]
pub struct HistoryManager<T> {
    past: VecDeque<T>,
    future: Vec<T>,
    capacity: usize,
}

impl<T: Clone> HistoryManager<T> {
    /// Creates an empty history. A capacity of zero disables undo.
    pub fn new(config: HistoryConfig) -> Self {
        Self {
            past: VecDeque::with_capacity(config.capacity.min(64)),
            future: Vec::new(),
            capacity: config.capacity,
        }
    }

    /// Records the state before a change. Discards the redo branch and evicts
    /// the oldest snapshot when full.
    pub fn save(&mut self, snapshot: T) {
        self.future.clear();
        if self.capacity == 0 {
            return;
        }
        while self.past.len() >= self.capacity {
            self.past.pop_front();
        }
        self.past.push_back(snapshot);
    }

    /// Steps back. `current` becomes redoable; the previous snapshot is
    /// returned.
    pub fn undo(&mut self, current: T) -> Option<T> {
        let previous = self.past.pop_back()?;
        self.future.push(current);
        Some(previous)
    }

    /// Steps forward. `current` becomes undoable again.
    pub fn redo(&mut self, current: T) -> Option<T> {
        let next = self.future.pop()?;
        self.past.push_back(current);
        if self.past.len() > self.capacity {
            self.past.pop_front();
        }
        Some(next)
    }

    /// Returns true if there is a snapshot to go back to.
    pub fn can_undo(&self) -> bool {
        !self.past.is_empty()
    }

    /// Returns true if an undone change can be re-applied.
    pub fn can_redo(&self) -> bool {
        !self.future.is_empty()
    }

    /// Number of snapshots available to undo.
    pub fn undo_depth(&self) -> usize {
        self.past.len()
    }

    /// Number of snapshots available to redo.
    pub fn redo_depth(&self) -> usize {
        self.future.len()
    }

    /// Most snapshots kept for undo.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Drops every snapshot.
    pub fn clear(&mut self) {
        self.past.clear();
        self.future.clear();
    }
}

impl<T: Clone> Default for HistoryManager<T> {
    fn default() -> Self {
        Self::new(HistoryConfig::default())
    }
}
