//! Undo/redo history.

use folio_object::ObjectSubtree;
use folio_types::ObjectId;
use serde_json::Value;
use std::collections::VecDeque;

/// A slot in the graph: a parent (`None` = root) and the final index of
/// the object among that parent's children.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Position {
    pub parent: Option<ObjectId>,
    pub index: usize,
}

/// A reversible edit.
///
/// Structural commands that take an object out of the graph hold the
/// detached subtree, so undoing or redoing restores the same objects with
/// the same IDs.
#[derive(Debug)]
pub(crate) enum Command {
    Add {
        id: ObjectId,
        at: Position,
        /// Set while the add is undone.
        detached: Option<ObjectSubtree>,
    },
    Remove {
        id: ObjectId,
        at: Position,
        /// Set while the remove is in effect.
        detached: Option<ObjectSubtree>,
    },
    Move {
        id: ObjectId,
        from: Position,
        to: Position,
    },
    SetProperty {
        id: ObjectId,
        name: String,
        before: Value,
        after: Value,
    },
}

impl Command {
    /// Releases the subtree a command holds when it leaves the history.
    pub fn into_detached(self) -> Option<ObjectSubtree> {
        match self {
            Command::Add { detached, .. } | Command::Remove { detached, .. } => detached,
            Command::Move { .. } | Command::SetProperty { .. } => None,
        }
    }
}

/// Done and undone commands, bounded by an undo limit (0 = unbounded).
#[derive(Debug)]
pub(crate) struct CommandHistory {
    done: VecDeque<Command>,
    undone: Vec<Command>,
    limit: usize,
}

impl CommandHistory {
    pub fn new(limit: usize) -> Self {
        Self {
            done: VecDeque::new(),
            undone: Vec::new(),
            limit,
        }
    }

    pub fn can_undo(&self) -> bool {
        !self.done.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.undone.is_empty()
    }

    /// Records a fresh edit. The redo branch is discarded; discarded and
    /// evicted subtrees are returned for destruction.
    pub fn record(&mut self, command: Command) -> Vec<ObjectSubtree> {
        let mut released: Vec<ObjectSubtree> = self
            .undone
            .drain(..)
            .filter_map(Command::into_detached)
            .collect();
        released.extend(self.push_done(command));
        released
    }

    pub fn take_undo(&mut self) -> Option<Command> {
        self.done.pop_back()
    }

    pub fn take_redo(&mut self) -> Option<Command> {
        self.undone.pop()
    }

    /// Files a command that was just undone.
    pub fn push_undone(&mut self, command: Command) {
        self.undone.push(command);
    }

    /// Files a command that was just done or redone.
    pub fn push_done(&mut self, command: Command) -> Vec<ObjectSubtree> {
        self.done.push_back(command);
        let mut released = Vec::new();
        while self.limit > 0 && self.done.len() > self.limit {
            if let Some(oldest) = self.done.pop_front() {
                released.extend(oldest.into_detached());
            }
        }
        released
    }

    /// Puts back a command whose undo failed.
    pub fn restore_undo(&mut self, command: Command) {
        self.done.push_back(command);
    }

    /// Puts back a command whose redo failed.
    pub fn restore_redo(&mut self, command: Command) {
        self.undone.push(command);
    }

    /// Empties the history, returning every held subtree.
    pub fn clear(&mut self) -> Vec<ObjectSubtree> {
        self.done
            .drain(..)
            .chain(self.undone.drain(..))
            .filter_map(Command::into_detached)
            .collect()
    }
}
