//! Linear snapshot history with bounded depth and change observers.
//!
//! Every committed mutation captures a full deep copy of the document.
//! Undo/redo move a cursor over those snapshots; recording after an undo
//! discards the abandoned redo branch. Layer ids are stable across
//! restore, so selections held by callers survive undo/redo.

use std::collections::VecDeque;

use printlab_core::constants::HISTORY_CAPACITY;
use printlab_core::error::{DocumentError, Result};

use crate::document::Document;

/// What a change notification was caused by.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    Record,
    Undo,
    Redo,
}

/// Handle returned by [`History::subscribe`], used to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubscriptionId(u64);

/// One point-in-time copy of the document.
#[derive(Debug, Clone)]
pub struct Snapshot {
    /// Monotonic sequence number, for logging and diagnostics.
    pub seq: u64,
    pub document: Document,
}

type Observer = Box<dyn FnMut(ChangeKind)>;

/// The mutation and undo/redo engine wrapping a live [`Document`].
///
/// All access to the document goes through here: reads borrow the live
/// state, writes go through [`History::record`] so every committed edit
/// becomes an undo step.
pub struct History {
    live: Document,
    /// snapshots[0..=cursor] are the undoable past, including the current
    /// state at `cursor`; anything beyond is the redoable future.
    snapshots: VecDeque<Snapshot>,
    cursor: usize,
    capacity: usize,
    next_seq: u64,
    observers: Vec<(SubscriptionId, Observer)>,
    next_subscription: u64,
    notifying: bool,
}

impl History {
    /// Starts a history around an initial document. The initial state is
    /// itself a snapshot, so the first record is undoable back to it.
    pub fn new(document: Document) -> Self {
        Self::with_capacity(document, HISTORY_CAPACITY)
    }

    pub fn with_capacity(document: Document, capacity: usize) -> Self {
        let capacity = capacity.max(1);
        let mut snapshots = VecDeque::with_capacity(capacity + 1);
        snapshots.push_back(Snapshot {
            seq: 0,
            document: document.clone(),
        });
        Self {
            live: document,
            snapshots,
            cursor: 0,
            capacity,
            next_seq: 1,
            observers: Vec::new(),
            next_subscription: 0,
            notifying: false,
        }
    }

    /// The current document state.
    pub fn document(&self) -> &Document {
        &self.live
    }

    pub fn can_undo(&self) -> bool {
        self.cursor > 0
    }

    pub fn can_redo(&self) -> bool {
        self.cursor + 1 < self.snapshots.len()
    }

    /// Applies an edit and commits it as one undo step.
    ///
    /// The edit runs against a copy of the live document; if it fails, the
    /// live state and the history are untouched. On success, any redo
    /// branch beyond the cursor is discarded.
    ///
    /// Calling this from inside a change observer is rejected with
    /// [`DocumentError::ReentrantMutation`].
    pub fn record<F>(&mut self, edit: F) -> Result<()>
    where
        F: FnOnce(&mut Document) -> Result<()>,
    {
        if self.notifying {
            return Err(DocumentError::ReentrantMutation.into());
        }
        let mut next = self.live.clone();
        edit(&mut next)?;
        self.live = next;

        self.snapshots.truncate(self.cursor + 1);
        let seq = self.next_seq;
        self.next_seq += 1;
        self.snapshots.push_back(Snapshot {
            seq,
            document: self.live.clone(),
        });
        self.cursor += 1;

        // Drop the oldest snapshot when over capacity; the cursor tracks it.
        while self.snapshots.len() > self.capacity + 1 {
            let evicted = self.snapshots.pop_front();
            self.cursor -= 1;
            if let Some(s) = evicted {
                tracing::debug!(seq = s.seq, "evicted oldest history snapshot");
            }
        }

        self.notify(ChangeKind::Record);
        Ok(())
    }

    /// Steps back one snapshot. A no-op at the beginning of history.
    /// Returns whether a step was taken.
    pub fn undo(&mut self) -> bool {
        if !self.can_undo() {
            return false;
        }
        self.cursor -= 1;
        self.live = self.snapshots[self.cursor].document.clone();
        self.notify(ChangeKind::Undo);
        true
    }

    /// Steps forward one snapshot. A no-op at the end of history.
    /// Returns whether a step was taken.
    pub fn redo(&mut self) -> bool {
        if !self.can_redo() {
            return false;
        }
        self.cursor += 1;
        self.live = self.snapshots[self.cursor].document.clone();
        self.notify(ChangeKind::Redo);
        true
    }

    /// Registers an observer called after every committed change,
    /// undo, and redo.
    pub fn subscribe<F>(&mut self, observer: F) -> SubscriptionId
    where
        F: FnMut(ChangeKind) + 'static,
    {
        let id = SubscriptionId(self.next_subscription);
        self.next_subscription += 1;
        self.observers.push((id, Box::new(observer)));
        id
    }

    /// Removes an observer. Unknown ids are ignored.
    pub fn unsubscribe(&mut self, id: SubscriptionId) {
        self.observers.retain(|(sid, _)| *sid != id);
    }

    fn notify(&mut self, kind: ChangeKind) {
        // The flag must clear even when an observer panics and the caller
        // catches the unwind, or every later record would be rejected as
        // reentrant.
        struct ClearOnDrop<'a>(&'a mut bool);
        impl Drop for ClearOnDrop<'_> {
            fn drop(&mut self) {
                *self.0 = false;
            }
        }
        self.notifying = true;
        let _guard = ClearOnDrop(&mut self.notifying);
        for (_, observer) in &mut self.observers {
            observer(kind);
        }
    }
}

impl std::fmt::Debug for History {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("History")
            .field("snapshots", &self.snapshots.len())
            .field("cursor", &self.cursor)
            .field("capacity", &self.capacity)
            .field("observers", &self.observers.len())
            .finish()
    }
}
