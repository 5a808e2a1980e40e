//! Request token allocation and stale-reply detection.
//!
//! Replies may complete in any order. Requests that fill a state slot
//! (the conversation list, the directory, the message history) record the
//! id of the latest request per slot; a reply carrying any other id has been
//! superseded and must not be applied.
//!
//! # Invariants
//!
//! - Ids are strictly increasing for the lifetime of the tracker.
//! - A slot accepts at most one reply per issued id.

use crate::RequestId;

/// State slots that are overwritten by replies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Slot {
    /// Conversation list.
    Dashboard,
    /// User directory.
    Directory,
    /// Active message history.
    History,
}

/// Allocates request ids and remembers the latest per slot.
#[derive(Debug, Clone, Default)]
pub struct RequestTracker {
    next: u64,
    dashboard: Option<RequestId>,
    directory: Option<RequestId>,
    history: Option<RequestId>,
}

impl RequestTracker {
    /// Fresh tracker. The first id is 1.
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate an id not tied to a slot.
    pub fn issue(&mut self) -> RequestId {
        self.next = self.next.saturating_add(1);
        RequestId(self.next)
    }

    /// Allocate an id and make it the latest for `slot`.
    pub fn issue_for(&mut self, slot: Slot) -> RequestId {
        let id = self.issue();
        *self.latest_mut(slot) = Some(id);
        id
    }

    /// Whether `id` is the latest outstanding request for `slot`.
    pub fn is_current(&self, slot: Slot, id: RequestId) -> bool {
        self.latest(slot) == Some(id)
    }

    /// Accept a reply for `slot`. Returns `false` if it is stale.
    ///
    /// An accepted id is retired so a duplicate reply is also rejected.
    pub fn complete(&mut self, slot: Slot, id: RequestId) -> bool {
        if !self.is_current(slot, id) {
            return false;
        }
        *self.latest_mut(slot) = None;
        true
    }

    /// Whether `slot` has a request in flight.
    pub fn is_pending(&self, slot: Slot) -> bool {
        self.latest(slot).is_some()
    }

    /// Forget the outstanding request for `slot`, so its reply is ignored.
    pub fn invalidate(&mut self, slot: Slot) {
        *self.latest_mut(slot) = None;
    }

    /// Forget all outstanding slot requests. Id allocation continues.
    pub fn reset(&mut self) {
        self.dashboard = None;
        self.directory = None;
        self.history = None;
    }

    fn latest(&self, slot: Slot) -> Option<RequestId> {
        match slot {
            Slot::Dashboard => self.dashboard,
            Slot::Directory => self.directory,
            Slot::History => self.history,
        }
    }

    fn latest_mut(&mut self, slot: Slot) -> &mut Option<RequestId> {
        match slot {
            Slot::Dashboard => &mut self.dashboard,
            Slot::Directory => &mut self.directory,
            Slot::History => &mut self.history,
        }
    }
}
