//! Messages a session is responsible for deleting when it ends

use crate::transport::MessageId;
use std::collections::HashSet;

/// Ordered, duplicate-free set of message ids, closed once sealed
#[derive(Debug, Default)]
pub struct CleanupTracker {
    order: Vec<MessageId>,
    seen: HashSet<MessageId>,
    sealed: bool,
}

impl CleanupTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a message. Returns false if it was already tracked or the
    /// tracker is sealed.
    pub fn track(&mut self, id: MessageId) -> bool {
        if self.sealed || !self.seen.insert(id) {
            return false;
        }
        self.order.push(id);
        true
    }

    /// Close the tracker and hand out everything recorded, in tracking order.
    /// A second call returns nothing.
    pub fn seal(&mut self) -> Vec<MessageId> {
        self.sealed = true;
        self.seen.clear();
        std::mem::take(&mut self.order)
    }

    #[allow(dead_code)] // Used in tests
    pub fn is_sealed(&self) -> bool {
        self.sealed
    }

    #[allow(dead_code)] // Used in tests
    pub fn contains(&self, id: MessageId) -> bool {
        self.seen.contains(&id)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    #[allow(dead_code)] // Pairs with len()
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}
