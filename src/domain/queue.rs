//! Work-queue of families waiting to be visited, keyed by handle.

use std::collections::{HashMap, VecDeque};

use tracing::warn;

use crate::domain::entities::PersonId;

/// Pending visit data for one family.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FamilyVisit {
    pub level: i32,
    /// Already placed person through whom the family was discovered
    pub origin: Option<PersonId>,
}

/// Insertion-ordered queue holding at most one pending visit per family.
///
/// Re-enqueueing a pending family keeps its position and replaces its
/// visit data (last write wins).
#[derive(Debug, Default)]
pub struct FamilyQueue {
    order: VecDeque<String>,
    pending: HashMap<String, FamilyVisit>,
}

impl FamilyQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enqueue a visit, returning the visit it replaced.
    pub fn push(&mut self, handle: &str, visit: FamilyVisit) -> Option<FamilyVisit> {
        match self.pending.insert(handle.to_string(), visit) {
            Some(previous) => {
                if previous != visit {
                    warn!(
                        "family {} re-queued: level {} -> {}, origin {:?} -> {:?}",
                        handle, previous.level, visit.level, previous.origin, visit.origin
                    );
                }
                Some(previous)
            }
            None => {
                self.order.push_back(handle.to_string());
                None
            }
        }
    }

    /// Next handle in insertion order; its data is claimed with [`FamilyQueue::take`].
    pub fn next_handle(&mut self) -> Option<String> {
        self.order.pop_front()
    }

    pub fn take(&mut self, handle: &str) -> Option<FamilyVisit> {
        self.pending.remove(handle)
    }

    pub fn get(&self, handle: &str) -> Option<&FamilyVisit> {
        self.pending.get(handle)
    }

    pub fn contains(&self, handle: &str) -> bool {
        self.pending.contains_key(handle)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}
