//! Identifier allocation.

use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::domain::error::{DomainError, DomainResult};
use crate::domain::NodeId;

/// How caller-supplied ids are treated.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IdPolicy {
    /// Keep caller ids verbatim, no collision check
    #[default]
    Trust,
    /// Refuse caller ids that were already issued in this engine lifetime
    Reject,
}

impl fmt::Display for IdPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IdPolicy::Trust => write!(f, "trust"),
            IdPolicy::Reject => write!(f, "reject"),
        }
    }
}

impl FromStr for IdPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "trust" => Ok(IdPolicy::Trust),
            "reject" => Ok(IdPolicy::Reject),
            other => Err(format!("unknown id policy '{}', expected trust or reject", other)),
        }
    }
}

/// Allocator state to return to when an operation fails.
///
/// Checkpoints do not nest: each one must be committed or rolled back before
/// the next is taken.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Checkpoint {
    next: u64,
    mark: usize,
}

/// Monotonic id counter of one engine instance.
///
/// Allocated ids are strictly increasing and never reused until `reset`.
/// Under [`IdPolicy::Reject`] every issued id is remembered, so that caller ids
/// cannot collide and the counter steps over ids callers already claimed.
/// Ids issued since the last checkpoint are journaled for rollback.
#[derive(Debug, Clone, Default)]
pub struct IdAllocator {
    next: u64,
    policy: IdPolicy,
    issued: HashSet<NodeId>,
    journal: Vec<NodeId>,
}

impl IdAllocator {
    pub fn new(policy: IdPolicy) -> Self {
        Self {
            next: 0,
            policy,
            issued: HashSet::new(),
            journal: Vec::new(),
        }
    }

    pub fn policy(&self) -> IdPolicy {
        self.policy
    }

    /// Id the counter would hand out next (ignoring claimed ids).
    pub fn peek(&self) -> NodeId {
        NodeId(self.next)
    }

    /// Keep a requested id, or allocate the next counter value.
    pub fn handle_id(&mut self, requested: Option<NodeId>) -> DomainResult<NodeId> {
        match requested {
            Some(id) => self.claim(id),
            None => Ok(self.allocate()),
        }
    }

    /// Register a caller-supplied id.
    pub fn claim(&mut self, id: NodeId) -> DomainResult<NodeId> {
        if self.policy == IdPolicy::Reject && !self.record(id) {
            return Err(DomainError::DuplicateId(id));
        }
        Ok(id)
    }

    fn allocate(&mut self) -> NodeId {
        loop {
            let id = NodeId(self.next);
            self.next += 1;
            match self.policy {
                IdPolicy::Trust => return id,
                IdPolicy::Reject => {
                    if self.record(id) {
                        return id;
                    }
                }
            }
        }
    }

    fn record(&mut self, id: NodeId) -> bool {
        let fresh = self.issued.insert(id);
        if fresh {
            self.journal.push(id);
        }
        fresh
    }

    pub fn checkpoint(&self) -> Checkpoint {
        Checkpoint {
            next: self.next,
            mark: self.journal.len(),
        }
    }

    /// Keep everything issued since `checkpoint`.
    pub fn commit(&mut self, checkpoint: Checkpoint) {
        self.journal.truncate(checkpoint.mark);
    }

    /// Forget everything issued since `checkpoint`.
    pub fn rollback(&mut self, checkpoint: Checkpoint) {
        self.next = checkpoint.next;
        for id in self.journal.drain(checkpoint.mark..) {
            self.issued.remove(&id);
        }
    }

    pub fn reset(&mut self) {
        self.next = 0;
        self.issued.clear();
        self.journal.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allocates_sequentially() {
        let mut ids = IdAllocator::default();
        assert_eq!(ids.handle_id(None).unwrap(), NodeId(0));
        assert_eq!(ids.handle_id(None).unwrap(), NodeId(1));
        assert_eq!(ids.peek(), NodeId(2));
    }

    #[test]
    fn test_requested_id_does_not_advance_counter() {
        let mut ids = IdAllocator::default();
        assert_eq!(ids.handle_id(Some(NodeId(42))).unwrap(), NodeId(42));
        assert_eq!(ids.handle_id(None).unwrap(), NodeId(0));
    }

    #[test]
    fn test_trust_allows_duplicates() {
        let mut ids = IdAllocator::new(IdPolicy::Trust);
        ids.handle_id(None).unwrap();
        assert_eq!(ids.handle_id(Some(NodeId(0))).unwrap(), NodeId(0));
        assert_eq!(ids.handle_id(Some(NodeId(0))).unwrap(), NodeId(0));
    }

    #[test]
    fn test_reject_refuses_issued_ids() {
        let mut ids = IdAllocator::new(IdPolicy::Reject);
        ids.handle_id(None).unwrap();
        assert_eq!(
            ids.handle_id(Some(NodeId(0))),
            Err(DomainError::DuplicateId(NodeId(0)))
        );
    }

    #[test]
    fn test_reject_skips_claimed_ids() {
        let mut ids = IdAllocator::new(IdPolicy::Reject);
        ids.handle_id(Some(NodeId(1))).unwrap();
        assert_eq!(ids.handle_id(None).unwrap(), NodeId(0));
        assert_eq!(ids.handle_id(None).unwrap(), NodeId(2));
    }

    #[test]
    fn test_reset() {
        let mut ids = IdAllocator::new(IdPolicy::Reject);
        ids.handle_id(None).unwrap();
        ids.reset();
        assert_eq!(ids.handle_id(Some(NodeId(0))).unwrap(), NodeId(0));
        assert_eq!(ids.handle_id(None).unwrap(), NodeId(1));
    }

    #[test]
    fn test_rollback_forgets_only_new_ids() {
        let mut ids = IdAllocator::new(IdPolicy::Reject);
        ids.handle_id(None).unwrap();
        let checkpoint = ids.checkpoint();
        ids.commit(checkpoint);

        let checkpoint = ids.checkpoint();
        ids.handle_id(None).unwrap();
        ids.handle_id(Some(NodeId(7))).unwrap();
        ids.rollback(checkpoint);

        assert_eq!(ids.peek(), NodeId(1));
        assert_eq!(ids.handle_id(Some(NodeId(7))).unwrap(), NodeId(7));
        assert_eq!(
            ids.handle_id(Some(NodeId(0))),
            Err(DomainError::DuplicateId(NodeId(0)))
        );
    }

    #[test]
    fn test_commit_empties_journal() {
        let mut ids = IdAllocator::new(IdPolicy::Reject);
        let checkpoint = ids.checkpoint();
        ids.handle_id(None).unwrap();
        ids.handle_id(None).unwrap();
        ids.commit(checkpoint);
        assert!(ids.journal.is_empty());

        let checkpoint = ids.checkpoint();
        ids.rollback(checkpoint);
        assert_eq!(ids.peek(), NodeId(2));
        assert!(ids.handle_id(Some(NodeId(1))).is_err());
    }

    #[test]
    fn test_policy_from_str() {
        assert_eq!("Reject".parse::<IdPolicy>().unwrap(), IdPolicy::Reject);
        assert_eq!(" trust ".parse::<IdPolicy>().unwrap(), IdPolicy::Trust);
        assert!("strict".parse::<IdPolicy>().is_err());
    }
}
