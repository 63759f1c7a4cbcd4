//! Structural change journal
//!
//! Every child-list mutation appends a `MutationRecord`. Observers drain the
//! journal and route records to whichever tree root they watch.

use crate::NodeId;

/// Child list change on `target`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MutationRecord {
    pub target: NodeId,
    pub added_nodes: Vec<NodeId>,
    pub removed_nodes: Vec<NodeId>,
}

impl MutationRecord {
    pub fn child_list(target: NodeId, added: Vec<NodeId>, removed: Vec<NodeId>) -> Self {
        Self { target, added_nodes: added, removed_nodes: removed }
    }

    pub fn is_empty(&self) -> bool {
        self.added_nodes.is_empty() && self.removed_nodes.is_empty()
    }
}

/// Append-only log of tree mutations, drained by observers
#[derive(Debug, Default)]
pub struct MutationJournal {
    records: Vec<MutationRecord>,
    paused: bool,
}

impl MutationJournal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a record unless recording is paused
    pub fn push_record(&mut self, record: MutationRecord) {
        if self.paused {
            return;
        }
        if record.is_empty() {
            return;
        }
        self.records.push(record);
    }

    pub fn take_records(&mut self) -> Vec<MutationRecord> {
        std::mem::take(&mut self.records)
    }

    pub fn has_pending(&self) -> bool {
        !self.records.is_empty()
    }

    /// Stop recording; returns the previous state for `resume`
    pub fn pause(&mut self) -> bool {
        std::mem::replace(&mut self.paused, true)
    }

    pub fn resume(&mut self, was_paused: bool) {
        self.paused = was_paused;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_journal_take_records() {
        let mut journal = MutationJournal::new();
        journal.push_record(MutationRecord::child_list(NodeId(1), vec![NodeId(2)], vec![]));
        journal.push_record(MutationRecord::child_list(NodeId(2), vec![], vec![NodeId(3)]));

        assert!(journal.has_pending());
        let records = journal.take_records();
        assert_eq!(records.len(), 2);
        assert_eq!(records[1].removed_nodes, vec![NodeId(3)]);
        assert!(!journal.has_pending());
    }

    #[test]
    fn test_journal_pause() {
        let mut journal = MutationJournal::new();
        let prev = journal.pause();
        journal.push_record(MutationRecord::child_list(NodeId(1), vec![NodeId(2)], vec![]));
        journal.resume(prev);

        assert!(!journal.has_pending());
    }

    #[test]
    fn test_empty_child_list_dropped() {
        let mut journal = MutationJournal::new();
        journal.push_record(MutationRecord::child_list(NodeId(1), vec![], vec![]));
        assert!(!journal.has_pending());
    }
}
