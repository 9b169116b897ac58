//! In-memory invocation log.

use super::types::InvocationRecord;
use super::{InvocationRecorder, RecorderError};
use parking_lot::RwLock;
use std::collections::VecDeque;
use std::sync::Arc;

pub const DEFAULT_CAPACITY: usize = 10_000;

/// Bounded log of invocation records; the oldest entry is evicted when full.
pub struct InvocationLog {
    entries: RwLock<VecDeque<Arc<InvocationRecord>>>,
    capacity: usize,
}

impl Default for InvocationLog {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl InvocationLog {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: RwLock::new(VecDeque::with_capacity(capacity.min(1024))),
            capacity,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// All records, oldest first.
    pub fn entries(&self) -> Vec<Arc<InvocationRecord>> {
        self.entries.read().iter().cloned().collect()
    }

    pub fn entries_for_operation(&self, operation_id: &str) -> Vec<Arc<InvocationRecord>> {
        self.entries
            .read()
            .iter()
            .filter(|r| r.operation_id() == Some(operation_id))
            .cloned()
            .collect()
    }

    pub fn clear(&self) {
        self.entries.write().clear();
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

impl InvocationRecorder for InvocationLog {
    fn record(&self, record: InvocationRecord) -> Result<(), RecorderError> {
        let mut entries = self.entries.write();
        if entries.len() >= self.capacity {
            entries.pop_front();
        }
        entries.push_back(Arc::new(record));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recording::InvocationTarget;

    fn matched(operation_id: &str) -> InvocationRecord {
        let mut record = InvocationRecord::new("GET", "/x");
        record.target = InvocationTarget::Matched {
            project_id: "p".to_string(),
            operation_id: operation_id.to_string(),
        };
        record
    }

    #[test]
    fn test_record_and_filter() {
        let log = InvocationLog::new(10);
        log.record(matched("a")).unwrap();
        log.record(matched("b")).unwrap();
        log.record(InvocationRecord::new("GET", "/nowhere")).unwrap();
        log.record(matched("a")).unwrap();

        assert_eq!(log.len(), 4);
        assert_eq!(log.entries_for_operation("a").len(), 2);
        assert_eq!(log.entries_for_operation("b").len(), 1);
        assert_eq!(log.entries()[2].target, InvocationTarget::Unmatched);

        log.clear();
        assert!(log.is_empty());
    }

    #[test]
    fn test_oldest_entries_are_evicted() {
        let log = InvocationLog::new(2);
        for op in ["a", "b", "c"] {
            log.record(matched(op)).unwrap();
        }
        let ops: Vec<_> = log
            .entries()
            .iter()
            .filter_map(|r| r.operation_id().map(str::to_string))
            .collect();
        assert_eq!(ops, vec!["b", "c"]);
    }

    #[test]
    fn test_zero_capacity_keeps_latest() {
        let log = InvocationLog::new(0);
        log.record(matched("a")).unwrap();
        log.record(matched("b")).unwrap();
        assert_eq!(log.capacity(), 1);
        assert_eq!(log.entries()[0].operation_id(), Some("b"));
    }
}
