//! Per-operation SEQUENCE cursors.

use parking_lot::{RwLock, RwLockWriteGuard};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

/// Monotonic cursor per operation id.
///
/// Concurrent callers each receive a distinct cursor value. The map lock is
/// only taken for writing the first time an operation is seen.
#[derive(Debug, Default)]
pub struct SequenceCursors {
    cursors: RwLock<HashMap<String, AtomicU64>>,
}

impl SequenceCursors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the current cursor of `operation_id` and advance it by one.
    pub fn advance(&self, operation_id: &str) -> u64 {
        let cursors = self.cursors.read();
        if let Some(cursor) = cursors.get(operation_id) {
            return cursor.fetch_add(1, Ordering::Relaxed);
        }
        drop(cursors);

        let mut write = self.cursors.write();
        write
            .entry(operation_id.to_string())
            .or_default()
            .fetch_add(1, Ordering::Relaxed)
    }

    /// Index into a candidate list of `count` entries; `None` when empty.
    pub fn next_index(&self, operation_id: &str, count: usize) -> Option<(usize, u64)> {
        if count == 0 {
            return None;
        }
        let cursor = self.advance(operation_id);
        Some(((cursor % count as u64) as usize, cursor))
    }

    /// Current cursor value without advancing it.
    pub fn peek(&self, operation_id: &str) -> u64 {
        self.cursors
            .read()
            .get(operation_id)
            .map_or(0, |cursor| cursor.load(Ordering::Relaxed))
    }

    /// Restart the SEQUENCE of `operation_id` at its first response.
    pub fn reset(&self, operation_id: &str) {
        if let Some(cursor) = self.cursors.read().get(operation_id) {
            cursor.store(0, Ordering::Relaxed);
        }
    }

    pub fn reset_all(&self) {
        let mut cursors: RwLockWriteGuard<'_, _> = self.cursors.write();
        cursors.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_next_index_wraps() {
        let cursors = SequenceCursors::new();
        let indices: Vec<_> = (0..7)
            .map(|_| cursors.next_index("op", 3).unwrap().0)
            .collect();
        assert_eq!(indices, vec![0, 1, 2, 0, 1, 2, 0]);
    }

    #[test]
    fn test_cursors_are_scoped_per_operation() {
        let cursors = SequenceCursors::new();
        assert_eq!(cursors.advance("a"), 0);
        assert_eq!(cursors.advance("a"), 1);
        assert_eq!(cursors.advance("b"), 0);
        assert_eq!(cursors.peek("a"), 2);
    }

    #[test]
    fn test_count_change_uses_new_modulus() {
        let cursors = SequenceCursors::new();
        assert_eq!(cursors.next_index("op", 3), Some((0, 0)));
        assert_eq!(cursors.next_index("op", 3), Some((1, 1)));
        assert_eq!(cursors.next_index("op", 2), Some((0, 2)));
        assert_eq!(cursors.next_index("op", 0), None);
        assert_eq!(cursors.peek("op"), 3);
    }

    #[test]
    fn test_reset() {
        let cursors = SequenceCursors::new();
        cursors.advance("op");
        cursors.advance("op");
        cursors.reset("op");
        assert_eq!(cursors.peek("op"), 0);
        cursors.advance("op");
        cursors.reset_all();
        assert_eq!(cursors.peek("op"), 0);
    }

    #[test]
    fn test_concurrent_advance_yields_distinct_values() {
        let cursors = Arc::new(SequenceCursors::new());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let cursors = Arc::clone(&cursors);
                std::thread::spawn(move || (0..50).map(|_| cursors.advance("op")).collect::<Vec<_>>())
            })
            .collect();

        let mut values: Vec<u64> = handles
            .into_iter()
            .flat_map(|h| h.join().unwrap())
            .collect();
        values.sort_unstable();
        assert_eq!(values, (0..400).collect::<Vec<_>>());
    }
}
