//! Invocation recording.
//!
//! Every handled request leaves one immutable [`InvocationRecord`]. Recording
//! never fails a request: recorder errors are logged, counted and dropped.
//!
//! # Module Structure
//!
//! - `types` - Record and target types
//! - `store` - Bounded in-memory log
//! - `journal` - JSON-lines file journal fed by a background task

mod journal;
mod store;
mod types;

pub use journal::{JournalRecorder, DEFAULT_JOURNAL_BUFFER};
pub use store::{InvocationLog, DEFAULT_CAPACITY};
pub use types::{InvocationRecord, InvocationTarget};

use crate::metrics;
use std::sync::Arc;
use tracing::warn;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RecorderError {
    #[error("Recorder queue is full")]
    Full,
    #[error("Recorder is closed")]
    Closed,
}

/// Sink for invocation records.
pub trait InvocationRecorder: Send + Sync {
    fn record(&self, record: InvocationRecord) -> Result<(), RecorderError>;
}

/// Fans records out to several recorders.
#[derive(Default, Clone)]
pub struct CompositeRecorder {
    recorders: Vec<Arc<dyn InvocationRecorder>>,
}

impl CompositeRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, recorder: Arc<dyn InvocationRecorder>) -> Self {
        self.recorders.push(recorder);
        self
    }

    pub fn len(&self) -> usize {
        self.recorders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.recorders.is_empty()
    }
}

impl InvocationRecorder for CompositeRecorder {
    /// Records to every recorder; reports the first error.
    fn record(&self, record: InvocationRecord) -> Result<(), RecorderError> {
        let mut first_error = None;
        for recorder in &self.recorders {
            if let Err(e) = recorder.record(record.clone()) {
                first_error.get_or_insert(e);
            }
        }
        first_error.map_or(Ok(()), Err)
    }
}

/// Record without surfacing errors to the request path.
pub fn record_quietly(recorder: &dyn InvocationRecorder, record: InvocationRecord) {
    let id = record.id;
    if let Err(e) = recorder.record(record) {
        warn!("Dropping invocation record {}: {}", id, e);
        metrics::record_dropped_invocation();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct ClosedRecorder;

    impl InvocationRecorder for ClosedRecorder {
        fn record(&self, _record: InvocationRecord) -> Result<(), RecorderError> {
            Err(RecorderError::Closed)
        }
    }

    #[test]
    fn test_composite_records_everywhere_and_reports_error() {
        let log = Arc::new(InvocationLog::new(10));
        let composite = CompositeRecorder::new()
            .with(Arc::new(ClosedRecorder))
            .with(log.clone());

        let result = composite.record(InvocationRecord::new("GET", "/"));
        assert_eq!(result, Err(RecorderError::Closed));
        assert_eq!(log.len(), 1);
        assert_eq!(composite.len(), 2);
    }

    #[test]
    fn test_record_quietly_swallows_errors() {
        record_quietly(&ClosedRecorder, InvocationRecord::new("GET", "/"));
        let log = InvocationLog::new(10);
        record_quietly(&log, InvocationRecord::new("GET", "/"));
        assert_eq!(log.len(), 1);
    }
}
