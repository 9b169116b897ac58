//! Invocation record types.

use crate::error::FailureKind;
use crate::model::ProjectKind;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// What a request resolved to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum InvocationTarget {
    Matched {
        project_id: String,
        operation_id: String,
    },
    Unmatched,
}

/// Immutable record of one handled request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvocationRecord {
    pub id: Uuid,
    pub timestamp: DateTime<Utc>,
    /// `None` when the path is outside the mock URL layout.
    pub protocol: Option<ProjectKind>,
    pub method: String,
    pub path: String,
    pub target: InvocationTarget,
    pub mock_response_id: Option<String>,
    pub status_code: u16,
    pub failure: Option<FailureKind>,
    pub duration_ms: u64,
}

impl InvocationRecord {
    pub fn new(method: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            timestamp: Utc::now(),
            protocol: None,
            method: method.into(),
            path: path.into(),
            target: InvocationTarget::Unmatched,
            mock_response_id: None,
            status_code: 0,
            failure: None,
            duration_ms: 0,
        }
    }

    pub fn operation_id(&self) -> Option<&str> {
        match &self.target {
            InvocationTarget::Matched { operation_id, .. } => Some(operation_id),
            InvocationTarget::Unmatched => None,
        }
    }

    pub fn is_success(&self) -> bool {
        self.failure.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_serializes_target_and_failure() {
        let mut record = InvocationRecord::new("POST", "/mock/soap/project/p/port");
        record.protocol = Some(ProjectKind::Soap);
        record.target = InvocationTarget::Matched {
            project_id: "p".to_string(),
            operation_id: "op".to_string(),
        };
        record.failure = Some(FailureKind::DelayInterrupted);

        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["target"]["kind"], "matched");
        assert_eq!(json["target"]["operation_id"], "op");
        assert_eq!(json["failure"], "DELAY_INTERRUPTED");
        assert_eq!(json["protocol"], "soap");
        assert_eq!(record.operation_id(), Some("op"));
        assert!(!record.is_success());
    }
}
