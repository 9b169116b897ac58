//! Error taxonomy for request resolution and response selection.
//!
//! Every failure is scoped to a single request. `FailureKind` is the
//! payload-free discriminant used by the invocation recorder and metrics.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Discriminant of an [`EngineError`], recorded with every failed invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FailureKind {
    NoMatchingProject,
    NoMatchingPort,
    NoMatchingApplication,
    NoMatchingOperation,
    NoMatchingResource,
    NoMatchingMethod,
    AmbiguousOperation,
    OperationDisabled,
    NoEnabledResponse,
    NoMatchingResponse,
    EncodingFailure,
    DelayInterrupted,
    ForwardingUnsupported,
}

impl FailureKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FailureKind::NoMatchingProject => "no_matching_project",
            FailureKind::NoMatchingPort => "no_matching_port",
            FailureKind::NoMatchingApplication => "no_matching_application",
            FailureKind::NoMatchingOperation => "no_matching_operation",
            FailureKind::NoMatchingResource => "no_matching_resource",
            FailureKind::NoMatchingMethod => "no_matching_method",
            FailureKind::AmbiguousOperation => "ambiguous_operation",
            FailureKind::OperationDisabled => "operation_disabled",
            FailureKind::NoEnabledResponse => "no_enabled_response",
            FailureKind::NoMatchingResponse => "no_matching_response",
            FailureKind::EncodingFailure => "encoding_failure",
            FailureKind::DelayInterrupted => "delay_interrupted",
            FailureKind::ForwardingUnsupported => "forwarding_unsupported",
        }
    }

    /// True for failures raised before an operation was identified.
    pub fn is_unmatched(&self) -> bool {
        matches!(
            self,
            FailureKind::NoMatchingProject
                | FailureKind::NoMatchingPort
                | FailureKind::NoMatchingApplication
                | FailureKind::NoMatchingOperation
                | FailureKind::NoMatchingResource
                | FailureKind::NoMatchingMethod
                | FailureKind::AmbiguousOperation
                | FailureKind::OperationDisabled
        )
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors raised while resolving a request to a mock response.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EngineError {
    #[error("No project with id '{0}'")]
    NoMatchingProject(String),
    #[error("No port with uri '{uri}' in project '{project_id}'")]
    NoMatchingPort { project_id: String, uri: String },
    #[error("No application with id '{application_id}' in project '{project_id}'")]
    NoMatchingApplication {
        project_id: String,
        application_id: String,
    },
    #[error("No matching operation: {0}")]
    NoMatchingOperation(String),
    #[error("No resource matches path '{0}'")]
    NoMatchingResource(String),
    #[error("No {method} method configured for resource '{resource}'")]
    NoMatchingMethod { resource: String, method: String },
    #[error("Ambiguous operation: root element '{element}' matches operations {candidates:?}")]
    AmbiguousOperation {
        element: String,
        candidates: Vec<String>,
    },
    #[error("Operation '{0}' is disabled")]
    OperationDisabled(String),
    #[error("Operation '{0}' has no enabled mock responses")]
    NoEnabledResponse(String),
    #[error("No mock response of operation '{0}' matches the request and no default is configured")]
    NoMatchingResponse(String),
    #[error("Failed to apply {encoding} encoding: {reason}")]
    EncodingFailure { encoding: String, reason: String },
    #[error("Simulated delay of operation '{0}' was interrupted")]
    DelayInterrupted(String),
    #[error("Operation '{operation}' is forwarded to {endpoint:?}; forwarding is not supported")]
    ForwardingUnsupported {
        operation: String,
        endpoint: Option<String>,
    },
}

impl EngineError {
    pub fn kind(&self) -> FailureKind {
        match self {
            EngineError::NoMatchingProject(_) => FailureKind::NoMatchingProject,
            EngineError::NoMatchingPort { .. } => FailureKind::NoMatchingPort,
            EngineError::NoMatchingApplication { .. } => FailureKind::NoMatchingApplication,
            EngineError::NoMatchingOperation(_) => FailureKind::NoMatchingOperation,
            EngineError::NoMatchingResource(_) => FailureKind::NoMatchingResource,
            EngineError::NoMatchingMethod { .. } => FailureKind::NoMatchingMethod,
            EngineError::AmbiguousOperation { .. } => FailureKind::AmbiguousOperation,
            EngineError::OperationDisabled(_) => FailureKind::OperationDisabled,
            EngineError::NoEnabledResponse(_) => FailureKind::NoEnabledResponse,
            EngineError::NoMatchingResponse(_) => FailureKind::NoMatchingResponse,
            EngineError::EncodingFailure { .. } => FailureKind::EncodingFailure,
            EngineError::DelayInterrupted(_) => FailureKind::DelayInterrupted,
            EngineError::ForwardingUnsupported { .. } => FailureKind::ForwardingUnsupported,
        }
    }
}
