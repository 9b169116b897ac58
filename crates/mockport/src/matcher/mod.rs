//! Request matching: maps an inbound request to one SOAP operation or one
//! REST resource method.
//!
//! # Module Structure
//!
//! - `path` - Mock URL layout and REST URI templates
//! - `envelope` - SOAP envelope inspection and SOAPAction extraction
//! - `soap` - Operation resolution within a port
//! - `rest` - Resource and method resolution within an application

mod envelope;
mod path;
mod rest;
mod soap;

pub use envelope::{body_root_element, soap_action, BodyElement};
pub use path::{match_uri_template, parse_mock_path, MockTarget, TemplateMatch};

use crate::error::EngineError;
use crate::model::{OperationSettings, OperationStatus, ProjectKind};
use crate::request::InboundRequest;
use crate::store::ConfigurationStore;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

/// What the caller should do with a matched operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Disposition {
    /// Select and return a configured mock response.
    Mock,
    /// Reply with the request body.
    Echo,
    /// Skip selection; the request is proxied to the endpoint.
    Forward { endpoint: Option<String> },
}

/// A request resolved to a single operation or method.
#[derive(Debug, Clone)]
pub struct MatchedOperation {
    pub protocol: ProjectKind,
    pub project_id: String,
    pub operation_id: String,
    pub operation_name: String,
    pub settings: OperationSettings,
    pub disposition: Disposition,
    /// Values captured by `{name}` segments of a REST URI template.
    pub path_parameters: HashMap<String, String>,
}

impl MatchedOperation {
    /// Build a match, rejecting disabled operations.
    pub(crate) fn new(
        protocol: ProjectKind,
        project_id: &str,
        operation_id: &str,
        operation_name: &str,
        settings: &OperationSettings,
    ) -> Result<Self, EngineError> {
        let disposition = match settings.status {
            OperationStatus::Enabled => Disposition::Mock,
            OperationStatus::Echo => Disposition::Echo,
            OperationStatus::Forwarded => Disposition::Forward {
                endpoint: settings.forwarded_endpoint.clone(),
            },
            OperationStatus::Disabled => {
                return Err(EngineError::OperationDisabled(operation_id.to_string()))
            }
        };
        Ok(Self {
            protocol,
            project_id: project_id.to_string(),
            operation_id: operation_id.to_string(),
            operation_name: operation_name.to_string(),
            settings: settings.clone(),
            disposition,
            path_parameters: HashMap::new(),
        })
    }
}

/// Resolves inbound requests against a configuration store.
#[derive(Clone)]
pub struct RequestMatcher {
    store: Arc<dyn ConfigurationStore>,
    context_path: String,
}

impl RequestMatcher {
    pub fn new(store: Arc<dyn ConfigurationStore>, context_path: impl Into<String>) -> Self {
        Self {
            store,
            context_path: context_path.into(),
        }
    }

    /// The mock target a request path addresses, if any.
    pub fn target(&self, request: &InboundRequest) -> Option<MockTarget> {
        parse_mock_path(&self.context_path, &request.path)
    }

    /// Resolve a request to exactly one operation.
    pub fn resolve(&self, request: &InboundRequest) -> Result<MatchedOperation, EngineError> {
        let target = self
            .target(request)
            .ok_or_else(|| EngineError::NoMatchingResource(request.path.clone()))?;
        self.resolve_target(&target, request)
    }

    pub fn resolve_target(
        &self,
        target: &MockTarget,
        request: &InboundRequest,
    ) -> Result<MatchedOperation, EngineError> {
        let matched = match target {
            MockTarget::Soap {
                project_id,
                port_uri,
            } => soap::match_soap(self.store.as_ref(), project_id, port_uri, request),
            MockTarget::Rest {
                project_id,
                application_id,
                resource_path,
            } => rest::match_rest(
                self.store.as_ref(),
                project_id,
                application_id,
                resource_path,
                &request.method,
            ),
        }?;
        debug!(
            protocol = matched.protocol.as_str(),
            project = %matched.project_id,
            operation = %matched.operation_id,
            name = %matched.operation_name,
            "Request matched operation"
        );
        Ok(matched)
    }
}
