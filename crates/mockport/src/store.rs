//! Configuration store consumed by the engine.
//!
//! [`ConfigurationStore`] is the read-only view the matcher and selector use.
//! [`CatalogStore`] implements it on top of one [`MemoryRepository`] per
//! entity kind and also carries the administrative write operations.

use crate::model::{
    MockResponse, OperationSettings, OperationStatus, Project, ProjectKind, ResponseStatus,
    RestApplication, RestMethod, RestResource, SoapOperation, SoapPort,
};
use crate::repository::{MemoryRepository, Repository, RepositoryError};
use std::sync::Arc;

/// Read access to projects and their mock configuration.
pub trait ConfigurationStore: Send + Sync {
    fn list_projects(&self) -> Vec<Arc<Project>>;

    fn project(&self, project_id: &str) -> Option<Arc<Project>>;

    fn resolve_port(&self, project_id: &str, uri: &str) -> Option<Arc<SoapPort>>;

    fn resolve_application(
        &self,
        project_id: &str,
        application_id: &str,
    ) -> Option<Arc<RestApplication>>;

    fn list_operations(&self, port_id: &str) -> Vec<Arc<SoapOperation>>;

    fn list_resources(&self, application_id: &str) -> Vec<Arc<RestResource>>;

    fn list_methods(&self, resource_id: &str) -> Vec<Arc<RestMethod>>;

    /// Enabled mock responses of an operation or method, in creation order.
    fn list_mock_responses(&self, operation_id: &str) -> Vec<Arc<MockResponse>>;

    /// The configured default response, if it exists and is enabled.
    fn default_response(&self, operation_id: &str) -> Option<Arc<MockResponse>>;
}

fn validate_project(project: &Project) -> Result<(), String> {
    if project.name.trim().is_empty() {
        return Err("name cannot be empty".to_string());
    }
    Ok(())
}

fn validate_port(port: &SoapPort) -> Result<(), String> {
    if port.uri.is_empty() || port.uri.starts_with('/') {
        return Err(format!("invalid uri '{}'", port.uri));
    }
    Ok(())
}

fn validate_settings(settings: &OperationSettings) -> Result<(), String> {
    if settings.status == OperationStatus::Forwarded && settings.forwarded_endpoint.is_none() {
        return Err("forwarded operations need a forwarded endpoint".to_string());
    }
    Ok(())
}

fn validate_operation(operation: &SoapOperation) -> Result<(), String> {
    if operation.identifier.name.is_empty() {
        return Err("operation identifier cannot be empty".to_string());
    }
    validate_settings(&operation.settings)
}

fn validate_resource(resource: &RestResource) -> Result<(), String> {
    if !resource.uri.starts_with('/') {
        return Err(format!("uri '{}' must start with '/'", resource.uri));
    }
    Ok(())
}

fn validate_method(method: &RestMethod) -> Result<(), String> {
    validate_settings(&method.settings)
}

fn validate_response(response: &MockResponse) -> Result<(), String> {
    if let Some(code) = response.http_status_code {
        if !(100..=599).contains(&code) {
            return Err(format!("invalid HTTP status code {code}"));
        }
    }
    if response.headers.iter().any(|h| h.name.trim().is_empty()) {
        return Err("header names cannot be empty".to_string());
    }
    if response
        .xpath_expressions
        .iter()
        .any(|e| e.expression.trim().is_empty())
    {
        return Err("XPath expressions cannot be empty".to_string());
    }
    Ok(())
}

/// In-memory catalog of every configured project.
pub struct CatalogStore {
    projects: MemoryRepository<Project>,
    ports: MemoryRepository<SoapPort>,
    operations: MemoryRepository<SoapOperation>,
    applications: MemoryRepository<RestApplication>,
    resources: MemoryRepository<RestResource>,
    methods: MemoryRepository<RestMethod>,
    responses: MemoryRepository<MockResponse>,
}

impl Default for CatalogStore {
    fn default() -> Self {
        Self::new()
    }
}

impl CatalogStore {
    pub fn new() -> Self {
        Self {
            projects: MemoryRepository::with_validator(validate_project),
            ports: MemoryRepository::with_validator(validate_port),
            operations: MemoryRepository::with_validator(validate_operation),
            applications: MemoryRepository::new(),
            resources: MemoryRepository::with_validator(validate_resource),
            methods: MemoryRepository::with_validator(validate_method),
            responses: MemoryRepository::with_validator(validate_response),
        }
    }

    pub fn projects(&self) -> &MemoryRepository<Project> {
        &self.projects
    }

    pub fn ports(&self) -> &MemoryRepository<SoapPort> {
        &self.ports
    }

    pub fn operations(&self) -> &MemoryRepository<SoapOperation> {
        &self.operations
    }

    pub fn applications(&self) -> &MemoryRepository<RestApplication> {
        &self.applications
    }

    pub fn resources(&self) -> &MemoryRepository<RestResource> {
        &self.resources
    }

    pub fn methods(&self) -> &MemoryRepository<RestMethod> {
        &self.methods
    }

    pub fn responses(&self) -> &MemoryRepository<MockResponse> {
        &self.responses
    }

    /// Enable or disable a mock response. Visible to the next selection.
    pub fn set_response_status(
        &self,
        response_id: &str,
        status: ResponseStatus,
    ) -> Result<Arc<MockResponse>, RepositoryError> {
        self.responses.update(response_id, |r| r.status = status)
    }

    /// Change the status of a SOAP operation or REST method.
    pub fn set_operation_status(
        &self,
        operation_id: &str,
        status: OperationStatus,
    ) -> Result<(), RepositoryError> {
        if self.operations.load(operation_id).is_some() {
            self.operations
                .update(operation_id, |op| op.settings.status = status)?;
            return Ok(());
        }
        self.methods
            .update(operation_id, |method| method.settings.status = status)?;
        Ok(())
    }

    /// Settings of a SOAP operation or REST method by id.
    pub fn operation_settings(&self, operation_id: &str) -> Option<OperationSettings> {
        if let Some(operation) = self.operations.load(operation_id) {
            return Some(operation.settings.clone());
        }
        self.methods
            .load(operation_id)
            .map(|method| method.settings.clone())
    }
}

impl ConfigurationStore for CatalogStore {
    fn list_projects(&self) -> Vec<Arc<Project>> {
        self.projects.list().to_vec()
    }

    fn project(&self, project_id: &str) -> Option<Arc<Project>> {
        self.projects.load(project_id)
    }

    fn resolve_port(&self, project_id: &str, uri: &str) -> Option<Arc<SoapPort>> {
        self.ports
            .find_where(|port| port.project_id == project_id && port.uri == uri)
            .into_iter()
            .next()
    }

    fn resolve_application(
        &self,
        project_id: &str,
        application_id: &str,
    ) -> Option<Arc<RestApplication>> {
        self.applications
            .load(application_id)
            .filter(|application| application.project_id == project_id)
    }

    fn list_operations(&self, port_id: &str) -> Vec<Arc<SoapOperation>> {
        self.operations.find_where(|op| op.port_id == port_id)
    }

    fn list_resources(&self, application_id: &str) -> Vec<Arc<RestResource>> {
        self.resources
            .find_where(|resource| resource.application_id == application_id)
    }

    fn list_methods(&self, resource_id: &str) -> Vec<Arc<RestMethod>> {
        self.methods
            .find_where(|method| method.resource_id == resource_id)
    }

    fn list_mock_responses(&self, operation_id: &str) -> Vec<Arc<MockResponse>> {
        self.responses
            .find_where(|r| r.operation_id == operation_id && r.is_enabled())
    }

    fn default_response(&self, operation_id: &str) -> Option<Arc<MockResponse>> {
        let default_id = self.operation_settings(operation_id)?.default_response_id?;
        self.responses
            .load(&default_id)
            .filter(|r| r.operation_id == operation_id && r.is_enabled())
    }
}

/// Ids of every project of the given kind.
pub fn project_ids(store: &dyn ConfigurationStore, kind: ProjectKind) -> Vec<String> {
    store
        .list_projects()
        .iter()
        .filter(|project| project.kind == kind)
        .map(|project| project.id.clone())
        .collect()
}
