//! SOAP operation resolution.

use super::envelope::{body_root_element, soap_action};
use super::MatchedOperation;
use crate::error::EngineError;
use crate::model::{ProjectKind, SoapOperation};
use crate::request::InboundRequest;
use crate::store::ConfigurationStore;
use std::sync::Arc;

pub(super) fn match_soap(
    store: &dyn ConfigurationStore,
    project_id: &str,
    port_uri: &str,
    request: &InboundRequest,
) -> Result<MatchedOperation, EngineError> {
    store
        .project(project_id)
        .filter(|project| project.kind == ProjectKind::Soap)
        .ok_or_else(|| EngineError::NoMatchingProject(project_id.to_string()))?;
    let port = store
        .resolve_port(project_id, port_uri)
        .ok_or_else(|| EngineError::NoMatchingPort {
            project_id: project_id.to_string(),
            uri: port_uri.to_string(),
        })?;

    let operations = store.list_operations(&port.id);
    let action = soap_action(
        request.header("SOAPAction"),
        request.header("Content-Type"),
    );
    let operation = find_operation(&operations, action, &request.body_text())?;

    MatchedOperation::new(
        ProjectKind::Soap,
        project_id,
        &operation.id,
        &operation.name,
        &operation.settings,
    )
}

/// Pick the operation by SOAP action, falling back to the body root element.
fn find_operation(
    operations: &[Arc<SoapOperation>],
    action: Option<&str>,
    body: &str,
) -> Result<Arc<SoapOperation>, EngineError> {
    let by_action: Vec<&Arc<SoapOperation>> = match action {
        Some(action) => operations
            .iter()
            .filter(|op| op.soap_action.as_deref() == Some(action))
            .collect(),
        None => Vec::new(),
    };
    if let [operation] = by_action.as_slice() {
        return Ok(Arc::clone(operation));
    }

    let element = body_root_element(body).ok_or_else(|| {
        EngineError::NoMatchingOperation("request body is not a SOAP envelope".to_string())
    })?;
    let by_element: Vec<&Arc<SoapOperation>> = operations
        .iter()
        .filter(|op| {
            op.identifier
                .accepts(&element.local_name, element.namespace.as_deref())
        })
        .collect();

    // Several candidates sharing one action narrow the body match down.
    let candidates = if by_action.len() > 1 {
        let narrowed: Vec<_> = by_element
            .iter()
            .copied()
            .filter(|op| by_action.iter().any(|a| a.id == op.id))
            .collect();
        if narrowed.is_empty() {
            by_element
        } else {
            narrowed
        }
    } else {
        by_element
    };

    match candidates.as_slice() {
        [] => Err(EngineError::NoMatchingOperation(format!(
            "no operation accepts element '{}'",
            element.local_name
        ))),
        [operation] => Ok(Arc::clone(operation)),
        several => Err(EngineError::AmbiguousOperation {
            element: element.local_name.clone(),
            candidates: several.iter().map(|op| op.id.clone()).collect(),
        }),
    }
}
