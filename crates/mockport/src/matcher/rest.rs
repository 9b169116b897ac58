//! REST resource and method resolution.

use super::path::{match_uri_template, TemplateMatch};
use super::MatchedOperation;
use crate::error::EngineError;
use crate::model::{HttpMethod, ProjectKind, RestResource};
use crate::store::ConfigurationStore;
use std::sync::Arc;

pub(super) fn match_rest(
    store: &dyn ConfigurationStore,
    project_id: &str,
    application_id: &str,
    resource_path: &str,
    method: &str,
) -> Result<MatchedOperation, EngineError> {
    store
        .project(project_id)
        .filter(|project| project.kind == ProjectKind::Rest)
        .ok_or_else(|| EngineError::NoMatchingProject(project_id.to_string()))?;
    let application = store
        .resolve_application(project_id, application_id)
        .ok_or_else(|| EngineError::NoMatchingApplication {
            project_id: project_id.to_string(),
            application_id: application_id.to_string(),
        })?;

    let resources = store.list_resources(&application.id);
    let (resource, template) = best_resource(&resources, resource_path)
        .ok_or_else(|| EngineError::NoMatchingResource(resource_path.to_string()))?;

    let no_method = || EngineError::NoMatchingMethod {
        resource: resource.uri.clone(),
        method: method.to_string(),
    };
    let verb: HttpMethod = method.parse().map_err(|_| no_method())?;
    let rest_method = store
        .list_methods(&resource.id)
        .into_iter()
        .find(|m| m.http_method == verb)
        .ok_or_else(no_method)?;

    let mut matched = MatchedOperation::new(
        ProjectKind::Rest,
        project_id,
        &rest_method.id,
        &rest_method.name,
        &rest_method.settings,
    )?;
    matched.path_parameters = template.path_parameters;
    Ok(matched)
}

/// The resource whose template matches with the most literal segments.
/// Ties keep the earliest defined resource.
fn best_resource(
    resources: &[Arc<RestResource>],
    path: &str,
) -> Option<(Arc<RestResource>, TemplateMatch)> {
    let mut best: Option<(Arc<RestResource>, TemplateMatch)> = None;
    for resource in resources {
        let Some(candidate) = match_uri_template(&resource.uri, path) else {
            continue;
        };
        let better = match &best {
            Some((_, current)) => candidate.literal_segments > current.literal_segments,
            None => true,
        };
        if better {
            best = Some((Arc::clone(resource), candidate));
        }
    }
    best
}
