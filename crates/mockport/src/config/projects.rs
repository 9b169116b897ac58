//! Project files and their conversion into store entities.
//!
//! A project file is a nested tree (project -> ports -> operations ->
//! responses, or project -> applications -> resources -> methods ->
//! responses). Conversion flattens it into the per-kind entity lists the
//! store keeps, generating ids where the file omits them.

use crate::model::{
    ContentEncoding, HttpHeader, HttpMethod, JsonPathExpression, MockResponse,
    OperationIdentifier, OperationSettings, OperationStatus, Project, ProjectKind,
    ResponseStatus, ResponseStrategy, RestApplication, RestMethod, RestResource, SoapOperation,
    SoapPort, SoapResource, SoapResourceType, SoapVersion, XPathExpression,
};
use crate::repository::{Repository, SoapResourceStore};
use crate::response::has_expressions;
use crate::selector::{validate_json_path, validate_xpath};
use crate::store::CatalogStore;
use anyhow::{bail, Context};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectFile {
    #[serde(default)]
    pub id: Option<String>,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(rename = "type")]
    pub kind: ProjectKind,
    #[serde(default)]
    pub ports: Vec<PortDto>,
    #[serde(default)]
    pub resources: Vec<SoapResourceDto>,
    #[serde(default)]
    pub applications: Vec<ApplicationDto>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PortDto {
    #[serde(default)]
    pub id: Option<String>,
    pub name: String,
    pub uri: String,
    #[serde(default)]
    pub target_namespace: Option<String>,
    #[serde(default)]
    pub operations: Vec<OperationDto>,
}

/// Settings shared by SOAP operations and REST methods.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SettingsDto {
    #[serde(default)]
    pub status: OperationStatus,
    #[serde(default)]
    pub response_strategy: ResponseStrategy,
    #[serde(default)]
    pub simulate_network_delay: bool,
    #[serde(default)]
    pub network_delay: i64,
    /// Id or name of one of the operation's responses.
    #[serde(default)]
    pub default_response: Option<String>,
    #[serde(default)]
    pub forwarded_endpoint: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OperationDto {
    #[serde(default)]
    pub id: Option<String>,
    pub name: String,
    /// Defaults to the operation name without a namespace.
    #[serde(default)]
    pub identifier: Option<OperationIdentifier>,
    #[serde(default)]
    pub soap_action: Option<String>,
    #[serde(default)]
    pub soap_version: SoapVersion,
    #[serde(flatten)]
    pub settings: SettingsDto,
    #[serde(default)]
    pub responses: Vec<MockResponseDto>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SoapResourceDto {
    #[serde(default)]
    pub id: Option<String>,
    pub name: String,
    #[serde(rename = "type")]
    pub resource_type: SoapResourceType,
    /// Document to import, relative to the project file.
    pub file: PathBuf,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationDto {
    #[serde(default)]
    pub id: Option<String>,
    pub name: String,
    #[serde(default)]
    pub resources: Vec<ResourceDto>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceDto {
    #[serde(default)]
    pub id: Option<String>,
    pub name: String,
    pub uri: String,
    #[serde(default)]
    pub methods: Vec<MethodDto>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MethodDto {
    #[serde(default)]
    pub id: Option<String>,
    pub name: String,
    pub http_method: String,
    #[serde(flatten)]
    pub settings: SettingsDto,
    #[serde(default)]
    pub responses: Vec<MockResponseDto>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct HeaderDto {
    pub name: String,
    pub value: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MockResponseDto {
    #[serde(default)]
    pub id: Option<String>,
    pub name: String,
    #[serde(default)]
    pub status: ResponseStatus,
    #[serde(default)]
    pub http_status_code: Option<u16>,
    #[serde(default)]
    pub body: String,
    #[serde(default)]
    pub headers: Vec<HeaderDto>,
    #[serde(default)]
    pub content_encodings: Vec<ContentEncoding>,
    #[serde(default)]
    pub using_expressions: bool,
    #[serde(default)]
    pub xpath_expressions: Vec<XPathExpression>,
    #[serde(default)]
    pub json_path_expressions: Vec<JsonPathExpression>,
}

/// Flattened entities of one project file.
#[derive(Debug, Clone)]
pub struct ProjectEntities {
    pub project: Project,
    pub ports: Vec<SoapPort>,
    pub operations: Vec<SoapOperation>,
    /// SOAP resources and the files their documents are read from.
    pub soap_resources: Vec<(SoapResource, PathBuf)>,
    pub applications: Vec<RestApplication>,
    pub resources: Vec<RestResource>,
    pub methods: Vec<RestMethod>,
    pub responses: Vec<MockResponse>,
}

fn new_id() -> String {
    uuid::Uuid::new_v4().simple().to_string()
}

/// Tracks ids handed out during one conversion.
struct IdRegistry(HashSet<String>);

impl IdRegistry {
    fn claim(&mut self, kind: &str, id: Option<String>) -> anyhow::Result<String> {
        let id = id.unwrap_or_else(new_id);
        if id.trim().is_empty() {
            bail!("{} id cannot be blank", kind);
        }
        if !self.0.insert(id.clone()) {
            bail!("duplicate id '{}' ({})", id, kind);
        }
        Ok(id)
    }
}

fn header_from_dto(dto: HeaderDto) -> HttpHeader {
    HttpHeader::new(dto.name, dto.value)
}

fn response_from_dto(
    dto: MockResponseDto,
    id: String,
    operation_id: &str,
) -> anyhow::Result<MockResponse> {
    for expression in &dto.xpath_expressions {
        validate_xpath(&expression.expression).map_err(|e| {
            anyhow::anyhow!(
                "response '{}': invalid XPath '{}': {}",
                dto.name,
                expression.expression,
                e
            )
        })?;
    }
    for expression in &dto.json_path_expressions {
        validate_json_path(&expression.expression).map_err(|e| {
            anyhow::anyhow!(
                "response '{}': invalid JSON path '{}': {}",
                dto.name,
                expression.expression,
                e
            )
        })?;
    }
    if !dto.using_expressions && has_expressions(&dto.body) {
        warn!(
            response = %dto.name,
            "Body contains expressions but usingExpressions is not set; they are sent verbatim"
        );
    }
    Ok(MockResponse {
        id,
        operation_id: operation_id.to_string(),
        name: dto.name,
        status: dto.status,
        http_status_code: dto.http_status_code,
        body: dto.body,
        headers: dto.headers.into_iter().map(header_from_dto).collect(),
        content_encodings: dto.content_encodings,
        using_expressions: dto.using_expressions,
        xpath_expressions: dto.xpath_expressions,
        json_path_expressions: dto.json_path_expressions,
    })
}

/// Convert an operation's responses and resolve its default response
/// reference, which may name a response by id or by name.
fn settings_and_responses(
    owner: &str,
    operation_id: &str,
    settings: SettingsDto,
    responses: Vec<MockResponseDto>,
    ids: &mut IdRegistry,
) -> anyhow::Result<(OperationSettings, Vec<MockResponse>)> {
    let mut converted = Vec::with_capacity(responses.len());
    for dto in responses {
        let id = ids.claim("response", dto.id.clone())?;
        converted.push(response_from_dto(dto, id, operation_id)?);
    }

    let default_response_id = match settings.default_response {
        Some(reference) => {
            let found = converted
                .iter()
                .find(|r| r.id == reference)
                .or_else(|| converted.iter().find(|r| r.name == reference));
            match found {
                Some(response) => Some(response.id.clone()),
                None => bail!(
                    "{}: default response '{}' is not one of its responses",
                    owner,
                    reference
                ),
            }
        }
        None => None,
    };
    if settings.status == OperationStatus::Forwarded && settings.forwarded_endpoint.is_none() {
        bail!("{}: FORWARDED status requires forwardedEndpoint", owner);
    }

    let settings = OperationSettings {
        status: settings.status,
        strategy: settings.response_strategy,
        simulate_network_delay: settings.simulate_network_delay,
        network_delay_ms: settings.network_delay,
        default_response_id,
        forwarded_endpoint: settings.forwarded_endpoint,
    };
    Ok((settings, converted))
}

/// Flatten a project file into store entities.
///
/// `base_dir` is the directory SOAP resource files are resolved against.
pub fn convert_project(file: ProjectFile, base_dir: &Path) -> anyhow::Result<ProjectEntities> {
    let mut ids = IdRegistry(HashSet::new());
    let project_id = ids.claim("project", file.id)?;

    match file.kind {
        ProjectKind::Soap if !file.applications.is_empty() => {
            bail!("SOAP project '{}' cannot define applications", file.name)
        }
        ProjectKind::Rest if !file.ports.is_empty() || !file.resources.is_empty() => {
            bail!(
                "REST project '{}' cannot define ports or SOAP resources",
                file.name
            )
        }
        _ => {}
    }

    let mut entities = ProjectEntities {
        project: Project {
            id: project_id.clone(),
            name: file.name,
            description: file.description,
            kind: file.kind,
        },
        ports: Vec::new(),
        operations: Vec::new(),
        soap_resources: Vec::new(),
        applications: Vec::new(),
        resources: Vec::new(),
        methods: Vec::new(),
        responses: Vec::new(),
    };

    let mut port_uris = HashSet::new();
    for port in file.ports {
        let port_id = ids.claim("port", port.id)?;
        if !port_uris.insert(port.uri.clone()) {
            bail!("duplicate port uri '{}'", port.uri);
        }
        for operation in port.operations {
            let operation_id = ids.claim("operation", operation.id)?;
            let owner = format!("operation '{}'", operation.name);
            let (settings, responses) = settings_and_responses(
                &owner,
                &operation_id,
                operation.settings,
                operation.responses,
                &mut ids,
            )?;
            entities.responses.extend(responses);
            entities.operations.push(SoapOperation {
                id: operation_id,
                port_id: port_id.clone(),
                identifier: operation
                    .identifier
                    .unwrap_or_else(|| OperationIdentifier::new(operation.name.clone())),
                name: operation.name,
                soap_action: operation.soap_action,
                version: operation.soap_version,
                settings,
            });
        }
        entities.ports.push(SoapPort {
            id: port_id,
            project_id: project_id.clone(),
            name: port.name,
            uri: port.uri,
            target_namespace: port.target_namespace,
        });
    }

    for resource in file.resources {
        let id = ids.claim("SOAP resource", resource.id)?;
        let path = if resource.file.is_relative() {
            base_dir.join(&resource.file)
        } else {
            resource.file
        };
        entities.soap_resources.push((
            SoapResource {
                id,
                project_id: project_id.clone(),
                name: resource.name,
                resource_type: resource.resource_type,
            },
            path,
        ));
    }

    for application in file.applications {
        let application_id = ids.claim("application", application.id)?;
        for resource in application.resources {
            let resource_id = ids.claim("resource", resource.id)?;
            for method in resource.methods {
                let method_id = ids.claim("method", method.id)?;
                let owner = format!("method '{}'", method.name);
                let http_method: HttpMethod = method
                    .http_method
                    .parse()
                    .map_err(|e: String| anyhow::anyhow!("{}: {}", owner, e))?;
                let (settings, responses) = settings_and_responses(
                    &owner,
                    &method_id,
                    method.settings,
                    method.responses,
                    &mut ids,
                )?;
                entities.responses.extend(responses);
                entities.methods.push(RestMethod {
                    id: method_id,
                    resource_id: resource_id.clone(),
                    name: method.name,
                    http_method,
                    settings,
                });
            }
            entities.resources.push(RestResource {
                id: resource_id,
                application_id: application_id.clone(),
                name: resource.name,
                uri: resource.uri,
            });
        }
        entities.applications.push(RestApplication {
            id: application_id,
            project_id: project_id.clone(),
            name: application.name,
        });
    }

    Ok(entities)
}

impl ProjectEntities {
    /// Save every entity into `store`, parents first. SOAP resource documents
    /// are copied into `resource_store` when one is configured.
    pub fn install(
        self,
        store: &CatalogStore,
        resource_store: Option<&SoapResourceStore>,
    ) -> anyhow::Result<Arc<Project>> {
        if store.projects().load(&self.project.id).is_some() {
            bail!("project id '{}' is already loaded", self.project.id);
        }
        let project = store.projects().save(self.project)?;
        for port in self.ports {
            store.ports().save(port)?;
        }
        for operation in self.operations {
            store.operations().save(operation)?;
        }
        for application in self.applications {
            store.applications().save(application)?;
        }
        for resource in self.resources {
            store.resources().save(resource)?;
        }
        for method in self.methods {
            store.methods().save(method)?;
        }
        for response in self.responses {
            store.responses().save(response)?;
        }
        if let Some(resource_store) = resource_store {
            for (resource, path) in self.soap_resources {
                let content = std::fs::read_to_string(&path)
                    .with_context(|| format!("Failed to read SOAP resource {:?}", path))?;
                resource_store.save(resource, &content)?;
            }
        }
        Ok(project)
    }
}

/// Read a project file; `.json` files are parsed as JSON, anything else as YAML.
pub fn load_project_file(path: &Path) -> anyhow::Result<ProjectFile> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read project file {:?}", path))?;
    let is_json = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
    let file = if is_json {
        serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse project file {:?}", path))?
    } else {
        serde_yaml::from_str(&contents)
            .with_context(|| format!("Failed to parse project file {:?}", path))?
    };
    Ok(file)
}

/// Load, convert and install every project file.
pub fn load_projects(
    paths: &[PathBuf],
    store: &CatalogStore,
    resource_store: Option<&SoapResourceStore>,
) -> anyhow::Result<Vec<Arc<Project>>> {
    let mut projects = Vec::with_capacity(paths.len());
    for path in paths {
        let file = load_project_file(path)?;
        let base_dir = path.parent().unwrap_or_else(|| Path::new("."));
        let entities = convert_project(file, base_dir)
            .with_context(|| format!("Invalid project file {:?}", path))?;
        let project = entities
            .install(store, resource_store)
            .with_context(|| format!("Failed to load project file {:?}", path))?;
        info!(
            id = %project.id,
            name = %project.name,
            kind = project.kind.as_str(),
            "Loaded project"
        );
        projects.push(project);
    }
    Ok(projects)
}
