//! File-backed storage of WSDL and XSD documents attached to SOAP projects.
//!
//! Documents live under `<root>/wsdl` or `<root>/schema` depending on their
//! type, named `<resource id><extension>`.

use super::{MemoryRepository, Repository, RepositoryError};
use crate::model::{SoapResource, SoapResourceType};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, warn};

const WSDL_DIRECTORY: &str = "wsdl";
const SCHEMA_DIRECTORY: &str = "schema";
const DEFAULT_EXTENSION: &str = ".xml";

#[derive(Debug, thiserror::Error)]
pub enum ResourceError {
    #[error(transparent)]
    Repository(#[from] RepositoryError),
    #[error("I/O error on {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// SOAP resource metadata plus the documents on disk.
pub struct SoapResourceStore {
    root: PathBuf,
    extension: String,
    resources: MemoryRepository<SoapResource>,
}

fn validate_resource(resource: &SoapResource) -> Result<(), String> {
    if resource.project_id.is_empty() {
        return Err("project id cannot be empty".to_string());
    }
    Ok(())
}

impl SoapResourceStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            extension: DEFAULT_EXTENSION.to_string(),
            resources: MemoryRepository::with_validator(validate_resource),
        }
    }

    pub fn with_extension(mut self, extension: impl Into<String>) -> Self {
        self.extension = extension.into();
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory holding documents of the given type.
    pub fn directory_for(&self, resource_type: SoapResourceType) -> PathBuf {
        match resource_type {
            SoapResourceType::Wsdl => self.root.join(WSDL_DIRECTORY),
            SoapResourceType::Schema => self.root.join(SCHEMA_DIRECTORY),
        }
    }

    pub fn path_for(&self, resource: &SoapResource) -> PathBuf {
        self.directory_for(resource.resource_type)
            .join(format!("{}{}", resource.id, self.extension))
    }

    /// Save the resource metadata and write its document.
    pub fn save(
        &self,
        resource: SoapResource,
        content: &str,
    ) -> Result<Arc<SoapResource>, ResourceError> {
        let path = self.path_for(&resource);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|source| ResourceError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        fs::write(&path, content).map_err(|source| ResourceError::Io {
            path: path.clone(),
            source,
        })?;
        debug!(path = %path.display(), "Stored SOAP resource");
        Ok(self.resources.save(resource)?)
    }

    pub fn load_content(&self, id: &str) -> Result<String, ResourceError> {
        let resource = self
            .resources
            .load(id)
            .ok_or_else(|| RepositoryError::NotFound {
                kind: "SOAP resource",
                id: id.to_string(),
            })?;
        let path = self.path_for(&resource);
        fs::read_to_string(&path).map_err(|source| ResourceError::Io { path, source })
    }

    /// Remove a resource. A missing document is logged, not reported: imported
    /// projects do not always ship every file they reference.
    pub fn delete(&self, id: &str) -> Result<Arc<SoapResource>, ResourceError> {
        let removed = self.resources.delete(id)?;
        let path = self.path_for(&removed);
        if let Err(e) = fs::remove_file(&path) {
            warn!(path = %path.display(), error = %e, "Unable to delete SOAP resource document");
        }
        Ok(removed)
    }

    /// Resources of a project, optionally restricted to one type.
    pub fn find(
        &self,
        project_id: &str,
        resource_type: Option<SoapResourceType>,
    ) -> Vec<Arc<SoapResource>> {
        self.resources.find_where(|resource| {
            resource.project_id == project_id
                && resource_type.map_or(true, |t| t == resource.resource_type)
        })
    }
}
