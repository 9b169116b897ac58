//! Entity repositories.
//!
//! One capability trait, [`Repository`], implemented once by
//! [`MemoryRepository`]. Entity specific rules are supplied as a validation
//! function when the repository is built.

mod memory;
mod resource;

pub use memory::MemoryRepository;
pub use resource::{ResourceError, SoapResourceStore};

use crate::model::{
    MockResponse, Project, RestApplication, RestMethod, RestResource, SoapOperation, SoapPort,
    SoapResource,
};
use std::sync::Arc;

/// Entity validation hook, run before every save.
pub type Validator<T> = fn(&T) -> Result<(), String>;

/// An identifiable value stored in a repository.
pub trait Entity: Clone + Send + Sync + 'static {
    /// Human readable kind used in error messages.
    const KIND: &'static str;

    fn id(&self) -> &str;

    /// Id of the owning entity when ownership is immutable after creation.
    fn owner_id(&self) -> Option<&str> {
        None
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RepositoryError {
    #[error("{kind} with id '{id}' not found")]
    NotFound { kind: &'static str, id: String },
    #[error("Invalid {kind} '{id}': {reason}")]
    Invalid {
        kind: &'static str,
        id: String,
        reason: String,
    },
    #[error("{kind} '{id}' belongs to '{current}' and cannot be moved to '{requested}'")]
    OwnerChanged {
        kind: &'static str,
        id: String,
        current: String,
        requested: String,
    },
}

/// Storage capability shared by every entity kind.
pub trait Repository<T: Entity>: Send + Sync {
    fn load(&self, id: &str) -> Option<Arc<T>>;

    /// Insert or replace an entity. Replacements keep their position in the listing order.
    fn save(&self, entity: T) -> Result<Arc<T>, RepositoryError>;

    fn delete(&self, id: &str) -> Result<Arc<T>, RepositoryError>;

    /// Consistent snapshot of all entities in creation order.
    fn list(&self) -> Arc<Vec<Arc<T>>>;

    fn find_where<F>(&self, predicate: F) -> Vec<Arc<T>>
    where
        F: Fn(&T) -> bool,
    {
        self.list()
            .iter()
            .filter(|entity| predicate(entity))
            .cloned()
            .collect()
    }
}

impl Entity for Project {
    const KIND: &'static str = "Project";

    fn id(&self) -> &str {
        &self.id
    }
}

impl Entity for SoapPort {
    const KIND: &'static str = "SOAP port";

    fn id(&self) -> &str {
        &self.id
    }

    fn owner_id(&self) -> Option<&str> {
        Some(&self.project_id)
    }
}

impl Entity for SoapOperation {
    const KIND: &'static str = "SOAP operation";

    fn id(&self) -> &str {
        &self.id
    }

    fn owner_id(&self) -> Option<&str> {
        Some(&self.port_id)
    }
}

impl Entity for SoapResource {
    const KIND: &'static str = "SOAP resource";

    fn id(&self) -> &str {
        &self.id
    }

    fn owner_id(&self) -> Option<&str> {
        Some(&self.project_id)
    }
}

impl Entity for RestApplication {
    const KIND: &'static str = "REST application";

    fn id(&self) -> &str {
        &self.id
    }

    fn owner_id(&self) -> Option<&str> {
        Some(&self.project_id)
    }
}

impl Entity for RestResource {
    const KIND: &'static str = "REST resource";

    fn id(&self) -> &str {
        &self.id
    }

    fn owner_id(&self) -> Option<&str> {
        Some(&self.application_id)
    }
}

impl Entity for RestMethod {
    const KIND: &'static str = "REST method";

    fn id(&self) -> &str {
        &self.id
    }

    fn owner_id(&self) -> Option<&str> {
        Some(&self.resource_id)
    }
}

impl Entity for MockResponse {
    const KIND: &'static str = "Mock response";

    fn id(&self) -> &str {
        &self.id
    }

    fn owner_id(&self) -> Option<&str> {
        Some(&self.operation_id)
    }
}
