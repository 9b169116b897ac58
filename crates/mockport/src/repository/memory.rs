//! Copy-on-write in-memory repository.

use super::{Entity, Repository, RepositoryError, Validator};
use parking_lot::RwLock;
use std::fmt;
use std::sync::Arc;

/// Repository holding an immutable snapshot that writers replace wholesale.
///
/// Readers clone the snapshot `Arc` under a short read lock and then iterate
/// without holding any lock, so a listing never observes a half applied write.
pub struct MemoryRepository<T: Entity> {
    entries: RwLock<Arc<Vec<Arc<T>>>>,
    validate: Validator<T>,
}

fn accept_all<T>(_: &T) -> Result<(), String> {
    Ok(())
}

impl<T: Entity> Default for MemoryRepository<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Entity> MemoryRepository<T> {
    pub fn new() -> Self {
        Self::with_validator(accept_all::<T>)
    }

    pub fn with_validator(validate: Validator<T>) -> Self {
        Self {
            entries: RwLock::new(Arc::new(Vec::new())),
            validate,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    /// Replace an existing entity by applying `update` to a copy of it.
    pub fn update<F>(&self, id: &str, update: F) -> Result<Arc<T>, RepositoryError>
    where
        F: FnOnce(&mut T),
    {
        let mut entity = self
            .load(id)
            .map(|current| (*current).clone())
            .ok_or_else(|| RepositoryError::NotFound {
                kind: T::KIND,
                id: id.to_string(),
            })?;
        update(&mut entity);
        self.save(entity)
    }
}

impl<T: Entity> Repository<T> for MemoryRepository<T> {
    fn load(&self, id: &str) -> Option<Arc<T>> {
        let snapshot = self.list();
        snapshot.iter().find(|entity| entity.id() == id).cloned()
    }

    fn save(&self, entity: T) -> Result<Arc<T>, RepositoryError> {
        if entity.id().is_empty() {
            return Err(RepositoryError::Invalid {
                kind: T::KIND,
                id: String::new(),
                reason: "id cannot be empty".to_string(),
            });
        }
        (self.validate)(&entity).map_err(|reason| RepositoryError::Invalid {
            kind: T::KIND,
            id: entity.id().to_string(),
            reason,
        })?;

        let entity = Arc::new(entity);
        let mut guard = self.entries.write();
        let mut next = Vec::clone(&guard);
        match next.iter().position(|existing| existing.id() == entity.id()) {
            Some(position) => {
                let current = next[position].owner_id();
                let requested = entity.owner_id();
                if current != requested {
                    return Err(RepositoryError::OwnerChanged {
                        kind: T::KIND,
                        id: entity.id().to_string(),
                        current: current.unwrap_or_default().to_string(),
                        requested: requested.unwrap_or_default().to_string(),
                    });
                }
                next[position] = Arc::clone(&entity);
            }
            None => next.push(Arc::clone(&entity)),
        }
        *guard = Arc::new(next);
        Ok(entity)
    }

    fn delete(&self, id: &str) -> Result<Arc<T>, RepositoryError> {
        let mut guard = self.entries.write();
        let position = guard
            .iter()
            .position(|entity| entity.id() == id)
            .ok_or_else(|| RepositoryError::NotFound {
                kind: T::KIND,
                id: id.to_string(),
            })?;
        let mut next = Vec::clone(&guard);
        let removed = next.remove(position);
        *guard = Arc::new(next);
        Ok(removed)
    }

    fn list(&self) -> Arc<Vec<Arc<T>>> {
        Arc::clone(&self.entries.read())
    }
}

impl<T: Entity> fmt::Debug for MemoryRepository<T> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("MemoryRepository")
            .field("kind", &T::KIND)
            .field("len", &self.len())
            .finish()
    }
}
