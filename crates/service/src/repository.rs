use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use uuid::Uuid;

use models::Entity;

use crate::errors::ServiceError;

/// Generic in-memory keyed store, one instance per entity kind.
///
/// Purely a keyed map with no cross-entity knowledge. All mutations on a
/// single kind are linearizable: inserts go through the entry API and
/// updates/deletes hold the shard lock for the duration of the change, so
/// two concurrent creates cannot both claim the same id and an
/// update/delete pair on one id applies in a definite order.
pub struct Repository<T: Entity> {
    kind: &'static str,
    inner: DashMap<Uuid, T>,
}

impl<T: Entity> Repository<T> {
    pub fn new(kind: &'static str) -> Self {
        Self { kind, inner: DashMap::new() }
    }

    /// Store an entity under its id; `DuplicateKey` if the id is taken.
    pub fn insert(&self, entity: T) -> Result<T, ServiceError> {
        match self.inner.entry(entity.id()) {
            Entry::Occupied(_) => Err(ServiceError::DuplicateKey(format!(
                "{} id {} already exists",
                self.kind,
                entity.id()
            ))),
            Entry::Vacant(slot) => {
                slot.insert(entity.clone());
                Ok(entity)
            }
        }
    }

    /// Fetch a clone of the entity; absence is not an error.
    pub fn get(&self, id: Uuid) -> Option<T> {
        self.inner.get(&id).map(|entry| entry.clone())
    }

    /// Merge a partial change into the stored entity and refresh its
    /// update timestamp. The merge runs on a clone and is written back
    /// only on success, so a rejected mutation never partially applies.
    pub fn update<F>(&self, id: Uuid, merge: F) -> Result<T, ServiceError>
    where
        F: FnOnce(&mut T) -> Result<(), ServiceError>,
    {
        let mut guard = self
            .inner
            .get_mut(&id)
            .ok_or_else(|| ServiceError::not_found(self.kind))?;
        let mut candidate = guard.clone();
        merge(&mut candidate)?;
        candidate.touch();
        *guard = candidate.clone();
        Ok(candidate)
    }

    /// Remove the entry, returning it; `NotFound` if absent.
    pub fn delete(&self, id: Uuid) -> Result<T, ServiceError> {
        self.inner
            .remove(&id)
            .map(|(_, entity)| entity)
            .ok_or_else(|| ServiceError::not_found(self.kind))
    }

    /// Snapshot of all stored entities. Order is unspecified and the
    /// snapshot may be stale by the time the caller acts on it.
    pub fn list_all(&self) -> Vec<T> {
        self.inner.iter().map(|entry| entry.value().clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}
