//! Common repository traits
//!
//! Generic interfaces implemented by every repository on top of the document store.

use super::StoreError;

/// Trait for creating new entities
///
/// # Type Parameters
/// * `Entity` - Type of the returned entity (with ID assigned by the store)
/// * `CreateDTO` - DTO for creation (without ID, will be automatically generated)
pub trait Create<Entity, CreateDTO> {
    /// Creates a new entity
    ///
    /// # Returns
    /// * `Ok(Entity)` - Created entity with ID assigned by the store
    /// * `Err(StoreError)` - Error during insertion
    async fn create(&self, data: &CreateDTO) -> Result<Entity, StoreError>;
}

/// Trait for reading a single entity by primary key
pub trait Read<Entity, Id> {
    /// # Returns
    /// * `Ok(Some(Entity))` - Entity found
    /// * `Ok(None)` - No entity with that ID
    async fn read(&self, id: &Id) -> Result<Option<Entity>, StoreError>;
}

/// Trait for reading multiple entities by list of primary keys
pub trait ReadMany<Entity, Id> {
    /// Reads the entities with the given keys, ordered by key.
    /// Missing keys are skipped silently.
    async fn read_many(&self, ids: &[Id]) -> Result<Vec<Entity>, StoreError>;
}

/// Trait for deleting entities
pub trait Delete<Id> {
    /// Deletes an entity. Deleting a missing entity is not an error.
    async fn delete(&self, id: &Id) -> Result<(), StoreError>;
}
