//! Storage layer for deployed process models and process snapshots.
//!
//! Collections are registered in a [`Store`] by type. Only the in-memory
//! backend ships with the crate; other backends implement [`DbStore`].

pub mod data;
mod mem;
mod store;

use strum::{AsRefStr, EnumIter};

use crate::Result;

pub use mem::{Collect, MemStore};
pub use store::Store;

/// Identifiers for different storage collections.
#[derive(Debug, Clone, AsRefStr, PartialEq, Hash, Eq, EnumIter)]
pub enum StoreIden {
    /// Deployed process models.
    #[strum(serialize = "workflows")]
    Workflows,
    /// Persisted process snapshots.
    #[strum(serialize = "snapshots")]
    Snapshots,
}

/// Trait for types that can identify their storage collection.
pub trait DbCollectionIden {
    /// Returns the collection identifier for this type.
    fn iden() -> StoreIden;
}

/// A record keyed by its id.
pub trait DbDocument {
    fn id(&self) -> &str;
}

/// Trait for database collection operations.
pub trait DbCollection: Send + Sync {
    /// The type of items stored in this collection.
    type Item;

    /// Checks if a record with the given ID exists.
    fn exists(
        &self,
        id: &str,
    ) -> Result<bool>;

    /// Finds a record by ID.
    fn find(
        &self,
        id: &str,
    ) -> Result<Self::Item>;

    /// Every record, ordered by id.
    fn list(&self) -> Result<Vec<Self::Item>>;

    /// Creates a new record.
    fn create(
        &self,
        data: &Self::Item,
    ) -> Result<bool>;

    /// Updates an existing record.
    fn update(
        &self,
        data: &Self::Item,
    ) -> Result<bool>;

    /// Deletes a record by ID.
    fn delete(
        &self,
        id: &str,
    ) -> Result<bool>;
}

/// Trait for database store initialization.
pub trait DbStore {
    /// Registers the backend's collections with the store.
    fn init(
        &self,
        s: &Store,
    ) -> Result<()>;
}
