// ── Engine state stores ──
//
// The engine's two collaborators for local state: tenant configurations
// (read, plus the `active` flag) and asset ↔ device associations.
// Both are synchronous; no implementation may hold a lock across an
// await point, so callers never need to.

mod file;
mod memory;

pub use file::JsonFileAssociationStore;
pub use memory::{MemoryAssociationStore, MemoryConfigStore};

use crate::model::{Association, TenantConfig};

/// Failures of a backing store.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed store contents: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Store lock poisoned")]
    Poisoned,

    #[error("Unknown configuration id {0}")]
    UnknownConfiguration(i64),
}

/// Source of tenant configurations.
pub trait ConfigStore: Send + Sync {
    /// Every configuration, enabled or not, ordered by id.
    fn list(&self) -> Result<Vec<TenantConfig>, StoreError>;

    /// Persist the `active` flag for one configuration.
    fn set_active(&self, id: i64, active: bool) -> Result<(), StoreError>;
}

/// Durable asset ↔ device associations, unique by asset id.
pub trait AssociationStore: Send + Sync {
    /// Atomic insert-or-replace keyed by `row.asset_id`. A row older
    /// than the stored one (by `modified_at`) is discarded.
    fn upsert(&self, row: Association) -> Result<Association, StoreError>;

    fn lookup(&self, asset_id: i32) -> Result<Option<Association>, StoreError>;

    /// All rows, ordered by asset id.
    fn list(&self) -> Result<Vec<Association>, StoreError>;

    /// Rows whose last recorded change is not a delete.
    fn list_active(&self) -> Result<Vec<Association>, StoreError> {
        Ok(self
            .list()?
            .into_iter()
            .filter(|row| !row.is_deleted())
            .collect())
    }
}

/// Keep whichever of two rows for the same asset completed last.
pub(crate) fn newer(current: &Association, incoming: &Association) -> bool {
    incoming.modified_at >= current.modified_at
}
