// ── In-process stores ──

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;

use super::{AssociationStore, ConfigStore, StoreError, newer};
use crate::model::{Association, TenantConfig};

/// Tenant configurations held in memory, seeded once from the config file.
#[derive(Debug, Default)]
pub struct MemoryConfigStore {
    configs: DashMap<i64, TenantConfig>,
}

impl MemoryConfigStore {
    pub fn new(configs: impl IntoIterator<Item = TenantConfig>) -> Self {
        Self {
            configs: configs.into_iter().map(|c| (c.id, c)).collect(),
        }
    }

    /// Flip operator intent, as an edit to the configuration table would.
    pub fn set_enabled(&self, id: i64, enabled: bool) -> Result<(), StoreError> {
        let mut entry = self
            .configs
            .get_mut(&id)
            .ok_or(StoreError::UnknownConfiguration(id))?;
        entry.enabled = enabled;
        Ok(())
    }
}

impl ConfigStore for MemoryConfigStore {
    fn list(&self) -> Result<Vec<TenantConfig>, StoreError> {
        let mut all: Vec<TenantConfig> = self.configs.iter().map(|e| e.value().clone()).collect();
        all.sort_by_key(|c| c.id);
        Ok(all)
    }

    fn set_active(&self, id: i64, active: bool) -> Result<(), StoreError> {
        let mut entry = self
            .configs
            .get_mut(&id)
            .ok_or(StoreError::UnknownConfiguration(id))?;
        entry.active = active;
        Ok(())
    }
}

/// Associations in a `DashMap`; lost on restart.
#[derive(Debug, Default)]
pub struct MemoryAssociationStore {
    rows: DashMap<i32, Association>,
}

impl MemoryAssociationStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

impl AssociationStore for MemoryAssociationStore {
    fn upsert(&self, row: Association) -> Result<Association, StoreError> {
        // The entry guard holds the shard lock for the whole compare-and-set.
        match self.rows.entry(row.asset_id) {
            Entry::Occupied(mut slot) => {
                if newer(slot.get(), &row) {
                    slot.insert(row);
                }
                Ok(slot.get().clone())
            }
            Entry::Vacant(slot) => Ok(slot.insert(row).value().clone()),
        }
    }

    fn lookup(&self, asset_id: i32) -> Result<Option<Association>, StoreError> {
        Ok(self.rows.get(&asset_id).map(|r| r.value().clone()))
    }

    fn list(&self) -> Result<Vec<Association>, StoreError> {
        let mut all: Vec<Association> = self.rows.iter().map(|r| r.value().clone()).collect();
        all.sort_by_key(|r| r.asset_id);
        Ok(all)
    }
}
