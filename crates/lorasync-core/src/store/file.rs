// ── JSON file association store ──
//
// Whole-map snapshot rewritten after every upsert: serialize to a
// sibling temp file, then rename over the target so readers never see a
// half-written file.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use tracing::debug;

use super::{AssociationStore, StoreError, newer};
use crate::model::Association;

#[derive(Debug)]
pub struct JsonFileAssociationStore {
    path: PathBuf,
    rows: Mutex<BTreeMap<i32, Association>>,
}

impl JsonFileAssociationStore {
    /// Open `path`, loading existing rows. A missing file is an empty store.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let rows = match fs::read(&path) {
            Ok(bytes) if bytes.iter().all(u8::is_ascii_whitespace) => BTreeMap::new(),
            Ok(bytes) => {
                let list: Vec<Association> = serde_json::from_slice(&bytes)?;
                list.into_iter().map(|r| (r.asset_id, r)).collect()
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => return Err(io_error(&path, e)),
        };
        debug!(path = %path.display(), rows = rows.len(), "association store opened");
        Ok(Self {
            path,
            rows: Mutex::new(rows),
        })
    }

    fn lock(&self) -> Result<MutexGuard<'_, BTreeMap<i32, Association>>, StoreError> {
        self.rows.lock().map_err(|_| StoreError::Poisoned)
    }

    fn persist(&self, rows: &BTreeMap<i32, Association>) -> Result<(), StoreError> {
        let list: Vec<&Association> = rows.values().collect();
        let json = serde_json::to_vec_pretty(&list)?;

        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir).map_err(|e| io_error(dir, e))?;
        }
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, json).map_err(|e| io_error(&tmp, e))?;
        fs::rename(&tmp, &self.path).map_err(|e| io_error(&self.path, e))
    }
}

fn io_error(path: &Path, source: std::io::Error) -> StoreError {
    StoreError::Io {
        path: path.display().to_string(),
        source,
    }
}

impl AssociationStore for JsonFileAssociationStore {
    fn upsert(&self, row: Association) -> Result<Association, StoreError> {
        let mut rows = self.lock()?;
        if let Some(current) = rows.get(&row.asset_id) {
            if !newer(current, &row) {
                return Ok(current.clone());
            }
        }
        let previous = rows.insert(row.asset_id, row.clone());
        if let Err(e) = self.persist(&rows) {
            // Keep memory and disk in step.
            match previous {
                Some(prev) => rows.insert(prev.asset_id, prev),
                None => rows.remove(&row.asset_id),
            };
            return Err(e);
        }
        Ok(row)
    }

    fn lookup(&self, asset_id: i32) -> Result<Option<Association>, StoreError> {
        Ok(self.lock()?.get(&asset_id).cloned())
    }

    fn list(&self) -> Result<Vec<Association>, StoreError> {
        Ok(self.lock()?.values().cloned().collect())
    }
}
