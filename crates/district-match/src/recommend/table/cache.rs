use super::InfluenceTable;
use crate::recommend::error::RecommendationError;
use crate::recommend::schema::FactorSchema;
use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::SystemTime;

/// Identity of a file on disk; a change in either field forces a reload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct FileFingerprint {
    modified: Option<SystemTime>,
    len: u64,
}

impl FileFingerprint {
    fn read(path: &Path) -> Result<Self, RecommendationError> {
        let metadata = std::fs::metadata(path).map_err(|err| match err.kind() {
            ErrorKind::NotFound => RecommendationError::FileNotFound {
                path: path.to_path_buf(),
            },
            _ => RecommendationError::Io(err),
        })?;

        Ok(Self {
            modified: metadata.modified().ok(),
            len: metadata.len(),
        })
    }
}

struct CachedTable {
    fingerprint: FileFingerprint,
    table: Arc<InfluenceTable>,
}

/// Loads influence tables at most once per file identity and hands out shared handles.
pub struct InfluenceTableCache {
    schema: Arc<FactorSchema>,
    entries: Mutex<HashMap<PathBuf, CachedTable>>,
}

impl InfluenceTableCache {
    pub fn new(schema: Arc<FactorSchema>) -> Self {
        Self {
            schema,
            entries: Mutex::new(HashMap::new()),
        }
    }

    pub fn schema(&self) -> &Arc<FactorSchema> {
        &self.schema
    }

    pub fn get_or_load<P: AsRef<Path>>(
        &self,
        path: P,
    ) -> Result<Arc<InfluenceTable>, RecommendationError> {
        let path = path.as_ref();
        let fingerprint = FileFingerprint::read(path)?;

        let mut guard = self.entries.lock().expect("table cache mutex poisoned");
        if let Some(cached) = guard.get(path) {
            if cached.fingerprint == fingerprint {
                tracing::debug!(path = %path.display(), "influence table cache hit");
                return Ok(Arc::clone(&cached.table));
            }
        }

        tracing::debug!(path = %path.display(), "influence table cache miss");
        let table = Arc::new(InfluenceTable::load(path, &self.schema)?);
        guard.insert(
            path.to_path_buf(),
            CachedTable {
                fingerprint,
                table: Arc::clone(&table),
            },
        );
        Ok(table)
    }

    pub fn invalidate<P: AsRef<Path>>(&self, path: P) -> bool {
        let mut guard = self.entries.lock().expect("table cache mutex poisoned");
        guard.remove(path.as_ref()).is_some()
    }

    pub fn clear(&self) {
        self.entries
            .lock()
            .expect("table cache mutex poisoned")
            .clear();
    }

    pub fn len(&self) -> usize {
        self.entries.lock().expect("table cache mutex poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
