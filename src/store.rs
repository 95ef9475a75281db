//! JSON file holding the working record set between invocations

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use anyhow::Context;
use tracing::{debug, info};

use crate::data::validate_record;
use crate::error::ValidationError;
use crate::record::{ensure_unique_ids, Record};

/// Default store location, relative to the working directory
pub const DEFAULT_STORE_PATH: &str = "customers.json";

/// Persistent customer list backed by a pretty-printed JSON array
#[derive(Debug, Clone)]
pub struct SessionStore {
    path: PathBuf,
}

impl SessionStore {
    pub fn open(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Stored records; a missing file is an empty store
    pub fn load(&self) -> crate::Result<Vec<Record>> {
        let text = match fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(err) if err.kind() == ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "store not found, starting empty");
                return Ok(Vec::new());
            }
            Err(err) => {
                return Err(err)
                    .with_context(|| format!("failed to read store {}", self.path.display()))
            }
        };
        if text.trim().is_empty() {
            return Ok(Vec::new());
        }
        let records: Vec<Record> = serde_json::from_str(&text)
            .with_context(|| format!("store {} is corrupt", self.path.display()))?;
        Ok(records)
    }

    /// Replace the stored records
    pub fn save(&self, records: &[Record]) -> crate::Result<()> {
        ensure_unique_ids(records)?;
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }
        let json = serde_json::to_string_pretty(records)?;
        fs::write(&self.path, json)
            .with_context(|| format!("failed to write store {}", self.path.display()))?;
        info!(count = records.len(), path = %self.path.display(), "saved customer records");
        Ok(())
    }

    /// Validate and append one record, returning the new total
    pub fn add(&self, record: Record) -> crate::Result<usize> {
        validate_record(&record)?;
        let mut records = self.load()?;
        if records.iter().any(|existing| existing.id == record.id) {
            return Err(ValidationError::DuplicateId(record.id).into());
        }
        records.push(record);
        self.save(&records)?;
        Ok(records.len())
    }

    /// Append many records, keeping the stored ones
    pub fn extend(&self, incoming: Vec<Record>) -> crate::Result<usize> {
        let mut records = self.load()?;
        records.extend(incoming);
        self.save(&records)?;
        Ok(records.len())
    }

    /// Remove every stored record
    pub fn clear(&self) -> crate::Result<()> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
            Err(err) => {
                Err(err).with_context(|| format!("failed to remove {}", self.path.display()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::Segment;
    use crate::rules::ValueTier;
    use tempfile::tempdir;

    #[test]
    fn test_missing_store_is_empty() {
        let dir = tempdir().unwrap();
        let store = SessionStore::open(dir.path().join("nope.json"));
        assert!(store.load().unwrap().is_empty());
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempdir().unwrap();
        let store = SessionStore::open(dir.path().join("nested/customers.json"));
        let records = vec![
            Record::new("1", "Ann", 30.0, 50_000.0, 70.0),
            Record::new("2", "Ben", 40.0, 90_000.0, 90.0)
                .with_segment(Segment::Tier(ValueTier::HighValue)),
        ];
        store.save(&records).unwrap();
        assert_eq!(store.load().unwrap(), records);
    }

    #[test]
    fn test_add_validates_and_rejects_duplicates() {
        let dir = tempdir().unwrap();
        let store = SessionStore::open(dir.path().join("customers.json"));

        assert_eq!(store.add(Record::new("1", "Ann", 30.0, 50_000.0, 70.0)).unwrap(), 1);
        assert_eq!(store.add(Record::new("2", "Ben", 31.0, 52_000.0, 20.0)).unwrap(), 2);

        let err = store
            .add(Record::new("1", "Again", 30.0, 50_000.0, 70.0))
            .unwrap_err();
        assert_eq!(
            err.downcast_ref::<ValidationError>(),
            Some(&ValidationError::DuplicateId("1".to_string()))
        );

        let err = store
            .add(Record::new("3", "Old", 121.0, 50_000.0, 70.0))
            .unwrap_err();
        assert!(err.to_string().contains("age"));
        assert_eq!(store.load().unwrap().len(), 2);
    }

    #[test]
    fn test_clear() {
        let dir = tempdir().unwrap();
        let store = SessionStore::open(dir.path().join("customers.json"));
        store.add(Record::new("1", "Ann", 30.0, 50_000.0, 70.0)).unwrap();
        store.clear().unwrap();
        assert!(store.load().unwrap().is_empty());
        store.clear().unwrap();
    }

    #[test]
    fn test_corrupt_store_errors() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("customers.json");
        fs::write(&path, "{not json").unwrap();
        let err = SessionStore::open(&path).load().unwrap_err();
        assert!(err.to_string().contains("corrupt"));
    }
}
