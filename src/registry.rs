use std::path::PathBuf;

use redb::backends::InMemoryBackend;
use redb::{Database, ReadableTable, ReadableTableMetadata, TableDefinition};
use serde::{Deserialize, Serialize};

use crate::errors::ProjectError;

const PROJECTS_TABLE: TableDefinition<&str, &str> = TableDefinition::new("projects");

/// Arbitrary structured metadata attached to a project. Opaque to the core;
/// insertion order is preserved.
pub type Attributes = serde_json::Map<String, serde_json::Value>;

/// Persisted project entry. `name` is the unique, case-sensitive key.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ProjectRecord {
    pub name: String,
    pub attributes: Attributes,
}

/// Where the registry keeps its data. `Memory` is for ephemeral or test use;
/// a manager can reattach to its file-backed location afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistryLocation {
    File(PathBuf),
    Memory,
}

/// The embedded record store of project entries, one redb table mapping
/// project name to a JSON-encoded [`ProjectRecord`].
pub struct Registry {
    db: Database,
}

impl Registry {
    pub fn open(location: RegistryLocation) -> Result<Self, ProjectError> {
        let db = match location {
            RegistryLocation::File(path) => Database::create(path)?,
            RegistryLocation::Memory => {
                Database::builder().create_with_backend(InMemoryBackend::new())?
            }
        };

        // Creating the table up front keeps read paths from racing a
        // missing-table error on a fresh store.
        let write_txn = db.begin_write()?;
        {
            let _ = write_txn.open_table(PROJECTS_TABLE)?;
        }
        write_txn.commit()?;

        Ok(Self { db })
    }

    pub fn get(&self, name: &str) -> Result<ProjectRecord, ProjectError> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(PROJECTS_TABLE)?;
        match table.get(name)? {
            Some(val) => Ok(serde_json::from_str(val.value())?),
            None => Err(ProjectError::NotFound(name.to_string())),
        }
    }

    /// Insert a new record. Fails with `DuplicateName` when the name is
    /// already registered.
    pub fn create(&self, name: &str, attributes: Attributes) -> Result<ProjectRecord, ProjectError> {
        let record = ProjectRecord {
            name: name.to_string(),
            attributes,
        };
        let write_txn = self.db.begin_write()?;
        {
            let mut table = write_txn.open_table(PROJECTS_TABLE)?;
            if table.get(name)?.is_some() {
                return Err(ProjectError::DuplicateName(name.to_string()));
            }
            let val = serde_json::to_string(&record)?;
            table.insert(name, val.as_str())?;
        }
        write_txn.commit()?;
        Ok(record)
    }

    /// Return the existing record for `name`, or insert one with the given
    /// attributes. An existing record keeps its attributes untouched.
    pub fn get_or_create(
        &self,
        name: &str,
        attributes: Attributes,
    ) -> Result<ProjectRecord, ProjectError> {
        let write_txn = self.db.begin_write()?;
        let record = {
            let mut table = write_txn.open_table(PROJECTS_TABLE)?;
            let existing = table.get(name)?.map(|val| val.value().to_string());
            match existing {
                Some(json) => serde_json::from_str(&json)?,
                None => {
                    let record = ProjectRecord {
                        name: name.to_string(),
                        attributes,
                    };
                    let val = serde_json::to_string(&record)?;
                    table.insert(name, val.as_str())?;
                    record
                }
            }
        };
        write_txn.commit()?;
        Ok(record)
    }

    pub fn delete(&self, name: &str) -> Result<(), ProjectError> {
        let write_txn = self.db.begin_write()?;
        {
            let mut table = write_txn.open_table(PROJECTS_TABLE)?;
            table.remove(name)?;
        }
        write_txn.commit()?;
        Ok(())
    }

    /// All records in key order (lexicographic by name bytes). Arbitrary but
    /// deterministic for a given store; stable within one snapshot.
    pub fn list(&self) -> Result<Vec<ProjectRecord>, ProjectError> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(PROJECTS_TABLE)?;
        let mut records = Vec::new();
        for res in table.iter()? {
            let (_key, val) = res?;
            records.push(serde_json::from_str(val.value())?);
        }
        Ok(records)
    }

    pub fn count(&self) -> Result<usize, ProjectError> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(PROJECTS_TABLE)?;
        Ok(table.len()? as usize)
    }

    pub fn contains(&self, name: &str) -> Result<bool, ProjectError> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(PROJECTS_TABLE)?;
        Ok(table.get(name)?.is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn memory_registry() -> Registry {
        Registry::open(RegistryLocation::Memory).unwrap()
    }

    fn attrs(pairs: &[(&str, &str)]) -> Attributes {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), serde_json::Value::from(*v)))
            .collect()
    }

    #[test]
    fn test_create_and_get() {
        let registry = memory_registry();
        registry.create("alpha", attrs(&[("k", "v")])).unwrap();
        let record = registry.get("alpha").unwrap();
        assert_eq!(record.name, "alpha");
        assert_eq!(record.attributes, attrs(&[("k", "v")]));
    }

    #[test]
    fn test_create_rejects_duplicate_name() {
        let registry = memory_registry();
        registry.create("alpha", Attributes::new()).unwrap();
        match registry.create("alpha", Attributes::new()) {
            Err(ProjectError::DuplicateName(name)) => assert_eq!(name, "alpha"),
            other => panic!("expected DuplicateName, got {other:?}"),
        }
    }

    #[test]
    fn test_get_or_create_keeps_existing_attributes() {
        let registry = memory_registry();
        registry.create("alpha", attrs(&[("k", "v")])).unwrap();
        let record = registry
            .get_or_create("alpha", attrs(&[("k", "other")]))
            .unwrap();
        assert_eq!(record.attributes, attrs(&[("k", "v")]));
        assert_eq!(registry.count().unwrap(), 1);
    }

    #[test]
    fn test_names_are_case_sensitive() {
        let registry = memory_registry();
        registry.create("Alpha", Attributes::new()).unwrap();
        registry.create("alpha", Attributes::new()).unwrap();
        assert_eq!(registry.count().unwrap(), 2);
    }

    #[test]
    fn test_delete_and_contains() {
        let registry = memory_registry();
        registry.create("alpha", Attributes::new()).unwrap();
        assert!(registry.contains("alpha").unwrap());
        registry.delete("alpha").unwrap();
        assert!(!registry.contains("alpha").unwrap());
        assert_eq!(registry.count().unwrap(), 0);
    }

    #[test]
    fn test_get_missing_is_not_found() {
        let registry = memory_registry();
        match registry.get("ghost") {
            Err(ProjectError::NotFound(name)) => assert_eq!(name, "ghost"),
            other => panic!("expected NotFound, got {other:?}"),
        }
    }

    #[test]
    fn test_list_is_deterministic_per_store() {
        let registry = memory_registry();
        for name in ["zeta", "alpha", "mid"] {
            registry.create(name, Attributes::new()).unwrap();
        }
        let first: Vec<String> = registry.list().unwrap().into_iter().map(|r| r.name).collect();
        let second: Vec<String> = registry.list().unwrap().into_iter().map(|r| r.name).collect();
        assert_eq!(first, second);
        assert_eq!(first.len(), 3);
    }

    #[test]
    fn test_file_backed_registry_persists() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("projects.redb");
        {
            let registry = Registry::open(RegistryLocation::File(path.clone())).unwrap();
            registry.create("alpha", Attributes::new()).unwrap();
        }
        let registry = Registry::open(RegistryLocation::File(path)).unwrap();
        assert!(registry.contains("alpha").unwrap());
    }
}
