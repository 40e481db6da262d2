//! Schema introspection over the registered record types
//!
//! Counts and samples are best-effort: when the store cannot be read the
//! result still carries every type's property list, with zero counts and an
//! error note.

use std::collections::BTreeMap;
use serde::Serialize;
use crate::schema::registry::{self, PropertyDescriptor, TypeDescriptor, REGISTERED_TYPES};
use crate::storage::{Session, SessionMode, StoreConfig};
use crate::{Error, Result};

/// Number of stored records returned per type by [`Introspector::data_structure`]
pub const SAMPLE_SIZE: usize = 5;

const INDEX_NOTE: &str = "Index metadata is managed by the embedded engine and is not exposed";

/// Schema of a single type, as returned by a lookup
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TypeSchema {
    #[serde(flatten)]
    pub descriptor: TypeDescriptor,
    pub serializable: bool,
}

/// Count and sample of one stored type
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StructureSample {
    pub type_name: &'static str,
    pub count: u64,
    pub sample_data: Vec<serde_json::Value>,
    pub properties: &'static [PropertyDescriptor],
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl StructureSample {
    fn degraded(descriptor: &'static TypeDescriptor, error: &Error) -> Self {
        Self {
            type_name: descriptor.type_name,
            count: 0,
            sample_data: Vec::new(),
            properties: descriptor.properties,
            error: Some(error.to_string()),
        }
    }
}

/// Per-type record counts
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Statistics {
    pub counts: BTreeMap<&'static str, u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Placeholder for engine index metadata
#[derive(Debug, Clone, Serialize)]
pub struct IndexInfo {
    pub message: &'static str,
}

/// Everything known about the store in one document
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DatabaseSchema {
    pub database_path: String,
    pub registered_types: Vec<&'static TypeDescriptor>,
    pub statistics: Statistics,
    pub indexes: IndexInfo,
}

/// Reflects over the registered types and the store's contents
pub struct Introspector {
    config: StoreConfig,
}

impl Introspector {
    pub fn new(config: StoreConfig) -> Self {
        Self { config }
    }

    /// The five registered types with their property lists
    pub fn registered_types(&self) -> Vec<&'static TypeDescriptor> {
        REGISTERED_TYPES.to_vec()
    }

    /// Simple names of the registered types
    pub fn available_types(&self) -> Vec<&'static str> {
        registry::type_names()
    }

    /// Case-insensitive lookup; `None` when no registered type matches
    pub fn type_schema(&self, name: &str) -> Option<TypeSchema> {
        registry::find(name).map(|descriptor| TypeSchema {
            descriptor: *descriptor,
            serializable: true,
        })
    }

    /// Lookup that reports an unknown name as [`Error::TypeNotFound`]
    pub fn require_type_schema(&self, name: &str) -> Result<TypeSchema> {
        self.type_schema(name)
            .ok_or_else(|| Error::TypeNotFound(name.to_string()))
    }

    /// Count, sample and properties for every registered type
    pub fn data_structure(&self) -> BTreeMap<&'static str, StructureSample> {
        let session = match Session::open(&self.config, SessionMode::Read) {
            Ok(session) => session,
            Err(e) => {
                tracing::debug!("data structure read degraded: {}", e);
                return REGISTERED_TYPES
                    .iter()
                    .map(|&d| (d.type_name, StructureSample::degraded(d, &e)))
                    .collect();
            }
        };

        let structure: BTreeMap<_, _> = REGISTERED_TYPES
            .iter()
            .map(|&d| (d.type_name, sample_type(&session, d)))
            .collect();
        if let Err(e) = session.commit() {
            tracing::warn!("failed to close introspection session: {}", e);
        }
        structure
    }

    /// Store path, type catalog, statistics and index placeholder
    pub fn database_schema(&self) -> DatabaseSchema {
        DatabaseSchema {
            database_path: self.config.store_dir().display().to_string(),
            registered_types: self.registered_types(),
            statistics: self.statistics(),
            indexes: IndexInfo { message: INDEX_NOTE },
        }
    }

    fn statistics(&self) -> Statistics {
        let counts = Session::open(&self.config, SessionMode::Read).and_then(|session| {
            let counts = session.count_all()?;
            session.commit()?;
            Ok(counts)
        });

        match counts {
            Ok(counts) => Statistics { counts, error: None },
            Err(e) => Statistics {
                counts: REGISTERED_TYPES.iter().map(|d| (d.type_name, 0)).collect(),
                error: Some(format!("Could not retrieve statistics: {}", e)),
            },
        }
    }
}

fn sample_type(session: &Session, descriptor: &'static TypeDescriptor) -> StructureSample {
    let sampled = session.count_type(descriptor.type_name).and_then(|count| {
        let sample = session.sample_type(descriptor.type_name, SAMPLE_SIZE)?;
        Ok((count, sample))
    });

    match sampled {
        Ok((count, sample_data)) => StructureSample {
            type_name: descriptor.type_name,
            count,
            sample_data,
            properties: descriptor.properties,
            error: None,
        },
        Err(e) => StructureSample::degraded(descriptor, &e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::StoreInitializer;
    use tempfile::TempDir;

    fn config_in(dir: &TempDir) -> StoreConfig {
        StoreConfig::new(dir.path(), "objects")
    }

    #[test]
    fn test_registered_types_is_fixed() {
        let dir = TempDir::new().unwrap();
        let introspector = Introspector::new(config_in(&dir));
        let names: Vec<&str> = introspector.registered_types().iter().map(|d| d.type_name).collect();
        assert_eq!(names, vec!["User", "WorkspaceData", "WorkspaceObject", "Position", "Relationship"]);
        assert_eq!(introspector.available_types(), names);
    }

    #[test]
    fn test_unknown_type_is_empty_not_error() {
        let dir = TempDir::new().unwrap();
        let introspector = Introspector::new(config_in(&dir));
        assert!(introspector.type_schema("Nonexistent").is_none());
        assert!(introspector.type_schema("position").is_some());
        let err = introspector.require_type_schema("Nonexistent").unwrap_err();
        assert_eq!(err.kind(), crate::ErrorKind::TypeNotFound);
    }

    #[test]
    fn test_data_structure_degrades_without_store() {
        let dir = TempDir::new().unwrap();
        let introspector = Introspector::new(config_in(&dir));
        let structure = introspector.data_structure();
        assert_eq!(structure.len(), 5);
        for sample in structure.values() {
            assert_eq!(sample.count, 0);
            assert!(sample.sample_data.is_empty());
            assert!(!sample.properties.is_empty());
            assert!(sample.error.is_some());
        }
    }

    #[test]
    fn test_data_structure_after_seed() {
        let dir = TempDir::new().unwrap();
        let config = config_in(&dir);
        StoreInitializer::new(config.clone()).initialize(false).unwrap();

        let structure = Introspector::new(config).data_structure();
        assert_eq!(structure["User"].count, 1);
        assert_eq!(structure["WorkspaceData"].count, 1);
        assert_eq!(structure["WorkspaceObject"].count, 6);
        assert_eq!(structure["Position"].count, 6);
        assert_eq!(structure["Relationship"].count, 3);
        assert_eq!(structure["WorkspaceObject"].sample_data.len(), SAMPLE_SIZE);
        assert_eq!(structure["User"].sample_data[0]["name"], "Admin");
        assert!(structure.values().all(|s| s.error.is_none()));
    }

    #[test]
    fn test_database_schema_statistics() {
        let dir = TempDir::new().unwrap();
        let config = config_in(&dir);
        let introspector = Introspector::new(config.clone());

        let before = introspector.database_schema();
        assert!(before.statistics.error.is_some());
        assert_eq!(before.statistics.counts["User"], 0);

        StoreInitializer::new(config).initialize(false).unwrap();
        let after = introspector.database_schema();
        assert!(after.statistics.error.is_none());
        assert_eq!(after.statistics.counts["Relationship"], 3);
        assert_eq!(after.registered_types.len(), 5);
    }
}
