//! Catalog of entity metadata
//!
//! Loaded once at startup (from a JSON file or built in code) and passed
//! read-only into every planning call.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use crate::errors::{PlanError, PlanResult};

use super::errors::{SchemaError, SchemaResult};
use super::types::EntitySpec;

/// Read-only registry of entities indexed by name
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    entities: BTreeMap<String, EntitySpec>,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a catalog from in-memory specs
    pub fn from_entities(entities: impl IntoIterator<Item = EntitySpec>) -> SchemaResult<Self> {
        let mut catalog = Self::new();
        for entity in entities {
            catalog.register(entity)?;
        }
        Ok(catalog)
    }

    /// Loads a JSON array of entity specs
    pub fn load(path: &Path) -> SchemaResult<Self> {
        let content = fs::read_to_string(path).map_err(|source| SchemaError::Io {
            path: path.display().to_string(),
            source,
        })?;

        let entities: Vec<EntitySpec> =
            serde_json::from_str(&content).map_err(|source| SchemaError::Json {
                path: path.display().to_string(),
                source,
            })?;

        Self::from_entities(entities)
    }

    /// Registers one entity after validating its structure
    pub fn register(&mut self, entity: EntitySpec) -> SchemaResult<()> {
        entity
            .validate_structure()
            .map_err(|reason| SchemaError::MalformedEntity {
                entity: entity.name.clone(),
                reason,
            })?;

        if self.entities.contains_key(&entity.name) {
            return Err(SchemaError::DuplicateEntity(entity.name));
        }

        self.entities.insert(entity.name.clone(), entity);
        Ok(())
    }

    pub fn entity(&self, name: &str) -> PlanResult<&EntitySpec> {
        self.entities
            .get(name)
            .ok_or_else(|| PlanError::EntityNotFound(name.to_string()))
    }

    pub fn entities(&self) -> impl Iterator<Item = &EntitySpec> {
        self.entities.values()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::AttributeMeta;

    fn users() -> EntitySpec {
        EntitySpec::new("User", "users", "id").with_attribute(AttributeMeta::integer("id", "id"))
    }

    #[test]
    fn test_register_and_lookup() {
        let catalog = Catalog::from_entities([users()]).unwrap();
        assert_eq!(catalog.entity("User").unwrap().table, "users");
        assert_eq!(
            catalog.entity("Post").unwrap_err().code(),
            "SEEK_ENTITY_NOT_FOUND"
        );
    }

    #[test]
    fn test_duplicate_rejected() {
        let err = Catalog::from_entities([users(), users()]).unwrap_err();
        assert_eq!(err.code(), "SEEK_SCHEMA_DUPLICATE");
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("catalog.json");
        fs::write(
            &path,
            r#"[{"name": "User", "table": "users", "primary_key": "id",
                 "attributes": [{"name": "id", "column": "id", "type": "integer"}]}]"#,
        )
        .unwrap();

        let catalog = Catalog::load(&path).unwrap();
        assert!(catalog.entity("User").is_ok());
    }

    #[test]
    fn test_load_rejects_bad_json() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("catalog.json");
        fs::write(&path, "{not json").unwrap();

        let err = Catalog::load(&path).unwrap_err();
        assert_eq!(err.code(), "SEEK_SCHEMA_JSON");
    }
}
