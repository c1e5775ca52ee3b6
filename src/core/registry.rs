use crate::core::keywords::builtin_schemas;
use crate::domain::schema::KeywordSchema;
use crate::utils::error::{DeckError, Result};
use crate::utils::validation::Validate;
use std::collections::HashMap;

/// Keyword name to schema mapping.
///
/// Filled once before parsing starts and only read afterwards, so a single
/// registry can be shared (e.g. behind an `Arc`) by any number of parsers.
#[derive(Debug, Clone, Default)]
pub struct SchemaRegistry {
    schemas: HashMap<String, KeywordSchema>,
}

impl SchemaRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry preloaded with the builtin keyword set.
    pub fn builtin() -> Result<Self> {
        let mut registry = Self::new();
        registry.register_all(builtin_schemas())?;
        Ok(registry)
    }

    pub fn register(&mut self, schema: KeywordSchema) -> Result<()> {
        schema.validate()?;

        let key = schema.name.to_ascii_uppercase();
        if self.schemas.contains_key(&key) {
            return Err(DeckError::DuplicateKeyword { keyword: key });
        }

        tracing::debug!(keyword = %key, count = ?schema.count, "Registered keyword schema");
        self.schemas.insert(key, schema);
        Ok(())
    }

    pub fn register_all(&mut self, schemas: impl IntoIterator<Item = KeywordSchema>) -> Result<()> {
        for schema in schemas {
            self.register(schema)?;
        }
        Ok(())
    }

    /// Case-insensitive lookup; unknown names are not an error here.
    pub fn lookup(&self, name: &str) -> Option<&KeywordSchema> {
        self.schemas.get(&name.to_ascii_uppercase())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.lookup(name).is_some()
    }

    pub fn len(&self) -> usize {
        self.schemas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.schemas.is_empty()
    }

    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.schemas.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::schema::{ItemSchema, RecordCount};

    #[test]
    fn test_register_and_lookup_case_insensitive() {
        let mut registry = SchemaRegistry::new();
        registry
            .register(KeywordSchema::single(
                "dimens",
                vec![
                    ItemSchema::int("NX"),
                    ItemSchema::int("NY"),
                    ItemSchema::int("NZ"),
                ],
            ))
            .unwrap();

        let schema = registry.lookup("Dimens").unwrap();
        assert_eq!(schema.name, "DIMENS");
        assert_eq!(schema.count, RecordCount::Single);
        assert!(registry.lookup("WELSPECS").is_none());
    }

    #[test]
    fn test_duplicate_registration_fails() {
        let mut registry = SchemaRegistry::new();
        registry.register(KeywordSchema::flag("RUNSPEC")).unwrap();

        let err = registry.register(KeywordSchema::flag("runspec")).unwrap_err();
        assert!(matches!(err, DeckError::DuplicateKeyword { ref keyword } if keyword == "RUNSPEC"));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_invalid_schema_is_rejected() {
        let mut registry = SchemaRegistry::new();
        let err = registry
            .register(KeywordSchema::single(
                "BROKEN",
                vec![ItemSchema::float("A").tail(), ItemSchema::float("B")],
            ))
            .unwrap_err();
        assert!(matches!(err, DeckError::InvalidSchema { .. }));
        assert!(registry.is_empty());
    }

    #[test]
    fn test_builtin_registry() {
        let registry = SchemaRegistry::builtin().unwrap();
        for name in ["RUNSPEC", "DIMENS", "START", "WELSPECS", "DATES", "SCHEDULE"] {
            assert!(registry.contains(name), "missing builtin {}", name);
        }
        assert_eq!(
            registry.lookup("WELSPECS").unwrap().count,
            RecordCount::Unbounded
        );
        assert_eq!(registry.lookup("OIL").unwrap().count, RecordCount::Fixed(0));
        assert_eq!(registry.names().len(), registry.len());
    }
}
