//! Keyword schemas declared in TOML and loaded on top of the builtin set.
//!
//! ```toml
//! [[keyword]]
//! name = "MULTFLT"
//! records = "unbounded"
//!
//! [[keyword.items]]
//! name = "FAULT"
//! type = "string"
//!
//! [[keyword.items]]
//! name = "FACTOR"
//! type = "float"
//! default = 1.0
//! ```

use crate::core::registry::SchemaRegistry;
use crate::domain::schema::{Cardinality, ItemSchema, ItemType, KeywordSchema, RecordCount, RecordSchema, Value};
use crate::utils::error::{DeckError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchemaFile {
    #[serde(default, rename = "keyword")]
    pub keywords: Vec<KeywordDefinition>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeywordDefinition {
    pub name: String,
    #[serde(default)]
    pub records: RecordsDefinition,
    /// Items of the single record shape.
    #[serde(default)]
    pub items: Vec<ItemDefinition>,
    /// Record shapes by record index, instead of `items`.
    #[serde(default)]
    pub variants: Vec<VariantDefinition>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RecordsDefinition {
    /// "single", "unbounded" or "none"
    Named(String),
    Count(usize),
}

impl Default for RecordsDefinition {
    fn default() -> Self {
        RecordsDefinition::Named("single".to_string())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VariantDefinition {
    pub items: Vec<ItemDefinition>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ItemDefinition {
    pub name: String,
    #[serde(rename = "type")]
    pub item_type: ItemType,
    pub default: Option<Value>,
    pub size: Option<usize>,
    #[serde(default)]
    pub tail: bool,
    pub dimension: Option<String>,
}

impl SchemaFile {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path)?;
        Self::from_toml_str(&content).map_err(|err| match err {
            DeckError::ConfigValidationError { field, message } => DeckError::ConfigValidationError {
                field,
                message: format!("{}: {}", path.as_ref().display(), message),
            },
            other => other,
        })
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| DeckError::ConfigValidationError {
            field: "schema_file".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    pub fn into_schemas(self) -> Result<Vec<KeywordSchema>> {
        self.keywords
            .into_iter()
            .map(KeywordDefinition::into_schema)
            .collect()
    }

    /// Register every declared keyword. Schemas are validated by the registry
    /// and a name that is already registered aborts the load.
    pub fn register_into(self, registry: &mut SchemaRegistry) -> Result<usize> {
        let schemas = self.into_schemas()?;
        let count = schemas.len();
        registry.register_all(schemas)?;
        Ok(count)
    }
}

impl KeywordDefinition {
    fn invalid(&self, message: impl Into<String>) -> DeckError {
        DeckError::InvalidSchema {
            keyword: self.name.to_ascii_uppercase(),
            message: message.into(),
        }
    }

    fn record_count(&self) -> Result<RecordCount> {
        match &self.records {
            RecordsDefinition::Count(n) => Ok(RecordCount::Fixed(*n)),
            RecordsDefinition::Named(name) => match name.to_ascii_lowercase().as_str() {
                "single" => Ok(RecordCount::Single),
                "unbounded" => Ok(RecordCount::Unbounded),
                "none" => Ok(RecordCount::Fixed(0)),
                other => Err(self.invalid(format!(
                    "records must be \"single\", \"unbounded\", \"none\" or a count, got \"{}\"",
                    other
                ))),
            },
        }
    }

    pub fn into_schema(self) -> Result<KeywordSchema> {
        let count = self.record_count()?;
        if !self.items.is_empty() && !self.variants.is_empty() {
            return Err(self.invalid("declare either items or variants, not both"));
        }

        let records = if !self.variants.is_empty() {
            self.variants
                .iter()
                .map(|variant| self.record_schema(&variant.items))
                .collect::<Result<Vec<_>>>()?
        } else if count == RecordCount::Fixed(0) && self.items.is_empty() {
            Vec::new()
        } else {
            vec![self.record_schema(&self.items)?]
        };

        Ok(KeywordSchema::new(&self.name, count, records))
    }

    fn record_schema(&self, items: &[ItemDefinition]) -> Result<RecordSchema> {
        items
            .iter()
            .map(|item| self.item_schema(item))
            .collect::<Result<Vec<_>>>()
            .map(RecordSchema::new)
    }

    fn item_schema(&self, item: &ItemDefinition) -> Result<ItemSchema> {
        let mut schema = ItemSchema::new(&item.name, item.item_type);
        schema.cardinality = match (item.size, item.tail) {
            (Some(_), true) => {
                return Err(self.invalid(format!(
                    "item {} cannot have both size and tail",
                    item.name
                )))
            }
            (Some(size), false) => Cardinality::Array(size),
            (None, true) => Cardinality::Tail,
            (None, false) => Cardinality::Single,
        };
        schema.default = item.default.clone().map(|value| match (item.item_type, value) {
            // TOML writes whole numbers as integers.
            (ItemType::Float, Value::Int(n)) => Value::Float(n as f64),
            (_, value) => value,
        });
        schema.dimension = item.dimension.clone();
        Ok(schema)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const MULTFLT: &str = r#"
[[keyword]]
name = "multflt"
records = "unbounded"

[[keyword.items]]
name = "FAULT"
type = "string"

[[keyword.items]]
name = "FACTOR"
type = "float"
default = 1
"#;

    #[test]
    fn test_parse_schema_file() {
        let schemas = SchemaFile::from_toml_str(MULTFLT)
            .unwrap()
            .into_schemas()
            .unwrap();

        assert_eq!(schemas.len(), 1);
        let schema = &schemas[0];
        assert_eq!(schema.name, "MULTFLT");
        assert_eq!(schema.count, RecordCount::Unbounded);
        assert_eq!(schema.records[0].items[1].default, Some(Value::Float(1.0)));
        assert_eq!(schema.records[0].items[0].default, None);
    }

    #[test]
    fn test_records_and_variants() {
        let content = r#"
[[keyword]]
name = "MARKER"
records = "none"

[[keyword]]
name = "VFPPROD"
records = 2

[[keyword.variants]]
items = [{ name = "TABLE", type = "int" }, { name = "DEPTH", type = "double", dimension = "Length" }]

[[keyword.variants]]
items = [{ name = "RATES", type = "float", tail = true }]

[[keyword]]
name = "GRIDOPTS"

[[keyword.items]]
name = "FLAGS"
type = "bool"
size = 2
"#;
        let schemas = SchemaFile::from_toml_str(content)
            .unwrap()
            .into_schemas()
            .unwrap();

        assert_eq!(schemas[0].count, RecordCount::Fixed(0));
        assert!(schemas[0].records.is_empty());
        assert_eq!(schemas[1].count, RecordCount::Fixed(2));
        assert_eq!(schemas[1].records.len(), 2);
        assert!(schemas[1].records[0].items[1].is_unit_convertible());
        assert_eq!(schemas[1].records[1].items[0].cardinality, Cardinality::Tail);
        assert_eq!(schemas[2].count, RecordCount::Single);
        assert_eq!(schemas[2].records[0].items[0].cardinality, Cardinality::Array(2));
    }

    #[test]
    fn test_invalid_definitions() {
        let bad_records = "[[keyword]]\nname = \"X\"\nrecords = \"many\"\n";
        let err = SchemaFile::from_toml_str(bad_records)
            .unwrap()
            .into_schemas()
            .unwrap_err();
        assert!(matches!(err, DeckError::InvalidSchema { .. }));

        let both = "[[keyword]]\nname = \"X\"\n[[keyword.items]]\nname = \"A\"\ntype = \"int\"\nsize = 2\ntail = true\n";
        assert!(SchemaFile::from_toml_str(both)
            .unwrap()
            .into_schemas()
            .is_err());

        assert!(SchemaFile::from_toml_str("[[keyword]]\nrecords = 1\n").is_err());
    }

    #[test]
    fn test_register_into_registry() {
        let mut registry = SchemaRegistry::builtin().unwrap();
        let added = SchemaFile::from_toml_str(MULTFLT)
            .unwrap()
            .register_into(&mut registry)
            .unwrap();
        assert_eq!(added, 1);
        assert!(registry.contains("MULTFLT"));

        let duplicate = "[[keyword]]\nname = \"DIMENS\"\n[[keyword.items]]\nname = \"N\"\ntype = \"int\"\n";
        let err = SchemaFile::from_toml_str(duplicate)
            .unwrap()
            .register_into(&mut registry)
            .unwrap_err();
        assert!(matches!(err, DeckError::DuplicateKeyword { .. }));
    }

    #[test]
    fn test_schema_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(MULTFLT.as_bytes()).unwrap();

        let schema_file = SchemaFile::from_file(file.path()).unwrap();
        assert_eq!(schema_file.keywords[0].name, "multflt");
    }
}
