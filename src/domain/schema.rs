//! Keyword schemas: the declared shape of every record a keyword may carry.

use crate::utils::error::{DeckError, Result};
use crate::utils::validation::{validate_keyword_name, Validate};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemType {
    #[serde(alias = "int")]
    Integer,
    #[serde(alias = "double")]
    Float,
    String,
    #[serde(alias = "bool")]
    Boolean,
}

impl ItemType {
    /// Convert one raw token into a typed value, `None` when the text does not fit.
    pub fn parse(&self, text: &str) -> Option<Value> {
        match self {
            ItemType::Integer => text.parse::<i64>().ok().map(Value::Int),
            ItemType::Float => {
                // Fortran style exponents: 1.5D+03
                let normalized = text.replace(['D', 'd'], "E");
                normalized
                    .parse::<f64>()
                    .ok()
                    .filter(|v| v.is_finite())
                    .map(Value::Float)
            }
            ItemType::String => Some(Value::Str(text.to_string())),
            ItemType::Boolean => match text.to_ascii_uppercase().as_str() {
                "T" | "TRUE" | "Y" | "YES" | "1" => Some(Value::Bool(true)),
                "F" | "FALSE" | "N" | "NO" | "0" => Some(Value::Bool(false)),
                _ => None,
            },
        }
    }
}

impl fmt::Display for ItemType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ItemType::Integer => "integer",
            ItemType::Float => "float",
            ItemType::String => "string",
            ItemType::Boolean => "boolean",
        };
        f.write_str(name)
    }
}

/// A resolved item value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Int(i64),
    Float(f64),
    Str(String),
    Bool(bool),
}

impl Value {
    pub fn item_type(&self) -> ItemType {
        match self {
            Value::Int(_) => ItemType::Integer,
            Value::Float(_) => ItemType::Float,
            Value::Str(_) => ItemType::String,
            Value::Bool(_) => ItemType::Boolean,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self {
            Value::Float(v) => Some(*v),
            Value::Int(v) => Some(*v as f64),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(v) => Some(*v),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Int(v) => write!(f, "{}", v),
            Value::Float(v) => write!(f, "{}", v),
            Value::Str(v) => f.write_str(v),
            Value::Bool(true) => f.write_str("TRUE"),
            Value::Bool(false) => f.write_str("FALSE"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Cardinality {
    /// Exactly one value.
    Single,
    /// Exactly N values.
    Array(usize),
    /// Every remaining value of the record; must be the last item.
    Tail,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemSchema {
    pub name: String,
    pub item_type: ItemType,
    pub default: Option<Value>,
    pub cardinality: Cardinality,
    /// Physical dimension for unit conversion downstream; `None` for dimensionless items.
    pub dimension: Option<String>,
}

impl ItemSchema {
    pub fn new(name: &str, item_type: ItemType) -> Self {
        Self {
            name: name.to_ascii_uppercase(),
            item_type,
            default: None,
            cardinality: Cardinality::Single,
            dimension: None,
        }
    }

    pub fn int(name: &str) -> Self {
        Self::new(name, ItemType::Integer)
    }

    pub fn float(name: &str) -> Self {
        Self::new(name, ItemType::Float)
    }

    pub fn string(name: &str) -> Self {
        Self::new(name, ItemType::String)
    }

    pub fn boolean(name: &str) -> Self {
        Self::new(name, ItemType::Boolean)
    }

    pub fn with_default(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(value.into());
        self
    }

    pub fn array(mut self, size: usize) -> Self {
        self.cardinality = Cardinality::Array(size);
        self
    }

    pub fn tail(mut self) -> Self {
        self.cardinality = Cardinality::Tail;
        self
    }

    pub fn with_dimension(mut self, dimension: &str) -> Self {
        self.dimension = Some(dimension.to_string());
        self
    }

    pub fn is_unit_convertible(&self) -> bool {
        self.dimension.is_some()
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int(i64::from(v))
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Str(v.to_string())
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RecordSchema {
    pub items: Vec<ItemSchema>,
}

impl RecordSchema {
    pub fn new(items: Vec<ItemSchema>) -> Self {
        Self { items }
    }

    pub fn ends_with_tail(&self) -> bool {
        matches!(
            self.items.last().map(|i| i.cardinality),
            Some(Cardinality::Tail)
        )
    }
}

/// How many records a keyword carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RecordCount {
    Single,
    Fixed(usize),
    /// Records until a lone `/`, a blank line or the next keyword.
    Unbounded,
}

impl RecordCount {
    /// Number of records after which the block closes, if bounded.
    pub fn expected(&self) -> Option<usize> {
        match self {
            RecordCount::Single => Some(1),
            RecordCount::Fixed(n) => Some(*n),
            RecordCount::Unbounded => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeywordSchema {
    pub name: String,
    /// Record shapes by record index; the last variant covers every later record.
    pub records: Vec<RecordSchema>,
    pub count: RecordCount,
}

impl KeywordSchema {
    pub fn new(name: &str, count: RecordCount, records: Vec<RecordSchema>) -> Self {
        Self {
            name: name.to_ascii_uppercase(),
            records,
            count,
        }
    }

    /// A keyword with no records, e.g. a section marker.
    pub fn flag(name: &str) -> Self {
        Self::new(name, RecordCount::Fixed(0), Vec::new())
    }

    pub fn single(name: &str, items: Vec<ItemSchema>) -> Self {
        Self::new(name, RecordCount::Single, vec![RecordSchema::new(items)])
    }

    pub fn table(name: &str, items: Vec<ItemSchema>) -> Self {
        Self::new(name, RecordCount::Unbounded, vec![RecordSchema::new(items)])
    }

    pub fn record_schema(&self, index: usize) -> Option<&RecordSchema> {
        self.records.get(index).or_else(|| self.records.last())
    }

    fn invalid(&self, message: impl Into<String>) -> DeckError {
        DeckError::InvalidSchema {
            keyword: self.name.clone(),
            message: message.into(),
        }
    }
}

impl Validate for KeywordSchema {
    fn validate(&self) -> Result<()> {
        validate_keyword_name(&self.name).map_err(|_| {
            self.invalid("name must be a letter followed by at most 7 letters, digits or '_'")
        })?;

        if self.records.is_empty() && self.count != RecordCount::Fixed(0) {
            return Err(self.invalid("keywords with records need at least one record schema"));
        }

        for record in &self.records {
            let mut seen = HashSet::new();
            for (position, item) in record.items.iter().enumerate() {
                if !seen.insert(item.name.as_str()) {
                    return Err(self.invalid(format!("item {} is declared twice", item.name)));
                }
                match item.cardinality {
                    Cardinality::Array(0) => {
                        return Err(self.invalid(format!("item {} has array size 0", item.name)))
                    }
                    Cardinality::Tail if position + 1 != record.items.len() => {
                        return Err(self.invalid(format!(
                            "tail item {} must be the last item of its record",
                            item.name
                        )))
                    }
                    _ => {}
                }
                if let Some(default) = &item.default {
                    if default.item_type() != item.item_type {
                        return Err(self.invalid(format!(
                            "default of item {} is {}, expected {}",
                            item.name,
                            default.item_type(),
                            item.item_type
                        )));
                    }
                }
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_item_type_parse() {
        assert_eq!(ItemType::Integer.parse("42"), Some(Value::Int(42)));
        assert_eq!(ItemType::Integer.parse("abc"), None);
        assert_eq!(ItemType::Integer.parse("1.5"), None);
        assert_eq!(ItemType::Float.parse("1.5D+03"), Some(Value::Float(1500.0)));
        assert_eq!(ItemType::Float.parse("7"), Some(Value::Float(7.0)));
        assert_eq!(ItemType::Float.parse("nan"), None);
        assert_eq!(ItemType::Boolean.parse("yes"), Some(Value::Bool(true)));
        assert_eq!(ItemType::Boolean.parse("F"), Some(Value::Bool(false)));
        assert_eq!(ItemType::Boolean.parse("maybe"), None);
        assert_eq!(
            ItemType::String.parse("JAN"),
            Some(Value::Str("JAN".to_string()))
        );
    }

    #[test]
    fn test_record_schema_variant_by_index() {
        let schema = KeywordSchema::new(
            "VFPPROD",
            RecordCount::Unbounded,
            vec![
                RecordSchema::new(vec![ItemSchema::int("TABLE")]),
                RecordSchema::new(vec![ItemSchema::float("VALUES").tail()]),
            ],
        );

        assert_eq!(schema.record_schema(0).unwrap().items[0].name, "TABLE");
        assert_eq!(schema.record_schema(1).unwrap().items[0].name, "VALUES");
        assert_eq!(schema.record_schema(9).unwrap().items[0].name, "VALUES");
    }

    #[test]
    fn test_schema_validation() {
        assert!(KeywordSchema::single("DIMENS", vec![ItemSchema::int("NX")])
            .validate()
            .is_ok());
        assert!(KeywordSchema::flag("RUNSPEC").validate().is_ok());

        let tail_not_last = KeywordSchema::single(
            "BAD",
            vec![ItemSchema::float("A").tail(), ItemSchema::int("B")],
        );
        assert!(tail_not_last.validate().is_err());

        let wrong_default =
            KeywordSchema::single("BAD", vec![ItemSchema::int("A").with_default(1.0)]);
        assert!(wrong_default.validate().is_err());

        let long_name = KeywordSchema::flag("TOOLONGNAME");
        assert!(long_name.validate().is_err());

        let no_records = KeywordSchema::new("EMPTY", RecordCount::Unbounded, Vec::new());
        assert!(no_records.validate().is_err());
    }
}
