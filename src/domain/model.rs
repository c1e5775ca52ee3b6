use crate::domain::schema::{ItemType, Value};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceLocation {
    pub file: String,
    pub line: usize,
}

impl SourceLocation {
    pub fn new(file: &str, line: usize) -> Self {
        Self {
            file: file.to_string(),
            line,
        }
    }
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.file, self.line)
    }
}

/// Where a resolved value came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueOrigin {
    Explicit,
    /// Schema default, from a lone `*` or an omitted trailing item.
    Default,
    /// Produced by an `N*` or `N*value` expansion.
    RepeatCount,
}

impl fmt::Display for ValueOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ValueOrigin::Explicit => "explicit",
            ValueOrigin::Default => "default",
            ValueOrigin::RepeatCount => "repeat",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeckItem {
    name: String,
    item_type: ItemType,
    values: Vec<Value>,
    origins: Vec<ValueOrigin>,
    #[serde(skip_serializing_if = "Option::is_none")]
    dimension: Option<String>,
}

impl DeckItem {
    pub(crate) fn new(
        name: &str,
        item_type: ItemType,
        values: Vec<(Value, ValueOrigin)>,
        dimension: Option<String>,
    ) -> Self {
        let (values, origins) = values.into_iter().unzip();
        Self {
            name: name.to_string(),
            item_type,
            values,
            origins,
            dimension,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn item_type(&self) -> ItemType {
        self.item_type
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }

    pub fn origins(&self) -> &[ValueOrigin] {
        &self.origins
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn origin(&self, index: usize) -> Option<ValueOrigin> {
        self.origins.get(index).copied()
    }

    pub fn is_defaulted(&self, index: usize) -> bool {
        self.origin(index) == Some(ValueOrigin::Default)
    }

    pub fn dimension(&self) -> Option<&str> {
        self.dimension.as_deref()
    }

    pub fn unit_convertible(&self) -> bool {
        self.dimension.is_some()
    }

    pub fn int(&self, index: usize) -> Option<i64> {
        self.values.get(index).and_then(Value::as_int)
    }

    pub fn float(&self, index: usize) -> Option<f64> {
        self.values.get(index).and_then(Value::as_float)
    }

    pub fn string(&self, index: usize) -> Option<&str> {
        self.values.get(index).and_then(Value::as_str)
    }

    pub fn boolean(&self, index: usize) -> Option<bool> {
        self.values.get(index).and_then(Value::as_bool)
    }
}

/// Items of one record, positionally aligned with its record schema.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeckRecord {
    items: Vec<DeckItem>,
}

impl DeckRecord {
    pub(crate) fn new(items: Vec<DeckItem>) -> Self {
        Self { items }
    }

    pub fn items(&self) -> &[DeckItem] {
        &self.items
    }

    pub fn get(&self, index: usize) -> Option<&DeckItem> {
        self.items.get(index)
    }

    pub fn item(&self, name: &str) -> Option<&DeckItem> {
        self.items
            .iter()
            .find(|item| item.name.eq_ignore_ascii_case(name))
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeckKeyword {
    name: String,
    records: Vec<DeckRecord>,
    location: SourceLocation,
}

impl DeckKeyword {
    pub(crate) fn new(name: &str, records: Vec<DeckRecord>, location: SourceLocation) -> Self {
        Self {
            name: name.to_string(),
            records,
            location,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn records(&self) -> &[DeckRecord] {
        &self.records
    }

    pub fn record(&self, index: usize) -> Option<&DeckRecord> {
        self.records.get(index)
    }

    pub fn location(&self) -> &SourceLocation {
        &self.location
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// The parsed deck. Keyword order is the order of the input.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Deck {
    keywords: Vec<DeckKeyword>,
    #[serde(skip)]
    index: HashMap<String, Vec<usize>>,
}

impl Deck {
    pub(crate) fn from_keywords(keywords: Vec<DeckKeyword>) -> Self {
        let mut index: HashMap<String, Vec<usize>> = HashMap::new();
        for (position, keyword) in keywords.iter().enumerate() {
            index
                .entry(keyword.name.clone())
                .or_default()
                .push(position);
        }
        Self { keywords, index }
    }

    pub fn len(&self) -> usize {
        self.keywords.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keywords.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, DeckKeyword> {
        self.keywords.iter()
    }

    pub fn get(&self, position: usize) -> Option<&DeckKeyword> {
        self.keywords.get(position)
    }

    /// Every occurrence of `name`, in input order.
    pub fn occurrences<'a>(&'a self, name: &str) -> impl Iterator<Item = &'a DeckKeyword> + 'a {
        self.index
            .get(&name.to_ascii_uppercase())
            .into_iter()
            .flatten()
            .map(move |&position| &self.keywords[position])
    }

    pub fn count_of(&self, name: &str) -> usize {
        self.index
            .get(&name.to_ascii_uppercase())
            .map_or(0, Vec::len)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.count_of(name) > 0
    }

    pub fn first(&self, name: &str) -> Option<&DeckKeyword> {
        self.occurrences(name).next()
    }

    pub fn last(&self, name: &str) -> Option<&DeckKeyword> {
        self.occurrences(name).last()
    }

    pub fn keyword_names(&self) -> Vec<&str> {
        self.keywords.iter().map(DeckKeyword::name).collect()
    }

    /// Simulation start date from the START keyword.
    pub fn start_date(&self) -> Option<NaiveDate> {
        record_date(self.first("START")?.record(0)?)
    }

    /// Compare keyword order, record layout and values, ignoring origins and locations.
    pub fn same_content(&self, other: &Deck) -> bool {
        self.len() == other.len()
            && self.iter().zip(other.iter()).all(|(a, b)| {
                a.name == b.name
                    && a.records.len() == b.records.len()
                    && a.records.iter().zip(&b.records).all(|(ra, rb)| {
                        ra.items.len() == rb.items.len()
                            && ra
                                .items
                                .iter()
                                .zip(&rb.items)
                                .all(|(ia, ib)| ia.name == ib.name && ia.values == ib.values)
                    })
            })
    }
}

impl<'a> IntoIterator for &'a Deck {
    type Item = &'a DeckKeyword;
    type IntoIter = std::slice::Iter<'a, DeckKeyword>;

    fn into_iter(self) -> Self::IntoIter {
        self.keywords.iter()
    }
}

/// Calendar date of a DAY / MONTH / YEAR record (START, DATES).
pub fn record_date(record: &DeckRecord) -> Option<NaiveDate> {
    let day = record.item("DAY")?.int(0)?;
    let month = month_number(record.item("MONTH")?.string(0)?)?;
    let year = record.item("YEAR")?.int(0)?;
    NaiveDate::from_ymd_opt(i32::try_from(year).ok()?, month, u32::try_from(day).ok()?)
}

pub fn month_number(month: &str) -> Option<u32> {
    let number = match month.to_ascii_uppercase().as_str() {
        "JAN" => 1,
        "FEB" => 2,
        "MAR" => 3,
        "APR" => 4,
        "MAY" => 5,
        "JUN" => 6,
        "JUL" | "JLY" => 7,
        "AUG" => 8,
        "SEP" => 9,
        "OCT" => 10,
        "NOV" => 11,
        "DEC" => 12,
        _ => return None,
    };
    Some(number)
}
