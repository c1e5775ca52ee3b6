//! Turns raw keyword blocks into typed, schema-conformant deck keywords.

use crate::core::registry::SchemaRegistry;
use crate::core::tokenizer::{RawKeyword, RawRecord, RawToken};
use crate::domain::model::{Deck, DeckItem, DeckKeyword, DeckRecord, SourceLocation, ValueOrigin};
use crate::domain::schema::{Cardinality, ItemSchema, ItemType, KeywordSchema, RecordCount, RecordSchema, Value};
use crate::utils::error::{DeckError, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::sync::LazyLock;

static REPEAT_TOKEN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^(\d+)\*(.*)$").unwrap());

/// Item name used for the token texts of preserved unknown keywords.
pub const RAW_ITEM: &str = "RAW";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnknownKeywordPolicy {
    /// Drop the block with a warning.
    #[default]
    Skip,
    /// Keep the block as string items without validation.
    Preserve,
    /// Fail with `UnknownKeyword`.
    Reject,
}

impl FromStr for UnknownKeywordPolicy {
    type Err = String;

    fn from_str(text: &str) -> std::result::Result<Self, Self::Err> {
        match text.to_ascii_lowercase().as_str() {
            "skip" => Ok(Self::Skip),
            "preserve" => Ok(Self::Preserve),
            "reject" => Ok(Self::Reject),
            other => Err(format!(
                "unknown keyword policy '{}', expected skip, preserve or reject",
                other
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MissingItemPolicy {
    /// Omitted trailing items take their schema default.
    #[default]
    Fill,
    /// Omitted trailing items are errors; an explicit `*` still selects the default.
    Reject,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ParseOptions {
    #[serde(default)]
    pub unknown_keywords: UnknownKeywordPolicy,
    #[serde(default)]
    pub missing_items: MissingItemPolicy,
}

impl ParseOptions {
    pub fn strict() -> Self {
        Self {
            unknown_keywords: UnknownKeywordPolicy::Reject,
            missing_items: MissingItemPolicy::Reject,
        }
    }
}

/// One value position after repeat expansion. `text: None` selects the default.
struct Slot<'t> {
    token: &'t RawToken,
    text: Option<&'t str>,
    origin: ValueOrigin,
}

struct RecordContext<'r> {
    keyword: &'r str,
    record: usize,
    location: &'r SourceLocation,
}

impl RecordContext<'_> {
    fn missing(&self, item: &ItemSchema, location: &SourceLocation) -> DeckError {
        DeckError::MissingRequiredItem {
            keyword: self.keyword.to_string(),
            record: self.record,
            item: item.name.clone(),
            location: location.clone(),
        }
    }
}

/// Repeat-expanded slots of one record, bounded by what the record can hold.
struct Expansion<'t> {
    slots: Vec<Slot<'t>>,
    /// Defaulted repeats past the last item, counted but never materialized.
    dropped: usize,
    first_dropped: Option<&'t RawToken>,
}

/// Value slots an item takes, `None` for a tail item.
fn item_width(item: &ItemSchema) -> Option<usize> {
    match item.cardinality {
        Cardinality::Single => Some(1),
        Cardinality::Array(size) => Some(size),
        Cardinality::Tail => None,
    }
}

/// Values a record schema holds, `None` when it ends in a tail item.
fn record_capacity(record_schema: &RecordSchema) -> Option<usize> {
    record_schema.items.iter().map(item_width).sum()
}

fn surplus_token(token: &RawToken, ctx: &RecordContext<'_>) -> DeckError {
    DeckError::SurplusToken {
        keyword: ctx.keyword.to_string(),
        record: ctx.record,
        token: token.text.clone(),
        location: token.location.clone(),
    }
}

fn repeat_count(token: &RawToken, digits: &str, ctx: &RecordContext<'_>) -> Result<usize> {
    let problem = match digits.parse::<usize>() {
        Ok(0) => "must be a positive integer",
        Ok(count) => return Ok(count),
        Err(_) => "is too large",
    };
    Err(DeckError::Lexical {
        location: token.location.clone(),
        message: format!(
            "keyword {}, record {}: repeat count in '{}' {}",
            ctx.keyword, ctx.record, token.text, problem
        ),
    })
}

fn expand_tokens<'t>(
    tokens: &'t [RawToken],
    capacity: Option<usize>,
    ctx: &RecordContext<'_>,
) -> Result<Expansion<'t>> {
    let mut expansion = Expansion {
        slots: Vec::with_capacity(capacity.map_or(tokens.len(), |n| n.min(tokens.len()))),
        dropped: 0,
        first_dropped: None,
    };

    for token in tokens {
        let room = capacity.map_or(usize::MAX, |n| n - expansion.slots.len());

        if !token.quoted {
            if token.text == "*" {
                if room == 0 {
                    return Err(surplus_token(token, ctx));
                }
                expansion.slots.push(Slot {
                    token,
                    text: None,
                    origin: ValueOrigin::Default,
                });
                continue;
            }

            if let Some(caps) = REPEAT_TOKEN.captures(&token.text) {
                let count = repeat_count(token, &caps[1], ctx)?;
                let value = caps.get(2).map(|m| m.as_str()).filter(|v| !v.is_empty());
                let kept = count.min(room);
                if kept < count {
                    if value.is_some() {
                        return Err(surplus_token(token, ctx));
                    }
                    expansion.dropped += count - kept;
                    expansion.first_dropped.get_or_insert(token);
                }
                expansion.slots.extend((0..kept).map(|_| Slot {
                    token,
                    text: value,
                    origin: ValueOrigin::RepeatCount,
                }));
                continue;
            }
        }

        if room == 0 {
            return Err(surplus_token(token, ctx));
        }
        expansion.slots.push(Slot {
            token,
            text: Some(&token.text),
            origin: ValueOrigin::Explicit,
        });
    }

    Ok(expansion)
}

fn resolve_slot(item: &ItemSchema, slot: &Slot<'_>, ctx: &RecordContext<'_>) -> Result<(Value, ValueOrigin)> {
    match slot.text {
        None => item
            .default
            .clone()
            .map(|value| (value, slot.origin))
            .ok_or_else(|| ctx.missing(item, &slot.token.location)),
        Some(text) => item
            .item_type
            .parse(text)
            .map(|value| (value, slot.origin))
            .ok_or_else(|| DeckError::TypeMismatch {
                keyword: ctx.keyword.to_string(),
                record: ctx.record,
                item: item.name.clone(),
                expected: item.item_type,
                token: text.to_string(),
                location: slot.token.location.clone(),
            }),
    }
}

/// Folds raw keywords into a deck, one block at a time, in input order.
///
/// The deck only exists once `finish` is called; a builder that hit an error
/// is simply dropped by the caller.
pub struct DeckBuilder<'a> {
    registry: &'a SchemaRegistry,
    options: ParseOptions,
    keywords: Vec<DeckKeyword>,
    skipped: usize,
}

impl<'a> DeckBuilder<'a> {
    pub fn new(registry: &'a SchemaRegistry, options: ParseOptions) -> Self {
        Self {
            registry,
            options,
            keywords: Vec::new(),
            skipped: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.keywords.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keywords.is_empty()
    }

    /// Unknown keywords dropped under `UnknownKeywordPolicy::Skip`.
    pub fn skipped(&self) -> usize {
        self.skipped
    }

    pub fn add(&mut self, raw: RawKeyword) -> Result<()> {
        let registry = self.registry;
        let Some(schema) = registry.lookup(&raw.name) else {
            return self.add_unknown(raw);
        };

        let mut records = Vec::new();
        for (index, raw_record) in raw.records.iter().enumerate() {
            if schema.count.expected().is_some_and(|n| records.len() >= n) {
                break;
            }
            if schema.count == RecordCount::Unbounded && raw_record.is_empty() {
                break;
            }
            let record_schema = schema.record_schema(index).ok_or_else(|| DeckError::InvalidSchema {
                keyword: schema.name.clone(),
                message: "keyword has records but no record schema".to_string(),
            })?;
            records.push(self.build_record(schema, record_schema, index, raw_record)?);
        }

        tracing::debug!(
            keyword = %schema.name,
            records = records.len(),
            line = raw.location.line,
            "Built keyword"
        );
        self.keywords
            .push(DeckKeyword::new(&schema.name, records, raw.location));
        Ok(())
    }

    pub fn finish(self) -> Deck {
        Deck::from_keywords(self.keywords)
    }

    fn add_unknown(&mut self, raw: RawKeyword) -> Result<()> {
        match self.options.unknown_keywords {
            UnknownKeywordPolicy::Reject => Err(DeckError::UnknownKeyword {
                keyword: raw.name,
                location: raw.location,
            }),
            UnknownKeywordPolicy::Skip => {
                tracing::warn!(
                    keyword = %raw.name,
                    file = %raw.location.file,
                    line = raw.location.line,
                    records = raw.records.len(),
                    "Skipping unknown keyword"
                );
                self.skipped += 1;
                Ok(())
            }
            UnknownKeywordPolicy::Preserve => {
                tracing::warn!(
                    keyword = %raw.name,
                    file = %raw.location.file,
                    line = raw.location.line,
                    "Preserving unknown keyword without validation"
                );
                let records = raw
                    .records
                    .into_iter()
                    .map(|record| {
                        if record.is_empty() {
                            return DeckRecord::new(Vec::new());
                        }
                        let values = record
                            .tokens
                            .into_iter()
                            .map(|token| (Value::Str(token.text), ValueOrigin::Explicit))
                            .collect();
                        DeckRecord::new(vec![DeckItem::new(RAW_ITEM, ItemType::String, values, None)])
                    })
                    .collect();
                self.keywords
                    .push(DeckKeyword::new(&raw.name, records, raw.location));
                Ok(())
            }
        }
    }

    fn build_record(
        &self,
        schema: &KeywordSchema,
        record_schema: &RecordSchema,
        index: usize,
        raw: &RawRecord,
    ) -> Result<DeckRecord> {
        let ctx = RecordContext {
            keyword: &schema.name,
            record: index,
            location: &raw.location,
        };
        let Expansion {
            slots,
            dropped,
            first_dropped,
        } = expand_tokens(&raw.tokens, record_capacity(record_schema), &ctx)?;

        let mut cursor = 0usize;
        let mut items = Vec::with_capacity(record_schema.items.len());

        for item in &record_schema.items {
            let available = slots.len() - cursor;
            let wanted = item_width(item);
            let take = wanted.map_or(available, |n| n.min(available));

            let mut values = slots[cursor..cursor + take]
                .iter()
                .map(|slot| resolve_slot(item, slot, &ctx))
                .collect::<Result<Vec<_>>>()?;
            cursor += take;

            // a tail item with nothing left still carries one value
            let missing = match wanted {
                Some(n) => n - take,
                None => usize::from(values.is_empty()),
            };
            if missing > 0 {
                values.extend(self.fill_missing(item, missing, &ctx)?);
            }

            items.push(DeckItem::new(
                &item.name,
                item.item_type,
                values,
                item.dimension.clone(),
            ));
        }

        if let Some(token) = first_dropped {
            tracing::warn!(
                keyword = %schema.name,
                record = index,
                dropped,
                line = token.location.line,
                "Dropping defaulted values beyond the last item"
            );
        }

        Ok(DeckRecord::new(items))
    }

    fn fill_missing(
        &self,
        item: &ItemSchema,
        missing: usize,
        ctx: &RecordContext<'_>,
    ) -> Result<Vec<(Value, ValueOrigin)>> {
        let default = match (&item.default, self.options.missing_items) {
            (Some(default), MissingItemPolicy::Fill) => default,
            _ => return Err(ctx.missing(item, ctx.location)),
        };
        tracing::trace!(
            keyword = ctx.keyword,
            record = ctx.record,
            item = %item.name,
            count = missing,
            "Filling omitted item from schema default"
        );
        Ok(vec![(default.clone(), ValueOrigin::Default); missing])
    }
}
