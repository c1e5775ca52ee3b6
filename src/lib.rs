//! Keyword-schema-driven parser for reservoir simulation input decks.
//!
//! Raw deck text is split into keyword blocks by the [`Tokenizer`], checked
//! and typed against a [`SchemaRegistry`] by the [`DeckBuilder`], and handed
//! out as an immutable [`Deck`]. The output stage fans a parsed deck out to
//! the writers selected by runtime parameters.

pub mod app;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use crate::config::CliConfig;
pub use crate::config::{cli::LocalStorage, settings::RunSettings};

pub use crate::app::writers::{FailurePolicy, MultiWriter};
pub use crate::core::builder::{DeckBuilder, MissingItemPolicy, ParseOptions, UnknownKeywordPolicy};
pub use crate::core::engine::DeckEngine;
pub use crate::core::output::{create_output_writer, FormatRegistry, OutputParams};
pub use crate::core::parser::Parser;
pub use crate::core::registry::SchemaRegistry;
pub use crate::core::serialize::DeckWriter;
pub use crate::core::tokenizer::Tokenizer;
pub use crate::domain::model::{Deck, DeckItem, DeckKeyword, DeckRecord, SourceLocation, ValueOrigin};
pub use crate::domain::schema::{Cardinality, ItemSchema, ItemType, KeywordSchema, RecordCount, RecordSchema, Value};
pub use crate::utils::error::{DeckError, Result};
