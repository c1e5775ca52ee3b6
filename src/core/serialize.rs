//! Renders a deck back into deck text.
//!
//! Every value is written explicitly, strings are quoted and each keyword
//! block is closed by a blank line, so parsing the output with the same
//! registry gives back the same keywords, records and values.

use crate::core::registry::SchemaRegistry;
use crate::core::tokenizer::RECORD_TERMINATOR;
use crate::domain::model::{Deck, DeckKeyword, DeckRecord};
use crate::domain::schema::{RecordCount, Value};
use std::fmt::Write;

pub struct DeckWriter<'a> {
    registry: &'a SchemaRegistry,
}

impl<'a> DeckWriter<'a> {
    pub fn new(registry: &'a SchemaRegistry) -> Self {
        Self { registry }
    }

    pub fn write(&self, deck: &Deck) -> String {
        let mut out = String::new();
        for keyword in deck {
            self.write_keyword(&mut out, keyword);
        }
        out
    }

    fn write_keyword(&self, out: &mut String, keyword: &DeckKeyword) {
        out.push_str(keyword.name());
        out.push('\n');

        for record in keyword.records() {
            write_record(out, record);
        }

        let count = self.registry.lookup(keyword.name()).map(|schema| schema.count);
        if count == Some(RecordCount::Unbounded) {
            out.push(RECORD_TERMINATOR);
            out.push('\n');
        }
        out.push('\n');
    }
}

fn write_record(out: &mut String, record: &DeckRecord) {
    let tokens: Vec<String> = record
        .items()
        .iter()
        .flat_map(|item| item.values().iter().map(render_value))
        .collect();

    if tokens.is_empty() {
        let _ = writeln!(out, "{}", RECORD_TERMINATOR);
    } else {
        let _ = writeln!(out, "  {} {}", tokens.join(" "), RECORD_TERMINATOR);
    }
}

fn render_value(value: &Value) -> String {
    match value {
        Value::Str(text) if text.contains('\'') => format!("\"{}\"", text),
        Value::Str(text) => format!("'{}'", text),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::builder::ParseOptions;
    use crate::core::parser::Parser;
    use std::sync::Arc;

    #[test]
    fn test_write_canonical_text() {
        let registry = Arc::new(SchemaRegistry::builtin().unwrap());
        let parser = Parser::new(registry.clone(), ParseOptions::default());
        let deck = parser
            .parse_str(
                "RUNSPEC\nDIMENS\n 10 10 3 /\nSTART\n1 JAN 2020 /\nDATES\n/\n",
                "CASE.DATA",
            )
            .unwrap();

        let text = DeckWriter::new(&registry).write(&deck);
        assert_eq!(
            text,
            "RUNSPEC\n\nDIMENS\n  10 10 3 /\n\nSTART\n  1 'JAN' 2020 '00:00:00' /\n\nDATES\n/\n\n"
        );
    }

    #[test]
    fn test_render_values() {
        assert_eq!(render_value(&Value::Float(0.25)), "0.25");
        assert_eq!(render_value(&Value::Float(3.0)), "3");
        assert_eq!(render_value(&Value::Bool(true)), "TRUE");
        assert_eq!(render_value(&Value::Str("it's".to_string())), "\"it's\"");
        assert_eq!(render_value(&Value::Str(String::new())), "''");
    }
}
