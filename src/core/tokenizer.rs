//! Splits deck text into raw keyword blocks.
//!
//! A block is a keyword name alone on a line in the leftmost column,
//! followed by records of whitespace or comma separated tokens, each closed
//! by `/`. A record may span several physical lines. The block closes at a
//! blank line, at the next keyword name, or at end of input. Keywords whose
//! schema fixes the record count close after exactly that many records
//! instead, and table keywords also close on an empty record.

use crate::core::registry::SchemaRegistry;
use crate::domain::model::SourceLocation;
use crate::domain::schema::RecordCount;
use crate::utils::error::{DeckError, Result};
use crate::utils::validation::is_keyword_name;
use std::iter::{Enumerate, Peekable};
use std::str::Lines;

pub const COMMENT_MARKER: &str = "--";
pub const RECORD_TERMINATOR: char = '/';

#[derive(Debug, Clone, PartialEq)]
pub struct RawToken {
    pub text: String,
    /// Quoted tokens are never repeat markers.
    pub quoted: bool,
    pub location: SourceLocation,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RawRecord {
    pub tokens: Vec<RawToken>,
    /// Line on which the record starts.
    pub location: SourceLocation,
}

impl RawRecord {
    fn new(location: SourceLocation) -> Self {
        Self {
            tokens: Vec::new(),
            location,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RawKeyword {
    pub name: String,
    pub records: Vec<RawRecord>,
    pub location: SourceLocation,
}

/// Decode deck bytes. Input that is not UTF-8 is read as Latin-1; the flag
/// reports whether that fallback was used.
pub fn decode_source(bytes: Vec<u8>) -> (String, bool) {
    match String::from_utf8(bytes) {
        Ok(text) => (text, false),
        Err(err) => (err.into_bytes().into_iter().map(char::from).collect(), true),
    }
}

enum LineKind<'l> {
    Blank,
    Comment,
    Keyword(&'l str),
    Data(&'l str),
}

fn classify(line: &str) -> LineKind<'_> {
    let content = strip_comment(line);
    if content.trim().is_empty() {
        if line.trim().is_empty() {
            LineKind::Blank
        } else {
            LineKind::Comment
        }
    } else if !line.starts_with(char::is_whitespace) && is_keyword_name(content.trim_end()) {
        LineKind::Keyword(content.trim_end())
    } else {
        LineKind::Data(content)
    }
}

/// Cut the line at the first comment marker outside quotes.
fn strip_comment(line: &str) -> &str {
    let mut quote: Option<char> = None;
    for (position, c) in line.char_indices() {
        match quote {
            Some(open) if c == open => quote = None,
            Some(_) => {}
            None if c == '\'' || c == '"' => quote = Some(c),
            None if line[position..].starts_with(COMMENT_MARKER) => return &line[..position],
            None => {}
        }
    }
    line
}

fn is_separator(c: char) -> bool {
    c.is_whitespace() || c == ',' || c == RECORD_TERMINATOR || c == '\'' || c == '"'
}

/// Text between the quote at `open` and its partner, plus the position after it.
fn read_quoted(chars: &[char], open: usize, location: &SourceLocation) -> Result<(String, usize)> {
    let quote = chars[open];
    let start = open + 1;
    let Some(len) = chars[start..].iter().position(|&c| c == quote) else {
        return Err(DeckError::Lexical {
            location: location.clone(),
            message: format!("unterminated string literal starting at column {}", open + 1),
        });
    };
    Ok((chars[start..start + len].iter().collect(), start + len + 1))
}

/// Tokens of one line and whether the line closed the record.
fn lex_line(content: &str, location: &SourceLocation) -> Result<(Vec<RawToken>, bool)> {
    let chars: Vec<char> = content.chars().collect();
    let mut tokens = Vec::new();
    let mut pos = 0usize;

    while pos < chars.len() {
        let c = chars[pos];

        if c.is_whitespace() || c == ',' {
            pos += 1;
            continue;
        }

        // anything after the terminator is ignored
        if c == RECORD_TERMINATOR {
            return Ok((tokens, true));
        }

        if c == '\'' || c == '"' {
            let (text, next) = read_quoted(&chars, pos, location)?;
            tokens.push(RawToken {
                text,
                quoted: true,
                location: location.clone(),
            });
            pos = next;
            continue;
        }

        let start = pos;
        while pos < chars.len() && !is_separator(chars[pos]) {
            pos += 1;
        }
        let mut text: String = chars[start..pos].iter().collect();

        // `N*'text'` is a single repeat of a quoted value
        if text.len() > 1
            && text.ends_with('*')
            && text[..text.len() - 1].bytes().all(|b| b.is_ascii_digit())
            && matches!(chars.get(pos), Some('\'' | '"'))
        {
            let (value, next) = read_quoted(&chars, pos, location)?;
            text.push_str(&value);
            pos = next;
        }

        tokens.push(RawToken {
            text,
            quoted: false,
            location: location.clone(),
        });
    }

    Ok((tokens, false))
}

/// Lazy, forward-only sequence of raw keyword blocks.
///
/// The registry is consulted only for record counts, so that fixed-count
/// keywords can read past blank lines. Iteration stops after the first error.
pub struct Tokenizer<'a> {
    file: String,
    lines: Peekable<Enumerate<Lines<'a>>>,
    registry: &'a SchemaRegistry,
    done: bool,
}

impl<'a> Tokenizer<'a> {
    pub fn new(source: &'a str, file: &str, registry: &'a SchemaRegistry) -> Self {
        Self {
            file: file.to_string(),
            lines: source.lines().enumerate().peekable(),
            registry,
            done: false,
        }
    }

    fn location(&self, line_index: usize) -> SourceLocation {
        SourceLocation::new(&self.file, line_index + 1)
    }

    fn next_keyword(&mut self) -> Result<Option<RawKeyword>> {
        let (name, location) = loop {
            let Some((index, line)) = self.lines.next() else {
                return Ok(None);
            };
            match classify(line) {
                LineKind::Blank | LineKind::Comment => continue,
                LineKind::Keyword(name) => break (name.to_ascii_uppercase(), self.location(index)),
                LineKind::Data(_) => {
                    return Err(DeckError::Lexical {
                        location: self.location(index),
                        message: "record data outside of any keyword".to_string(),
                    })
                }
            }
        };

        let count = self.registry.lookup(&name).map(|schema| schema.count);
        let expected = count.and_then(|count| count.expected());
        let unbounded = count == Some(RecordCount::Unbounded);

        let mut records: Vec<RawRecord> = Vec::new();
        let mut pending: Option<RawRecord> = None;

        loop {
            if pending.is_none() && expected.is_some_and(|n| records.len() >= n) {
                break;
            }

            let Some(&(index, line)) = self.lines.peek() else {
                if let Some(record) = pending {
                    return Err(DeckError::UnterminatedRecord {
                        keyword: name,
                        record: records.len(),
                        location: record.location,
                    });
                }
                break;
            };

            let content = match classify(line) {
                LineKind::Comment => {
                    self.lines.next();
                    continue;
                }
                LineKind::Blank => {
                    self.lines.next();
                    if pending.is_none() && expected.is_none() {
                        break;
                    }
                    continue;
                }
                // the next keyword; leave it for the following call
                LineKind::Keyword(_) if pending.is_none() && expected.is_none() => break,
                LineKind::Keyword(content) | LineKind::Data(content) => content,
            };
            self.lines.next();

            let line_location = self.location(index);
            let (tokens, terminated) = lex_line(content, &line_location)?;
            let mut record = pending
                .take()
                .unwrap_or_else(|| RawRecord::new(line_location));
            record.tokens.extend(tokens);

            if !terminated {
                pending = Some(record);
                continue;
            }

            let closes_table = unbounded && record.is_empty();
            records.push(record);
            if closes_table {
                break;
            }
        }

        Ok(Some(RawKeyword {
            name,
            records,
            location,
        }))
    }
}

impl Iterator for Tokenizer<'_> {
    type Item = Result<RawKeyword>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.next_keyword() {
            Ok(Some(keyword)) => Some(Ok(keyword)),
            Ok(None) => {
                self.done = true;
                None
            }
            Err(err) => {
                self.done = true;
                Some(Err(err))
            }
        }
    }
}
