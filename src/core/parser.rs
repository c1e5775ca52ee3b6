use crate::core::builder::{DeckBuilder, ParseOptions};
use crate::core::registry::SchemaRegistry;
use crate::core::tokenizer::{decode_source, Tokenizer};
use crate::domain::model::Deck;
use crate::utils::error::{DeckError, Result};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Parses decks against a shared, read-only schema registry.
///
/// A parse either returns the complete deck or the first error; partial
/// decks are never handed out.
#[derive(Debug, Clone)]
pub struct Parser {
    registry: Arc<SchemaRegistry>,
    options: ParseOptions,
}

impl Parser {
    pub fn new(registry: Arc<SchemaRegistry>, options: ParseOptions) -> Self {
        Self { registry, options }
    }

    pub fn registry(&self) -> &SchemaRegistry {
        &self.registry
    }

    pub fn options(&self) -> ParseOptions {
        self.options
    }

    pub fn parse_str(&self, source: &str, file: &str) -> Result<Deck> {
        tracing::info!(file, "Starting parsing of deck");

        let mut builder = DeckBuilder::new(&self.registry, self.options);
        for raw in Tokenizer::new(source, file, &self.registry) {
            builder.add(raw?)?;
        }
        let skipped = builder.skipped();
        let deck = builder.finish();

        tracing::info!(
            file,
            keywords = deck.len(),
            skipped,
            "Done parsing of deck"
        );
        Ok(deck)
    }

    pub fn parse_file<P: AsRef<Path>>(&self, path: P) -> Result<Deck> {
        let path = path.as_ref();
        let bytes = std::fs::read(path)?;
        let (source, latin1) = decode_source(bytes);
        let file = path.display().to_string();
        if latin1 {
            tracing::warn!(file = %file, "Deck is not valid UTF-8, decoded as Latin-1");
        }
        self.parse_str(&source, &file)
    }

    /// Parse independent decks concurrently. Results keep the order of `paths`
    /// and one failing deck does not affect the others.
    pub async fn parse_many(&self, paths: Vec<PathBuf>) -> Vec<(PathBuf, Result<Deck>)> {
        let tasks: Vec<_> = paths
            .into_iter()
            .map(|path| {
                let parser = self.clone();
                let task_path = path.clone();
                let handle = tokio::task::spawn_blocking(move || parser.parse_file(&task_path));
                (path, handle)
            })
            .collect();

        let mut results = Vec::with_capacity(tasks.len());
        for (path, handle) in tasks {
            let result = match handle.await {
                Ok(result) => result,
                Err(join_error) => Err(DeckError::IoError(std::io::Error::other(format!(
                    "parse task for {} failed: {}",
                    path.display(),
                    join_error
                )))),
            };
            results.push((path, result));
        }
        results
    }
}
