pub mod builder;
pub mod engine;
pub mod keywords;
pub mod output;
pub mod parser;
pub mod registry;
pub mod serialize;
pub mod tokenizer;

pub use crate::domain::model::{Deck, DeckItem, DeckKeyword, DeckRecord};
pub use crate::domain::ports::{ConfigProvider, OutputWriter, Storage};
pub use crate::utils::error::Result;
