pub mod cli;
pub mod schema_file;
pub mod settings;
pub mod toml_config;

#[cfg(feature = "cli")]
use crate::core::builder::UnknownKeywordPolicy;
#[cfg(feature = "cli")]
use clap::Parser;
#[cfg(feature = "cli")]
use serde::{Deserialize, Serialize};
#[cfg(feature = "cli")]
use std::path::PathBuf;

#[cfg(feature = "cli")]
#[derive(Debug, Clone, Serialize, Deserialize, Parser)]
#[command(name = "deckparse")]
#[command(about = "Parse keyword-organized simulation decks into typed records")]
pub struct CliConfig {
    /// Deck files to parse; several decks are parsed concurrently.
    #[arg(required = true)]
    pub decks: Vec<PathBuf>,

    #[arg(long, help = "Run configuration file (TOML)")]
    pub config: Option<PathBuf>,

    #[arg(long = "schema", help = "Additional keyword schema file (TOML), repeatable")]
    pub schema_files: Vec<String>,

    #[arg(long, help = "Reject unknown keywords and omitted trailing items")]
    pub strict: bool,

    #[arg(long, help = "Unknown keyword policy: skip, preserve or reject")]
    pub unknown_keywords: Option<UnknownKeywordPolicy>,

    #[arg(long)]
    pub output_dir: Option<String>,

    #[arg(long = "format", value_delimiter = ',', help = "Output formats, e.g. output_json,output_csv")]
    pub formats: Vec<String>,

    #[arg(long, help = "Disable the output stage")]
    pub no_output: bool,

    #[arg(long = "param", help = "Output parameter KEY=VALUE, repeatable")]
    pub params: Vec<String>,

    #[arg(long, help = "Print each parsed deck as JSON")]
    pub dump_json: bool,

    #[arg(long, help = "Print each parsed deck as canonical deck text")]
    pub normalize: bool,

    #[arg(long, short, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, help = "Log CPU and memory usage per phase")]
    pub monitor: bool,

    #[arg(long, help = "Emit log events as JSON")]
    pub log_json: bool,
}
