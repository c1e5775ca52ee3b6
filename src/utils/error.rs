use crate::domain::model::SourceLocation;
use crate::domain::schema::ItemType;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DeckError {
    #[error("{location}: lexical error: {message}")]
    Lexical {
        location: SourceLocation,
        message: String,
    },

    #[error("{location}: record {record} of keyword {keyword} reaches end of input without '/'")]
    UnterminatedRecord {
        keyword: String,
        record: usize,
        location: SourceLocation,
    },

    #[error("{location}: unknown keyword {keyword}")]
    UnknownKeyword {
        keyword: String,
        location: SourceLocation,
    },

    #[error("{location}: keyword {keyword}, record {record}: item {item} has no value and no default")]
    MissingRequiredItem {
        keyword: String,
        record: usize,
        item: String,
        location: SourceLocation,
    },

    #[error("{location}: keyword {keyword}, record {record}: item {item} expects {expected}, found '{token}'")]
    TypeMismatch {
        keyword: String,
        record: usize,
        item: String,
        expected: ItemType,
        token: String,
        location: SourceLocation,
    },

    #[error("{location}: keyword {keyword}, record {record}: surplus token '{token}'")]
    SurplusToken {
        keyword: String,
        record: usize,
        token: String,
        location: SourceLocation,
    },

    #[error("keyword {keyword} is already registered")]
    DuplicateKeyword { keyword: String },

    #[error("invalid schema for keyword {keyword}: {message}")]
    InvalidSchema { keyword: String, message: String },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("Configuration error in {field}: {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Invalid value '{value}' for {field}: {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Missing required configuration: {field}")]
    MissingConfigError { field: String },

    #[error("Output writer {writer} failed: {message}")]
    OutputError { writer: String, message: String },

    #[error("{} output writers failed: {}", failures.len(), failures.join("; "))]
    OutputFailures { failures: Vec<String> },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Lexical,
    Schema,
    Validation,
    Configuration,
    Io,
    Output,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl DeckError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            DeckError::Lexical { .. } | DeckError::UnterminatedRecord { .. } => {
                ErrorCategory::Lexical
            }
            DeckError::DuplicateKeyword { .. } | DeckError::InvalidSchema { .. } => {
                ErrorCategory::Schema
            }
            DeckError::UnknownKeyword { .. }
            | DeckError::MissingRequiredItem { .. }
            | DeckError::TypeMismatch { .. }
            | DeckError::SurplusToken { .. } => ErrorCategory::Validation,
            DeckError::ConfigValidationError { .. }
            | DeckError::InvalidConfigValueError { .. }
            | DeckError::MissingConfigError { .. } => ErrorCategory::Configuration,
            DeckError::IoError(_) => ErrorCategory::Io,
            DeckError::SerializationError(_)
            | DeckError::CsvError(_)
            | DeckError::OutputError { .. }
            | DeckError::OutputFailures { .. } => ErrorCategory::Output,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            ErrorCategory::Output => ErrorSeverity::Medium,
            ErrorCategory::Lexical | ErrorCategory::Validation => ErrorSeverity::High,
            ErrorCategory::Configuration | ErrorCategory::Io => ErrorSeverity::High,
            // a broken schema is a programming error, not a data error
            ErrorCategory::Schema => ErrorSeverity::Critical,
        }
    }

    pub fn location(&self) -> Option<&SourceLocation> {
        match self {
            DeckError::Lexical { location, .. }
            | DeckError::UnterminatedRecord { location, .. }
            | DeckError::UnknownKeyword { location, .. }
            | DeckError::MissingRequiredItem { location, .. }
            | DeckError::TypeMismatch { location, .. }
            | DeckError::SurplusToken { location, .. } => Some(location),
            _ => None,
        }
    }

    pub fn recovery_suggestion(&self) -> String {
        match self {
            DeckError::Lexical { .. } => {
                "Check quoting on the reported line; quoted strings must close on the same line"
                    .to_string()
            }
            DeckError::UnterminatedRecord { keyword, .. } => {
                format!("Add the missing '/' terminator to the last record of {}", keyword)
            }
            DeckError::UnknownKeyword { keyword, .. } => format!(
                "Declare {} in a schema file (--schema) or parse with --unknown-keywords skip",
                keyword
            ),
            DeckError::MissingRequiredItem { item, .. } => {
                format!("Provide a value for {} or give it a default in the schema", item)
            }
            DeckError::TypeMismatch { expected, .. } => {
                format!("Replace the offending token with a {} value", expected)
            }
            DeckError::SurplusToken { .. } => {
                "Remove the extra tokens or terminate the record earlier with '/'".to_string()
            }
            DeckError::DuplicateKeyword { .. } | DeckError::InvalidSchema { .. } => {
                "Fix the keyword schema definitions; each keyword may be registered once"
                    .to_string()
            }
            DeckError::IoError(_) => "Check that the file exists and is readable".to_string(),
            DeckError::ConfigValidationError { .. }
            | DeckError::InvalidConfigValueError { .. }
            | DeckError::MissingConfigError { .. } => {
                "Check the configuration file and command line flags".to_string()
            }
            DeckError::SerializationError(_)
            | DeckError::CsvError(_)
            | DeckError::OutputError { .. }
            | DeckError::OutputFailures { .. } => {
                "Check that the output directory is writable".to_string()
            }
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self.category() {
            ErrorCategory::Lexical => format!("Deck could not be read: {}", self),
            ErrorCategory::Validation => format!("Deck is invalid: {}", self),
            ErrorCategory::Schema => format!("Keyword schema error: {}", self),
            ErrorCategory::Configuration => format!("Configuration problem: {}", self),
            ErrorCategory::Io => format!("File access failed: {}", self),
            ErrorCategory::Output => format!("Writing output failed: {}", self),
        }
    }
}

pub type Result<T> = std::result::Result<T, DeckError>;
