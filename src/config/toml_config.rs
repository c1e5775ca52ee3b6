use crate::app::writers::{FailurePolicy, STANDARD_FORMATS};
use crate::core::builder::{MissingItemPolicy, ParseOptions, UnknownKeywordPolicy};
use crate::domain::ports::ConfigProvider;
use crate::utils::error::{DeckError, Result};
use crate::utils::validation::{validate_one_of, validate_path, Validate};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::LazyLock;

static ENV_VAR: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\$\{([^}]+)\}").unwrap());

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Run configuration file.
///
/// ```toml
/// [parser]
/// unknown_keywords = "preserve"
/// schema_files = ["${SCHEMA_DIR}/extra.toml"]
///
/// [output]
/// directory = "./out"
/// formats = ["output_json"]
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TomlConfig {
    #[serde(default)]
    pub parser: ParserConfig,
    #[serde(default)]
    pub output: OutputConfig,
    pub monitoring: Option<MonitoringConfig>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ParserConfig {
    #[serde(default)]
    pub unknown_keywords: UnknownKeywordPolicy,
    #[serde(default)]
    pub missing_items: MissingItemPolicy,
    #[serde(default)]
    pub schema_files: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_directory")]
    pub directory: String,
    #[serde(default)]
    pub formats: Vec<String>,
    #[serde(default)]
    pub failure_policy: FailurePolicy,
    /// Extra `key = value` output parameters.
    #[serde(default)]
    pub parameters: BTreeMap<String, String>,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            directory: default_directory(),
            formats: Vec::new(),
            failure_policy: FailurePolicy::default(),
            parameters: BTreeMap::new(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_directory() -> String {
    ".".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitoringConfig {
    pub enabled: bool,
    pub log_level: Option<String>,
    pub system_stats: Option<bool>,
}

impl TomlConfig {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(DeckError::IoError)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content);

        toml::from_str(&processed_content).map_err(|e| DeckError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// Replace `${NAME}` with the environment variable; unknown names stay as written.
    fn substitute_env_vars(content: &str) -> String {
        ENV_VAR
            .replace_all(content, |caps: &regex::Captures| {
                let var_name = &caps[1];
                std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
            })
            .into_owned()
    }

    pub fn validate_config(&self) -> Result<()> {
        validate_path("output.directory", &self.output.directory)?;

        for format in &self.output.formats {
            validate_one_of("output.formats", format, &STANDARD_FORMATS)?;
        }

        for schema_file in &self.parser.schema_files {
            validate_path("parser.schema_files", schema_file)?;
        }

        if let Some(level) = self.monitoring.as_ref().and_then(|m| m.log_level.as_deref()) {
            validate_one_of("monitoring.log_level", level, &LOG_LEVELS)?;
        }

        Ok(())
    }

    pub fn parse_options(&self) -> ParseOptions {
        ParseOptions {
            unknown_keywords: self.parser.unknown_keywords,
            missing_items: self.parser.missing_items,
        }
    }

    pub fn monitoring_enabled(&self) -> bool {
        self.monitoring.as_ref().map(|m| m.enabled).unwrap_or(false)
    }

    pub fn system_stats_enabled(&self) -> bool {
        self.monitoring
            .as_ref()
            .map(|m| m.enabled && m.system_stats.unwrap_or(true))
            .unwrap_or(false)
    }
}

impl ConfigProvider for TomlConfig {
    fn output_dir(&self) -> &str {
        &self.output.directory
    }

    fn output_enabled(&self) -> bool {
        self.output.enabled
    }

    fn output_formats(&self) -> &[String] {
        &self.output.formats
    }
}

impl Validate for TomlConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}
