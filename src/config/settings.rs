//! Effective run settings: the TOML run configuration with command line
//! flags applied on top.

use crate::app::writers::{FailurePolicy, STANDARD_FORMATS};
use crate::config::schema_file::SchemaFile;
use crate::config::toml_config::TomlConfig;
use crate::core::builder::ParseOptions;
use crate::core::output::OutputParams;
use crate::core::registry::SchemaRegistry;
use crate::domain::ports::ConfigProvider;
use crate::utils::error::{DeckError, Result};
use crate::utils::validation::{validate_file_extensions, validate_one_of, validate_path, Validate};
use std::path::PathBuf;

#[cfg(feature = "cli")]
use crate::config::CliConfig;

#[derive(Debug, Clone)]
pub struct RunSettings {
    pub decks: Vec<PathBuf>,
    pub options: ParseOptions,
    pub schema_files: Vec<String>,
    pub output_enabled: bool,
    pub output_dir: String,
    pub output_formats: Vec<String>,
    pub failure_policy: FailurePolicy,
    /// Applied after the values derived from the fields above.
    pub extra_params: OutputParams,
    pub dump_json: bool,
    pub normalize: bool,
    pub monitor: bool,
    pub verbose: bool,
    pub log_json: bool,
}

impl RunSettings {
    pub fn from_toml(config: &TomlConfig) -> Self {
        let mut extra_params = OutputParams::new();
        for (key, value) in &config.output.parameters {
            extra_params.set(key, value);
        }

        Self {
            decks: Vec::new(),
            options: config.parse_options(),
            schema_files: config.parser.schema_files.clone(),
            output_enabled: config.output_enabled(),
            output_dir: config.output_dir().to_string(),
            output_formats: config.output_formats().to_vec(),
            failure_policy: config.output.failure_policy,
            extra_params,
            dump_json: false,
            normalize: false,
            monitor: config.system_stats_enabled(),
            verbose: config
                .monitoring
                .as_ref()
                .and_then(|m| m.log_level.as_deref())
                .is_some_and(|level| level == "debug" || level == "trace"),
            log_json: false,
        }
    }

    #[cfg(feature = "cli")]
    pub fn from_cli(cli: &CliConfig) -> Result<Self> {
        let config = match &cli.config {
            Some(path) => TomlConfig::from_file(path)?,
            None => TomlConfig::default(),
        };
        config.validate()?;

        let mut settings = Self::from_toml(&config);
        settings.apply_cli(cli)?;
        Ok(settings)
    }

    #[cfg(feature = "cli")]
    fn apply_cli(&mut self, cli: &CliConfig) -> Result<()> {
        self.decks = cli.decks.clone();
        self.schema_files.extend(cli.schema_files.iter().cloned());

        if cli.strict {
            self.options = ParseOptions::strict();
        }
        if let Some(policy) = cli.unknown_keywords {
            self.options.unknown_keywords = policy;
        }

        if let Some(dir) = &cli.output_dir {
            self.output_dir = dir.clone();
        }
        if !cli.formats.is_empty() {
            self.output_formats = cli.formats.clone();
        }
        if cli.no_output {
            self.output_enabled = false;
        }
        self.extra_params
            .merge(OutputParams::from_assignments(&cli.params)?);

        self.dump_json = cli.dump_json;
        self.normalize = cli.normalize;
        self.monitor |= cli.monitor;
        self.verbose |= cli.verbose;
        self.log_json = cli.log_json;
        Ok(())
    }

    /// Parameters handed to the output stage.
    pub fn output_params(&self) -> OutputParams {
        let mut params = OutputParams::from_provider(self);
        params.merge(self.extra_params.clone());
        params
    }

    /// Builtin schemas plus every configured schema file.
    pub fn build_registry(&self) -> Result<SchemaRegistry> {
        let mut registry = SchemaRegistry::builtin()?;
        for path in &self.schema_files {
            let added = SchemaFile::from_file(path)?.register_into(&mut registry)?;
            tracing::info!(file = %path, keywords = added, "Loaded keyword schema file");
        }
        Ok(registry)
    }
}

impl ConfigProvider for RunSettings {
    fn output_dir(&self) -> &str {
        &self.output_dir
    }

    fn output_enabled(&self) -> bool {
        self.output_enabled
    }

    fn output_formats(&self) -> &[String] {
        &self.output_formats
    }
}

impl Validate for RunSettings {
    fn validate(&self) -> Result<()> {
        if self.decks.is_empty() {
            return Err(DeckError::MissingConfigError {
                field: "decks".to_string(),
            });
        }
        for deck in &self.decks {
            validate_path("decks", &deck.to_string_lossy())?;
        }

        validate_file_extensions("schema_files", &self.schema_files, &["toml"])?;
        validate_path("output_dir", &self.output_dir)?;
        for format in &self.output_formats {
            validate_one_of("output_formats", format, &STANDARD_FORMATS)?;
        }
        Ok(())
    }
}
