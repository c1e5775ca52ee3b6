//! Output stage wiring: runtime parameters, format selection and the
//! report schedule handed to the writers.

use crate::app::writers::{CsvWriter, FailurePolicy, JsonWriter, MultiWriter, CSV_FORMAT, JSON_FORMAT};
use crate::domain::model::{record_date, Deck};
use crate::domain::ports::{ConfigProvider, InitContext, OutputWriter, ReportStep, Storage};
use crate::domain::schema::Value;
use crate::utils::error::{DeckError, Result};
use crate::utils::validation::validate_non_empty_string;
use chrono::{DateTime, NaiveTime, TimeDelta, Utc};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

pub const OUTPUT_ENABLED_PARAM: &str = "output";
pub const OUTPUT_DIR_PARAM: &str = "output_dir";

/// Runtime parameters for the output stage, as plain `key=value` strings.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OutputParams {
    values: BTreeMap<String, String>,
}

impl OutputParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, key: &str, value: impl ToString) {
        self.values.insert(key.to_string(), value.to_string());
    }

    pub fn with(mut self, key: &str, value: impl ToString) -> Self {
        self.set(key, value);
        self
    }

    /// Parse `key=value` assignments, e.g. from repeated `--param` flags.
    pub fn from_assignments(assignments: &[String]) -> Result<Self> {
        let mut params = Self::new();
        for assignment in assignments {
            let Some((key, value)) = assignment.split_once('=') else {
                return Err(DeckError::InvalidConfigValueError {
                    field: "param".to_string(),
                    value: assignment.clone(),
                    reason: "Expected KEY=VALUE".to_string(),
                });
            };
            validate_non_empty_string("param", key)?;
            params.set(key.trim(), value.trim());
        }
        Ok(params)
    }

    pub fn from_provider<C: ConfigProvider>(config: &C) -> Self {
        let mut params = Self::new()
            .with(OUTPUT_ENABLED_PARAM, config.output_enabled())
            .with(OUTPUT_DIR_PARAM, config.output_dir());
        for format in config.output_formats() {
            params.set(format, true);
        }
        params
    }

    /// Later values win.
    pub fn merge(&mut self, other: OutputParams) {
        self.values.extend(other.values);
    }

    pub fn get_bool(&self, key: &str, default: bool) -> Result<bool> {
        let Some(raw) = self.values.get(key) else {
            return Ok(default);
        };
        match raw.to_ascii_lowercase().as_str() {
            "true" | "1" | "yes" | "on" => Ok(true),
            "false" | "0" | "no" | "off" => Ok(false),
            _ => Err(DeckError::InvalidConfigValueError {
                field: key.to_string(),
                value: raw.clone(),
                reason: "Expected a boolean (true/false)".to_string(),
            }),
        }
    }

    pub fn get_str<'a>(&'a self, key: &str, default: &'a str) -> &'a str {
        self.values.get(key).map_or(default, String::as_str)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct IoConfig {
    pub output_enabled: bool,
    pub output_dir: PathBuf,
    /// Base name of every output file.
    pub case_name: String,
}

impl IoConfig {
    pub fn from_params(params: &OutputParams, case_name: &str) -> Result<Self> {
        Ok(Self {
            output_enabled: params.get_bool(OUTPUT_ENABLED_PARAM, true)?,
            output_dir: PathBuf::from(params.get_str(OUTPUT_DIR_PARAM, ".")),
            case_name: case_name.to_string(),
        })
    }

    pub fn file_name(&self, suffix: &str) -> String {
        format!("{}.{}", self.case_name, suffix)
    }
}

pub type WriterConstructor<S> = fn(&IoConfig, Arc<Deck>, S) -> Box<dyn OutputWriter>;

/// Format name to writer constructor. A format is used when the boolean
/// parameter of the same name is set.
pub struct FormatRegistry<S> {
    formats: Vec<(String, WriterConstructor<S>)>,
}

impl<S: Storage + Clone + 'static> FormatRegistry<S> {
    pub fn empty() -> Self {
        Self {
            formats: Vec::new(),
        }
    }

    pub fn standard() -> Self {
        let json: WriterConstructor<S> = JsonWriter::<S>::create;
        let csv: WriterConstructor<S> = CsvWriter::<S>::create;
        Self {
            formats: vec![(JSON_FORMAT.to_string(), json), (CSV_FORMAT.to_string(), csv)],
        }
    }

    pub fn register(&mut self, name: &str, constructor: WriterConstructor<S>) -> Result<()> {
        if self.formats.iter().any(|(known, _)| known == name) {
            return Err(DeckError::ConfigValidationError {
                field: "output_formats".to_string(),
                message: format!("output format {} is already registered", name),
            });
        }
        self.formats.push((name.to_string(), constructor));
        Ok(())
    }

    pub fn names(&self) -> Vec<&str> {
        self.formats.iter().map(|(name, _)| name.as_str()).collect()
    }

    /// Build the multiplexer holding one writer per selected format.
    pub fn create<F>(
        &self,
        params: &OutputParams,
        deck: Arc<Deck>,
        case_name: &str,
        policy: FailurePolicy,
        storage_for: F,
    ) -> Result<MultiWriter>
    where
        F: FnOnce(&Path) -> S,
    {
        let io = IoConfig::from_params(params, case_name)?;
        // no writers are built at all when output is off, even for selected
        // formats, so every call on the returned multiplexer is a no-op
        if !io.output_enabled {
            tracing::info!(case = case_name, "Output disabled");
            return Ok(MultiWriter::new(Vec::new(), policy));
        }

        let storage = storage_for(&io.output_dir);
        let mut writers = Vec::new();
        for (name, constructor) in &self.formats {
            if params.get_bool(name, false)? {
                tracing::info!(
                    format = %name,
                    dir = %io.output_dir.display(),
                    "Enabled output format"
                );
                writers.push(constructor(&io, Arc::clone(&deck), storage.clone()));
            }
        }
        Ok(MultiWriter::new(writers, policy))
    }
}

/// Multiplexer over the standard formats with fail-fast error handling.
pub fn create_output_writer<S: Storage + Clone + 'static>(
    params: &OutputParams,
    deck: Arc<Deck>,
    case_name: &str,
    storage: S,
) -> Result<MultiWriter> {
    FormatRegistry::standard().create(params, deck, case_name, FailurePolicy::FailFast, |_| storage)
}

fn start_time(deck: &Deck) -> Option<DateTime<Utc>> {
    Some(deck.start_date()?.and_time(NaiveTime::MIN).and_utc())
}

/// Init payload for a deck: simulation start time, or now without START.
pub fn init_context(deck: &Deck) -> InitContext {
    InitContext {
        current_time: start_time(deck).unwrap_or_else(Utc::now),
        start_secs: 0.0,
        nnc: serde_json::Value::Null,
    }
}

/// Report steps implied by the DATES and TSTEP keywords, in deck order.
/// Empty when the deck has no valid START date.
pub fn report_schedule(deck: &Deck) -> Vec<ReportStep> {
    let Some(start) = start_time(deck) else {
        return Vec::new();
    };

    let mut current = start;
    let mut steps = Vec::new();
    let push = |time: DateTime<Utc>, steps: &mut Vec<ReportStep>| {
        steps.push(ReportStep {
            report_step: steps.len() as u32 + 1,
            current_time: time,
            secs_elapsed: (time - start).num_milliseconds() as f64 / 1000.0,
            reservoir_state: serde_json::Value::Null,
            well_state: serde_json::Value::Null,
            is_substep: false,
        });
    };

    for keyword in deck {
        match keyword.name() {
            "DATES" => {
                for record in keyword.records() {
                    let Some(date) = record_date(record) else {
                        continue;
                    };
                    let time = record
                        .item("TIME")
                        .and_then(|item| item.string(0))
                        .and_then(|t| NaiveTime::parse_from_str(t, "%H:%M:%S").ok())
                        .unwrap_or(NaiveTime::MIN);
                    current = date.and_time(time).and_utc();
                    push(current, &mut steps);
                }
            }
            "TSTEP" => {
                let days = keyword
                    .records()
                    .iter()
                    .filter_map(|record| record.item("STEP_SIZE"))
                    .flat_map(|item| item.values().iter().filter_map(Value::as_float))
                    .collect::<Vec<_>>();
                for length in days {
                    let Some(next) = TimeDelta::try_milliseconds((length * 86_400_000.0).round() as i64)
                        .and_then(|delta| current.checked_add_signed(delta))
                    else {
                        tracing::warn!(
                            days = length,
                            after = %current,
                            line = keyword.location().line,
                            "TSTEP leaves the representable date range, schedule truncated"
                        );
                        return steps;
                    };
                    current = next;
                    push(current, &mut steps);
                }
            }
            _ => {}
        }
    }

    steps
}
