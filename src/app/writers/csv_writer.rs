use crate::app::writers::CSV_FORMAT;
use crate::core::output::IoConfig;
use crate::domain::model::Deck;
use crate::domain::ports::{InitContext, OutputWriter, ReportStep, Storage};
use crate::utils::error::{DeckError, Result};
use async_trait::async_trait;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;

#[derive(Debug, Serialize)]
struct ValueRow<'a> {
    keyword: &'a str,
    occurrence: usize,
    record: usize,
    item: &'a str,
    index: usize,
    value: String,
    origin: String,
}

#[derive(Debug, Clone, Serialize)]
struct StepRow {
    report_step: u32,
    time: String,
    secs_elapsed: f64,
    is_substep: bool,
}

/// Flattens the deck into one row per value and keeps a running table of
/// report steps.
pub struct CsvWriter<S> {
    storage: S,
    io: IoConfig,
    deck: Arc<Deck>,
    steps: Vec<StepRow>,
}

impl<S: Storage + 'static> CsvWriter<S> {
    pub fn new(io: &IoConfig, deck: Arc<Deck>, storage: S) -> Self {
        Self {
            storage,
            io: io.clone(),
            deck,
            steps: Vec::new(),
        }
    }

    pub fn create(io: &IoConfig, deck: Arc<Deck>, storage: S) -> Box<dyn OutputWriter> {
        Box::new(Self::new(io, deck, storage))
    }

    fn deck_table(&self) -> Result<Vec<u8>> {
        let mut writer = csv::Writer::from_writer(Vec::new());
        let mut seen: HashMap<&str, usize> = HashMap::new();

        for keyword in self.deck.iter() {
            let occurrence = seen.entry(keyword.name()).or_insert(0);
            *occurrence += 1;

            for (record_index, record) in keyword.records().iter().enumerate() {
                for item in record.items() {
                    for (index, value) in item.values().iter().enumerate() {
                        writer.serialize(ValueRow {
                            keyword: keyword.name(),
                            occurrence: *occurrence,
                            record: record_index + 1,
                            item: item.name(),
                            index: index + 1,
                            value: value.to_string(),
                            origin: item
                                .origin(index)
                                .map(|origin| origin.to_string())
                                .unwrap_or_default(),
                        })?;
                    }
                }
            }
        }
        into_bytes(writer)
    }

    fn steps_table(&self) -> Result<Vec<u8>> {
        let mut writer = csv::Writer::from_writer(Vec::new());
        for row in &self.steps {
            writer.serialize(row)?;
        }
        into_bytes(writer)
    }
}

fn into_bytes(writer: csv::Writer<Vec<u8>>) -> Result<Vec<u8>> {
    writer
        .into_inner()
        .map_err(|err| DeckError::IoError(err.into_error()))
}

#[async_trait]
impl<S: Storage + 'static> OutputWriter for CsvWriter<S> {
    fn name(&self) -> &str {
        CSV_FORMAT
    }

    async fn write_init(&mut self, _init: &InitContext) -> Result<()> {
        let data = self.deck_table()?;
        let file = self.io.file_name("DECK.csv");
        tracing::debug!(file = %file, bytes = data.len(), "Writing CSV deck table");
        self.storage.write_file(&file, &data).await
    }

    /// The steps table is rewritten in full on every call.
    async fn write_time_step(&mut self, step: &ReportStep) -> Result<()> {
        self.steps.push(StepRow {
            report_step: step.report_step,
            time: step.current_time.to_rfc3339(),
            secs_elapsed: step.secs_elapsed,
            is_substep: step.is_substep,
        });
        let data = self.steps_table()?;
        let file = self.io.file_name("STEPS.csv");
        self.storage.write_file(&file, &data).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::builder::ParseOptions;
    use crate::core::parser::Parser;
    use crate::core::registry::SchemaRegistry;
    use chrono::Utc;
    use std::path::PathBuf;
    use tokio::sync::Mutex;

    #[derive(Clone)]
    struct MockStorage {
        files: Arc<Mutex<HashMap<String, Vec<u8>>>>,
    }

    impl MockStorage {
        fn new() -> Self {
            Self {
                files: Arc::new(Mutex::new(HashMap::new())),
            }
        }

        async fn get_text(&self, path: &str) -> Option<String> {
            let files = self.files.lock().await;
            files
                .get(path)
                .map(|data| String::from_utf8_lossy(data).into_owned())
        }
    }

    impl Storage for MockStorage {
        async fn write_file(&self, path: &str, data: &[u8]) -> Result<()> {
            let mut files = self.files.lock().await;
            files.insert(path.to_string(), data.to_vec());
            Ok(())
        }
    }

    fn writer(storage: &MockStorage) -> CsvWriter<MockStorage> {
        let parser = Parser::new(
            Arc::new(SchemaRegistry::builtin().unwrap()),
            ParseOptions::default(),
        );
        let deck = parser
            .parse_str("DIMENS\n2*1 4 /\nTSTEP\n1 /\nTSTEP\n2 /\n", "CASE.DATA")
            .unwrap();
        let io = IoConfig {
            output_enabled: true,
            output_dir: PathBuf::from("."),
            case_name: "CASE".to_string(),
        };
        CsvWriter::new(&io, Arc::new(deck), storage.clone())
    }

    fn step(report_step: u32) -> ReportStep {
        ReportStep {
            report_step,
            current_time: Utc::now(),
            secs_elapsed: report_step as f64 * 86_400.0,
            reservoir_state: serde_json::Value::Null,
            well_state: serde_json::Value::Null,
            is_substep: false,
        }
    }

    #[tokio::test]
    async fn test_deck_table_rows() {
        let storage = MockStorage::new();
        let mut writer = writer(&storage);
        let init = InitContext {
            current_time: Utc::now(),
            start_secs: 0.0,
            nnc: serde_json::Value::Null,
        };

        writer.write_init(&init).await.unwrap();

        let text = storage.get_text("CASE.DECK.csv").await.unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "keyword,occurrence,record,item,index,value,origin");
        assert_eq!(lines[1], "DIMENS,1,1,NX,1,1,repeat");
        assert_eq!(lines[3], "DIMENS,1,1,NZ,1,4,explicit");
        assert_eq!(lines[5], "TSTEP,2,1,STEP_SIZE,1,2,explicit");
    }

    #[tokio::test]
    async fn test_steps_table_accumulates() {
        let storage = MockStorage::new();
        let mut writer = writer(&storage);

        writer.write_time_step(&step(1)).await.unwrap();
        writer.write_time_step(&step(2)).await.unwrap();

        let text = storage.get_text("CASE.STEPS.csv").await.unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], "report_step,time,secs_elapsed,is_substep");
        assert!(lines[2].starts_with("2,"));
        assert!(lines[2].ends_with(",172800.0,false"));
    }
}
