use crate::app::writers::JSON_FORMAT;
use crate::core::output::IoConfig;
use crate::domain::model::Deck;
use crate::domain::ports::{InitContext, OutputWriter, ReportStep, Storage};
use crate::utils::error::Result;
use async_trait::async_trait;
use serde_json::json;
use std::sync::Arc;

/// Writes the parsed deck with the init payload, then one document per
/// report step.
pub struct JsonWriter<S> {
    storage: S,
    io: IoConfig,
    deck: Arc<Deck>,
}

impl<S: Storage + 'static> JsonWriter<S> {
    pub fn new(io: &IoConfig, deck: Arc<Deck>, storage: S) -> Self {
        Self {
            storage,
            io: io.clone(),
            deck,
        }
    }

    pub fn create(io: &IoConfig, deck: Arc<Deck>, storage: S) -> Box<dyn OutputWriter> {
        Box::new(Self::new(io, deck, storage))
    }

    pub fn init_file(&self) -> String {
        self.io.file_name("INIT.json")
    }

    pub fn step_file(&self, report_step: u32) -> String {
        self.io.file_name(&format!("S{:04}.json", report_step))
    }
}

#[async_trait]
impl<S: Storage + 'static> OutputWriter for JsonWriter<S> {
    fn name(&self) -> &str {
        JSON_FORMAT
    }

    async fn write_init(&mut self, init: &InitContext) -> Result<()> {
        let document = json!({
            "case": self.io.case_name,
            "current_time": init.current_time,
            "start_secs": init.start_secs,
            "start_date": self.deck.start_date(),
            "deck": self.deck.as_ref(),
            "nnc": init.nnc,
        });
        let data = serde_json::to_vec_pretty(&document)?;
        let file = self.init_file();

        tracing::debug!(file = %file, bytes = data.len(), "Writing JSON init file");
        self.storage.write_file(&file, &data).await
    }

    async fn write_time_step(&mut self, step: &ReportStep) -> Result<()> {
        let data = serde_json::to_vec_pretty(step)?;
        let file = self.step_file(step.report_step);

        tracing::debug!(file = %file, bytes = data.len(), "Writing JSON report step");
        self.storage.write_file(&file, &data).await
    }
}
