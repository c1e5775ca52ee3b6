use crate::app::writers::FailurePolicy;
use crate::config::cli::LocalStorage;
use crate::core::output::{init_context, report_schedule, FormatRegistry, OutputParams};
use crate::core::parser::Parser;
use crate::domain::model::Deck;
use crate::domain::ports::OutputWriter;
use crate::utils::error::Result;
use crate::utils::monitor::SystemMonitor;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Drives decks through parsing and the output stage.
pub struct DeckEngine {
    parser: Parser,
    formats: FormatRegistry<LocalStorage>,
    params: OutputParams,
    policy: FailurePolicy,
    monitor: SystemMonitor,
}

impl DeckEngine {
    pub fn new(parser: Parser, params: OutputParams, policy: FailurePolicy) -> Self {
        Self {
            parser,
            formats: FormatRegistry::standard(),
            params,
            policy,
            monitor: SystemMonitor::new(false),
        }
    }

    pub fn new_with_monitoring(
        parser: Parser,
        params: OutputParams,
        policy: FailurePolicy,
        monitor_enabled: bool,
    ) -> Self {
        Self {
            monitor: SystemMonitor::new(monitor_enabled),
            ..Self::new(parser, params, policy)
        }
    }

    pub fn parser(&self) -> &Parser {
        &self.parser
    }

    /// Parse every deck; results keep the order of `paths`.
    pub async fn parse(&self, paths: Vec<PathBuf>) -> Vec<(PathBuf, Result<Arc<Deck>>)> {
        tracing::info!(decks = paths.len(), "Parsing decks");
        let results = self
            .parser
            .parse_many(paths)
            .await
            .into_iter()
            .map(|(path, result)| (path, result.map(Arc::new)))
            .collect();
        self.monitor.log_stats("Parse");
        results
    }

    /// Run the output stage for one deck: the init call, then one call per
    /// report step of its schedule. Returns the number of steps written.
    pub async fn write_outputs(&self, deck: Arc<Deck>, case_name: &str) -> Result<usize> {
        let mut writer = self.formats.create(
            &self.params,
            Arc::clone(&deck),
            case_name,
            self.policy,
            |dir: &Path| LocalStorage::new(dir),
        )?;
        if writer.is_empty() {
            return Ok(0);
        }

        writer.write_init(&init_context(&deck)).await?;
        let steps = report_schedule(&deck);
        for step in &steps {
            writer.write_time_step(step).await?;
        }

        tracing::info!(
            case = case_name,
            writers = ?writer.writer_names(),
            report_steps = steps.len(),
            "Output written"
        );
        self.monitor.log_stats("Output");
        Ok(steps.len())
    }

    pub fn finish(&self) {
        self.monitor.log_final_stats();
    }
}

/// Output file base name for a deck path: the file stem, e.g. `CASE` for `CASE.DATA`.
pub fn case_name(path: &Path) -> String {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| "deck".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::builder::ParseOptions;
    use crate::core::output::OUTPUT_DIR_PARAM;
    use crate::core::registry::SchemaRegistry;
    use std::io::Write;
    use tempfile::TempDir;

    fn parser() -> Parser {
        Parser::new(
            Arc::new(SchemaRegistry::builtin().unwrap()),
            ParseOptions::default(),
        )
    }

    #[test]
    fn test_case_name() {
        assert_eq!(case_name(Path::new("/data/NORNE.DATA")), "NORNE");
        assert_eq!(case_name(Path::new("spe1")), "spe1");
    }

    #[tokio::test]
    async fn test_parse_and_write_outputs() {
        let dir = TempDir::new().unwrap();
        let deck_path = dir.path().join("SPE1.DATA");
        let mut file = std::fs::File::create(&deck_path).unwrap();
        file.write_all(b"START\n1 'JAN' 2020 /\nSCHEDULE\nTSTEP\n3*10 /\n")
            .unwrap();

        let out = dir.path().join("out");
        let params = OutputParams::new()
            .with(OUTPUT_DIR_PARAM, out.display())
            .with("output_json", true)
            .with("output_csv", true);
        let engine = DeckEngine::new(parser(), params, FailurePolicy::Aggregate);

        let results = engine.parse(vec![deck_path.clone()]).await;
        let deck = results.into_iter().next().unwrap().1.unwrap();
        let steps = engine
            .write_outputs(deck, &case_name(&deck_path))
            .await
            .unwrap();

        assert_eq!(steps, 3);
        assert!(out.join("SPE1.INIT.json").exists());
        assert!(out.join("SPE1.S0003.json").exists());
        assert!(out.join("SPE1.DECK.csv").exists());
        let steps_csv = std::fs::read_to_string(out.join("SPE1.STEPS.csv")).unwrap();
        assert_eq!(steps_csv.lines().count(), 4);
    }

    #[tokio::test]
    async fn test_disabled_output_writes_nothing() {
        let dir = TempDir::new().unwrap();
        let params = OutputParams::new()
            .with(OUTPUT_DIR_PARAM, dir.path().display())
            .with("output", false)
            .with("output_json", true);
        let engine = DeckEngine::new(parser(), params, FailurePolicy::FailFast);
        let deck = Arc::new(parser().parse_str("RUNSPEC\n", "CASE.DATA").unwrap());

        assert_eq!(engine.write_outputs(deck, "CASE").await.unwrap(), 0);
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }
}
