use anyhow::Result;
use async_trait::async_trait;
use deckparse::core::output::{init_context, report_schedule, OUTPUT_DIR_PARAM, OUTPUT_ENABLED_PARAM};
use deckparse::domain::ports::{InitContext, OutputWriter, ReportStep, Storage};
use deckparse::{
    create_output_writer, DeckError, FailurePolicy, FormatRegistry, LocalStorage, MultiWriter,
    OutputParams, ParseOptions, Parser, SchemaRegistry,
};
use std::path::PathBuf;
use std::sync::Arc;
use tempfile::TempDir;

fn fixture_deck() -> Arc<deckparse::Deck> {
    let parser = Parser::new(
        Arc::new(SchemaRegistry::builtin().unwrap()),
        ParseOptions::default(),
    );
    let path = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/SPE1.DATA");
    Arc::new(parser.parse_file(path).unwrap())
}

#[tokio::test]
async fn test_json_and_csv_outputs_on_disk() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let deck = fixture_deck();
    let params = OutputParams::from_assignments(&[
        "output_json=true".to_string(),
        "output_csv=true".to_string(),
    ])?;

    let mut writer = create_output_writer(
        &params,
        Arc::clone(&deck),
        "SPE1",
        LocalStorage::new(temp_dir.path()),
    )?;
    assert_eq!(writer.len(), 2);

    writer.write_init(&init_context(&deck)).await?;
    let steps = report_schedule(&deck);
    assert_eq!(steps.len(), 3);
    for step in &steps {
        writer.write_time_step(step).await?;
    }

    let init: serde_json::Value =
        serde_json::from_slice(&std::fs::read(temp_dir.path().join("SPE1.INIT.json"))?)?;
    assert_eq!(init["start_date"], "2015-01-01");
    assert_eq!(init["deck"]["keywords"].as_array().unwrap().len(), 29);

    let last: serde_json::Value =
        serde_json::from_slice(&std::fs::read(temp_dir.path().join("SPE1.S0003.json"))?)?;
    assert_eq!(last["report_step"], 3);
    assert_eq!(last["secs_elapsed"], 90.0 * 86_400.0);

    let deck_csv = std::fs::read_to_string(temp_dir.path().join("SPE1.DECK.csv"))?;
    assert!(deck_csv.starts_with("keyword,occurrence,record,item,index,value,origin\n"));
    assert!(deck_csv.contains("DIMENS,1,1,NX,1,10,explicit"));

    let steps_csv = std::fs::read_to_string(temp_dir.path().join("SPE1.STEPS.csv"))?;
    assert_eq!(steps_csv.lines().count(), 4);
    Ok(())
}

#[tokio::test]
async fn test_output_dir_parameter() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let out = temp_dir.path().join("results");
    let params = OutputParams::new()
        .with("output_csv", true)
        .with(OUTPUT_DIR_PARAM, out.display());

    let mut writer = FormatRegistry::standard().create(
        &params,
        fixture_deck(),
        "CASE",
        FailurePolicy::FailFast,
        |dir| LocalStorage::new(dir),
    )?;
    writer.write_init(&init_context(&fixture_deck())).await?;

    assert!(out.join("CASE.DECK.csv").exists());
    assert!(!out.join("CASE.INIT.json").exists());
    Ok(())
}

#[tokio::test]
async fn test_output_disabled() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let params = OutputParams::new()
        .with("output_json", true)
        .with(OUTPUT_ENABLED_PARAM, false);

    let mut writer = create_output_writer(
        &params,
        fixture_deck(),
        "CASE",
        LocalStorage::new(temp_dir.path()),
    )?;
    assert!(writer.is_empty());
    writer.write_init(&init_context(&fixture_deck())).await?;
    assert_eq!(std::fs::read_dir(temp_dir.path())?.count(), 0);
    Ok(())
}

#[derive(Clone)]
struct ReadOnlyStorage;

impl Storage for ReadOnlyStorage {
    async fn write_file(&self, path: &str, _data: &[u8]) -> deckparse::Result<()> {
        Err(DeckError::IoError(std::io::Error::new(
            std::io::ErrorKind::PermissionDenied,
            format!("read-only: {}", path),
        )))
    }
}

#[tokio::test]
async fn test_aggregate_reports_every_writer() {
    let params = OutputParams::new()
        .with("output_json", true)
        .with("output_csv", true);
    let deck = fixture_deck();

    let mut writer = FormatRegistry::standard()
        .create(
            &params,
            Arc::clone(&deck),
            "CASE",
            FailurePolicy::Aggregate,
            |_| ReadOnlyStorage,
        )
        .unwrap();

    match writer.write_init(&init_context(&deck)).await {
        Err(DeckError::OutputFailures { failures }) => {
            assert_eq!(failures.len(), 2);
            assert!(failures[0].starts_with("output_json: "));
            assert!(failures[1].starts_with("output_csv: "));
        }
        other => panic!("expected aggregated failures, got {:?}", other),
    }
}

struct CountingWriter {
    steps: Arc<std::sync::atomic::AtomicU32>,
}

#[async_trait]
impl OutputWriter for CountingWriter {
    fn name(&self) -> &str {
        "counting"
    }

    async fn write_init(&mut self, _init: &InitContext) -> deckparse::Result<()> {
        Ok(())
    }

    async fn write_time_step(&mut self, _step: &ReportStep) -> deckparse::Result<()> {
        self.steps.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        Ok(())
    }
}

#[tokio::test]
async fn test_custom_writer_in_multiplexer() -> Result<()> {
    let steps = Arc::new(std::sync::atomic::AtomicU32::new(0));
    let deck = fixture_deck();
    let counting: Box<dyn OutputWriter> = Box::new(CountingWriter {
        steps: Arc::clone(&steps),
    });
    let mut multi = MultiWriter::new(vec![counting], FailurePolicy::FailFast);

    for step in report_schedule(&deck) {
        multi.write_time_step(&step).await?;
    }
    assert_eq!(steps.load(std::sync::atomic::Ordering::SeqCst), 3);
    Ok(())
}
