use crate::domain::ports::{InitContext, OutputWriter, ReportStep};
use crate::utils::error::{DeckError, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// What the multiplexer does when one of its writers fails.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
    /// Stop at the first failing writer.
    #[default]
    FailFast,
    /// Call every writer and report all failures together.
    Aggregate,
}

/// Forwards every output call to each owned writer, in creation order.
pub struct MultiWriter {
    writers: Vec<Box<dyn OutputWriter>>,
    policy: FailurePolicy,
}

impl MultiWriter {
    pub fn new(writers: Vec<Box<dyn OutputWriter>>, policy: FailurePolicy) -> Self {
        Self { writers, policy }
    }

    pub fn len(&self) -> usize {
        self.writers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.writers.is_empty()
    }

    pub fn writer_names(&self) -> Vec<&str> {
        self.writers.iter().map(|writer| writer.name()).collect()
    }

    fn record_failure(
        &self,
        failures: &mut Vec<String>,
        writer: &str,
        error: DeckError,
    ) -> Result<()> {
        tracing::error!(writer, error = %error, "Output writer failed");
        match self.policy {
            FailurePolicy::FailFast => Err(error),
            FailurePolicy::Aggregate => {
                failures.push(format!("{}: {}", writer, error));
                Ok(())
            }
        }
    }

    fn finish(failures: Vec<String>) -> Result<()> {
        if failures.is_empty() {
            Ok(())
        } else {
            Err(DeckError::OutputFailures { failures })
        }
    }
}

#[async_trait]
impl OutputWriter for MultiWriter {
    fn name(&self) -> &str {
        "multi"
    }

    async fn write_init(&mut self, init: &InitContext) -> Result<()> {
        let mut failures = Vec::new();
        for index in 0..self.writers.len() {
            let result = self.writers[index].write_init(init).await;
            if let Err(error) = result {
                let name = self.writers[index].name().to_string();
                self.record_failure(&mut failures, &name, error)?;
            }
        }
        Self::finish(failures)
    }

    async fn write_time_step(&mut self, step: &ReportStep) -> Result<()> {
        tracing::debug!(
            report_step = step.report_step,
            writers = self.writers.len(),
            "Writing report step"
        );
        let mut failures = Vec::new();
        for index in 0..self.writers.len() {
            let result = self.writers[index].write_time_step(step).await;
            if let Err(error) = result {
                let name = self.writers[index].name().to_string();
                self.record_failure(&mut failures, &name, error)?;
            }
        }
        Self::finish(failures)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use std::sync::Arc;
    use tokio::sync::Mutex;

    #[derive(Clone)]
    struct RecordingWriter {
        name: String,
        fail: bool,
        calls: Arc<Mutex<Vec<String>>>,
    }

    impl RecordingWriter {
        fn boxed(name: &str, fail: bool, calls: &Arc<Mutex<Vec<String>>>) -> Box<dyn OutputWriter> {
            Box::new(Self {
                name: name.to_string(),
                fail,
                calls: Arc::clone(calls),
            })
        }

        async fn call(&self, what: &str) -> Result<()> {
            self.calls.lock().await.push(format!("{}:{}", self.name, what));
            if self.fail {
                return Err(DeckError::OutputError {
                    writer: self.name.clone(),
                    message: "disk full".to_string(),
                });
            }
            Ok(())
        }
    }

    #[async_trait]
    impl OutputWriter for RecordingWriter {
        fn name(&self) -> &str {
            &self.name
        }

        async fn write_init(&mut self, _init: &InitContext) -> Result<()> {
            self.call("init").await
        }

        async fn write_time_step(&mut self, step: &ReportStep) -> Result<()> {
            self.call(&format!("step{}", step.report_step)).await
        }
    }

    fn init() -> InitContext {
        InitContext {
            current_time: Utc::now(),
            start_secs: 0.0,
            nnc: serde_json::Value::Null,
        }
    }

    fn step(report_step: u32) -> ReportStep {
        ReportStep {
            report_step,
            current_time: Utc::now(),
            secs_elapsed: 86_400.0,
            reservoir_state: serde_json::Value::Null,
            well_state: serde_json::Value::Null,
            is_substep: false,
        }
    }

    #[tokio::test]
    async fn test_forwards_in_order() {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let mut multi = MultiWriter::new(
            vec![
                RecordingWriter::boxed("a", false, &calls),
                RecordingWriter::boxed("b", false, &calls),
            ],
            FailurePolicy::FailFast,
        );

        multi.write_init(&init()).await.unwrap();
        multi.write_time_step(&step(1)).await.unwrap();

        assert_eq!(multi.writer_names(), vec!["a", "b"]);
        assert_eq!(
            *calls.lock().await,
            vec!["a:init", "b:init", "a:step1", "b:step1"]
        );
    }

    #[tokio::test]
    async fn test_empty_multiplexer_is_noop() {
        let mut multi = MultiWriter::new(Vec::new(), FailurePolicy::FailFast);
        assert!(multi.is_empty());
        assert!(multi.write_init(&init()).await.is_ok());
        assert!(multi.write_time_step(&step(1)).await.is_ok());
    }

    #[tokio::test]
    async fn test_fail_fast_stops_at_first_failure() {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let mut multi = MultiWriter::new(
            vec![
                RecordingWriter::boxed("a", true, &calls),
                RecordingWriter::boxed("b", false, &calls),
            ],
            FailurePolicy::FailFast,
        );

        let err = multi.write_init(&init()).await.unwrap_err();
        assert!(matches!(err, DeckError::OutputError { ref writer, .. } if writer == "a"));
        assert_eq!(*calls.lock().await, vec!["a:init"]);
    }

    #[tokio::test]
    async fn test_aggregate_calls_every_writer() {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let mut multi = MultiWriter::new(
            vec![
                RecordingWriter::boxed("a", true, &calls),
                RecordingWriter::boxed("b", false, &calls),
                RecordingWriter::boxed("c", true, &calls),
            ],
            FailurePolicy::Aggregate,
        );

        let err = multi.write_time_step(&step(3)).await.unwrap_err();
        match err {
            DeckError::OutputFailures { failures } => {
                assert_eq!(failures.len(), 2);
                assert!(failures[0].starts_with("a: "));
                assert!(failures[1].starts_with("c: "));
            }
            other => panic!("unexpected error: {:?}", other),
        }
        assert_eq!(calls.lock().await.len(), 3);
    }
}
