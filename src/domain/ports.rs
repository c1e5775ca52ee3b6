use crate::utils::error::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;

pub trait Storage: Send + Sync {
    fn write_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<()>> + Send;
}

pub trait ConfigProvider: Send + Sync {
    fn output_dir(&self) -> &str;
    fn output_enabled(&self) -> bool;
    fn output_formats(&self) -> &[String];
}

/// Payload of the initial output call. The NNC payload is opaque here.
#[derive(Debug, Clone, Serialize)]
pub struct InitContext {
    pub current_time: DateTime<Utc>,
    pub start_secs: f64,
    pub nnc: serde_json::Value,
}

/// One report step. Reservoir and well state come from the simulator and are
/// passed through untouched.
#[derive(Debug, Clone, Serialize)]
pub struct ReportStep {
    pub report_step: u32,
    pub current_time: DateTime<Utc>,
    pub secs_elapsed: f64,
    pub reservoir_state: serde_json::Value,
    pub well_state: serde_json::Value,
    pub is_substep: bool,
}

#[async_trait]
pub trait OutputWriter: Send + Sync {
    /// Format name the writer was selected by.
    fn name(&self) -> &str;
    async fn write_init(&mut self, init: &InitContext) -> Result<()>;
    async fn write_time_step(&mut self, step: &ReportStep) -> Result<()>;
}
