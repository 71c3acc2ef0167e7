use crate::core::cancel::CancellationToken;
use crate::core::pipeline::ReplenishmentPipeline;
use crate::core::Storage;
use crate::domain::model::{ReplenishmentRequest, RunReport};
use crate::utils::error::Result;

/// Runs one replenishment and hands the report to storage.
pub struct ReplenishEngine<S: Storage> {
    pipeline: ReplenishmentPipeline,
    storage: S,
    summary_file: String,
}

impl<S: Storage> ReplenishEngine<S> {
    pub fn new(pipeline: ReplenishmentPipeline, storage: S, summary_file: impl Into<String>) -> Self {
        Self {
            pipeline,
            storage,
            summary_file: summary_file.into(),
        }
    }

    /// Run failures are carried in the report; `Err` means the summary could not be stored.
    pub async fn run(
        &self,
        request: &ReplenishmentRequest,
        cancel: &CancellationToken,
    ) -> Result<RunReport> {
        tracing::info!(
            "🚀 Starting replenishment for {} at {} ({} peers)",
            request.material,
            request.home_location,
            request.peer_locations.len()
        );

        let report = self.pipeline.run(request, cancel).await;

        let summary = serde_json::to_vec_pretty(&report)?;
        self.storage.write_file(&self.summary_file, &summary).await?;
        tracing::debug!("💾 Run summary written to {}", self.summary_file);

        Ok(report)
    }
}
