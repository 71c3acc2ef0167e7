use crate::domain::model::Stage;
use crate::utils::error::{ReplenishError, Result};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Cooperative cancellation, observed by the pipeline at stage boundaries only.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    /// Fails with `Cancelled` if cancellation was requested before `stage` starts.
    pub fn checkpoint(&self, stage: Stage) -> Result<()> {
        if self.is_cancelled() {
            return Err(ReplenishError::Cancelled { stage });
        }
        Ok(())
    }
}
