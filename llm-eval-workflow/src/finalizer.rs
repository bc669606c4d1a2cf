use chrono::Utc;
use llm_eval_core::{EvalStore, ExperimentRun, Result, RunId};
use std::sync::Arc;
use tokio::runtime::Handle;
use tracing::{error, warn};

/// Owns the completion write of one run.
///
/// [`finish`](Self::finish) stamps the run with its aggregate. If the guard is
/// dropped without a successful finish (the run future was cancelled, a case
/// panicked, or the stamp itself failed), `Drop` spawns a completion with no
/// aggregate on the current tokio runtime so the run is never left in flight.
pub struct RunFinalizer {
    store: Arc<dyn EvalStore>,
    run_id: RunId,
    armed: bool,
}

impl RunFinalizer {
    pub fn new(store: Arc<dyn EvalStore>, run_id: RunId) -> Self {
        Self {
            store,
            run_id,
            armed: true,
        }
    }

    /// Stamp `completed_at` now, with the given aggregate.
    ///
    /// The guard stays armed until the write succeeds, so a failed or
    /// cancelled stamp still falls back to the stamp in `Drop`.
    pub async fn finish(mut self, aggregate_score: Option<f64>) -> Result<ExperimentRun> {
        let run = self
            .store
            .complete_run(&self.run_id, Utc::now(), aggregate_score)
            .await?;
        self.armed = false;
        Ok(run)
    }
}

impl Drop for RunFinalizer {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }

        warn!(run_id = %self.run_id, "Run abandoned before completion, stamping it without an aggregate");

        let store = Arc::clone(&self.store);
        let run_id = self.run_id;
        match Handle::try_current() {
            Ok(handle) => {
                handle.spawn(async move {
                    if let Err(e) = store.complete_run(&run_id, Utc::now(), None).await {
                        error!(run_id = %run_id, error = %e, "Failed to stamp abandoned run");
                    }
                });
            }
            Err(_) => {
                error!(run_id = %run_id, "No tokio runtime available, run left in flight");
            }
        }
    }
}
