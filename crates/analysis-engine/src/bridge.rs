//! Deadline-bounded execution of analysis work on the shared runtime

use std::sync::Arc;
use std::time::Duration;

use tracing::{error, warn};

use crate::analysis::{AnalysisRequest, AnalysisResult};
use crate::engine::AnalysisHandler;
use crate::error::EngineError;

/// Default deadline for the self-test endpoint
pub const SELFTEST_DEADLINE: Duration = Duration::from_millis(4000);
/// Default deadline for client-initiated analysis
pub const ANALYZE_DEADLINE: Duration = Duration::from_millis(5000);

/// Runs each analysis as its own task and waits at most a deadline for it.
///
/// On expiry the task is aborted; dropping the in-flight session kills its
/// engine process.
#[derive(Clone)]
pub struct ExecutionBridge {
    handler: Arc<dyn AnalysisHandler>,
}

impl ExecutionBridge {
    pub fn new(handler: Arc<dyn AnalysisHandler>) -> Self {
        Self { handler }
    }

    /// Always returns a result; failures are reported as `success: false`.
    pub async fn run_with_timeout(&self, request: AnalysisRequest, deadline: Duration) -> AnalysisResult {
        let mut task = tokio::spawn(self.handler.analyze(request));

        match tokio::time::timeout(deadline, &mut task).await {
            Ok(Ok(Ok(result))) => result,
            Ok(Ok(Err(e))) => {
                error!(error = %e, "Analysis failed");
                AnalysisResult::failure(e.to_string())
            }
            Ok(Err(join_err)) => {
                error!(error = %join_err, "Analysis task died");
                AnalysisResult::failure(join_err.to_string())
            }
            Err(_) => {
                task.abort();
                warn!(deadline_ms = deadline.as_millis() as u64, "Analysis timed out, engine cancelled");
                AnalysisResult::failure(EngineError::Timeout.to_string())
            }
        }
    }
}
